use super::{Database, Transaction};
use crate::auth;
use chrono::Utc;
use uuid::Uuid;

/// Seeds a couple of users for local development. Passwords equal the local part of the email.
/// Only run in debug builds.
pub async fn seed_development_data(db: &Database) {
    let mut data_tx = db.begin().await.unwrap();
    seed_test_user(&mut data_tx, 1, "Test One").await;
    seed_test_user(&mut data_tx, 2, "Test Two").await;
    data_tx.commit().await.unwrap();
}

async fn seed_test_user(data_tx: &mut Transaction, index: u128, name: &str) {
    let row = sqlx::query(r#"SELECT id FROM users WHERE id = $1"#)
        .bind(Uuid::from_u128(index))
        .fetch_optional(&mut *data_tx)
        .await
        .unwrap();
    if row.is_some() {
        return;
    }
    let password_hash = auth::PasswordHash::generate(&format!("test-{}", index));
    sqlx::query(
        r#"INSERT INTO users (id, email, name, password, balance_cents, nfc_tag, created)
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
    )
    .bind(Uuid::from_u128(index))
    .bind(format!("test-{}@user.net", index))
    .bind(name)
    .bind(password_hash.as_str())
    .bind(10_000_i64)
    .bind(Option::<String>::None)
    .bind(Utc::now())
    .execute(&mut *data_tx)
    .await
    .unwrap();
}
