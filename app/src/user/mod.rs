use crate::{auth, database::Database};
use thiserror::Error;
use uuid::Uuid;

mod entities;

pub use entities::{Email, Id, NfcTag, User};

/// Queries shorter than this return no results.
const MIN_SEARCH_LEN: usize = 2;
const MAX_SEARCH_RESULTS: i64 = 10;

#[derive(Debug, Error)]
pub enum Error {
    #[error("email is already in use")]
    EmailTaken,
    #[error("NFC tag is already in use by another user")]
    NfcTagTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
}

/// Creates a user with a zero balance. The email must not be taken; uniqueness is enforced by the
/// database, so a concurrent registration with the same email loses cleanly.
pub async fn create(
    db: &Database,
    email: Email,
    name: String,
    password_hash: auth::PasswordHash,
) -> Result<User, Error> {
    let user = User {
        id: Id(Uuid::new_v4()),
        email,
        name,
        balance: Default::default(),
        nfc_tag: None,
        created: chrono::Utc::now(),
    };
    queries::insert(db, &user, &password_hash)
        .await
        .map_err(|_| Error::EmailTaken)?;
    Ok(user)
}

/// Checks the credentials and returns the user on success. Failure does not distinguish between
/// an unknown email and a wrong password.
pub async fn login(db: &Database, email: &str, password: &str) -> Result<User, Error> {
    let (user, password_hash) = queries::get_by_email(db, email)
        .await
        .ok_or(Error::InvalidCredentials)?;
    if password_hash.verify(password) {
        Ok(user)
    } else {
        Err(Error::InvalidCredentials)
    }
}

pub async fn get(db: &Database, id: Id) -> Option<User> {
    queries::get(db, id).await
}

/// Binds an NFC tag to the user. Re-registering one's own tag is a no-op; a tag held by another
/// user is rejected via the unique index.
pub async fn set_nfc_tag(grant: &auth::Grant, db: &Database, tag: NfcTag) -> Result<(), Error> {
    queries::set_nfc_tag(db, grant.user_id, &tag)
        .await
        .map_err(|_| Error::NfcTagTaken)
}

pub async fn find_by_nfc(db: &Database, tag: &NfcTag) -> Option<User> {
    queries::find_by_nfc(db, tag).await
}

/// Case-insensitive substring search over names and emails, excluding the requester.
pub async fn search(grant: &auth::Grant, db: &Database, query: &str) -> Vec<User> {
    if query.chars().count() < MIN_SEARCH_LEN {
        return Vec::new();
    }
    queries::search(db, grant.user_id, query).await
}

mod queries {
    use super::{Email, Id, NfcTag, User};
    use crate::auth;
    use crate::database::Database;
    use crate::money::Cents;
    use chrono::{DateTime, Utc};
    use const_format::formatcp;
    use uuid::Uuid;

    const COLUMNS: &str = "id, email, name, balance_cents, nfc_tag, created";

    /// Returns `Err(())` on a unique-constraint violation.
    pub(super) async fn insert(
        db: &Database,
        user: &User,
        password_hash: &auth::PasswordHash,
    ) -> Result<(), ()> {
        let result = sqlx::query(
            r#"INSERT INTO users (id, email, name, password, balance_cents, nfc_tag, created)
                VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(user.id.0)
        .bind(&user.email.0)
        .bind(&user.name)
        .bind(password_hash.as_str())
        .bind(user.balance.0)
        .bind(user.nfc_tag.as_ref().map(|tag| tag.0.clone()))
        .bind(user.created)
        .execute(db)
        .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(()),
            Err(e) => panic!("failed to insert user: {}", e),
        }
    }

    pub(super) async fn get(db: &Database, id: Id) -> Option<User> {
        sqlx::query_as::<_, UserRow>(formatcp!("SELECT {} FROM users WHERE id = $1", COLUMNS))
            .bind(id.0)
            .fetch_optional(db)
            .await
            .unwrap()
            .map(|row| row.into_entity())
    }

    pub(super) async fn get_by_email(
        db: &Database,
        email: &str,
    ) -> Option<(User, auth::PasswordHash)> {
        sqlx::query_as::<_, CredentialsRow>(formatcp!(
            "SELECT {}, password FROM users WHERE email = $1",
            COLUMNS
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .unwrap()
        .map(|row| row.into_entity())
    }

    pub(super) async fn set_nfc_tag(db: &Database, id: Id, tag: &NfcTag) -> Result<(), ()> {
        let result = sqlx::query("UPDATE users SET nfc_tag = $1 WHERE id = $2")
            .bind(&tag.0)
            .bind(id.0)
            .execute(db)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(()),
            Err(e) => panic!("failed to set NFC tag: {}", e),
        }
    }

    pub(super) async fn find_by_nfc(db: &Database, tag: &NfcTag) -> Option<User> {
        sqlx::query_as::<_, UserRow>(formatcp!(
            "SELECT {} FROM users WHERE nfc_tag = $1",
            COLUMNS
        ))
        .bind(&tag.0)
        .fetch_optional(db)
        .await
        .unwrap()
        .map(|row| row.into_entity())
    }

    pub(super) async fn search(db: &Database, exclude: Id, query: &str) -> Vec<User> {
        let pattern = format!("%{}%", escape_like(query));
        sqlx::query_as::<_, UserRow>(formatcp!(
            r#"SELECT {} FROM users
                WHERE id <> $1 AND (name ILIKE $2 OR email ILIKE $2)
                ORDER BY name LIMIT $3"#,
            COLUMNS
        ))
        .bind(exclude.0)
        .bind(pattern)
        .bind(super::MAX_SEARCH_RESULTS)
        .fetch_all(db)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.into_entity())
        .collect()
    }

    /// The query is user input, so LIKE metacharacters must match literally.
    fn escape_like(query: &str) -> String {
        query
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
    }

    fn is_unique_violation(e: &sqlx::Error) -> bool {
        match e {
            sqlx::Error::Database(e) => e.code().as_deref() == Some("23505"),
            _ => false,
        }
    }

    #[derive(sqlx::FromRow, Debug)]
    struct UserRow {
        id: Uuid,
        email: String,
        name: String,
        balance_cents: i64,
        nfc_tag: Option<String>,
        created: DateTime<Utc>,
    }

    impl UserRow {
        fn into_entity(self) -> User {
            User {
                id: Id(self.id),
                email: Email(self.email),
                name: self.name,
                balance: Cents(self.balance_cents),
                nfc_tag: self.nfc_tag.map(NfcTag),
                created: self.created,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::escape_like;

        #[test]
        fn like_metacharacters_are_escaped() {
            assert_eq!(escape_like("a%b_c"), "a\\%b\\_c");
            assert_eq!(escape_like("back\\slash"), "back\\\\slash");
            assert_eq!(escape_like("plain"), "plain");
        }
    }

    #[derive(sqlx::FromRow, Debug)]
    struct CredentialsRow {
        id: Uuid,
        email: String,
        name: String,
        balance_cents: i64,
        nfc_tag: Option<String>,
        created: DateTime<Utc>,
        password: String,
    }

    impl CredentialsRow {
        fn into_entity(self) -> (User, auth::PasswordHash) {
            let password_hash = auth::PasswordHash::from_stored(self.password);
            let user = UserRow {
                id: self.id,
                email: self.email,
                name: self.name,
                balance_cents: self.balance_cents,
                nfc_tag: self.nfc_tag,
                created: self.created,
            }
            .into_entity();
            (user, password_hash)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    // A lazy pool never opens a connection until a query runs, so tests of the pure input
    // validation can run without a database.
    fn unreachable_db() -> Database {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    #[tokio::test]
    async fn short_queries_return_nothing() {
        let db = unreachable_db();
        let grant = auth::Grant {
            user_id: Id(Uuid::new_v4()),
        };
        assert!(search(&grant, &db, "").await.is_empty());
        assert!(search(&grant, &db, "a").await.is_empty());
        // One character even when it is more than one byte.
        assert!(search(&grant, &db, "é").await.is_empty());
    }
}
