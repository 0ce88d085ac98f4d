use crate::concurrency;
use crate::database;
use crate::money::Cents;
use crate::user;
use uuid::Uuid;

mod entities;

pub use entities::{Balance, InsufficientBalance, Overflow};

pub async fn get(data_tx: &mut database::Transaction, user_id: user::Id) -> Balance {
    sqlx::query_as::<_, BalanceRow>("SELECT id AS user_id, balance_cents FROM users WHERE id = $1")
        .bind(user_id.0)
        .fetch_one(data_tx)
        .await
        .unwrap()
        .into_entity()
}

/// Writes the balance back, conditioned on the amount that was originally read. Any interleaved
/// update to the same row makes the condition fail, which surfaces as a [`ConflictError`] for the
/// retry loop.
///
/// [`ConflictError`]: concurrency::ConflictError
pub async fn update(
    data_tx: &mut database::Transaction,
    balance: &Balance,
) -> Result<(), concurrency::ConflictError> {
    if balance.changed() {
        let row = sqlx::query(
            "UPDATE users SET balance_cents = $1 WHERE id = $2 AND balance_cents = $3 RETURNING id",
        )
        .bind(balance.amount().0)
        .bind(balance.user_id().0)
        .bind(balance.original_amount().0)
        .fetch_optional(data_tx)
        .await;
        let row = match row {
            Ok(row) => row,
            // A deadlock or serialization abort is as transient as a missed condition; hand it
            // to the retry loop instead of tearing down the handler.
            Err(e) if is_transient(&e) => return Err(concurrency::ConflictError),
            Err(e) => panic!("failed to update balance: {}", e),
        };
        row.ok_or(concurrency::ConflictError)?;
    }
    Ok(())
}

fn is_transient(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(e) => is_transient_code(e.code().as_deref()),
        _ => false,
    }
}

/// SQLSTATE 40001 is serialization_failure, 40P01 is deadlock_detected.
fn is_transient_code(code: Option<&str>) -> bool {
    matches!(code, Some("40001") | Some("40P01"))
}

#[derive(sqlx::FromRow, Debug)]
struct BalanceRow {
    user_id: Uuid,
    balance_cents: i64,
}

impl BalanceRow {
    fn into_entity(self) -> Balance {
        Balance::new(user::Id(self.user_id), Cents(self.balance_cents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadlock_and_serialization_aborts_are_transient() {
        assert!(is_transient_code(Some("40P01")));
        assert!(is_transient_code(Some("40001")));
        assert!(!is_transient_code(Some("23505")));
        assert!(!is_transient_code(None));
    }
}
