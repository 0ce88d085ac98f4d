//! The account ledger. Owns all balance mutations and the append-only transaction log.
//!
//! Every mutation runs inside a single SQL transaction together with a conditional balance write
//! (see [`crate::balance`]), wrapped in [`concurrency::retry_loop`]. A concurrent update to any
//! touched balance rolls the whole attempt back and retries it against a fresh read, so the
//! sufficient-funds check always holds at the commit that is actually applied, the transaction
//! record is appended exactly once, and no credit is lost.

use crate::{auth, balance, concurrency, database::Database, money::Cents, user};

mod entities;

pub use entities::{Entry, Error, HistoryEntry, Id, Method, Party, Receipt, Transfer, SYSTEM_LABEL};

const HISTORY_LIMIT: i64 = 50;

/// Credits the caller's balance and records a recharge entry, atomically.
pub async fn recharge(grant: &auth::Grant, db: &Database, amount: Cents) -> Result<Receipt, Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount);
    }
    concurrency::retry_loop(|| async {
        let mut data_tx = db.begin().await.unwrap();
        let mut balance = balance::get(&mut data_tx, grant.user_id).await;
        balance.credit(amount)?;
        let entry = Entry::recharge(grant.user_id, amount);
        queries::insert(&mut data_tx, &entry).await;
        balance::update(&mut data_tx, &balance).await?;
        data_tx.commit().await.unwrap();
        Ok(Receipt {
            transaction_id: entry.id,
            new_balance: balance.amount(),
        })
    })
    .await
}

/// Moves funds from the caller to the recipient and records a single transfer entry.
pub async fn transfer(
    grant: &auth::Grant,
    db: &Database,
    recipient_id: user::Id,
    amount: Cents,
    description: String,
    method: Method,
) -> Result<Transfer, Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount);
    }
    if recipient_id == grant.user_id {
        return Err(Error::SelfTransfer);
    }
    let recipient_name = user::get(db, recipient_id)
        .await
        .ok_or(Error::RecipientNotFound)?
        .name;

    concurrency::retry_loop(|| async {
        let mut data_tx = db.begin().await.unwrap();
        let mut sender = balance::get(&mut data_tx, grant.user_id).await;
        let mut recipient = balance::get(&mut data_tx, recipient_id).await;
        sender.debit(amount)?;
        recipient.credit(amount)?;
        let entry = Entry::transfer(
            grant.user_id,
            recipient_id,
            amount,
            description.clone(),
            method,
        );
        queries::insert(&mut data_tx, &entry).await;
        // Both rows are written in user-id order, so opposing concurrent transfers take their
        // row locks in the same order and cannot deadlock each other.
        let (first, second) = update_order(&sender, &recipient);
        balance::update(&mut data_tx, first).await?;
        balance::update(&mut data_tx, second).await?;
        data_tx.commit().await.unwrap();
        Ok(Transfer {
            transaction_id: entry.id,
            new_balance: sender.amount(),
            recipient_name: recipient_name.clone(),
        })
    })
    .await
}

fn update_order<'a>(
    a: &'a balance::Balance,
    b: &'a balance::Balance,
) -> (&'a balance::Balance, &'a balance::Balance) {
    if a.user_id().0 <= b.user_id().0 {
        (a, b)
    } else {
        (b, a)
    }
}

/// Returns the caller's most recent entries, newest first, with both party names resolved.
pub async fn history(grant: &auth::Grant, db: &Database) -> Vec<HistoryEntry> {
    queries::history(db, grant.user_id).await
}

mod queries {
    use super::{Entry, HistoryEntry, Id, Method, Party, HISTORY_LIMIT, SYSTEM_LABEL};
    use crate::{database, database::Database, money::Cents, user};
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    pub(super) async fn insert(data_tx: &mut database::Transaction, entry: &Entry) {
        sqlx::query(
            r#"INSERT INTO transactions (id, from_user, to_user, amount_cents, description, method, created)
                VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(entry.id.0)
        .bind(match entry.from {
            Party::System => None,
            Party::Account(id) => Some(id.0),
        })
        .bind(entry.to.0)
        .bind(entry.amount.0)
        .bind(&entry.description)
        .bind(method_to_i32(entry.method))
        .bind(entry.created)
        .execute(data_tx)
        .await
        .unwrap();
    }

    pub(super) async fn history(db: &Database, user_id: user::Id) -> Vec<HistoryEntry> {
        sqlx::query_as::<_, HistoryRow>(
            r#"SELECT t.id, t.from_user, t.to_user, t.amount_cents, t.description, t.method,
                t.created, fu.name AS from_name, tu.name AS to_name
                FROM transactions t
                LEFT JOIN users fu ON fu.id = t.from_user
                LEFT JOIN users tu ON tu.id = t.to_user
                WHERE t.from_user = $1 OR t.to_user = $1
                ORDER BY t.created DESC LIMIT $2"#,
        )
        .bind(user_id.0)
        .bind(HISTORY_LIMIT)
        .fetch_all(db)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.into_entity())
        .collect()
    }

    fn method_to_i32(method: Method) -> i32 {
        match method {
            Method::Transfer => 0,
            Method::Qr => 1,
            Method::Nfc => 2,
            Method::Recharge => 3,
        }
    }

    fn method_from_i32(method: i32) -> Method {
        match method {
            0 => Method::Transfer,
            1 => Method::Qr,
            2 => Method::Nfc,
            3 => Method::Recharge,
            _ => unreachable!("unknown method number {}", method),
        }
    }

    #[derive(sqlx::FromRow, Debug)]
    struct HistoryRow {
        id: Uuid,
        from_user: Option<Uuid>,
        to_user: Uuid,
        amount_cents: i64,
        description: String,
        method: i32,
        created: DateTime<Utc>,
        from_name: Option<String>,
        to_name: Option<String>,
    }

    impl HistoryRow {
        fn into_entity(self) -> HistoryEntry {
            HistoryEntry {
                entry: Entry {
                    id: Id(self.id),
                    from: match self.from_user {
                        None => Party::System,
                        Some(id) => Party::Account(user::Id(id)),
                    },
                    to: user::Id(self.to_user),
                    amount: Cents(self.amount_cents),
                    description: self.description,
                    method: method_from_i32(self.method),
                    created: self.created,
                },
                from_name: self.from_name.unwrap_or_else(|| SYSTEM_LABEL.to_owned()),
                to_name: self.to_name.unwrap_or_else(|| SYSTEM_LABEL.to_owned()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn two_account_updates_use_a_stable_order() {
        let low = balance::Balance::new(user::Id(Uuid::from_u128(1)), Cents(100));
        let high = balance::Balance::new(user::Id(Uuid::from_u128(2)), Cents(100));

        let (first, second) = update_order(&low, &high);
        assert_eq!(first.user_id(), low.user_id());
        assert_eq!(second.user_id(), high.user_id());

        // Same order regardless of which side is the sender.
        let (first, second) = update_order(&high, &low);
        assert_eq!(first.user_id(), low.user_id());
        assert_eq!(second.user_id(), high.user_id());
    }
}
