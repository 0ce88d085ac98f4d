//! Entities for the transaction log. Entries are append-only: once recorded they are never
//! mutated or deleted, and a user's balance is always the sum of their entries.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::balance;
use crate::concurrency;
use crate::money::Cents;
use crate::user;

/// Display label used when the sending party is the system itself (recharges).
pub const SYSTEM_LABEL: &str = "System";

#[derive(Debug, Error)]
pub enum Error {
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("cannot transfer to yourself")]
    SelfTransfer,
    #[error("recipient not found")]
    RecipientNotFound,
    #[error("insufficient funds")]
    InsufficientFunds(#[from] balance::InsufficientBalance),
    #[error("balance limit exceeded")]
    BalanceOverflow(#[from] balance::Overflow),
    #[error("{0:?}")]
    ConcurrencyConflict(#[from] concurrency::ConflictError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Id(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Transfer,
    Qr,
    Nfc,
    Recharge,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Transfer => "transfer",
            Method::Qr => "qr",
            Method::Nfc => "nfc",
            Method::Recharge => "recharge",
        }
    }
}

/// The sending side of an entry. Recharges are funded by the system sentinel, which debits no
/// real account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    System,
    Account(user::Id),
}

#[derive(Debug)]
pub struct Entry {
    pub id: Id,
    pub from: Party,
    pub to: user::Id,
    pub amount: Cents,
    pub description: String,
    pub method: Method,
    pub created: DateTime<Utc>,
}

impl Entry {
    pub(crate) fn recharge(to: user::Id, amount: Cents) -> Self {
        Self {
            id: Id(Uuid::new_v4()),
            from: Party::System,
            to,
            amount,
            description: "Balance recharge".to_owned(),
            method: Method::Recharge,
            created: Utc::now(),
        }
    }

    pub(crate) fn transfer(
        from: user::Id,
        to: user::Id,
        amount: Cents,
        description: String,
        method: Method,
    ) -> Self {
        Self {
            id: Id(Uuid::new_v4()),
            from: Party::Account(from),
            to,
            amount,
            description,
            method,
            created: Utc::now(),
        }
    }
}

/// An [`Entry`] annotated with the resolved display names of both parties.
#[derive(Debug)]
pub struct HistoryEntry {
    pub entry: Entry,
    pub from_name: String,
    pub to_name: String,
}

#[derive(Debug)]
pub struct Receipt {
    pub transaction_id: Id,
    pub new_balance: Cents,
}

#[derive(Debug)]
pub struct Transfer {
    pub transaction_id: Id,
    pub new_balance: Cents,
    pub recipient_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recharge_entries_come_from_the_system() {
        let to = user::Id(Uuid::new_v4());
        let entry = Entry::recharge(to, Cents(500));
        assert_eq!(entry.from, Party::System);
        assert_eq!(entry.to, to);
        assert_eq!(entry.method, Method::Recharge);
    }

    #[test]
    fn transfer_entries_record_both_parties() {
        let from = user::Id(Uuid::new_v4());
        let to = user::Id(Uuid::new_v4());
        let entry = Entry::transfer(from, to, Cents(100), "lunch".to_owned(), Method::Qr);
        assert_eq!(entry.from, Party::Account(from));
        assert_eq!(entry.to, to);
        assert_eq!(entry.method, Method::Qr);
    }

    #[test]
    fn method_tags() {
        assert_eq!(Method::Transfer.as_str(), "transfer");
        assert_eq!(Method::Qr.as_str(), "qr");
        assert_eq!(Method::Nfc.as_str(), "nfc");
        assert_eq!(Method::Recharge.as_str(), "recharge");
    }
}
