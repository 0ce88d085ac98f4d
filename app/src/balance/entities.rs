//! Provides facilities for operating on user balances. These are a building block for the
//! ledger. Two operations happen to balances: credits, which increase them, and debits, which
//! decrease them. Debits are slightly tricky because precautions must be taken so that balances
//! can't go negative due to concurrency: the sufficient-funds check in [`Balance::debit`] is only
//! meaningful if the write is conditioned on the amount that was read, which is what
//! [`crate::balance::update`] does.

use crate::money::Cents;
use crate::user;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("insufficient balance")]
pub struct InsufficientBalance;

#[derive(Debug, Error)]
#[error("balance limit exceeded")]
pub struct Overflow;

/// Represents the user balance.
///
/// Notice that this struct stores the original amount as well as any updates done on the balance.
/// This allows us to write SQL queries that avoid concurrency issues - in general, a balance will
/// only be updated successfully if no other process updated the balance in between the time when
/// we loaded it and the time when we tried to update it.
#[derive(Debug, Clone, Default)]
pub struct Balance {
    user_id: user::Id,
    original_amount: Cents,
    amount: Cents,
}

impl Balance {
    pub fn new(user_id: user::Id, amount: Cents) -> Self {
        Self {
            user_id,
            original_amount: amount,
            amount,
        }
    }

    pub fn user_id(&self) -> user::Id {
        self.user_id
    }

    pub fn original_amount(&self) -> Cents {
        self.original_amount
    }

    pub fn amount(&self) -> Cents {
        self.amount
    }

    pub fn changed(&self) -> bool {
        self.original_amount != self.amount
    }

    /// Credits the balance. Fails if the new amount would not fit the i64 cents column, which
    /// keeps the stored balance from ever wrapping negative.
    pub fn credit(&mut self, amount: Cents) -> Result<(), Overflow> {
        self.amount = self.amount.checked_add(amount).ok_or(Overflow)?;
        Ok(())
    }

    /// Debits the balance, failing if the funds as of the last read are insufficient. The check
    /// holds at commit time because the conditional write rejects any interleaved update.
    pub fn debit(&mut self, amount: Cents) -> Result<(), InsufficientBalance> {
        if amount > self.amount {
            return Err(InsufficientBalance);
        }
        self.amount -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn balance(amount: i64) -> Balance {
        Balance::new(user::Id(Uuid::new_v4()), Cents(amount))
    }

    #[test]
    fn credit_increases_amount() {
        let mut b = balance(100);
        b.credit(Cents(50)).unwrap();
        assert_eq!(b.amount(), Cents(150));
        assert_eq!(b.original_amount(), Cents(100));
        assert!(b.changed());
    }

    #[test]
    fn credit_cannot_overflow() {
        let mut b = balance(i64::MAX);
        assert!(b.credit(Cents(1)).is_err());
        assert_eq!(b.amount(), Cents(i64::MAX));
        assert!(!b.changed());
    }

    #[test]
    fn debit_decreases_amount() {
        let mut b = balance(100);
        b.debit(Cents(40)).unwrap();
        assert_eq!(b.amount(), Cents(60));
        assert_eq!(b.original_amount(), Cents(100));
    }

    #[test]
    fn debit_cannot_overdraw() {
        let mut b = balance(100);
        assert!(b.debit(Cents(101)).is_err());
        assert_eq!(b.amount(), Cents(100));
        assert!(!b.changed());
    }

    #[test]
    fn debit_of_the_full_amount_succeeds() {
        let mut b = balance(100);
        b.debit(Cents(100)).unwrap();
        assert_eq!(b.amount(), Cents(0));
    }

    #[test]
    fn sequential_debits_observe_earlier_ones() {
        let mut b = balance(100);
        b.debit(Cents(60)).unwrap();
        assert!(b.debit(Cents(60)).is_err());
        assert_eq!(b.amount(), Cents(40));
    }
}
