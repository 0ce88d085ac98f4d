//! Currency amounts. Balances and transaction amounts are stored as whole
//! cents, which keeps the arithmetic exact and maps directly to BIGINT
//! columns.

use std::ops::{Add, AddAssign, Sub, SubAssign};

#[derive(Debug, Clone, Copy, Default, PartialOrd, Ord, PartialEq, Eq)]
pub struct Cents(pub i64);

impl Cents {
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl Add for Cents {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Cents {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let mut amount = Cents(1000);
        amount += Cents(250);
        assert_eq!(amount, Cents(1250));
        amount -= Cents(1250);
        assert_eq!(amount, Cents(0));
        assert_eq!(Cents(100) + Cents(50), Cents(150));
        assert_eq!(Cents(100) - Cents(50), Cents(50));
    }

    #[test]
    fn checked_addition() {
        assert_eq!(Cents(1).checked_add(Cents(2)), Some(Cents(3)));
        assert_eq!(Cents(i64::MAX).checked_add(Cents(1)), None);
    }

    #[test]
    fn positivity() {
        assert!(Cents(1).is_positive());
        assert!(!Cents(0).is_positive());
        assert!(!Cents(-1).is_positive());
    }
}
