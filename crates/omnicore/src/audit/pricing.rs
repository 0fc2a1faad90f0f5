use serde::{Serialize, Serializer};
use std::fmt;

use super::domain::ReviewRecord;

/// Amount in euro cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(u64);

impl Money {
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> u64 {
        self.0
    }

    pub fn times(self, count: usize) -> Self {
        Self(self.0.saturating_mul(count as u64))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Price of removing one review.
pub const UNIT_PRICE: Money = Money::from_cents(1990);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pricing {
    pub count: usize,
    pub unit_price: Money,
    pub total: Money,
}

impl Pricing {
    pub fn for_count(count: usize) -> Self {
        Self {
            count,
            unit_price: UNIT_PRICE,
            total: UNIT_PRICE.times(count),
        }
    }

    /// Total with exactly two decimals, e.g. `"59.70"`.
    pub fn total_display(&self) -> String {
        self.total.to_string()
    }
}

pub fn compute_pricing(selection: &[ReviewRecord]) -> Pricing {
    Pricing::for_count(selection.len())
}
