//! Session money balance.

use std::sync::atomic::{AtomicU32, Ordering};

/// Shortfall reported when a debit exceeds the current balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shortfall {
    /// Amount the debit asked for.
    pub required: u32,
    /// Balance observed when the debit was refused.
    pub available: u32,
}

/// Money balance mutated by player commands and bounty credits.
///
/// Every change is a single compare-and-swap, so concurrent credits and
/// debits never lose an update and the balance never goes negative.
#[derive(Debug)]
pub struct Ledger {
    balance: AtomicU32,
}

impl Ledger {
    /// Creates a ledger holding `opening` money.
    #[must_use]
    pub fn new(opening: u32) -> Self {
        Self {
            balance: AtomicU32::new(opening),
        }
    }

    /// Current balance.
    #[must_use]
    pub fn balance(&self) -> u32 {
        self.balance.load(Ordering::Acquire)
    }

    /// Adds `amount`, saturating at `u32::MAX`, and returns the new balance.
    pub fn credit(&self, amount: u32) -> u32 {
        let previous = match self.balance.fetch_update(Ordering::AcqRel, Ordering::Acquire, |b| {
            Some(b.saturating_add(amount))
        }) {
            Ok(previous) | Err(previous) => previous,
        };
        previous.saturating_add(amount)
    }

    /// Removes `amount` if the balance covers it and returns the new balance.
    pub fn try_debit(&self, amount: u32) -> Result<u32, Shortfall> {
        self.balance
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |b| b.checked_sub(amount))
            .map(|previous| previous - amount)
            .map_err(|available| Shortfall {
                required: amount,
                available,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn debit_refuses_overdraft_without_mutating() {
        let ledger = Ledger::new(90);
        assert_eq!(
            ledger.try_debit(100),
            Err(Shortfall {
                required: 100,
                available: 90
            })
        );
        assert_eq!(ledger.balance(), 90);
        assert_eq!(ledger.try_debit(90), Ok(0));
    }

    #[test]
    fn credit_saturates() {
        let ledger = Ledger::new(u32::MAX - 1);
        assert_eq!(ledger.credit(10), u32::MAX);
    }

    #[test]
    fn concurrent_credits_are_all_counted() {
        let ledger = Arc::new(Ledger::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        let _ = ledger.credit(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("credit thread");
        }
        assert_eq!(ledger.balance(), 8_000);
    }

    proptest! {
        #[test]
        fn balance_matches_accepted_operations(
            opening in 0u32..1_000,
            operations in prop::collection::vec((any::<bool>(), 0u32..400), 0..64),
        ) {
            let ledger = Ledger::new(opening);
            let mut expected = u64::from(opening);
            for (is_credit, amount) in operations {
                if is_credit {
                    let _ = ledger.credit(amount);
                    expected += u64::from(amount);
                } else if ledger.try_debit(amount).is_ok() {
                    expected -= u64::from(amount);
                }
                prop_assert_eq!(u64::from(ledger.balance()), expected);
            }
        }
    }
}
