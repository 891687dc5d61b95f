//! Backtracking reference search over pairwise absorptions.
//!
//! The first unsettled balance is fully absorbed into some later balance of
//! opposite sign (one transaction), and the search recurses on what is left. All
//! pairings are explored and the shortest plan found is kept. Only pairwise moves
//! are considered, never multi-way groups, so this is a baseline for the exact DP
//! rather than the final answer. Exponential: callers bound the input size.

use splitledger_core::{LedgerError, LedgerResult, Money, UserId};

use crate::balances::Transaction;
use crate::config::capped;

pub const ALGORITHM: &str = "backtracking";

/// Shortest plan found by pairwise absorption, or `AlgorithmicBoundExceeded`
/// when `balances` has more than `limit` non-zero entries (`limit` is capped at
/// [`SEARCH_HARD_CAP`](crate::SEARCH_HARD_CAP)).
pub fn settle(balances: &[(UserId, Money)], limit: usize) -> LedgerResult<Vec<Transaction>> {
    let entries: Vec<(UserId, Money)> = balances
        .iter()
        .copied()
        .filter(|(_, m)| !m.is_zero())
        .collect();

    let limit = capped(limit);
    if entries.len() > limit {
        return Err(LedgerError::AlgorithmicBoundExceeded {
            algorithm: ALGORITHM,
            balances: entries.len(),
            limit,
        });
    }

    let mut search = Search {
        users: entries.iter().map(|&(u, _)| u).collect(),
        values: entries.iter().map(|&(_, m)| m).collect(),
        path: Vec::new(),
        best: None,
    };
    search.run(0);
    Ok(search.best.unwrap_or_default())
}

/// Minimum transaction count reachable by pairwise absorption.
pub fn minimum_count(balances: &[(UserId, Money)], limit: usize) -> LedgerResult<usize> {
    settle(balances, limit).map(|plan| plan.len())
}

struct Search {
    users: Vec<UserId>,
    values: Vec<Money>,
    path: Vec<Transaction>,
    best: Option<Vec<Transaction>>,
}

impl Search {
    fn run(&mut self, start: usize) {
        let n = self.values.len();
        let mut start = start;
        while start < n && self.values[start].is_zero() {
            start += 1;
        }

        if start == n {
            if self.best.as_ref().is_none_or(|best| self.path.len() < best.len()) {
                self.best = Some(self.path.clone());
            }
            return;
        }

        // At least one more transaction is needed from here.
        if let Some(best) = &self.best {
            if self.path.len() + 1 >= best.len() {
                return;
            }
        }

        let value = self.values[start];
        for i in (start + 1)..n {
            let other = self.values[i];
            if other.is_zero() || other.is_negative() == value.is_negative() {
                continue;
            }

            let tx = if value.is_negative() {
                Transaction::new(self.users[start], self.users[i], value.abs())
            } else {
                Transaction::new(self.users[i], self.users[start], value)
            };

            self.values[i] = other + value;
            self.values[start] = Money::ZERO;
            self.path.push(tx);

            self.run(start + 1);

            self.path.pop();
            self.values[start] = value;
            self.values[i] = other;

            // An exact match settles two balances at once; no other pairing does better.
            if (other + value).is_zero() {
                break;
            }
        }
    }
}
