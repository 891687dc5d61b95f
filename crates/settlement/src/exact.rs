//! Exact minimum settlement via subset dynamic programming.
//!
//! A set of `n` non-zero balances summing to zero can be partitioned into disjoint
//! zero-sum groups; a group of size `k` settles internally with `k − 1` transfers.
//! The minimum number of transfers is therefore `n − g`, where `g` is the largest
//! number of disjoint zero groups:
//!
//! ```text
//! dfs(0)    = 0
//! dfs(mask) = max over sub-masks M ⊆ mask with sum(M) = 0 of 1 + dfs(mask ^ M)
//! ```
//!
//! Submask enumeration is `O(3^n)`; callers must bound `n`.

use splitledger_core::{LedgerError, LedgerResult, Money, UserId};

use crate::balances::Transaction;
use crate::config::capped;
use crate::greedy;

pub const ALGORITHM: &str = "exact";

/// Minimum number of transactions that settles `balances`.
pub fn minimum_count(balances: &[(UserId, Money)], limit: usize) -> LedgerResult<usize> {
    let entries = non_zero(balances, limit)?;
    let groups = ZeroGroups::solve(&entries).groups;
    Ok(entries.len() - groups.len())
}

/// A minimum-length plan: each zero group settled internally by the greedy rule.
pub fn settle(balances: &[(UserId, Money)], limit: usize) -> LedgerResult<Vec<Transaction>> {
    let entries = non_zero(balances, limit)?;
    let groups = ZeroGroups::solve(&entries).groups;

    let mut plan = Vec::with_capacity(entries.len().saturating_sub(groups.len()));
    for mask in groups {
        let members: Vec<(UserId, Money)> = entries
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, &entry)| entry)
            .collect();
        plan.extend(greedy::settle(&members));
    }
    Ok(plan)
}

fn non_zero(balances: &[(UserId, Money)], limit: usize) -> LedgerResult<Vec<(UserId, Money)>> {
    let entries: Vec<(UserId, Money)> = balances
        .iter()
        .copied()
        .filter(|(_, m)| !m.is_zero())
        .collect();

    // Also keeps masks far inside u32.
    let limit = capped(limit);
    if entries.len() > limit {
        return Err(LedgerError::AlgorithmicBoundExceeded {
            algorithm: ALGORITHM,
            balances: entries.len(),
            limit,
        });
    }
    Ok(entries)
}

/// Memoized search for the largest partition into zero-sum groups.
struct ZeroGroups {
    sums: Vec<i128>,
    memo: Vec<Option<u8>>,
    choice: Vec<u32>,
    groups: Vec<u32>,
}

impl ZeroGroups {
    fn solve(entries: &[(UserId, Money)]) -> Self {
        let n = entries.len();
        let size = 1usize << n;

        let mut sums = vec![0i128; size];
        for mask in 1..size {
            let low = mask.trailing_zeros() as usize;
            sums[mask] = sums[mask & (mask - 1)] + i128::from(entries[low].1.cents());
        }

        let mut search = Self {
            sums,
            memo: vec![None; size],
            choice: vec![0; size],
            groups: Vec::new(),
        };

        let full = (size - 1) as u32;
        search.dfs(full);

        let mut mask = full;
        while mask != 0 {
            let group = search.choice[mask as usize];
            search.groups.push(group);
            mask ^= group;
        }
        search
    }

    /// Most disjoint zero groups covering `mask`. `mask` itself always sums to zero.
    fn dfs(&mut self, mask: u32) -> u8 {
        if mask == 0 {
            return 0;
        }
        if let Some(known) = self.memo[mask as usize] {
            return known;
        }

        // Every zero-sum mask splits entirely into zero groups, so one of them holds
        // the lowest member; fixing it in M loses no partition.
        let low = mask & mask.wrapping_neg();
        let rest = mask ^ low;

        let mut best = 1;
        let mut best_group = mask;
        let mut sub = rest;
        loop {
            let group = sub | low;
            if group != mask && self.sums[group as usize] == 0 {
                let count = 1 + self.dfs(mask ^ group);
                if count > best {
                    best = count;
                    best_group = group;
                }
            }
            if sub == 0 {
                break;
            }
            sub = (sub - 1) & rest;
        }

        self.memo[mask as usize] = Some(best);
        self.choice[mask as usize] = best_group;
        best
    }
}
