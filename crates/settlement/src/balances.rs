use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use splitledger_core::{LedgerError, LedgerResult, Money, UserId, ValueObject};
use splitledger_ledger::BalanceSheet;

/// One settling payment: `from` pays `to` the `amount`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub from: UserId,
    pub to: UserId,
    pub amount: Money,
}

impl ValueObject for Transaction {}

impl Transaction {
    pub fn new(from: UserId, to: UserId, amount: Money) -> Self {
        Self { from, to, amount }
    }
}

impl core::fmt::Display for Transaction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} pays {} {}", self.from, self.to, self.amount)
    }
}

/// Snapshot of per-user net balances: negative = owes, positive = is owed.
///
/// Zero balances are dropped on construction, every balance is within `±i64::MAX`
/// cents, and the snapshot always sums to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NetBalances {
    balances: BTreeMap<UserId, Money>,
}

impl NetBalances {
    pub fn new(balances: impl IntoIterator<Item = (UserId, Money)>) -> LedgerResult<Self> {
        let mut net: BTreeMap<UserId, Money> = BTreeMap::new();
        for (user, amount) in balances {
            let entry = net.entry(user).or_insert(Money::ZERO);
            *entry = entry.checked_add(amount)?;
        }
        net.retain(|_, amount| !amount.is_zero());

        let total: i128 = net.values().map(|amount| amount.wide()).sum();
        if total != 0 {
            return Err(LedgerError::Unbalanced(Money::saturating_from_wide(total)));
        }

        Ok(Self { balances: net })
    }

    /// Snapshot the current net positions of a balance sheet.
    pub fn from_sheet(sheet: &BalanceSheet) -> LedgerResult<Self> {
        Self::new(sheet.net_balances())
    }

    /// Number of non-zero balances.
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn get(&self, user: UserId) -> Money {
        self.balances.get(&user).copied().unwrap_or(Money::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, Money)> + '_ {
        self.balances.iter().map(|(&u, &m)| (u, m))
    }

    /// Non-zero balances in ascending user order.
    pub fn entries(&self) -> Vec<(UserId, Money)> {
        self.iter().collect()
    }

    /// Balances left after executing `transactions`; an empty map means fully settled.
    pub fn apply_transactions(&self, transactions: &[Transaction]) -> LedgerResult<BTreeMap<UserId, Money>> {
        let mut residual = self.balances.clone();
        for tx in transactions {
            let from = residual.entry(tx.from).or_insert(Money::ZERO);
            *from = from.checked_add(tx.amount)?;
            let to = residual.entry(tx.to).or_insert(Money::ZERO);
            *to = to.checked_sub(tx.amount)?;
        }
        residual.retain(|_, amount| !amount.is_zero());
        Ok(residual)
    }

    pub fn is_settled_by(&self, transactions: &[Transaction]) -> bool {
        self.apply_transactions(transactions)
            .map(|residual| residual.is_empty())
            .unwrap_or(false)
    }
}
