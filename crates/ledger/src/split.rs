//! Split rules: how an expense amount is divided between participants.
//!
//! Every strategy is a pure function of `(amount, participants, parameters)`.
//! Amounts are whole cents, so each rule fixes where leftover cents go:
//!
//! - **Equal**: `amount mod n` leftover cents go one each to the first participants
//!   in listed order (100.00 / 3 → 33.34, 33.33, 33.33).
//! - **Percentage**: each share is floored to the cent. When percentages total exactly
//!   100%, the cents lost to flooring go one each to participants with a non-zero
//!   percentage, in listed order. Otherwise shares are returned as computed and will
//!   not reconcile with the amount; expense validation rejects them.
//! - **Exact**: pass-through, must sum to the amount.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use splitledger_core::{LedgerError, LedgerResult, Money, Percent, UserId};

/// Owed share per participant.
pub type Shares = BTreeMap<UserId, Money>;

/// Computes each participant's owed share of an expense.
pub trait SplitStrategy {
    fn calculate_split(&self, amount: Money, participants: &[UserId]) -> LedgerResult<Shares>;
}

/// Everyone owes the same amount (up to one cent).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualSplit;

/// Each participant owes a percentage of the amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercentageSplit {
    percentages: BTreeMap<UserId, Percent>,
}

/// Each participant owes an explicit amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExactSplit {
    amounts: BTreeMap<UserId, Money>,
}

/// Split rule tag plus rule-specific parameters, as submitted by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "parameters", rename_all = "snake_case")]
pub enum SplitRule {
    Equal,
    Percentage(PercentageSplit),
    Exact(ExactSplit),
}

impl PercentageSplit {
    pub fn new(percentages: impl IntoIterator<Item = (UserId, Percent)>) -> Self {
        Self {
            percentages: percentages.into_iter().collect(),
        }
    }

    pub fn percentages(&self) -> &BTreeMap<UserId, Percent> {
        &self.percentages
    }

    /// Sum of all percentages in basis points (not capped at 100%).
    pub fn total_basis_points(&self) -> u64 {
        self.percentages
            .values()
            .map(|p| u64::from(p.basis_points()))
            .sum()
    }
}

impl ExactSplit {
    pub fn new(amounts: impl IntoIterator<Item = (UserId, Money)>) -> Self {
        Self {
            amounts: amounts.into_iter().collect(),
        }
    }

    pub fn amounts(&self) -> &BTreeMap<UserId, Money> {
        &self.amounts
    }
}

impl SplitRule {
    pub fn percentage(percentages: impl IntoIterator<Item = (UserId, Percent)>) -> Self {
        Self::Percentage(PercentageSplit::new(percentages))
    }

    pub fn exact(amounts: impl IntoIterator<Item = (UserId, Money)>) -> Self {
        Self::Exact(ExactSplit::new(amounts))
    }

    /// Stable tag for logs.
    pub fn tag(&self) -> &'static str {
        match self {
            SplitRule::Equal => "equal",
            SplitRule::Percentage(_) => "percentage",
            SplitRule::Exact(_) => "exact",
        }
    }
}

impl SplitStrategy for SplitRule {
    fn calculate_split(&self, amount: Money, participants: &[UserId]) -> LedgerResult<Shares> {
        match self {
            SplitRule::Equal => EqualSplit.calculate_split(amount, participants),
            SplitRule::Percentage(rule) => rule.calculate_split(amount, participants),
            SplitRule::Exact(rule) => rule.calculate_split(amount, participants),
        }
    }
}

fn ensure_known<'a, V>(
    parameters: impl IntoIterator<Item = (&'a UserId, V)>,
    participants: &[UserId],
    rule: &str,
) -> LedgerResult<()> {
    for (user, _) in parameters {
        if !participants.contains(user) {
            return Err(LedgerError::malformed(format!(
                "{rule} split names {user}, who is not a participant"
            )));
        }
    }
    Ok(())
}

/// Hand out `remainder` cents (signed) one at a time to `recipients`, in order.
fn distribute_remainder(shares: &mut Shares, recipients: &[UserId], remainder: i64) {
    let step = Money::from_cents(remainder.signum());
    for user in recipients.iter().take(remainder.unsigned_abs() as usize) {
        if let Some(share) = shares.get_mut(user) {
            *share += step;
        }
    }
}

impl SplitStrategy for EqualSplit {
    fn calculate_split(&self, amount: Money, participants: &[UserId]) -> LedgerResult<Shares> {
        if participants.is_empty() {
            return Err(LedgerError::malformed("equal split needs at least one participant"));
        }

        let n = participants.len() as i64;
        let base = Money::from_cents(amount.cents() / n);
        let remainder = amount.cents() % n;

        let mut shares: Shares = participants.iter().map(|&user| (user, base)).collect();
        distribute_remainder(&mut shares, participants, remainder);
        Ok(shares)
    }
}

impl SplitStrategy for PercentageSplit {
    fn calculate_split(&self, amount: Money, participants: &[UserId]) -> LedgerResult<Shares> {
        ensure_known(&self.percentages, participants, "percentage")?;

        let mut shares = Shares::new();
        let mut recipients = Vec::new();
        for &user in participants {
            let pct = self.percentages.get(&user).copied().unwrap_or_default();
            shares.insert(user, pct.of(amount));
            if pct.basis_points() > 0 {
                recipients.push(user);
            }
        }

        if self.total_basis_points() == u64::from(Percent::FULL_BASIS_POINTS) {
            let allocated: Money = shares.values().sum();
            let remainder = (amount - allocated).cents();
            distribute_remainder(&mut shares, &recipients, remainder);
        }

        Ok(shares)
    }
}

impl SplitStrategy for ExactSplit {
    fn calculate_split(&self, amount: Money, participants: &[UserId]) -> LedgerResult<Shares> {
        ensure_known(&self.amounts, participants, "exact")?;

        let mut shares = Shares::new();
        for &user in participants {
            let owed = self.amounts.get(&user).copied().unwrap_or_default();
            if owed.is_negative() {
                return Err(LedgerError::invalid_split(format!(
                    "exact share for {user} is negative ({owed})"
                )));
            }
            shares.insert(user, owed);
        }

        let total = Money::checked_sum(shares.values().copied())?;
        if total != amount {
            return Err(LedgerError::invalid_split(format!(
                "exact shares sum to {total}, expense amount is {amount}"
            )));
        }

        Ok(shares)
    }
}
