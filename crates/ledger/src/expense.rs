use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use splitledger_core::{Entity, ExpenseId, LedgerError, LedgerResult, Money, UserId};

use crate::split::{Shares, SplitRule, SplitStrategy};

/// Expense submission as received from the outer API layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: Money,
    pub payer: UserId,
    pub participants: Vec<UserId>,
    pub split: SplitRule,
}

/// A shared cost: one payer, participants who each owe a share.
///
/// Invariants (checked on every construction path):
/// - the amount is positive
/// - participants are non-empty and distinct
/// - every participant, payer included, has a share (possibly zero), and no one else does
/// - shares are non-negative and sum exactly to the amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expense {
    id: ExpenseId,
    description: String,
    amount: Money,
    payer: UserId,
    participants: Vec<UserId>,
    shares: Shares,
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Expense {
    /// Build an expense by running its split rule.
    pub fn new(request: NewExpense) -> LedgerResult<Self> {
        ensure_positive(request.amount)?;
        ensure_distinct(&request.participants)?;

        let shares = request
            .split
            .calculate_split(request.amount, &request.participants)?;

        Self::from_parts(
            request.id,
            request.description,
            request.amount,
            request.payer,
            request.participants,
            shares,
        )
    }

    /// Build an expense from already computed shares (e.g. records restored by a caller).
    pub fn from_parts(
        id: ExpenseId,
        description: impl Into<String>,
        amount: Money,
        payer: UserId,
        participants: Vec<UserId>,
        shares: Shares,
    ) -> LedgerResult<Self> {
        let expense = Self {
            id,
            description: description.into(),
            amount,
            payer,
            participants,
            shares,
        };
        expense.validate()?;
        Ok(expense)
    }

    /// Re-check every invariant.
    pub fn validate(&self) -> LedgerResult<()> {
        ensure_positive(self.amount)?;
        ensure_distinct(&self.participants)?;

        if !self.shares.contains_key(&self.payer) {
            return Err(LedgerError::malformed(format!(
                "payer {} has no share entry",
                self.payer
            )));
        }

        for participant in &self.participants {
            if !self.shares.contains_key(participant) {
                return Err(LedgerError::malformed(format!(
                    "participant {participant} has no share entry"
                )));
            }
        }
        if self.shares.len() != self.participants.len() {
            return Err(LedgerError::malformed(
                "shares name users who are not participants",
            ));
        }

        if let Some((user, share)) = self.shares.iter().find(|(_, s)| s.is_negative()) {
            return Err(LedgerError::invalid_split(format!(
                "share for {user} is negative ({share})"
            )));
        }

        let total = Money::checked_sum(self.shares.values().copied())?;
        if total != self.amount {
            return Err(LedgerError::invalid_split(format!(
                "shares sum to {total}, expense amount is {}",
                self.amount
            )));
        }

        Ok(())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn payer(&self) -> UserId {
        self.payer
    }

    /// Participants in submission order.
    pub fn participants(&self) -> &[UserId] {
        &self.participants
    }

    pub fn shares(&self) -> &Shares {
        &self.shares
    }

    pub fn share_of(&self, user: UserId) -> Option<Money> {
        self.shares.get(&user).copied()
    }

    /// `(debtor, amount)` for every participant other than the payer with a non-zero share.
    pub fn debts_to_payer(&self) -> impl Iterator<Item = (UserId, Money)> + '_ {
        self.shares
            .iter()
            .filter(|(user, share)| **user != self.payer && !share.is_zero())
            .map(|(&user, &share)| (user, share))
    }
}

fn ensure_positive(amount: Money) -> LedgerResult<()> {
    if !amount.is_positive() {
        return Err(LedgerError::invalid_split(format!(
            "expense amount must be positive (got {amount})"
        )));
    }
    Ok(())
}

fn ensure_distinct(participants: &[UserId]) -> LedgerResult<()> {
    if participants.is_empty() {
        return Err(LedgerError::malformed("expense has no participants"));
    }
    let mut seen = BTreeSet::new();
    for participant in participants {
        if !seen.insert(participant) {
            return Err(LedgerError::malformed(format!(
                "participant {participant} listed twice"
            )));
        }
    }
    Ok(())
}
