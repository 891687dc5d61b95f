//! Balance sheet: pairwise-debt read model kept current by ledger notifications.
//!
//! Tracks, per ordered `(debtor, creditor)` pair, how much the debtor owes the
//! creditor summed over every active expense. The two directions of a pair are
//! stored independently; net figures are derived at query time only.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use splitledger_core::{Entity, ExpenseId, LedgerError, LedgerResult, Money, UserId};
use splitledger_events::Observer;

use crate::expense::Expense;
use crate::ledger::{ExpenseEvent, ExpenseLedger};

/// Ordered pair key: `debtor` owes `creditor`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserPair {
    pub debtor: UserId,
    pub creditor: UserId,
}

impl UserPair {
    pub fn new(debtor: UserId, creditor: UserId) -> Self {
        Self { debtor, creditor }
    }

    pub fn reversed(self) -> Self {
        Self {
            debtor: self.creditor,
            creditor: self.debtor,
        }
    }
}

#[derive(Debug, Default)]
struct SheetState {
    debts: BTreeMap<UserPair, Money>,
    applied: BTreeSet<ExpenseId>,
}

/// Pairwise balances derived from every expense the ledger reported.
///
/// Only [`Observer::notify`] mutates the sheet. Queries take a read lock; a
/// notification holds the write lock for the whole event, so readers never see a
/// partially applied expense.
#[derive(Debug, Default)]
pub struct BalanceSheet {
    state: RwLock<SheetState>,
}

impl BalanceSheet {
    pub const OBSERVER_NAME: &'static str = "balance-sheet";

    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a fresh sheet by replaying every active expense of `ledger`.
    pub fn from_ledger(ledger: &ExpenseLedger) -> LedgerResult<Self> {
        let sheet = Self::new();
        for expense in ledger.expenses() {
            sheet.notify(&ExpenseEvent::added(expense.clone()))?;
        }
        debug!(expenses = ledger.len(), "balance sheet rebuilt from ledger");
        Ok(sheet)
    }

    /// Net debt between two users: positive means `u1` owes `u2`.
    pub fn balance(&self, u1: UserId, u2: UserId) -> Money {
        let state = self.read();
        let owes = Self::pair(&state, UserPair::new(u1, u2));
        let owed = Self::pair(&state, UserPair::new(u2, u1));
        owes - owed
    }

    /// Net position of one user: negative = net debtor, positive = net creditor.
    pub fn total_balance(&self, user: UserId) -> Money {
        let state = self.read();
        // `apply` keeps every net position in range, so this never clamps.
        Money::saturating_from_wide(Self::wide_net(&state.debts, user))
    }

    /// Net position of every user appearing in any pair.
    pub fn net_balances(&self) -> BTreeMap<UserId, Money> {
        let state = self.read();
        let mut net: BTreeMap<UserId, i128> = BTreeMap::new();
        for (pair, amount) in &state.debts {
            *net.entry(pair.creditor).or_default() += amount.wide();
            *net.entry(pair.debtor).or_default() -= amount.wide();
        }
        net.into_iter()
            .map(|(user, cents)| (user, Money::saturating_from_wide(cents)))
            .collect()
    }

    /// Snapshot of the raw directed pair map (zero entries omitted).
    pub fn debts(&self) -> BTreeMap<UserPair, Money> {
        self.read().debts.clone()
    }

    pub fn users(&self) -> BTreeSet<UserId> {
        self.read()
            .debts
            .keys()
            .flat_map(|pair| [pair.debtor, pair.creditor])
            .collect()
    }

    /// Number of expenses currently reflected in the sheet.
    pub fn applied_expenses(&self) -> usize {
        self.read().applied.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SheetState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn pair(state: &SheetState, key: UserPair) -> Money {
        state.debts.get(&key).copied().unwrap_or(Money::ZERO)
    }

    fn wide_net(debts: &BTreeMap<UserPair, Money>, user: UserId) -> i128 {
        debts
            .iter()
            .map(|(pair, amount)| {
                if pair.creditor == user {
                    amount.wide()
                } else if pair.debtor == user {
                    -amount.wide()
                } else {
                    0
                }
            })
            .sum()
    }

    fn accumulate(
        deltas: &mut BTreeMap<UserPair, Money>,
        expense: &Expense,
        reverse: bool,
    ) -> LedgerResult<()> {
        let payer = expense.payer();
        for (debtor, share) in expense.debts_to_payer() {
            let delta = deltas
                .entry(UserPair::new(debtor, payer))
                .or_insert(Money::ZERO);
            *delta = if reverse {
                delta.checked_sub(share)?
            } else {
                delta.checked_add(share)?
            };
        }
        Ok(())
    }

    fn apply(&self, event: &ExpenseEvent) -> LedgerResult<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let mut deltas = BTreeMap::new();
        match event {
            ExpenseEvent::Added(e) => {
                let id = e.expense.id();
                if state.applied.contains(&id) {
                    return Err(LedgerError::DuplicateExpenseId(id));
                }
                Self::accumulate(&mut deltas, &e.expense, false)?;
            }
            ExpenseEvent::Updated(e) => {
                let id = e.previous.id();
                if !e.previous.same_entity(&e.current) {
                    return Err(LedgerError::malformed(format!(
                        "update replaces {id} with a different expense {}",
                        e.current.id()
                    )));
                }
                if !state.applied.contains(&id) {
                    return Err(LedgerError::UnknownExpenseId(id));
                }
                // Diff-apply: reverse what `previous` contributed, then add `current`.
                Self::accumulate(&mut deltas, &e.previous, true)?;
                Self::accumulate(&mut deltas, &e.current, false)?;
            }
        }

        // Stage every new value before writing any, so a failure leaves the sheet unchanged.
        let mut staged = Vec::with_capacity(deltas.len());
        for (pair, delta) in deltas {
            let updated = Self::pair(&state, pair).checked_add(delta)?;
            if updated.is_negative() {
                return Err(LedgerError::invalid_split(format!(
                    "update would leave {} owing {} a negative amount",
                    pair.debtor, pair.creditor
                )));
            }
            staged.push((pair, updated));
        }

        // Each pair fitting is not enough: a user's net over all pairs must fit too.
        let mut shifts: BTreeMap<UserId, i128> = BTreeMap::new();
        for &(pair, updated) in &staged {
            let change = updated.wide() - Self::pair(&state, pair).wide();
            *shifts.entry(pair.creditor).or_default() += change;
            *shifts.entry(pair.debtor).or_default() -= change;
        }
        for (user, change) in shifts {
            let net = Self::wide_net(&state.debts, user) + change;
            if Money::from_wide(net).is_err() {
                warn!(user = %user, expense_id = %event.expense_id(), "net balance out of range; expense not applied");
                return Err(LedgerError::Overflow);
            }
        }

        for (pair, updated) in staged {
            if updated.is_zero() {
                state.debts.remove(&pair);
            } else {
                state.debts.insert(pair, updated);
            }
        }
        state.applied.insert(event.expense_id());

        Ok(())
    }
}

impl Observer<ExpenseEvent> for BalanceSheet {
    fn name(&self) -> &str {
        Self::OBSERVER_NAME
    }

    fn notify(&self, event: &ExpenseEvent) -> LedgerResult<()> {
        self.apply(event)?;
        debug!(expense_id = %event.expense_id(), "balance sheet applied expense");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::expense::NewExpense;
    use crate::split::SplitRule;
    use splitledger_core::Percent;

    const ALICE: UserId = UserId::from_u128(1);
    const BOB: UserId = UserId::from_u128(2);
    const CHARLIE: UserId = UserId::from_u128(3);

    fn pct(whole: u32) -> Percent {
        Percent::from_whole(whole).unwrap()
    }

    fn setup() -> (ExpenseLedger, Arc<BalanceSheet>) {
        let sheet = Arc::new(BalanceSheet::new());
        let mut ledger = ExpenseLedger::new();
        ledger.add_observer(sheet.clone());
        (ledger, sheet)
    }

    fn dinner_and_movie(ledger: &mut ExpenseLedger) {
        ledger
            .submit(NewExpense {
                id: ExpenseId::from_u128(1),
                description: "dinner".to_string(),
                amount: Money::from_major(60),
                payer: ALICE,
                participants: vec![ALICE, BOB, CHARLIE],
                split: SplitRule::Equal,
            })
            .unwrap();
        ledger
            .submit(NewExpense {
                id: ExpenseId::from_u128(2),
                description: "movie".to_string(),
                amount: Money::from_major(45),
                payer: BOB,
                participants: vec![ALICE, BOB, CHARLIE],
                split: SplitRule::percentage([(ALICE, pct(40)), (BOB, pct(30)), (CHARLIE, pct(30))]),
            })
            .unwrap();
    }

    #[test]
    fn pair_directions_are_stored_independently() {
        let (mut ledger, sheet) = setup();
        dinner_and_movie(&mut ledger);

        let debts = sheet.debts();
        assert_eq!(debts[&UserPair::new(BOB, ALICE)], Money::from_major(20));
        assert_eq!(debts[&UserPair::new(ALICE, BOB)], Money::from_major(18));
        assert_eq!(debts[&UserPair::new(CHARLIE, BOB)], Money::from_cents(1350));

        // Net is derived at query time only.
        assert_eq!(sheet.balance(BOB, ALICE), Money::from_major(2));
        assert_eq!(sheet.balance(ALICE, BOB), Money::from_major(-2));
    }

    #[test]
    fn totals_match_dinner_and_movie_scenario() {
        let (mut ledger, sheet) = setup();
        dinner_and_movie(&mut ledger);

        assert_eq!(sheet.total_balance(ALICE), Money::from_cents(2200));
        assert_eq!(sheet.total_balance(BOB), Money::from_cents(1150));
        assert_eq!(sheet.total_balance(CHARLIE), Money::from_cents(-3350));
        assert_eq!(sheet.net_balances().values().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn balance_queries_are_idempotent() {
        let (mut ledger, sheet) = setup();
        dinner_and_movie(&mut ledger);

        let first = sheet.balance(CHARLIE, ALICE);
        let second = sheet.balance(CHARLIE, ALICE);
        assert_eq!(first, second);
        assert_eq!(first, Money::from_major(20));
    }

    #[test]
    fn update_reverses_previous_shares_before_applying_new_ones() {
        let (mut ledger, sheet) = setup();
        dinner_and_movie(&mut ledger);

        // Dinner is re-entered: Charlie paid instead of Alice, Alice and Charlie only.
        let corrected = Expense::new(NewExpense {
            id: ExpenseId::from_u128(1),
            description: "dinner".to_string(),
            amount: Money::from_major(60),
            payer: CHARLIE,
            participants: vec![ALICE, CHARLIE],
            split: SplitRule::Equal,
        })
        .unwrap();
        ledger.update_expense(corrected).unwrap();

        assert_eq!(sheet.applied_expenses(), 2);
        assert_eq!(sheet.balance(BOB, ALICE), Money::from_major(-18));
        assert_eq!(sheet.balance(ALICE, CHARLIE), Money::from_major(30));
        assert_eq!(sheet.total_balance(ALICE), Money::from_major(-48));
        assert_eq!(sheet.net_balances().values().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn replaying_the_same_expense_twice_is_rejected_without_change() {
        let sheet = BalanceSheet::new();
        let expense = Expense::new(NewExpense {
            id: ExpenseId::from_u128(5),
            description: "taxi".to_string(),
            amount: Money::from_major(10),
            payer: ALICE,
            participants: vec![ALICE, BOB],
            split: SplitRule::Equal,
        })
        .unwrap();

        sheet.notify(&ExpenseEvent::added(expense.clone())).unwrap();
        let before = sheet.debts();
        let err = sheet.notify(&ExpenseEvent::added(expense)).unwrap_err();

        assert_eq!(err, LedgerError::DuplicateExpenseId(ExpenseId::from_u128(5)));
        assert_eq!(sheet.debts(), before);
    }

    #[test]
    fn update_between_different_expenses_is_rejected() {
        let (mut ledger, sheet) = setup();
        dinner_and_movie(&mut ledger);
        let before = sheet.debts();

        let dinner = ledger.get(ExpenseId::from_u128(1)).cloned().unwrap();
        let movie = ledger.get(ExpenseId::from_u128(2)).cloned().unwrap();
        let err = sheet.notify(&ExpenseEvent::updated(dinner, movie)).unwrap_err();

        assert!(matches!(err, LedgerError::MalformedParticipants(_)));
        assert_eq!(sheet.debts(), before);
    }

    #[test]
    fn overflowing_expense_leaves_sheet_unchanged() {
        let sheet = BalanceSheet::new();
        let huge = |id: u128| {
            Expense::from_parts(
                ExpenseId::from_u128(id),
                "huge",
                Money::from_cents(i64::MAX),
                ALICE,
                vec![ALICE, BOB],
                [(ALICE, Money::ZERO), (BOB, Money::from_cents(i64::MAX))].into_iter().collect(),
            )
            .unwrap()
        };

        sheet.notify(&ExpenseEvent::added(huge(1))).unwrap();
        let err = sheet.notify(&ExpenseEvent::added(huge(2))).unwrap_err();

        assert_eq!(err, LedgerError::Overflow);
        assert_eq!(sheet.applied_expenses(), 1);
        assert_eq!(sheet.balance(BOB, ALICE), Money::from_cents(i64::MAX));
    }

    fn owed_to(id: u128, debtor: UserId, creditor: UserId, cents: i64) -> Expense {
        Expense::from_parts(
            ExpenseId::from_u128(id),
            "large",
            Money::from_cents(cents),
            creditor,
            vec![creditor, debtor],
            [(creditor, Money::ZERO), (debtor, Money::from_cents(cents))].into_iter().collect(),
        )
        .unwrap()
    }

    #[test]
    fn creditor_total_out_of_range_is_rejected() {
        let sheet = BalanceSheet::new();
        let half = i64::MAX / 2 + 10;

        sheet.notify(&ExpenseEvent::added(owed_to(1, BOB, ALICE, half))).unwrap();
        let before = sheet.debts();
        let err = sheet
            .notify(&ExpenseEvent::added(owed_to(2, CHARLIE, ALICE, half)))
            .unwrap_err();

        assert_eq!(err, LedgerError::Overflow);
        assert_eq!(sheet.applied_expenses(), 1);
        assert_eq!(sheet.debts(), before);
        assert_eq!(sheet.total_balance(ALICE), Money::from_cents(half));
        assert_eq!(sheet.net_balances().values().sum::<Money>(), Money::ZERO);
    }

    #[test]
    fn debtor_total_below_range_is_rejected() {
        let sheet = BalanceSheet::new();

        sheet
            .notify(&ExpenseEvent::added(owed_to(1, CHARLIE, ALICE, i64::MAX)))
            .unwrap();
        let err = sheet
            .notify(&ExpenseEvent::added(owed_to(2, CHARLIE, BOB, 1)))
            .unwrap_err();

        assert_eq!(err, LedgerError::Overflow);
        assert_eq!(sheet.total_balance(CHARLIE), Money::from_cents(-i64::MAX));
        assert_eq!(sheet.net_balances()[&CHARLIE], Money::from_cents(-i64::MAX));
    }

    #[test]
    fn rebuild_from_ledger_matches_live_sheet() {
        let (mut ledger, sheet) = setup();
        dinner_and_movie(&mut ledger);

        let rebuilt = BalanceSheet::from_ledger(&ledger).unwrap();
        assert_eq!(rebuilt.debts(), sheet.debts());
        assert_eq!(rebuilt.users(), BTreeSet::from([ALICE, BOB, CHARLIE]));
    }

    fn user(n: u8) -> UserId {
        UserId::from_u128(u128::from(n) + 1)
    }

    /// Percentages splitting 100% as evenly as basis points allow; the first takes the rest.
    fn even_percentages(participants: &[UserId]) -> SplitRule {
        let n = participants.len() as u32;
        let each = Percent::FULL_BASIS_POINTS / n;
        let first = Percent::FULL_BASIS_POINTS - each * (n - 1);
        SplitRule::percentage(participants.iter().enumerate().map(|(i, &u)| {
            let bp = if i == 0 { first } else { each };
            (u, Percent::from_basis_points(bp).unwrap())
        }))
    }

    prop_compose! {
        fn arb_request()(
            payer in 0u8..6,
            others in prop::collection::btree_set(0u8..6, 1..6),
            cents in prop::collection::vec(0i64..100_000, 6),
            rule in 0u8..3,
        ) -> NewExpense {
            let mut participants: Vec<UserId> = others.into_iter().map(user).collect();
            if !participants.contains(&user(payer)) {
                participants.push(user(payer));
            }

            let (amount, split) = match rule {
                0 => (Money::from_cents(cents[0] + 1), SplitRule::Equal),
                1 => (Money::from_cents(cents[0] + 1), even_percentages(&participants)),
                _ => {
                    // One extra cent on the first share keeps the amount positive.
                    let owed: Vec<(UserId, Money)> = participants
                        .iter()
                        .zip(&cents)
                        .enumerate()
                        .map(|(i, (&u, &c))| (u, Money::from_cents(c + i64::from(i == 0))))
                        .collect();
                    let amount: Money = owed.iter().map(|(_, m)| *m).sum();
                    (amount, SplitRule::exact(owed))
                }
            };

            NewExpense {
                id: ExpenseId::from_u128(0),
                description: format!("{} expense", split.tag()),
                amount,
                payer: user(payer),
                participants,
                split,
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: over any mix of rules, adds and updates, totals sum to exactly zero,
        /// pairs are antisymmetric, and the live sheet equals a rebuild from the ledger.
        #[test]
        fn money_is_conserved(
            ops in prop::collection::vec(
                (any::<bool>(), any::<prop::sample::Index>(), arb_request()),
                1..16,
            )
        ) {
            let (mut ledger, sheet) = setup();
            let mut next_id = 0u128;
            for (update, target, mut request) in ops {
                if update && !ledger.is_empty() {
                    request.id = ledger.expenses()[target.index(ledger.len())].id();
                    ledger.update_expense(Expense::new(request).unwrap()).unwrap();
                } else {
                    next_id += 1;
                    request.id = ExpenseId::from_u128(next_id);
                    ledger.submit(request).unwrap();
                }
            }

            let users = sheet.users();
            let total: Money = users.iter().map(|&u| sheet.total_balance(u)).sum();
            prop_assert_eq!(total, Money::ZERO);

            for &u1 in &users {
                for &u2 in &users {
                    prop_assert_eq!(sheet.balance(u1, u2), -sheet.balance(u2, u1));
                }
            }

            let rebuilt = BalanceSheet::from_ledger(&ledger).unwrap();
            prop_assert_eq!(rebuilt.debts(), sheet.debts());
            prop_assert_eq!(sheet.applied_expenses(), ledger.len());
        }
    }
}
