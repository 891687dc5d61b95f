use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use splitledger_core::{Entity, ExpenseId, LedgerError, LedgerResult};
use splitledger_events::{Event, Observer, ObserverId, ObserverRegistry};

use crate::expense::{Expense, NewExpense};

/// Event: an expense became active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseAdded {
    pub expense: Expense,
    pub occurred_at: DateTime<Utc>,
}

/// Event: an active expense was replaced by id.
///
/// Carries both versions so observers can reverse `previous` before applying `current`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseUpdated {
    pub previous: Expense,
    pub current: Expense,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExpenseEvent {
    Added(ExpenseAdded),
    Updated(ExpenseUpdated),
}

impl ExpenseEvent {
    pub fn added(expense: Expense) -> Self {
        ExpenseEvent::Added(ExpenseAdded {
            expense,
            occurred_at: Utc::now(),
        })
    }

    pub fn updated(previous: Expense, current: Expense) -> Self {
        ExpenseEvent::Updated(ExpenseUpdated {
            previous,
            current,
            occurred_at: Utc::now(),
        })
    }

    pub fn expense_id(&self) -> ExpenseId {
        match self {
            ExpenseEvent::Added(e) => e.expense.id(),
            ExpenseEvent::Updated(e) => e.current.id(),
        }
    }
}

impl Event for ExpenseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ExpenseEvent::Added(_) => "ledger.expense.added",
            ExpenseEvent::Updated(_) => "ledger.expense.updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ExpenseEvent::Added(e) => e.occurred_at,
            ExpenseEvent::Updated(e) => e.occurred_at,
        }
    }
}

/// The subject: single source of truth for which expenses are active.
///
/// Mutations take `&mut self`, so one ledger instance has at most one mutation in
/// flight; services sharing a ledger put it behind a single writer lock. Each
/// mutation validates first, commits, then notifies observers in registration order
/// before returning.
#[derive(Debug, Default)]
pub struct ExpenseLedger {
    expenses: Vec<Expense>,
    index: HashMap<ExpenseId, usize>,
    observers: ObserverRegistry<ExpenseEvent>,
    version: u64,
}

impl ExpenseLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for every later add/update.
    pub fn add_observer(&mut self, observer: Arc<dyn Observer<ExpenseEvent>>) -> ObserverId {
        self.observers.register(observer)
    }

    /// Unregister an observer. Returns `false` if it was not registered.
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Validate, append, then notify observers with [`ExpenseEvent::Added`].
    ///
    /// Validation failures leave the ledger untouched and notify no one. An observer
    /// failure is returned after the expense was committed; observers before the
    /// failing one have applied it, the ones after have not.
    pub fn add_expense(&mut self, expense: Expense) -> LedgerResult<()> {
        expense.validate()?;
        let id = expense.id();
        if self.index.contains_key(&id) {
            return Err(LedgerError::DuplicateExpenseId(id));
        }

        self.index.insert(id, self.expenses.len());
        self.expenses.push(expense.clone());
        self.version += 1;

        let event = ExpenseEvent::added(expense);
        debug!(
            expense_id = %id,
            event = event.event_type(),
            version = self.version,
            observers = self.observers.len(),
            "expense added"
        );

        self.observers.dispatch(&event)?;
        Ok(())
    }

    /// Build an expense from its split rule and add it.
    pub fn submit(&mut self, request: NewExpense) -> LedgerResult<ExpenseId> {
        let rule = request.split.tag();
        let expense = Expense::new(request)?;
        let id = expense.id();
        debug!(expense_id = %id, rule, "expense submitted");
        self.add_expense(expense)?;
        Ok(id)
    }

    /// Replace the expense with the same id and notify with [`ExpenseEvent::Updated`].
    ///
    /// Returns the replaced expense.
    pub fn update_expense(&mut self, expense: Expense) -> LedgerResult<Expense> {
        expense.validate()?;
        let id = expense.id();
        let slot = *self
            .index
            .get(&id)
            .ok_or(LedgerError::UnknownExpenseId(id))?;

        let previous = std::mem::replace(&mut self.expenses[slot], expense.clone());
        self.version += 1;

        debug!(
            expense_id = %id,
            previous_amount = %previous.amount(),
            amount = %expense.amount(),
            version = self.version,
            "expense updated"
        );

        self.observers
            .dispatch(&ExpenseEvent::updated(previous.clone(), expense))?;
        Ok(previous)
    }

    pub fn get(&self, id: ExpenseId) -> Option<&Expense> {
        self.index.get(&id).map(|&slot| &self.expenses[slot])
    }

    pub fn contains(&self, id: ExpenseId) -> bool {
        self.index.contains_key(&id)
    }

    /// Active expenses in insertion order.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    /// Number of committed mutations (adds + updates).
    pub fn version(&self) -> u64 {
        self.version
    }
}
