//! Shared-expense ledger (split rules, expenses, pairwise balances).
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The
//! [`ExpenseLedger`] is the subject; the [`BalanceSheet`] is the read model it
//! keeps current through synchronous notifications.

pub mod balance_sheet;
pub mod expense;
pub mod ledger;
pub mod split;

pub use balance_sheet::{BalanceSheet, UserPair};
pub use expense::{Expense, NewExpense};
pub use ledger::{ExpenseAdded, ExpenseEvent, ExpenseLedger, ExpenseUpdated};
pub use split::{EqualSplit, ExactSplit, PercentageSplit, Shares, SplitRule, SplitStrategy};
