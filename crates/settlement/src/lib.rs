//! Settlement planning over net balances.
//!
//! Every algorithm here is a stateless transformation of a [`NetBalances`]
//! snapshot into a list of [`Transaction`]s that zero it out:
//!
//! - [`greedy`]: pairs debtors with creditors in order, at most `n − 1` transfers
//! - [`backtracking`]: exhaustive pairwise absorption, reference count
//! - [`exact`]: subset DP over zero-sum groups, the true minimum
//!
//! The two exponential searches are bounded by [`SettlementConfig`]; the
//! [`SettlementPlanner`] falls back to greedy above the bound and reports it.

pub mod backtracking;
pub mod balances;
pub mod config;
pub mod exact;
pub mod greedy;
pub mod planner;

pub use balances::{NetBalances, Transaction};
pub use config::{
    MAX_BACKTRACKING_BALANCES, MAX_EXACT_BALANCES, SEARCH_HARD_CAP, SettlementConfig,
};
pub use planner::{FallbackReason, SettlementMode, SettlementPlan, SettlementPlanner};
