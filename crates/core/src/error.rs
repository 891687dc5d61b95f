//! Domain error model.

use thiserror::Error;

use crate::id::ExpenseId;
use crate::money::Money;

/// Result type used across the ledger and settlement layers.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, bounds). Every variant is raised before any state is mutated,
/// except `ObserverFailed`, which reports a failure after the ledger committed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Computed shares do not reconcile with the expense amount.
    #[error("invalid split input: {0}")]
    InvalidSplitInput(String),

    /// Duplicate participant, empty participant list, or payer missing from shares.
    #[error("malformed participants: {0}")]
    MalformedParticipants(String),

    /// An update referenced an expense the ledger does not hold.
    #[error("unknown expense id: {0}")]
    UnknownExpenseId(ExpenseId),

    /// An add referenced an expense id that is already active.
    #[error("duplicate expense id: {0}")]
    DuplicateExpenseId(ExpenseId),

    /// An exponential settlement search was asked to handle too many balances.
    #[error("{algorithm} settlement bound exceeded ({balances} non-zero balances, limit {limit})")]
    AlgorithmicBoundExceeded {
        algorithm: &'static str,
        balances: usize,
        limit: usize,
    },

    /// A net-balance snapshot does not sum to zero.
    #[error("net balances do not sum to zero (residual {0})")]
    Unbalanced(Money),

    /// A registered observer rejected a notification.
    #[error("observer `{observer}` failed: {source}")]
    ObserverFailed {
        observer: String,
        source: Box<LedgerError>,
    },

    /// Money arithmetic left the representable range.
    #[error("money arithmetic overflow")]
    Overflow,

    /// A money or percentage literal could not be parsed or is out of range.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// A settlement mode tag was not recognised.
    #[error("unknown settlement mode: {0}")]
    UnknownSettlementMode(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl LedgerError {
    pub fn invalid_split(msg: impl Into<String>) -> Self {
        Self::InvalidSplitInput(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedParticipants(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn observer_failed(observer: impl Into<String>, source: LedgerError) -> Self {
        Self::ObserverFailed {
            observer: observer.into(),
            source: Box::new(source),
        }
    }

    /// True when the error came from an exponential search bound.
    pub fn is_bound_exceeded(&self) -> bool {
        matches!(self, Self::AlgorithmicBoundExceeded { .. })
    }
}
