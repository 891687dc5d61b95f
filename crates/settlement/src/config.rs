//! Settlement configuration (search bounds).

use tracing::warn;

/// Default bound on non-zero balances for the exact subset DP (`O(3^n)` time, `O(2^n)` memory).
pub const MAX_EXACT_BALANCES: usize = 16;

/// Default bound on non-zero balances for the backtracking reference search.
pub const MAX_BACKTRACKING_BALANCES: usize = 12;

/// Absolute ceiling for either bound; larger configured values are clamped.
pub const SEARCH_HARD_CAP: usize = 20;

pub const ENV_MAX_EXACT_BALANCES: &str = "SPLITLEDGER_MAX_EXACT_BALANCES";
pub const ENV_MAX_BACKTRACKING_BALANCES: &str = "SPLITLEDGER_MAX_BACKTRACKING_BALANCES";

/// Bounds applied by the settlement planner before running an exponential search.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SettlementConfig {
    max_exact_balances: usize,
    max_backtracking_balances: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            max_exact_balances: MAX_EXACT_BALANCES,
            max_backtracking_balances: MAX_BACKTRACKING_BALANCES,
        }
    }
}

impl SettlementConfig {
    /// Above this many non-zero balances the exact DP is not attempted.
    pub fn max_exact_balances(&self) -> usize {
        self.max_exact_balances
    }

    /// Above this many non-zero balances the backtracking search is not attempted.
    pub fn max_backtracking_balances(&self) -> usize {
        self.max_backtracking_balances
    }

    pub fn with_max_exact_balances(mut self, max: usize) -> Self {
        self.max_exact_balances = clamp("max_exact_balances", max);
        self
    }

    pub fn with_max_backtracking_balances(mut self, max: usize) -> Self {
        self.max_backtracking_balances = clamp("max_backtracking_balances", max);
        self
    }

    /// Defaults overridden by `SPLITLEDGER_MAX_EXACT_BALANCES` /
    /// `SPLITLEDGER_MAX_BACKTRACKING_BALANCES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(max) = parse_var(&lookup, ENV_MAX_EXACT_BALANCES) {
            config = config.with_max_exact_balances(max);
        }
        if let Some(max) = parse_var(&lookup, ENV_MAX_BACKTRACKING_BALANCES) {
            config = config.with_max_backtracking_balances(max);
        }
        config
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<usize> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = key, value = %raw, "ignoring unparsable settlement bound; using default");
            None
        }
    }
}

/// Cap applied to any bound before a search runs.
pub(crate) fn capped(limit: usize) -> usize {
    limit.min(SEARCH_HARD_CAP)
}

fn clamp(field: &str, max: usize) -> usize {
    if max > SEARCH_HARD_CAP {
        warn!(field, requested = max, cap = SEARCH_HARD_CAP, "settlement bound clamped");
        SEARCH_HARD_CAP
    } else {
        max
    }
}
