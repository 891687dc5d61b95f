use core::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use splitledger_core::{LedgerError, LedgerResult};
use splitledger_ledger::BalanceSheet;

use crate::balances::{NetBalances, Transaction};
use crate::config::SettlementConfig;
use crate::{backtracking, exact, greedy};

/// Which algorithm a caller asks for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMode {
    Greedy,
    Backtracking,
    Exact,
}

impl SettlementMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SettlementMode::Greedy => "greedy",
            SettlementMode::Backtracking => backtracking::ALGORITHM,
            SettlementMode::Exact => exact::ALGORITHM,
        }
    }
}

impl core::fmt::Display for SettlementMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementMode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(SettlementMode::Greedy),
            "backtracking" => Ok(SettlementMode::Backtracking),
            "exact" => Ok(SettlementMode::Exact),
            other => Err(LedgerError::UnknownSettlementMode(other.to_string())),
        }
    }
}

/// Why a requested search was not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackReason {
    pub requested: SettlementMode,
    pub balances: usize,
    pub limit: usize,
}

/// A settlement plan plus how it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub requested: SettlementMode,
    /// Algorithm that actually produced `transactions`.
    pub algorithm: SettlementMode,
    pub transactions: Vec<Transaction>,
    /// Set when the requested search exceeded its bound and greedy was used instead.
    pub fallback: Option<FallbackReason>,
}

impl SettlementPlan {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn fell_back(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Produces payment plans from net-balance snapshots.
///
/// Stateless apart from its bounds: every call recomputes from the snapshot passed in.
#[derive(Debug, Copy, Clone, Default)]
pub struct SettlementPlanner {
    config: SettlementConfig,
}

impl SettlementPlanner {
    pub fn new(config: SettlementConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    /// Greedy plan; always valid, at most `debtors + creditors − 1` transactions.
    pub fn simplified_settlements(&self, balances: &NetBalances) -> Vec<Transaction> {
        greedy::settle(&balances.entries())
    }

    /// Transaction count of the backtracking pairwise search.
    pub fn sub_optimal_minimum_settlements(&self, balances: &NetBalances) -> LedgerResult<usize> {
        backtracking::minimum_count(&balances.entries(), self.config.max_backtracking_balances())
    }

    /// True minimum transaction count (`n − max disjoint zero groups`).
    pub fn optimal_minimum_settlements(&self, balances: &NetBalances) -> LedgerResult<usize> {
        exact::minimum_count(&balances.entries(), self.config.max_exact_balances())
    }

    /// Snapshot `sheet` and plan for `mode`.
    pub fn plan_for_sheet(&self, sheet: &BalanceSheet, mode: SettlementMode) -> LedgerResult<SettlementPlan> {
        let balances = NetBalances::from_sheet(sheet)?;
        Ok(self.settlement_plan(&balances, mode))
    }

    /// Plan for `mode`, falling back to greedy when the mode's bound is exceeded.
    pub fn settlement_plan(&self, balances: &NetBalances, mode: SettlementMode) -> SettlementPlan {
        let entries = balances.entries();
        let searched = match mode {
            SettlementMode::Greedy => Ok(greedy::settle(&entries)),
            SettlementMode::Backtracking => {
                backtracking::settle(&entries, self.config.max_backtracking_balances())
            }
            SettlementMode::Exact => exact::settle(&entries, self.config.max_exact_balances()),
        };

        let plan = match searched {
            Ok(transactions) => SettlementPlan {
                requested: mode,
                algorithm: mode,
                transactions,
                fallback: None,
            },
            Err(LedgerError::AlgorithmicBoundExceeded {
                algorithm,
                balances: count,
                limit,
            }) => {
                warn!(
                    algorithm,
                    balances = count,
                    limit,
                    "settlement search bound exceeded; falling back to greedy"
                );
                SettlementPlan {
                    requested: mode,
                    algorithm: SettlementMode::Greedy,
                    transactions: greedy::settle(&entries),
                    fallback: Some(FallbackReason {
                        requested: mode,
                        balances: count,
                        limit,
                    }),
                }
            }
            // The searches only fail on their bound; keep a valid plan regardless.
            Err(err) => {
                warn!(error = %err, %mode, "settlement search failed; falling back to greedy");
                SettlementPlan {
                    requested: mode,
                    algorithm: SettlementMode::Greedy,
                    transactions: greedy::settle(&entries),
                    fallback: None,
                }
            }
        };

        debug!(
            requested = %plan.requested,
            algorithm = %plan.algorithm,
            balances = entries.len(),
            transactions = plan.len(),
            "settlement plan computed"
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SEARCH_HARD_CAP;
    use splitledger_core::{Money, UserId};

    fn net(values: &[i64]) -> NetBalances {
        NetBalances::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| (UserId::from_u128(i as u128 + 1), Money::from_major(v))),
        )
        .unwrap()
    }

    #[test]
    fn every_mode_produces_a_settling_plan() {
        let balances = net(&[-3, -6, -4, 7, 6]);
        let planner = SettlementPlanner::default();

        for mode in [SettlementMode::Greedy, SettlementMode::Backtracking, SettlementMode::Exact] {
            let plan = planner.settlement_plan(&balances, mode);
            assert_eq!(plan.algorithm, mode);
            assert!(!plan.fell_back());
            assert!(balances.is_settled_by(&plan.transactions), "{mode} plan does not settle");
        }
    }

    #[test]
    fn exceeding_exact_bound_falls_back_and_reports() {
        let balances = net(&[-3, -6, -4, 7, 6]);
        let planner = SettlementPlanner::new(SettlementConfig::default().with_max_exact_balances(4));

        let plan = planner.settlement_plan(&balances, SettlementMode::Exact);

        assert_eq!(plan.requested, SettlementMode::Exact);
        assert_eq!(plan.algorithm, SettlementMode::Greedy);
        assert_eq!(
            plan.fallback,
            Some(FallbackReason {
                requested: SettlementMode::Exact,
                balances: 5,
                limit: 4,
            })
        );
        assert!(balances.is_settled_by(&plan.transactions));

        let err = planner.optimal_minimum_settlements(&balances).unwrap_err();
        assert!(err.is_bound_exceeded());
    }

    #[test]
    fn configured_bounds_never_exceed_the_hard_cap() {
        let config = SettlementConfig::default()
            .with_max_exact_balances(31)
            .with_max_backtracking_balances(31);
        assert_eq!(config.max_exact_balances(), SEARCH_HARD_CAP);

        let mut values = vec![1i64; 20];
        values.push(-20);
        let balances = net(&values);
        let planner = SettlementPlanner::new(config);

        let err = planner.optimal_minimum_settlements(&balances).unwrap_err();
        assert_eq!(
            err,
            LedgerError::AlgorithmicBoundExceeded {
                algorithm: exact::ALGORITHM,
                balances: 21,
                limit: SEARCH_HARD_CAP,
            }
        );
        assert!(planner.sub_optimal_minimum_settlements(&balances).unwrap_err().is_bound_exceeded());

        let plan = planner.settlement_plan(&balances, SettlementMode::Exact);
        assert!(plan.fell_back());
        assert!(balances.is_settled_by(&plan.transactions));
    }

    #[test]
    fn modes_parse_from_api_tags() {
        assert_eq!("exact".parse::<SettlementMode>().unwrap(), SettlementMode::Exact);
        assert_eq!(" Greedy ".parse::<SettlementMode>().unwrap(), SettlementMode::Greedy);
        assert!("fastest".parse::<SettlementMode>().is_err());
    }

    #[test]
    fn empty_snapshot_needs_nothing() {
        let planner = SettlementPlanner::default();
        let balances = NetBalances::default();

        assert!(planner.simplified_settlements(&balances).is_empty());
        assert_eq!(planner.sub_optimal_minimum_settlements(&balances).unwrap(), 0);
        assert_eq!(planner.optimal_minimum_settlements(&balances).unwrap(), 0);
    }
}
