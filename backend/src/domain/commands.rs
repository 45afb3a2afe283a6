//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer is responsible for mapping the
//! public DTOs defined in the `shared` crate to these internal types.

pub mod points {
    use crate::domain::models::collection_point::{
        CollectionPoint, PointCategory, PointStatus,
    };
    use crate::domain::models::transaction_stats::PointStats;

    /// Input for registering a new collection point.
    #[derive(Debug, Clone)]
    pub struct CreatePointCommand {
        pub id: Option<String>,
        pub reference_name: String,
        pub vpa: String,
        pub description: Option<String>,
        pub category: Option<PointCategory>,
        pub notes: Option<String>,
        pub max_amount: Option<f64>,
    }

    /// Partial update; `None` leaves the field untouched.
    #[derive(Debug, Clone, Default)]
    pub struct UpdatePointCommand {
        pub reference_name: Option<String>,
        pub vpa: Option<String>,
        pub description: Option<String>,
        pub category: Option<PointCategory>,
        pub notes: Option<String>,
        pub max_amount: Option<f64>,
    }

    /// Filter for listing points. All criteria are combined with AND.
    /// `limit`/`offset` page the result; `None` returns every match.
    #[derive(Debug, Clone, Default)]
    pub struct PointFilter {
        pub status: Option<PointStatus>,
        pub category: Option<PointCategory>,
        pub search: Option<String>,
        pub limit: Option<u32>,
        pub offset: Option<u32>,
    }

    impl PointFilter {
        pub fn matches(&self, point: &CollectionPoint) -> bool {
            if let Some(status) = self.status {
                if point.status != status {
                    return false;
                }
            }
            if let Some(category) = self.category {
                if point.category != category {
                    return false;
                }
            }
            if let Some(search) = self.search.as_deref() {
                let needle = search.to_lowercase();
                let hit = point.id.to_lowercase().contains(&needle)
                    || point.reference_name.to_lowercase().contains(&needle)
                    || point.vpa.to_lowercase().contains(&needle);
                if !hit {
                    return false;
                }
            }
            true
        }
    }

    /// One page of points plus the number of matches across all pages.
    #[derive(Debug, Clone)]
    pub struct PointListResult {
        pub points: Vec<CollectionPoint>,
        pub total: u64,
    }

    #[derive(Debug, Clone)]
    pub struct PointDetails {
        pub point: CollectionPoint,
        pub stats: PointStats,
    }

    /// Result of a point mutation.
    #[derive(Debug, Clone)]
    pub struct PointResult {
        pub point: CollectionPoint,
        pub success_message: String,
    }

    /// Result of deleting a point together with its transactions.
    #[derive(Debug, Clone)]
    pub struct DeletePointResult {
        pub point_id: String,
        pub deleted_transactions: u64,
        pub success_message: String,
    }
}

pub mod transactions {
    use chrono::{DateTime, Utc};

    use crate::domain::models::transaction::{PayerInfo, Transaction, TransactionOutcome};

    pub const DEFAULT_LIST_LIMIT: u32 = 50;
    pub const MAX_LIST_LIMIT: u32 = 500;

    /// Query parameters for listing transactions, newest first.
    #[derive(Debug, Clone, Default)]
    pub struct TransactionQuery {
        pub point_id: Option<String>,
        pub outcome: Option<TransactionOutcome>,
        /// Inclusive lower bound on `occurred_at`
        pub from: Option<DateTime<Utc>>,
        /// Inclusive upper bound on `occurred_at`
        pub until: Option<DateTime<Utc>>,
        pub limit: Option<u32>,
        pub offset: Option<u32>,
    }

    impl TransactionQuery {
        pub fn for_point(point_id: &str) -> Self {
            Self {
                point_id: Some(point_id.to_string()),
                ..Default::default()
            }
        }

        pub fn effective_limit(&self) -> u32 {
            self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
        }

        pub fn effective_offset(&self) -> u32 {
            self.offset.unwrap_or(0)
        }

        pub fn matches(&self, transaction: &Transaction) -> bool {
            if let Some(point_id) = self.point_id.as_deref() {
                if transaction.point_id != point_id {
                    return false;
                }
            }
            if let Some(outcome) = self.outcome {
                if transaction.outcome != outcome {
                    return false;
                }
            }
            if self.from.is_some_and(|from| transaction.occurred_at < from) {
                return false;
            }
            if self.until.is_some_and(|until| transaction.occurred_at > until) {
                return false;
            }
            true
        }
    }

    /// Result of listing transactions.
    #[derive(Debug, Clone)]
    pub struct TransactionListResult {
        pub transactions: Vec<Transaction>,
        pub total: u64,
    }

    /// Input for a one-shot manual generation run.
    #[derive(Debug, Clone)]
    pub struct SimulateTransactionsCommand {
        pub point_id: String,
        pub count: Option<u32>,
    }

    /// Result of a manual generation run.
    #[derive(Debug, Clone)]
    pub struct SimulateTransactionsResult {
        pub transactions: Vec<Transaction>,
        pub success_message: String,
    }

    /// Input for recording a single transaction by hand.
    #[derive(Debug, Clone)]
    pub struct CreateTransactionCommand {
        pub point_id: String,
        pub amount: f64,
        /// Defaults to `Pending`
        pub outcome: Option<TransactionOutcome>,
        pub payer_info: PayerInfo,
    }

    #[derive(Debug, Clone)]
    pub struct TransactionResult {
        pub transaction: Transaction,
        pub success_message: String,
    }

    #[derive(Debug, Clone)]
    pub struct DeleteTransactionResult {
        pub transaction_id: String,
        pub success_message: String,
    }

    /// Filter for the stats view
    #[derive(Debug, Clone, Default)]
    pub struct StatsQuery {
        pub point_id: Option<String>,
        pub from: Option<DateTime<Utc>>,
        pub until: Option<DateTime<Utc>>,
    }

    impl StatsQuery {
        pub fn to_transaction_query(&self) -> TransactionQuery {
            TransactionQuery {
                point_id: self.point_id.clone(),
                from: self.from,
                until: self.until,
                ..Default::default()
            }
        }
    }
}

pub mod simulation {
    use crate::domain::models::collection_point::PointStatus;

    /// Outcome of `toggle`: the resulting state and a human-readable message.
    #[derive(Debug, Clone, PartialEq)]
    pub struct ToggleOutcome {
        pub active: bool,
        pub message: String,
    }

    /// Point-in-time snapshot of the scheduler registry.
    #[derive(Debug, Clone, PartialEq)]
    pub struct SchedulerSnapshot {
        pub active_count: usize,
        /// Sorted ids of points with a running task
        pub running_ids: Vec<String>,
        pub initialized: bool,
    }

    impl SchedulerSnapshot {
        pub fn is_running(&self, point_id: &str) -> bool {
            self.running_ids.binary_search_by(|id| id.as_str().cmp(point_id)).is_ok()
        }
    }

    /// Result of an explicit start or stop request.
    #[derive(Debug, Clone)]
    pub struct SimulationActionResult {
        pub point_id: String,
        pub simulation_enabled: bool,
        pub message: String,
    }

    #[derive(Debug, Clone)]
    pub struct PointSimulationState {
        pub point_id: String,
        pub reference_name: String,
        pub status: PointStatus,
        pub simulation_enabled: bool,
        pub is_running: bool,
    }

    /// Scheduler snapshot joined with stored point state.
    #[derive(Debug, Clone)]
    pub struct SimulationStatusResult {
        pub snapshot: SchedulerSnapshot,
        pub points: Vec<PointSimulationState>,
    }

    #[derive(Debug, Clone)]
    pub struct StopAllResult {
        pub stopped: usize,
        pub message: String,
    }
}
