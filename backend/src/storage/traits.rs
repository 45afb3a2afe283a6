//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.
//!
//! Every implementation must uphold one invariant: writing `status = Inactive`
//! to a point also forces `simulation_enabled = false`.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::commands::points::PointFilter;
use crate::domain::commands::transactions::TransactionQuery;
use crate::domain::models::collection_point::{CollectionPoint, PointStatus};
use crate::domain::models::transaction::{Transaction, TransactionOutcome};
use crate::domain::models::transaction_stats::{DailyTotals, OutcomeTotals, PaymentAppTotals};

/// Trait defining the interface for collection point storage operations
#[async_trait]
pub trait CollectionPointStorage: Send + Sync {
    /// Store a new collection point
    async fn store_point(&self, point: &CollectionPoint) -> Result<()>;

    /// Retrieve a point by id
    async fn find_by_id(&self, point_id: &str) -> Result<Option<CollectionPoint>>;

    /// List points matching the filter, newest first, honoring limit/offset
    async fn list_points(&self, filter: &PointFilter) -> Result<Vec<CollectionPoint>>;

    /// Count points matching the filter, ignoring limit/offset
    async fn count_points(&self, filter: &PointFilter) -> Result<u64>;

    /// All points with `status = Active` and `simulation_enabled = true`
    async fn find_eligible_for_simulation(&self) -> Result<Vec<CollectionPoint>>;

    /// Overwrite the editable fields of an existing point
    async fn update_point(&self, point: &CollectionPoint) -> Result<()>;

    /// Persist a status change and return the updated record, or `None` if
    /// the point does not exist
    async fn set_status(&self, point_id: &str, status: PointStatus) -> Result<Option<CollectionPoint>>;

    /// Persist the simulation flag and return the updated record, or `None`
    /// if the point does not exist
    async fn set_simulation_enabled(&self, point_id: &str, enabled: bool) -> Result<Option<CollectionPoint>>;

    /// Set `simulation_enabled = false` on every point.
    /// Returns the number of points that were enabled.
    async fn clear_simulation_flags(&self) -> Result<u64>;

    /// Delete a point. Returns true if it existed.
    async fn delete_point(&self, point_id: &str) -> Result<bool>;
}

/// Trait defining the interface for transaction storage operations
#[async_trait]
pub trait TransactionStorage: Send + Sync {
    /// Persist a single transaction and return the stored record
    async fn create_transaction(&self, transaction: &Transaction) -> Result<Transaction>;

    /// Retrieve a transaction by its payment id
    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>>;

    /// List transactions matching the query, newest first, honoring limit/offset
    async fn list_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>>;

    /// Count transactions matching the query, ignoring limit/offset
    async fn count_transactions(&self, query: &TransactionQuery) -> Result<u64>;

    /// Change the outcome of a transaction and return the updated record,
    /// or `None` if it does not exist
    async fn update_outcome(&self, transaction_id: &str, outcome: TransactionOutcome) -> Result<Option<Transaction>>;

    /// Delete a single transaction. Returns true if it existed.
    async fn delete_transaction(&self, transaction_id: &str) -> Result<bool>;

    /// Delete all transactions of a point. Returns the number deleted.
    async fn delete_transactions_for_point(&self, point_id: &str) -> Result<u64>;

    /// Count and amount per outcome for matching transactions, in
    /// Success, Failed, Pending order. Outcomes with no rows are omitted.
    async fn outcome_breakdown(&self, query: &TransactionQuery) -> Result<Vec<OutcomeTotals>>;

    /// Count and amount per UTC calendar day, oldest day first
    async fn daily_totals(&self, query: &TransactionQuery) -> Result<Vec<DailyTotals>>;

    /// The `limit` most used payment apps, by count then app name
    async fn top_payment_apps(&self, query: &TransactionQuery, limit: u32) -> Result<Vec<PaymentAppTotals>>;
}
