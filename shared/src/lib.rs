//! # Shared DTOs
//!
//! Request and response types exchanged between the dashboard frontend and the
//! backend REST API. Everything here is plain data; the backend maps these to
//! and from its own domain models.
//!
//! Field names are camelCase on the wire and timestamps are RFC 3339 strings.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a collection point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointStatus {
    Active,
    Inactive,
}

/// Business category a collection point is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointCategory {
    Retail,
    Rental,
    Education,
    Custom,
}

impl Default for PointCategory {
    fn default() -> Self {
        PointCategory::Custom
    }
}

/// Settlement outcome of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionOutcome {
    Success,
    Failed,
    Pending,
}

/// UPI application the payer used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentApp {
    GPay,
    PhonePe,
    Paytm,
    #[serde(rename = "BHIM")]
    Bhim,
    AmazonPay,
    WhatsApp,
    Other,
}

/// A payment-acceptance point (shown as a "QR code" in the dashboard)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPoint {
    pub id: String,
    pub reference_name: String,
    /// UPI virtual payment address, e.g. `shop.42@okbank`
    pub vpa: String,
    pub description: Option<String>,
    pub category: PointCategory,
    pub notes: Option<String>,
    /// Ceiling for simulated amounts; absent or zero means the default ceiling
    pub max_amount: Option<f64>,
    pub status: PointStatus,
    pub simulation_enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Synthetic payer details attached to a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerInfo {
    pub name: String,
    pub phone: String,
    pub payment_app: PaymentApp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Payment id in format `PAY<epoch_millis><suffix>`
    pub id: String,
    pub point_id: String,
    pub amount: f64,
    pub outcome: TransactionOutcome,
    /// 12 character alphanumeric settlement reference (UTR)
    pub reference: String,
    pub occurred_at: String,
    pub payer_info: PayerInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePointRequest {
    /// Optional caller-chosen id (exactly 5 characters of A-Z / 0-9)
    pub id: Option<String>,
    pub reference_name: String,
    pub vpa: String,
    pub description: Option<String>,
    pub category: Option<PointCategory>,
    pub notes: Option<String>,
    pub max_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePointRequest {
    pub reference_name: Option<String>,
    pub vpa: Option<String>,
    pub description: Option<String>,
    pub category: Option<PointCategory>,
    pub notes: Option<String>,
    pub max_amount: Option<f64>,
}

/// Query parameters for listing collection points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointListRequest {
    pub status: Option<PointStatus>,
    pub category: Option<PointCategory>,
    /// Case-insensitive match against id, reference name and VPA
    pub search: Option<String>,
    /// 1-based page number, default 1
    pub page: Option<u32>,
    /// Page size, default 10
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointResponse {
    pub point: CollectionPoint,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointListResponse {
    pub points: Vec<CollectionPoint>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current 1-based page
    pub current: u32,
    pub total_pages: u32,
    /// Items on this page
    pub count: usize,
    /// Items matching the filter across all pages
    pub total_records: u64,
}

/// Count and amount for one transaction outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeBreakdown {
    pub outcome: TransactionOutcome,
    pub count: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointStats {
    pub total_transactions: u64,
    pub status_breakdown: Vec<OutcomeBreakdown>,
}

/// A single point with its transaction stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointDetailResponse {
    pub point: CollectionPoint,
    pub stats: PointStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePointResponse {
    pub point_id: String,
    pub deleted_transactions: u64,
    pub success_message: String,
}

/// Query parameters for listing transactions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListRequest {
    pub point_id: Option<String>,
    pub outcome: Option<TransactionOutcome>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListResponse {
    pub transactions: Vec<Transaction>,
    /// Number of transactions matching the filter, ignoring limit/offset
    pub total: u64,
}

/// Manually record a transaction. `outcome` defaults to Pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub point_id: String,
    pub amount: f64,
    pub outcome: Option<TransactionOutcome>,
    pub payer_info: PayerInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    pub outcome: TransactionOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub transaction: Transaction,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTransactionResponse {
    pub transaction_id: String,
    pub success_message: String,
}

/// Query parameters for the stats view. Dates are `YYYY-MM-DD` or RFC 3339;
/// a bare `endDate` covers that whole day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatsRequest {
    pub point_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub total_transactions: u64,
    pub total_amount: f64,
    pub successful_transactions: u64,
    pub failed_transactions: u64,
    pub pending_transactions: u64,
    pub successful_amount: f64,
    pub average_amount: f64,
    /// Percentage, two decimals
    pub success_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// UTC day as `YYYY-MM-DD`
    pub date: String,
    pub count: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAppStats {
    pub payment_app: PaymentApp,
    pub count: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatsResponse {
    pub summary: TransactionSummary,
    pub status_breakdown: Vec<OutcomeBreakdown>,
    /// Last seven days, oldest first
    pub daily_stats: Vec<DailyStats>,
    /// At most five apps, most used first
    pub top_payment_apps: Vec<PaymentAppStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionsRequest {
    pub point_id: String,
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub success_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleSimulationResponse {
    pub point_id: String,
    pub active: bool,
    pub message: String,
}

/// Response for explicit start / stop requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationActionResponse {
    pub point_id: String,
    pub simulation_enabled: bool,
    pub message: String,
}

/// Per-point view combining the stored flag with the in-memory scheduler state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointSimulationStatus {
    pub point_id: String,
    pub reference_name: String,
    pub status: PointStatus,
    pub simulation_enabled: bool,
    pub is_running: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStatusResponse {
    pub active_count: usize,
    pub running_ids: Vec<String>,
    pub initialized: bool,
    pub points: Vec<PointSimulationStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopAllSimulationsResponse {
    pub stopped: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// Body returned for every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
