use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use std::sync::Arc;
use tracing::info;

use crate::domain::commands::transactions::{
    CreateTransactionCommand, DeleteTransactionResult, SimulateTransactionsCommand,
    SimulateTransactionsResult, StatsQuery, TransactionListResult, TransactionQuery, TransactionResult,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::collection_point::{PointStatus, MAX_AMOUNT_LIMIT};
use crate::domain::models::transaction::{PayerInfo, Transaction, TransactionOutcome, REFERENCE_LENGTH};
use crate::domain::models::transaction_stats::{
    TransactionStats, TransactionSummary, DAILY_STATS_DAYS, TOP_PAYMENT_APPS,
};
use crate::domain::transaction_generator::{self, random_code, ID_SUFFIX_LENGTH};
use crate::storage::{CollectionPointStorage, TransactionStorage};

/// Largest batch accepted by a manual simulation request
pub const MAX_SIMULATE_COUNT: u32 = 100;

/// Smallest amount accepted for a hand-entered transaction
pub const MIN_MANUAL_AMOUNT: f64 = 0.01;

const MAX_PAYER_NAME_LENGTH: usize = 100;
const PHONE_PATTERN: &str = r"^[6-9]\d{9}$";

/// Read access to transactions plus one-shot manual generation
#[derive(Clone)]
pub struct TransactionService {
    points: Arc<dyn CollectionPointStorage>,
    transactions: Arc<dyn TransactionStorage>,
}

impl TransactionService {
    pub fn new(points: Arc<dyn CollectionPointStorage>, transactions: Arc<dyn TransactionStorage>) -> Self {
        Self { points, transactions }
    }

    /// List transactions newest first, together with the unpaged total
    pub async fn list_transactions(&self, query: TransactionQuery) -> DomainResult<TransactionListResult> {
        let transactions = self.transactions.list_transactions(&query).await?;
        let total = self.transactions.count_transactions(&query).await?;

        info!("Listed {} of {} transactions", transactions.len(), total);
        Ok(TransactionListResult { transactions, total })
    }

    pub async fn get_transaction(&self, transaction_id: &str) -> DomainResult<Transaction> {
        self.transactions
            .get_transaction(transaction_id)
            .await?
            .ok_or_else(|| DomainError::TransactionNotFound(transaction_id.to_string()))
    }

    /// Summary, per-outcome breakdown, the last seven days and the most
    /// used payment apps for the matching transactions
    pub async fn stats(&self, query: StatsQuery) -> DomainResult<TransactionStats> {
        let filter = query.to_transaction_query();
        let status_breakdown = self.transactions.outcome_breakdown(&filter).await?;
        let summary = TransactionSummary::from_breakdown(&status_breakdown);

        let week_ago = Utc::now() - Duration::days(DAILY_STATS_DAYS);
        let recent = TransactionQuery {
            from: Some(filter.from.map_or(week_ago, |from| from.max(week_ago))),
            ..filter.clone()
        };
        let daily_stats = self.transactions.daily_totals(&recent).await?;
        let top_payment_apps = self.transactions.top_payment_apps(&filter, TOP_PAYMENT_APPS).await?;

        info!(
            "Computed stats over {} transactions (point: {})",
            summary.total_transactions,
            query.point_id.as_deref().unwrap_or("all")
        );
        Ok(TransactionStats {
            summary,
            status_breakdown,
            daily_stats,
            top_payment_apps,
        })
    }

    /// Record a single transaction against an Active point
    pub async fn create_transaction(&self, command: CreateTransactionCommand) -> DomainResult<TransactionResult> {
        info!("Creating transaction for {}: amount={}", command.point_id, command.amount);

        let point = self
            .points
            .find_by_id(&command.point_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(command.point_id.clone()))?;
        if point.status != PointStatus::Active {
            return Err(DomainError::Inactive(point.id));
        }

        let amount = command.amount;
        if !amount.is_finite() || !(MIN_MANUAL_AMOUNT..=MAX_AMOUNT_LIMIT).contains(&amount) {
            return Err(DomainError::validation(format!(
                "Amount must be between {} and {}",
                MIN_MANUAL_AMOUNT, MAX_AMOUNT_LIMIT
            )));
        }
        if let Some(ceiling) = point.max_amount.filter(|max| *max > 0.0) {
            if amount > ceiling {
                return Err(DomainError::validation(format!(
                    "Amount exceeds maximum limit of {}",
                    ceiling
                )));
            }
        }
        let payer_info = validate_payer(command.payer_info)?;

        let now = Utc::now();
        let transaction = {
            let mut rng = StdRng::from_entropy();
            Transaction {
                id: Transaction::generate_id(now.timestamp_millis(), &random_code(&mut rng, ID_SUFFIX_LENGTH)),
                point_id: point.id.clone(),
                amount,
                outcome: command.outcome.unwrap_or(TransactionOutcome::Pending),
                reference: random_code(&mut rng, REFERENCE_LENGTH),
                occurred_at: now,
                payer_info,
            }
        };
        let transaction = self.transactions.create_transaction(&transaction).await?;

        info!("Created transaction {} for {}", transaction.id, point.id);
        Ok(TransactionResult {
            transaction,
            success_message: "Transaction created successfully".to_string(),
        })
    }

    /// Change the outcome of an existing transaction
    pub async fn update_outcome(
        &self,
        transaction_id: &str,
        outcome: TransactionOutcome,
    ) -> DomainResult<TransactionResult> {
        info!("Updating transaction {} to {}", transaction_id, outcome.as_str());
        let transaction = self
            .transactions
            .update_outcome(transaction_id, outcome)
            .await?
            .ok_or_else(|| DomainError::TransactionNotFound(transaction_id.to_string()))?;

        Ok(TransactionResult {
            transaction,
            success_message: "Transaction updated successfully".to_string(),
        })
    }

    pub async fn delete_transaction(&self, transaction_id: &str) -> DomainResult<DeleteTransactionResult> {
        info!("Deleting transaction {}", transaction_id);
        if !self.transactions.delete_transaction(transaction_id).await? {
            return Err(DomainError::TransactionNotFound(transaction_id.to_string()));
        }

        Ok(DeleteTransactionResult {
            transaction_id: transaction_id.to_string(),
            success_message: "Transaction deleted successfully".to_string(),
        })
    }

    /// Generate and persist `count` transactions for an Active point right
    /// away, independent of any running simulation.
    pub async fn simulate(&self, command: SimulateTransactionsCommand) -> DomainResult<SimulateTransactionsResult> {
        let count = command.count.unwrap_or(1);
        if !(1..=MAX_SIMULATE_COUNT).contains(&count) {
            return Err(DomainError::validation(format!(
                "Count must be between 1 and {}",
                MAX_SIMULATE_COUNT
            )));
        }

        let point = self
            .points
            .find_by_id(&command.point_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(command.point_id.clone()))?;
        if point.status != PointStatus::Active {
            return Err(DomainError::Inactive(point.id));
        }

        let generated = {
            let mut rng = StdRng::from_entropy();
            transaction_generator::generate_many(&point, count as usize, &mut rng, Utc::now())
        };

        let mut transactions = Vec::with_capacity(generated.len());
        for transaction in &generated {
            transactions.push(self.transactions.create_transaction(transaction).await?);
        }

        info!("Simulated {} transactions for {}", transactions.len(), point.id);
        Ok(SimulateTransactionsResult {
            success_message: format!("Generated {} transactions for {}", transactions.len(), point.id),
            transactions,
        })
    }
}

fn validate_payer(payer: PayerInfo) -> DomainResult<PayerInfo> {
    let name = payer.name.trim();
    let length = name.chars().count();
    if length == 0 || length > MAX_PAYER_NAME_LENGTH {
        return Err(DomainError::validation(format!(
            "Payer name must be 1-{} characters",
            MAX_PAYER_NAME_LENGTH
        )));
    }

    let phone = payer.phone.trim();
    let phone_pattern = Regex::new(PHONE_PATTERN).map_err(anyhow::Error::from)?;
    if !phone_pattern.is_match(phone) {
        return Err(DomainError::validation(format!("Invalid phone number: {}", phone)));
    }

    Ok(PayerInfo {
        name: name.to_string(),
        phone: phone.to_string(),
        payment_app: payer.payment_app,
    })
}
