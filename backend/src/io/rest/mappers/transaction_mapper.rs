use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use shared::{
    CreateTransactionRequest, DailyStats, DeleteTransactionResponse, OutcomeBreakdown, PayerInfo,
    PaymentApp, PaymentAppStats, SimulateTransactionsRequest, SimulateTransactionsResponse, Transaction,
    TransactionListRequest, TransactionListResponse, TransactionOutcome, TransactionResponse,
    TransactionStatsRequest, TransactionStatsResponse, TransactionSummary,
};

use crate::domain::commands::transactions::{
    CreateTransactionCommand, DeleteTransactionResult, SimulateTransactionsCommand,
    SimulateTransactionsResult, StatsQuery, TransactionListResult, TransactionQuery, TransactionResult,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::transaction::{
    PayerInfo as DomainPayerInfo, PaymentApp as DomainPaymentApp, Transaction as DomainTransaction,
    TransactionOutcome as DomainTransactionOutcome,
};
use crate::domain::models::transaction_stats::{OutcomeTotals, TransactionStats};

pub struct TransactionMapper;

impl TransactionMapper {
    pub fn outcome_to_domain(outcome: TransactionOutcome) -> DomainTransactionOutcome {
        match outcome {
            TransactionOutcome::Success => DomainTransactionOutcome::Success,
            TransactionOutcome::Failed => DomainTransactionOutcome::Failed,
            TransactionOutcome::Pending => DomainTransactionOutcome::Pending,
        }
    }

    pub fn outcome_to_dto(outcome: DomainTransactionOutcome) -> TransactionOutcome {
        match outcome {
            DomainTransactionOutcome::Success => TransactionOutcome::Success,
            DomainTransactionOutcome::Failed => TransactionOutcome::Failed,
            DomainTransactionOutcome::Pending => TransactionOutcome::Pending,
        }
    }

    pub fn payment_app_to_dto(app: DomainPaymentApp) -> PaymentApp {
        match app {
            DomainPaymentApp::GPay => PaymentApp::GPay,
            DomainPaymentApp::PhonePe => PaymentApp::PhonePe,
            DomainPaymentApp::Paytm => PaymentApp::Paytm,
            DomainPaymentApp::Bhim => PaymentApp::Bhim,
            DomainPaymentApp::AmazonPay => PaymentApp::AmazonPay,
            DomainPaymentApp::WhatsApp => PaymentApp::WhatsApp,
            DomainPaymentApp::Other => PaymentApp::Other,
        }
    }

    pub fn payment_app_to_domain(app: PaymentApp) -> DomainPaymentApp {
        match app {
            PaymentApp::GPay => DomainPaymentApp::GPay,
            PaymentApp::PhonePe => DomainPaymentApp::PhonePe,
            PaymentApp::Paytm => DomainPaymentApp::Paytm,
            PaymentApp::Bhim => DomainPaymentApp::Bhim,
            PaymentApp::AmazonPay => DomainPaymentApp::AmazonPay,
            PaymentApp::WhatsApp => DomainPaymentApp::WhatsApp,
            PaymentApp::Other => DomainPaymentApp::Other,
        }
    }

    pub fn to_dto(domain: DomainTransaction) -> Transaction {
        Transaction {
            id: domain.id,
            point_id: domain.point_id,
            amount: domain.amount,
            outcome: Self::outcome_to_dto(domain.outcome),
            reference: domain.reference,
            occurred_at: domain.occurred_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            payer_info: PayerInfo {
                name: domain.payer_info.name,
                phone: domain.payer_info.phone,
                payment_app: Self::payment_app_to_dto(domain.payer_info.payment_app),
            },
        }
    }

    pub fn to_dto_list(transactions: Vec<DomainTransaction>) -> Vec<Transaction> {
        transactions.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_query(request: TransactionListRequest) -> TransactionQuery {
        TransactionQuery {
            point_id: request.point_id,
            outcome: request.outcome.map(Self::outcome_to_domain),
            limit: request.limit,
            offset: request.offset,
            ..Default::default()
        }
    }

    pub fn to_list_response(result: TransactionListResult) -> TransactionListResponse {
        TransactionListResponse {
            transactions: Self::to_dto_list(result.transactions),
            total: result.total,
        }
    }

    pub fn to_simulate_command(request: SimulateTransactionsRequest) -> SimulateTransactionsCommand {
        SimulateTransactionsCommand {
            point_id: request.point_id,
            count: request.count,
        }
    }

    pub fn to_simulate_response(result: SimulateTransactionsResult) -> SimulateTransactionsResponse {
        SimulateTransactionsResponse {
            transactions: Self::to_dto_list(result.transactions),
            success_message: result.success_message,
        }
    }

    pub fn to_create_command(request: CreateTransactionRequest) -> CreateTransactionCommand {
        CreateTransactionCommand {
            point_id: request.point_id,
            amount: request.amount,
            outcome: request.outcome.map(Self::outcome_to_domain),
            payer_info: DomainPayerInfo {
                name: request.payer_info.name,
                phone: request.payer_info.phone,
                payment_app: Self::payment_app_to_domain(request.payer_info.payment_app),
            },
        }
    }

    pub fn to_transaction_response(result: TransactionResult) -> TransactionResponse {
        TransactionResponse {
            transaction: Self::to_dto(result.transaction),
            success_message: result.success_message,
        }
    }

    pub fn to_delete_response(result: DeleteTransactionResult) -> DeleteTransactionResponse {
        DeleteTransactionResponse {
            transaction_id: result.transaction_id,
            success_message: result.success_message,
        }
    }

    /// Fails with a validation error when a date does not parse
    pub fn to_stats_query(request: TransactionStatsRequest) -> DomainResult<StatsQuery> {
        Ok(StatsQuery {
            point_id: request.point_id.filter(|id| !id.trim().is_empty()),
            from: request.start_date.as_deref().map(|d| parse_date_bound(d, false)).transpose()?,
            until: request.end_date.as_deref().map(|d| parse_date_bound(d, true)).transpose()?,
        })
    }

    pub fn breakdown_to_dto(breakdown: Vec<OutcomeTotals>) -> Vec<OutcomeBreakdown> {
        breakdown
            .into_iter()
            .map(|totals| OutcomeBreakdown {
                outcome: Self::outcome_to_dto(totals.outcome),
                count: totals.count,
                total_amount: totals.total_amount,
            })
            .collect()
    }

    pub fn to_stats_response(stats: TransactionStats) -> TransactionStatsResponse {
        let summary = stats.summary;
        TransactionStatsResponse {
            summary: TransactionSummary {
                total_transactions: summary.total_transactions,
                total_amount: summary.total_amount,
                successful_transactions: summary.successful_transactions,
                failed_transactions: summary.failed_transactions,
                pending_transactions: summary.pending_transactions,
                successful_amount: summary.successful_amount,
                average_amount: summary.average_amount,
                success_rate: summary.success_rate,
            },
            status_breakdown: Self::breakdown_to_dto(stats.status_breakdown),
            daily_stats: stats
                .daily_stats
                .into_iter()
                .map(|day| DailyStats {
                    date: day.day.format("%Y-%m-%d").to_string(),
                    count: day.count,
                    amount: day.amount,
                })
                .collect(),
            top_payment_apps: stats
                .top_payment_apps
                .into_iter()
                .map(|app| PaymentAppStats {
                    payment_app: Self::payment_app_to_dto(app.payment_app),
                    count: app.count,
                    total_amount: app.total_amount,
                })
                .collect(),
        }
    }
}

/// Accept RFC 3339 or a bare `YYYY-MM-DD`. A bare date as an upper bound
/// covers the whole day.
fn parse_date_bound(value: &str, end_of_day: bool) -> DomainResult<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| DomainError::validation(format!("Invalid date: {}", value)))?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    let naive = time.ok_or_else(|| DomainError::validation(format!("Invalid date: {}", value)))?;
    Ok(Utc.from_utc_datetime(&naive))
}
