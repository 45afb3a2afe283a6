//! Aggregates over stored transactions, as shown on the dashboard.
use chrono::NaiveDate;

use super::transaction::{PaymentApp, TransactionOutcome};

/// Number of payment apps reported in the stats view
pub const TOP_PAYMENT_APPS: u32 = 5;

/// Days covered by the daily series
pub const DAILY_STATS_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeTotals {
    pub outcome: TransactionOutcome,
    pub count: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotals {
    pub day: NaiveDate,
    pub count: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAppTotals {
    pub payment_app: PaymentApp,
    pub count: u64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSummary {
    pub total_transactions: u64,
    pub total_amount: f64,
    pub successful_transactions: u64,
    pub failed_transactions: u64,
    pub pending_transactions: u64,
    pub successful_amount: f64,
    pub average_amount: f64,
    /// Percentage of successful transactions, two decimals; 0 when empty
    pub success_rate: f64,
}

impl TransactionSummary {
    /// Fold a per-outcome breakdown into the headline numbers
    pub fn from_breakdown(breakdown: &[OutcomeTotals]) -> Self {
        let mut summary = TransactionSummary::default();
        for totals in breakdown {
            summary.total_transactions += totals.count;
            summary.total_amount += totals.total_amount;
            match totals.outcome {
                TransactionOutcome::Success => {
                    summary.successful_transactions += totals.count;
                    summary.successful_amount += totals.total_amount;
                }
                TransactionOutcome::Failed => summary.failed_transactions += totals.count,
                TransactionOutcome::Pending => summary.pending_transactions += totals.count,
            }
        }

        if summary.total_transactions > 0 {
            let total = summary.total_transactions as f64;
            summary.average_amount = summary.total_amount / total;
            summary.success_rate = round_two(summary.successful_transactions as f64 / total * 100.0);
        }
        summary
    }
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Everything the stats endpoint returns
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionStats {
    pub summary: TransactionSummary,
    pub status_breakdown: Vec<OutcomeTotals>,
    pub daily_stats: Vec<DailyTotals>,
    pub top_payment_apps: Vec<PaymentAppTotals>,
}

/// Per-point numbers attached to a point's detail view
#[derive(Debug, Clone, PartialEq)]
pub struct PointStats {
    pub total_transactions: u64,
    pub status_breakdown: Vec<OutcomeTotals>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_breakdown() {
        let breakdown = vec![
            OutcomeTotals { outcome: TransactionOutcome::Success, count: 3, total_amount: 300.0 },
            OutcomeTotals { outcome: TransactionOutcome::Failed, count: 1, total_amount: 50.0 },
            OutcomeTotals { outcome: TransactionOutcome::Pending, count: 2, total_amount: 250.0 },
        ];

        let summary = TransactionSummary::from_breakdown(&breakdown);
        assert_eq!(summary.total_transactions, 6);
        assert_eq!(summary.total_amount, 600.0);
        assert_eq!(summary.successful_transactions, 3);
        assert_eq!(summary.failed_transactions, 1);
        assert_eq!(summary.pending_transactions, 2);
        assert_eq!(summary.successful_amount, 300.0);
        assert_eq!(summary.average_amount, 100.0);
        assert_eq!(summary.success_rate, 50.0);
    }

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = TransactionSummary::from_breakdown(&[]);
        assert_eq!(summary, TransactionSummary::default());
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_success_rate_rounds_to_two_decimals() {
        let breakdown = vec![
            OutcomeTotals { outcome: TransactionOutcome::Success, count: 2, total_amount: 20.0 },
            OutcomeTotals { outcome: TransactionOutcome::Failed, count: 1, total_amount: 10.0 },
        ];
        assert_eq!(TransactionSummary::from_breakdown(&breakdown).success_rate, 66.67);
    }
}
