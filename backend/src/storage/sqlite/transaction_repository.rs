use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use super::collection_point_repository::{format_timestamp, parse_timestamp};
use super::connection::DbConnection;
use crate::domain::commands::transactions::TransactionQuery;
use crate::domain::models::transaction::{PayerInfo, PaymentApp, Transaction, TransactionOutcome};
use crate::domain::models::transaction_stats::{DailyTotals, OutcomeTotals, PaymentAppTotals};
use crate::storage::traits::TransactionStorage;

const TRANSACTION_COLUMNS: &str =
    "id, point_id, amount, outcome, reference, occurred_at, payer_name, payer_phone, payment_app";

/// Repository for transaction operations
#[derive(Clone)]
pub struct TransactionRepository {
    db: DbConnection,
}

impl TransactionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        let outcome: String = row.get("outcome");
        let payment_app: String = row.get("payment_app");
        let occurred_at: String = row.get("occurred_at");

        Ok(Transaction {
            id: row.get("id"),
            point_id: row.get("point_id"),
            amount: row.get("amount"),
            outcome: TransactionOutcome::from_string(&outcome).map_err(|e| anyhow!(e))?,
            reference: row.get("reference"),
            occurred_at: parse_timestamp(&occurred_at).context("Failed to parse occurred_at")?,
            payer_info: PayerInfo {
                name: row.get("payer_name"),
                phone: row.get("payer_phone"),
                payment_app: PaymentApp::from_string(&payment_app).map_err(|e| anyhow!(e))?,
            },
        })
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &TransactionQuery) {
        if let Some(point_id) = query.point_id.as_ref() {
            builder.push(" AND point_id = ").push_bind(point_id.clone());
        }
        if let Some(outcome) = query.outcome {
            builder.push(" AND outcome = ").push_bind(outcome.as_str());
        }
        // Stored timestamps share one RFC 3339 shape, so text order is time order
        if let Some(from) = query.from {
            builder.push(" AND occurred_at >= ").push_bind(format_timestamp(&from));
        }
        if let Some(until) = query.until {
            builder.push(" AND occurred_at <= ").push_bind(format_timestamp(&until));
        }
    }
}

#[async_trait]
impl TransactionStorage for TransactionRepository {
    async fn create_transaction(&self, transaction: &Transaction) -> Result<Transaction> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, point_id, amount, outcome, reference, occurred_at,
                 payer_name, payer_phone, payment_app)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.point_id)
        .bind(transaction.amount)
        .bind(transaction.outcome.as_str())
        .bind(&transaction.reference)
        .bind(format_timestamp(&transaction.occurred_at))
        .bind(&transaction.payer_info.name)
        .bind(&transaction.payer_info.phone)
        .bind(transaction.payer_info.payment_app.as_str())
        .execute(self.db.pool())
        .await?;
        Ok(transaction.clone())
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(transaction_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    async fn list_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM transactions WHERE 1 = 1",
            TRANSACTION_COLUMNS
        ));
        Self::push_filters(&mut builder, query);
        builder
            .push(" ORDER BY occurred_at DESC, id DESC LIMIT ")
            .push_bind(query.effective_limit() as i64)
            .push(" OFFSET ")
            .push_bind(query.effective_offset() as i64);

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn count_transactions(&self, query: &TransactionQuery) -> Result<u64> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) AS total FROM transactions WHERE 1 = 1");
        Self::push_filters(&mut builder, query);

        let row = builder.build().fetch_one(self.db.pool()).await?;
        let total: i64 = row.get("total");
        Ok(total as u64)
    }

    async fn update_outcome(&self, transaction_id: &str, outcome: TransactionOutcome) -> Result<Option<Transaction>> {
        let result = sqlx::query("UPDATE transactions SET outcome = ? WHERE id = ?")
            .bind(outcome.as_str())
            .bind(transaction_id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_transaction(transaction_id).await
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(transaction_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_transactions_for_point(&self, point_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM transactions WHERE point_id = ?")
            .bind(point_id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    async fn outcome_breakdown(&self, query: &TransactionQuery) -> Result<Vec<OutcomeTotals>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT outcome, COUNT(*) AS tx_count, SUM(amount) AS total_amount FROM transactions WHERE 1 = 1",
        );
        Self::push_filters(&mut builder, query);
        builder.push(" GROUP BY outcome");

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        let mut breakdown = rows
            .iter()
            .map(|row| {
                let outcome: String = row.get("outcome");
                let count: i64 = row.get("tx_count");
                Ok(OutcomeTotals {
                    outcome: TransactionOutcome::from_string(&outcome).map_err(|e| anyhow!(e))?,
                    count: count as u64,
                    total_amount: row.get("total_amount"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        breakdown.sort_by_key(|totals| TransactionOutcome::ALL.iter().position(|o| *o == totals.outcome));
        Ok(breakdown)
    }

    async fn daily_totals(&self, query: &TransactionQuery) -> Result<Vec<DailyTotals>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT substr(occurred_at, 1, 10) AS day, COUNT(*) AS tx_count, SUM(amount) AS total_amount \
             FROM transactions WHERE 1 = 1",
        );
        Self::push_filters(&mut builder, query);
        builder.push(" GROUP BY day ORDER BY day ASC");

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.iter()
            .map(|row| {
                let day: String = row.get("day");
                let count: i64 = row.get("tx_count");
                Ok(DailyTotals {
                    day: NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                        .with_context(|| format!("Failed to parse day {}", day))?,
                    count: count as u64,
                    amount: row.get("total_amount"),
                })
            })
            .collect()
    }

    async fn top_payment_apps(&self, query: &TransactionQuery, limit: u32) -> Result<Vec<PaymentAppTotals>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT payment_app, COUNT(*) AS tx_count, SUM(amount) AS total_amount FROM transactions WHERE 1 = 1",
        );
        Self::push_filters(&mut builder, query);
        builder
            .push(" GROUP BY payment_app ORDER BY tx_count DESC, payment_app ASC LIMIT ")
            .push_bind(i64::from(limit));

        let rows = builder.build().fetch_all(self.db.pool()).await?;
        rows.iter()
            .map(|row| {
                let payment_app: String = row.get("payment_app");
                let count: i64 = row.get("tx_count");
                Ok(PaymentAppTotals {
                    payment_app: PaymentApp::from_string(&payment_app).map_err(|e| anyhow!(e))?,
                    count: count as u64,
                    total_amount: row.get("total_amount"),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    async fn setup_test() -> TransactionRepository {
        let db = DbConnection::init_test().await.expect("Failed to create test database");
        TransactionRepository::new(db)
    }

    fn transaction(id: &str, point_id: &str, reference: &str, outcome: TransactionOutcome, minutes_ago: i64) -> Transaction {
        Transaction {
            id: id.to_string(),
            point_id: point_id.to_string(),
            amount: 250.0,
            outcome,
            reference: reference.to_string(),
            occurred_at: Utc::now() - Duration::minutes(minutes_ago),
            payer_info: PayerInfo {
                name: "Priya Sharma".to_string(),
                phone: "9876543210".to_string(),
                payment_app: PaymentApp::PhonePe,
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_get_transaction() {
        let repo = setup_test().await;
        let tx = transaction("PAY1", "A1B2C", "AAAABBBBCCCC", TransactionOutcome::Success, 0);
        repo.create_transaction(&tx).await.expect("Failed to create transaction");

        let found = repo.get_transaction("PAY1").await.unwrap().expect("Transaction should exist");
        assert_eq!(found.point_id, "A1B2C");
        assert_eq!(found.reference, "AAAABBBBCCCC");
        assert_eq!(found.payer_info.payment_app, PaymentApp::PhonePe);
        assert!(repo.get_transaction("PAY2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_reference_rejected() {
        let repo = setup_test().await;
        let first = transaction("PAY1", "A1B2C", "AAAABBBBCCCC", TransactionOutcome::Success, 0);
        let second = transaction("PAY2", "A1B2C", "AAAABBBBCCCC", TransactionOutcome::Failed, 0);

        repo.create_transaction(&first).await.unwrap();
        assert!(repo.create_transaction(&second).await.is_err());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let repo = setup_test().await;
        repo.create_transaction(&transaction("PAY1", "AAAAA", "REF000000001", TransactionOutcome::Success, 30))
            .await
            .unwrap();
        repo.create_transaction(&transaction("PAY2", "AAAAA", "REF000000002", TransactionOutcome::Failed, 20))
            .await
            .unwrap();
        repo.create_transaction(&transaction("PAY3", "AAAAA", "REF000000003", TransactionOutcome::Success, 10))
            .await
            .unwrap();
        repo.create_transaction(&transaction("PAY4", "BBBBB", "REF000000004", TransactionOutcome::Success, 5))
            .await
            .unwrap();

        let query = TransactionQuery::for_point("AAAAA");
        let listed = repo.list_transactions(&query).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["PAY3", "PAY2", "PAY1"]);
        assert_eq!(repo.count_transactions(&query).await.unwrap(), 3);

        let successes = TransactionQuery {
            point_id: Some("AAAAA".to_string()),
            outcome: Some(TransactionOutcome::Success),
            ..Default::default()
        };
        assert_eq!(repo.count_transactions(&successes).await.unwrap(), 2);

        let page = TransactionQuery {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        };
        let listed = repo.list_transactions(&page).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["PAY3", "PAY2"]);
    }

    #[tokio::test]
    async fn test_delete_transactions_for_point() {
        let repo = setup_test().await;
        repo.create_transaction(&transaction("PAY1", "AAAAA", "REF000000001", TransactionOutcome::Success, 2))
            .await
            .unwrap();
        repo.create_transaction(&transaction("PAY2", "BBBBB", "REF000000002", TransactionOutcome::Success, 1))
            .await
            .unwrap();

        assert_eq!(repo.delete_transactions_for_point("AAAAA").await.unwrap(), 1);
        assert_eq!(repo.count_transactions(&TransactionQuery::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_outcome_and_delete_single() {
        let repo = setup_test().await;
        repo.create_transaction(&transaction("PAY1", "AAAAA", "REF000000001", TransactionOutcome::Pending, 1))
            .await
            .unwrap();

        let updated = repo
            .update_outcome("PAY1", TransactionOutcome::Success)
            .await
            .unwrap()
            .expect("Transaction should exist");
        assert_eq!(updated.outcome, TransactionOutcome::Success);
        assert!(repo.update_outcome("PAY9", TransactionOutcome::Failed).await.unwrap().is_none());

        assert!(repo.delete_transaction("PAY1").await.unwrap());
        assert!(!repo.delete_transaction("PAY1").await.unwrap());
    }

    #[tokio::test]
    async fn test_aggregates_group_by_outcome_day_and_app() {
        let repo = setup_test().await;
        let rows = [
            ("PAY1", TransactionOutcome::Pending, 2, PaymentApp::GPay, 40.0),
            ("PAY2", TransactionOutcome::Success, 1, PaymentApp::GPay, 100.0),
            ("PAY3", TransactionOutcome::Success, 1, PaymentApp::Paytm, 60.0),
            ("PAY4", TransactionOutcome::Failed, 3, PaymentApp::Bhim, 10.0),
        ];
        for (i, (id, outcome, day, app, amount)) in rows.into_iter().enumerate() {
            let mut tx = transaction(id, "AAAAA", &format!("REF00000000{}", i), outcome, 0);
            tx.occurred_at = Utc.with_ymd_and_hms(2024, 5, day, 9, 30, 0).unwrap();
            tx.payer_info.payment_app = app;
            tx.amount = amount;
            repo.create_transaction(&tx).await.unwrap();
        }

        let breakdown = repo.outcome_breakdown(&TransactionQuery::default()).await.unwrap();
        let outcomes: Vec<(TransactionOutcome, u64, f64)> =
            breakdown.iter().map(|b| (b.outcome, b.count, b.total_amount)).collect();
        assert_eq!(
            outcomes,
            vec![
                (TransactionOutcome::Success, 2, 160.0),
                (TransactionOutcome::Failed, 1, 10.0),
                (TransactionOutcome::Pending, 1, 40.0),
            ]
        );

        let daily = repo.daily_totals(&TransactionQuery::default()).await.unwrap();
        let days: Vec<(u32, u64, f64)> = daily
            .iter()
            .map(|d| (chrono::Datelike::day(&d.day), d.count, d.amount))
            .collect();
        assert_eq!(days, vec![(1, 2, 160.0), (2, 1, 40.0), (3, 1, 10.0)]);

        let apps = repo.top_payment_apps(&TransactionQuery::default(), 2).await.unwrap();
        let apps: Vec<(PaymentApp, u64)> = apps.iter().map(|a| (a.payment_app, a.count)).collect();
        assert_eq!(apps, vec![(PaymentApp::GPay, 2), (PaymentApp::Bhim, 1)]);

        let bounded = TransactionQuery {
            from: Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()),
            until: Some(Utc.with_ymd_and_hms(2024, 5, 2, 23, 59, 59).unwrap()),
            ..Default::default()
        };
        assert_eq!(repo.count_transactions(&bounded).await.unwrap(), 1);
        assert!(repo.outcome_breakdown(&TransactionQuery::for_point("ZZZZZ")).await.unwrap().is_empty());
    }
}
