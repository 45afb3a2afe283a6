//! # In-Memory Storage
//!
//! A process-local implementation of both storage traits. Used when
//! `QRSIM_STORAGE=memory` and by the scheduler tests, where it keeps every
//! store call free of real I/O so the paused tokio clock can drive ticks.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::RwLock;

use super::traits::{CollectionPointStorage, TransactionStorage};
use crate::domain::commands::points::PointFilter;
use crate::domain::commands::transactions::TransactionQuery;
use crate::domain::models::collection_point::{CollectionPoint, PointStatus};
use crate::domain::models::transaction::{PaymentApp, Transaction, TransactionOutcome};
use crate::domain::models::transaction_stats::{DailyTotals, OutcomeTotals, PaymentAppTotals};

#[derive(Default)]
pub struct MemoryStore {
    points: RwLock<HashMap<String, CollectionPoint>>,
    transactions: RwLock<Vec<Transaction>>,
    fail_transaction_writes: AtomicBool,
    transaction_write_delay_ms: AtomicU64,
    failing_point_reads: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create_transaction` fail until reset.
    /// Lets callers observe how the scheduler copes with write failures.
    pub fn set_fail_transaction_writes(&self, fail: bool) {
        self.fail_transaction_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold every `create_transaction` for `delay` before it is applied.
    /// `Duration::ZERO` turns the delay off.
    pub fn set_transaction_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.transaction_write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Make `find_by_id` fail for one point until reset
    pub fn set_fail_point_reads(&self, point_id: &str, fail: bool) {
        let mut failing = self.failing_point_reads();
        if fail {
            failing.insert(point_id.to_string());
        } else {
            failing.remove(point_id);
        }
    }

    /// Write a point exactly as given, skipping the status invariant
    #[cfg(test)]
    pub(crate) async fn put_point_unchecked(&self, point: CollectionPoint) {
        self.points.write().await.insert(point.id.clone(), point);
    }

    fn failing_point_reads(&self) -> MutexGuard<'_, HashSet<String>> {
        self.failing_point_reads.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn matching_transactions(&self, query: &TransactionQuery) -> Vec<Transaction> {
        let transactions = self.transactions.read().await;
        transactions.iter().filter(|t| query.matches(t)).cloned().collect()
    }
}

#[async_trait]
impl CollectionPointStorage for MemoryStore {
    async fn store_point(&self, point: &CollectionPoint) -> Result<()> {
        let mut points = self.points.write().await;
        if points.contains_key(&point.id) {
            return Err(anyhow!("Collection point already exists: {}", point.id));
        }
        let mut point = point.clone();
        point.set_status(point.status);
        points.insert(point.id.clone(), point);
        Ok(())
    }

    async fn find_by_id(&self, point_id: &str) -> Result<Option<CollectionPoint>> {
        let failing = self.failing_point_reads().contains(point_id);
        if failing {
            return Err(anyhow!("Collection point store unavailable"));
        }
        Ok(self.points.read().await.get(point_id).cloned())
    }

    async fn list_points(&self, filter: &PointFilter) -> Result<Vec<CollectionPoint>> {
        let points = self.points.read().await;
        let mut matching: Vec<CollectionPoint> =
            points.values().filter(|p| filter.matches(p)).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let offset = filter.offset.unwrap_or(0) as usize;
        let limit = filter.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_points(&self, filter: &PointFilter) -> Result<u64> {
        let points = self.points.read().await;
        Ok(points.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn find_eligible_for_simulation(&self) -> Result<Vec<CollectionPoint>> {
        let points = self.points.read().await;
        let mut eligible: Vec<CollectionPoint> = points
            .values()
            .filter(|p| p.is_eligible_for_simulation())
            .cloned()
            .collect();
        eligible.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(eligible)
    }

    async fn update_point(&self, point: &CollectionPoint) -> Result<()> {
        let mut points = self.points.write().await;
        match points.get_mut(&point.id) {
            Some(existing) => {
                let mut updated = point.clone();
                updated.set_status(updated.status);
                *existing = updated;
                Ok(())
            }
            None => Err(anyhow!("Collection point not found: {}", point.id)),
        }
    }

    async fn set_status(&self, point_id: &str, status: PointStatus) -> Result<Option<CollectionPoint>> {
        let mut points = self.points.write().await;
        Ok(points.get_mut(point_id).map(|point| {
            point.set_status(status);
            point.updated_at = Utc::now();
            point.clone()
        }))
    }

    async fn set_simulation_enabled(&self, point_id: &str, enabled: bool) -> Result<Option<CollectionPoint>> {
        let mut points = self.points.write().await;
        Ok(points.get_mut(point_id).map(|point| {
            point.simulation_enabled = enabled;
            point.updated_at = Utc::now();
            point.clone()
        }))
    }

    async fn clear_simulation_flags(&self) -> Result<u64> {
        let mut points = self.points.write().await;
        let mut cleared = 0;
        for point in points.values_mut().filter(|p| p.simulation_enabled) {
            point.simulation_enabled = false;
            point.updated_at = Utc::now();
            cleared += 1;
        }
        Ok(cleared)
    }

    async fn delete_point(&self, point_id: &str) -> Result<bool> {
        Ok(self.points.write().await.remove(point_id).is_some())
    }
}

#[async_trait]
impl TransactionStorage for MemoryStore {
    async fn create_transaction(&self, transaction: &Transaction) -> Result<Transaction> {
        if self.fail_transaction_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("Transaction store unavailable"));
        }

        let delay = self.transaction_write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let mut transactions = self.transactions.write().await;
        if transactions.iter().any(|t| t.id == transaction.id || t.reference == transaction.reference) {
            return Err(anyhow!("Duplicate transaction: {}", transaction.id));
        }
        transactions.push(transaction.clone());
        Ok(transaction.clone())
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().find(|t| t.id == transaction_id).cloned())
    }

    async fn list_transactions(&self, query: &TransactionQuery) -> Result<Vec<Transaction>> {
        let mut matching = self.matching_transactions(query).await;
        matching.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then_with(|| b.id.cmp(&a.id)));
        Ok(matching
            .into_iter()
            .skip(query.effective_offset() as usize)
            .take(query.effective_limit() as usize)
            .collect())
    }

    async fn count_transactions(&self, query: &TransactionQuery) -> Result<u64> {
        let transactions = self.transactions.read().await;
        Ok(transactions.iter().filter(|t| query.matches(t)).count() as u64)
    }

    async fn update_outcome(&self, transaction_id: &str, outcome: TransactionOutcome) -> Result<Option<Transaction>> {
        let mut transactions = self.transactions.write().await;
        Ok(transactions.iter_mut().find(|t| t.id == transaction_id).map(|transaction| {
            transaction.outcome = outcome;
            transaction.clone()
        }))
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<bool> {
        let mut transactions = self.transactions.write().await;
        let before = transactions.len();
        transactions.retain(|t| t.id != transaction_id);
        Ok(transactions.len() < before)
    }

    async fn delete_transactions_for_point(&self, point_id: &str) -> Result<u64> {
        let mut transactions = self.transactions.write().await;
        let before = transactions.len();
        transactions.retain(|t| t.point_id != point_id);
        Ok((before - transactions.len()) as u64)
    }

    async fn outcome_breakdown(&self, query: &TransactionQuery) -> Result<Vec<OutcomeTotals>> {
        let matching = self.matching_transactions(query).await;
        Ok(TransactionOutcome::ALL
            .iter()
            .filter_map(|&outcome| {
                let (count, total_amount) = matching
                    .iter()
                    .filter(|t| t.outcome == outcome)
                    .fold((0, 0.0), |(count, sum), t| (count + 1, sum + t.amount));
                (count > 0).then_some(OutcomeTotals { outcome, count, total_amount })
            })
            .collect())
    }

    async fn daily_totals(&self, query: &TransactionQuery) -> Result<Vec<DailyTotals>> {
        let mut days: BTreeMap<NaiveDate, (u64, f64)> = BTreeMap::new();
        for transaction in self.matching_transactions(query).await {
            let day = days.entry(transaction.occurred_at.date_naive()).or_insert((0, 0.0));
            day.0 += 1;
            day.1 += transaction.amount;
        }
        Ok(days
            .into_iter()
            .map(|(day, (count, amount))| DailyTotals { day, count, amount })
            .collect())
    }

    async fn top_payment_apps(&self, query: &TransactionQuery, limit: u32) -> Result<Vec<PaymentAppTotals>> {
        let mut apps: HashMap<PaymentApp, (u64, f64)> = HashMap::new();
        for transaction in self.matching_transactions(query).await {
            let app = apps.entry(transaction.payer_info.payment_app).or_insert((0, 0.0));
            app.0 += 1;
            app.1 += transaction.amount;
        }

        let mut totals: Vec<PaymentAppTotals> = apps
            .into_iter()
            .map(|(payment_app, (count, total_amount))| PaymentAppTotals { payment_app, count, total_amount })
            .collect();
        totals.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.payment_app.as_str().cmp(b.payment_app.as_str()))
        });
        totals.truncate(limit as usize);
        Ok(totals)
    }
}
