//! # Transaction Generator
//!
//! Synthesizes payment records for a collection point. Shared by the
//! scheduler's periodic ticks and the manual simulate endpoint.
//!
//! All randomness comes from the caller's RNG, so a seeded RNG gives a
//! reproducible batch.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::domain::models::collection_point::CollectionPoint;
use crate::domain::models::transaction::{
    PayerInfo, PaymentApp, Transaction, TransactionOutcome, REFERENCE_LENGTH,
};

/// Lower bound for generated amounts
pub const MIN_AMOUNT: f64 = 10.0;

/// Largest number of transactions produced by one tick
pub const MAX_BATCH_SIZE: usize = 3;

/// Cumulative outcome thresholds: 80% Success, 15% Failed, 5% Pending
const SUCCESS_THRESHOLD: f64 = 0.80;
const FAILED_THRESHOLD: f64 = 0.95;

/// Random characters after the timestamp in a payment id
pub const ID_SUFFIX_LENGTH: usize = 6;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const PAYER_NAMES: [&str; 12] = [
    "Rahul Kumar",
    "Priya Sharma",
    "Amit Singh",
    "Neha Gupta",
    "Ravi Patel",
    "Sunita Devi",
    "Vikash Kumar",
    "Pooja Singh",
    "Suresh Yadav",
    "Anjali Mishra",
    "Deepak Joshi",
    "Kavita Nair",
];

const PAYMENT_APPS: [PaymentApp; 6] = [
    PaymentApp::GPay,
    PaymentApp::PhonePe,
    PaymentApp::Paytm,
    PaymentApp::Bhim,
    PaymentApp::AmazonPay,
    PaymentApp::WhatsApp,
];

/// Number of transactions for one tick, uniform over 1..=3
pub fn batch_size<R: Rng + ?Sized>(rng: &mut R) -> usize {
    rng.gen_range(1..=MAX_BATCH_SIZE)
}

/// Generate one tick's worth of transactions for `point`
pub fn generate_batch<R: Rng + ?Sized>(
    point: &CollectionPoint,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Transaction> {
    let count = batch_size(rng);
    generate_many(point, count, rng, now)
}

/// Generate exactly `count` transactions for `point`
pub fn generate_many<R: Rng + ?Sized>(
    point: &CollectionPoint,
    count: usize,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Transaction> {
    (0..count).map(|_| generate_transaction(point, rng, now)).collect()
}

pub fn generate_transaction<R: Rng + ?Sized>(
    point: &CollectionPoint,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Transaction {
    let suffix = random_code(rng, ID_SUFFIX_LENGTH);

    Transaction {
        id: Transaction::generate_id(now.timestamp_millis(), &suffix),
        point_id: point.id.clone(),
        amount: random_amount(rng, point.effective_max_amount()),
        outcome: random_outcome(rng),
        reference: random_code(rng, REFERENCE_LENGTH),
        occurred_at: now,
        payer_info: random_payer(rng),
    }
}

/// Whole-rupee amount in `[MIN_AMOUNT, ceiling]`.
/// A ceiling below `MIN_AMOUNT` narrows the range to `[1, ceiling]`.
pub fn random_amount<R: Rng + ?Sized>(rng: &mut R, ceiling: f64) -> f64 {
    let high = (ceiling.floor() as u64).max(1);
    let low = (MIN_AMOUNT as u64).min(high);
    rng.gen_range(low..=high) as f64
}

pub fn random_outcome<R: Rng + ?Sized>(rng: &mut R) -> TransactionOutcome {
    let roll: f64 = rng.gen();
    if roll < SUCCESS_THRESHOLD {
        TransactionOutcome::Success
    } else if roll < FAILED_THRESHOLD {
        TransactionOutcome::Failed
    } else {
        TransactionOutcome::Pending
    }
}

/// Uppercase alphanumeric code of the given length
pub fn random_code<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

pub fn random_payer<R: Rng + ?Sized>(rng: &mut R) -> PayerInfo {
    let name = PAYER_NAMES[rng.gen_range(0..PAYER_NAMES.len())];
    let payment_app = PAYMENT_APPS[rng.gen_range(0..PAYMENT_APPS.len())];
    // 10-digit mobile number starting with 7, 8 or 9
    let phone = format!("{}{:09}", rng.gen_range(7..=9), rng.gen_range(0..1_000_000_000u64));

    PayerInfo {
        name: name.to_string(),
        phone,
        payment_app,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::collection_point::test_support::point;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_amounts_respect_point_ceiling() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut p = point("A1B2C");
        p.max_amount = Some(500.0);

        let batch = generate_many(&p, 1000, &mut rng, Utc::now());
        assert_eq!(batch.len(), 1000);
        for tx in &batch {
            assert!(tx.amount >= 10.0 && tx.amount <= 500.0, "amount out of range: {}", tx.amount);
        }
    }

    #[test]
    fn test_missing_ceiling_uses_default() {
        let mut rng = StdRng::seed_from_u64(11);
        let p = point("A1B2C");

        for _ in 0..500 {
            let tx = generate_transaction(&p, &mut rng, Utc::now());
            assert!(tx.amount >= 10.0 && tx.amount <= 1000.0);
        }
    }

    #[test]
    fn test_small_ceiling_stays_positive_and_bounded() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let amount = random_amount(&mut rng, 5.0);
            assert!(amount >= 1.0 && amount <= 5.0);
        }
    }

    #[test]
    fn test_outcome_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let samples = 10_000;
        let (mut success, mut failed, mut pending) = (0usize, 0usize, 0usize);
        for _ in 0..samples {
            match random_outcome(&mut rng) {
                TransactionOutcome::Success => success += 1,
                TransactionOutcome::Failed => failed += 1,
                TransactionOutcome::Pending => pending += 1,
            }
        }

        let share = |n: usize| n as f64 / samples as f64;
        assert!((share(success) - 0.80).abs() < 0.10, "success share {}", share(success));
        assert!((share(failed) - 0.15).abs() < 0.10, "failed share {}", share(failed));
        assert!((share(pending) - 0.05).abs() < 0.10, "pending share {}", share(pending));
    }

    #[test]
    fn test_batch_size_covers_one_to_three() {
        let mut rng = StdRng::seed_from_u64(5);
        let sizes: HashSet<usize> = (0..300).map(|_| batch_size(&mut rng)).collect();
        assert_eq!(sizes, HashSet::from([1, 2, 3]));
    }

    #[test]
    fn test_references_are_twelve_alphanumeric_and_unique() {
        let mut rng = StdRng::seed_from_u64(99);
        let p = point("A1B2C");
        let batch = generate_many(&p, 1000, &mut rng, Utc::now());

        let references: HashSet<&str> = batch.iter().map(|t| t.reference.as_str()).collect();
        assert_eq!(references.len(), batch.len());
        assert!(batch.iter().all(|t| Transaction::is_valid_reference(&t.reference)));

        let ids: HashSet<&str> = batch.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), batch.len());
    }

    #[test]
    fn test_payer_fields_populated() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let payer = random_payer(&mut rng);
            assert!(!payer.name.is_empty());
            assert_eq!(payer.phone.len(), 10);
            assert!(matches!(payer.phone.chars().next(), Some('7' | '8' | '9')));
            assert_ne!(payer.payment_app, PaymentApp::Other);
        }
    }
}
