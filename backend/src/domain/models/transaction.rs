//! Domain model for a collection point transaction.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a settlement reference (UTR)
pub const REFERENCE_LENGTH: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionOutcome {
    Success,
    Failed,
    Pending,
}

impl TransactionOutcome {
    /// Every outcome, in the order reports list them
    pub const ALL: [TransactionOutcome; 3] = [
        TransactionOutcome::Success,
        TransactionOutcome::Failed,
        TransactionOutcome::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOutcome::Success => "Success",
            TransactionOutcome::Failed => "Failed",
            TransactionOutcome::Pending => "Pending",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "Success" => Ok(TransactionOutcome::Success),
            "Failed" => Ok(TransactionOutcome::Failed),
            "Pending" => Ok(TransactionOutcome::Pending),
            _ => Err(format!("Invalid transaction outcome: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentApp {
    GPay,
    PhonePe,
    Paytm,
    Bhim,
    AmazonPay,
    WhatsApp,
    Other,
}

impl PaymentApp {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentApp::GPay => "GPay",
            PaymentApp::PhonePe => "PhonePe",
            PaymentApp::Paytm => "Paytm",
            PaymentApp::Bhim => "BHIM",
            PaymentApp::AmazonPay => "AmazonPay",
            PaymentApp::WhatsApp => "WhatsApp",
            PaymentApp::Other => "Other",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "GPay" => Ok(PaymentApp::GPay),
            "PhonePe" => Ok(PaymentApp::PhonePe),
            "Paytm" => Ok(PaymentApp::Paytm),
            "BHIM" => Ok(PaymentApp::Bhim),
            "AmazonPay" => Ok(PaymentApp::AmazonPay),
            "WhatsApp" => Ok(PaymentApp::WhatsApp),
            "Other" => Ok(PaymentApp::Other),
            _ => Err(format!("Invalid payment app: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayerInfo {
    pub name: String,
    pub phone: String,
    pub payment_app: PaymentApp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub point_id: String,
    pub amount: f64,
    pub outcome: TransactionOutcome,
    pub reference: String,
    pub occurred_at: DateTime<Utc>,
    pub payer_info: PayerInfo,
}

impl Transaction {
    /// Generate a payment id from the creation time and a random suffix
    pub fn generate_id(epoch_millis: i64, suffix: &str) -> String {
        format!("PAY{}{}", epoch_millis, suffix)
    }

    /// True if `reference` is exactly 12 ASCII alphanumeric characters
    pub fn is_valid_reference(reference: &str) -> bool {
        reference.len() == REFERENCE_LENGTH && reference.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
