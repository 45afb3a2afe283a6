use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::commands::points::{
    CreatePointCommand, DeletePointResult, PointDetails, PointFilter, PointListResult, PointResult,
    UpdatePointCommand,
};
use crate::domain::commands::transactions::TransactionQuery;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::collection_point::{
    CollectionPoint, PointCategory, PointStatus, MAX_AMOUNT_LIMIT,
};
use crate::domain::models::transaction_stats::PointStats;
use crate::domain::simulation_scheduler::SimulationScheduler;
use crate::domain::transaction_generator::random_code;
use crate::storage::{CollectionPointStorage, TransactionStorage};

const POINT_ID_LENGTH: usize = 5;
const MAX_ID_ATTEMPTS: usize = 10;
const VPA_PATTERN: &str = r"^[a-zA-Z0-9.\-_]{2,256}@[a-zA-Z][a-zA-Z0-9.\-_]{2,64}$";
const POINT_ID_PATTERN: &str = r"^[A-Z0-9]{5}$";
const MAX_DESCRIPTION_LENGTH: usize = 255;
const MAX_NOTES_LENGTH: usize = 500;

/// Service for registering and maintaining collection points
#[derive(Clone)]
pub struct CollectionPointService {
    points: Arc<dyn CollectionPointStorage>,
    transactions: Arc<dyn TransactionStorage>,
    scheduler: SimulationScheduler,
}

impl CollectionPointService {
    pub fn new(
        points: Arc<dyn CollectionPointStorage>,
        transactions: Arc<dyn TransactionStorage>,
        scheduler: SimulationScheduler,
    ) -> Self {
        Self {
            points,
            transactions,
            scheduler,
        }
    }

    /// Register a new collection point. New points start Active with
    /// simulation disabled.
    pub async fn create_point(&self, command: CreatePointCommand) -> DomainResult<PointResult> {
        info!("Creating collection point: name={}, vpa={}", command.reference_name, command.vpa);

        let reference_name = validate_reference_name(&command.reference_name)?;
        let vpa = validate_vpa(&command.vpa)?;
        let description = validate_optional_text(command.description, "Description", MAX_DESCRIPTION_LENGTH)?;
        let notes = validate_optional_text(command.notes, "Notes", MAX_NOTES_LENGTH)?;
        validate_max_amount(command.max_amount)?;

        let id = match command.id {
            Some(requested) => self.claim_requested_id(&requested).await?,
            None => self.generate_unique_id().await?,
        };

        let now = Utc::now();
        let point = CollectionPoint {
            id,
            reference_name,
            vpa,
            description,
            category: command.category.unwrap_or(PointCategory::Custom),
            notes,
            max_amount: command.max_amount,
            status: PointStatus::Active,
            simulation_enabled: false,
            created_at: now,
            updated_at: now,
        };
        self.points.store_point(&point).await?;

        info!("Created collection point {} ({})", point.id, point.reference_name);
        Ok(PointResult {
            success_message: format!("Collection point {} created successfully", point.id),
            point,
        })
    }

    pub async fn get_point(&self, point_id: &str) -> DomainResult<CollectionPoint> {
        self.points
            .find_by_id(point_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(point_id.to_string()))
    }

    /// A point together with its transaction count and per-outcome totals
    pub async fn get_point_details(&self, point_id: &str) -> DomainResult<PointDetails> {
        let point = self.get_point(point_id).await?;
        let status_breakdown = self
            .transactions
            .outcome_breakdown(&TransactionQuery::for_point(point_id))
            .await?;
        let total_transactions = status_breakdown.iter().map(|b| b.count).sum();

        Ok(PointDetails {
            point,
            stats: PointStats {
                total_transactions,
                status_breakdown,
            },
        })
    }

    /// One page of matching points and the total number of matches
    pub async fn list_points(&self, filter: PointFilter) -> DomainResult<PointListResult> {
        let points = self.points.list_points(&filter).await?;
        let total = self.points.count_points(&filter).await?;
        info!("Found {} collection points ({} total)", points.len(), total);
        Ok(PointListResult { points, total })
    }

    /// Apply a partial update. Status and simulation state are not touched here.
    pub async fn update_point(&self, point_id: &str, command: UpdatePointCommand) -> DomainResult<PointResult> {
        info!("Updating collection point: {}", point_id);
        let mut point = self.get_point(point_id).await?;

        if let Some(name) = command.reference_name {
            point.reference_name = validate_reference_name(&name)?;
        }
        if let Some(vpa) = command.vpa {
            point.vpa = validate_vpa(&vpa)?;
        }
        if command.description.is_some() {
            point.description = validate_optional_text(command.description, "Description", MAX_DESCRIPTION_LENGTH)?;
        }
        if let Some(category) = command.category {
            point.category = category;
        }
        if command.notes.is_some() {
            point.notes = validate_optional_text(command.notes, "Notes", MAX_NOTES_LENGTH)?;
        }
        if command.max_amount.is_some() {
            validate_max_amount(command.max_amount)?;
            point.max_amount = command.max_amount;
        }
        point.updated_at = Utc::now();

        self.points.update_point(&point).await?;
        info!("Updated collection point {}", point.id);
        Ok(PointResult {
            success_message: format!("Collection point {} updated successfully", point.id),
            point,
        })
    }

    /// Flip Active/Inactive. Deactivating also stops a running simulation.
    pub async fn toggle_status(&self, point_id: &str) -> DomainResult<PointResult> {
        let current = self.get_point(point_id).await?;
        let next = current.status.toggled();

        let point = self
            .points
            .set_status(point_id, next)
            .await?
            .ok_or_else(|| DomainError::NotFound(point_id.to_string()))?;

        if next == PointStatus::Inactive && self.scheduler.stop(point_id) {
            info!("Stopped simulation for deactivated point {}", point_id);
        }

        info!("Collection point {} is now {}", point_id, next.as_str());
        Ok(PointResult {
            success_message: format!("Collection point {} is now {}", point_id, next.as_str()),
            point,
        })
    }

    /// Delete a point together with its transactions
    pub async fn delete_point(&self, point_id: &str) -> DomainResult<DeletePointResult> {
        info!("Deleting collection point: {}", point_id);
        let point = self.get_point(point_id).await?;

        // Wait out an in-flight tick so none of its rows land after the purge
        self.scheduler.stop_and_wait(point_id).await;
        let deleted_transactions = self.transactions.delete_transactions_for_point(point_id).await?;
        if !self.points.delete_point(point_id).await? {
            return Err(DomainError::NotFound(point_id.to_string()));
        }

        info!(
            "Deleted collection point {} and {} transactions",
            point.id, deleted_transactions
        );
        Ok(DeletePointResult {
            point_id: point.id,
            deleted_transactions,
            success_message: format!("Collection point '{}' deleted successfully", point.reference_name),
        })
    }

    async fn claim_requested_id(&self, requested: &str) -> DomainResult<String> {
        let id_pattern = Regex::new(POINT_ID_PATTERN).map_err(anyhow::Error::from)?;
        if !id_pattern.is_match(requested) {
            return Err(DomainError::validation(
                "Point id must be exactly 5 uppercase letters or digits",
            ));
        }
        if self.points.find_by_id(requested).await?.is_some() {
            return Err(DomainError::validation(format!("Point id {} is already in use", requested)));
        }
        Ok(requested.to_string())
    }

    async fn generate_unique_id(&self) -> DomainResult<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = {
                let mut rng = StdRng::from_entropy();
                random_code(&mut rng, POINT_ID_LENGTH)
            };
            if self.points.find_by_id(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            warn!("Generated point id {} already exists, retrying", candidate);
        }
        Err(DomainError::Storage(anyhow::anyhow!(
            "Unable to generate a unique point id after {} attempts",
            MAX_ID_ATTEMPTS
        )))
    }
}

fn validate_reference_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if !(2..=100).contains(&length) {
        return Err(DomainError::validation("Reference name must be 2-100 characters"));
    }
    Ok(trimmed.to_string())
}

fn validate_vpa(vpa: &str) -> DomainResult<String> {
    let trimmed = vpa.trim();
    let vpa_pattern = Regex::new(VPA_PATTERN).map_err(anyhow::Error::from)?;
    if !vpa_pattern.is_match(trimmed) {
        return Err(DomainError::validation(format!("Invalid UPI VPA: {}", trimmed)));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field; blank values are stored as absent
fn validate_optional_text(value: Option<String>, field: &str, max_length: usize) -> DomainResult<Option<String>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.chars().count() > max_length {
        return Err(DomainError::validation(format!(
            "{} must be at most {} characters",
            field, max_length
        )));
    }
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// 0 means "use the default ceiling"; anything else must lie in [1, 100000]
fn validate_max_amount(max_amount: Option<f64>) -> DomainResult<()> {
    match max_amount {
        None => Ok(()),
        Some(v) if v == 0.0 => Ok(()),
        Some(v) if v.is_finite() && (1.0..=MAX_AMOUNT_LIMIT).contains(&v) => Ok(()),
        Some(v) => Err(DomainError::validation(format!(
            "Max amount must be 0 or between 1 and {}, got {}",
            MAX_AMOUNT_LIMIT, v
        ))),
    }
}
