//! Couples the stored `simulation_enabled` flag with the scheduler registry
//! for the HTTP control endpoints. The scheduler never validates a point on
//! `start`; every check it relies on happens here first.

use std::sync::Arc;
use tracing::info;

use crate::domain::commands::points::PointFilter;
use crate::domain::commands::simulation::{
    PointSimulationState, SimulationActionResult, SimulationStatusResult, StopAllResult, ToggleOutcome,
};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::models::collection_point::{CollectionPoint, PointStatus};
use crate::domain::simulation_scheduler::SimulationScheduler;
use crate::storage::CollectionPointStorage;

#[derive(Clone)]
pub struct SimulationControlService {
    points: Arc<dyn CollectionPointStorage>,
    scheduler: SimulationScheduler,
}

impl SimulationControlService {
    pub fn new(points: Arc<dyn CollectionPointStorage>, scheduler: SimulationScheduler) -> Self {
        Self { points, scheduler }
    }

    pub async fn start(&self, point_id: &str) -> DomainResult<SimulationActionResult> {
        let point = self.require_point(point_id).await?;
        if point.status != PointStatus::Active {
            return Err(DomainError::Inactive(point_id.to_string()));
        }
        if self.scheduler.is_running(point_id) {
            return Err(DomainError::AlreadyRunning(point_id.to_string()));
        }

        self.set_flag(point_id, true).await?;
        if !self.scheduler.start(point_id) {
            return Err(DomainError::AlreadyRunning(point_id.to_string()));
        }

        Ok(SimulationActionResult {
            point_id: point_id.to_string(),
            simulation_enabled: true,
            message: format!("Simulation started for {}", point_id),
        })
    }

    pub async fn stop(&self, point_id: &str) -> DomainResult<SimulationActionResult> {
        self.require_point(point_id).await?;
        self.set_flag(point_id, false).await?;

        if !self.scheduler.stop(point_id) {
            return Err(DomainError::NotRunning(point_id.to_string()));
        }

        Ok(SimulationActionResult {
            point_id: point_id.to_string(),
            simulation_enabled: false,
            message: format!("Simulation stopped for {}", point_id),
        })
    }

    /// An Inactive point cannot be toggled on. Toggling it off is still
    /// allowed so a stale flag can be cleared.
    pub async fn toggle(&self, point_id: &str) -> DomainResult<ToggleOutcome> {
        let point = self.require_point(point_id).await?;
        if point.status == PointStatus::Inactive && !point.simulation_enabled {
            return Err(DomainError::Inactive(point_id.to_string()));
        }
        self.scheduler.toggle(point_id).await
    }

    /// Scheduler snapshot joined with the stored state of every point
    pub async fn status(&self) -> DomainResult<SimulationStatusResult> {
        let snapshot = self.scheduler.status();
        let points = self
            .points
            .list_points(&PointFilter::default())
            .await?
            .into_iter()
            .map(|point| PointSimulationState {
                is_running: snapshot.is_running(&point.id),
                point_id: point.id,
                reference_name: point.reference_name,
                status: point.status,
                simulation_enabled: point.simulation_enabled,
            })
            .collect();

        Ok(SimulationStatusResult { snapshot, points })
    }

    /// Clear every stored flag, then cancel every task. Clearing first keeps
    /// a restart from resuming what was just stopped.
    pub async fn stop_all(&self) -> DomainResult<StopAllResult> {
        let cleared = self.points.clear_simulation_flags().await?;
        let stopped = self.scheduler.stop_all();
        info!("Stop-all: cleared {} flags, stopped {} simulations", cleared, stopped);

        Ok(StopAllResult {
            stopped,
            message: format!("Stopped {} simulations", stopped),
        })
    }

    async fn require_point(&self, point_id: &str) -> DomainResult<CollectionPoint> {
        self.points
            .find_by_id(point_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(point_id.to_string()))
    }

    async fn set_flag(&self, point_id: &str, enabled: bool) -> DomainResult<()> {
        self.points
            .set_simulation_enabled(point_id, enabled)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(point_id.to_string()))
    }
}
