use shared::{
    PointSimulationStatus, SimulationActionResponse, SimulationStatusResponse,
    StopAllSimulationsResponse, ToggleSimulationResponse,
};

use super::collection_point_mapper::CollectionPointMapper;
use crate::domain::commands::simulation::{
    PointSimulationState, SimulationActionResult, SimulationStatusResult, StopAllResult, ToggleOutcome,
};

pub struct SimulationMapper;

impl SimulationMapper {
    pub fn to_toggle_response(point_id: &str, outcome: ToggleOutcome) -> ToggleSimulationResponse {
        ToggleSimulationResponse {
            point_id: point_id.to_string(),
            active: outcome.active,
            message: outcome.message,
        }
    }

    pub fn to_action_response(result: SimulationActionResult) -> SimulationActionResponse {
        SimulationActionResponse {
            point_id: result.point_id,
            simulation_enabled: result.simulation_enabled,
            message: result.message,
        }
    }

    fn point_state_to_dto(state: PointSimulationState) -> PointSimulationStatus {
        PointSimulationStatus {
            point_id: state.point_id,
            reference_name: state.reference_name,
            status: CollectionPointMapper::status_to_dto(state.status),
            simulation_enabled: state.simulation_enabled,
            is_running: state.is_running,
        }
    }

    pub fn to_status_response(result: SimulationStatusResult) -> SimulationStatusResponse {
        SimulationStatusResponse {
            active_count: result.snapshot.active_count,
            running_ids: result.snapshot.running_ids,
            initialized: result.snapshot.initialized,
            points: result.points.into_iter().map(Self::point_state_to_dto).collect(),
        }
    }

    pub fn to_stop_all_response(result: StopAllResult) -> StopAllSimulationsResponse {
        StopAllSimulationsResponse {
            stopped: result.stopped,
            message: result.message,
        }
    }
}
