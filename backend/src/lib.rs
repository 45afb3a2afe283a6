//! # QR Collection Simulator Backend
//!
//! REST backend for a dashboard of UPI collection points. Each point can run
//! a background simulation that produces synthetic payments every few
//! seconds; see [`domain::simulation_scheduler`].
//!
//! ## Layers
//!
//! - **storage**: store traits with SQLite and in-memory implementations
//! - **domain**: models, services and the simulation scheduler
//! - **io::rest**: axum handlers mapping shared DTOs to domain commands
//!
//! [`initialize_backend`] wires the layers together and [`create_router`]
//! exposes them over HTTP.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use axum::http::Method;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{AppConfig, StorageKind};
use crate::domain::{
    CollectionPointService, SimulationControlService, SimulationScheduler, TransactionService,
};
use crate::storage::{
    CollectionPointRepository, CollectionPointStorage, DbConnection, MemoryStore, TransactionRepository,
    TransactionStorage,
};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub point_service: CollectionPointService,
    pub transaction_service: TransactionService,
    pub simulation_service: SimulationControlService,
    pub scheduler: SimulationScheduler,
}

impl AppState {
    /// Build the services over the given stores
    pub fn new(
        points: Arc<dyn CollectionPointStorage>,
        transactions: Arc<dyn TransactionStorage>,
        tick_interval: Duration,
    ) -> Self {
        let scheduler = SimulationScheduler::new(points.clone(), transactions.clone(), tick_interval);

        Self {
            point_service: CollectionPointService::new(points.clone(), transactions.clone(), scheduler.clone()),
            transaction_service: TransactionService::new(points.clone(), transactions),
            simulation_service: SimulationControlService::new(points, scheduler.clone()),
            scheduler,
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    let app_state = match config.storage {
        StorageKind::Sqlite => {
            info!("Setting up database at {}", config.database_url);
            let db = DbConnection::new(&config.database_url).await?;
            AppState::new(
                Arc::new(CollectionPointRepository::new(db.clone())),
                Arc::new(TransactionRepository::new(db)),
                config.tick_interval,
            )
        }
        StorageKind::Memory => {
            info!("Using in-memory storage; data will not survive a restart");
            let store = Arc::new(MemoryStore::new());
            AppState::new(store.clone(), store, config.tick_interval)
        }
    };

    info!("Domain services ready");
    Ok(app_state)
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(config.frontend_origin.clone())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(io::rest::health))
        .nest("/api", io::rest::api_router())
        .layer(cors)
        .with_state(app_state)
}
