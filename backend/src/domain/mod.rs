//! # Domain Module
//!
//! Business logic for the collection point dashboard.
//!
//! ## Services
//!
//! - **CollectionPointService**: registration, updates, activation and deletion
//! - **TransactionService**: transaction queries and one-shot manual generation
//! - **SimulationControlService**: start/stop/toggle requests that keep the
//!   stored simulation flag and the scheduler in step
//! - **SimulationScheduler**: the per-point periodic generation tasks
//!
//! Services talk to storage only through the traits in `crate::storage`.

pub mod collection_point_service;
pub mod commands;
pub mod error;
pub mod models;
pub mod simulation_control_service;
pub mod simulation_scheduler;
pub mod transaction_generator;
pub mod transaction_service;

pub use collection_point_service::CollectionPointService;
pub use error::{DomainError, DomainResult};
pub use simulation_control_service::SimulationControlService;
pub use simulation_scheduler::{SimulationScheduler, DEFAULT_TICK_INTERVAL};
pub use transaction_service::TransactionService;
