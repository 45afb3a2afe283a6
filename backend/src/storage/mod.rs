//! # Storage Module
//!
//! Handles all data persistence for collection points and their transactions.
//!
//! The domain layer only sees the traits in [`traits`]; the concrete backend
//! is chosen at startup from configuration.
//!
//! ## Backends
//!
//! - **sqlite**: SQLx over a SQLite file, the default
//! - **memory**: process-local maps, nothing survives a restart

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
pub use sqlite::{CollectionPointRepository, DbConnection, TransactionRepository};
pub use traits::{CollectionPointStorage, TransactionStorage};
