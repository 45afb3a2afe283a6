//! # SQLite Storage Module
//!
//! SQLite-backed implementations of the storage traits, built on SQLx.
//!
//! ## Components
//!
//! - **connection.rs** - pool creation and schema setup
//! - **collection_point_repository.rs** - collection point records
//! - **transaction_repository.rs** - generated transaction records
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (millisecond
//! precision, `Z` suffix) so lexical ordering matches chronological ordering.

pub mod connection;
pub mod collection_point_repository;
pub mod transaction_repository;

pub use connection::DbConnection;
pub use collection_point_repository::CollectionPointRepository;
pub use transaction_repository::TransactionRepository;
