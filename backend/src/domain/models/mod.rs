pub mod collection_point;
pub mod transaction;
pub mod transaction_stats;
