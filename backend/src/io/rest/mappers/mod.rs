pub mod collection_point_mapper;
pub mod simulation_mapper;
pub mod transaction_mapper;
