use chrono::SecondsFormat;
use shared::{
    CollectionPoint, CreatePointRequest, DeletePointResponse, Pagination, PointCategory,
    PointDetailResponse, PointListRequest, PointListResponse, PointResponse, PointStats, PointStatus,
    UpdatePointRequest,
};

use super::transaction_mapper::TransactionMapper;
use crate::domain::commands::points::{
    CreatePointCommand, DeletePointResult, PointDetails, PointFilter, PointListResult, PointResult,
    UpdatePointCommand,
};
use crate::domain::models::collection_point::{
    CollectionPoint as DomainCollectionPoint, PointCategory as DomainPointCategory,
    PointStatus as DomainPointStatus,
};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct CollectionPointMapper;

impl CollectionPointMapper {
    pub fn status_to_domain(status: PointStatus) -> DomainPointStatus {
        match status {
            PointStatus::Active => DomainPointStatus::Active,
            PointStatus::Inactive => DomainPointStatus::Inactive,
        }
    }

    pub fn status_to_dto(status: DomainPointStatus) -> PointStatus {
        match status {
            DomainPointStatus::Active => PointStatus::Active,
            DomainPointStatus::Inactive => PointStatus::Inactive,
        }
    }

    pub fn category_to_domain(category: PointCategory) -> DomainPointCategory {
        match category {
            PointCategory::Retail => DomainPointCategory::Retail,
            PointCategory::Rental => DomainPointCategory::Rental,
            PointCategory::Education => DomainPointCategory::Education,
            PointCategory::Custom => DomainPointCategory::Custom,
        }
    }

    pub fn category_to_dto(category: DomainPointCategory) -> PointCategory {
        match category {
            DomainPointCategory::Retail => PointCategory::Retail,
            DomainPointCategory::Rental => PointCategory::Rental,
            DomainPointCategory::Education => PointCategory::Education,
            DomainPointCategory::Custom => PointCategory::Custom,
        }
    }

    /// Convert a domain point to the wire DTO
    pub fn to_dto(domain: DomainCollectionPoint) -> CollectionPoint {
        CollectionPoint {
            id: domain.id,
            reference_name: domain.reference_name,
            vpa: domain.vpa,
            description: domain.description,
            category: Self::category_to_dto(domain.category),
            notes: domain.notes,
            max_amount: domain.max_amount,
            status: Self::status_to_dto(domain.status),
            simulation_enabled: domain.simulation_enabled,
            created_at: domain.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: domain.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_dto_list(points: Vec<DomainCollectionPoint>) -> Vec<CollectionPoint> {
        points.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_create_command(request: CreatePointRequest) -> CreatePointCommand {
        CreatePointCommand {
            id: request.id,
            reference_name: request.reference_name,
            vpa: request.vpa,
            description: request.description,
            category: request.category.map(Self::category_to_domain),
            notes: request.notes,
            max_amount: request.max_amount,
        }
    }

    pub fn to_update_command(request: UpdatePointRequest) -> UpdatePointCommand {
        UpdatePointCommand {
            reference_name: request.reference_name,
            vpa: request.vpa,
            description: request.description,
            category: request.category.map(Self::category_to_domain),
            notes: request.notes,
            max_amount: request.max_amount,
        }
    }

    /// Page numbers start at 1; a page of 0 is read as the first page
    pub fn to_filter(request: PointListRequest) -> PointFilter {
        let limit = request.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = request.page.unwrap_or(1).max(1);

        PointFilter {
            status: request.status.map(Self::status_to_domain),
            category: request.category.map(Self::category_to_domain),
            search: request.search.filter(|s| !s.trim().is_empty()),
            limit: Some(limit),
            offset: Some((page - 1).saturating_mul(limit)),
        }
    }

    pub fn to_point_response(result: PointResult) -> PointResponse {
        PointResponse {
            point: Self::to_dto(result.point),
            success_message: result.success_message,
        }
    }

    pub fn to_list_response(result: PointListResult, filter: &PointFilter) -> PointListResponse {
        let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let total_pages = result.total.div_ceil(u64::from(limit));

        PointListResponse {
            pagination: Pagination {
                current: filter.offset.unwrap_or(0) / limit + 1,
                total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
                count: result.points.len(),
                total_records: result.total,
            },
            points: Self::to_dto_list(result.points),
        }
    }

    pub fn to_detail_response(details: PointDetails) -> PointDetailResponse {
        PointDetailResponse {
            point: Self::to_dto(details.point),
            stats: PointStats {
                total_transactions: details.stats.total_transactions,
                status_breakdown: TransactionMapper::breakdown_to_dto(details.stats.status_breakdown),
            },
        }
    }

    pub fn to_delete_response(result: DeletePointResult) -> DeletePointResponse {
        DeletePointResponse {
            point_id: result.point_id,
            deleted_transactions: result.deleted_transactions,
            success_message: result.success_message,
        }
    }
}
