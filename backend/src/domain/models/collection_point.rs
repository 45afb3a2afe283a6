//! Domain model for a collection point.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ceiling used for generated amounts when a point has no usable `max_amount`
pub const DEFAULT_MAX_AMOUNT: f64 = 1000.0;

/// Hard upper bound accepted for a point's `max_amount`
pub const MAX_AMOUNT_LIMIT: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointStatus {
    Active,
    Inactive,
}

impl PointStatus {
    /// Convert to string for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            PointStatus::Active => "Active",
            PointStatus::Inactive => "Inactive",
        }
    }

    /// Parse from the stored string
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "Active" => Ok(PointStatus::Active),
            "Inactive" => Ok(PointStatus::Inactive),
            _ => Err(format!("Invalid point status: {}", s)),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            PointStatus::Active => PointStatus::Inactive,
            PointStatus::Inactive => PointStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointCategory {
    Retail,
    Rental,
    Education,
    Custom,
}

impl PointCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PointCategory::Retail => "Retail",
            PointCategory::Rental => "Rental",
            PointCategory::Education => "Education",
            PointCategory::Custom => "Custom",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "Retail" => Ok(PointCategory::Retail),
            "Rental" => Ok(PointCategory::Rental),
            "Education" => Ok(PointCategory::Education),
            "Custom" => Ok(PointCategory::Custom),
            _ => Err(format!("Invalid point category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionPoint {
    pub id: String,
    pub reference_name: String,
    pub vpa: String,
    pub description: Option<String>,
    pub category: PointCategory,
    pub notes: Option<String>,
    pub max_amount: Option<f64>,
    pub status: PointStatus,
    pub simulation_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionPoint {
    /// A point may have a running simulation only while Active and enabled
    pub fn is_eligible_for_simulation(&self) -> bool {
        self.status == PointStatus::Active && self.simulation_enabled
    }

    /// Ceiling for generated amounts, falling back to the default when the
    /// configured value is absent or not positive
    pub fn effective_max_amount(&self) -> f64 {
        match self.max_amount {
            Some(max) if max > 0.0 => max,
            _ => DEFAULT_MAX_AMOUNT,
        }
    }

    /// Apply a status change, keeping the simulation flag consistent with it.
    pub fn set_status(&mut self, status: PointStatus) {
        self.status = status;
        if status == PointStatus::Inactive {
            self.simulation_enabled = false;
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build an Active point with simulation disabled
    pub fn point(id: &str) -> CollectionPoint {
        let now = Utc::now();
        CollectionPoint {
            id: id.to_string(),
            reference_name: format!("Point {}", id),
            vpa: format!("{}@okbank", id.to_lowercase()),
            description: None,
            category: PointCategory::Custom,
            notes: None,
            max_amount: None,
            status: PointStatus::Active,
            simulation_enabled: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::point;
    use super::*;

    #[test]
    fn test_eligibility_requires_active_and_enabled() {
        let mut p = point("A1B2C");
        assert!(!p.is_eligible_for_simulation());

        p.simulation_enabled = true;
        assert!(p.is_eligible_for_simulation());

        p.status = PointStatus::Inactive;
        assert!(!p.is_eligible_for_simulation());
    }

    #[test]
    fn test_effective_max_amount_defaults() {
        let mut p = point("A1B2C");
        assert_eq!(p.effective_max_amount(), DEFAULT_MAX_AMOUNT);

        p.max_amount = Some(0.0);
        assert_eq!(p.effective_max_amount(), DEFAULT_MAX_AMOUNT);

        p.max_amount = Some(500.0);
        assert_eq!(p.effective_max_amount(), 500.0);
    }

    #[test]
    fn test_deactivation_clears_simulation_flag() {
        let mut p = point("A1B2C");
        p.simulation_enabled = true;

        p.set_status(PointStatus::Inactive);
        assert!(!p.simulation_enabled);

        p.set_status(PointStatus::Active);
        assert!(!p.simulation_enabled);
    }

    #[test]
    fn test_status_string_roundtrip() {
        assert_eq!(PointStatus::from_string("Active"), Ok(PointStatus::Active));
        assert!(PointStatus::from_string("active").is_err());
        assert_eq!(PointStatus::Active.toggled(), PointStatus::Inactive);
    }
}
