//! Supplier (vendor) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Kind of goods a vendor supplies. Chicken vendors get the default markup
/// rule set on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VendorType {
    Chicken,
    Vegetable,
    Other,
}

impl VendorType {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chicken => "Chicken",
            Self::Vegetable => "Vegetable",
            Self::Other => "Other",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "Chicken" => Self::Chicken,
            "Vegetable" => Self::Vegetable,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for VendorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supplier row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub preferred_payment_type: String,
    pub payment_frequency: String,
    pub vendor_type: String,
    pub markup_required: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Supplier {
    /// Get parsed vendor type.
    pub fn parsed_vendor_type(&self) -> VendorType {
        VendorType::from_str(&self.vendor_type)
    }
}

/// Input for creating a supplier.
#[derive(Debug, Clone)]
pub struct CreateSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub preferred_payment_type: String,
    pub payment_frequency: String,
    pub vendor_type: VendorType,
    pub markup_required: bool,
}

/// Input for updating a supplier.
#[derive(Debug, Clone)]
pub struct UpdateSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub preferred_payment_type: String,
    pub payment_frequency: String,
    pub vendor_type: VendorType,
    pub markup_required: bool,
}
