//! Products and the units they are sold in

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::ProductId;

/// Unit a product is sold in
///
/// Every product can be sold per piece or in bulk by weight; each unit has its
/// own price, discount, name suffix and barcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Piece,
    Bulk,
}

impl Unit {
    /// Both units, piece first
    pub const ALL: [Unit; 2] = [Unit::Piece, Unit::Bulk];

    /// Unit of measure printed on invoices
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Piece => "pc",
            Unit::Bulk => "kg",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Piece => write!(f, "piece"),
            Unit::Bulk => write!(f, "bulk"),
        }
    }
}

/// Editable product data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub short_name: String,
    /// Appended to the name on piece line items
    pub piece_suffix: String,
    /// Appended to the name on bulk line items
    pub bulk_suffix: String,
    pub piece_barcode: String,
    pub bulk_barcode: Option<String>,
    pub active: bool,
    /// Position in product lists and editable price lists
    pub display_order: i32,
}

/// A product in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(flatten)]
    pub details: ProductDetails,
}

impl Product {
    pub fn new(id: ProductId, details: ProductDetails) -> Self {
        Self { id, details }
    }

    pub fn is_active(&self) -> bool {
        self.details.active
    }

    pub fn display_order(&self) -> i32 {
        self.details.display_order
    }

    /// Name copied onto a line item sold in the given unit
    pub fn line_name(&self, unit: Unit) -> String {
        let suffix = match unit {
            Unit::Piece => &self.details.piece_suffix,
            Unit::Bulk => &self.details.bulk_suffix,
        };
        if suffix.is_empty() {
            self.details.name.clone()
        } else {
            format!("{} {}", self.details.name, suffix)
        }
    }

    /// Barcode copied onto a line item sold in the given unit
    pub fn barcode(&self, unit: Unit) -> Option<&str> {
        match unit {
            Unit::Piece => Some(self.details.piece_barcode.as_str()),
            Unit::Bulk => self.details.bulk_barcode.as_deref(),
        }
    }
}
