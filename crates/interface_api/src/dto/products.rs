//! Product DTOs

use serde::Deserialize;
use validator::Validate;

use domain_billing::ProductDetails;

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub piece_suffix: String,
    #[serde(default)]
    pub bulk_suffix: String,
    #[serde(default)]
    pub piece_barcode: String,
    pub bulk_barcode: Option<String>,
    pub active: Option<bool>,
    #[serde(default)]
    pub display_order: i32,
}

impl From<ProductRequest> for ProductDetails {
    fn from(request: ProductRequest) -> Self {
        ProductDetails {
            name: request.name,
            short_name: request.short_name,
            piece_suffix: request.piece_suffix,
            bulk_suffix: request.bulk_suffix,
            piece_barcode: request.piece_barcode,
            bulk_barcode: request.bulk_barcode,
            active: request.active.unwrap_or(true),
            display_order: request.display_order,
        }
    }
}
