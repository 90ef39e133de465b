//! Request and response bodies
//!
//! Responses mostly serialize domain types directly; the types here cover
//! request validation and the few responses with no domain counterpart.

pub mod customers;
pub mod invoices;
pub mod payments;
pub mod products;

use rust_decimal::Decimal;
use validator::ValidationError;

use core_kernel::{Money, Percentage};

use crate::error::ApiError;

/// Discounts are percentages between 0 and 100
pub(crate) fn discount_in_range(value: &Decimal) -> Result<(), ValidationError> {
    if Percentage::new(*value).is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("discount_out_of_range"))
    }
}

pub(crate) fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        Err(ValidationError::new("negative"))
    } else {
        Ok(())
    }
}

pub(crate) fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(ValidationError::new("not_positive"))
    }
}

pub(crate) fn percentage(value: Decimal) -> Result<Percentage, ApiError> {
    Percentage::new(value).map_err(|e| ApiError::validation(e.to_string()))
}

pub(crate) fn money(value: Decimal) -> Money {
    Money::new(value)
}
