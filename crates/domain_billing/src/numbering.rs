//! Invoice reference numbers
//!
//! Reference numbers have the form `<sequence>/<yy>`: a positive sequence
//! that restarts at 1 every calendar year, followed by the two-digit year in
//! which the invoice was created.
//!
//! The sequence continues from the most recently *created* invoice (highest
//! id), not the one with the latest issue date. A new year starts once the
//! latest invoice's issue date falls in a year other than the current one.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use core_kernel::Clock;

use crate::error::BillingError;
use crate::ports::InvoiceNumberPort;

/// A parsed invoice reference number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber {
    sequence: u32,
    year_suffix: u8,
}

impl InvoiceNumber {
    /// Creates a reference number from its parts
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidInvoiceNumber` if the sequence is zero or
    /// the year suffix has more than two digits.
    pub fn new(sequence: u32, year_suffix: u8) -> Result<Self, BillingError> {
        if sequence == 0 || year_suffix > 99 {
            return Err(BillingError::InvalidInvoiceNumber(format!(
                "{sequence}/{year_suffix:02}"
            )));
        }
        Ok(Self {
            sequence,
            year_suffix,
        })
    }

    /// The first number of the given calendar year
    pub fn first_of_year(year: i32) -> Self {
        Self {
            sequence: 1,
            year_suffix: year_suffix(year),
        }
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    pub fn year_suffix(&self) -> u8 {
        self.year_suffix
    }

    /// The number following this one, carrying the given year's suffix
    pub fn successor_in(&self, year: i32) -> Result<Self, BillingError> {
        let sequence = self
            .sequence
            .checked_add(1)
            .ok_or_else(|| BillingError::InvalidInvoiceNumber(self.to_string()))?;
        Ok(Self {
            sequence,
            year_suffix: year_suffix(year),
        })
    }
}

fn year_suffix(year: i32) -> u8 {
    // rem_euclid keeps the result within 0..100
    year.rem_euclid(100) as u8
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:02}", self.sequence, self.year_suffix)
    }
}

impl FromStr for InvoiceNumber {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BillingError::InvalidInvoiceNumber(s.to_string());

        let (sequence, year) = s.split_once('/').ok_or_else(invalid)?;
        if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if year.len() != 2 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let sequence: u32 = sequence.parse().map_err(|_| invalid())?;
        let year_suffix: u8 = year.parse().map_err(|_| invalid())?;
        InvoiceNumber::new(sequence, year_suffix).map_err(|_| invalid())
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> String {
        number.to_string()
    }
}

/// Date and reference number of the most recently created invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestInvoice {
    pub date: NaiveDate,
    pub ref_no: String,
}

/// Computes the reference number the next created invoice receives
///
/// # Errors
///
/// Returns `BillingError::InvalidInvoiceNumber` if the latest invoice of the
/// current year carries a malformed reference number.
pub fn next_invoice_number(
    latest: Option<&LatestInvoice>,
    current_year: i32,
) -> Result<InvoiceNumber, BillingError> {
    match latest {
        None => Ok(InvoiceNumber::first_of_year(current_year)),
        Some(latest) if latest.date.year() != current_year => {
            Ok(InvoiceNumber::first_of_year(current_year))
        }
        Some(latest) => latest.ref_no.parse::<InvoiceNumber>()?.successor_in(current_year),
    }
}

/// Previews the next reference number from the stored invoices
///
/// The preview is advisory: the store assigns the authoritative number when
/// the invoice is inserted.
pub struct InvoiceNumbering<P: ?Sized> {
    port: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<P: InvoiceNumberPort + ?Sized> InvoiceNumbering<P> {
    pub fn new(port: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self { port, clock }
    }

    /// Returns the number the next invoice would receive today
    #[instrument(skip(self))]
    pub async fn next(&self) -> Result<InvoiceNumber, BillingError> {
        let latest = self.port.latest_invoice().await?;
        let year = self.clock.current_year();

        let number = next_invoice_number(latest.as_ref(), year).inspect_err(|e| {
            warn!(error = %e, "Latest invoice carries a malformed reference number");
        })?;
        debug!(%number, year, "Computed next invoice number");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest(ref_no: &str, year: i32) -> LatestInvoice {
        LatestInvoice {
            date: NaiveDate::from_ymd_opt(year, 6, 15).unwrap(),
            ref_no: ref_no.to_string(),
        }
    }

    #[test]
    fn test_same_year_increments() {
        let next = next_invoice_number(Some(&latest("7/24", 2024)), 2024).unwrap();
        assert_eq!(next.to_string(), "8/24");
    }

    #[test]
    fn test_year_rollover_restarts_sequence() {
        let next = next_invoice_number(Some(&latest("311/24", 2024)), 2025).unwrap();
        assert_eq!(next.to_string(), "1/25");
    }

    #[test]
    fn test_no_invoices() {
        let next = next_invoice_number(None, 2025).unwrap();
        assert_eq!(next.to_string(), "1/25");
    }

    #[test]
    fn test_year_suffix_is_zero_padded() {
        assert_eq!(InvoiceNumber::first_of_year(2007).to_string(), "1/07");
        assert_eq!(InvoiceNumber::first_of_year(2100).to_string(), "1/00");
    }

    #[test]
    fn test_malformed_reference_fails_loudly() {
        for bad in ["", "7", "/24", "7/", "7/2024", "x/24", "-3/24", "0/24", " 7/24", "7/24/1"] {
            let result = next_invoice_number(Some(&latest(bad, 2024)), 2024);
            assert!(
                matches!(result, Err(BillingError::InvalidInvoiceNumber(ref s)) if s == bad),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_reference_from_previous_year_is_not_read() {
        let next = next_invoice_number(Some(&latest("garbage", 2023)), 2024).unwrap();
        assert_eq!(next.to_string(), "1/24");
    }

    #[test]
    fn test_leading_zeros_in_sequence_are_accepted() {
        let number: InvoiceNumber = "007/24".parse().unwrap();
        assert_eq!(number.sequence(), 7);
        assert_eq!(number.to_string(), "7/24");
    }

    #[test]
    fn test_serializes_as_string() {
        let number = InvoiceNumber::new(12, 25).unwrap();
        assert_eq!(serde_json::to_string(&number).unwrap(), "\"12/25\"");
        assert!(serde_json::from_str::<InvoiceNumber>("\"12-25\"").is_err());
    }
}
