//! Error types for the payout engine
//!
//! This module defines all error types that can occur while loading catalog
//! data and processing a payout request.
//!
//! # Error Categories
//!
//! - **Domain Errors**: Unresolved sellers or items, items over the payout
//!   limit, unsupported currency pairs, amounts overflowing the decimal
//!   range, persistence failures. These abort the whole request and are
//!   reported to the caller as a failure payload.
//! - **Loading Errors**: File not found, malformed CSV or JSON, invalid
//!   catalog or configuration data. These are fatal for the CLI.
//! - **Store Errors**: Failures inside the storage layer, always surfaced to
//!   callers wrapped in `PayoutError::PersistenceFailure`.

use super::catalog::{ItemId, SellerId};
use super::currency::Currency;
use super::ledger::PayoutId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the payout engine
///
/// Each variant includes the context needed to explain the failure to the
/// caller without consulting logs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayoutError {
    /// The request references a seller that does not exist
    #[error("Seller with reference {seller_reference} not found.")]
    SellerNotFound { seller_reference: SellerId },

    /// The channel item code is not owned by the referenced seller
    #[error("Item with channel_item_code {channel_item_code} does not belong to Seller with reference {seller_reference}.")]
    ItemNotFoundForSeller {
        channel_item_code: String,
        seller_reference: SellerId,
    },

    /// A single item's converted price alone meets or exceeds the payout limit
    ///
    /// Such an item can never be placed into any batch, so the request is
    /// aborted before anything is written.
    #[error("Item with ID {item_id} has a price of {amount} {currency} (converted to {converted_amount} {base_currency}), which exceeds the payout limit of {limit} {base_currency}. Please contact support.")]
    ItemExceedsPayoutLimit {
        item_id: ItemId,
        amount: Decimal,
        currency: Currency,
        converted_amount: Decimal,
        base_currency: Currency,
        limit: Decimal,
    },

    /// No conversion rate is configured for the pair
    #[error("Currency conversion from {from} to {to} not available.")]
    UnsupportedCurrencyPair { from: Currency, to: Currency },

    /// An amount left the representable decimal range
    ///
    /// Raised instead of a panic when a catalog price or quantity is large
    /// enough that a conversion or a total cannot be computed.
    #[error("Arithmetic overflow in {operation}.")]
    ArithmeticOverflow {
        /// Operation that would overflow, with the amounts involved
        operation: String,
    },

    /// A storage write failed; the active unit of work was rolled back
    #[error("Failed to create payout for Seller with ID {seller_id}: {source}")]
    PersistenceFailure {
        seller_id: SellerId,
        #[source]
        source: StoreError,
    },

    /// A configuration value is unusable (non-positive limit, bad rate, etc.)
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Catalog data violates an integrity rule (unknown seller, duplicate code, etc.)
    #[error("Invalid catalog data: {message}")]
    InvalidCatalog { message: String },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// CSV or JSON parsing error occurred
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },
}

/// Failures raised by a `PayoutStore` implementation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A child row references a payout that is neither committed nor staged
    #[error("payout {payout_id} does not exist")]
    MissingPayout { payout_id: PayoutId },

    /// A child row references a transaction that is neither committed nor staged
    #[error("transaction {transaction_id} does not exist")]
    MissingTransaction { transaction_id: u64 },

    /// The same item was linked twice to one parent row
    #[error("item {item_id} is already linked to {table} row {parent_id}")]
    DuplicateLink {
        item_id: ItemId,
        parent_id: u64,
        table: &'static str,
    },

    /// The backing store rejected the write
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

impl From<std::io::Error> for PayoutError {
    fn from(error: std::io::Error) -> Self {
        PayoutError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for PayoutError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        PayoutError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for PayoutError {
    fn from(error: csv_async::Error) -> Self {
        PayoutError::ParseError {
            line: None,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for PayoutError {
    fn from(error: serde_json::Error) -> Self {
        PayoutError::ParseError {
            line: Some(error.line() as u64),
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl PayoutError {
    /// Create a SellerNotFound error
    pub fn seller_not_found(seller_reference: SellerId) -> Self {
        PayoutError::SellerNotFound { seller_reference }
    }

    /// Create an ItemNotFoundForSeller error
    pub fn item_not_found_for_seller(channel_item_code: &str, seller_reference: SellerId) -> Self {
        PayoutError::ItemNotFoundForSeller {
            channel_item_code: channel_item_code.to_string(),
            seller_reference,
        }
    }

    /// Create an UnsupportedCurrencyPair error
    pub fn unsupported_currency_pair(from: &Currency, to: &Currency) -> Self {
        PayoutError::UnsupportedCurrencyPair {
            from: from.clone(),
            to: to.clone(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: impl Into<String>) -> Self {
        PayoutError::ArithmeticOverflow {
            operation: operation.into(),
        }
    }

    /// Wrap a store failure with the seller it happened for
    pub fn persistence_failure(seller_id: SellerId, source: StoreError) -> Self {
        PayoutError::PersistenceFailure { seller_id, source }
    }

    /// Create an InvalidConfiguration error
    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        PayoutError::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create an InvalidCatalog error
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        PayoutError::InvalidCatalog {
            message: message.into(),
        }
    }

    /// Whether this error is a domain failure of a request
    ///
    /// Domain failures are reported to the caller as the 400-equivalent
    /// failure payload. Everything else is a fatal loading or configuration
    /// problem of the process itself.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            PayoutError::SellerNotFound { .. }
                | PayoutError::ItemNotFoundForSeller { .. }
                | PayoutError::ItemExceedsPayoutLimit { .. }
                | PayoutError::UnsupportedCurrencyPair { .. }
                | PayoutError::ArithmeticOverflow { .. }
                | PayoutError::PersistenceFailure { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::seller_not_found(
        PayoutError::seller_not_found(99),
        "Seller with reference 99 not found."
    )]
    #[case::item_not_found(
        PayoutError::item_not_found_for_seller("Non_Existing_Item", 3),
        "Item with channel_item_code Non_Existing_Item does not belong to Seller with reference 3."
    )]
    #[case::unsupported_pair(
        PayoutError::unsupported_currency_pair(&Currency::new("USD"), &Currency::new("INVALID")),
        "Currency conversion from USD to INVALID not available."
    )]
    #[case::exceeds_limit(
        PayoutError::ItemExceedsPayoutLimit {
            item_id: 7,
            amount: Decimal::new(1000000, 2),
            currency: Currency::new("USD"),
            converted_amount: Decimal::new(1000000, 2),
            base_currency: Currency::new("USD"),
            limit: Decimal::new(1000, 0),
        },
        "Item with ID 7 has a price of 10000.00 USD (converted to 10000.00 USD), which exceeds the payout limit of 1000 USD. Please contact support."
    )]
    #[case::arithmetic_overflow(
        PayoutError::arithmetic_overflow("conversion of 1 USD to AED"),
        "Arithmetic overflow in conversion of 1 USD to AED."
    )]
    #[case::persistence_failure(
        PayoutError::persistence_failure(4, StoreError::MissingPayout { payout_id: 12 }),
        "Failed to create payout for Seller with ID 4: payout 12 does not exist"
    )]
    #[case::parse_error_with_line(
        PayoutError::ParseError { line: Some(42), message: "Invalid field".to_string() },
        "Parse error at line 42: Invalid field"
    )]
    #[case::parse_error_without_line(
        PayoutError::ParseError { line: None, message: "Invalid field".to_string() },
        "Parse error: Invalid field"
    )]
    #[case::file_not_found(
        PayoutError::FileNotFound { path: "sellers.csv".to_string() },
        "File not found: sellers.csv"
    )]
    fn test_error_display(#[case] error: PayoutError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case(PayoutError::seller_not_found(1), true)]
    #[case(PayoutError::item_not_found_for_seller("X", 1), true)]
    #[case(PayoutError::arithmetic_overflow("batch total"), true)]
    #[case(PayoutError::persistence_failure(1, StoreError::Unavailable { message: "down".into() }), true)]
    #[case(PayoutError::invalid_catalog("duplicate seller"), false)]
    #[case(PayoutError::invalid_configuration("limit"), false)]
    #[case(PayoutError::IoError { message: "denied".into() }, false)]
    fn test_is_domain(#[case] error: PayoutError, #[case] expected: bool) {
        assert_eq!(error.is_domain(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: PayoutError = io_error.into();
        assert!(matches!(error, PayoutError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
