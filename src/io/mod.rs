//! I/O module
//!
//! Handles catalog loading, request parsing, and output.
//!
//! # Components
//!
//! - `csv_format` - CSV record formats, conversion, and ledger serialization
//! - `sync_reader` - Synchronous CSV reader and catalog loaders
//! - `async_reader` - Asynchronous CSV reader and concurrent catalog loaders
//! - `request` - Payout request parsing and validation
//! - `json_format` - Response envelopes
//! - `ledger_export` - CSV export of committed ledger rows

pub mod async_reader;
pub mod csv_format;
pub mod json_format;
pub mod ledger_export;
pub mod request;
pub mod sync_reader;

/// Seller records inside a catalog directory
pub const SELLERS_FILE: &str = "sellers.csv";

/// Item records inside a catalog directory
pub const ITEMS_FILE: &str = "items.csv";

pub use async_reader::AsyncReader;
pub use json_format::ResponseStatus;
pub use request::{parse_request, validate_request, ValidationErrors};
pub use sync_reader::SyncReader;
