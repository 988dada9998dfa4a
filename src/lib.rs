//! Payout Engine Library
//! # Overview
//!
//! This library turns a batch of sold items into seller payouts: each item is
//! resolved against a catalog, converted into its seller's base currency,
//! grouped per seller and currency pair, split into batches that stay below a
//! payout limit, and committed atomically to a payout ledger.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Seller, Item, Payout, Transaction, report types, errors)
//! - [`cli`] - CLI arguments parsing and log setup
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Request processing orchestration
//!   - [`core::converter`] - Rate table and currency conversion
//!   - [`core::splitter`] - Batch splitting under the payout limit
//!   - [`core::ledger`] - In-memory payout ledger with units of work
//! - [`io`] - CSV catalog loading, request validation, response envelopes
//! - [`strategy`] - Sync and async processing pipelines
//!
//! # Batching
//!
//! Every unit of an item is placed into the first batch with enough room
//! left, so no batch exceeds the payout limit. A single unit whose converted
//! price alone reaches the limit aborts the whole request before anything is
//! written.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use crate::core::{CurrencyConverter, InMemoryCatalog, InMemoryLedger, PayoutEngine, RateTable};
pub use io::ResponseStatus;
pub use types::{
    BatchReportEntry, Currency, Item, PayoutError, PayoutReport, Seller, SoldItemRef,
};
