//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `currency`: Currency codes
//! - `catalog`: Sellers, items, and inbound sold-item references
//! - `ledger`: Persisted payout, transaction, and link records
//! - `report`: The nested per-seller payout report
//! - `error`: Error types for the payout engine

pub mod catalog;
pub mod currency;
pub mod error;
pub mod ledger;
pub mod report;

pub use catalog::{Item, ItemId, Seller, SellerId, SoldItemRef};
pub use currency::Currency;
pub use error::{PayoutError, StoreError};
pub use ledger::{
    ItemPayout, ItemTransaction, NewPayout, NewTransaction, Payout, PayoutId, Transaction,
    TransactionId,
};
pub use report::{BatchReportEntry, PayoutReport, ReportItem, SellerReport};
