//! Core business logic module
//!
//! This module contains the payout processing components:
//! - `traits` - Seams for the catalog, payout store, and limit source
//! - `catalog` - In-memory seller and item catalog
//! - `converter` - Currency rate table and conversion
//! - `resolver` - Sold item reference resolution
//! - `aggregator` - Grouping by seller and currency pair
//! - `splitter` - Greedy batch splitting under the payout limit
//! - `limit` - Fixed and cached payout limit providers
//! - `ledger` - In-memory transactional payout store
//! - `persistence` - Atomic write of planned payouts
//! - `response` - Report assembly
//! - `engine` - Pipeline orchestration

pub mod aggregator;
pub mod catalog;
pub mod converter;
pub mod engine;
pub mod ledger;
pub mod limit;
pub mod persistence;
pub mod resolver;
pub mod response;
pub mod splitter;
pub mod traits;

pub use aggregator::{CurrencyGroup, PayoutAggregator};
pub use catalog::InMemoryCatalog;
pub use converter::{CurrencyConverter, RateTable};
pub use engine::PayoutEngine;
pub use ledger::InMemoryLedger;
pub use limit::{CachedPayoutLimit, FixedPayoutLimit};
pub use persistence::PersistenceCoordinator;
pub use resolver::ItemResolver;
pub use response::ResponseBuilder;
pub use splitter::{Batch, BatchSplitter};
pub use traits::{Catalog, PayoutLimitProvider, PayoutStore, StoreTransaction};
