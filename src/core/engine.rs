//! Payout processing engine
//!
//! This module provides the `PayoutEngine` that turns a list of sold item
//! references into committed payouts by running the pipeline stages in order:
//!
//! 1. `ItemResolver` - resolve references against the catalog
//! 2. `PayoutAggregator` - group by seller and currency pair, convert
//! 3. `BatchSplitter` - cut each group into batches under the payout limit
//! 4. `PersistenceCoordinator` - write everything in one unit of work
//! 5. `ResponseBuilder` - shape the committed rows into the report
//!
//! Every stage before persistence is a pure in-memory transform. A failure
//! in any of them aborts the request before the store is touched, and a
//! failure during persistence rolls the unit back, so each request either
//! commits all of its rows or none.

use crate::core::aggregator::PayoutAggregator;
use crate::core::converter::CurrencyConverter;
use crate::core::persistence::{PersistenceCoordinator, PlannedPayout};
use crate::core::resolver::ItemResolver;
use crate::core::response::ResponseBuilder;
use crate::core::splitter::BatchSplitter;
use crate::core::traits::{Catalog, PayoutLimitProvider, PayoutStore};
use crate::types::{PayoutError, PayoutReport, SoldItemRef};
use std::sync::Arc;
use tracing::{debug, info};

/// Payout processing engine
///
/// Owns the read-only catalog, the currency converter, the limit provider,
/// and the payout store. The engine itself holds no per-request state, so
/// one instance can serve any number of requests.
pub struct PayoutEngine<C: Catalog, S: PayoutStore> {
    catalog: C,
    converter: CurrencyConverter,
    limits: Arc<dyn PayoutLimitProvider>,
    store: S,
}

impl<C: Catalog, S: PayoutStore> PayoutEngine<C, S> {
    /// Create a new PayoutEngine
    ///
    /// # Arguments
    ///
    /// * `catalog` - Sellers and items that requests are resolved against
    /// * `converter` - Converts item prices into seller base currencies
    /// * `limits` - Source of the payout limit, read once per request
    /// * `store` - Destination of committed payout rows
    pub fn new(
        catalog: C,
        converter: CurrencyConverter,
        limits: Arc<dyn PayoutLimitProvider>,
        store: S,
    ) -> Self {
        PayoutEngine {
            catalog,
            converter,
            limits,
            store,
        }
    }

    /// Process one payout request
    ///
    /// # Arguments
    ///
    /// * `sold_items` - The validated sold item references of the request
    ///
    /// # Returns
    ///
    /// * `Ok(PayoutReport)` with one entry per committed batch. An empty
    ///   request yields an empty report and writes nothing.
    /// * `Err(PayoutError)` if any stage fails; nothing is committed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A seller or item reference cannot be resolved
    /// - An item currency cannot be converted to its seller's base currency
    /// - A single item's converted price reaches the payout limit
    /// - A converted price or a total leaves the `Decimal` range
    /// - The limit provider fails or yields a non-positive limit
    /// - The store fails while writing (the unit of work is rolled back)
    pub fn process(&self, sold_items: &[SoldItemRef]) -> Result<PayoutReport, PayoutError> {
        if sold_items.is_empty() {
            debug!("empty payout request");
            return Ok(PayoutReport::new());
        }

        let limit = self.limits.current_payout_limit()?;
        let splitter = BatchSplitter::new(limit)?;

        let resolved = ItemResolver::new(&self.catalog).resolve(sold_items)?;
        debug!(
            references = sold_items.len(),
            items = resolved.len(),
            "sold items resolved"
        );

        let groups = PayoutAggregator::new(&self.converter).aggregate(&resolved)?;

        let plans = groups
            .into_iter()
            .map(|group| {
                let batches = splitter.split(&group)?;
                Ok(PlannedPayout { group, batches })
            })
            .collect::<Result<Vec<_>, PayoutError>>()?;

        let persisted = PersistenceCoordinator::new(&self.store).persist(plans)?;

        info!(
            limit = %limit,
            payouts = persisted.len(),
            "payout request processed"
        );
        Ok(ResponseBuilder::new().build(&persisted))
    }

    /// The store committed payouts are written to
    pub fn store(&self) -> &S {
        &self.store
    }
}
