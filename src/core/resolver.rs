//! Sold item resolution
//!
//! Turns the caller's `(seller_reference, channel_item_code)` pairs into
//! authoritative seller and item records. Resolution is all-or-nothing: the
//! first unresolvable reference aborts the request before anything else runs.

use crate::core::traits::Catalog;
use crate::types::{Item, PayoutError, Seller, SoldItemRef};
use std::collections::HashSet;
use tracing::debug;

/// A sold item reference resolved against the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedItem {
    pub seller: Seller,
    pub item: Item,
}

/// Resolves sold item references against a `Catalog`
pub struct ItemResolver<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: Catalog + ?Sized> ItemResolver<'a, C> {
    pub fn new(catalog: &'a C) -> Self {
        ItemResolver { catalog }
    }

    /// Resolve every reference, preserving request order
    ///
    /// A reference repeated in the same request resolves to the item once;
    /// the item's stored quantity decides how many units are paid out.
    ///
    /// # Errors
    ///
    /// - `SellerNotFound` if a `seller_reference` has no seller
    /// - `ItemNotFoundForSeller` if the seller owns no item with the code
    pub fn resolve(&self, refs: &[SoldItemRef]) -> Result<Vec<ResolvedItem>, PayoutError> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(refs.len());

        for sold in refs {
            let seller = self
                .catalog
                .seller(sold.seller_reference)
                .ok_or_else(|| PayoutError::seller_not_found(sold.seller_reference))?;

            let item = self
                .catalog
                .item_for_seller(seller.id, &sold.channel_item_code)
                .ok_or_else(|| {
                    PayoutError::item_not_found_for_seller(
                        &sold.channel_item_code,
                        sold.seller_reference,
                    )
                })?;

            if !seen.insert(item.id) {
                debug!(
                    seller = seller.id,
                    code = %sold.channel_item_code,
                    "duplicate sold item reference collapsed"
                );
                continue;
            }

            resolved.push(ResolvedItem {
                seller: seller.clone(),
                item: item.clone(),
            });
        }

        Ok(resolved)
    }
}
