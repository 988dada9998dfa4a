//! In-memory seller and item catalog
//!
//! Holds the authoritative seller and item records a payout request is
//! resolved against. Integrity rules are enforced on insertion so that
//! every `(seller_id, channel_item_code)` pair identifies at most one item.

use crate::core::traits::Catalog;
use crate::types::{Item, ItemId, PayoutError, Seller, SellerId};
use std::collections::{HashMap, HashSet};

/// HashMap-backed catalog
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    sellers: HashMap<SellerId, Seller>,
    items: HashMap<(SellerId, String), Item>,
    item_ids: HashSet<ItemId>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a seller
    ///
    /// # Errors
    ///
    /// Returns `InvalidCatalog` if a seller with the same id already exists.
    pub fn insert_seller(&mut self, seller: Seller) -> Result<(), PayoutError> {
        if self.sellers.contains_key(&seller.id) {
            return Err(PayoutError::invalid_catalog(format!(
                "duplicate seller id {}",
                seller.id
            )));
        }
        self.sellers.insert(seller.id, seller);
        Ok(())
    }

    /// Add an item
    ///
    /// # Errors
    ///
    /// Returns `InvalidCatalog` if:
    /// - The owning seller has not been inserted
    /// - Another item already uses the same id
    /// - The seller already owns an item with the same channel code
    pub fn insert_item(&mut self, item: Item) -> Result<(), PayoutError> {
        if !self.sellers.contains_key(&item.seller_id) {
            return Err(PayoutError::invalid_catalog(format!(
                "item {} references unknown seller {}",
                item.id, item.seller_id
            )));
        }
        if self.item_ids.contains(&item.id) {
            return Err(PayoutError::invalid_catalog(format!(
                "duplicate item id {}",
                item.id
            )));
        }

        let key = (item.seller_id, item.channel_item_code.clone());
        if self.items.contains_key(&key) {
            return Err(PayoutError::invalid_catalog(format!(
                "seller {} already has an item with channel_item_code {}",
                item.seller_id, item.channel_item_code
            )));
        }

        self.item_ids.insert(item.id);
        self.items.insert(key, item);
        Ok(())
    }

    /// Build a catalog from loaded records, sellers first
    ///
    /// # Errors
    ///
    /// Returns the first integrity violation, as `insert_seller` and
    /// `insert_item` would.
    pub fn from_records(sellers: Vec<Seller>, items: Vec<Item>) -> Result<Self, PayoutError> {
        let mut catalog = Self::new();
        for seller in sellers {
            catalog.insert_seller(seller)?;
        }
        for item in items {
            catalog.insert_item(item)?;
        }
        Ok(catalog)
    }

    pub fn seller_count(&self) -> usize {
        self.sellers.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

impl Catalog for InMemoryCatalog {
    fn seller(&self, id: SellerId) -> Option<&Seller> {
        self.sellers.get(&id)
    }

    fn item_for_seller(&self, seller_id: SellerId, channel_item_code: &str) -> Option<&Item> {
        self.items.get(&(seller_id, channel_item_code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Currency;
    use rust_decimal::Decimal;

    fn seller(id: SellerId) -> Seller {
        Seller {
            id,
            name: format!("Seller {}", id),
            base_currency: Currency::new("USD"),
        }
    }

    fn item(id: ItemId, seller_id: SellerId, code: &str) -> Item {
        Item {
            id,
            seller_id,
            name: format!("Item {}", id),
            channel_item_code: code.to_string(),
            price_amount: Decimal::new(1000, 2),
            price_currency: Currency::new("USD"),
            quantity: 1,
        }
    }

    #[test]
    fn test_lookup_by_seller_and_code() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_seller(seller(1)).unwrap();
        catalog.insert_seller(seller(2)).unwrap();
        catalog.insert_item(item(10, 1, "A")).unwrap();
        catalog.insert_item(item(11, 2, "A")).unwrap();

        assert_eq!(catalog.item_for_seller(1, "A").map(|i| i.id), Some(10));
        assert_eq!(catalog.item_for_seller(2, "A").map(|i| i.id), Some(11));
        assert!(catalog.item_for_seller(1, "B").is_none());
        assert!(catalog.seller(3).is_none());
        assert_eq!(catalog.seller_count(), 2);
        assert_eq!(catalog.item_count(), 2);
    }

    #[test]
    fn test_rejects_duplicate_seller() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_seller(seller(1)).unwrap();
        assert!(catalog.insert_seller(seller(1)).is_err());
    }

    #[test]
    fn test_rejects_item_of_unknown_seller() {
        let mut catalog = InMemoryCatalog::new();
        let result = catalog.insert_item(item(10, 1, "A"));
        assert!(matches!(result, Err(PayoutError::InvalidCatalog { .. })));
    }

    #[test]
    fn test_rejects_duplicate_code_for_same_seller() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_seller(seller(1)).unwrap();
        catalog.insert_item(item(10, 1, "A")).unwrap();
        assert!(catalog.insert_item(item(11, 1, "A")).is_err());
    }

    #[test]
    fn test_from_records() {
        let catalog =
            InMemoryCatalog::from_records(vec![seller(1)], vec![item(10, 1, "A"), item(11, 1, "B")])
                .unwrap();
        assert_eq!(catalog.item_count(), 2);

        let result = InMemoryCatalog::from_records(vec![seller(1)], vec![item(10, 2, "A")]);
        assert!(matches!(result, Err(PayoutError::InvalidCatalog { .. })));
    }

    #[test]
    fn test_rejects_duplicate_item_id() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert_seller(seller(1)).unwrap();
        catalog.insert_item(item(10, 1, "A")).unwrap();
        assert!(catalog.insert_item(item(10, 1, "B")).is_err());
    }
}
