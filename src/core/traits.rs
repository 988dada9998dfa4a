//! Core traits for catalog lookup, payout storage, and limit configuration
//!
//! These traits are the seams between the payout pipeline and its
//! collaborators, so that the in-memory implementations used by the CLI can
//! be swapped for database-backed ones without touching the algorithm.

use crate::types::{
    Item, ItemPayout, ItemTransaction, NewPayout, NewTransaction, Payout, Seller, SellerId,
    StoreError, Transaction,
};
use crate::types::PayoutError;
use rust_decimal::Decimal;

/// Read-only access to sellers and their items
pub trait Catalog {
    /// Look up a seller by id
    fn seller(&self, id: SellerId) -> Option<&Seller>;

    /// Look up the item with the given channel code owned by the seller
    fn item_for_seller(&self, seller_id: SellerId, channel_item_code: &str) -> Option<&Item>;
}

/// Storage for payouts, their batches, and item links
///
/// All writes go through a `StoreTransaction` obtained from `begin`, which
/// makes them visible only once committed.
pub trait PayoutStore {
    /// The unit-of-work handle returned by `begin`
    type Tx<'a>: StoreTransaction
    where
        Self: 'a;

    /// Open a new unit of work
    fn begin(&self) -> Result<Self::Tx<'_>, StoreError>;
}

/// An open unit of work against a `PayoutStore`
///
/// Dropping a handle without calling `commit` discards every write made
/// through it.
pub trait StoreTransaction {
    /// Insert a payout row, assigning its id and timestamps
    fn create_payout(&mut self, payout: NewPayout) -> Result<Payout, StoreError>;

    /// Insert a batch row under a payout created earlier (in this or a committed unit)
    fn create_transaction(&mut self, transaction: NewTransaction)
        -> Result<Transaction, StoreError>;

    /// Link an item to a payout with the number of units it covers
    fn link_item_payout(&mut self, link: ItemPayout) -> Result<(), StoreError>;

    /// Link an item to a batch with the number of units allocated to it
    fn link_item_transaction(&mut self, link: ItemTransaction) -> Result<(), StoreError>;

    /// Make every write of this unit visible
    fn commit(self) -> Result<(), StoreError>;

    /// Discard every write of this unit
    fn rollback(self);
}

/// Source of the maximum converted amount allowed in one batch
pub trait PayoutLimitProvider: Send + Sync {
    /// The limit currently in force
    ///
    /// Callers read this once per request; the value must not change
    /// while a request is being split.
    fn current_payout_limit(&self) -> Result<Decimal, PayoutError>;
}
