//! In-memory payout ledger
//!
//! This module provides `InMemoryLedger`, a `PayoutStore` that keeps committed
//! rows in concurrent maps and stages uncommitted writes inside the
//! transaction handle.
//!
//! # Design
//!
//! Committed tables live in `DashMap`s so that concurrent readers never block
//! each other. A unit of work (`LedgerTransaction`) buffers its rows locally
//! and publishes them on `commit` while holding the ledger's write gate, so a
//! reader either sees all rows of a unit or none of them.
//!
//! Ids come from atomic sequences. Like database sequences, ids handed out to
//! a unit that is later rolled back are not reused.

use crate::core::traits::{PayoutStore, StoreTransaction};
use crate::types::{
    ItemId, ItemPayout, ItemTransaction, NewPayout, NewTransaction, Payout, PayoutId,
    StoreError, Transaction, TransactionId,
};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Thread-safe in-memory `PayoutStore`
#[derive(Debug)]
pub struct InMemoryLedger {
    payouts: DashMap<PayoutId, Payout>,
    transactions: DashMap<TransactionId, Transaction>,
    item_payouts: DashMap<(ItemId, PayoutId), ItemPayout>,
    item_transactions: DashMap<(ItemId, TransactionId), ItemTransaction>,
    next_payout_id: AtomicU64,
    next_transaction_id: AtomicU64,

    /// Held for writing while a unit is published, for reading by snapshots
    gate: RwLock<()>,
}

impl InMemoryLedger {
    /// Create an empty ledger; the first payout and transaction get id 1
    pub fn new() -> Self {
        Self {
            payouts: DashMap::new(),
            transactions: DashMap::new(),
            item_payouts: DashMap::new(),
            item_transactions: DashMap::new(),
            next_payout_id: AtomicU64::new(1),
            next_transaction_id: AtomicU64::new(1),
            gate: RwLock::new(()),
        }
    }

    /// Look up a committed payout
    pub fn payout(&self, id: PayoutId) -> Option<Payout> {
        self.payouts.get(&id).map(|entry| entry.value().clone())
    }

    /// All committed payouts, ordered by id
    pub fn payouts(&self) -> Vec<Payout> {
        let _read = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<Payout> = self.payouts.iter().map(|e| e.value().clone()).collect();
        rows.sort_by_key(|p| p.id);
        rows
    }

    /// All committed transactions, ordered by id
    pub fn transactions(&self) -> Vec<Transaction> {
        let _read = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<Transaction> =
            self.transactions.iter().map(|e| e.value().clone()).collect();
        rows.sort_by_key(|t| t.id);
        rows
    }

    /// Committed transactions of one payout, ordered by id
    pub fn transactions_for_payout(&self, payout_id: PayoutId) -> Vec<Transaction> {
        self.transactions()
            .into_iter()
            .filter(|t| t.payout_id == payout_id)
            .collect()
    }

    /// All committed item to payout links, ordered by (payout, item)
    pub fn item_payouts(&self) -> Vec<ItemPayout> {
        let _read = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<ItemPayout> =
            self.item_payouts.iter().map(|e| e.value().clone()).collect();
        rows.sort_by_key(|l| (l.payout_id, l.item_id));
        rows
    }

    /// All committed item to transaction links, ordered by (transaction, item)
    pub fn item_transactions(&self) -> Vec<ItemTransaction> {
        let _read = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        let mut rows: Vec<ItemTransaction> =
            self.item_transactions.iter().map(|e| e.value().clone()).collect();
        rows.sort_by_key(|l| (l.transaction_id, l.item_id));
        rows
    }

    pub fn is_empty(&self) -> bool {
        self.payouts.is_empty()
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PayoutStore for InMemoryLedger {
    type Tx<'a> = LedgerTransaction<'a>;

    fn begin(&self) -> Result<Self::Tx<'_>, StoreError> {
        Ok(LedgerTransaction {
            ledger: self,
            payouts: Vec::new(),
            transactions: Vec::new(),
            item_payouts: Vec::new(),
            item_transactions: Vec::new(),
            finished: false,
        })
    }
}

/// A unit of work against an `InMemoryLedger`
///
/// Rows are staged in the handle and become visible in the ledger only when
/// `commit` succeeds.
#[derive(Debug)]
pub struct LedgerTransaction<'a> {
    ledger: &'a InMemoryLedger,
    payouts: Vec<Payout>,
    transactions: Vec<Transaction>,
    item_payouts: Vec<ItemPayout>,
    item_transactions: Vec<ItemTransaction>,
    finished: bool,
}

impl LedgerTransaction<'_> {
    fn payout_exists(&self, id: PayoutId) -> bool {
        self.payouts.iter().any(|p| p.id == id) || self.ledger.payouts.contains_key(&id)
    }

    fn transaction_exists(&self, id: TransactionId) -> bool {
        self.transactions.iter().any(|t| t.id == id) || self.ledger.transactions.contains_key(&id)
    }

    fn staged_rows(&self) -> usize {
        self.payouts.len()
            + self.transactions.len()
            + self.item_payouts.len()
            + self.item_transactions.len()
    }
}

impl StoreTransaction for LedgerTransaction<'_> {
    fn create_payout(&mut self, payout: NewPayout) -> Result<Payout, StoreError> {
        let now = Utc::now();
        let row = Payout {
            id: self.ledger.next_payout_id.fetch_add(1, Ordering::SeqCst),
            seller_id: payout.seller_id,
            original_amount: payout.original_amount,
            converted_amount: payout.converted_amount,
            original_currency: payout.original_currency,
            converted_currency: payout.converted_currency,
            created_at: now,
            updated_at: now,
        };
        self.payouts.push(row.clone());
        Ok(row)
    }

    fn create_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<Transaction, StoreError> {
        if !self.payout_exists(transaction.payout_id) {
            return Err(StoreError::MissingPayout {
                payout_id: transaction.payout_id,
            });
        }

        let now = Utc::now();
        let row = Transaction {
            id: self.ledger.next_transaction_id.fetch_add(1, Ordering::SeqCst),
            payout_id: transaction.payout_id,
            batch_amount_in_original_currency: transaction.batch_amount_in_original_currency,
            batch_amount_in_base_currency: transaction.batch_amount_in_base_currency,
            created_at: now,
            updated_at: now,
        };
        self.transactions.push(row.clone());
        Ok(row)
    }

    fn link_item_payout(&mut self, link: ItemPayout) -> Result<(), StoreError> {
        if !self.payout_exists(link.payout_id) {
            return Err(StoreError::MissingPayout {
                payout_id: link.payout_id,
            });
        }

        let duplicate = self
            .item_payouts
            .iter()
            .any(|l| l.item_id == link.item_id && l.payout_id == link.payout_id)
            || self
                .ledger
                .item_payouts
                .contains_key(&(link.item_id, link.payout_id));
        if duplicate {
            return Err(StoreError::DuplicateLink {
                item_id: link.item_id,
                parent_id: link.payout_id,
                table: "item_payout",
            });
        }

        self.item_payouts.push(link);
        Ok(())
    }

    fn link_item_transaction(&mut self, link: ItemTransaction) -> Result<(), StoreError> {
        if !self.transaction_exists(link.transaction_id) {
            return Err(StoreError::MissingTransaction {
                transaction_id: link.transaction_id,
            });
        }

        let duplicate = self
            .item_transactions
            .iter()
            .any(|l| l.item_id == link.item_id && l.transaction_id == link.transaction_id)
            || self
                .ledger
                .item_transactions
                .contains_key(&(link.item_id, link.transaction_id));
        if duplicate {
            return Err(StoreError::DuplicateLink {
                item_id: link.item_id,
                parent_id: link.transaction_id,
                table: "item_transaction",
            });
        }

        self.item_transactions.push(link);
        Ok(())
    }

    fn commit(mut self) -> Result<(), StoreError> {
        let rows = self.staged_rows();
        let ledger = self.ledger;
        {
            let _write = ledger.gate.write().unwrap_or_else(PoisonError::into_inner);

            for payout in std::mem::take(&mut self.payouts) {
                ledger.payouts.insert(payout.id, payout);
            }
            for transaction in std::mem::take(&mut self.transactions) {
                ledger.transactions.insert(transaction.id, transaction);
            }
            for link in std::mem::take(&mut self.item_payouts) {
                ledger
                    .item_payouts
                    .insert((link.item_id, link.payout_id), link);
            }
            for link in std::mem::take(&mut self.item_transactions) {
                ledger
                    .item_transactions
                    .insert((link.item_id, link.transaction_id), link);
            }
        }

        self.finished = true;
        debug!(rows, "ledger unit committed");
        Ok(())
    }

    fn rollback(mut self) {
        debug!(rows = self.staged_rows(), "ledger unit rolled back");
        self.finished = true;
    }
}

impl Drop for LedgerTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && self.staged_rows() > 0 {
            debug!(
                rows = self.staged_rows(),
                "ledger unit dropped without commit, writes discarded"
            );
        }
    }
}
