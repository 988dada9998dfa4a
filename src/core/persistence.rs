//! Atomic persistence of planned payouts
//!
//! Once every currency group has been split, the planned payouts of a request
//! are written in a single unit of work: one payout row per group, one
//! transaction row per batch, and the item link rows. Any store failure rolls
//! the whole unit back, so a request leaves either all of its rows or none.

use crate::core::aggregator::CurrencyGroup;
use crate::core::splitter::Batch;
use crate::core::traits::{PayoutStore, StoreTransaction};
use crate::types::{
    ItemPayout, ItemTransaction, NewPayout, NewTransaction, Payout, PayoutError, StoreError,
    Transaction,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

/// A currency group together with the batches it was split into
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPayout {
    pub group: CurrencyGroup,
    pub batches: Vec<Batch>,
}

/// A batch and the transaction row it was stored as
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedBatch {
    pub transaction: Transaction,
    pub batch: Batch,
}

/// A planned payout after its rows were written
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedPayout {
    pub group: CurrencyGroup,
    pub payout: Payout,
    pub batches: Vec<PersistedBatch>,
}

/// Writes planned payouts to a `PayoutStore`
pub struct PersistenceCoordinator<'a, S: PayoutStore> {
    store: &'a S,
}

impl<'a, S: PayoutStore> PersistenceCoordinator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        PersistenceCoordinator { store }
    }

    /// Write every planned payout in one unit of work
    ///
    /// # Arguments
    ///
    /// * `plans` - Fully split payouts, in the order they should be stored
    ///
    /// # Returns
    ///
    /// The persisted payouts, in input order, with their batches in
    /// allocation order.
    ///
    /// # Errors
    ///
    /// Returns `PersistenceFailure` naming the seller whose rows were being
    /// written when the store failed. Nothing is committed in that case.
    pub fn persist(&self, plans: Vec<PlannedPayout>) -> Result<Vec<PersistedPayout>, PayoutError> {
        let Some(first_seller) = plans.first().map(|plan| plan.group.key.seller_id) else {
            return Ok(Vec::new());
        };

        let mut tx = self
            .store
            .begin()
            .map_err(|e| PayoutError::persistence_failure(first_seller, e))?;

        let mut persisted = Vec::with_capacity(plans.len());
        for plan in plans {
            let seller_id = plan.group.key.seller_id;
            match write_plan(&mut tx, plan) {
                Ok(written) => persisted.push(written),
                Err(error) => {
                    warn!(seller = seller_id, error = %error, "payout write failed, rolling back");
                    tx.rollback();
                    return Err(PayoutError::persistence_failure(seller_id, error));
                }
            }
        }

        tx.commit()
            .map_err(|e| PayoutError::persistence_failure(first_seller, e))?;

        info!(
            payouts = persisted.len(),
            transactions = persisted.iter().map(|p| p.batches.len()).sum::<usize>(),
            "payouts committed"
        );
        Ok(persisted)
    }
}

fn write_plan<T: StoreTransaction>(
    tx: &mut T,
    plan: PlannedPayout,
) -> Result<PersistedPayout, StoreError> {
    let PlannedPayout { group, batches } = plan;

    let original_amount: Decimal = batches.iter().map(|b| b.amount_in_original_currency).sum();
    let converted_amount: Decimal = batches.iter().map(|b| b.amount_in_base_currency).sum();

    let payout = tx.create_payout(NewPayout {
        seller_id: group.key.seller_id,
        original_amount,
        converted_amount,
        original_currency: group.key.original_currency.clone(),
        converted_currency: group.key.converted_currency.clone(),
    })?;

    for line in &group.lines {
        tx.link_item_payout(ItemPayout {
            item_id: line.item_id,
            payout_id: payout.id,
            quantity: line.quantity,
            created_at: payout.created_at,
        })?;
    }

    let mut written = Vec::with_capacity(batches.len());
    for batch in batches {
        let transaction = tx.create_transaction(NewTransaction {
            payout_id: payout.id,
            batch_amount_in_original_currency: batch.amount_in_original_currency,
            batch_amount_in_base_currency: batch.amount_in_base_currency,
        })?;

        for line in &batch.lines {
            tx.link_item_transaction(ItemTransaction {
                item_id: line.item_id,
                transaction_id: transaction.id,
                quantity: line.quantity,
                created_at: transaction.created_at,
            })?;
        }

        written.push(PersistedBatch { transaction, batch });
    }

    Ok(PersistedPayout {
        group,
        payout,
        batches: written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::{GroupKey, GroupLine};
    use crate::core::ledger::{InMemoryLedger, LedgerTransaction};
    use crate::core::splitter::BatchSplitter;
    use crate::types::{Currency, Seller, SellerId};
    use rstest::rstest;

    fn plan(seller_id: SellerId, lines: &[(u64, i64, u32)], limit: i64) -> PlannedPayout {
        let lines: Vec<GroupLine> = lines
            .iter()
            .map(|&(item_id, cents, quantity)| GroupLine {
                item_id,
                channel_item_code: format!("CODE_{}", item_id),
                name: format!("Item {}", item_id),
                unit_amount: Decimal::new(cents, 2),
                unit_converted_amount: Decimal::new(cents, 2),
                quantity,
            })
            .collect();
        let group = CurrencyGroup {
            key: GroupKey {
                seller_id,
                original_currency: Currency::new("USD"),
                converted_currency: Currency::new("USD"),
            },
            seller: Seller {
                id: seller_id,
                name: format!("Seller {}", seller_id),
                base_currency: Currency::new("USD"),
            },
            total_original_amount: lines.iter().map(|l| l.total_amount().unwrap()).sum(),
            total_converted_amount: lines.iter().map(|l| l.total_converted_amount().unwrap()).sum(),
            lines,
        };
        let batches = BatchSplitter::new(Decimal::from(limit))
            .unwrap()
            .split(&group)
            .unwrap();
        PlannedPayout { group, batches }
    }

    #[test]
    fn test_persists_payout_batches_and_links() {
        let ledger = InMemoryLedger::new();
        let coordinator = PersistenceCoordinator::new(&ledger);

        let persisted = coordinator
            .persist(vec![plan(1, &[(10, 50000, 3)], 1000)])
            .unwrap();

        assert_eq!(persisted.len(), 1);
        let payout = &persisted[0].payout;
        assert_eq!(payout.converted_amount, Decimal::from(1500));
        assert_eq!(persisted[0].batches.len(), 2);

        let stored = ledger.transactions_for_payout(payout.id);
        let sum: Decimal = stored.iter().map(|t| t.batch_amount_in_base_currency).sum();
        assert_eq!(sum, payout.converted_amount);

        let links = ledger.item_payouts();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].quantity, 3);

        let quantities: Vec<u32> = ledger
            .item_transactions()
            .iter()
            .map(|l| l.quantity)
            .collect();
        assert_eq!(quantities, vec![2, 1]);
    }

    #[test]
    fn test_empty_plan_list_writes_nothing() {
        let ledger = InMemoryLedger::new();
        let persisted = PersistenceCoordinator::new(&ledger).persist(Vec::new()).unwrap();
        assert!(persisted.is_empty());
        assert!(ledger.is_empty());
    }

    /// Where `FailingStore` injects its failure
    #[derive(Debug, Clone, Copy)]
    enum FailAt {
        Begin,
        /// The n-th `create_transaction` call (1-based) across the unit
        Transaction(usize),
        Commit,
    }

    struct FailingStore {
        inner: InMemoryLedger,
        fail_at: FailAt,
    }

    struct FailingTransaction<'a> {
        inner: LedgerTransaction<'a>,
        fail_at: FailAt,
        transactions: usize,
    }

    fn unavailable() -> StoreError {
        StoreError::Unavailable {
            message: "connection reset".to_string(),
        }
    }

    impl PayoutStore for FailingStore {
        type Tx<'a> = FailingTransaction<'a>;

        fn begin(&self) -> Result<Self::Tx<'_>, StoreError> {
            if matches!(self.fail_at, FailAt::Begin) {
                return Err(unavailable());
            }
            Ok(FailingTransaction {
                inner: self.inner.begin()?,
                fail_at: self.fail_at,
                transactions: 0,
            })
        }
    }

    impl StoreTransaction for FailingTransaction<'_> {
        fn create_payout(&mut self, payout: NewPayout) -> Result<Payout, StoreError> {
            self.inner.create_payout(payout)
        }

        fn create_transaction(
            &mut self,
            transaction: NewTransaction,
        ) -> Result<Transaction, StoreError> {
            self.transactions += 1;
            if matches!(self.fail_at, FailAt::Transaction(n) if n == self.transactions) {
                return Err(unavailable());
            }
            self.inner.create_transaction(transaction)
        }

        fn link_item_payout(&mut self, link: ItemPayout) -> Result<(), StoreError> {
            self.inner.link_item_payout(link)
        }

        fn link_item_transaction(&mut self, link: ItemTransaction) -> Result<(), StoreError> {
            self.inner.link_item_transaction(link)
        }

        fn commit(self) -> Result<(), StoreError> {
            if matches!(self.fail_at, FailAt::Commit) {
                self.inner.rollback();
                return Err(unavailable());
            }
            self.inner.commit()
        }

        fn rollback(self) {
            self.inner.rollback()
        }
    }

    #[rstest]
    #[case::on_begin(FailAt::Begin, 1)]
    #[case::first_seller(FailAt::Transaction(1), 1)]
    #[case::second_seller(FailAt::Transaction(3), 2)]
    #[case::on_commit(FailAt::Commit, 1)]
    fn test_failure_rolls_back_everything(#[case] fail_at: FailAt, #[case] seller: SellerId) {
        let store = FailingStore {
            inner: InMemoryLedger::new(),
            fail_at,
        };
        let coordinator = PersistenceCoordinator::new(&store);

        // Seller 1 needs two batches, seller 2 one
        let result = coordinator.persist(vec![
            plan(1, &[(10, 60000, 1), (11, 60000, 1)], 1000),
            plan(2, &[(20, 10000, 1)], 1000),
        ]);

        let error = result.unwrap_err();
        assert!(matches!(
            error,
            PayoutError::PersistenceFailure { seller_id, .. } if seller_id == seller
        ));
        assert_eq!(
            error.to_string(),
            format!(
                "Failed to create payout for Seller with ID {}: store unavailable: connection reset",
                seller
            )
        );
        assert!(store.inner.payouts().is_empty());
        assert!(store.inner.transactions().is_empty());
        assert!(store.inner.item_payouts().is_empty());
        assert!(store.inner.item_transactions().is_empty());
    }
}
