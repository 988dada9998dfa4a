//! CSV export of committed ledger rows
//!
//! Writes one file per table into a directory:
//! `payouts.csv`, `transactions.csv`, `item_payout.csv`, `item_transaction.csv`.

use crate::core::ledger::InMemoryLedger;
use crate::io::csv_format::{
    write_item_payouts_csv, write_item_transactions_csv, write_payouts_csv,
    write_transactions_csv,
};
use crate::types::PayoutError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub const PAYOUTS_FILE: &str = "payouts.csv";
pub const TRANSACTIONS_FILE: &str = "transactions.csv";
pub const ITEM_PAYOUT_FILE: &str = "item_payout.csv";
pub const ITEM_TRANSACTION_FILE: &str = "item_transaction.csv";

fn write_file<F>(dir: &Path, name: &str, write: F) -> Result<(), PayoutError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), String>,
{
    let path = dir.join(name);
    let file = File::create(&path).map_err(|e| PayoutError::IoError {
        message: format!("Failed to create '{}': {}", path.display(), e),
    })?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(|message| PayoutError::IoError { message })
}

/// Export every committed row of the ledger
///
/// The directory is created if needed and existing files are overwritten.
///
/// # Errors
///
/// Returns `IoError` if the directory or a file cannot be written.
pub fn export_ledger(ledger: &InMemoryLedger, dir: &Path) -> Result<(), PayoutError> {
    std::fs::create_dir_all(dir)?;

    let payouts = ledger.payouts();
    let transactions = ledger.transactions();

    write_file(dir, PAYOUTS_FILE, |out| write_payouts_csv(&payouts, out))?;
    write_file(dir, TRANSACTIONS_FILE, |out| {
        write_transactions_csv(&transactions, out)
    })?;
    write_file(dir, ITEM_PAYOUT_FILE, |out| {
        write_item_payouts_csv(&ledger.item_payouts(), out)
    })?;
    write_file(dir, ITEM_TRANSACTION_FILE, |out| {
        write_item_transactions_csv(&ledger.item_transactions(), out)
    })?;

    info!(
        dir = %dir.display(),
        payouts = payouts.len(),
        transactions = transactions.len(),
        "ledger exported"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::{PayoutStore, StoreTransaction};
    use crate::types::{Currency, ItemPayout, NewPayout, NewTransaction};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    #[test]
    fn test_export_writes_all_tables() {
        let ledger = InMemoryLedger::new();
        let mut tx = ledger.begin().unwrap();
        let payout = tx
            .create_payout(NewPayout {
                seller_id: 2,
                original_amount: Decimal::new(50000, 2),
                converted_amount: Decimal::new(11500, 2),
                original_currency: Currency::new("AED"),
                converted_currency: Currency::new("EUR"),
            })
            .unwrap();
        tx.create_transaction(NewTransaction {
            payout_id: payout.id,
            batch_amount_in_original_currency: Decimal::new(50000, 2),
            batch_amount_in_base_currency: Decimal::new(11500, 2),
        })
        .unwrap();
        tx.link_item_payout(ItemPayout {
            item_id: 2,
            payout_id: payout.id,
            quantity: 1,
            created_at: payout.created_at,
        })
        .unwrap();
        tx.commit().unwrap();

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("ledger");
        export_ledger(&ledger, &target).unwrap();

        let payouts = std::fs::read_to_string(target.join(PAYOUTS_FILE)).unwrap();
        let lines: Vec<&str> = payouts.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("1,2,500.00,115.00,AED,EUR,"));

        let transactions = std::fs::read_to_string(target.join(TRANSACTIONS_FILE)).unwrap();
        assert_eq!(transactions.lines().count(), 2);

        let item_payout = std::fs::read_to_string(target.join(ITEM_PAYOUT_FILE)).unwrap();
        assert!(item_payout.lines().nth(1).unwrap().starts_with("2,1,1,"));

        let item_transaction = std::fs::read_to_string(target.join(ITEM_TRANSACTION_FILE)).unwrap();
        assert_eq!(item_transaction, "item_id,transaction_id,quantity,created_at\n");
    }
}
