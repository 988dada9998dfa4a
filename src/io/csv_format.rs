//! CSV format handling for catalog input and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Record structures for `sellers.csv`, `items.csv`, and `rates.csv`
//! - Validated conversion from CSV records to domain types
//! - Serialization of committed ledger rows
//!
//! All functions are pure (no file access) for easy testing.

use crate::core::converter::round_amount;
use crate::types::{
    Currency, Item, ItemId, ItemPayout, ItemTransaction, Payout, Seller, SellerId, Transaction,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

/// Longest accepted channel item code, in characters
pub const MAX_CHANNEL_ITEM_CODE_LEN: usize = 255;

/// Row of `sellers.csv`: `id,name,base_currency`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SellerCsvRecord {
    pub id: SellerId,
    pub name: String,
    pub base_currency: String,
}

/// Row of `items.csv`:
/// `id,seller_id,name,channel_item_code,price_amount,price_currency,quantity`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ItemCsvRecord {
    pub id: ItemId,
    pub seller_id: SellerId,
    pub name: String,
    pub channel_item_code: String,
    pub price_amount: String,
    pub price_currency: String,
    pub quantity: u32,
}

/// Row of `rates.csv`: `from,to,rate`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RateCsvRecord {
    pub from: String,
    pub to: String,
    pub rate: String,
}

/// Convert a SellerCsvRecord to a Seller
///
/// # Errors
///
/// Returns a message if the name is blank or the base currency is not a
/// three-letter code.
pub fn convert_seller_record(record: SellerCsvRecord) -> Result<Seller, String> {
    if record.name.trim().is_empty() {
        return Err(format!("Seller {} has an empty name", record.id));
    }

    let base_currency = Currency::parse(&record.base_currency)
        .map_err(|e| format!("Seller {}: {}", record.id, e))?;

    Ok(Seller {
        id: record.id,
        name: record.name,
        base_currency,
    })
}

/// Convert an ItemCsvRecord to an Item
///
/// The price is normalized to two decimal places. Seller existence and
/// uniqueness are checked later, when the item is added to the catalog.
///
/// # Errors
///
/// Returns a message if:
/// - The channel item code is blank or longer than 255 characters
/// - The price is not a decimal number, or is negative
/// - The price currency is not a three-letter code
pub fn convert_item_record(record: ItemCsvRecord) -> Result<Item, String> {
    let code = record.channel_item_code.trim();
    if code.is_empty() {
        return Err(format!("Item {} has an empty channel_item_code", record.id));
    }
    if code.chars().count() > MAX_CHANNEL_ITEM_CODE_LEN {
        return Err(format!(
            "Item {} channel_item_code exceeds {} characters",
            record.id, MAX_CHANNEL_ITEM_CODE_LEN
        ));
    }

    let price = Decimal::from_str(record.price_amount.trim()).map_err(|_| {
        format!(
            "Invalid price_amount '{}' for item {}",
            record.price_amount, record.id
        )
    })?;
    if price < Decimal::ZERO {
        return Err(format!(
            "Item {} has a negative price_amount {}",
            record.id, price
        ));
    }

    let price_currency = Currency::parse(&record.price_currency)
        .map_err(|e| format!("Item {}: {}", record.id, e))?;

    Ok(Item {
        id: record.id,
        seller_id: record.seller_id,
        name: record.name,
        channel_item_code: code.to_string(),
        price_amount: round_amount(price),
        price_currency,
        quantity: record.quantity,
    })
}

/// Convert a RateCsvRecord to a `(from, to, rate)` entry
///
/// Positivity and duplicates are checked by `RateTable::insert`.
pub fn convert_rate_record(record: RateCsvRecord) -> Result<(Currency, Currency, Decimal), String> {
    let from = Currency::parse(&record.from)?;
    let to = Currency::parse(&record.to)?;
    let rate = Decimal::from_str(record.rate.trim())
        .map_err(|_| format!("Invalid rate '{}' for {} -> {}", record.rate, from, to))?;
    Ok((from, to, rate))
}

pub const PAYOUT_HEADERS: [&str; 8] = [
    "id",
    "seller_id",
    "original_amount",
    "converted_amount",
    "original_currency",
    "converted_currency",
    "created_at",
    "updated_at",
];

pub const TRANSACTION_HEADERS: [&str; 6] = [
    "id",
    "payout_id",
    "batch_amount_in_original_currency",
    "batch_amount_in_base_currency",
    "created_at",
    "updated_at",
];

pub const ITEM_PAYOUT_HEADERS: [&str; 4] = ["item_id", "payout_id", "quantity", "created_at"];

pub const ITEM_TRANSACTION_HEADERS: [&str; 4] =
    ["item_id", "transaction_id", "quantity", "created_at"];

/// Write rows under an explicit header line
///
/// The header is written even when there are no rows, so an empty table
/// still produces a well-formed file.
fn write_rows<T: Serialize>(
    headers: &[&str],
    rows: &[T],
    output: &mut dyn Write,
) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer
        .write_record(headers)
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| format!("Failed to write CSV record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write payout rows in `payouts.csv` format
pub fn write_payouts_csv(payouts: &[Payout], output: &mut dyn Write) -> Result<(), String> {
    write_rows(&PAYOUT_HEADERS, payouts, output)
}

/// Write transaction rows in `transactions.csv` format
pub fn write_transactions_csv(
    transactions: &[Transaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    write_rows(&TRANSACTION_HEADERS, transactions, output)
}

/// Write item to payout links in `item_payout.csv` format
pub fn write_item_payouts_csv(links: &[ItemPayout], output: &mut dyn Write) -> Result<(), String> {
    write_rows(&ITEM_PAYOUT_HEADERS, links, output)
}

/// Write item to transaction links in `item_transaction.csv` format
pub fn write_item_transactions_csv(
    links: &[ItemTransaction],
    output: &mut dyn Write,
) -> Result<(), String> {
    write_rows(&ITEM_TRANSACTION_HEADERS, links, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn item_record(code: &str, price: &str, currency: &str) -> ItemCsvRecord {
        ItemCsvRecord {
            id: 1,
            seller_id: 1,
            name: "Widget".to_string(),
            channel_item_code: code.to_string(),
            price_amount: price.to_string(),
            price_currency: currency.to_string(),
            quantity: 2,
        }
    }

    #[test]
    fn test_convert_seller_record() {
        let seller = convert_seller_record(SellerCsvRecord {
            id: 5,
            name: "Collier, Greenholt and Blanda".to_string(),
            base_currency: "gbp".to_string(),
        })
        .unwrap();

        assert_eq!(seller.id, 5);
        assert_eq!(seller.base_currency, Currency::new("GBP"));
    }

    #[rstest]
    #[case::blank_name("  ", "USD", "empty name")]
    #[case::bad_currency("Shop", "DOLLARS", "DOLLARS")]
    fn test_convert_seller_record_errors(
        #[case] name: &str,
        #[case] currency: &str,
        #[case] expected_error: &str,
    ) {
        let result = convert_seller_record(SellerCsvRecord {
            id: 1,
            name: name.to_string(),
            base_currency: currency.to_string(),
        });
        assert!(result.unwrap_err().contains(expected_error));
    }

    #[rstest]
    #[case("300", "300.00")]
    #[case(" 19.999 ", "20.00")]
    #[case("0.125", "0.12")] // half to even
    #[case("0", "0.00")]
    fn test_convert_item_record_normalizes_price(#[case] raw: &str, #[case] expected: &str) {
        let item = convert_item_record(item_record("Test_W739", raw, "EUR")).unwrap();
        assert_eq!(item.price_amount.to_string(), expected);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price_currency, Currency::new("EUR"));
    }

    #[rstest]
    #[case::blank_code(" ", "10", "USD", "empty channel_item_code")]
    #[case::bad_price("A1", "ten", "USD", "Invalid price_amount")]
    #[case::negative_price("A1", "-1.00", "USD", "negative")]
    #[case::bad_currency("A1", "10", "US", "US")]
    fn test_convert_item_record_errors(
        #[case] code: &str,
        #[case] price: &str,
        #[case] currency: &str,
        #[case] expected_error: &str,
    ) {
        let result = convert_item_record(item_record(code, price, currency));
        let error = result.unwrap_err();
        assert!(error.contains(expected_error), "unexpected error: {}", error);
    }

    #[test]
    fn test_code_length_boundary() {
        let at_limit = "C".repeat(255);
        assert!(convert_item_record(item_record(&at_limit, "1", "USD")).is_ok());

        let over_limit = "C".repeat(256);
        let error = convert_item_record(item_record(&over_limit, "1", "USD")).unwrap_err();
        assert!(error.contains("exceeds 255"));
    }

    #[test]
    fn test_convert_rate_record() {
        let (from, to, rate) = convert_rate_record(RateCsvRecord {
            from: "usd".to_string(),
            to: "JPY".to_string(),
            rate: "151.25".to_string(),
        })
        .unwrap();
        assert_eq!(from, Currency::new("USD"));
        assert_eq!(to, Currency::new("JPY"));
        assert_eq!(rate, Decimal::new(15125, 2));
    }

    #[test]
    fn test_write_payouts_csv() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let payouts = vec![Payout {
            id: 1,
            seller_id: 1,
            original_amount: Decimal::new(30000, 2),
            converted_amount: Decimal::new(35400, 2),
            original_currency: Currency::new("EUR"),
            converted_currency: Currency::new("USD"),
            created_at: at,
            updated_at: at,
        }];

        let mut output = Vec::new();
        write_payouts_csv(&payouts, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "id,seller_id,original_amount,converted_amount,original_currency,converted_currency,created_at,updated_at\n\
             1,1,300.00,354.00,EUR,USD,2024-01-01T00:00:00Z,2024-01-01T00:00:00Z\n"
        );
    }

    #[test]
    fn test_write_item_transactions_csv() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let links = vec![
            ItemTransaction {
                item_id: 8,
                transaction_id: 1,
                quantity: 2,
                created_at: at,
            },
            ItemTransaction {
                item_id: 8,
                transaction_id: 2,
                quantity: 1,
                created_at: at,
            },
        ];

        let mut output = Vec::new();
        write_item_transactions_csv(&links, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "item_id,transaction_id,quantity,created_at\n\
             8,1,2,2024-01-01T00:00:00Z\n\
             8,2,1,2024-01-01T00:00:00Z\n"
        );
    }

    #[test]
    fn test_empty_tables_still_have_headers() {
        let mut output = Vec::new();
        write_transactions_csv(&[], &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            format!("{}\n", TRANSACTION_HEADERS.join(","))
        );

        let mut output = Vec::new();
        write_item_payouts_csv(&[], &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "item_id,payout_id,quantity,created_at\n"
        );
    }
}
