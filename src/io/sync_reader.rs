//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over typed records from a CSV file, and the
//! loaders that turn the catalog files into an `InMemoryCatalog` and a
//! `RateTable`. Format concerns are delegated to the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Malformed rows are yielded as `Err` items carrying their line number
//! - The loaders stop at the first bad row: a catalog is never built from
//!   partially valid data

use crate::core::catalog::InMemoryCatalog;
use crate::core::converter::RateTable;
use crate::io::csv_format::{
    convert_item_record, convert_rate_record, convert_seller_record, ItemCsvRecord,
    RateCsvRecord, SellerCsvRecord,
};
use crate::io::{ITEMS_FILE, SELLERS_FILE};
use crate::types::{Item, PayoutError, Seller};
use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::marker::PhantomData;
use std::path::Path;
use tracing::debug;

/// Synchronous CSV reader
///
/// Yields one deserialized record per data row, reading the file
/// incrementally.
///
/// # Examples
///
/// ```no_run
/// use payout_engine::io::csv_format::SellerCsvRecord;
/// use payout_engine::io::sync_reader::SyncReader;
/// use std::path::Path;
///
/// let reader = SyncReader::<SellerCsvRecord>::new(Path::new("sellers.csv")).unwrap();
/// let sellers: Vec<_> = reader.filter_map(Result::ok).collect();
/// println!("Read {} sellers", sellers.len());
/// ```
#[derive(Debug)]
pub struct SyncReader<T> {
    reader: csv::Reader<File>,
    line_num: u64,
    _record: PhantomData<T>,
}

impl<T: DeserializeOwned> SyncReader<T> {
    /// Open a CSV file with a header row
    ///
    /// The CSV reader is configured to:
    /// - Trim whitespace from all fields
    /// - Use an 8KB buffer for efficient I/O
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the path does not exist, or `IoError` if it
    /// cannot be opened.
    pub fn new(path: &Path) -> Result<Self, PayoutError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PayoutError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => PayoutError::IoError {
                message: format!("Failed to open file '{}': {}", path.display(), e),
            },
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
            _record: PhantomData,
        })
    }
}

impl<T: DeserializeOwned> Iterator for SyncReader<T> {
    type Item = Result<T, PayoutError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut records = self.reader.deserialize::<T>();
        let next = records.next()?;
        self.line_num += 1;
        Some(next.map_err(PayoutError::from))
    }
}

impl<T> SyncReader<T> {
    /// Line number of the row most recently yielded (the header is line 1)
    pub fn line(&self) -> u64 {
        self.line_num
    }
}

/// Read every row of a CSV file and convert it, stopping at the first error
fn read_converted<R, T, F>(path: &Path, convert: F) -> Result<Vec<T>, PayoutError>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T, String>,
{
    let mut reader = SyncReader::<R>::new(path)?;
    let mut rows = Vec::new();

    while let Some(record) = reader.next() {
        let converted = convert(record?).map_err(|message| PayoutError::ParseError {
            line: Some(reader.line()),
            message,
        })?;
        rows.push(converted);
    }

    debug!(path = %path.display(), rows = rows.len(), "csv file loaded");
    Ok(rows)
}

/// Read `sellers.csv`
pub fn read_sellers(path: &Path) -> Result<Vec<Seller>, PayoutError> {
    read_converted::<SellerCsvRecord, _, _>(path, convert_seller_record)
}

/// Read `items.csv`
pub fn read_items(path: &Path) -> Result<Vec<Item>, PayoutError> {
    read_converted::<ItemCsvRecord, _, _>(path, convert_item_record)
}

/// Read a `from,to,rate` file into a rate table
///
/// # Errors
///
/// Besides read and parse errors, returns `InvalidConfiguration` for
/// non-positive or duplicate rates.
pub fn read_rates(path: &Path) -> Result<RateTable, PayoutError> {
    let entries = read_converted::<RateCsvRecord, _, _>(path, convert_rate_record)?;
    RateTable::from_entries(entries)
}

/// Load `sellers.csv` and `items.csv` from a catalog directory
///
/// # Errors
///
/// Returns read and parse errors of either file, or `InvalidCatalog` if the
/// records violate an integrity rule.
pub fn load_catalog(dir: &Path) -> Result<InMemoryCatalog, PayoutError> {
    let sellers = read_sellers(&dir.join(SELLERS_FILE))?;
    let items = read_items(&dir.join(ITEMS_FILE))?;
    InMemoryCatalog::from_records(sellers, items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::Catalog;
    use crate::types::Currency;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn catalog_dir(sellers: &str, items: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SELLERS_FILE), sellers).unwrap();
        std::fs::write(dir.path().join(ITEMS_FILE), items).unwrap();
        dir
    }

    #[test]
    fn test_reader_yields_records_in_order() {
        let file = create_temp_csv("id,name,base_currency\n1, Price-Kunze ,USD\n2,Other,EUR\n");
        let records: Vec<SellerCsvRecord> = SyncReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Price-Kunze");
        assert_eq!(records[1].base_currency, "EUR");
    }

    #[test]
    fn test_reader_missing_file() {
        let result = SyncReader::<SellerCsvRecord>::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(PayoutError::FileNotFound { .. })));
    }

    #[test]
    fn test_read_sellers_quoted_names() {
        let file = create_temp_csv(
            "id,name,base_currency\n2,\"Dibbert, Boyer and Quigley\",EUR\n",
        );
        let sellers = read_sellers(file.path()).unwrap();
        assert_eq!(sellers[0].name, "Dibbert, Boyer and Quigley");
        assert_eq!(sellers[0].base_currency, Currency::new("EUR"));
    }

    #[rstest]
    #[case::bad_currency(
        "id,name,base_currency\n1,A,USD\n2,B,EURO\n",
        "Parse error at line 3: Seller 2: Invalid currency code 'EURO'"
    )]
    #[case::bad_id("id,name,base_currency\nx,A,USD\n", "Parse error at line 2")]
    fn test_read_sellers_errors(#[case] content: &str, #[case] expected: &str) {
        let file = create_temp_csv(content);
        let error = read_sellers(file.path()).unwrap_err();
        assert!(
            error.to_string().starts_with(expected),
            "unexpected error: {}",
            error
        );
    }

    #[test]
    fn test_read_rates() {
        let file = create_temp_csv("from,to,rate\nUSD,JPY,150\nJPY,USD,0.0067\n");
        let table = read_rates(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rate(&Currency::new("JPY"), &Currency::new("USD")),
            Some(rust_decimal::Decimal::new(67, 4))
        );
    }

    #[test]
    fn test_read_rates_rejects_non_positive() {
        let file = create_temp_csv("from,to,rate\nUSD,JPY,0\n");
        assert!(matches!(
            read_rates(file.path()),
            Err(PayoutError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_load_catalog() {
        let dir = catalog_dir(
            "id,name,base_currency\n1,Price-Kunze,USD\n",
            "id,seller_id,name,channel_item_code,price_amount,price_currency,quantity\n\
             1,1,Widget,Test_W739,300,EUR,1\n",
        );

        let catalog = load_catalog(dir.path()).unwrap();
        let item = catalog.item_for_seller(1, "Test_W739").unwrap();
        assert_eq!(item.price_amount.to_string(), "300.00");
    }

    #[test]
    fn test_load_catalog_rejects_orphan_item() {
        let dir = catalog_dir(
            "id,name,base_currency\n1,Price-Kunze,USD\n",
            "id,seller_id,name,channel_item_code,price_amount,price_currency,quantity\n\
             1,9,Widget,Test_W739,300,EUR,1\n",
        );
        assert!(matches!(
            load_catalog(dir.path()),
            Err(PayoutError::InvalidCatalog { .. })
        ));
    }

    #[test]
    fn test_load_catalog_missing_items_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SELLERS_FILE), "id,name,base_currency\n").unwrap();
        assert!(matches!(
            load_catalog(dir.path()),
            Err(PayoutError::FileNotFound { .. })
        ));
    }
}
