//! Asynchronous CSV reader
//!
//! Provides the async counterpart of the sync_reader module: a typed record
//! reader over any `AsyncRead` and loaders that read the catalog files
//! concurrently.
//!
//! # Architecture
//!
//! ```text
//! tokio::fs::File -> compat -> AsyncReader -> Vec<Record>
//!                                  |
//!                           csv_format module
//!                      (record types, conversion)
//! ```

use crate::core::catalog::InMemoryCatalog;
use crate::core::converter::RateTable;
use crate::io::csv_format::{
    convert_item_record, convert_rate_record, convert_seller_record, ItemCsvRecord,
    RateCsvRecord, SellerCsvRecord,
};
use crate::io::{ITEMS_FILE, SELLERS_FILE};
use crate::types::{Item, PayoutError, Seller};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::debug;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    ///
    /// The first row is treated as a header and all fields are trimmed.
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read and convert every remaining record
    ///
    /// # Arguments
    ///
    /// * `convert` - Validates one deserialized record
    ///
    /// # Errors
    ///
    /// Returns the first deserialization or conversion error. Conversion
    /// errors carry the line number of the offending row.
    pub async fn read_all<D, T, F>(&mut self, convert: F) -> Result<Vec<T>, PayoutError>
    where
        D: DeserializeOwned + 'static,
        F: Fn(D) -> Result<T, String>,
    {
        let mut rows = Vec::new();
        let mut line: u64 = 1;
        let mut records = self.csv_reader.deserialize::<D>();

        while let Some(record) = records.next().await {
            line += 1;
            let converted = convert(record?).map_err(|message| PayoutError::ParseError {
                line: Some(line),
                message,
            })?;
            rows.push(converted);
        }

        Ok(rows)
    }
}

async fn open(path: &Path) -> Result<AsyncReader<Compat<tokio::fs::File>>, PayoutError> {
    let file = tokio::fs::File::open(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PayoutError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => PayoutError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        },
    })?;

    // Wrap tokio file in a compatibility layer for csv-async
    Ok(AsyncReader::new(file.compat()))
}

/// Read `sellers.csv`
pub async fn read_sellers(path: &Path) -> Result<Vec<Seller>, PayoutError> {
    let sellers = open(path)
        .await?
        .read_all::<SellerCsvRecord, _, _>(convert_seller_record)
        .await?;
    debug!(path = %path.display(), rows = sellers.len(), "sellers loaded");
    Ok(sellers)
}

/// Read `items.csv`
pub async fn read_items(path: &Path) -> Result<Vec<Item>, PayoutError> {
    let items = open(path)
        .await?
        .read_all::<ItemCsvRecord, _, _>(convert_item_record)
        .await?;
    debug!(path = %path.display(), rows = items.len(), "items loaded");
    Ok(items)
}

/// Read a `from,to,rate` file into a rate table
pub async fn read_rates(path: &Path) -> Result<RateTable, PayoutError> {
    let entries = open(path)
        .await?
        .read_all::<RateCsvRecord, _, _>(convert_rate_record)
        .await?;
    RateTable::from_entries(entries)
}

/// Load `sellers.csv` and `items.csv` concurrently from a catalog directory
pub async fn load_catalog(dir: &Path) -> Result<InMemoryCatalog, PayoutError> {
    let sellers_path = dir.join(SELLERS_FILE);
    let items_path = dir.join(ITEMS_FILE);

    let (sellers, items) = tokio::try_join!(read_sellers(&sellers_path), read_items(&items_path))?;
    InMemoryCatalog::from_records(sellers, items)
}
