//! Synchronous processing strategy
//!
//! Loads the catalog, the rate table, and the request body one after another
//! on the calling thread using the `csv` crate and `std::fs`, then hands them
//! to the shared request pipeline.

use crate::core::converter::RateTable;
use crate::io::sync_reader::{load_catalog, read_rates};
use crate::io::ResponseStatus;
use crate::strategy::{run_job, PayoutJob, ProcessingStrategy};
use crate::types::PayoutError;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Synchronous processing strategy
///
/// # Examples
///
/// ```no_run
/// use payout_engine::strategy::{PayoutJob, ProcessingStrategy, SyncProcessingStrategy};
/// use std::io;
///
/// let job = PayoutJob::new("request.json", "catalog");
/// let mut output = io::stdout();
///
/// SyncProcessingStrategy
///     .process(&job, &mut output)
///     .expect("Processing failed");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SyncProcessingStrategy;

fn read_body(path: &Path) -> Result<String, PayoutError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PayoutError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => PayoutError::IoError {
            message: format!("Failed to read request '{}': {}", path.display(), e),
        },
    })
}

impl ProcessingStrategy for SyncProcessingStrategy {
    fn process(
        &self,
        job: &PayoutJob,
        output: &mut dyn Write,
    ) -> Result<ResponseStatus, PayoutError> {
        let catalog = load_catalog(&job.catalog_dir)?;
        let rates = match &job.rates_path {
            Some(path) => read_rates(path)?,
            None => RateTable::standard(),
        };
        let body = read_body(&job.request_path)?;

        debug!(
            sellers = catalog.seller_count(),
            items = catalog.item_count(),
            rates = rates.len(),
            "inputs loaded"
        );
        run_job(job, catalog, rates, &body, output)
    }
}
