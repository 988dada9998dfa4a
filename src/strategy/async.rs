//! Asynchronous processing strategy
//!
//! Reads every input file concurrently on a tokio multi-threaded runtime and
//! then runs the shared request pipeline on the loaded data.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── AsyncConfig (worker_threads)
//!     ├── tokio::try_join!
//!     │     ├── sellers.csv ─┐
//!     │     ├── items.csv  ──┴─ InMemoryCatalog
//!     │     ├── rates.csv (optional) ─ RateTable
//!     │     └── request body
//!     └── run_job (engine + response)
//! ```
//!
//! The first loading error cancels the remaining reads and is returned as a
//! fatal error, exactly like the synchronous strategy.

use crate::core::converter::RateTable;
use crate::io::async_reader::{load_catalog, read_rates};
use crate::io::ResponseStatus;
use crate::strategy::{run_job, PayoutJob, ProcessingStrategy};
use crate::types::PayoutError;
use std::io::Write;
use std::path::Path;
use tracing::{debug, warn};

/// Runtime configuration for the async strategy
#[derive(Clone, Debug)]
pub struct AsyncConfig {
    /// Number of tokio worker threads
    pub worker_threads: usize,
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get(),
        }
    }
}

impl AsyncConfig {
    /// Create a new AsyncConfig, falling back to the default for zero threads
    pub fn new(worker_threads: usize) -> Self {
        if worker_threads == 0 {
            let default = Self::default();
            warn!(
                requested = worker_threads,
                using = default.worker_threads,
                "invalid worker thread count, using default"
            );
            return default;
        }

        Self { worker_threads }
    }
}

/// Asynchronous processing strategy
///
/// Builds a dedicated multi-threaded runtime per call, so it can be used
/// from plain synchronous code such as `main`.
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: AsyncConfig,
}

impl AsyncProcessingStrategy {
    /// Create a new AsyncProcessingStrategy with the specified configuration
    pub fn new(config: AsyncConfig) -> Self {
        Self { config }
    }
}

async fn read_body(path: &Path) -> Result<String, PayoutError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PayoutError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => PayoutError::IoError {
                message: format!("Failed to read request '{}': {}", path.display(), e),
            },
        })
}

async fn load_rates(path: Option<&Path>) -> Result<RateTable, PayoutError> {
    match path {
        Some(path) => read_rates(path).await,
        None => Ok(RateTable::standard()),
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    fn process(
        &self,
        job: &PayoutJob,
        output: &mut dyn Write,
    ) -> Result<ResponseStatus, PayoutError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .build()
            .map_err(|e| PayoutError::IoError {
                message: format!("Failed to create tokio runtime: {}", e),
            })?;

        let (catalog, rates, body) = runtime.block_on(async {
            tokio::try_join!(
                load_catalog(&job.catalog_dir),
                load_rates(job.rates_path.as_deref()),
                read_body(&job.request_path),
            )
        })?;

        debug!(
            sellers = catalog.seller_count(),
            items = catalog.item_count(),
            rates = rates.len(),
            workers = self.config.worker_threads,
            "inputs loaded"
        );
        run_job(job, catalog, rates, &body, output)
    }
}
