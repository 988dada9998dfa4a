//! Processing strategy module for payout requests
//!
//! This module defines the Strategy pattern for the complete request pipeline:
//! loading the catalog and rate table, reading and validating the request,
//! running the payout engine, and writing the response. Loading is the part
//! that differs between implementations (synchronous vs. concurrent async),
//! so the engine run and the response mapping are shared by both.

use crate::cli::StrategyType;
use crate::core::catalog::InMemoryCatalog;
use crate::core::converter::{CurrencyConverter, RateTable};
use crate::core::engine::PayoutEngine;
use crate::core::ledger::InMemoryLedger;
use crate::core::limit::{
    CachedPayoutLimit, FixedPayoutLimit, DEFAULT_LIMIT_CACHE_TTL, DEFAULT_PAYOUT_LIMIT,
};
use crate::core::traits::PayoutLimitProvider;
use crate::io::json_format::{write_failure, write_success, write_validation_failure};
use crate::io::ledger_export::export_ledger;
use crate::io::request::{parse_request, validate_request};
use crate::io::ResponseStatus;
use crate::types::PayoutError;
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub mod r#async;
pub mod sync;

pub use self::r#async::{AsyncConfig, AsyncProcessingStrategy};
pub use sync::SyncProcessingStrategy;

/// Everything one run needs to know about its inputs
#[derive(Debug, Clone)]
pub struct PayoutJob {
    /// JSON request body file
    pub request_path: PathBuf,
    /// Directory holding `sellers.csv` and `items.csv`
    pub catalog_dir: PathBuf,
    /// Optional `from,to,rate` file replacing the built-in table
    pub rates_path: Option<PathBuf>,
    /// Fixed payout limit, used when no limit file is given
    pub payout_limit: Decimal,
    /// Optional file re-read for the payout limit through the cache
    pub limit_file: Option<PathBuf>,
    /// Cache lifetime of a limit read from `limit_file`
    pub limit_ttl: Duration,
    /// Optional directory receiving the committed ledger as CSV
    pub ledger_dir: Option<PathBuf>,
}

impl PayoutJob {
    /// A job with the default limit and no optional inputs
    pub fn new(request_path: impl Into<PathBuf>, catalog_dir: impl Into<PathBuf>) -> Self {
        PayoutJob {
            request_path: request_path.into(),
            catalog_dir: catalog_dir.into(),
            rates_path: None,
            payout_limit: DEFAULT_PAYOUT_LIMIT,
            limit_file: None,
            limit_ttl: DEFAULT_LIMIT_CACHE_TTL,
            ledger_dir: None,
        }
    }

    /// Build the limit provider for this job
    ///
    /// Every call returns a fresh provider. A `CachedPayoutLimit` only serves
    /// cached reads to the caller holding it, so in a one-shot CLI run the
    /// limit file is read once per job and the TTL never comes into play.
    /// Callers processing many requests should build the provider once and
    /// share it across their engines.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the fixed limit is not positive.
    pub fn limit_provider(&self) -> Result<Arc<dyn PayoutLimitProvider>, PayoutError> {
        match &self.limit_file {
            Some(path) => Ok(Arc::new(CachedPayoutLimit::from_file(path, self.limit_ttl))),
            None => Ok(Arc::new(FixedPayoutLimit::new(self.payout_limit)?)),
        }
    }
}

/// Processing strategy trait for complete payout pipelines
///
/// Each strategy loads the job's inputs its own way and hands them to
/// [`run_job`], which produces the response.
pub trait ProcessingStrategy: Send + Sync {
    /// Process one payout request and write the JSON response to output
    ///
    /// # Arguments
    ///
    /// * `job` - Input locations and limit configuration
    /// * `output` - Writer receiving the response document
    ///
    /// # Returns
    ///
    /// * `Ok(ResponseStatus)` once a response (success, validation failure,
    ///   or domain failure) has been written
    /// * `Err(PayoutError)` on a fatal error: missing or malformed input
    ///   files, invalid configuration, or an unwritable output
    fn process(&self, job: &PayoutJob, output: &mut dyn Write)
        -> Result<ResponseStatus, PayoutError>;
}

/// Run a request against loaded inputs and write its response
///
/// # Arguments
///
/// * `job` - Limit configuration and optional ledger export directory
/// * `catalog` - Loaded sellers and items
/// * `rates` - Loaded rate table
/// * `body` - Raw JSON request body
/// * `output` - Writer receiving the response document
///
/// # Errors
///
/// Returns an error if the body is not JSON, the limit configuration is
/// invalid, or the response or ledger export cannot be written. Validation
/// and domain failures are written as responses instead.
pub fn run_job(
    job: &PayoutJob,
    catalog: InMemoryCatalog,
    rates: RateTable,
    body: &str,
    output: &mut dyn Write,
) -> Result<ResponseStatus, PayoutError> {
    let payload = parse_request(body)?;

    let sold_items = match validate_request(&payload, &catalog) {
        Ok(sold_items) => sold_items,
        Err(errors) => {
            warn!(fields = errors.len(), "request failed validation");
            return write_validation_failure(&errors, output);
        }
    };

    let engine = PayoutEngine::new(
        catalog,
        CurrencyConverter::new(rates),
        job.limit_provider()?,
        InMemoryLedger::new(),
    );

    match engine.process(&sold_items) {
        Ok(report) => {
            let status = write_success(&report, output)?;
            if let Some(dir) = &job.ledger_dir {
                export_ledger(engine.store(), dir)?;
            }
            info!(sellers = report.len(), "request completed");
            Ok(status)
        }
        Err(error) if error.is_domain() => {
            warn!(%error, "request failed");
            write_failure(&error, output)
        }
        Err(error) => Err(error),
    }
}

/// Create a processing strategy based on the specified strategy type
///
/// # Arguments
///
/// * `strategy_type` - The type of processing strategy to create (Sync or Async)
/// * `config` - Optional runtime configuration for the async strategy (ignored for sync)
///
/// # Returns
///
/// A boxed trait object implementing the ProcessingStrategy trait
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<AsyncConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sync => Box::new(SyncProcessingStrategy),
        StrategyType::Async => Box::new(AsyncProcessingStrategy::new(config.unwrap_or_default())),
    }
}
