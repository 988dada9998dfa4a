//! Payout limit providers
//!
//! The payout limit is the maximum converted amount a single batch may carry.
//! It is read once at the start of each request, so a change to the
//! underlying source only affects requests that start after it.

use crate::core::traits::PayoutLimitProvider;
use crate::types::PayoutError;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Limit used when nothing else is configured
pub const DEFAULT_PAYOUT_LIMIT: Decimal = Decimal::ONE_THOUSAND;

/// How long a `CachedPayoutLimit` trusts its last read by default
pub const DEFAULT_LIMIT_CACHE_TTL: Duration = Duration::from_secs(30);

fn validate_limit(limit: Decimal) -> Result<Decimal, PayoutError> {
    if limit <= Decimal::ZERO {
        return Err(PayoutError::invalid_configuration(format!(
            "payout limit must be positive, got {}",
            limit
        )));
    }
    Ok(limit)
}

/// A limit that never changes
#[derive(Debug, Clone, Copy)]
pub struct FixedPayoutLimit {
    limit: Decimal,
}

impl FixedPayoutLimit {
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the limit is not positive.
    pub fn new(limit: Decimal) -> Result<Self, PayoutError> {
        Ok(FixedPayoutLimit {
            limit: validate_limit(limit)?,
        })
    }
}

impl Default for FixedPayoutLimit {
    fn default() -> Self {
        FixedPayoutLimit {
            limit: DEFAULT_PAYOUT_LIMIT,
        }
    }
}

impl PayoutLimitProvider for FixedPayoutLimit {
    fn current_payout_limit(&self) -> Result<Decimal, PayoutError> {
        Ok(self.limit)
    }
}

type LimitSource = Box<dyn Fn() -> Result<Decimal, PayoutError> + Send + Sync>;

/// A limit read from an external source and cached for a fixed time
///
/// The source is consulted at most once per TTL window. A failed or
/// non-positive read is returned as an error and is not cached, so the next
/// request retries the source.
pub struct CachedPayoutLimit {
    source: LimitSource,
    ttl: Duration,
    cached: Mutex<Option<(Decimal, Instant)>>,
}

impl CachedPayoutLimit {
    /// Wrap a fallible limit source
    ///
    /// # Arguments
    ///
    /// * `source` - Called to fetch a fresh limit whenever the cache is stale
    /// * `ttl` - How long a fetched limit stays valid
    pub fn new<F>(source: F, ttl: Duration) -> Self
    where
        F: Fn() -> Result<Decimal, PayoutError> + Send + Sync + 'static,
    {
        CachedPayoutLimit {
            source: Box::new(source),
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// Read the limit from a text file holding a single decimal number
    ///
    /// The file is re-read whenever the cached value expires, so the limit
    /// can be changed without restarting a long-lived process.
    pub fn from_file(path: impl AsRef<Path>, ttl: Duration) -> Self {
        let path = path.as_ref().to_path_buf();
        Self::new(move || read_limit_file(&path), ttl)
    }
}

fn read_limit_file(path: &Path) -> Result<Decimal, PayoutError> {
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PayoutError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => PayoutError::from(e),
    })?;

    let value = contents.trim();
    Decimal::from_str(value).map_err(|e| {
        PayoutError::invalid_configuration(format!(
            "payout limit file {} holds '{}': {}",
            path.display(),
            value,
            e
        ))
    })
}

impl PayoutLimitProvider for CachedPayoutLimit {
    fn current_payout_limit(&self) -> Result<Decimal, PayoutError> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some((limit, fetched_at)) = *cached {
            if fetched_at.elapsed() < self.ttl {
                return Ok(limit);
            }
            debug!("cached payout limit expired");
        }

        let limit = validate_limit((self.source)()?)?;
        info!(limit = %limit, "payout limit refreshed");
        *cached = Some((limit, Instant::now()));
        Ok(limit)
    }
}
