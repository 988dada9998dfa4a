use crate::core::limit::DEFAULT_PAYOUT_LIMIT;
use crate::strategy::{AsyncConfig, PayoutJob};
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Turn sold items into currency-converted, limit-capped seller payouts
#[derive(Parser, Debug)]
#[command(name = "payout-engine")]
#[command(about = "Turn sold items into currency-converted, limit-capped seller payouts", long_about = None)]
pub struct CliArgs {
    /// JSON request file containing the sold item references
    #[arg(value_name = "REQUEST", help = "Path to the JSON payout request")]
    pub request_file: PathBuf,

    /// Catalog directory holding sellers.csv and items.csv
    #[arg(long = "catalog", value_name = "DIR", help = "Directory containing sellers.csv and items.csv")]
    pub catalog_dir: PathBuf,

    /// Conversion rates replacing the built-in table
    #[arg(long = "rates", value_name = "FILE", help = "CSV file of from,to,rate conversion rates")]
    pub rates_file: Option<PathBuf>,

    /// Upper bound of one payout batch in the seller's base currency
    #[arg(
        long = "payout-limit",
        value_name = "AMOUNT",
        env = "PAYOUT_LIMIT",
        default_value_t = DEFAULT_PAYOUT_LIMIT,
        value_parser = parse_limit,
        help = "Maximum amount of one payout batch (default: 1000)"
    )]
    pub payout_limit: Decimal,

    /// File holding the payout limit, re-read when the cache expires
    #[arg(
        long = "payout-limit-file",
        value_name = "FILE",
        help = "File holding the payout limit; overrides --payout-limit"
    )]
    pub payout_limit_file: Option<PathBuf>,

    /// Lifetime in seconds of a limit read from --payout-limit-file
    #[arg(
        long = "limit-cache-ttl",
        value_name = "SECS",
        default_value_t = 30,
        help = "Seconds a limit read from --payout-limit-file stays cached"
    )]
    pub limit_cache_ttl: u64,

    /// Directory receiving the committed ledger as CSV
    #[arg(long = "ledger-dir", value_name = "DIR", help = "Export committed ledger rows as CSV into this directory")]
    pub ledger_dir: Option<PathBuf>,

    /// Processing strategy used to load the inputs
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for concurrent loading"
    )]
    pub strategy: StrategyType,

    /// Number of runtime worker threads (async mode only)
    #[arg(
        long = "worker-threads",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub worker_threads: Option<usize>,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

fn parse_limit(value: &str) -> Result<Decimal, String> {
    let limit = Decimal::from_str(value.trim())
        .map_err(|e| format!("'{}' is not a decimal amount: {}", value, e))?;
    if limit <= Decimal::ZERO {
        return Err(format!("payout limit must be positive, got {}", limit));
    }
    Ok(limit)
}

impl CliArgs {
    /// Build the job description from CLI arguments
    pub fn to_job(&self) -> PayoutJob {
        PayoutJob {
            request_path: self.request_file.clone(),
            catalog_dir: self.catalog_dir.clone(),
            rates_path: self.rates_file.clone(),
            payout_limit: self.payout_limit,
            limit_file: self.payout_limit_file.clone(),
            limit_ttl: Duration::from_secs(self.limit_cache_ttl),
            ledger_dir: self.ledger_dir.clone(),
        }
    }

    /// Create an AsyncConfig from CLI arguments
    ///
    /// # Returns
    ///
    /// An `AsyncConfig` with the requested worker count, or the default
    /// (one worker per CPU core) when none was given.
    pub fn to_async_config(&self) -> AsyncConfig {
        match self.worker_threads {
            Some(threads) => AsyncConfig::new(threads),
            None => AsyncConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const BASE: [&str; 4] = ["program", "--catalog", "catalog", "request.json"];

    fn parse(extra: &[&str]) -> Result<CliArgs, clap::Error> {
        let mut args: Vec<&str> = BASE.to_vec();
        args.extend_from_slice(extra);
        CliArgs::try_parse_from(args)
    }

    // Strategy parsing tests
    #[rstest]
    #[case::default_strategy(&[], StrategyType::Async)]
    #[case::explicit_sync(&["--strategy", "sync"], StrategyType::Sync)]
    #[case::explicit_async(&["--strategy", "async"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] extra: &[&str], #[case] expected: StrategyType) {
        assert_eq!(parse(extra).unwrap().strategy, expected);
    }

    #[test]
    fn test_job_defaults() {
        let job = parse(&[]).unwrap().to_job();

        assert_eq!(job.request_path, PathBuf::from("request.json"));
        assert_eq!(job.catalog_dir, PathBuf::from("catalog"));
        assert_eq!(job.payout_limit, Decimal::ONE_THOUSAND);
        assert_eq!(job.limit_ttl, Duration::from_secs(30));
        assert!(job.rates_path.is_none());
        assert!(job.limit_file.is_none());
        assert!(job.ledger_dir.is_none());
    }

    #[test]
    fn test_job_from_all_options() {
        let job = parse(&[
            "--rates",
            "rates.csv",
            "--payout-limit",
            "2500.50",
            "--payout-limit-file",
            "limit.txt",
            "--limit-cache-ttl",
            "5",
            "--ledger-dir",
            "out",
        ])
        .unwrap()
        .to_job();

        assert_eq!(job.rates_path, Some(PathBuf::from("rates.csv")));
        assert_eq!(job.payout_limit, Decimal::new(250050, 2));
        assert_eq!(job.limit_file, Some(PathBuf::from("limit.txt")));
        assert_eq!(job.limit_ttl, Duration::from_secs(5));
        assert_eq!(job.ledger_dir, Some(PathBuf::from("out")));
    }

    // AsyncConfig conversion tests
    #[rstest]
    #[case::default_workers(&[], num_cpus::get())]
    #[case::custom_workers(&["--worker-threads", "8"], 8)]
    #[case::zero_workers_fall_back(&["--worker-threads", "0"], num_cpus::get())]
    fn test_async_config_conversion(#[case] extra: &[&str], #[case] expected: usize) {
        let config = parse(extra).unwrap().to_async_config();
        assert_eq!(config.worker_threads, expected);
    }

    // Error handling tests
    #[rstest]
    #[case::missing_request(&["program", "--catalog", "catalog"])]
    #[case::missing_catalog(&["program", "request.json"])]
    #[case::invalid_strategy(&["program", "--catalog", "c", "--strategy", "invalid", "r.json"])]
    #[case::zero_limit(&["program", "--catalog", "c", "--payout-limit", "0", "r.json"])]
    #[case::negative_limit(&["program", "--catalog", "c", "--payout-limit=-10", "r.json"])]
    #[case::word_limit(&["program", "--catalog", "c", "--payout-limit", "lots", "r.json"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_limit_accepts_decimals() {
        assert_eq!(parse_limit(" 750.25 "), Ok(Decimal::new(75025, 2)));
    }
}
