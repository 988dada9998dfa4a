//! Payout Engine CLI
//!
//! Command-line interface for turning a payout request into committed,
//! limit-capped seller payouts.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --catalog catalog/ request.json > response.json
//! cargo run -- --catalog catalog/ --strategy sync request.json
//! cargo run -- --catalog catalog/ --rates rates.csv --payout-limit 500 request.json
//! cargo run -- --catalog catalog/ --ledger-dir ledger/ --worker-threads 4 request.json
//! ```
//!
//! The response document is written to stdout. Logs go to stderr and are
//! controlled with `RUST_LOG`.
//!
//! # Exit Codes
//!
//! - 0: Payouts created
//! - 1: Fatal error (missing or malformed input, invalid configuration, etc.)
//! - 2: Request rejected (validation or processing failure, see the response)

use payout_engine::cli;
use payout_engine::strategy;
use std::process;
use tracing::error;

fn main() {
    let args = cli::parse_args();
    cli::init_logging();

    let strategy = {
        let config = if matches!(args.strategy, cli::StrategyType::Async) {
            Some(args.to_async_config())
        } else {
            None
        };
        strategy::create_strategy(args.strategy.clone(), config)
    };

    let job = args.to_job();
    let mut output = std::io::stdout();
    match strategy.process(&job, &mut output) {
        Ok(status) => process::exit(status.exit_code()),
        Err(e) => {
            error!(error = %e, "fatal error");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
