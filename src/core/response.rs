//! Payout report assembly
//!
//! Reshapes persisted payouts into the nested report returned to the caller:
//! `seller name -> "<Country> Payouts" -> [one entry per batch]`.

use crate::core::converter::round_amount;
use crate::core::persistence::PersistedPayout;
use crate::types::{BatchReportEntry, Currency, PayoutReport, ReportItem};

/// Settlement region shown for a payout currency
///
/// Currencies without a known region are labelled with their own code.
pub fn country_label(currency: &Currency) -> String {
    match currency.as_str() {
        "USD" => "U.S.A".to_string(),
        "GBP" => "UK".to_string(),
        "EUR" => "Europe".to_string(),
        "AED" => "Middle East".to_string(),
        other => other.to_string(),
    }
}

/// Builds a `PayoutReport` from persisted payouts
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseBuilder;

impl ResponseBuilder {
    pub fn new() -> Self {
        ResponseBuilder
    }

    /// Build the report
    ///
    /// Payouts are visited in the order given. Entries of payouts that share
    /// a seller and country label are appended under the same key, batch by
    /// batch. Every amount is fixed to two decimal places.
    pub fn build(&self, persisted: &[PersistedPayout]) -> PayoutReport {
        let mut report = PayoutReport::new();

        for payout in persisted {
            let key = &payout.group.key;
            let label = format!("{} Payouts", country_label(&key.converted_currency));

            let entries = report
                .entry(payout.group.seller.name.clone())
                .or_default()
                .entry(label)
                .or_default();

            for stored in &payout.batches {
                entries.push(BatchReportEntry {
                    payout_id: payout.payout.id,
                    transaction_id: stored.transaction.id,
                    seller_reference: payout.group.seller.id,
                    original_amount: round_amount(stored.batch.amount_in_original_currency),
                    original_currency: key.original_currency.clone(),
                    converted_amount: round_amount(stored.batch.amount_in_base_currency),
                    converted_currency: key.converted_currency.clone(),
                    items: stored
                        .batch
                        .lines
                        .iter()
                        .map(|line| ReportItem {
                            item_code: line.channel_item_code.clone(),
                            item_name: line.name.clone(),
                            item_currency: key.original_currency.clone(),
                            unit_amount: round_amount(line.unit_amount),
                            total_amount: round_amount(line.total_amount),
                            quantity: line.quantity,
                        })
                        .collect(),
                });
            }
        }

        report
    }
}
