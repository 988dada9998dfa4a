//! Payout report returned to the caller
//!
//! The report is nested as `seller name -> "<Country> Payouts" -> [entries]`.
//! Each entry describes one committed batch. Amounts are serialized as
//! strings with two decimal places.

use super::catalog::SellerId;
use super::currency::Currency;
use super::ledger::{PayoutId, TransactionId};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// Consolidated line of one item inside a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportItem {
    pub item_code: String,
    pub item_name: String,
    pub item_currency: Currency,
    pub unit_amount: Decimal,
    pub total_amount: Decimal,
    pub quantity: u32,
}

/// One batch of a payout as reported to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReportEntry {
    pub payout_id: PayoutId,
    pub transaction_id: TransactionId,
    pub seller_reference: SellerId,
    pub original_amount: Decimal,
    pub original_currency: Currency,
    pub converted_amount: Decimal,
    pub converted_currency: Currency,
    pub items: Vec<ReportItem>,
}

/// Batch entries of one seller, keyed by settlement country label
pub type SellerReport = BTreeMap<String, Vec<BatchReportEntry>>;

/// Full report, keyed by seller display name
pub type PayoutReport = BTreeMap<String, SellerReport>;
