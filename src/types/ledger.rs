//! Persisted payout records
//!
//! A `Payout` is created per (seller, original currency, converted currency)
//! group. Each payout owns one or more `Transaction` batches, and the link
//! records tie items to the payout and to the batches they were allocated to.
//! All rows of one request are written together or not at all.

use super::catalog::{ItemId, SellerId};
use super::currency::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Payout identifier
pub type PayoutId = u64;

/// Transaction (batch) identifier
pub type TransactionId = u64;

/// Consolidated settlement record for one seller and currency pair
///
/// Invariant: `converted_amount` equals the sum of the
/// `batch_amount_in_base_currency` of its transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payout {
    pub id: PayoutId,
    pub seller_id: SellerId,
    pub original_amount: Decimal,
    pub converted_amount: Decimal,
    pub original_currency: Currency,
    pub converted_currency: Currency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payout row before the store assigns an id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayout {
    pub seller_id: SellerId,
    pub original_amount: Decimal,
    pub converted_amount: Decimal,
    pub original_currency: Currency,
    pub converted_currency: Currency,
}

/// One bounded batch of a payout
///
/// `batch_amount_in_base_currency` never exceeds the payout limit that was
/// in force when the batch was split.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub payout_id: PayoutId,
    pub batch_amount_in_original_currency: Decimal,
    pub batch_amount_in_base_currency: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transaction row before the store assigns an id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub payout_id: PayoutId,
    pub batch_amount_in_original_currency: Decimal,
    pub batch_amount_in_base_currency: Decimal,
}

/// Item to payout link, carrying how many units of the item the payout covers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPayout {
    pub item_id: ItemId,
    pub payout_id: PayoutId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}

/// Item to transaction link, carrying how many units went into the batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTransaction {
    pub item_id: ItemId,
    pub transaction_id: TransactionId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
}
