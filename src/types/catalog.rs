//! Seller and item records
//!
//! These are the read-only inputs of a payout run. Sellers and items are
//! looked up, never mutated, while a request is processed.

use super::currency::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Seller identifier
pub type SellerId = u64;

/// Item identifier
pub type ItemId = u64;

/// A seller that receives payouts
#[derive(Debug, Clone, PartialEq)]
pub struct Seller {
    /// Unique seller id, referenced by `SoldItemRef::seller_reference`
    pub id: SellerId,

    /// Display name, used as the top-level key of the payout report
    pub name: String,

    /// The currency the seller is ultimately paid out in
    pub base_currency: Currency,
}

/// A sellable item owned by exactly one seller
///
/// `price_amount` is the unit price of one line of the item, stored with
/// two decimal places. `quantity` is the number of such lines sold.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub seller_id: SellerId,
    pub name: String,

    /// Seller-scoped catalog code; unique per seller
    pub channel_item_code: String,

    pub price_amount: Decimal,
    pub price_currency: Currency,
    pub quantity: u32,
}

/// One entry of an inbound payout request
///
/// Must resolve to exactly one `Item` owned by the referenced seller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoldItemRef {
    pub seller_reference: SellerId,
    pub channel_item_code: String,
}

impl SoldItemRef {
    pub fn new(seller_reference: SellerId, channel_item_code: &str) -> Self {
        SoldItemRef {
            seller_reference,
            channel_item_code: channel_item_code.to_string(),
        }
    }
}
