//! Currency-pair aggregation
//!
//! Groups resolved items by `(seller, item currency, seller base currency)`.
//! Each group becomes one payout candidate carrying its full item manifest
//! and its totals in both currencies.
//!
//! # Quantity
//!
//! An item with quantity `q` stands for `q` unit lines, each priced at the
//! stored `price_amount`. Units are kept consolidated per item (unit price
//! plus count) rather than materialized one by one; the totals are the same.

use crate::core::converter::CurrencyConverter;
use crate::core::resolver::ResolvedItem;
use crate::types::{Currency, ItemId, PayoutError, Seller, SellerId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

/// Identity of a payout candidate
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub seller_id: SellerId,
    pub original_currency: Currency,
    pub converted_currency: Currency,
}

/// All units of one item inside a group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupLine {
    pub item_id: ItemId,
    pub channel_item_code: String,
    pub name: String,

    /// Price of one unit in the item currency
    pub unit_amount: Decimal,

    /// Price of one unit in the seller's base currency
    pub unit_converted_amount: Decimal,

    pub quantity: u32,
}

impl GroupLine {
    /// Price of all units in the item currency
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the total does not fit in a `Decimal`.
    pub fn total_amount(&self) -> Result<Decimal, PayoutError> {
        self.units_total(self.unit_amount, "item total")
    }

    /// Price of all units in the seller's base currency
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the total does not fit in a `Decimal`.
    pub fn total_converted_amount(&self) -> Result<Decimal, PayoutError> {
        self.units_total(self.unit_converted_amount, "converted item total")
    }

    fn units_total(&self, unit: Decimal, operation: &str) -> Result<Decimal, PayoutError> {
        unit.checked_mul(Decimal::from(self.quantity)).ok_or_else(|| {
            PayoutError::arithmetic_overflow(format!(
                "{} of item {} ({} x {})",
                operation, self.item_id, unit, self.quantity
            ))
        })
    }
}

/// Add `amount` to a running group total
fn add_to_total(
    total: Decimal,
    amount: Decimal,
    key: &GroupKey,
    operation: &str,
) -> Result<Decimal, PayoutError> {
    total.checked_add(amount).ok_or_else(|| {
        PayoutError::arithmetic_overflow(format!(
            "{} of seller {} ({} -> {})",
            operation, key.seller_id, key.original_currency, key.converted_currency
        ))
    })
}

/// Items of one seller sharing a currency pair, with totals
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyGroup {
    pub key: GroupKey,
    pub seller: Seller,
    pub lines: Vec<GroupLine>,
    pub total_original_amount: Decimal,
    pub total_converted_amount: Decimal,
}

impl CurrencyGroup {
    /// Number of unit lines in the group
    pub fn unit_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// Builds currency groups from resolved items
pub struct PayoutAggregator<'a> {
    converter: &'a CurrencyConverter,
}

impl<'a> PayoutAggregator<'a> {
    pub fn new(converter: &'a CurrencyConverter) -> Self {
        PayoutAggregator { converter }
    }

    /// Group resolved items and compute per-group totals
    ///
    /// Groups are returned in the order their first item appears. Items with
    /// zero quantity carry no units and are left out; a group made only of
    /// such items is not produced at all.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCurrencyPair` if an item currency cannot be
    /// converted into its seller's base currency, and `ArithmeticOverflow`
    /// if a price, a quantity, or a group total leaves the `Decimal` range.
    pub fn aggregate(
        &self,
        resolved: &[ResolvedItem],
    ) -> Result<Vec<CurrencyGroup>, PayoutError> {
        let mut groups: Vec<CurrencyGroup> = Vec::new();
        let mut index: HashMap<GroupKey, usize> = HashMap::new();

        for ResolvedItem { seller, item } in resolved {
            if item.quantity == 0 {
                debug!(item = item.id, "item has no units to pay out");
                continue;
            }

            let unit_converted_amount = self.converter.convert(
                item.price_amount,
                &item.price_currency,
                &seller.base_currency,
            )?;

            let line = GroupLine {
                item_id: item.id,
                channel_item_code: item.channel_item_code.clone(),
                name: item.name.clone(),
                unit_amount: item.price_amount,
                unit_converted_amount,
                quantity: item.quantity,
            };

            let key = GroupKey {
                seller_id: seller.id,
                original_currency: item.price_currency.clone(),
                converted_currency: seller.base_currency.clone(),
            };

            let position = *index.entry(key.clone()).or_insert_with(|| {
                groups.push(CurrencyGroup {
                    key,
                    seller: seller.clone(),
                    lines: Vec::new(),
                    total_original_amount: Decimal::ZERO,
                    total_converted_amount: Decimal::ZERO,
                });
                groups.len() - 1
            });

            let group = &mut groups[position];
            group.total_original_amount = add_to_total(
                group.total_original_amount,
                line.total_amount()?,
                &group.key,
                "group total",
            )?;
            group.total_converted_amount = add_to_total(
                group.total_converted_amount,
                line.total_converted_amount()?,
                &group.key,
                "converted group total",
            )?;
            group.lines.push(line);
        }

        for group in &groups {
            debug!(
                seller = group.key.seller_id,
                from = %group.key.original_currency,
                to = %group.key.converted_currency,
                units = group.unit_count(),
                original = %group.total_original_amount,
                converted = %group.total_converted_amount,
                "currency group built"
            );
        }

        Ok(groups)
    }
}
