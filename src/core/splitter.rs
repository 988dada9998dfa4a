//! Batch splitting under a payout limit
//!
//! A currency group is cut into an ordered sequence of batches whose
//! converted totals never exceed the payout limit.
//!
//! # Policy
//!
//! Greedy first-fit in encounter order. Each pass opens an empty batch and
//! scans the still-unallocated units in their original order, taking every
//! unit that fits under the limit and leaving the rest for the next pass.
//! Items are never sorted by size, so the same input always yields the same
//! batches, at the cost of not guaranteeing the minimal batch count.
//!
//! A unit whose converted price alone reaches the limit can never be placed.
//! It is detected the first time it is scanned against an empty batch, and
//! the whole group fails with `ItemExceedsPayoutLimit`. This is also what
//! guarantees progress: every pass places at least one unit.

use crate::core::aggregator::{CurrencyGroup, GroupLine};
use crate::types::{ItemId, PayoutError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

/// Consolidated units of one item inside a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLine {
    pub item_id: ItemId,
    pub channel_item_code: String,
    pub name: String,
    pub unit_amount: Decimal,
    pub unit_converted_amount: Decimal,
    pub quantity: u32,

    /// `unit_amount * quantity`, in the item currency
    pub total_amount: Decimal,

    /// `unit_converted_amount * quantity`, in the seller's base currency
    pub total_converted_amount: Decimal,
}

/// One bounded slice of a currency group
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    pub amount_in_original_currency: Decimal,
    pub amount_in_base_currency: Decimal,
    pub lines: Vec<BatchLine>,
}

impl Batch {
    /// Add `quantity` units of a group line, merging with an existing line
    /// of the same item code
    ///
    /// The batch is left untouched when a total would overflow.
    fn add_units(&mut self, line: &GroupLine, quantity: u32) -> Result<(), PayoutError> {
        let overflow = || {
            PayoutError::arithmetic_overflow(format!(
                "batch total of item {} ({} units)",
                line.item_id, quantity
            ))
        };
        let units = Decimal::from(quantity);
        let amount = line.unit_amount.checked_mul(units).ok_or_else(overflow)?;
        let converted = line
            .unit_converted_amount
            .checked_mul(units)
            .ok_or_else(overflow)?;
        let original_total = self
            .amount_in_original_currency
            .checked_add(amount)
            .ok_or_else(overflow)?;
        let base_total = self
            .amount_in_base_currency
            .checked_add(converted)
            .ok_or_else(overflow)?;

        match self
            .lines
            .iter_mut()
            .find(|existing| existing.channel_item_code == line.channel_item_code)
        {
            Some(existing) => {
                existing.quantity += quantity;
                existing.total_amount += amount;
                existing.total_converted_amount += converted;
            }
            None => self.lines.push(BatchLine {
                item_id: line.item_id,
                channel_item_code: line.channel_item_code.clone(),
                name: line.name.clone(),
                unit_amount: line.unit_amount,
                unit_converted_amount: line.unit_converted_amount,
                quantity,
                total_amount: amount,
                total_converted_amount: converted,
            }),
        }

        self.amount_in_original_currency = original_total;
        self.amount_in_base_currency = base_total;
        Ok(())
    }

    /// Number of units in the batch
    pub fn unit_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

/// Splits currency groups into batches bounded by a payout limit
#[derive(Debug, Clone, Copy)]
pub struct BatchSplitter {
    limit: Decimal,
}

impl BatchSplitter {
    /// Create a splitter for the given limit (in base-currency units)
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the limit is not positive.
    pub fn new(limit: Decimal) -> Result<Self, PayoutError> {
        if limit <= Decimal::ZERO {
            return Err(PayoutError::invalid_configuration(format!(
                "payout limit must be positive, got {}",
                limit
            )));
        }
        Ok(BatchSplitter { limit })
    }

    /// Split one currency group into batches
    ///
    /// Every returned batch has a converted total of at most the limit, and
    /// the batch totals add up to the group totals.
    ///
    /// # Errors
    ///
    /// Returns `ItemExceedsPayoutLimit` if a single unit's converted price
    /// is at or above the limit. No batches are returned in that case.
    /// Returns `ArithmeticOverflow` if a batch total leaves the `Decimal`
    /// range.
    pub fn split(&self, group: &CurrencyGroup) -> Result<Vec<Batch>, PayoutError> {
        // (line index, units still to allocate)
        let mut pending: Vec<(usize, u32)> = group
            .lines
            .iter()
            .enumerate()
            .filter(|(_, line)| line.quantity > 0)
            .map(|(index, line)| (index, line.quantity))
            .collect();

        let mut remaining = group.total_converted_amount;
        let mut batches = Vec::new();

        while !pending.is_empty() {
            let mut batch = Batch::default();

            for (index, left) in pending.iter_mut() {
                let line = &group.lines[*index];
                let price = line.unit_converted_amount;

                if batch.amount_in_base_currency.is_zero() && price >= self.limit {
                    return Err(PayoutError::ItemExceedsPayoutLimit {
                        item_id: line.item_id,
                        amount: line.unit_amount,
                        currency: group.key.original_currency.clone(),
                        converted_amount: price,
                        base_currency: group.key.converted_currency.clone(),
                        limit: self.limit,
                    });
                }

                let fit = self.units_that_fit(price, batch.amount_in_base_currency, *left);
                if fit > 0 {
                    batch.add_units(line, fit)?;
                    *left -= fit;
                }
            }

            pending.retain(|(_, left)| *left > 0);
            remaining -= batch.amount_in_base_currency;

            debug!(
                seller = group.key.seller_id,
                batch = batches.len() + 1,
                units = batch.unit_count(),
                amount = %batch.amount_in_base_currency,
                remaining = %remaining,
                "batch closed"
            );
            batches.push(batch);
        }

        Ok(batches)
    }

    /// How many units priced at `price` can join a batch already holding `running`
    fn units_that_fit(&self, price: Decimal, running: Decimal, available: u32) -> u32 {
        if price.is_zero() {
            return available;
        }

        let room = self.limit - running;
        if room < price {
            return 0;
        }

        let mut fit = (room / price)
            .floor()
            .to_u64()
            .map_or(available, |n| n.min(u64::from(available)) as u32);

        // Guard against the quotient rounding up past an exact boundary
        while fit > 0 && price * Decimal::from(fit) > room {
            fit -= 1;
        }
        fit
    }
}
