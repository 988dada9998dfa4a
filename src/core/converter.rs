//! Currency conversion
//!
//! Conversion is a single multiplicative hop through a fixed rate table.
//! There is no path-finding through intermediate currencies: a pair is
//! either present in the table or unsupported.
//!
//! # Rounding
//!
//! Cross-currency results are rounded to two decimal places with banker's
//! rounding at conversion time, matching the precision of persisted amount
//! columns. Converting a currency to itself returns the amount unchanged.

use crate::types::{Currency, PayoutError};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

/// Number of decimal places kept for monetary amounts
pub const AMOUNT_SCALE: u32 = 2;

/// Round an amount to the stored monetary precision
pub fn round_amount(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(AMOUNT_SCALE);
    rounded
}

/// Directed exchange rates between currency pairs
///
/// Rates are not assumed to be inverse of each other: `USD -> GBP` and
/// `GBP -> USD` are independent entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<(Currency, Currency), Decimal>,
}

impl RateTable {
    /// Create an empty rate table
    pub fn new() -> Self {
        RateTable {
            rates: HashMap::new(),
        }
    }

    /// The built-in table over USD, GBP, EUR, and AED
    pub fn standard() -> Self {
        const TABLE: [(&str, &str, i64); 16] = [
            ("USD", "GBP", 75),
            ("USD", "EUR", 85),
            ("USD", "USD", 100),
            ("USD", "AED", 367),
            ("GBP", "USD", 133),
            ("GBP", "EUR", 113),
            ("GBP", "GBP", 100),
            ("GBP", "AED", 489),
            ("EUR", "USD", 118),
            ("EUR", "GBP", 88),
            ("EUR", "EUR", 100),
            ("EUR", "AED", 428),
            ("AED", "USD", 27),
            ("AED", "GBP", 20),
            ("AED", "EUR", 23),
            ("AED", "AED", 100),
        ];

        let mut table = RateTable::new();
        for (from, to, hundredths) in TABLE {
            table.rates.insert(
                (Currency::new(from), Currency::new(to)),
                Decimal::new(hundredths, 2),
            );
        }
        table
    }

    /// Add a rate to the table
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if the rate is not positive or the
    /// pair is already present.
    pub fn insert(
        &mut self,
        from: Currency,
        to: Currency,
        rate: Decimal,
    ) -> Result<(), PayoutError> {
        if rate <= Decimal::ZERO {
            return Err(PayoutError::invalid_configuration(format!(
                "rate {} -> {} must be positive, got {}",
                from, to, rate
            )));
        }
        if from == to && rate != Decimal::ONE {
            return Err(PayoutError::invalid_configuration(format!(
                "self-conversion rate for {} must be 1, got {}",
                from, rate
            )));
        }
        if self.rates.contains_key(&(from.clone(), to.clone())) {
            return Err(PayoutError::invalid_configuration(format!(
                "duplicate rate {} -> {}",
                from, to
            )));
        }
        self.rates.insert((from, to), rate);
        Ok(())
    }

    /// Build a table from `(from, to, rate)` entries
    ///
    /// # Errors
    ///
    /// Returns the first entry rejected by `insert`.
    pub fn from_entries<I>(entries: I) -> Result<Self, PayoutError>
    where
        I: IntoIterator<Item = (Currency, Currency, Decimal)>,
    {
        let mut table = RateTable::new();
        for (from, to, rate) in entries {
            table.insert(from, to, rate)?;
        }
        Ok(table)
    }

    /// Look up the rate for a pair
    pub fn rate(&self, from: &Currency, to: &Currency) -> Option<Decimal> {
        self.rates.get(&(from.clone(), to.clone())).copied()
    }

    /// Whether a currency appears anywhere in the table
    pub fn supports(&self, currency: &Currency) -> bool {
        self.rates
            .keys()
            .any(|(from, to)| from == currency || to == currency)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Converts amounts between currencies using a `RateTable`
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    rates: RateTable,
}

impl CurrencyConverter {
    pub fn new(rates: RateTable) -> Self {
        CurrencyConverter { rates }
    }

    /// Convert `amount` from one currency to another
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCurrencyPair` if the table has no entry for the
    /// pair, including self-conversion of a currency the table does not know.
    /// Returns `ArithmeticOverflow` if the converted amount does not fit in a
    /// `Decimal`.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &Currency,
        to: &Currency,
    ) -> Result<Decimal, PayoutError> {
        if from == to && self.rates.supports(from) {
            return Ok(amount);
        }

        let rate = self
            .rates
            .rate(from, to)
            .ok_or_else(|| PayoutError::unsupported_currency_pair(from, to))?;

        let converted = amount.checked_mul(rate).ok_or_else(|| {
            PayoutError::arithmetic_overflow(format!(
                "conversion of {} {} to {}",
                amount, from, to
            ))
        })?;
        Ok(round_amount(converted))
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        CurrencyConverter::new(RateTable::standard())
    }
}
