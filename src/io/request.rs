//! Inbound payout request parsing and validation
//!
//! A request body looks like:
//!
//! ```json
//! { "sold_items": [ { "seller_reference": 1, "channel_item_code": "Test_W739" } ] }
//! ```
//!
//! Validation runs on the raw JSON value so that every offending field can be
//! reported by path (`sold_items.0.seller_reference`) instead of stopping at
//! the first serde error. A request that fails validation never reaches the
//! engine.

use crate::core::traits::Catalog;
use crate::io::csv_format::MAX_CHANNEL_ITEM_CODE_LEN;
use crate::types::{PayoutError, SellerId, SoldItemRef};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

const SOLD_ITEMS: &str = "sold_items";

/// Validation messages keyed by field path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field path
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Messages recorded for a field, if any
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one message
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Parse a request body into a JSON value
///
/// # Errors
///
/// Returns `ParseError` if the body is not valid JSON.
pub fn parse_request(body: &str) -> Result<Value, PayoutError> {
    Ok(serde_json::from_str(body)?)
}

/// Validate a parsed request against the catalog
///
/// # Returns
///
/// The sold item references in request order, or every validation message
/// found.
pub fn validate_request<C: Catalog + ?Sized>(
    payload: &Value,
    catalog: &C,
) -> Result<Vec<SoldItemRef>, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let entries = match payload.get(SOLD_ITEMS) {
        None | Some(Value::Null) => {
            errors.add(SOLD_ITEMS, "The sold_items field is required.");
            return Err(errors);
        }
        Some(Value::Array(entries)) if entries.is_empty() => {
            errors.add(SOLD_ITEMS, "The sold_items field is required.");
            return Err(errors);
        }
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            errors.add(SOLD_ITEMS, "The sold_items must be an array.");
            return Err(errors);
        }
    };

    let mut refs = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let seller = validate_seller_reference(entry.get("seller_reference"), catalog);
        let code = validate_channel_item_code(entry.get("channel_item_code"));

        match (seller, code) {
            (Ok(seller_reference), Ok(channel_item_code)) => refs.push(SoldItemRef {
                seller_reference,
                channel_item_code,
            }),
            (seller, code) => {
                if let Err(message) = seller {
                    errors.add(format!("{}.{}.seller_reference", SOLD_ITEMS, index), message);
                }
                if let Err(message) = code {
                    errors.add(format!("{}.{}.channel_item_code", SOLD_ITEMS, index), message);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(refs)
    } else {
        Err(errors)
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn validate_seller_reference<C: Catalog + ?Sized>(
    value: Option<&Value>,
    catalog: &C,
) -> Result<SellerId, &'static str> {
    if is_missing(value) {
        return Err("The seller reference is required for each item.");
    }

    // Integral strings are accepted
    let reference = match value {
        Some(Value::Number(n)) if n.is_u64() => n.as_u64(),
        Some(Value::Number(n)) if n.is_i64() => None,
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(n) => u64::try_from(n).ok(),
            Err(_) => return Err("The seller reference must be an integer."),
        },
        _ => return Err("The seller reference must be an integer."),
    };

    match reference {
        Some(id) if catalog.seller(id).is_some() => Ok(id),
        _ => Err("The seller reference does not exist in the system."),
    }
}

fn validate_channel_item_code(value: Option<&Value>) -> Result<String, &'static str> {
    if is_missing(value) {
        return Err("The channel item code is required for each item.");
    }

    match value {
        Some(Value::String(code)) if code.chars().count() > MAX_CHANNEL_ITEM_CODE_LEN => {
            Err("The channel item code must not exceed 255 characters.")
        }
        Some(Value::String(code)) => Ok(code.clone()),
        _ => Err("The channel item code must be a string."),
    }
}
