//! JSON response envelopes
//!
//! Every outcome of a request is written as one JSON document:
//! - Success (201): `{ "payouts": { ... } }`
//! - Domain failure (400): `{ "success": false, "message": "Payout processing error", "error": "..." }`
//! - Validation failure (422): `{ "success": false, "message": "Validation failed", "errors": { ... } }`

use crate::io::request::ValidationErrors;
use crate::types::{PayoutError, PayoutReport};
use serde::Serialize;
use std::io::Write;

/// HTTP-equivalent outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Created,
    BadRequest,
    UnprocessableEntity,
}

impl ResponseStatus {
    /// The HTTP status code this outcome maps to
    pub fn code(self) -> u16 {
        match self {
            ResponseStatus::Created => 201,
            ResponseStatus::BadRequest => 400,
            ResponseStatus::UnprocessableEntity => 422,
        }
    }

    /// Process exit code for the CLI
    pub fn exit_code(self) -> i32 {
        match self {
            ResponseStatus::Created => 0,
            ResponseStatus::BadRequest | ResponseStatus::UnprocessableEntity => 2,
        }
    }
}

#[derive(Serialize)]
struct SuccessEnvelope<'a> {
    payouts: &'a PayoutReport,
}

#[derive(Serialize)]
struct FailureEnvelope<'a> {
    success: bool,
    message: &'static str,
    error: &'a str,
}

#[derive(Serialize)]
struct ValidationEnvelope<'a> {
    success: bool,
    message: &'static str,
    errors: &'a ValidationErrors,
}

fn write_json<T: Serialize>(value: &T, output: &mut dyn Write) -> Result<(), PayoutError> {
    serde_json::to_writer_pretty(&mut *output, value).map_err(|e| PayoutError::IoError {
        message: format!("Failed to write response: {}", e),
    })?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

/// Write the success envelope for a processed request
pub fn write_success(
    report: &PayoutReport,
    output: &mut dyn Write,
) -> Result<ResponseStatus, PayoutError> {
    write_json(&SuccessEnvelope { payouts: report }, output)?;
    Ok(ResponseStatus::Created)
}

/// Write the failure envelope for a domain error
pub fn write_failure(
    error: &PayoutError,
    output: &mut dyn Write,
) -> Result<ResponseStatus, PayoutError> {
    let detail = error.to_string();
    write_json(
        &FailureEnvelope {
            success: false,
            message: "Payout processing error",
            error: &detail,
        },
        output,
    )?;
    Ok(ResponseStatus::BadRequest)
}

/// Write the envelope for a request that failed validation
pub fn write_validation_failure(
    errors: &ValidationErrors,
    output: &mut dyn Write,
) -> Result<ResponseStatus, PayoutError> {
    write_json(
        &ValidationEnvelope {
            success: false,
            message: "Validation failed",
            errors,
        },
        output,
    )?;
    Ok(ResponseStatus::UnprocessableEntity)
}
