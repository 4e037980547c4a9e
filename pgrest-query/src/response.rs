//! Response decoding: total counts and identifier rehydration

use serde_json::Value;
use tracing::warn;

use pgrest_common::error::{Error, Result};
use pgrest_common::types::{HttpResponse, Record};

use crate::identifier::attach_identifier;
use crate::key::PrimaryKey;

/// Header carrying `<range>/<total>` on counted responses
pub const CONTENT_RANGE: &str = "content-range";

/// Total number of matches from the `Content-Range` header
///
/// # Errors
/// Returns `MissingRangeHeader` if the header is absent and
/// `InvalidRangeHeader` if it does not end in `/<integer>`.
pub fn total_count(response: &HttpResponse) -> Result<u64> {
    let Some(range) = response.header(CONTENT_RANGE) else {
        warn!("list response without Content-Range header");
        return Err(Error::MissingRangeHeader);
    };

    parse_total(range)
}

/// Parse the integer after the last `/` of a content range such as `0-24/319`
///
/// # Errors
/// Returns `InvalidRangeHeader` when there is no slash or the total is not an integer.
pub fn parse_total(range: &str) -> Result<u64> {
    let (_, total) = range
        .rsplit_once('/')
        .ok_or_else(|| Error::InvalidRangeHeader(range.to_string()))?;

    total
        .trim()
        .parse()
        .map_err(|_| Error::InvalidRangeHeader(range.to_string()))
}

/// Records of a collection response, each carrying an `id`
///
/// # Errors
/// Returns `UnexpectedResponse` unless the body is an array of objects.
pub fn records(response: &HttpResponse, key: &PrimaryKey) -> Result<Vec<Record>> {
    let Value::Array(rows) = &response.json else {
        return Err(Error::UnexpectedResponse(format!(
            "expected a JSON array, got {}",
            kind(&response.json)
        )));
    };

    rows.iter()
        .map(|row| as_record(row).map(|record| attach_identifier(record, key)))
        .collect()
}

/// Single record response carrying an `id`
///
/// # Errors
/// Returns `UnexpectedResponse` unless the body is an object.
pub fn record(response: &HttpResponse, key: &PrimaryKey) -> Result<Record> {
    as_record(&response.json).map(|record| attach_identifier(record, key))
}

/// Body of a single-object response without identifier rehydration
///
/// # Errors
/// Returns `UnexpectedResponse` unless the body is an object.
pub fn raw_record(response: &HttpResponse) -> Result<Record> {
    as_record(&response.json)
}

fn as_record(value: &Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        other => Err(Error::UnexpectedResponse(format!(
            "expected a JSON object, got {}",
            kind(other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
