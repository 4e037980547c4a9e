//! Common types for the PostgREST data provider

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// One row of a resource, column name to JSON value
pub type Record = serde_json::Map<String, Value>;

/// Externally visible key of a record.
///
/// The raw column value for single-column keys, a JSON array string for
/// compound keys.
pub type Identifier = Value;

// ============================================================================
// Provider Parameters
// ============================================================================

/// Page selection, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Lower-case form used on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(Error::InvalidQueryParam(format!("sort order '{s}'")))
        }
    }
}

impl TryFrom<String> for SortOrder {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortOrder> for String {
    fn from(order: SortOrder) -> Self {
        order.as_str().to_uppercase()
    }
}

/// Sort specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: "id".to_string(),
            order: SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetListParams {
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub sort: Sort,
    #[serde(default)]
    pub filter: Record,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOneParams {
    pub id: Identifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetManyParams {
    pub ids: Vec<Identifier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetManyReferenceParams {
    /// Column of the referencing resource holding the parent key
    pub target: String,
    /// Parent record identifier
    pub id: Identifier,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub sort: Sort,
    #[serde(default)]
    pub filter: Record,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateParams {
    pub data: Record,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateParams {
    pub id: Identifier,
    pub data: Record,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateManyParams {
    pub ids: Vec<Identifier>,
    pub data: Record,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteParams {
    pub id: Identifier,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteManyParams {
    pub ids: Vec<Identifier>,
}

// ============================================================================
// Provider Results
// ============================================================================

/// Page of records plus the total number of matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    pub data: Vec<Record>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManyResult {
    pub data: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneResult {
    pub data: Record,
}

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP methods used by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a request header, ignoring case
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response returned by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lower-cased
    headers: HashMap<String, String>,
    pub json: Value,
}

impl HttpResponse {
    pub fn new(status: u16, json: Value) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            json,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Look up a response header, ignoring case
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Desc.to_string(), "desc");
    }

    #[test]
    fn test_list_params_from_json() {
        let params: GetListParams = serde_json::from_value(json!({
            "pagination": { "page": 2, "perPage": 10 },
            "sort": { "field": "title", "order": "DESC" },
            "filter": { "title@ilike": "rust" }
        }))
        .unwrap();

        assert_eq!(params.pagination, Pagination { page: 2, per_page: 10 });
        assert_eq!(params.sort.order, SortOrder::Desc);
        assert_eq!(params.filter["title@ilike"], json!("rust"));
    }

    #[test]
    fn test_response_headers_ignore_case() {
        let response = HttpResponse::new(200, json!([])).with_header("Content-Range", "0-9/42");
        assert_eq!(response.header("content-range"), Some("0-9/42"));
        assert_eq!(response.header("CONTENT-RANGE"), Some("0-9/42"));
        assert_eq!(response.header("prefer"), None);
    }

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::new(Method::Post, "http://api/posts")
            .header("Prefer", "return=representation")
            .body("{}".to_string());

        assert_eq!(request.header_value("prefer"), Some("return=representation"));
        assert_eq!(request.body.as_deref(), Some("{}"));
        assert_eq!(request.method.to_string(), "POST");
    }
}
