//! Query string assembly for PostgREST requests

use std::fmt;

use pgrest_common::error::{Error, Result};
use pgrest_common::types::{Identifier, Pagination, Sort, SortOrder};

use crate::filter::CompiledFilters;
use crate::identifier::{decode, to_plain_string, ID_FIELD};
use crate::key::PrimaryKey;

/// Characters PostgREST treats as syntax inside lists and logic trees
const RESERVED: [char; 7] = [',', '.', ':', '(', ')', '"', '\\'];

/// Ordered query parameters; repeated names are kept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.params.push((name.into(), value.into()));
    }

    /// Append every compiled filter expression, one parameter per expression
    pub fn extend_filters(&mut self, filters: &CompiledFilters) {
        for (column, expression) in filters.pairs() {
            self.push(column, expression);
        }
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `name`, in order
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.params
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// URL-encoded form for the request line
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.params {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }
}

/// Unencoded `name=value&...` form, for logs and comparisons
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Build the `order` parameter.
///
/// Sorting on `id` sorts on every primary-key column, since compound-key
/// resources have no such column.
pub fn order_by(field: &str, order: SortOrder, key: &PrimaryKey) -> String {
    if field == ID_FIELD {
        key.columns()
            .iter()
            .map(|column| format!("{column}.{order}"))
            .collect::<Vec<_>>()
            .join(",")
    } else {
        format!("{field}.{order}")
    }
}

/// `(offset, limit)` for a 1-based page
///
/// # Errors
/// Returns `InvalidQueryParam` for a zero page or page size, or on overflow.
pub fn page_window(pagination: Pagination) -> Result<(u64, u64)> {
    if pagination.page == 0 {
        return Err(Error::InvalidQueryParam("page must be at least 1".to_string()));
    }
    if pagination.per_page == 0 {
        return Err(Error::InvalidQueryParam(
            "perPage must be at least 1".to_string(),
        ));
    }

    let offset = (pagination.page - 1)
        .checked_mul(pagination.per_page)
        .ok_or_else(|| Error::InvalidQueryParam("page offset overflows".to_string()))?;

    Ok((offset, pagination.per_page))
}

/// Query for a page of records: ordering, offset, limit and filters
///
/// # Errors
/// Returns `InvalidQueryParam` for an invalid page window.
pub fn list_query(
    pagination: Pagination,
    sort: &Sort,
    filters: &CompiledFilters,
    key: &PrimaryKey,
) -> Result<Query> {
    let mut query = Query::new();
    push_list_params(&mut query, pagination, sort, filters, key)?;
    Ok(query)
}

/// List query restricted to records whose `target` column references `id`
///
/// # Errors
/// Returns `InvalidQueryParam` for an invalid page window.
pub fn reference_query(
    target: &str,
    id: &Identifier,
    pagination: Pagination,
    sort: &Sort,
    filters: &CompiledFilters,
    key: &PrimaryKey,
) -> Result<Query> {
    let mut query = Query::new();
    query.push(target, format!("eq.{}", to_plain_string(id)));
    push_list_params(&mut query, pagination, sort, filters, key)?;
    Ok(query)
}

fn push_list_params(
    query: &mut Query,
    pagination: Pagination,
    sort: &Sort,
    filters: &CompiledFilters,
    key: &PrimaryKey,
) -> Result<()> {
    let (offset, limit) = page_window(pagination)?;
    query.push("order", order_by(&sort.field, sort.order, key));
    query.push("offset", offset.to_string());
    query.push("limit", limit.to_string());
    query.extend_filters(filters);
    Ok(())
}

/// Selection for a single record
///
/// # Errors
/// Returns `MalformedIdentifier` if a compound identifier does not decode.
pub fn key_lookup(id: &Identifier, key: &PrimaryKey) -> Result<Query> {
    let mut query = Query::new();

    match key {
        PrimaryKey::Simple(column) => {
            query.push(column.as_str(), format!("eq.{}", to_plain_string(id)));
        }
        PrimaryKey::Compound(_) => {
            query.push("and", format!("({})", key_conditions(id, key)?));
        }
    }

    Ok(query)
}

/// Selection for several records
///
/// # Errors
/// Returns `InvalidQueryParam` for an empty id list and `MalformedIdentifier`
/// if a compound identifier does not decode.
pub fn keys_lookup(ids: &[Identifier], key: &PrimaryKey) -> Result<Query> {
    if ids.is_empty() {
        return Err(Error::InvalidQueryParam("ids must not be empty".to_string()));
    }

    let mut query = Query::new();

    match key {
        PrimaryKey::Simple(column) => {
            let values: Vec<String> = ids
                .iter()
                .map(|id| quote_list_item(&to_plain_string(id)))
                .collect();
            query.push(column.as_str(), format!("in.({})", values.join(",")));
        }
        PrimaryKey::Compound(_) => {
            let rows = ids
                .iter()
                .map(|id| Ok(format!("and({})", key_conditions(id, key)?)))
                .collect::<Result<Vec<_>>>()?;
            query.push("or", format!("({})", rows.join(",")));
        }
    }

    Ok(query)
}

/// `c1.eq.v1,c2.eq.v2` for one compound identifier
fn key_conditions(id: &Identifier, key: &PrimaryKey) -> Result<String> {
    let values = decode(id, key)?;
    Ok(key
        .columns()
        .iter()
        .zip(values.iter())
        .map(|(column, value)| format!("{column}.eq.{}", quote_list_item(&to_plain_string(value))))
        .collect::<Vec<_>>()
        .join(","))
}

/// Double-quote a value used inside `(...)` when it contains reserved characters
pub fn quote_list_item(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || RESERVED.contains(&c));

    if needs_quotes {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{compile, FilterOp};
    use serde_json::json;

    fn compound() -> PrimaryKey {
        PrimaryKey::Compound(vec!["tenant_id".to_string(), "item_id".to_string()])
    }

    fn sort(field: &str, order: SortOrder) -> Sort {
        Sort {
            field: field.to_string(),
            order,
        }
    }

    #[test]
    fn test_order_by_id_expands_key() {
        let key = PrimaryKey::Compound(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(order_by("id", SortOrder::Asc, &key), "a.asc,b.asc");
        assert_eq!(order_by("id", SortOrder::Desc, &key), "a.desc,b.desc");
    }

    #[test]
    fn test_order_by_plain_field() {
        assert_eq!(
            order_by("name", SortOrder::Desc, &PrimaryKey::simple("id")),
            "name.desc"
        );
        assert_eq!(
            order_by("id", SortOrder::Asc, &PrimaryKey::simple("id")),
            "id.asc"
        );
    }

    #[test]
    fn test_list_query() {
        let filter = json!({ "title@like": "red car", "price@gte": 10, "price@lte": 20 });
        let filters = compile(filter.as_object().unwrap(), FilterOp::default()).unwrap();
        let query = list_query(
            Pagination { page: 3, per_page: 25 },
            &sort("title", SortOrder::Asc),
            &filters,
            &PrimaryKey::simple("id"),
        )
        .unwrap();

        assert_eq!(
            query.to_string(),
            "order=title.asc&offset=50&limit=25&title=like.*red*&title=like.*car*\
             &price=gte.10&price=lte.20"
        );
        assert_eq!(query.get_all("price"), vec!["gte.10", "lte.20"]);
    }

    #[test]
    fn test_repeated_keys_encode_separately() {
        let filter = json!({ "price@gte": 10, "price@lte": 20 });
        let filters = compile(filter.as_object().unwrap(), FilterOp::default()).unwrap();
        let mut query = Query::new();
        query.extend_filters(&filters);
        assert_eq!(query.to_query_string(), "price=gte.10&price=lte.20");
    }

    #[test]
    fn test_reference_query_starts_with_target() {
        let query = reference_query(
            "author_id",
            &json!(345),
            Pagination { page: 1, per_page: 10 },
            &sort("id", SortOrder::Desc),
            &CompiledFilters::default(),
            &PrimaryKey::simple("id"),
        )
        .unwrap();

        assert_eq!(
            query.to_string(),
            "author_id=eq.345&order=id.desc&offset=0&limit=10"
        );
    }

    #[test]
    fn test_page_window_rejects_zero() {
        assert!(page_window(Pagination { page: 0, per_page: 10 }).is_err());
        assert!(page_window(Pagination { page: 1, per_page: 0 }).is_err());
        assert!(page_window(Pagination { page: u64::MAX, per_page: 2 }).is_err());
        assert_eq!(
            page_window(Pagination { page: 1, per_page: 10 }).unwrap(),
            (0, 10)
        );
    }

    #[test]
    fn test_simple_single_lookup() {
        let query = key_lookup(&json!(123), &PrimaryKey::simple("id")).unwrap();
        assert_eq!(query.to_string(), "id=eq.123");
    }

    #[test]
    fn test_simple_multi_lookup() {
        let query =
            keys_lookup(&[json!(123), json!(456), json!(789)], &PrimaryKey::simple("id")).unwrap();
        assert_eq!(query.to_string(), "id=in.(123,456,789)");
        assert_eq!(query.to_query_string(), "id=in.%28123%2C456%2C789%29");
    }

    #[test]
    fn test_compound_single_lookup() {
        let query = key_lookup(&json!("[1,10]"), &compound()).unwrap();
        assert_eq!(query.to_string(), "and=(tenant_id.eq.1,item_id.eq.10)");
    }

    #[test]
    fn test_compound_multi_lookup() {
        let query = keys_lookup(&[json!("[1,10]"), json!("[1,11]")], &compound()).unwrap();
        assert_eq!(
            query.to_string(),
            "or=(and(tenant_id.eq.1,item_id.eq.10),and(tenant_id.eq.1,item_id.eq.11))"
        );
    }

    #[test]
    fn test_compound_lookup_rejects_malformed_id() {
        let err = key_lookup(&json!("[1]"), &compound()).unwrap_err();
        assert!(matches!(err, Error::MalformedIdentifier(_)));
    }

    #[test]
    fn test_empty_ids_rejected() {
        assert!(keys_lookup(&[], &PrimaryKey::simple("id")).is_err());
    }

    #[test]
    fn test_reserved_values_are_quoted() {
        let query = key_lookup(&json!("[\"acme, inc\",\"2024-01-01T00:00:00\"]"), &compound()).unwrap();
        assert_eq!(
            query.to_string(),
            "and=(tenant_id.eq.\"acme, inc\",item_id.eq.\"2024-01-01T00:00:00\")"
        );
        assert_eq!(quote_list_item("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote_list_item("plain-uuid"), "plain-uuid");
    }
}
