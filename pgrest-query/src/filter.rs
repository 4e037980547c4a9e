//! Filter expression compiler
//!
//! Turns a front-end filter mapping such as
//! `{"title@ilike": "red car", "price@gte": 10, "price@lte": 20}` into
//! PostgREST operator expressions grouped per column:
//! `title=ilike.*red*&title=ilike.*car*&price=gte.10&price=lte.20`.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::trace;

use pgrest_common::error::{Error, Result};
use pgrest_common::types::Record;

use crate::identifier::to_plain_string;
use crate::query::quote_list_item;

/// Separator between column and operator in a filter key
pub const OPERATOR_SEPARATOR: char = '@';

/// Filter operators understood by PostgREST
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,     // equals
    Neq,    // not equals
    Gt,     // greater than
    Gte,    // greater than or equal
    Lt,     // less than
    Lte,    // less than or equal
    Like,   // LIKE
    Ilike,  // ILIKE (case-insensitive)
    Match,  // ~ (regex)
    Imatch, // ~* (case-insensitive regex)
    In,     // IN
    Is,     // IS (for NULL, TRUE, FALSE)
    Cs,     // contains (@>)
    Cd,     // contained by (<@)
    Ov,     // overlaps (&&)
    Sl,     // strictly left (<<)
    Sr,     // strictly right (>>)
    Nxl,    // not extends left (&>)
    Nxr,    // not extends right (<&)
    Adj,    // adjacent (-|-)
    Fts,    // full-text search (@@)
    Plfts,  // plain full-text search
    Phfts,  // phrase full-text search
    Wfts,   // websearch full-text search
}

const OPERATORS: [(&str, FilterOperator); 24] = [
    ("eq", FilterOperator::Eq),
    ("neq", FilterOperator::Neq),
    ("gt", FilterOperator::Gt),
    ("gte", FilterOperator::Gte),
    ("lt", FilterOperator::Lt),
    ("lte", FilterOperator::Lte),
    ("like", FilterOperator::Like),
    ("ilike", FilterOperator::Ilike),
    ("match", FilterOperator::Match),
    ("imatch", FilterOperator::Imatch),
    ("in", FilterOperator::In),
    ("is", FilterOperator::Is),
    ("cs", FilterOperator::Cs),
    ("cd", FilterOperator::Cd),
    ("ov", FilterOperator::Ov),
    ("sl", FilterOperator::Sl),
    ("sr", FilterOperator::Sr),
    ("nxl", FilterOperator::Nxl),
    ("nxr", FilterOperator::Nxr),
    ("adj", FilterOperator::Adj),
    ("fts", FilterOperator::Fts),
    ("plfts", FilterOperator::Plfts),
    ("phfts", FilterOperator::Phfts),
    ("wfts", FilterOperator::Wfts),
];

impl FilterOperator {
    pub fn as_str(self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(_, op)| *op == self)
            .map_or("eq", |(name, _)| *name)
    }

    /// Operators whose value is a phrase searched term by term
    pub fn is_pattern(self) -> bool {
        matches!(self, Self::Like | Self::Ilike)
    }

    /// Operators taking an array literal `{a,b}`
    pub fn takes_array(self) -> bool {
        matches!(self, Self::Cs | Self::Cd | Self::Ov)
    }
}

impl FromStr for FilterOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OPERATORS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, op)| *op)
            .ok_or_else(|| Error::InvalidFilter(format!("unknown operator '{s}'")))
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator with optional negation, e.g. `not.ilike`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOp {
    pub operator: FilterOperator,
    pub negated: bool,
}

impl FilterOp {
    pub fn new(operator: FilterOperator) -> Self {
        Self {
            operator,
            negated: false,
        }
    }

    #[must_use]
    pub fn negate(self) -> Self {
        Self {
            negated: !self.negated,
            ..self
        }
    }

    /// Build the expression for one value
    fn expression(self, value: &Value) -> Vec<String> {
        if self.operator.is_pattern() {
            let phrase = to_plain_string(value);
            let mut terms: Vec<&str> = phrase
                .trim()
                .split(' ')
                .filter(|term| !term.is_empty())
                .collect();
            if terms.is_empty() {
                terms.push("");
            }
            return terms
                .into_iter()
                .map(|term| format!("{}.*{}*", self, term))
                .collect();
        }

        let rendered = match (self.operator, value) {
            (FilterOperator::In, Value::Array(items)) => format!("({})", render_items(items)),
            (op, Value::Array(items)) if op.takes_array() => format!("{{{}}}", render_items(items)),
            (_, other) => to_plain_string(other),
        };
        vec![format!("{}.{}", self, rendered)]
    }
}

impl From<FilterOperator> for FilterOp {
    fn from(operator: FilterOperator) -> Self {
        Self::new(operator)
    }
}

impl Default for FilterOp {
    fn default() -> Self {
        Self::new(FilterOperator::Eq)
    }
}

impl FromStr for FilterOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.strip_prefix("not.") {
            Some(rest) => Ok(Self::new(rest.parse()?).negate()),
            None => Ok(Self::new(s.parse()?)),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "not.{}", self.operator)
        } else {
            write!(f, "{}", self.operator)
        }
    }
}

fn render_items(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| quote_list_item(&to_plain_string(item)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Expressions compiled for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEntry {
    Single(String),
    Stacked(Vec<String>),
}

impl FilterEntry {
    fn push(&mut self, expression: String) {
        match self {
            Self::Single(first) => {
                let first = std::mem::take(first);
                *self = Self::Stacked(vec![first, expression]);
            }
            Self::Stacked(expressions) => expressions.push(expression),
        }
    }

    pub fn expressions(&self) -> &[String] {
        match self {
            Self::Single(expression) => std::slice::from_ref(expression),
            Self::Stacked(expressions) => expressions,
        }
    }
}

/// Compiled filters in first-appearance column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledFilters {
    entries: Vec<(String, FilterEntry)>,
}

impl CompiledFilters {
    pub fn get(&self, column: &str) -> Option<&FilterEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// One `(column, expression)` pair per expression, repeated columns included
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().flat_map(|(column, entry)| {
            entry
                .expressions()
                .iter()
                .map(move |expression| (column, expression.as_str()))
        })
    }

    fn add(&mut self, column: &str, expression: String) {
        match self.entries.iter_mut().find(|(name, _)| name == column) {
            Some((_, entry)) => entry.push(expression),
            None => self
                .entries
                .push((column.to_string(), FilterEntry::Single(expression))),
        }
    }
}

/// Compile a filter mapping into per-column operator expressions
///
/// # Errors
/// Returns `InvalidFilter` for an empty column name or an unknown operator.
pub fn compile(filter: &Record, default_op: FilterOp) -> Result<CompiledFilters> {
    let mut compiled = CompiledFilters::default();

    for (key, value) in filter {
        let (column, op) = match key.split_once(OPERATOR_SEPARATOR) {
            Some((column, op)) => (column, op.parse::<FilterOp>()?),
            None => (key.as_str(), default_op),
        };

        if column.is_empty() {
            return Err(Error::InvalidFilter(format!("missing column in '{key}'")));
        }

        for expression in op.expression(value) {
            compiled.add(column, expression);
        }
    }

    trace!(columns = compiled.len(), "compiled filters");
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_default_operator() {
        let compiled = compile(&filter(json!({ "status": "active" })), FilterOp::default()).unwrap();
        assert_eq!(
            compiled.get("status"),
            Some(&FilterEntry::Single("eq.active".to_string()))
        );

        let ilike = "ilike".parse().unwrap();
        let compiled = compile(&filter(json!({ "name": "bob" })), ilike).unwrap();
        assert_eq!(
            compiled.get("name"),
            Some(&FilterEntry::Single("ilike.*bob*".to_string()))
        );
    }

    #[test]
    fn test_like_splits_terms() {
        let compiled =
            compile(&filter(json!({ "title@like": "red car" })), FilterOp::default()).unwrap();
        assert_eq!(
            compiled.get("title"),
            Some(&FilterEntry::Stacked(vec![
                "like.*red*".to_string(),
                "like.*car*".to_string()
            ]))
        );
    }

    #[test]
    fn test_like_trims_and_skips_blank_terms() {
        let compiled =
            compile(&filter(json!({ "title@ilike": "  red   car " })), FilterOp::default())
                .unwrap();
        assert_eq!(
            compiled.get("title").unwrap().expressions(),
            &["ilike.*red*".to_string(), "ilike.*car*".to_string()]
        );

        let compiled = compile(&filter(json!({ "title@like": "   " })), FilterOp::default()).unwrap();
        assert_eq!(
            compiled.get("title"),
            Some(&FilterEntry::Single("like.**".to_string()))
        );
    }

    #[test]
    fn test_repeated_column_stacks_in_order() {
        let compiled = compile(
            &filter(json!({ "price@gte": 10, "price@lte": 20 })),
            FilterOp::default(),
        )
        .unwrap();
        assert_eq!(
            compiled.get("price"),
            Some(&FilterEntry::Stacked(vec![
                "gte.10".to_string(),
                "lte.20".to_string()
            ]))
        );
    }

    #[test]
    fn test_third_expression_appends() {
        let compiled = compile(
            &filter(json!({ "price@gte": 10, "price@lte": 20, "price@neq": 15 })),
            FilterOp::default(),
        )
        .unwrap();
        assert_eq!(compiled.get("price").unwrap().expressions().len(), 3);
        assert_eq!(compiled.len(), 1);
    }

    #[test]
    fn test_negated_pattern() {
        let compiled = compile(
            &filter(json!({ "title@not.ilike": "draft" })),
            FilterOp::default(),
        )
        .unwrap();
        assert_eq!(
            compiled.get("title"),
            Some(&FilterEntry::Single("not.ilike.*draft*".to_string()))
        );
    }

    #[test]
    fn test_operator_names_are_not_substring_matched() {
        // `likeness` is neither like nor a known operator
        let err = compile(&filter(json!({ "x@likeness": "a b" })), FilterOp::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
    }

    #[test]
    fn test_in_with_array() {
        let compiled = compile(
            &filter(json!({ "status@in": ["draft", "needs review", 3] })),
            FilterOp::default(),
        )
        .unwrap();
        assert_eq!(
            compiled.get("status"),
            Some(&FilterEntry::Single("in.(draft,\"needs review\",3)".to_string()))
        );
    }

    #[test]
    fn test_array_operator() {
        let compiled = compile(&filter(json!({ "tags@cs": ["rust", "db"] })), FilterOp::default())
            .unwrap();
        assert_eq!(
            compiled.get("tags"),
            Some(&FilterEntry::Single("cs.{rust,db}".to_string()))
        );
    }

    #[test]
    fn test_is_null_and_scalars() {
        let compiled = compile(
            &filter(json!({ "deleted_at@is": null, "published": true, "views@gt": 1.5 })),
            FilterOp::default(),
        )
        .unwrap();
        let pairs: Vec<_> = compiled.pairs().collect();
        assert_eq!(
            pairs,
            vec![
                ("deleted_at", "is.null"),
                ("published", "eq.true"),
                ("views", "gt.1.5")
            ]
        );
    }

    #[test]
    fn test_missing_column() {
        assert!(compile(&filter(json!({ "@eq": 1 })), FilterOp::default()).is_err());
    }

    #[test]
    fn test_filter_op_round_trip_display() {
        for name in ["eq", "not.eq", "ilike", "not.like", "wfts"] {
            assert_eq!(name.parse::<FilterOp>().unwrap().to_string(), name);
        }
    }
}
