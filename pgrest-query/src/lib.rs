//! PostgREST Query Construction
//!
//! Translates resource-oriented CRUD operations into PostgREST requests:
//! - Primary-key resolution per resource, single or compound
//! - Identifier encoding and decoding for compound keys
//! - Filter compilation (eq, neq, gt, gte, lt, lte, like, ilike, in, is, etc.)
//! - Ordering, pagination and key-lookup query assembly
//! - Response decoding (total counts, identifier rehydration)

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod filter;
pub mod identifier;
pub mod key;
pub mod query;
pub mod request;
pub mod response;

pub use filter::{compile, CompiledFilters, FilterEntry, FilterOp, FilterOperator};
pub use identifier::{attach_identifier, decode, encode};
pub use key::{PrimaryKey, PrimaryKeyRegistry};
pub use query::{order_by, Query};
pub use request::RequestBuilder;
