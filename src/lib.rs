//! PostgREST Data Provider
//!
//! Maps resource-oriented CRUD calls onto a PostgREST API, so a front end can
//! work with named resources without knowing the filter syntax.
//!
//! # Features
//!
//! - **Nine operations** - getList, getOne, getMany, getManyReference, create,
//!   update, updateMany, delete, deleteMany
//! - **Compound primary keys** - encoded as JSON array identifiers
//! - **Filter operators** - `column@operator` keys, term-wise pattern search
//! - **Pluggable transport** - `reqwest` by default, any [`Transport`] in tests
//!
//! # Example
//!
//! ```no_run
//! use pgrest_provider::{DataProvider, PostgrestProvider};
//! use pgrest_provider::common::types::GetOneParams;
//! use pgrest_provider::common::ProviderConfig;
//!
//! # async fn run() -> pgrest_provider::common::Result<()> {
//! let mut config = ProviderConfig::default();
//! config
//!     .primary_keys
//!     .insert("order_items".to_string(), vec!["order_id".to_string(), "item_id".to_string()]);
//!
//! let provider = PostgrestProvider::from_config(&config)?;
//! let item = provider
//!     .get_one("order_items", &GetOneParams { id: "[1,10]".into() })
//!     .await?;
//! println!("{}", item.data["id"]);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub use pgrest_common as common;
pub use pgrest_query as query;

pub mod operation;
pub mod provider;
pub mod transport;

pub use operation::Operation;
pub use provider::{DataProvider, PostgrestProvider};
pub use transport::{ReqwestTransport, Transport};
