//! PostgREST Data Provider Common Types
//!
//! Shared types, configuration, and error handling for the query layer and the provider.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;

pub use config::ProviderConfig;
pub use error::{Error, Result};
