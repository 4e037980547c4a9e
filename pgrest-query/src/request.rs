//! Mapping of provider operations onto PostgREST requests
//!
//! ```text
//! getList          => GET    /posts?order=title.asc&offset=0&limit=24&title=eq.value
//! getOne           => GET    /posts?id=eq.123
//! getMany          => GET    /posts?id=in.(123,456,789)
//! getManyReference => GET    /posts?author_id=eq.345
//! create           => POST   /posts
//! update           => PATCH  /posts?id=eq.123
//! updateMany       => PATCH  /posts?id=in.(123,456,789)
//! delete           => DELETE /posts?id=eq.123
//! deleteMany       => DELETE /posts?id=in.(123,456,789)
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use pgrest_common::config::ProviderConfig;
use pgrest_common::error::{Error, Result};
use pgrest_common::types::{
    CreateParams, DeleteManyParams, DeleteParams, GetListParams, GetManyParams,
    GetManyReferenceParams, GetOneParams, HttpRequest, Method, Record, UpdateManyParams,
    UpdateParams,
};

use crate::filter::{compile, FilterOp};
use crate::identifier::{key_data, ID_FIELD};
use crate::key::{PrimaryKey, PrimaryKeyRegistry};
use crate::query::{key_lookup, keys_lookup, list_query, reference_query, Query};

pub const ACCEPT: &str = "Accept";
pub const PREFER: &str = "Prefer";
pub const CONTENT_TYPE: &str = "Content-Type";

pub const APPLICATION_JSON: &str = "application/json";
/// Makes PostgREST answer with a single object instead of an array
pub const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";
pub const COUNT_EXACT: &str = "count=exact";
pub const RETURN_REPRESENTATION: &str = "return=representation";

/// Builds the HTTP request for each provider operation
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
    default_op: FilterOp,
    registry: Arc<PrimaryKeyRegistry>,
    extra_headers: Vec<(String, String)>,
}

impl RequestBuilder {
    pub fn new(base_url: impl Into<String>, registry: Arc<PrimaryKeyRegistry>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_op: FilterOp::default(),
            registry,
            extra_headers: Vec::new(),
        }
    }

    /// Build from configuration
    ///
    /// # Errors
    /// Returns `ConfigError` for invalid settings, including an unknown
    /// default operator.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;
        let registry = PrimaryKeyRegistry::from_config(&config.primary_keys)?;
        let default_op: FilterOp = config.default_operator.parse().map_err(|_| {
            Error::ConfigError(format!(
                "unknown default_operator '{}'",
                config.default_operator
            ))
        })?;

        let mut extra_headers: Vec<(String, String)> = config
            .http
            .headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        extra_headers.sort();

        Ok(Self {
            base_url: config.base_url().to_string(),
            default_op,
            registry: Arc::new(registry),
            extra_headers,
        })
    }

    #[must_use]
    pub fn with_default_operator(mut self, op: FilterOp) -> Self {
        self.default_op = op;
        self
    }

    /// Header added to every request
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_operator(&self) -> FilterOp {
        self.default_op
    }

    pub fn primary_key(&self, resource: &str) -> &PrimaryKey {
        self.registry.resolve(resource)
    }

    /// # Errors
    /// Returns an error for invalid filters or pagination.
    pub fn get_list(&self, resource: &str, params: &GetListParams) -> Result<HttpRequest> {
        let key = self.primary_key(resource);
        let filters = compile(&params.filter, self.default_op)?;
        let query = list_query(params.pagination, &params.sort, &filters, key)?;

        Ok(self
            .request(Method::Get, resource, Some(&query))
            .header(ACCEPT, APPLICATION_JSON)
            .header(PREFER, COUNT_EXACT))
    }

    /// # Errors
    /// Returns `MalformedIdentifier` for a bad compound identifier.
    pub fn get_one(&self, resource: &str, params: &GetOneParams) -> Result<HttpRequest> {
        let query = key_lookup(&params.id, self.primary_key(resource))?;

        Ok(self
            .request(Method::Get, resource, Some(&query))
            .header(ACCEPT, SINGLE_OBJECT))
    }

    /// # Errors
    /// Returns an error for an empty id list or a bad compound identifier.
    pub fn get_many(&self, resource: &str, params: &GetManyParams) -> Result<HttpRequest> {
        let query = keys_lookup(&params.ids, self.primary_key(resource))?;
        Ok(self.request(Method::Get, resource, Some(&query)))
    }

    /// # Errors
    /// Returns an error for invalid filters or pagination.
    pub fn get_many_reference(
        &self,
        resource: &str,
        params: &GetManyReferenceParams,
    ) -> Result<HttpRequest> {
        let key = self.primary_key(resource);
        let filters = compile(&params.filter, self.default_op)?;
        let query = reference_query(
            &params.target,
            &params.id,
            params.pagination,
            &params.sort,
            &filters,
            key,
        )?;

        Ok(self
            .request(Method::Get, resource, Some(&query))
            .header(ACCEPT, APPLICATION_JSON)
            .header(PREFER, COUNT_EXACT))
    }

    /// # Errors
    /// Returns `JsonError` if the body cannot be serialized.
    pub fn create(&self, resource: &str, params: &CreateParams) -> Result<HttpRequest> {
        let body = serde_json::to_string(&params.data)?;

        Ok(self
            .request(Method::Post, resource, None)
            .header(ACCEPT, SINGLE_OBJECT)
            .header(PREFER, RETURN_REPRESENTATION)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body))
    }

    /// The body is the submitted data with the key columns merged back in.
    ///
    /// # Errors
    /// Returns `MalformedIdentifier` for a bad compound identifier.
    pub fn update(&self, resource: &str, params: &UpdateParams) -> Result<HttpRequest> {
        let key = self.primary_key(resource);
        let query = key_lookup(&params.id, key)?;

        let mut data = without_id(&params.data);
        let keys = key_data(&data, &params.id, key)?;
        data.extend(keys);
        let body = serde_json::to_string(&Value::Object(data))?;

        Ok(self
            .request(Method::Patch, resource, Some(&query))
            .header(ACCEPT, SINGLE_OBJECT)
            .header(PREFER, RETURN_REPRESENTATION)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body))
    }

    /// # Errors
    /// Returns an error for an empty id list or a bad compound identifier.
    pub fn update_many(&self, resource: &str, params: &UpdateManyParams) -> Result<HttpRequest> {
        let query = keys_lookup(&params.ids, self.primary_key(resource))?;
        let body = serde_json::to_string(&Value::Object(without_id(&params.data)))?;

        Ok(self
            .request(Method::Patch, resource, Some(&query))
            .header(PREFER, RETURN_REPRESENTATION)
            .header(CONTENT_TYPE, APPLICATION_JSON)
            .body(body))
    }

    /// # Errors
    /// Returns `MalformedIdentifier` for a bad compound identifier.
    pub fn delete(&self, resource: &str, params: &DeleteParams) -> Result<HttpRequest> {
        let query = key_lookup(&params.id, self.primary_key(resource))?;

        Ok(self
            .request(Method::Delete, resource, Some(&query))
            .header(ACCEPT, SINGLE_OBJECT)
            .header(PREFER, RETURN_REPRESENTATION)
            .header(CONTENT_TYPE, APPLICATION_JSON))
    }

    /// # Errors
    /// Returns an error for an empty id list or a bad compound identifier.
    pub fn delete_many(&self, resource: &str, params: &DeleteManyParams) -> Result<HttpRequest> {
        let query = keys_lookup(&params.ids, self.primary_key(resource))?;

        Ok(self
            .request(Method::Delete, resource, Some(&query))
            .header(PREFER, RETURN_REPRESENTATION)
            .header(CONTENT_TYPE, APPLICATION_JSON))
    }

    fn request(&self, method: Method, resource: &str, query: Option<&Query>) -> HttpRequest {
        let resource = resource.trim_matches('/');
        let url = match query {
            Some(query) if !query.is_empty() => {
                format!("{}/{resource}?{}", self.base_url, query.to_query_string())
            }
            _ => format!("{}/{resource}", self.base_url),
        };

        match query {
            Some(query) => debug!(%method, resource, query = %query, "building request"),
            None => debug!(%method, resource, "building request"),
        }

        let mut request = HttpRequest::new(method, url);
        for (name, value) in &self.extra_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        request
    }
}

/// Submitted data without the synthesized `id` field
fn without_id(data: &Record) -> Record {
    let mut data = data.clone();
    data.remove(ID_FIELD);
    data
}
