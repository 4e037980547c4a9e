//! Data provider operations over a PostgREST API

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use pgrest_common::config::ProviderConfig;
use pgrest_common::error::Result;
use pgrest_common::types::{
    CreateParams, DeleteManyParams, DeleteParams, GetListParams, GetManyParams,
    GetManyReferenceParams, GetOneParams, HttpRequest, HttpResponse, ListResult, ManyResult,
    OneResult, UpdateManyParams, UpdateParams,
};
use pgrest_query::identifier::{encode, ID_FIELD};
use pgrest_query::response::{raw_record, record, records, total_count};
use pgrest_query::RequestBuilder;

use crate::transport::{ReqwestTransport, Transport};

/// Resource-oriented CRUD operations exposed to the front end
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Page of records matching the filter, with the total count
    async fn get_list(&self, resource: &str, params: &GetListParams) -> Result<ListResult>;

    async fn get_one(&self, resource: &str, params: &GetOneParams) -> Result<OneResult>;

    async fn get_many(&self, resource: &str, params: &GetManyParams) -> Result<ManyResult>;

    /// Page of records referencing a parent record
    async fn get_many_reference(
        &self,
        resource: &str,
        params: &GetManyReferenceParams,
    ) -> Result<ListResult>;

    async fn create(&self, resource: &str, params: &CreateParams) -> Result<OneResult>;

    async fn update(&self, resource: &str, params: &UpdateParams) -> Result<OneResult>;

    async fn update_many(&self, resource: &str, params: &UpdateManyParams) -> Result<ManyResult>;

    async fn delete(&self, resource: &str, params: &DeleteParams) -> Result<OneResult>;

    async fn delete_many(&self, resource: &str, params: &DeleteManyParams) -> Result<ManyResult>;
}

/// `DataProvider` issuing one PostgREST request per operation
pub struct PostgrestProvider {
    requests: RequestBuilder,
    transport: Arc<dyn Transport>,
}

impl PostgrestProvider {
    pub fn new(requests: RequestBuilder, transport: Arc<dyn Transport>) -> Self {
        Self {
            requests,
            transport,
        }
    }

    /// Create a provider using the `reqwest` transport
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.http)?);
        Self::with_transport(config, transport)
    }

    /// Create a provider with a caller-supplied transport
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_transport(config: &ProviderConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Ok(Self::new(RequestBuilder::from_config(config)?, transport))
    }

    /// Request construction used by every operation
    pub fn requests(&self) -> &RequestBuilder {
        &self.requests
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "sending request");
        self.transport.send(request).await.inspect_err(|e| {
            warn!(code = e.error_code(), "transport failure: {e}");
        })
    }
}

#[async_trait]
impl DataProvider for PostgrestProvider {
    async fn get_list(&self, resource: &str, params: &GetListParams) -> Result<ListResult> {
        let key = self.requests.primary_key(resource);
        let response = self.send(self.requests.get_list(resource, params)?).await?;
        let total = total_count(&response)?;

        Ok(ListResult {
            data: records(&response, key)?,
            total,
        })
    }

    async fn get_one(&self, resource: &str, params: &GetOneParams) -> Result<OneResult> {
        let key = self.requests.primary_key(resource);
        let response = self.send(self.requests.get_one(resource, params)?).await?;

        Ok(OneResult {
            data: record(&response, key)?,
        })
    }

    async fn get_many(&self, resource: &str, params: &GetManyParams) -> Result<ManyResult> {
        let key = self.requests.primary_key(resource);
        let response = self.send(self.requests.get_many(resource, params)?).await?;

        Ok(ManyResult {
            data: records(&response, key)?,
        })
    }

    async fn get_many_reference(
        &self,
        resource: &str,
        params: &GetManyReferenceParams,
    ) -> Result<ListResult> {
        let key = self.requests.primary_key(resource);
        let response = self
            .send(self.requests.get_many_reference(resource, params)?)
            .await?;
        let total = total_count(&response)?;

        Ok(ListResult {
            data: records(&response, key)?,
            total,
        })
    }

    async fn create(&self, resource: &str, params: &CreateParams) -> Result<OneResult> {
        let key = self.requests.primary_key(resource);
        let response = self.send(self.requests.create(resource, params)?).await?;
        let created = raw_record(&response)?;

        let mut data = params.data.clone();
        data.insert(ID_FIELD.to_string(), encode(&created, key));

        Ok(OneResult { data })
    }

    async fn update(&self, resource: &str, params: &UpdateParams) -> Result<OneResult> {
        let key = self.requests.primary_key(resource);
        let response = self.send(self.requests.update(resource, params)?).await?;

        Ok(OneResult {
            data: record(&response, key)?,
        })
    }

    async fn update_many(&self, resource: &str, params: &UpdateManyParams) -> Result<ManyResult> {
        let key = self.requests.primary_key(resource);
        let response = self.send(self.requests.update_many(resource, params)?).await?;

        Ok(ManyResult {
            data: records(&response, key)?,
        })
    }

    async fn delete(&self, resource: &str, params: &DeleteParams) -> Result<OneResult> {
        let key = self.requests.primary_key(resource);
        let response = self.send(self.requests.delete(resource, params)?).await?;

        Ok(OneResult {
            data: record(&response, key)?,
        })
    }

    async fn delete_many(&self, resource: &str, params: &DeleteManyParams) -> Result<ManyResult> {
        let key = self.requests.primary_key(resource);
        let response = self.send(self.requests.delete_many(resource, params)?).await?;

        Ok(ManyResult {
            data: records(&response, key)?,
        })
    }
}
