//! Named provider operations, used by the CLI

use serde_json::Value;

use pgrest_common::error::{Error, Result};
use pgrest_common::types::{
    CreateParams, DeleteManyParams, DeleteParams, GetListParams, GetManyParams,
    GetManyReferenceParams, GetOneParams, HttpRequest, UpdateManyParams, UpdateParams,
};
use pgrest_query::RequestBuilder;

use crate::provider::DataProvider;

/// One provider call with its parameters
#[derive(Debug, Clone)]
pub enum Operation {
    GetList(GetListParams),
    GetOne(GetOneParams),
    GetMany(GetManyParams),
    GetManyReference(GetManyReferenceParams),
    Create(CreateParams),
    Update(UpdateParams),
    UpdateMany(UpdateManyParams),
    Delete(DeleteParams),
    DeleteMany(DeleteManyParams),
}

impl Operation {
    /// Parse parameters for the operation called `name` (`getList`, `getOne`, ...)
    ///
    /// # Errors
    /// Returns `InvalidQueryParam` for an unknown operation and `JsonError`
    /// if `params` does not fit the operation.
    pub fn from_json(name: &str, params: Value) -> Result<Self> {
        Ok(match name {
            "getList" => Self::GetList(serde_json::from_value(params)?),
            "getOne" => Self::GetOne(serde_json::from_value(params)?),
            "getMany" => Self::GetMany(serde_json::from_value(params)?),
            "getManyReference" => Self::GetManyReference(serde_json::from_value(params)?),
            "create" => Self::Create(serde_json::from_value(params)?),
            "update" => Self::Update(serde_json::from_value(params)?),
            "updateMany" => Self::UpdateMany(serde_json::from_value(params)?),
            "delete" => Self::Delete(serde_json::from_value(params)?),
            "deleteMany" => Self::DeleteMany(serde_json::from_value(params)?),
            other => {
                return Err(Error::InvalidQueryParam(format!(
                    "unknown operation '{other}'"
                )))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetList(_) => "getList",
            Self::GetOne(_) => "getOne",
            Self::GetMany(_) => "getMany",
            Self::GetManyReference(_) => "getManyReference",
            Self::Create(_) => "create",
            Self::Update(_) => "update",
            Self::UpdateMany(_) => "updateMany",
            Self::Delete(_) => "delete",
            Self::DeleteMany(_) => "deleteMany",
        }
    }

    /// The request this operation would send, without sending it
    ///
    /// # Errors
    /// Returns an error if the request cannot be built.
    pub fn request(&self, resource: &str, requests: &RequestBuilder) -> Result<HttpRequest> {
        match self {
            Self::GetList(p) => requests.get_list(resource, p),
            Self::GetOne(p) => requests.get_one(resource, p),
            Self::GetMany(p) => requests.get_many(resource, p),
            Self::GetManyReference(p) => requests.get_many_reference(resource, p),
            Self::Create(p) => requests.create(resource, p),
            Self::Update(p) => requests.update(resource, p),
            Self::UpdateMany(p) => requests.update_many(resource, p),
            Self::Delete(p) => requests.delete(resource, p),
            Self::DeleteMany(p) => requests.delete_many(resource, p),
        }
    }

    /// Run the operation and return its result as JSON
    ///
    /// # Errors
    /// Returns whatever the provider call fails with.
    pub async fn execute(&self, resource: &str, provider: &dyn DataProvider) -> Result<Value> {
        let value = match self {
            Self::GetList(p) => serde_json::to_value(provider.get_list(resource, p).await?)?,
            Self::GetOne(p) => serde_json::to_value(provider.get_one(resource, p).await?)?,
            Self::GetMany(p) => serde_json::to_value(provider.get_many(resource, p).await?)?,
            Self::GetManyReference(p) => {
                serde_json::to_value(provider.get_many_reference(resource, p).await?)?
            }
            Self::Create(p) => serde_json::to_value(provider.create(resource, p).await?)?,
            Self::Update(p) => serde_json::to_value(provider.update(resource, p).await?)?,
            Self::UpdateMany(p) => serde_json::to_value(provider.update_many(resource, p).await?)?,
            Self::Delete(p) => serde_json::to_value(provider.delete(resource, p).await?)?,
            Self::DeleteMany(p) => serde_json::to_value(provider.delete_many(resource, p).await?)?,
        };
        Ok(value)
    }
}
