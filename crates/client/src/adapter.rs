mod http;

use std::time::Duration;

pub use self::{http::HttpAdapter, test::TestAdapter};
use crate::{RawResponse, RequestRecord};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterKind {
    #[default]
    #[serde(alias = "net_http")]
    Http,
    Test,
}

/// Sends requests to an endpoint.
#[async_trait::async_trait]
pub trait Adapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    async fn send(&self, request: &RequestRecord) -> Result<RawResponse, TransportError>;

    fn as_test(&self) -> Option<&TestAdapter> {
        None
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// returned if the endpoint didn't answer in time
    #[error("request to the `{endpoint}` endpoint timed out after {}ms", .timeout.as_millis())]
    Timeout { endpoint: String, timeout: Duration },
    /// returned if the request could not be sent or the response body read
    #[error("request to the `{endpoint}` endpoint failed: {source}")]
    Network { endpoint: String, source: reqwest::Error },
    /// returned if the endpoint answered with a non-success status
    #[error("the `{endpoint}` endpoint answered with status {status}: {body}")]
    Status {
        endpoint: String,
        status: ::http::StatusCode,
        body: String,
    },
    /// returned if the response body isn't a GraphQL response
    #[error("the `{endpoint}` endpoint answered with a malformed GraphQL response: {source}")]
    MalformedResponse {
        endpoint: String,
        source: serde_json::Error,
    },
    /// returned if a header of the context can't be sent
    #[error("header `{name}` can't be sent to the `{endpoint}` endpoint")]
    InvalidHeader { endpoint: String, name: String },
}
