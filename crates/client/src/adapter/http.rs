use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::Error as _;
use serde_json::Value;
use url::Url;

use super::{Adapter, AdapterKind, TransportError};
use crate::{request::Payload, Context, RawResponse, RequestRecord};

/// Posts requests as JSON to the endpoint's URL.
///
/// String, number and boolean members of the `headers` object of the merged context are sent as
/// HTTP headers.
pub struct HttpAdapter {
    endpoint: String,
    url: Url,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpAdapter {
    /// A zero `timeout` disables the deadline. `pool_size` bounds the idle connections kept per
    /// host, zero disables reuse.
    pub fn new(endpoint: impl Into<String>, url: Url, timeout: Duration, pool_size: usize) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(pool_size)
            .user_agent(concat!("grafbase-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpAdapter {
            endpoint: endpoint.into(),
            url,
            timeout,
            client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn headers(&self, context: &Context) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();

        let Some(Value::Object(entries)) = context.get("headers") else {
            return Ok(headers);
        };

        for (name, value) in entries {
            let value = match value {
                Value::String(value) => value.clone(),
                Value::Number(value) => value.to_string(),
                Value::Bool(value) => value.to_string(),
                _ => continue,
            };

            let invalid = || TransportError::InvalidHeader {
                endpoint: self.endpoint.clone(),
                name: name.clone(),
            };

            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let value = HeaderValue::from_str(&value).map_err(|_| invalid())?;

            headers.insert(name, value);
        }

        Ok(headers)
    }
}

#[async_trait::async_trait]
impl Adapter for HttpAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Http
    }

    async fn send(&self, request: &RequestRecord) -> Result<RawResponse, TransportError> {
        let headers = self.headers(request.context())?;

        let mut builder = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .headers(headers)
            .json(&Payload::from(request));

        if !self.timeout.is_zero() {
            builder = builder.timeout(self.timeout);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status();
            let body = response.bytes().await?;

            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = exchange.await.map_err(|source| {
            if source.is_timeout() {
                TransportError::Timeout {
                    endpoint: self.endpoint.clone(),
                    timeout: self.timeout,
                }
            } else {
                TransportError::Network {
                    endpoint: self.endpoint.clone(),
                    source,
                }
            }
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                endpoint: self.endpoint.clone(),
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let malformed = |source| TransportError::MalformedResponse {
            endpoint: self.endpoint.clone(),
            source,
        };

        let value: Value = serde_json::from_slice(&body).map_err(malformed)?;

        let is_graphql = value
            .as_object()
            .is_some_and(|object| object.contains_key("data") || object.contains_key("errors"));

        if !is_graphql {
            return Err(malformed(serde_json::Error::custom(
                "a graphql response needs a `data` or `errors` member",
            )));
        }

        serde_json::from_value(value).map_err(malformed)
    }
}
