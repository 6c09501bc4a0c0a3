use std::{
    collections::HashMap,
    fmt,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use serde::{de::Error as _, Deserialize, Deserializer};
use url::Url;

use crate::{Adapter, AdapterKind, Context, Error, HttpAdapter, Schema, TestAdapter};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_POOL_SIZE: usize = 25;

/// How to reach an endpoint. Unset values take their defaults on registration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointOptions {
    pub url: Option<String>,
    pub adapter: AdapterKind,
    /// Either a number of seconds or a duration string such as `"1500ms"`.
    #[serde(deserialize_with = "deserialize_timeout")]
    pub timeout: Option<Duration>,
    pub pool_size: Option<usize>,
    /// An introspection result (`.json`) or SDL file.
    pub schema_path: Option<PathBuf>,
    /// The lowest precedence layer of the context of every call.
    pub default_context: Context,
}

impl EndpointOptions {
    pub fn http(url: impl Into<String>) -> Self {
        EndpointOptions {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn test() -> Self {
        EndpointOptions {
            adapter: AdapterKind::Test,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }

    #[must_use]
    pub fn with_schema_path(mut self, schema_path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(schema_path.into());
        self
    }

    #[must_use]
    pub fn with_default_context(mut self, default_context: Context) -> Self {
        self.default_context = default_context;
        self
    }
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Timeout {
        Seconds(u64),
        Text(String),
    }

    match Option::<Timeout>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Timeout::Seconds(seconds)) => Ok(Some(Duration::from_secs(seconds))),
        Some(Timeout::Text(text)) => duration_str::parse(&text).map(Some).map_err(D::Error::custom),
    }
}

/// A registered endpoint, with its adapter.
pub struct Endpoint {
    name: String,
    url: Option<Url>,
    timeout: Duration,
    pool_size: usize,
    schema_path: Option<PathBuf>,
    default_context: Context,
    adapter: Box<dyn Adapter>,
    schema: tokio::sync::Mutex<Option<Arc<Schema>>>,
}

impl Endpoint {
    fn new(name: String, options: EndpointOptions) -> Result<Self, Error> {
        let invalid = |reason: String| Error::InvalidEndpoint {
            name: name.clone(),
            reason,
        };

        let url = options
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(Url::parse)
            .transpose()
            .map_err(|error| invalid(format!("invalid url: {error}")))?;

        let timeout = options.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let pool_size = options.pool_size.unwrap_or(DEFAULT_POOL_SIZE);

        let adapter: Box<dyn Adapter> = match options.adapter {
            AdapterKind::Http => {
                let Some(url) = url.clone() else {
                    return Err(invalid("the http adapter requires a url".into()));
                };

                let adapter = HttpAdapter::new(&name, url, timeout, pool_size)
                    .map_err(|error| invalid(format!("could not build the http client: {error}")))?;

                Box::new(adapter)
            }
            AdapterKind::Test => Box::new(TestAdapter::default()),
        };

        Ok(Endpoint {
            name,
            url,
            timeout,
            pool_size,
            schema_path: options.schema_path,
            default_context: options.default_context,
            adapter,
            schema: Default::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn adapter_kind(&self) -> AdapterKind {
        self.adapter.kind()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn schema_path(&self) -> Option<&Path> {
        self.schema_path.as_deref()
    }

    pub fn default_context(&self) -> &Context {
        &self.default_context
    }

    pub fn adapter(&self) -> &dyn Adapter {
        self.adapter.as_ref()
    }

    /// The adapter, if this endpoint records requests rather than sending them.
    pub fn test_adapter(&self) -> Option<&TestAdapter> {
        self.adapter.as_test()
    }

    /// Loads the schema once, from the schema file if there's one and by introspection otherwise.
    pub async fn load_schema(&self) -> Result<Arc<Schema>, Error> {
        let mut cached = self.schema.lock().await;

        if let Some(schema) = cached.as_ref() {
            return Ok(schema.clone());
        }

        let schema = Arc::new(self.fetch_schema().await?);
        *cached = Some(schema.clone());

        Ok(schema)
    }

    /// Loads the schema again, replacing the cached one on success.
    pub async fn reload_schema(&self) -> Result<Arc<Schema>, Error> {
        let mut cached = self.schema.lock().await;

        let schema = Arc::new(self.fetch_schema().await?);
        *cached = Some(schema.clone());

        Ok(schema)
    }

    async fn fetch_schema(&self) -> Result<Schema, Error> {
        let schema = match &self.schema_path {
            Some(path) => Schema::from_path(path),
            None => Schema::introspect(&self.name, self.adapter(), &self.default_context).await,
        };

        schema.map_err(|source| Error::Schema {
            endpoint: self.name.clone(),
            source,
        })
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("adapter", &self.adapter.kind())
            .field("timeout", &self.timeout)
            .field("pool_size", &self.pool_size)
            .field("schema_path", &self.schema_path)
            .finish_non_exhaustive()
    }
}

/// Endpoints by name.
///
/// Clients look their endpoint up on every call, so re-registering a name takes effect on the next
/// call of every client using it.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: RwLock<HashMap<String, Arc<Endpoint>>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an endpoint, replacing any endpoint of the same name.
    pub fn register(&self, name: impl Into<String>, options: EndpointOptions) -> Result<Arc<Endpoint>, Error> {
        let name = name.into();
        let endpoint = Arc::new(Endpoint::new(name.clone(), options)?);

        tracing::debug!(endpoint = %name, adapter = ?endpoint.adapter_kind(), "registered endpoint");

        self.endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, endpoint.clone());

        Ok(endpoint)
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<Endpoint>, Error> {
        self.endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| Error::EndpointNotFound { name: name.to_owned() })
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.endpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names = self
            .endpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect::<Vec<_>>();

        names.sort();
        names
    }

    pub fn reset(&self) {
        self.endpoints.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
