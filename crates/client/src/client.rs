use std::{
    fmt,
    future::{Future, IntoFuture},
    pin::Pin,
    sync::Arc,
};

use graphql_operation_store::{OperationDescriptor, OperationDocument, OperationStore};
use serde_json::Value;

use crate::{
    hooks::{AfterExecute, BeforeExecute, HookResult, Hooks},
    pipeline, Context, Endpoint, EndpointRegistry, Error, Response, Variables,
};

/// A named GraphQL client.
///
/// Its operations live in the directory named after the client in the operation store, e.g.
/// `metaphysics/artist.graphql` for the `artist` operation of `Metaphysics`.
///
/// Cloning a client is cheap, and clones made through [`Client::with_context`] share everything
/// but their extra context layer.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    layers: Vec<Arc<Context>>,
}

struct ClientInner {
    name: String,
    endpoint: String,
    store: Arc<OperationStore>,
    registry: Arc<EndpointRegistry>,
    default_context: Context,
    hooks: Hooks,
}

pub struct ClientBuilder {
    name: String,
    endpoint: String,
    store: Arc<OperationStore>,
    registry: Arc<EndpointRegistry>,
    default_context: Context,
    hooks: Hooks,
}

impl ClientBuilder {
    /// The context of every call, above the endpoint's default context.
    #[must_use]
    pub fn default_context(mut self, context: Context) -> Self {
        self.default_context = context;
        self
    }

    #[must_use]
    pub fn before_execute(mut self, hook: impl Fn(&BeforeExecute<'_>) -> HookResult + Send + Sync + 'static) -> Self {
        self.hooks.before_execute(hook);
        self
    }

    #[must_use]
    pub fn after_execute(mut self, hook: impl Fn(&AfterExecute<'_>) -> HookResult + Send + Sync + 'static) -> Self {
        self.hooks.after_execute(hook);
        self
    }

    pub fn build(self) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                name: self.name,
                endpoint: self.endpoint,
                store: self.store,
                registry: self.registry,
                default_context: self.default_context,
                hooks: self.hooks,
            }),
            layers: Vec::new(),
        }
    }
}

impl Client {
    pub fn builder(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        store: Arc<OperationStore>,
        registry: Arc<EndpointRegistry>,
    ) -> ClientBuilder {
        ClientBuilder {
            name: name.into(),
            endpoint: endpoint.into(),
            store,
            registry,
            default_context: Context::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn endpoint_name(&self) -> &str {
        &self.inner.endpoint
    }

    /// The endpoint currently registered under the client's endpoint name.
    pub fn endpoint(&self) -> Result<Arc<Endpoint>, Error> {
        self.inner.registry.lookup(&self.inner.endpoint)
    }

    pub fn store(&self) -> &Arc<OperationStore> {
        &self.inner.store
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.inner.registry
    }

    pub fn default_context(&self) -> &Context {
        &self.inner.default_context
    }

    pub(crate) fn hooks(&self) -> &Hooks {
        &self.inner.hooks
    }

    /// The client's default context followed by its `with_context` layers, oldest first.
    pub(crate) fn context_layers(&self) -> impl Iterator<Item = &Context> {
        std::iter::once(&self.inner.default_context).chain(self.layers.iter().map(AsRef::as_ref))
    }

    /// A client whose calls carry `context` on top of this client's contexts.
    ///
    /// The original client is left untouched.
    #[must_use]
    pub fn with_context(&self, context: Context) -> Client {
        let mut layers = self.layers.clone();
        layers.push(Arc::new(context));

        Client {
            inner: self.inner.clone(),
            layers,
        }
    }

    /// The resolved document of an operation, e.g. `artist` or `Artist`.
    pub fn document(&self, operation: &str) -> Result<Arc<OperationDocument>, Error> {
        Ok(self.inner.store.resolve(&self.inner.name, operation)?)
    }

    /// Every operation available to this client.
    pub fn operations(&self) -> Result<Vec<OperationDescriptor>, Error> {
        Ok(self.inner.store.operations(&self.inner.name)?)
    }

    /// Starts a call, to be awaited once its variables and context are set.
    pub fn operation(&self, name: impl Into<String>) -> OperationCall<'_> {
        OperationCall {
            client: self,
            operation: name.into(),
            variables: Variables::new(),
            context: Context::new(),
        }
    }

    pub async fn execute(&self, operation: &str, variables: Variables) -> Result<Response, Error> {
        self.operation(operation).variables(variables).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("name", &self.inner.name)
            .field("endpoint", &self.inner.endpoint)
            .field("default_context", &self.inner.default_context)
            .field("layers", &self.layers)
            .field("hooks", &self.inner.hooks)
            .finish()
    }
}

/// An operation call being prepared.
#[must_use = "an operation call does nothing until awaited"]
pub struct OperationCall<'a> {
    client: &'a Client,
    operation: String,
    variables: Variables,
    context: Context,
}

impl OperationCall<'_> {
    /// Replaces all variables.
    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// The highest precedence context layer of this call.
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

impl<'a> IntoFuture for OperationCall<'a> {
    type Output = Result<Response, Error>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { pipeline::execute(self.client, &self.operation, &self.variables, &self.context).await })
    }
}
