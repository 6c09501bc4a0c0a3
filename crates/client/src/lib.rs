//! GraphQL clients bound to `.graphql` documents.
//!
//! A [`Client`] sends the operations found in its directory of the [`OperationStore`] to an
//! [`Endpoint`] of the [`EndpointRegistry`]. Each call goes through the same pipeline: the
//! operation is resolved, its variables coerced to their declared types, the endpoint, client and
//! call contexts are merged, the before hooks run, the endpoint's [`Adapter`] dispatches the
//! request, the after hooks run and the result is wrapped into a [`Response`].
//!
//! Endpoints using the [`TestAdapter`] never perform any I/O: they record every request and answer
//! with the canned responses registered through [`testing::FixtureStubs`].

mod adapter;
mod client;
mod config;
mod context;
mod endpoint;
mod error;
mod hooks;
mod pipeline;
mod request;
mod response;
mod schema;
pub mod testing;
mod variables;

pub use graphql_operation_store::{OperationDescriptor, OperationDocument, OperationKind, OperationStore};

pub use self::{
    adapter::{Adapter, AdapterKind, HttpAdapter, TestAdapter, TransportError},
    client::{Client, ClientBuilder, OperationCall},
    config::{Config, ConfigError, FixturesConfig, OperationsConfig},
    context::{merge, Context},
    endpoint::{Endpoint, EndpointOptions, EndpointRegistry, DEFAULT_POOL_SIZE, DEFAULT_TIMEOUT},
    error::Error,
    hooks::{AfterExecute, BeforeExecute, HookError, HookResult, Hooks},
    pipeline::Stage,
    request::RequestRecord,
    response::{Location, RawResponse, Response, ResponseError},
    schema::{Schema, SchemaError, INTROSPECTION_QUERY},
    variables::{VariableError, Variables},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
