use crate::{
    testing::FixtureError, ConfigError, HookError, SchemaError, Stage, TransportError, VariableError,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// returned if the operation document can't be found, read or composed
    #[error(transparent)]
    Document(#[from] graphql_operation_store::Error),
    /// returned if no endpoint is registered under the name
    #[error("endpoint `{name}` is not registered")]
    EndpointNotFound { name: String },
    /// returned if an endpoint can't be registered with the given options
    #[error("endpoint `{name}` is invalid: {reason}")]
    InvalidEndpoint { name: String, reason: String },
    /// returned if the adapter could not deliver the request or read the response
    #[error("operation {operation} failed\ncaused by: {source}")]
    Transport {
        operation: String,
        source: TransportError,
    },
    /// returned if the supplied variables don't match the operation's declarations
    #[error(transparent)]
    Variable(#[from] VariableError),
    /// returned if a fixture stub can't be set up
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    /// returned if a before or after hook failed
    #[error("hook #{index} of {operation} failed during {stage}\ncaused by: {source}")]
    Hook {
        operation: String,
        stage: Stage,
        index: usize,
        source: HookError,
    },
    /// returned if the schema of an endpoint can't be loaded
    #[error("could not load the schema of the `{endpoint}` endpoint\ncaused by: {source}")]
    Schema { endpoint: String, source: SchemaError },
    /// returned if the configuration can't be read
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn is_document_not_found(&self) -> bool {
        matches!(
            self,
            Error::Document(graphql_operation_store::Error::DocumentNotFound { .. })
        )
    }

    pub fn is_fixture_not_found(&self) -> bool {
        matches!(
            self,
            Error::Fixture(FixtureError::FileNotFound { .. } | FixtureError::KeyNotFound { .. })
        )
    }
}
