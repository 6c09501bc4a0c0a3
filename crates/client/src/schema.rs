use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use graphql_operation_store::OperationDocument;
use serde_json::Value;

use crate::{Adapter, Context, RequestRecord, TransportError, Variables};

pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType { kind name }
            }
          }
        }
      }
    }
  }
}
"#;

/// The schema of an endpoint, as loaded from its schema file or from the endpoint itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Schema {
    /// The `__schema` object of an introspection result.
    Introspection(Value),
    /// A schema in SDL.
    Sdl(String),
}

#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    /// returned if the schema file can't be read
    #[error("could not read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    /// returned if a `.json` schema file isn't JSON
    #[error("{} is not valid JSON: {source}", .path.display())]
    Json { path: PathBuf, source: serde_json::Error },
    /// returned if a schema file isn't valid SDL
    #[error("{} is not a valid schema: {message}", .path.display())]
    Sdl { path: PathBuf, message: String },
    /// returned if an introspection result has no `__schema` object
    #[error("the introspection result of {origin} has no __schema")]
    MissingSchema { origin: String },
    /// returned if the introspection query can't be prepared
    #[error(transparent)]
    Document(#[from] graphql_operation_store::Error),
    /// returned if the introspection query could not be sent
    #[error("introspection failed: {0}")]
    Transport(#[from] TransportError),
    /// returned if the endpoint answered the introspection query with errors
    #[error("introspection failed: {}", .0.join(", "))]
    Introspection(Vec<String>),
}

impl Schema {
    /// Loads a schema file: an introspection result if its extension is `.json`, SDL otherwise.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_owned(),
            source,
        })?;

        if path.extension().is_some_and(|extension| extension == "json") {
            let value: Value = serde_json::from_str(&text).map_err(|source| SchemaError::Json {
                path: path.to_owned(),
                source,
            })?;

            return Self::from_introspection(value, || path.display().to_string());
        }

        cynic_parser::parse_type_system_document(&text).map_err(|error| SchemaError::Sdl {
            path: path.to_owned(),
            message: error.to_string(),
        })?;

        Ok(Schema::Sdl(text))
    }

    /// Accepts a full response as well as its `data` member.
    fn from_introspection(mut value: Value, origin: impl FnOnce() -> String) -> Result<Self, SchemaError> {
        if let Some(data) = value.get_mut("data") {
            value = data.take();
        }

        match value.get_mut("__schema").map(Value::take) {
            Some(schema @ Value::Object(_)) => Ok(Schema::Introspection(schema)),
            _ => Err(SchemaError::MissingSchema { origin: origin() }),
        }
    }

    /// Sends the introspection query through an adapter.
    pub(crate) async fn introspect(
        endpoint: &str,
        adapter: &dyn Adapter,
        context: &Context,
    ) -> Result<Self, SchemaError> {
        let document = OperationDocument::from_source(endpoint, "introspection", INTROSPECTION_QUERY)?;
        let request = RequestRecord::new(Arc::new(document), Variables::new(), context.clone());

        tracing::debug!(endpoint, "introspecting schema");

        let response = adapter.send(&request).await?;

        if !response.errors.is_empty() {
            return Err(SchemaError::Introspection(
                response.errors.into_iter().map(|error| error.message).collect(),
            ));
        }

        Self::from_introspection(response.data, || format!("the `{endpoint}` endpoint"))
    }

    pub fn as_introspection(&self) -> Option<&Value> {
        match self {
            Schema::Introspection(schema) => Some(schema),
            Schema::Sdl(_) => None,
        }
    }

    pub fn as_sdl(&self) -> Option<&str> {
        match self {
            Schema::Sdl(sdl) => Some(sdl),
            Schema::Introspection(_) => None,
        }
    }

    /// The name of the query root, when known.
    pub fn query_type(&self) -> Option<&str> {
        self.as_introspection()?.get("queryType")?.get("name")?.as_str()
    }
}
