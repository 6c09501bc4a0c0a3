use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A GraphQL response as returned by an adapter.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct RawResponse {
    #[serde(default)]
    pub data: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<ResponseError>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extensions: Map<String, Value>,
}

impl RawResponse {
    pub fn from_data(data: Value) -> Self {
        RawResponse {
            data,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ResponseError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "null_as_default")]
    pub path: Vec<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty", deserialize_with = "null_as_default")]
    pub extensions: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// The result of an operation call.
///
/// GraphQL errors don't fail the call: they're available through [`Response::errors`], next to
/// whatever partial data the server returned.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    operation_name: String,
    raw: RawResponse,
}

impl Response {
    pub(crate) fn new(operation_name: String, raw: RawResponse) -> Self {
        Response { operation_name, raw }
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn data(&self) -> &Value {
        &self.raw.data
    }

    pub fn errors(&self) -> &[ResponseError] {
        &self.raw.errors
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.raw.extensions
    }

    pub fn is_ok(&self) -> bool {
        self.raw.errors.is_empty()
    }

    /// Deserializes the `data` member.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.raw.data)
    }

    pub fn into_raw(self) -> RawResponse {
        self.raw
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
