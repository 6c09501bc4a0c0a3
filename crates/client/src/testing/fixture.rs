use std::path::{Path, PathBuf};

use chrono::Datelike;
use graphql_operation_store::{client_directory, method_name};
use handlebars::Handlebars;
use serde_json::{json, Map, Value};

use crate::RawResponse;

const EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

#[derive(thiserror::Error, Debug)]
pub enum FixtureError {
    /// returned if no fixture file exists for the operation
    #[error("fixture file for {operation} not found, looked for {}", display_paths(.attempted))]
    FileNotFound {
        operation: String,
        attempted: Vec<PathBuf>,
    },
    /// returned if the fixture file has no fixture of that name
    #[error("fixture `{key}` not found in {}", .path.display())]
    KeyNotFound { path: PathBuf, key: String },
    /// returned if the fixture file can't be read
    #[error("could not read {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    /// returned if the fixture file isn't a valid template or uses an unknown placeholder
    #[error("could not render {}: {message}", .path.display())]
    Template { path: PathBuf, message: String },
    /// returned if the rendered fixture file isn't a mapping of fixture names to responses
    #[error("could not parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    /// returned if a fixture looks like a response but isn't one
    #[error("fixture `{key}` of {} is not a GraphQL response: {source}", .path.display())]
    InvalidPayload {
        path: PathBuf,
        key: String,
        source: serde_json::Error,
    },
    /// returned if the client's endpoint sends real requests
    #[error("the `{endpoint}` endpoint doesn't use the test adapter")]
    NotATestEndpoint { endpoint: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The rendered and parsed fixture file of an operation.
pub(super) struct FixtureFile {
    path: PathBuf,
    fixtures: Map<String, Value>,
}

impl FixtureFile {
    pub fn load(root: &Path, client: &str, operation: &str, operation_name: &str) -> Result<Self, FixtureError> {
        let stem = method_name(operation);
        let directories = [root.join(client_directory(client)), root.to_owned()];

        let found = directories.iter().find_map(|directory| {
            EXTENSIONS
                .iter()
                .map(|extension| directory.join(format!("{stem}.{extension}")))
                .find(|path| path.is_file())
        });

        let Some(path) = found else {
            return Err(FixtureError::FileNotFound {
                operation: operation_name.to_owned(),
                attempted: directories
                    .iter()
                    .map(|directory| directory.join(format!("{stem}.{{{}}}", EXTENSIONS.join(","))))
                    .collect(),
            });
        };

        tracing::debug!(path = %path.display(), "loading fixture file");

        let template = std::fs::read_to_string(&path).map_err(|source| FixtureError::Read {
            path: path.clone(),
            source,
        })?;

        let rendered = render(&template, client, operation_name).map_err(|message| FixtureError::Template {
            path: path.clone(),
            message,
        })?;

        let parsed = if path.extension().is_some_and(|extension| extension == "json") {
            serde_json::from_str::<Value>(&rendered).map_err(|error| error.to_string())
        } else {
            serde_yaml::from_str::<Value>(&rendered).map_err(|error| error.to_string())
        };

        match parsed {
            Ok(Value::Object(fixtures)) => Ok(FixtureFile { path, fixtures }),
            Ok(_) => Err(FixtureError::Parse {
                path,
                message: "expected a mapping of fixture names to responses".into(),
            }),
            Err(message) => Err(FixtureError::Parse { path, message }),
        }
    }

    pub fn response(&self, key: &str) -> Result<RawResponse, FixtureError> {
        let Some(fixture) = self.fixtures.get(key) else {
            return Err(FixtureError::KeyNotFound {
                path: self.path.clone(),
                key: key.to_owned(),
            });
        };

        let is_response = fixture
            .as_object()
            .is_some_and(|object| ["data", "errors", "extensions"].iter().any(|member| object.contains_key(*member)));

        if !is_response {
            return Ok(RawResponse::from_data(fixture.clone()));
        }

        serde_json::from_value(fixture.clone()).map_err(|source| FixtureError::InvalidPayload {
            path: self.path.clone(),
            key: key.to_owned(),
            source,
        })
    }
}

/// Renders a fixture template. Placeholders can only refer to `today`, `client` and `operation`.
fn render(template: &str, client: &str, operation_name: &str) -> Result<String, String> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);

    let today = chrono::Local::now().date_naive();

    let scope = json!({
        "today": {
            "date": format!("{:04}-{:02}-{:02}", today.year(), today.month(), today.day()),
            "year": today.year(),
            "month": today.month(),
            "day": today.day(),
        },
        "client": client,
        "operation": operation_name,
    });

    handlebars
        .render_template(template, &scope)
        .map_err(|error| error.to_string())
}
