use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use graphql_operation_store::OperationStore;

use crate::{testing::FixtureStubs, EndpointOptions, EndpointRegistry, Error};

/// Configuration of the operation store, the fixtures and the endpoints, usually read from a TOML
/// file.
///
/// ```toml
/// [operations]
/// search_paths = ["app/operations"]
///
/// [fixtures]
/// path = "tests/fixtures/responses"
///
/// [endpoints.metaphysics]
/// url = "https://metaphysics-production.artsy.net"
/// timeout = 10
/// pool_size = 25
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub operations: OperationsConfig,
    pub fixtures: FixturesConfig,
    /// Endpoints by name
    pub endpoints: BTreeMap<String, EndpointOptions>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationsConfig {
    /// Directories holding one sub-directory of `.graphql` files per client
    pub search_paths: Vec<PathBuf>,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        OperationsConfig {
            search_paths: vec![PathBuf::from("operations")],
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FixturesConfig {
    /// Root directory of the response fixtures
    pub path: PathBuf,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        FixturesConfig {
            path: PathBuf::from("tests/fixtures/responses"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// returned if the configuration file can't be read
    #[error("could not read the configuration file {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    /// returned if the configuration isn't valid TOML or has unknown settings
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml_str(input: &str) -> Result<Self, Error> {
        Ok(toml::from_str(input).map_err(ConfigError::Parse)?)
    }

    /// Reads a configuration file. Relative paths in it are resolved against its directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();

        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        let mut config = Self::from_toml_str(&input)?;

        if let Some(root) = path.parent() {
            config.resolve_relative_paths(root);
        }

        Ok(config)
    }

    pub fn operation_store(&self) -> OperationStore {
        OperationStore::new(self.operations.search_paths.iter().cloned())
    }

    /// A registry holding every configured endpoint.
    pub fn endpoint_registry(&self) -> Result<EndpointRegistry, Error> {
        let registry = EndpointRegistry::new();

        for (name, options) in &self.endpoints {
            registry.register(name, options.clone())?;
        }

        Ok(registry)
    }

    pub fn fixture_stubs(&self) -> FixtureStubs {
        FixtureStubs::new(self.fixtures.path.clone())
    }

    fn resolve_relative_paths(&mut self, root: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        };

        for path in &mut self.operations.search_paths {
            resolve(path);
        }

        resolve(&mut self.fixtures.path);

        for options in self.endpoints.values_mut() {
            if let Some(schema_path) = options.schema_path.as_mut() {
                resolve(schema_path);
            }
        }
    }
}
