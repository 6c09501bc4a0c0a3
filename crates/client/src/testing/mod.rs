//! Canned responses for clients whose endpoint uses the [`TestAdapter`](crate::TestAdapter).
//!
//! Fixture files live under a root directory, in the client's own sub-directory or in the root
//! itself, and are named after the operation: `metaphysics/artist.yml` or `artist.json` for the
//! `artist` operation of `Metaphysics`. A fixture file maps fixture names to responses. A response
//! holding a `data`, `errors` or `extensions` member is used as is, anything else is taken as the
//! `data` member.
//!
//! ```yaml
//! yayoi_kusama:
//!   data:
//!     artist:
//!       name: Yayoi Kusama
//!       birthday: "{{today.year}}/03/22"
//! ```
//!
//! Fixture files are rendered with handlebars before being parsed, with `today`, `client` and
//! `operation` in scope.

mod fixture;
mod stub;

use std::path::{Path, PathBuf};

use graphql_operation_store::canonical_name;

pub use self::{
    fixture::FixtureError,
    stub::{StubRule, StubTable},
};
use crate::{variables::coerce_subset, Client, Error, Variables};

/// Registers fixture responses on the test adapter of a client's endpoint.
#[derive(Clone, Debug)]
pub struct FixtureStubs {
    root: PathBuf,
}

impl FixtureStubs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FixtureStubs { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stubs every call of `operation`, whatever its variables.
    pub fn stub<'a>(&self, client: &'a Client, operation: &str) -> Result<StubBuilder<'a>, Error> {
        self.builder(client, operation, None)
    }

    /// Stubs the calls of `operation` whose variables hold every entry of `variables`.
    ///
    /// `variables` are coerced like the variables of a call, so `{"id": 1}` matches an `ID!`
    /// variable sent as `"1"`.
    pub fn stub_matching<'a>(
        &self,
        client: &'a Client,
        operation: &str,
        variables: Variables,
    ) -> Result<StubBuilder<'a>, Error> {
        self.builder(client, operation, Some(variables))
    }

    /// Removes the stubs and the recorded requests of the client's endpoint.
    pub fn clear(&self, client: &Client) -> Result<(), Error> {
        let endpoint = client.endpoint()?;
        let adapter = endpoint.test_adapter().ok_or_else(|| FixtureError::NotATestEndpoint {
            endpoint: endpoint.name().to_owned(),
        })?;

        adapter.stubs().clear();
        adapter.clear_requests();

        Ok(())
    }

    fn builder<'a>(
        &self,
        client: &'a Client,
        operation: &str,
        variables: Option<Variables>,
    ) -> Result<StubBuilder<'a>, Error> {
        let endpoint = client.endpoint()?;

        let Some(adapter) = endpoint.test_adapter() else {
            return Err(FixtureError::NotATestEndpoint {
                endpoint: endpoint.name().to_owned(),
            }
            .into());
        };

        let variables = match variables {
            Some(variables) => Some(coerce_subset(&*client.document(operation)?, &variables)?),
            None => None,
        };

        let operation_name = canonical_name(client.name(), operation);
        let fixtures = fixture::FixtureFile::load(&self.root, client.name(), operation, &operation_name)?;

        Ok(StubBuilder {
            client,
            operation_name,
            variables,
            fixtures,
            table: adapter.stubs().clone(),
        })
    }
}

/// A stub waiting for the fixture it answers with.
#[must_use = "nothing is stubbed until `returns` is called"]
pub struct StubBuilder<'a> {
    client: &'a Client,
    operation_name: String,
    variables: Option<Variables>,
    fixtures: fixture::FixtureFile,
    table: StubTable,
}

impl StubBuilder<'_> {
    /// Answers the matching calls with the fixture named `key`.
    ///
    /// Rules are tried in registration order, so an earlier rule shadows later ones matching the
    /// same calls.
    pub fn returns(self, key: &str) -> Result<(), Error> {
        let response = self.fixtures.response(key)?;

        tracing::debug!(
            client = self.client.name(),
            operation = %self.operation_name,
            fixture = key,
            "stubbed operation"
        );

        self.table.push(StubRule {
            operation_name: self.operation_name,
            variables: self.variables,
            fixture: key.to_owned(),
            response,
        });

        Ok(())
    }
}
