use std::sync::{Arc, PoisonError, RwLock};

use crate::{RawResponse, RequestRecord, Variables};

/// A canned response for the calls of an operation.
#[derive(Clone, Debug, PartialEq)]
pub struct StubRule {
    /// Canonical operation name, e.g. `Metaphysics__Artist`.
    pub operation_name: String,
    /// Entries the request's coerced variables must hold, `None` matching any variables.
    pub variables: Option<Variables>,
    pub fixture: String,
    pub response: RawResponse,
}

impl StubRule {
    pub fn matches(&self, request: &RequestRecord) -> bool {
        if self.operation_name != request.operation_name() {
            return false;
        }

        let Some(expected) = &self.variables else {
            return true;
        };

        expected
            .iter()
            .all(|(name, value)| request.variables().get(name) == Some(value))
    }
}

/// The stub rules of a test adapter, shared with the builders registering them.
#[derive(Clone, Debug, Default)]
pub struct StubTable {
    rules: Arc<RwLock<Vec<StubRule>>>,
}

impl StubTable {
    pub fn push(&self, rule: StubRule) {
        self.rules.write().unwrap_or_else(PoisonError::into_inner).push(rule);
    }

    /// The response of the first registered rule matching `request`.
    pub fn find(&self, request: &RequestRecord) -> Option<RawResponse> {
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);

        let rule = rules.iter().find(|rule| rule.matches(request))?;
        tracing::debug!(operation = request.operation_name(), fixture = %rule.fixture, "answering with a stub");

        Some(rule.response.clone())
    }

    pub fn len(&self) -> usize {
        self.rules.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.rules.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
