use std::{fmt, sync::Arc};

use graphql_operation_store::OperationDocument;
use serde_json::{Map, Value};

use crate::{Context, ResponseError, Variables};

pub type HookError = Box<dyn std::error::Error + Send + Sync>;

pub type HookResult = Result<(), HookError>;

/// What a before hook observes, right before the request is dispatched.
#[derive(Clone, Copy, Debug)]
pub struct BeforeExecute<'a> {
    pub document: &'a OperationDocument,
    pub operation_name: &'a str,
    pub variables: &'a Variables,
    pub context: &'a Context,
}

/// What an after hook observes, once the adapter returned.
#[derive(Clone, Copy, Debug)]
pub struct AfterExecute<'a> {
    pub operation_name: &'a str,
    pub data: &'a Value,
    pub errors: &'a [ResponseError],
    pub extensions: &'a Map<String, Value>,
}

type BeforeExecuteHook = Arc<dyn Fn(&BeforeExecute<'_>) -> HookResult + Send + Sync>;
type AfterExecuteHook = Arc<dyn Fn(&AfterExecute<'_>) -> HookResult + Send + Sync>;

/// Observers of a client's calls, run in registration order.
///
/// A failing hook aborts the call: the hooks registered after it don't run.
#[derive(Clone, Default)]
pub struct Hooks {
    before: Vec<BeforeExecuteHook>,
    after: Vec<AfterExecuteHook>,
}

impl Hooks {
    pub fn before_execute(&mut self, hook: impl Fn(&BeforeExecute<'_>) -> HookResult + Send + Sync + 'static) {
        self.before.push(Arc::new(hook));
    }

    pub fn after_execute(&mut self, hook: impl Fn(&AfterExecute<'_>) -> HookResult + Send + Sync + 'static) {
        self.after.push(Arc::new(hook));
    }

    /// On failure, returns the index of the failing hook with its error.
    pub(crate) fn run_before(&self, event: &BeforeExecute<'_>) -> Result<(), (usize, HookError)> {
        for (index, hook) in self.before.iter().enumerate() {
            hook(event).map_err(|error| (index, error))?;
        }

        Ok(())
    }

    pub(crate) fn run_after(&self, event: &AfterExecute<'_>) -> Result<(), (usize, HookError)> {
        for (index, hook) in self.after.iter().enumerate() {
            hook(event).map_err(|error| (index, error))?;
        }

        Ok(())
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}
