use std::{fmt, sync::Arc};

use tracing::Instrument;

use crate::{
    client::Client,
    context::merge,
    hooks::{AfterExecute, BeforeExecute},
    variables::coerce,
    Context, Error, RequestRecord, Response, Variables,
};

/// The steps of an operation call, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Resolving,
    ContextMerging,
    BeforeHooks,
    Dispatching,
    AfterHooks,
    Completed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Resolving => "resolving",
            Stage::ContextMerging => "context merging",
            Stage::BeforeHooks => "before hooks",
            Stage::Dispatching => "dispatching",
            Stage::AfterHooks => "after hooks",
            Stage::Completed => "completed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) async fn execute(
    client: &Client,
    operation: &str,
    variables: &Variables,
    call_context: &Context,
) -> Result<Response, Error> {
    let span = tracing::info_span!(
        "graphql-operation",
        client = client.name(),
        endpoint = client.endpoint_name(),
        operation
    );

    run(client, operation, variables, call_context).instrument(span).await
}

async fn run(client: &Client, operation: &str, variables: &Variables, call_context: &Context) -> Result<Response, Error> {
    tracing::trace!(stage = %Stage::Resolving);
    let document = client.document(operation)?;
    let variables = coerce(&document, variables)?;

    tracing::trace!(stage = %Stage::ContextMerging);
    let endpoint = client.endpoint()?;
    let context = merge(
        std::iter::once(endpoint.default_context())
            .chain(client.context_layers())
            .chain(std::iter::once(call_context)),
    );

    let request = RequestRecord::new(Arc::clone(&document), variables, context);
    let operation_name = request.operation_name().to_owned();

    tracing::trace!(stage = %Stage::BeforeHooks);
    let before = BeforeExecute {
        document: request.document(),
        operation_name: &operation_name,
        variables: request.variables(),
        context: request.context(),
    };
    client
        .hooks()
        .run_before(&before)
        .map_err(|(index, source)| Error::Hook {
            operation: operation_name.clone(),
            stage: Stage::BeforeHooks,
            index,
            source,
        })?;

    tracing::trace!(stage = %Stage::Dispatching);
    let raw = endpoint.adapter().send(&request).await.map_err(|source| {
        tracing::warn!("operation {operation_name} failed: {source}");

        Error::Transport {
            operation: operation_name.clone(),
            source,
        }
    })?;

    tracing::trace!(stage = %Stage::AfterHooks);
    let after = AfterExecute {
        operation_name: &operation_name,
        data: &raw.data,
        errors: &raw.errors,
        extensions: &raw.extensions,
    };
    client
        .hooks()
        .run_after(&after)
        .map_err(|(index, source)| Error::Hook {
            operation: operation_name.clone(),
            stage: Stage::AfterHooks,
            index,
            source,
        })?;

    tracing::debug!(stage = %Stage::Completed, errors = raw.errors.len(), "operation completed");

    Ok(Response::new(operation_name, raw))
}
