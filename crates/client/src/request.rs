use std::sync::Arc;

use graphql_operation_store::OperationDocument;

use crate::{Context, Variables};

/// A request as handed to an adapter, after variable coercion and context merging.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestRecord {
    document: Arc<OperationDocument>,
    variables: Variables,
    context: Context,
}

impl RequestRecord {
    pub(crate) fn new(document: Arc<OperationDocument>, variables: Variables, context: Context) -> Self {
        RequestRecord {
            document,
            variables,
            context,
        }
    }

    pub fn operation_name(&self) -> &str {
        self.document.name()
    }

    pub fn document(&self) -> &OperationDocument {
        &self.document
    }

    pub fn query(&self) -> &str {
        self.document.to_query_string()
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn context(&self) -> &Context {
        &self.context
    }
}

/// The JSON body of a GraphQL request over HTTP.
#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Payload<'a> {
    query: &'a str,
    operation_name: &'a str,
    variables: &'a Variables,
}

impl<'a> From<&'a RequestRecord> for Payload<'a> {
    fn from(request: &'a RequestRecord) -> Self {
        Payload {
            query: request.query(),
            operation_name: request.operation_name(),
            variables: &request.variables,
        }
    }
}
