//! Loads the GraphQL operations a client sends from `.graphql` files.
//!
//! Operations live in one file each, under `<search path>/<client>/<operation>.graphql`.
//! When resolved, the operation is renamed to `<Client>__<Operation>`, every fragment it
//! spreads (directly or transitively) is located, renamed the same way and appended after the
//! operation, and the result is printed back to a canonical query string. Resolved documents are
//! cached for the lifetime of the [`OperationStore`] until [`OperationStore::reset`] is called.

mod compose;
mod document;
mod error;
mod naming;
mod store;

pub use self::{
    document::{OperationDescriptor, OperationDocument, OperationKind, TypeRef, VariableDefinition},
    error::Error,
    naming::{canonical_name, client_directory, file_name, method_name, FILE_EXTENSION, NAME_SEPARATOR},
    store::OperationStore,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
