use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// returned if no search path holds a file for the requested operation
    #[error("Query {file_name} not found for operation {operation}, looked for {}", display_paths(.attempted))]
    DocumentNotFound {
        operation: String,
        file_name: String,
        attempted: Vec<PathBuf>,
    },

    /// returned if a document could not be read
    #[error("could not read {}\ncaused by: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    /// returned if a document is not valid GraphQL
    #[error("could not parse {}\ncaused by: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// returned if a document resolved as an operation only holds fragments
    #[error("{} does not define any operation", .path.display())]
    MissingOperation { path: PathBuf },

    /// returned if a document defines more than one operation
    #[error("{} defines more than one operation, only one operation per file is supported", .path.display())]
    MultipleOperations { path: PathBuf },

    /// returned if a spread fragment is not defined in the document nor in the client's directory
    #[error("fragment {fragment} spread in {} could not be found", .path.display())]
    FragmentNotFound { fragment: String, path: PathBuf },

    /// returned if a fragment spreads itself, directly or through other fragments
    #[error("fragment {fragment} spread in {} spreads itself", .path.display())]
    FragmentCycle { fragment: String, path: PathBuf },

    /// returned if a search path could not be traversed
    #[error("could not list GraphQL documents\ncaused by: {0}")]
    Walk(#[from] walkdir::Error),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
