use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use once_cell::sync::OnceCell;
use walkdir::WalkDir;

use crate::{
    compose::{compose, FragmentLocator, Source},
    document::{OperationDescriptor, OperationDocument},
    naming::{canonical_name, client_directory, file_name, method_name, FILE_EXTENSION},
    Error, Result,
};

type DocumentCell = Arc<OnceCell<Arc<OperationDocument>>>;

/// Process-wide cache of the operations found under a set of search paths.
///
/// Concurrent first resolutions of the same operation load it only once: the loser waits for the
/// winner's result. Failures are not cached, a document added after a failed resolution is picked
/// up on the next call.
#[derive(Debug, Default)]
pub struct OperationStore {
    search_paths: Vec<PathBuf>,
    files: Mutex<Option<Arc<[PathBuf]>>>,
    documents: Mutex<HashMap<String, DocumentCell>>,
}

impl OperationStore {
    pub fn new<P: Into<PathBuf>>(search_paths: impl IntoIterator<Item = P>) -> Self {
        OperationStore {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
            files: Mutex::default(),
            documents: Mutex::default(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Every `.graphql` file under the search paths, search path by search path.
    ///
    /// Computed once, then cached until [`OperationStore::reset`].
    pub fn list_files(&self) -> Result<Arc<[PathBuf]>> {
        let mut files = lock(&self.files);

        if let Some(files) = files.as_ref() {
            return Ok(files.clone());
        }

        let mut found = Vec::new();

        for search_path in self.search_paths.iter().filter(|path| path.is_dir()) {
            for entry in WalkDir::new(search_path).sort_by_file_name() {
                let entry = entry?;

                let is_document = entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|extension| extension == FILE_EXTENSION);

                if is_document {
                    found.push(entry.into_path());
                }
            }
        }

        tracing::debug!(count = found.len(), "listed GraphQL documents");

        let found: Arc<[PathBuf]> = found.into();
        *files = Some(found.clone());

        Ok(found)
    }

    /// The file backing an operation of a client, if any.
    pub fn resolve_file_path(&self, client: &str, operation: &str) -> Option<PathBuf> {
        self.candidate_paths(client, operation)
            .into_iter()
            .find(|path| path.is_file())
    }

    /// Loads, composes and caches an operation.
    pub fn resolve(&self, client: &str, operation: &str) -> Result<Arc<OperationDocument>> {
        let name = canonical_name(client, operation);

        let cell = lock(&self.documents).entry(name.clone()).or_default().clone();

        cell.get_or_try_init(|| {
            let Some(path) = self.resolve_file_path(client, operation) else {
                return Err(Error::DocumentNotFound {
                    operation: name.clone(),
                    file_name: file_name(operation),
                    attempted: self.candidate_paths(client, operation),
                });
            };

            tracing::debug!(operation = %name, path = %path.display(), "loading GraphQL operation");

            self.load(client, &path).map(Arc::new)
        })
        .cloned()
    }

    /// Loads and composes the operation of `path`, bypassing the cache.
    pub fn load(&self, client: &str, path: &Path) -> Result<OperationDocument> {
        let operation = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        compose(client, &operation, Source::read(path)?, self)
    }

    /// Enumerates the operations of a client, skipping documents which only hold fragments.
    pub fn operations(&self, client: &str) -> Result<Vec<OperationDescriptor>> {
        let directory = client_directory(client);
        let mut descriptors: Vec<OperationDescriptor> = Vec::new();

        for path in self.list_files()?.iter() {
            let in_client_directory = path
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|parent| parent == directory.as_str());

            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            if !in_client_directory || descriptors.iter().any(|known| known.method_name == method_name(stem)) {
                continue;
            }

            match self.resolve(client, stem) {
                Ok(document) => descriptors.push(OperationDescriptor::new(method_name(stem), &document)),
                Err(Error::MissingOperation { .. }) => continue,
                Err(error) => return Err(error),
            }
        }

        Ok(descriptors)
    }

    /// Forgets the file list and every cached document.
    pub fn reset(&self) {
        lock(&self.files).take();
        lock(&self.documents).clear();
    }

    fn candidate_paths(&self, client: &str, operation: &str) -> Vec<PathBuf> {
        let directory = client_directory(client);
        let file_name = file_name(operation);

        self.search_paths
            .iter()
            .map(|search_path| search_path.join(&directory).join(&file_name))
            .collect()
    }
}

impl FragmentLocator for OperationStore {
    fn locate_fragment(&self, client: &str, name: &str, loaded: &[Source]) -> Result<Option<Source>> {
        let is_loaded = |path: &Path| loaded.iter().any(|source| source.path == path);

        // By convention the ArtistFragment fragment lives in artist_fragment.graphql.
        for path in self.candidate_paths(client, name) {
            if path.is_file() && !is_loaded(&path) {
                let source = Source::read(&path)?;

                if source.fragment(client, name).is_some() {
                    return Ok(Some(source));
                }
            }
        }

        let directory = client_directory(client);

        for path in self.list_files()?.iter() {
            let in_client_directory = path
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|parent| parent == directory.as_str());

            if !in_client_directory || is_loaded(path) {
                continue;
            }

            let source = Source::read(path)?;

            if source.fragment(client, name).is_some() {
                return Ok(Some(source));
            }
        }

        Ok(None)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
