//! Durable key-value storage for graph snapshots.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::graph::{ScanGraph, Snapshot};

pub const GRAPH_STATE_KEY: &str = "graphState";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("snapshot could not be encoded or decoded: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

pub trait Store {
    fn save(&self, key: &str, value: &str) -> PersistResult<()>;

    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn load(&self, key: &str) -> PersistResult<Option<String>>;
}

/// One JSON file per key inside a directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PersistResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> PersistError + '_ {
    move |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl Store for FileStore {
    fn save(&self, key: &str, value: &str) -> PersistResult<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;

        // Staged write; the rename swaps the previous snapshot out atomically.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(io_error(&staging))?;
        fs::rename(&staging, &path).map_err(io_error(&path))
    }

    fn load(&self, key: &str) -> PersistResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(io_error(&path)(error)),
        }
    }
}

pub fn save_graph(store: &dyn Store, graph: &ScanGraph) -> PersistResult<()> {
    let encoded = serde_json::to_string(&graph.snapshot())?;
    store.save(GRAPH_STATE_KEY, &encoded)
}

pub fn load_graph(store: &dyn Store) -> PersistResult<Option<ScanGraph>> {
    let Some(encoded) = store.load(GRAPH_STATE_KEY)? else {
        return Ok(None);
    };
    let snapshot: Snapshot = serde_json::from_str(&encoded)?;
    Ok(Some(ScanGraph::from_snapshot(snapshot)))
}
