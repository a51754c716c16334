use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stable identifier of an open document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub display_name: String,
    pub raw_text: String,
}

/// Everything the host persists: the open documents in tab order, and which one is active
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryState {
    pub documents: Vec<StoredDocument>,
    pub active: Option<DocumentId>,
}

impl LibraryState {
    pub fn get(&self, id: &DocumentId) -> Option<&StoredDocument> {
        self.documents.iter().find(|d| &d.id == id)
    }
}

pub trait DocumentStore {
    fn load(&self) -> Result<LibraryState, StoreError>;
    fn save(&self, state: &LibraryState) -> Result<(), StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn load(&self) -> Result<LibraryState, StoreError> {
        (**self).load()
    }

    fn save(&self, state: &LibraryState) -> Result<(), StoreError> {
        (**self).save(state)
    }
}

/// JSON file under the user's state directory
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    path: PathBuf,
}

impl FileDocumentStore {
    pub fn new() -> Self {
        let path = AppDirs::library_path().unwrap_or_else(|| PathBuf::from("glance_library.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for FileDocumentStore {
    /// A missing file is an empty library, not an error.
    fn load(&self) -> Result<LibraryState, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(LibraryState::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &LibraryState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(state)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Store that keeps the library in memory; used when persistence is off and in tests
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    state: RefCell<LibraryState>,
    saves: RefCell<usize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: LibraryState) -> Self {
        Self {
            state: RefCell::new(state),
            saves: RefCell::new(0),
        }
    }

    pub fn snapshot(&self) -> LibraryState {
        self.state.borrow().clone()
    }

    /// How many times `save` has been called
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self) -> Result<LibraryState, StoreError> {
        Ok(self.state.borrow().clone())
    }

    fn save(&self, state: &LibraryState) -> Result<(), StoreError> {
        *self.state.borrow_mut() = state.clone();
        *self.saves.borrow_mut() += 1;
        Ok(())
    }
}
