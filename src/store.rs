//! Durable storage of saved decks.
//!
//! All decks live in a single JSON array, mirroring the browser tool that keeps them under one
//! local storage key. [`DeckRepository`] implements the record semantics on top of a
//! [`StorageBackend`], which only knows how to read and write that text:
//!
//! - [`FileBackend`]: a JSON file on disk, replaced atomically on every write.
//! - [`MemBackend`]: in memory, for tests.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::Utc;
use common::deck::Deck;
use log::{debug, error};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access deck storage")]
    Io(#[from] io::Error),
    #[error("could not encode or decode stored decks")]
    Serialization(#[from] serde_json::Error),
}

/// Saved decks, keyed by id.
pub trait DeckStore {
    /// All saved decks. Read failures are logged and result in an empty list.
    fn load_all(&self) -> Vec<Deck>;

    /// Create or update a deck record and return what was stored.
    ///
    /// A deck without id is assigned a new one and gets fresh timestamps. A deck with id replaces
    /// the stored record, keeping its creation time.
    fn save(&mut self, deck: &Deck) -> Result<Deck, StoreError>;

    /// Remove a deck. Unknown ids are ignored.
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Option<Deck> {
        self.load_all()
            .into_iter()
            .find(|deck| deck.id.as_deref() == Some(id))
    }
}

/// Raw storage for the serialized deck list.
pub trait StorageBackend {
    /// Stored text, or `None` if nothing was stored yet.
    fn read(&self) -> io::Result<Option<String>>;

    fn write(&mut self, contents: &str) -> io::Result<()>;
}

pub struct DeckRepository<B> {
    backend: B,
}

pub type FileStore = DeckRepository<FileBackend>;
pub type MemoryStore = DeckRepository<MemBackend>;

impl<B: StorageBackend> DeckRepository<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Read all records, failing on unreadable storage.
    ///
    /// Writes go through this, so a damaged file is never overwritten with a partial list.
    fn load(&self) -> Result<Vec<Deck>, StoreError> {
        match self.backend.read()? {
            Some(text) if !text.trim().is_empty() => Ok(serde_json::from_str(&text)?),
            _ => Ok(Vec::new()),
        }
    }

    fn store(&mut self, decks: &[Deck]) -> Result<(), StoreError> {
        let text = serde_json::to_string_pretty(decks)?;
        self.backend.write(&text)?;
        Ok(())
    }
}

impl<B: StorageBackend> DeckStore for DeckRepository<B> {
    fn load_all(&self) -> Vec<Deck> {
        self.load().unwrap_or_else(|err| {
            error!("Loading saved decks failed: {err}");
            Vec::new()
        })
    }

    fn save(&mut self, deck: &Deck) -> Result<Deck, StoreError> {
        let mut decks = self.load()?;
        let now = Utc::now();
        let mut record = deck.clone();
        record.updated_at = now;

        let existing = record.id.as_deref().and_then(|id| {
            decks
                .iter()
                .position(|stored| stored.id.as_deref() == Some(id))
        });

        match (existing, &record.id) {
            (Some(idx), _) => {
                record.created_at = decks[idx].created_at;
                decks[idx] = record.clone();
            }
            (None, Some(id)) => {
                debug!("Deck {id} is not stored yet, adding it");
                decks.push(record.clone());
            }
            (None, None) => {
                record.id = Some(Uuid::new_v4().to_string());
                record.created_at = now;
                decks.push(record.clone());
            }
        }

        self.store(&decks)?;
        Ok(record)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let mut decks = self.load()?;
        let count = decks.len();
        decks.retain(|deck| deck.id.as_deref() != Some(id));

        if decks.len() == count {
            debug!("Deck {id} not found, nothing to delete");
            return Ok(());
        }

        self.store(&decks)
    }
}

/// Decks stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Replace in one step so an interrupted write leaves the previous decks intact
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)
    }
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_backend(FileBackend::new(path))
    }
}

/// Decks kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemBackend {
    contents: Option<String>,
    read_only: bool,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
            read_only: false,
        }
    }

    /// Make writes fail, like a full storage quota.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl StorageBackend for MemBackend {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.contents.clone())
    }

    fn write(&mut self, contents: &str) -> io::Result<()> {
        if self.read_only {
            return Err(io::Error::new(
                io::ErrorKind::StorageFull,
                "storage quota exceeded",
            ));
        }

        self.contents = Some(contents.to_owned());
        Ok(())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_backend(MemBackend::new())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
