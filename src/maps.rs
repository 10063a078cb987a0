//! Pre-rendered map documents shown in the dashboard's embedded frame.
//!
//! The documents are produced elsewhere; this module only resolves a
//! selector value to a file and hands back its bytes unchanged.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::error::MapError;

/// One selectable map: display label and file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapDocument {
    pub label: &'static str,
    pub file_name: &'static str,
}

pub static MAP_DOCUMENTS: [MapDocument; 6] = [
    MapDocument { label: "Slight", file_name: "map_uk.html" },
    MapDocument { label: "Fatal", file_name: "map_fatal.html" },
    MapDocument { label: "LSOA", file_name: "map_lsoa.html" },
    MapDocument { label: "Police Dep.", file_name: "map_police.html" },
    MapDocument { label: "Streets horizontally", file_name: "map_str_hor.html" },
    MapDocument { label: "Streets vertically", file_name: "map_str_ver.html" },
];

pub const DEFAULT_MAP: &str = "map_uk.html";

/// Looks a selector value up in [`MAP_DOCUMENTS`].
pub fn find_document(name: &str) -> Result<&'static MapDocument, MapError> {
    MAP_DOCUMENTS
        .iter()
        .find(|doc| doc.file_name == name)
        .ok_or_else(|| MapError::UnknownDocument(name.to_string()))
}

/// Source of map document contents.
#[async_trait]
pub trait MapStore: Send + Sync {
    /// Returns the raw bytes of the named document.
    async fn read(&self, name: &str) -> Result<Bytes, MapError>;
}

/// Reads map documents from a directory on disk.
pub struct FsMapStore {
    root: PathBuf,
}

impl FsMapStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl MapStore for FsMapStore {
    async fn read(&self, name: &str) -> Result<Bytes, MapError> {
        let doc = find_document(name)?;
        let path = self.root.join(doc.file_name);

        match tokio::fs::read(&path).await {
            Ok(contents) => {
                debug!(path = %path.display(), bytes = contents.len(), "Map document read");
                Ok(Bytes::from(contents))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MapError::FileNotFound(path)),
            Err(source) => Err(MapError::Io { path, source }),
        }
    }
}

/// Map documents held in memory, keyed by file name.
#[derive(Default)]
pub struct InMemoryMapStore {
    documents: HashMap<String, Bytes>,
}

impl InMemoryMapStore {
    pub fn with_document(mut self, name: &str, contents: impl Into<Bytes>) -> Self {
        self.documents.insert(name.to_string(), contents.into());
        self
    }
}

#[async_trait]
impl MapStore for InMemoryMapStore {
    async fn read(&self, name: &str) -> Result<Bytes, MapError> {
        let doc = find_document(name)?;
        self.documents
            .get(doc.file_name)
            .cloned()
            .ok_or_else(|| MapError::FileNotFound(PathBuf::from(doc.file_name)))
    }
}
