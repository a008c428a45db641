/// Document store abstraction.
///
/// Documents are produced by the intake side (upload, OCR) and only read
/// here: the anchor service needs a document's backing file name and its
/// stored text to compute a content hash.
///
/// The intake pipeline keeps its records in `documents.json`, a JSON
/// object mapping document id → record.
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LedgerError, Result};

/// A stored document record. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    /// Name of the uploaded file inside the upload directory.
    pub filename: Option<String>,
    /// Extracted text (plain text, parsed document or OCR output).
    pub content: Option<String>,
    pub created_at: Option<String>,
    pub pages: Option<u32>,
    pub text_length: Option<u64>,
    pub file_path: Option<String>,
    /// e.g. `ocr_image` for OCR-derived records.
    pub source_type: Option<String>,
    pub ocr_confidence: Option<f64>,
}

impl Document {
    /// A text-only record with no backing file.
    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

/// Trait for document lookups.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id. `None` if it does not exist.
    async fn get(&self, document_id: &str) -> Result<Option<Document>>;

    /// All documents, ordered by id.
    async fn list(&self) -> Result<Vec<Document>>;
}

/// Reads the intake pipeline's `documents.json` on every call.
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    path: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, Document>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Document store file absent");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(LedgerError::Io(e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            LedgerError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    async fn get(&self, document_id: &str) -> Result<Option<Document>> {
        Ok(self.read_all().await?.remove(document_id))
    }

    async fn list(&self) -> Result<Vec<Document>> {
        Ok(self.read_all().await?.into_values().collect())
    }
}

/// In-process document store, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<BTreeMap<String, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, doc: Document) {
        self.docs
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(doc.id.clone(), doc);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, document_id: &str) -> Result<Option<Document>> {
        let docs = self.docs.read().unwrap_or_else(|p| p.into_inner());
        Ok(docs.get(document_id).cloned())
    }

    async fn list(&self) -> Result<Vec<Document>> {
        let docs = self.docs.read().unwrap_or_else(|p| p.into_inner());
        Ok(docs.values().cloned().collect())
    }
}
