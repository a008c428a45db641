/// Anchoring: record a document's content hash into the integrity ledger.
///
/// ```text
/// document_id ──▶ DocumentStore ──▶ HashSource ──▶ SHA-256 ──▶ Chain::append
///                                   (file | text)
/// ```
///
/// The content hash prefers the uploaded file. Documents that are OCR
/// results or text-only may have no retained file; those are hashed over
/// the stored text instead. Re-anchoring a document appends a new block.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::crypto::hash;
use crate::documents::{Document, DocumentStore};
use crate::error::{LedgerError, Result};
use crate::ledger::{Block, Chain, ChainReport};

/// Block payload for an anchoring event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPayload {
    pub document_id: String,
    pub content_hash: String,
}

/// Where a document's content hash is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashSource {
    /// The uploaded file on disk.
    File(PathBuf),
    /// The stored text content, hashed as UTF-8.
    Content(String),
}

impl HashSource {
    /// Pick the file when it is present on disk, otherwise the stored text.
    pub async fn resolve(doc: &Document, upload_dir: &Path) -> Self {
        // Only the final path component is trusted.
        let candidate = doc
            .filename
            .as_deref()
            .and_then(|name| Path::new(name).file_name())
            .map(|name| upload_dir.join(name));

        if let Some(path) = candidate {
            if let Ok(meta) = tokio::fs::metadata(&path).await {
                if meta.is_file() {
                    return HashSource::File(path);
                }
            }
        }
        HashSource::Content(doc.content.clone().unwrap_or_default())
    }

    /// Compute the hex digest. Blocking for the file variant.
    pub fn digest(&self) -> Result<String> {
        match self {
            HashSource::File(path) => hash::hash_file(path),
            HashSource::Content(text) => Ok(hash::hash_text(text)),
        }
    }
}

/// Anchoring history for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProofSet {
    pub anchored: bool,
    pub entries: Vec<Block>,
}

/// Use-case layer over the document store and the chain.
#[derive(Clone)]
pub struct AnchorService {
    documents: Arc<dyn DocumentStore>,
    chain: Arc<Chain>,
    upload_dir: PathBuf,
}

impl AnchorService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        chain: Arc<Chain>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            documents,
            chain,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    /// Compute `document_id`'s content hash and append it to the ledger.
    pub async fn anchor(&self, document_id: &str) -> Result<Block> {
        let document_id = validate_id(document_id)?;
        let source = self.resolve(document_id).await?;

        let chain = Arc::clone(&self.chain);
        let id = document_id.to_string();
        let block = blocking(move || {
            let content_hash = source.digest()?;
            let payload = AnchorPayload {
                document_id: id,
                content_hash,
            };
            let payload = serde_json::to_value(&payload)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?;
            chain.append(payload)
        })
        .await?;

        info!(
            document_id = %document_id,
            index = block.index(),
            hash = %block.hash(),
            "Document anchored"
        );
        Ok(block)
    }

    /// The content hash `anchor` would record, without appending.
    pub async fn hash_of(&self, document_id: &str) -> Result<String> {
        let document_id = validate_id(document_id)?;
        let source = self.resolve(document_id).await?;
        blocking(move || source.digest()).await
    }

    /// All ledger entries recorded for `document_id`.
    pub async fn proofs_for(&self, document_id: &str) -> Result<ProofSet> {
        let document_id = validate_id(document_id)?.to_string();
        let chain = Arc::clone(&self.chain);
        let entries = blocking(move || chain.find_by_document_id(&document_id)).await?;
        Ok(ProofSet {
            anchored: !entries.is_empty(),
            entries,
        })
    }

    /// Integrity and size of the whole chain.
    pub async fn chain_status(&self) -> Result<ChainReport> {
        let chain = Arc::clone(&self.chain);
        blocking(move || chain.verify_report()).await
    }

    async fn resolve(&self, document_id: &str) -> Result<HashSource> {
        let doc = self
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(document_id.to_string()))?;

        let source = HashSource::resolve(&doc, &self.upload_dir).await;
        debug!(
            document_id = %document_id,
            from_file = matches!(source, HashSource::File(_)),
            "Resolved hash source"
        );
        Ok(source)
    }
}

fn validate_id(document_id: &str) -> Result<&str> {
    let trimmed = document_id.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation("document_id is required".into()));
    }
    Ok(trimmed)
}

/// Run ledger and file I/O off the async executor.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LedgerError::Internal(format!("blocking task failed: {e}")))?
}
