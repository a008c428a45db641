/// Block structure for the integrity ledger.
///
/// A block is an immutable record of `(index, timestamp, payload,
/// previous_hash)` plus its own hash. Blocks are linked through
/// `previous_hash` to form a tamper-evident chain.
///
/// Hash format (SHA-256, lowercase hex):
/// ```text
/// decimal(index) || timestamp || canonical_json(payload) || previous_hash
/// ```
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};

/// Payload carried by the genesis block.
pub const GENESIS_PAYLOAD: &str = "genesis";

/// Previous-hash of the genesis block: an all-zero digest.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// One hash-linked record in the ledger.
///
/// Serialized with the persisted field names `index`, `timestamp`, `data`,
/// `previous_hash` and `hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    index: u64,
    timestamp: String,
    #[serde(rename = "data")]
    payload: Value,
    previous_hash: String,
    hash: String,
}

impl Block {
    /// Build a block and seal it with its hash.
    pub fn new(index: u64, timestamp: String, payload: Value, previous_hash: String) -> Self {
        let hash = compute_hash(index, &timestamp, &payload, &previous_hash);
        Self {
            index,
            timestamp,
            payload,
            previous_hash,
            hash,
        }
    }

    /// The fixed first block of every chain.
    pub fn genesis(timestamp: String) -> Self {
        Self::new(
            0,
            timestamp,
            Value::String(GENESIS_PAYLOAD.to_string()),
            ZERO_HASH.to_string(),
        )
    }

    /// Build the successor of `prev` carrying `payload`.
    ///
    /// Fails if `prev` already holds the largest representable index.
    pub fn next(prev: &Block, timestamp: String, payload: Value) -> Result<Self> {
        let index = prev.index.checked_add(1).ok_or_else(|| {
            LedgerError::CorruptLedger(format!("block index {} cannot be extended", prev.index))
        })?;
        Ok(Self::new(index, timestamp, payload, prev.hash.clone()))
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Recompute the digest from the stored fields.
    pub fn recompute_hash(&self) -> String {
        compute_hash(self.index, &self.timestamp, &self.payload, &self.previous_hash)
    }

    /// Whether the stored hash matches the stored fields.
    pub fn is_sealed(&self) -> bool {
        self.recompute_hash() == self.hash
    }

    /// The `document_id` field of an object payload, if any.
    pub fn document_id(&self) -> Option<&str> {
        self.payload.get("document_id").and_then(Value::as_str)
    }
}

/// The block digest. Used identically by append and verify.
pub fn compute_hash(index: u64, timestamp: &str, payload: &Value, previous_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(timestamp.as_bytes());
    // serde_json::Value orders object keys, so this is canonical.
    hasher.update(payload.to_string().as_bytes());
    hasher.update(previous_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current UTC time as an ISO-8601 string with microsecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TS: &str = "2025-01-01T12:00:00.000000Z";

    #[test]
    fn test_genesis_shape() {
        let genesis = Block::genesis(TS.to_string());
        assert_eq!(genesis.index(), 0);
        assert_eq!(genesis.previous_hash(), ZERO_HASH);
        assert!(crate::crypto::hash::is_hex_digest(ZERO_HASH));
        assert_eq!(genesis.payload(), &json!("genesis"));
        assert_eq!(
            genesis.hash(),
            compute_hash(0, TS, &json!(GENESIS_PAYLOAD), ZERO_HASH)
        );
        assert!(genesis.is_sealed());
    }

    #[test]
    fn test_hash_deterministic() {
        let payload = json!({"document_id": "doc1", "content_hash": "ab"});
        let h1 = compute_hash(3, TS, &payload, ZERO_HASH);
        let h2 = compute_hash(3, TS, &payload, ZERO_HASH);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
    }

    #[test]
    fn test_hash_ignores_key_order() {
        let a: Value = serde_json::from_str(r#"{"document_id":"d","content_hash":"h"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"content_hash":"h","document_id":"d"}"#).unwrap();
        assert_eq!(compute_hash(1, TS, &a, ZERO_HASH), compute_hash(1, TS, &b, ZERO_HASH));
    }

    #[test]
    fn test_hash_covers_every_field() {
        let payload = json!({"document_id": "doc1"});
        let base = compute_hash(1, TS, &payload, ZERO_HASH);
        assert_ne!(base, compute_hash(2, TS, &payload, ZERO_HASH));
        assert_ne!(base, compute_hash(1, "2025-01-01T12:00:01.000000Z", &payload, ZERO_HASH));
        assert_ne!(base, compute_hash(1, TS, &json!({"document_id": "doc2"}), ZERO_HASH));
        assert_ne!(base, compute_hash(1, TS, &payload, &"1".repeat(64)));
    }

    #[test]
    fn test_next_links_to_previous() {
        let genesis = Block::genesis(TS.to_string());
        let next = Block::next(&genesis, TS.to_string(), json!({"document_id": "doc1"})).unwrap();
        assert_eq!(next.index(), 1);
        assert_eq!(next.previous_hash(), genesis.hash());
        assert_eq!(next.document_id(), Some("doc1"));
        assert_eq!(genesis.document_id(), None);
    }

    #[test]
    fn test_next_rejects_index_overflow() {
        let last = Block::new(u64::MAX, TS.to_string(), json!({}), ZERO_HASH.to_string());
        let err = Block::next(&last, TS.to_string(), json!({"document_id": "doc1"})).unwrap_err();
        assert!(matches!(err, LedgerError::CorruptLedger(_)));
    }

    #[test]
    fn test_persisted_field_names() {
        let block = Block::genesis(TS.to_string());
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["index"], json!(0));
        assert_eq!(value["timestamp"], json!(TS));
        assert_eq!(value["data"], json!("genesis"));
        assert_eq!(value["previous_hash"], json!(ZERO_HASH));
        assert_eq!(value["hash"], json!(block.hash()));
    }

    #[test]
    fn test_now_timestamp_is_iso8601() {
        let ts = now_timestamp();
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        assert!(ts.ends_with('Z'));
    }
}
