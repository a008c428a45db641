/// Chain engine: append, verify and query over a [`LedgerStore`].
///
/// The engine is the only writer of the ledger. `append` holds a
/// process-wide lock across its load → build → save cycle so that two
/// concurrent callers can never both extend the same tip. A ledger that
/// fails the integrity check is never extended. Reads take no lock; they
/// rely on the store's atomic replace.
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::block::{now_timestamp, Block, ZERO_HASH};
use super::store::LedgerStore;
use crate::error::{LedgerError, Result};

/// Why a block failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// Stored index differs from the block's position.
    IndexMismatch,
    /// Genesis block does not point at the zero hash.
    GenesisLink,
    /// `previous_hash` differs from the predecessor's hash.
    BrokenLink,
    /// Stored hash differs from the recomputed digest.
    HashMismatch,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Violation::IndexMismatch => "index does not match position",
            Violation::GenesisLink => "genesis previous_hash is not the zero hash",
            Violation::BrokenLink => "previous_hash does not match predecessor hash",
            Violation::HashMismatch => "hash does not match block contents",
        };
        f.write_str(s)
    }
}

/// Outcome of a full-chain verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    pub valid: bool,
    pub length: usize,
    /// Position of the first block that failed, if any.
    pub first_invalid: Option<u64>,
    pub violation: Option<Violation>,
    pub tip: Option<Block>,
}

/// Check the chain-integrity invariant over an in-memory sequence.
///
/// Returns the first failing position and the reason.
pub fn check_blocks(blocks: &[Block]) -> Option<(u64, Violation)> {
    for (position, block) in blocks.iter().enumerate() {
        let position = position as u64;

        if block.index() != position {
            return Some((position, Violation::IndexMismatch));
        }

        let expected_prev = match position {
            0 => ZERO_HASH,
            _ => blocks[position as usize - 1].hash(),
        };
        if block.previous_hash() != expected_prev {
            let violation = if position == 0 {
                Violation::GenesisLink
            } else {
                Violation::BrokenLink
            };
            return Some((position, violation));
        }

        if !block.is_sealed() {
            return Some((position, Violation::HashMismatch));
        }
    }
    None
}

/// The append-only, hash-linked ledger.
pub struct Chain {
    store: Box<dyn LedgerStore>,
    writer: Mutex<()>,
}

impl Chain {
    /// Open a chain over `store`, writing the genesis block if nothing is persisted.
    pub fn open(store: impl LedgerStore + 'static) -> Result<Self> {
        let chain = Self {
            store: Box::new(store),
            writer: Mutex::new(()),
        };
        chain.blocks()?;
        Ok(chain)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        // The guarded value is (); a poisoned lock carries no broken state.
        self.writer.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Caller must hold the writer lock.
    fn load_or_init(&self) -> Result<Vec<Block>> {
        if let Some(blocks) = self.store.load()? {
            return Ok(blocks);
        }

        let genesis = Block::genesis(now_timestamp());
        info!(hash = %genesis.hash(), "Initializing ledger with genesis block");
        let blocks = vec![genesis];
        self.store.save(&blocks)?;
        Ok(blocks)
    }

    /// The full block sequence in chain order.
    pub fn blocks(&self) -> Result<Vec<Block>> {
        if let Some(blocks) = self.store.load()? {
            return Ok(blocks);
        }
        let _guard = self.lock_writer();
        self.load_or_init()
    }

    /// Append a block carrying `payload` and persist the new sequence.
    pub fn append(&self, payload: Value) -> Result<Block> {
        let _guard = self.lock_writer();

        let mut blocks = self.load_or_init()?;
        if let Some((position, violation)) = check_blocks(&blocks) {
            warn!(position, %violation, "Refusing to append to a broken ledger");
            return Err(LedgerError::CorruptLedger(format!(
                "block {position}: {violation}"
            )));
        }
        let tip = blocks
            .last()
            .ok_or_else(|| LedgerError::CorruptLedger("persisted chain is empty".into()))?;

        let block = Block::next(tip, now_timestamp(), payload)?;
        blocks.push(block.clone());
        self.store.save(&blocks)?;

        info!(index = block.index(), hash = %block.hash(), "Block appended");
        Ok(block)
    }

    /// Verify every block, reporting where the first break is.
    pub fn verify_report(&self) -> Result<ChainReport> {
        let blocks = self.blocks()?;
        let failure = check_blocks(&blocks);

        if let Some((position, violation)) = failure {
            warn!(position, %violation, "Ledger integrity check failed");
        }

        Ok(ChainReport {
            valid: failure.is_none(),
            length: blocks.len(),
            first_invalid: failure.map(|(position, _)| position),
            violation: failure.map(|(_, violation)| violation),
            tip: blocks.last().cloned(),
        })
    }

    /// Whether the whole chain satisfies the integrity invariant.
    pub fn verify(&self) -> Result<bool> {
        Ok(self.verify_report()?.valid)
    }

    /// Blocks whose payload carries `document_id`, in chain order.
    pub fn find_by_document_id(&self, document_id: &str) -> Result<Vec<Block>> {
        Ok(self
            .blocks()?
            .into_iter()
            .filter(|b| b.document_id() == Some(document_id))
            .collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.blocks()?.len())
    }

    /// The most recent block.
    pub fn tip(&self) -> Result<Option<Block>> {
        Ok(self.blocks()?.pop())
    }

    #[cfg(test)]
    fn store(&self) -> &dyn LedgerStore {
        self.store.as_ref()
    }
}
