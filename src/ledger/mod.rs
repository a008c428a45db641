/// Integrity ledger: an append-only, hash-chained log of anchoring events.
///
/// ```text
/// genesis ──▶ block 1 ──▶ block 2 ──▶ ... ──▶ tip
///  prev = 0…0   prev = h0    prev = h1
/// ```
///
/// Single writer, local tamper evidence. There is no peer network,
/// consensus or fork resolution.
pub mod block;
pub mod chain;
pub mod store;

pub use block::Block;
pub use chain::{Chain, ChainReport, Violation};
pub use store::{JsonFileStore, LedgerStore, MemoryStore};
