/// Content digests for documents and ledger blocks.
pub mod hash;
