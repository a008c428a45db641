pub mod anchor;
pub mod config;
pub mod crypto;
pub mod documents;
pub mod error;
pub mod ledger;
pub mod server;
