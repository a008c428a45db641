/// Runtime configuration.
///
/// Every option can be given as a flag or through its environment
/// variable; flags win.
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::anchor::AnchorService;
use crate::documents::JsonDocumentStore;
use crate::error::Result;
use crate::ledger::{Chain, JsonFileStore};

/// Secret used when none is configured. Only fit for local development.
pub const DEV_SECRET: &str = "dev-secret";

/// Storage locations shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Ledger file (JSON array of blocks)
    #[arg(long, env = "DOC_LEDGER_CHAIN_FILE", default_value = "data/chain.json")]
    pub chain_file: PathBuf,

    /// Document records written by the intake pipeline
    #[arg(long, env = "DOC_LEDGER_DOCUMENTS_FILE", default_value = "documents.json")]
    pub documents_file: PathBuf,

    /// Directory holding uploaded document files
    #[arg(long, env = "DOC_LEDGER_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,
}

impl StorageConfig {
    /// Open (and if needed initialise) the ledger.
    pub fn open_chain(&self) -> Result<Chain> {
        Chain::open(JsonFileStore::new(&self.chain_file))
    }

    pub fn anchor_service(&self) -> Result<AnchorService> {
        let chain = Arc::new(self.open_chain()?);
        let documents = Arc::new(JsonDocumentStore::new(&self.documents_file));
        Ok(AnchorService::new(documents, chain, &self.upload_dir))
    }
}

/// Options for `serve`.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "DOC_LEDGER_BIND", default_value = "127.0.0.1:5000")]
    pub bind: String,

    /// HS256 secret for session tokens
    #[arg(long, env = "SECRET_KEY", default_value = DEV_SECRET, hide_env_values = true)]
    pub jwt_secret: String,

    #[command(flatten)]
    pub storage: StorageConfig,
}

impl ServerConfig {
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        server: ServerConfig,
    }

    #[test]
    fn test_defaults() {
        // Environment may override defaults on a developer machine.
        if std::env::var_os("DOC_LEDGER_BIND").is_some()
            || std::env::var_os("DOC_LEDGER_UPLOAD_DIR").is_some()
        {
            return;
        }
        let cli = TestCli::try_parse_from(["doc-ledger"]).unwrap();
        assert_eq!(cli.server.bind, "127.0.0.1:5000");
        assert_eq!(cli.server.storage.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_flags_override() {
        let cli = TestCli::try_parse_from([
            "doc-ledger",
            "--bind",
            "0.0.0.0:8080",
            "--chain-file",
            "/tmp/c.json",
            "--jwt-secret",
            "s3cret",
        ])
        .unwrap();
        assert_eq!(cli.server.bind, "0.0.0.0:8080");
        assert_eq!(cli.server.storage.chain_file, PathBuf::from("/tmp/c.json"));
        assert!(!cli.server.uses_dev_secret());
    }

    #[test]
    fn test_storage_opens_chain() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            chain_file: dir.path().join("data/chain.json"),
            documents_file: dir.path().join("documents.json"),
            upload_dir: dir.path().join("uploads"),
        };
        let service = storage.anchor_service().unwrap();
        assert_eq!(service.chain().len().unwrap(), 1);
        assert!(storage.chain_file.exists());
    }
}
