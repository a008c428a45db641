/// SHA-256 hashing utilities for doc-ledger.
///
/// SHA-256 is used throughout the system for:
/// - Document content digests (anchored into the ledger)
/// - Block identity hashes in the integrity chain
///
/// All digests are rendered as 64 lowercase hex characters.
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;

pub const CHUNK_SIZE: usize = 64 * 1024; // 64 KiB

/// Length of a hex-encoded SHA-256 digest.
pub const HEX_DIGEST_LEN: usize = 64;

/// Hash arbitrary bytes and return lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hash text content over its exact UTF-8 bytes.
pub fn hash_text(text: &str) -> String {
    sha256_hex(text.as_bytes())
}

/// Stream a reader through SHA-256 in fixed-size chunks.
pub fn hash_reader<R: Read>(reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut BufReader::with_capacity(CHUNK_SIZE, reader), &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hash a file on disk without loading it into memory.
pub fn hash_file(path: &Path) -> Result<String> {
    let file = File::open(path)?;
    hash_reader(file)
}

/// Whether `s` looks like a hex SHA-256 digest as stored in the ledger.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == HEX_DIGEST_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_hash_deterministic() {
        let data = b"hello doc-ledger";
        assert_eq!(sha256_hex(data), sha256_hex(data));
    }

    #[test]
    fn test_hash_different_inputs() {
        assert_ne!(sha256_hex(b"hello"), sha256_hex(b"world"));
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(
            hash_text("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_streamed_matches_whole_buffer() {
        // 3.5 chunks worth of data
        let data: Vec<u8> = (0..CHUNK_SIZE * 3 + CHUNK_SIZE / 2)
            .map(|i| (i % 251) as u8)
            .collect();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();
        file.flush().unwrap();

        let streamed = hash_file(file.path()).unwrap();
        assert_eq!(streamed, sha256_hex(&data));
        assert_eq!(streamed, hash_file(file.path()).unwrap());
    }

    /// Reader that fails every other call with `Interrupted`.
    struct Interrupting<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Interrupting<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            let n = self.data.len().min(buf.len()).min(7);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let reader = Interrupting {
            data,
            interrupt: false,
        };
        assert_eq!(hash_reader(reader).unwrap(), sha256_hex(data));
    }

    #[test]
    fn test_empty_reader() {
        assert_eq!(hash_reader(&b""[..]).unwrap(), sha256_hex(b""));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = hash_file(&dir.path().join("absent.pdf")).unwrap_err();
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_is_hex_digest() {
        assert!(is_hex_digest(&hash_text("x")));
        assert!(is_hex_digest(&"0".repeat(64)));
        assert!(!is_hex_digest(&"A".repeat(64)));
        assert!(!is_hex_digest("abc"));
    }
}
