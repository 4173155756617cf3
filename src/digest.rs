//! Content fingerprints for duplicate detection.
//!
//! A file's digest is the SHA-256 of its bytes, streamed in fixed-size
//! chunks so memory stays bounded regardless of file size. Two byte-identical
//! files always produce the same digest; the digest is independent of how the
//! reads happen to be chunked.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 8192;

/// Compute the content digest of a file, reading it in bounded chunks.
///
/// Fails with an IO-kind error if the file cannot be opened or read.
pub fn compute_digest(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    digest_reader(file).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Compute the content digest of an arbitrary byte stream.
pub fn digest_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
