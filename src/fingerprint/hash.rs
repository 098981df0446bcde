// src/fingerprint/hash.rs

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;

use crate::fs::FileSystem;
use crate::types::Fingerprint;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading file for hashing: {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Render the per-file lines: `relPath:hexDigest`, joined by `\n`, no
/// trailing newline.
///
/// `entries` must already be in expansion order.
pub fn render_lines(entries: &[(String, String)]) -> String {
    entries
        .iter()
        .map(|(path, digest)| format!("{path}:{digest}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Digest the rendered lines into the final fingerprint.
pub fn digest_lines(lines: &str) -> Fingerprint {
    Fingerprint::from_hex(blake3::hash(lines.as_bytes()).to_hex().to_string())
}
