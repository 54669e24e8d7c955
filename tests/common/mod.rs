//! Shared fixtures for integration tests.

#![allow(dead_code)]

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use xlogview::source::{LogDecoder, PresetPicker, TextExporter, WalkDirScanner, XlogDecoder};
use xlogview::{Collaborators, Dispatch, Workspace};

/// Three xlog text lines: one debug, one info, one error.
pub const LINES: &str = "\
[D][2024-03-01 +8.0 09:00:00.000][100, 1*][Boot][main.c, init, 1]starting
[I][2024-03-01 +8.0 09:00:01.000][100, 2][Net][net.c, get, 20]GET /status
[E][2024-03-01 +8.0 09:00:02.000][100, 2][Net][net.c, get, 31]timeout
";

/// Hex TEA key that opens `locked/d.xlog`.
pub const KEY: &str = "00112233445566778899aabbccddeeff";

// ===== Xlog Blocks =====

/// Wrap an encoded payload in an xlog block header and end marker.
pub fn xlog_block(magic: u8, payload: &[u8]) -> Vec<u8> {
    let crypt_key_len = if magic <= 0x05 { 4 } else { 64 };
    let mut out = vec![magic, 0, 0, 0, 0];
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend(std::iter::repeat(0u8).take(crypt_key_len));
    out.extend_from_slice(payload);
    out.push(0x00);
    out
}

/// Uncompressed, unencrypted block (magic 0x03).
pub fn plain_log(text: &str) -> Vec<u8> {
    xlog_block(0x03, text.as_bytes())
}

/// Raw-deflate block (magic 0x05).
pub fn deflate_log(text: &str) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    xlog_block(0x05, &encoder.finish().unwrap())
}

/// Zstd block (magic 0x0A).
pub fn zstd_log(text: &str) -> Vec<u8> {
    xlog_block(0x0A, &zstd::stream::encode_all(text.as_bytes(), 0).unwrap())
}

/// TEA-encrypted, uncompressed block (magic 0x06) locked with `key_hex`.
pub fn encrypted_log(text: &str, key_hex: &str) -> Vec<u8> {
    let key: Vec<u32> = hex::decode(key_hex)
        .unwrap()
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let mut payload = text.as_bytes().to_vec();
    for chunk in payload.chunks_exact_mut(8) {
        let mut v0 = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let mut v1 = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
        let mut sum = 0u32;
        for _ in 0..16 {
            sum = sum.wrapping_add(0x9E37_79B9);
            v0 = v0.wrapping_add(
                (v1 << 4).wrapping_add(key[0]) ^ v1.wrapping_add(sum) ^ (v1 >> 5).wrapping_add(key[1]),
            );
            v1 = v1.wrapping_add(
                (v0 << 4).wrapping_add(key[2]) ^ v0.wrapping_add(sum) ^ (v0 >> 5).wrapping_add(key[3]),
            );
        }
        chunk[..4].copy_from_slice(&v0.to_le_bytes());
        chunk[4..].copy_from_slice(&v1.to_le_bytes());
    }
    xlog_block(0x06, &payload)
}

// ===== Directory =====

/// A directory of log files laid out for the scenarios:
///
/// ```text
/// root/a.xlog       plain block
/// root/sub/b.xlog   deflate block
/// root/empty/
/// root/notes.txt
/// other/c.xlog      zstd block
/// locked/d.xlog     encrypted with KEY
/// ```
pub struct LogDir {
    dir: TempDir,
}

impl LogDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("root/a.xlog"), plain_log(LINES));
        write_file(&dir.path().join("root/sub/b.xlog"), deflate_log(LINES));
        write_file(&dir.path().join("other/c.xlog"), zstd_log(LINES));
        write_file(&dir.path().join("locked/d.xlog"), encrypted_log(LINES, KEY));
        write_file(&dir.path().join("root/notes.txt"), "not a log\n");
        fs::create_dir_all(dir.path().join("root/empty")).unwrap();
        Self { dir }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn workspace(&self) -> Workspace {
        self.workspace_with(Arc::new(XlogDecoder::new()), PresetPicker::cancelled())
    }

    pub fn workspace_with(&self, decoder: Arc<dyn LogDecoder>, picker: PresetPicker) -> Workspace {
        let collaborators = Collaborators {
            scanner: Arc::new(WalkDirScanner::new()),
            exporter: Arc::new(TextExporter::new(Arc::clone(&decoder))),
            decoder,
            picker: Box::new(picker),
        };
        Workspace::new(collaborators, Dispatch::Inline)
    }
}

pub fn write_file(path: &Path, content: impl AsRef<[u8]>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}
