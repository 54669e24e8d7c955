//! Decoder for binary xlog/mmap files.
//!
//! A file is a run of blocks, each laid out as:
//!
//! ```text
//! magic(1) seq(2) begin_hour(1) end_hour(1) length(4, LE) crypt_key(4|64) payload(length) 0x00
//! ```
//!
//! The magic byte (0x01..=0x0D) decides the width of the crypt-key field,
//! whether the payload is TEA-encrypted, and how it is compressed. Bytes that
//! do not start a readable block are skipped one at a time, so damage in the
//! middle of a file only costs the blocks it touches.
//!
//! A decoded block is kept when at least one of its lines parses with
//! [`parse_line`]; this is what tells a wrong key or a false magic apart from
//! real log text.

use super::text::parse_line;
use super::LogDecoder;
use crate::model::{DecodeError, LogRecord};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, trace, warn};

const MAGIC_FIRST: u8 = 0x01;
const MAGIC_LAST: u8 = 0x0D;
/// Lowest magic a file may start with; 0x01 and 0x02 only appear mid-file.
const MAGIC_FIRST_LEADING: u8 = 0x03;

/// Magic, sequence, begin hour, end hour, payload length.
const FIXED_HEADER_LEN: usize = 9;
const LENGTH_OFFSET: usize = 5;

/// How much of a file the scanner reads when looking for the first block.
pub const HEADER_SNIFF_LEN: usize = 4096;

const TEA_KEY_LEN: usize = 16;
const TEA_DELTA: u32 = 0x9E37_79B9;
const TEA_ROUNDS: u32 = 16;

// ===== Block Layout =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Deflate,
    Zstd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockKind(u8);

impl BlockKind {
    fn from_magic(magic: u8) -> Option<Self> {
        (MAGIC_FIRST..=MAGIC_LAST).contains(&magic).then_some(Self(magic))
    }

    fn crypt_key_len(self) -> usize {
        if self.0 <= 0x05 {
            4
        } else {
            64
        }
    }

    fn header_len(self) -> usize {
        FIXED_HEADER_LEN + self.crypt_key_len()
    }

    fn is_encrypted(self) -> bool {
        matches!(self.0, 0x06 | 0x08 | 0x0B | 0x0D)
    }

    fn compression(self) -> Compression {
        match self.0 {
            0x04 | 0x05 | 0x07 | 0x09 => Compression::Deflate,
            0x0A..=0x0D => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Kind and declared payload length of the block header at `offset`.
fn header_at(buf: &[u8], offset: usize) -> Option<(BlockKind, usize)> {
    let kind = BlockKind::from_magic(*buf.get(offset)?)?;
    let len = buf.get(offset + LENGTH_OFFSET..offset + FIXED_HEADER_LEN)?;
    let len = u32::from_le_bytes([len[0], len[1], len[2], len[3]]) as usize;
    (len > 0).then_some((kind, len))
}

/// A block whose header and payload both fit in `buf`.
struct Block<'a> {
    kind: BlockKind,
    payload: &'a [u8],
}

impl Block<'_> {
    /// Bytes from the magic through the end marker.
    fn span(&self) -> usize {
        self.kind.header_len() + self.payload.len() + 1
    }
}

fn block_at(buf: &[u8], offset: usize) -> Option<Block<'_>> {
    let (kind, len) = header_at(buf, offset)?;
    let start = offset + kind.header_len();
    let payload = buf.get(start..start.checked_add(len)?)?;
    Some(Block { kind, payload })
}

// ===== Header Check =====

/// Whether `path` starts with something that looks like an xlog block.
///
/// Reads at most [`HEADER_SNIFF_LEN`] bytes. A candidate needs a leading
/// magic (0x03..=0x0D), a non-zero payload length, and a payload that ends
/// within the file.
///
/// # Errors
///
/// Returns the I/O error if the file cannot be opened or read.
pub fn has_xlog_header(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut head = Vec::with_capacity(HEADER_SNIFF_LEN);
    file.by_ref()
        .take(HEADER_SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(head_has_block(&head, file_len))
}

fn head_has_block(head: &[u8], file_len: u64) -> bool {
    if head.len() <= FIXED_HEADER_LEN {
        return false;
    }
    (0..head.len()).any(|offset| {
        header_at(head, offset).is_some_and(|(kind, len)| {
            kind.0 >= MAGIC_FIRST_LEADING
                && (offset + kind.header_len()) as u64 + len as u64 <= file_len
        })
    })
}

// ===== TEA =====

/// 128-bit TEA key given as 32 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TeaKey([u32; 4]);

impl TeaKey {
    fn from_hex(key: &str) -> Option<Self> {
        let bytes = hex::decode(key.trim()).ok()?;
        if bytes.len() != TEA_KEY_LEN {
            return None;
        }
        let mut words = [0u32; 4];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = le_word(chunk);
        }
        Some(Self(words))
    }
}

fn le_word(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Decrypt every whole 8-byte block in place; a shorter tail stays as is.
fn tea_decrypt(data: &mut [u8], key: &TeaKey) {
    let [k0, k1, k2, k3] = key.0;
    for chunk in data.chunks_exact_mut(8) {
        let (left, right) = chunk.split_at_mut(4);
        let mut v0 = le_word(left);
        let mut v1 = le_word(right);
        let mut sum = TEA_DELTA.wrapping_mul(TEA_ROUNDS);
        for _ in 0..TEA_ROUNDS {
            v1 = v1.wrapping_sub(
                (v0 << 4).wrapping_add(k2) ^ v0.wrapping_add(sum) ^ (v0 >> 5).wrapping_add(k3),
            );
            v0 = v0.wrapping_sub(
                (v1 << 4).wrapping_add(k0) ^ v1.wrapping_add(sum) ^ (v1 >> 5).wrapping_add(k1),
            );
            sum = sum.wrapping_sub(TEA_DELTA);
        }
        left.copy_from_slice(&v0.to_le_bytes());
        right.copy_from_slice(&v1.to_le_bytes());
    }
}

// ===== Decoding =====

fn inflate(payload: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    if DeflateDecoder::new(payload).read_to_end(&mut out).is_ok() && !out.is_empty() {
        return Some(out);
    }
    out.clear();
    match ZlibDecoder::new(payload).read_to_end(&mut out) {
        Ok(_) if !out.is_empty() => Some(out),
        _ => None,
    }
}

/// Decrypt and decompress one payload. `None` means it could not be read.
fn open_payload(block: &Block<'_>, key: Option<&TeaKey>) -> Option<Vec<u8>> {
    let mut data = block.payload.to_vec();
    if block.kind.is_encrypted() {
        tea_decrypt(&mut data, key?);
    }
    match block.kind.compression() {
        Compression::None => Some(data),
        Compression::Deflate => inflate(&data),
        Compression::Zstd => zstd::stream::decode_all(data.as_slice())
            .ok()
            .filter(|out| !out.is_empty()),
    }
}

/// Result of walking a whole buffer.
#[derive(Debug, Default)]
struct Walk {
    records: Vec<LogRecord>,
    blocks: usize,
    locked: usize,
}

fn walk_blocks(buf: &[u8], key: Option<&TeaKey>) -> Walk {
    let mut walk = Walk::default();
    let mut offset = 0;
    while offset < buf.len() {
        let Some(block) = block_at(buf, offset) else {
            offset += 1;
            continue;
        };

        let before = walk.records.len();
        if let Some(data) = open_payload(&block, key) {
            let text = String::from_utf8_lossy(&data);
            walk.records.extend(text.lines().filter_map(parse_line));
        }

        if walk.records.len() > before {
            trace!(offset, magic = block.kind.0, lines = walk.records.len() - before, "Block decoded");
            walk.blocks += 1;
            offset += block.span();
        } else {
            if block.kind.is_encrypted() {
                walk.locked += 1;
            }
            offset += 1;
        }
    }
    walk
}

/// Decodes binary xlog/mmap files.
///
/// Keys are 32 hex digits (a 128-bit TEA key). A key is only consulted for
/// encrypted blocks; plain files decode the same with or without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlogDecoder;

impl XlogDecoder {
    /// Create a decoder. It holds no state.
    pub fn new() -> Self {
        Self
    }
}

impl LogDecoder for XlogDecoder {
    fn decode(&self, path: &Path, key: Option<&str>) -> Result<Vec<LogRecord>, DecodeError> {
        debug!(path = ?path, has_key = key.is_some(), "Decoding xlog");

        let bytes = std::fs::read(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => DecodeError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => DecodeError::Io(err),
        })?;
        if bytes.is_empty() {
            return Ok(Vec::new());
        }

        let tea_key = key.and_then(|raw| {
            let parsed = TeaKey::from_hex(raw);
            if parsed.is_none() {
                warn!(path = ?path, "Key is not 32 hex digits, ignoring it");
            }
            parsed
        });

        let walk = walk_blocks(&bytes, tea_key.as_ref());
        if walk.records.is_empty() {
            if walk.locked > 0 {
                return Err(DecodeError::BadKey {
                    path: path.to_path_buf(),
                });
            }
            return Err(DecodeError::Corrupt {
                path: path.to_path_buf(),
                reason: "no readable xlog blocks found".to_string(),
            });
        }
        if walk.locked > 0 {
            warn!(path = ?path, skipped = walk.locked, "Some encrypted blocks could not be read");
        }

        debug!(path = ?path, blocks = walk.blocks, count = walk.records.len(), "Decoded xlog");
        Ok(walk.records)
    }
}

/// Block builders shared by unit tests across the crate.
#[cfg(test)]
pub(crate) mod fixtures {
    use super::{BlockKind, TEA_DELTA, TEA_ROUNDS};

    /// Hex form of [`KEY_BYTES`].
    pub(crate) const KEY: &str = "00112233445566778899aabbccddeeff";
    pub(crate) const KEY_BYTES: [u8; 16] = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];

    /// Wrap an already encoded payload in a block header and end marker.
    pub(crate) fn block(magic: u8, payload: &[u8]) -> Vec<u8> {
        let kind = BlockKind::from_magic(magic).expect("valid magic");
        let mut out = vec![magic, 0, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend(std::iter::repeat(0u8).take(kind.crypt_key_len()));
        out.extend_from_slice(payload);
        out.push(0x00);
        out
    }

    /// An uncompressed, unencrypted block holding `text`.
    pub(crate) fn plain(text: &str) -> Vec<u8> {
        block(0x03, text.as_bytes())
    }

    pub(crate) fn tea_encrypt(data: &mut [u8], key: &[u8; 16]) {
        let k: Vec<u32> = key
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        for chunk in data.chunks_exact_mut(8) {
            let mut v0 = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let mut v1 = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            let mut sum = 0u32;
            for _ in 0..TEA_ROUNDS {
                sum = sum.wrapping_add(TEA_DELTA);
                v0 = v0.wrapping_add(
                    (v1 << 4).wrapping_add(k[0]) ^ v1.wrapping_add(sum) ^ (v1 >> 5).wrapping_add(k[1]),
                );
                v1 = v1.wrapping_add(
                    (v0 << 4).wrapping_add(k[2]) ^ v0.wrapping_add(sum) ^ (v0 >> 5).wrapping_add(k[3]),
                );
            }
            chunk[..4].copy_from_slice(&v0.to_le_bytes());
            chunk[4..].copy_from_slice(&v1.to_le_bytes());
        }
    }

    /// An encrypted, uncompressed (0x06) block holding `text`.
    pub(crate) fn encrypted(text: &str) -> Vec<u8> {
        let mut payload = text.as_bytes().to_vec();
        tea_encrypt(&mut payload, &KEY_BYTES);
        block(0x06, &payload)
    }
}
