//! Line-ending and BOM insensitive content checksums.
//!
//! The normalized stream drops a leading UTF-8 BOM, rewrites `\r\n` and lone `\r`
//! to `\n`, and omits exactly one trailing `\n`. Every other byte is hashed as-is.

use std::io::{self, Read, Write};
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::error::ConfigError;
use crate::fs::FileSystem;

/// Prefix of every normalized checksum.
pub const CHECKSUM_PREFIX: &str = "sha1:";

const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Streaming SHA-1 over the normalized form of the bytes written into it.
#[derive(Clone, Default)]
pub struct NormalizedHasher {
    hasher: Sha1,
    head: [u8; 3],
    head_len: usize,
    head_done: bool,
    prev_cr: bool,
    pending_lf: bool,
}

impl NormalizedHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, mut chunk: &[u8]) {
        while !self.head_done && !chunk.is_empty() {
            self.head[self.head_len] = chunk[0];
            self.head_len += 1;
            chunk = &chunk[1..];
            if self.head[..self.head_len] != BOM[..self.head_len] {
                self.flush_head();
            } else if self.head_len == BOM.len() {
                // Full BOM seen: discard it.
                self.head_len = 0;
                self.head_done = true;
            }
        }
        for &byte in chunk {
            self.push(byte);
        }
    }

    /// Finishes the stream and returns `sha1:<hex>`.
    pub fn finalize(mut self) -> String {
        if !self.head_done {
            self.flush_head();
        }
        // A deferred LF at EOF is the single trailing newline and is dropped.
        format!("{CHECKSUM_PREFIX}{}", hex::encode(self.hasher.finalize()))
    }

    fn flush_head(&mut self) {
        self.head_done = true;
        let head = self.head;
        let len = self.head_len;
        self.head_len = 0;
        for &byte in &head[..len] {
            self.push(byte);
        }
    }

    fn push(&mut self, byte: u8) {
        if self.prev_cr {
            self.prev_cr = false;
            if byte == b'\n' {
                return;
            }
        }
        match byte {
            b'\r' => {
                self.defer_lf();
                self.prev_cr = true;
            }
            b'\n' => self.defer_lf(),
            other => {
                self.release_lf();
                self.hasher.update([other]);
            }
        }
    }

    fn defer_lf(&mut self) {
        self.release_lf();
        self.pending_lf = true;
    }

    fn release_lf(&mut self) {
        if self.pending_lf {
            self.hasher.update(b"\n");
            self.pending_lf = false;
        }
    }
}

impl Write for NormalizedHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Normalized checksum of an in-memory buffer.
pub fn checksum_bytes(data: impl AsRef<[u8]>) -> String {
    let mut hasher = NormalizedHasher::new();
    hasher.update(data.as_ref());
    hasher.finalize()
}

/// Normalized checksum of a reader, consumed in fixed-size chunks.
pub fn checksum_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut hasher = NormalizedHasher::new();
    io::copy(reader, &mut hasher)?;
    Ok(hasher.finalize())
}

/// Normalized checksum of a file opened through `fs`. The handle is dropped on every
/// return path.
pub fn checksum_file(fs: &dyn FileSystem, path: &Path) -> Result<String, ConfigError> {
    let mut reader = fs
        .open(path)
        .map_err(|err| ConfigError::Io(err).context(path.display()))?;
    checksum_reader(&mut reader).map_err(|err| ConfigError::Io(err).context(path.display()))
}

/// Git blob object id (`sha1("blob <len>\0" + data)`), as stored for pristine files.
pub fn git_blob_hash(data: impl AsRef<[u8]>) -> String {
    let data = data.as_ref();
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {}\0", data.len()).as_bytes());
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_endings_bom_and_single_trailing_newline_are_ignored() {
        let expected = checksum_bytes("hello\nworld");
        assert_eq!(checksum_bytes("hello\r\nworld\n"), expected);
        assert_eq!(checksum_bytes("\u{feff}hello\nworld\n"), expected);
        assert_eq!(checksum_bytes("hello\rworld\r"), expected);
        assert_eq!(checksum_bytes("hello\r\nworld\r\n"), expected);
        assert_ne!(checksum_bytes("hello\nworld\n\n"), expected);
    }

    #[test]
    fn checksum_has_prefix_and_lowercase_hex() {
        let sum = checksum_bytes("abc");
        let hex = sum.strip_prefix(CHECKSUM_PREFIX).unwrap();
        assert_eq!(hex.len(), 40);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        // sha1("abc")
        assert_eq!(hex, "a9993e364706816aba3e25717850c26c9cd0d89d");
    }

    #[test]
    fn empty_and_lone_newline_hash_equal() {
        assert_eq!(checksum_bytes(""), checksum_bytes("\n"));
        assert_eq!(checksum_bytes(""), checksum_bytes("\r\n"));
        assert_ne!(checksum_bytes(""), checksum_bytes("\n\n"));
    }

    #[test]
    fn bom_only_stripped_at_start() {
        assert_ne!(checksum_bytes("a\u{feff}b"), checksum_bytes("ab"));
        assert_eq!(checksum_bytes("\u{feff}"), checksum_bytes(""));
        // Partial BOM prefix is hashed verbatim.
        assert_ne!(checksum_bytes([0xEF, 0xBB]), checksum_bytes(""));
    }

    #[test]
    fn chunk_boundaries_do_not_change_result() {
        let text = "\u{feff}line one\r\nline two\r\rline three\r\n";
        let whole = checksum_bytes(text);
        let bytes = text.as_bytes();
        for split in 0..bytes.len() {
            let mut hasher = NormalizedHasher::new();
            hasher.update(&bytes[..split]);
            hasher.update(&bytes[split..]);
            assert_eq!(hasher.finalize(), whole, "split at {split}");
        }
    }

    #[test]
    fn crlf_mixture_matches_lf_form() {
        let lf = "a\nb\n\nc";
        let mixed = "a\r\nb\r\r\nc\n";
        assert_eq!(checksum_bytes(lf), checksum_bytes(mixed));
    }

    #[test]
    fn reader_matches_bytes() {
        let text = b"key: value\r\nother: 1\r\n";
        let mut cursor = std::io::Cursor::new(&text[..]);
        assert_eq!(checksum_reader(&mut cursor).unwrap(), checksum_bytes(text));
    }

    #[test]
    fn git_blob_hash_matches_git() {
        // `printf 'hello\n' | git hash-object --stdin`
        assert_eq!(
            git_blob_hash("hello\n"),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }
}
