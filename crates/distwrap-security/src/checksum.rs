use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

pub fn sha256_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut writer = HashingWriter::new(io::sink());
    io::copy(&mut file, &mut writer)?;
    Ok(writer.finish().1)
}

/// Compares two hex digests ignoring case and surrounding whitespace.
pub fn sha256_matches(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

pub fn is_sha256_hex(value: &str) -> bool {
    let value = value.trim();
    value.len() == 64 && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Forwards writes to `inner` while feeding the same bytes into a SHA-256
/// digest.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns the inner writer and the lowercase hex digest.
    pub fn finish(self) -> (W, String) {
        (self.inner, hex::encode(self.hasher.finalize()))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn sha256_hex_matches_known_vectors() {
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
        assert_eq!(sha256_hex(b"abc"), ABC_SHA256);
    }

    #[test]
    fn hashing_writer_hashes_streamed_chunks() {
        let mut writer = HashingWriter::new(Vec::new());
        writer.write_all(b"a").expect("write");
        writer.write_all(b"bc").expect("write");
        assert_eq!(writer.written(), 3);

        let (inner, digest) = writer.finish();
        assert_eq!(inner, b"abc");
        assert_eq!(digest, ABC_SHA256);
    }

    #[test]
    fn sha256_matches_ignores_case() {
        assert!(sha256_matches(&ABC_SHA256.to_uppercase(), ABC_SHA256));
        assert!(sha256_matches(&format!(" {ABC_SHA256}\n"), ABC_SHA256));
        assert!(!sha256_matches(EMPTY_SHA256, ABC_SHA256));
    }

    #[test]
    fn is_sha256_hex_checks_length_and_alphabet() {
        assert!(is_sha256_hex(ABC_SHA256));
        assert!(!is_sha256_hex("abc123"));
        assert!(!is_sha256_hex(&"zz".repeat(32)));
    }

    #[test]
    fn sha256_file_reads_whole_file() {
        let mut path = std::env::temp_dir();
        path.push(format!("distwrap-security-{}-abc.bin", std::process::id()));
        std::fs::write(&path, b"abc").expect("write fixture");

        assert_eq!(sha256_file(&path).expect("hash file"), ABC_SHA256);
        let _ = std::fs::remove_file(&path);
    }
}
