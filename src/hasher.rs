use crate::hash_list::Digest;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// Domain separation so a content hash collision here can never be
/// mistaken for a hash collision anywhere else that happens to use BLAKE3
/// on the same bytes.
const DOMAIN_PREFIX: &[u8] = b"dupe-sieve/phase-prefix/v1";

const READ_BLOCK: usize = 128 * 1024;

/// Incremental per-entry hash state carried across hash phases. Each phase
/// only reads the *new* bytes since the previous phase's prefix length,
/// rather than rehashing from the start.
pub struct PhaseHasher {
    hasher: blake3::Hasher,
    bytes_hashed: u64,
}

impl PhaseHasher {
    pub fn new() -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DOMAIN_PREFIX);
        PhaseHasher { hasher, bytes_hashed: 0 }
    }

    /// Opens fresh each phase per the spec ("open, read up to L, ...,
    /// close"), so this seeks to the bytes already hashed before reading
    /// only the bytes new to this phase. Returns the digest of everything
    /// hashed so far and the number of bytes actually present (which may
    /// be less than `target_len` if the file shrank since it was stat'd).
    pub fn advance_to(&mut self, file: &mut File, target_len: u64) -> io::Result<(Digest, u64)> {
        file.seek(SeekFrom::Start(self.bytes_hashed))?;
        let mut buf = [0u8; READ_BLOCK];
        while self.bytes_hashed < target_len {
            let want = (target_len - self.bytes_hashed).min(READ_BLOCK as u64) as usize;
            let n = file.read(&mut buf[..want])?;
            if n == 0 {
                break; // file is shorter than expected; treat as its actual length
            }
            self.hasher.update(&buf[..n]);
            self.bytes_hashed += n as u64;
        }
        Ok((*self.hasher.finalize().as_bytes(), self.bytes_hashed))
    }

    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }
}

impl Default for PhaseHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempdir::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        path
    }

    #[test]
    fn incremental_hashing_matches_direct_hashing() {
        let dir = TempDir::new("hasher-test").unwrap();
        let content = b"hello world, this is some test content for incremental hashing";
        let path = write_file(&dir, "a", content);

        let mut direct = blake3::Hasher::new();
        direct.update(DOMAIN_PREFIX);
        direct.update(content);
        let expected = *direct.finalize().as_bytes();

        let mut file = File::open(&path).unwrap();
        let mut ph = PhaseHasher::new();
        let (d1, n1) = ph.advance_to(&mut file, 10).unwrap();
        assert_eq!(n1, 10);
        assert_ne!(d1, expected);

        let (d2, n2) = ph.advance_to(&mut file, content.len() as u64).unwrap();
        assert_eq!(n2, content.len() as u64);
        assert_eq!(d2, expected);
    }

    #[test]
    fn short_read_stops_at_actual_length() {
        let dir = TempDir::new("hasher-short").unwrap();
        let path = write_file(&dir, "short", b"abc");
        let mut file = File::open(&path).unwrap();
        let mut ph = PhaseHasher::new();
        let (_digest, n) = ph.advance_to(&mut file, 100).unwrap();
        assert_eq!(n, 3);
    }
}
