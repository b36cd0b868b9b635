use crate::lazyfile::LazyFile;
use std::io::{self, Read};
use std::path::Path;

const BLOCK: usize = 128 * 1024;

/// Final byte-exact pairwise comparator. Given a small residual candidate
/// set, partitions it into byte-exact equivalence classes with a single
/// linear pass: the first survivor of each class becomes its
/// representative, and every later candidate is compared only against
/// representatives (not against every other candidate). In the common
/// case of a single surviving class only two file descriptors are ever
/// open at once (one representative, one candidate); in the worst case of
/// every member being distinct, one descriptor per class stays open,
/// bounded by the candidate set size as the spec allows.
pub struct ByteCompare;

impl ByteCompare {
    /// `members` is `(id, path)` pairs; `id` is opaque to this module and
    /// is just carried through into the returned classes so the caller can
    /// map back to `PathEntry`/`PathId` values.
    pub fn partition<T: Copy>(members: &[(T, &Path)]) -> io::Result<Vec<Vec<T>>> {
        let mut classes: Vec<(LazyFile<'_>, Vec<T>)> = Vec::new();

        'member: for &(id, path) in members {
            for (rep_file, rep_ids) in classes.iter_mut() {
                if files_equal(rep_file, path)? {
                    rep_ids.push(id);
                    continue 'member;
                }
            }
            classes.push((LazyFile::new(path), vec![id]));
        }

        Ok(classes.into_iter().map(|(_, ids)| ids).collect())
    }
}

fn files_equal(representative: &mut LazyFile<'_>, candidate_path: &Path) -> io::Result<bool> {
    let rep_fd = representative.fd()?;
    rep_fd.seek_to_start()?;
    let mut candidate = std::fs::File::open(candidate_path)?;

    let mut a = [0u8; BLOCK];
    let mut b = [0u8; BLOCK];
    loop {
        let na = read_fill(rep_fd, &mut a)?;
        let nb = read_fill(&mut candidate, &mut b)?;
        if na != nb {
            return Ok(false);
        }
        if na == 0 {
            return Ok(true);
        }
        if a[..na] != b[..nb] {
            return Ok(false);
        }
    }
}

fn read_fill(file: &mut std::fs::File, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

trait SeekToStart {
    fn seek_to_start(&mut self) -> io::Result<()>;
}

impl SeekToStart for std::fs::File {
    fn seek_to_start(&mut self) -> io::Result<()> {
        use std::io::{Seek, SeekFrom};
        self.seek(SeekFrom::Start(0)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn write(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn identical_files_form_one_class() {
        let dir = TempDir::new("bytecmp").unwrap();
        let a = write(&dir, "a", b"same content");
        let b = write(&dir, "b", b"same content");
        let c = write(&dir, "c", b"different!!!");

        let members = [(0, a.as_path()), (1, b.as_path()), (2, c.as_path())];
        let mut classes = ByteCompare::partition(&members).unwrap();
        classes.sort_by_key(|c| c.len());
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0], vec![2]);
        let mut big = classes[1].clone();
        big.sort();
        assert_eq!(big, vec![0, 1]);
    }

    #[test]
    fn differing_length_is_not_equal() {
        let dir = TempDir::new("bytecmp-len").unwrap();
        let a = write(&dir, "a", b"short");
        let b = write(&dir, "b", b"shorter-by-a-lot-actually-longer");
        let members = [(0, a.as_path()), (1, b.as_path())];
        let classes = ByteCompare::partition(&members).unwrap();
        assert_eq!(classes.len(), 2);
    }

    #[test]
    fn large_block_boundary_crossing_content_compares_correctly() {
        let dir = TempDir::new("bytecmp-big").unwrap();
        let mut content = vec![7u8; 300 * 1024];
        content[250_000] = 9;
        let a = write(&dir, "a", &content);
        let b = write(&dir, "b", &content);
        content[250_000] = 1;
        let c = write(&dir, "c", &content);

        let members = [(0, a.as_path()), (1, b.as_path()), (2, c.as_path())];
        let mut classes = ByteCompare::partition(&members).unwrap();
        classes.sort_by_key(|cl| cl.len());
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0], vec![2]);
    }
}
