use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Handle into a `PathArena`. Cheap to copy, cheap to store in every list
/// node that needs a path without owning one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(u32);

/// Append-only interned path storage. Lives for the whole scan; nothing is
/// ever removed from it, so handles into it stay valid forever.
#[derive(Debug, Default)]
pub struct PathArena {
    paths: Vec<PathBuf>,
    index: HashMap<PathBuf, PathId>,
}

impl PathArena {
    pub fn new() -> Self {
        PathArena { paths: Vec::new(), index: HashMap::new() }
    }

    /// Intern `path`, returning the existing handle if it was seen before.
    pub fn intern(&mut self, path: PathBuf) -> PathId {
        if let Some(&id) = self.index.get(&path) {
            return id;
        }
        let id = PathId(self.paths.len() as u32);
        self.index.insert(path.clone(), id);
        self.paths.push(path);
        id
    }

    pub fn get(&self, id: PathId) -> &Path {
        &self.paths[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// One occupied slot in a path list: a path plus the (device, inode)
/// identity needed for hardlink collapsing, an optional locality key, and
/// the valid flag cleared when this entry is eliminated from a candidate
/// set during processing.
#[derive(Debug, Clone, Copy)]
pub struct PathEntry {
    pub path: PathId,
    pub device: u64,
    pub inode: u64,
    pub locality: Option<u64>,
    pub valid: bool,
}

impl PathEntry {
    pub fn new(path: PathId, device: u64, inode: u64) -> Self {
        PathEntry { path, device, inode, locality: None, valid: true }
    }

    pub fn with_locality(mut self, locality: Option<u64>) -> Self {
        self.locality = locality;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut arena = PathArena::new();
        let a = arena.intern(PathBuf::from("/tmp/a"));
        let b = arena.intern(PathBuf::from("/tmp/b"));
        let a2 = arena.intern(PathBuf::from("/tmp/a"));
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Path::new("/tmp/a"));
    }
}
