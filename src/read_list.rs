use crate::locality::LocalityProbe;
use crate::path_arena::PathArena;
use crate::size_tree::PathListHead;

/// One entry queued for reading: which index in the owning head's entry
/// list it corresponds to, plus the identity fields needed to sort and
/// collapse hardlinks.
#[derive(Debug, Clone, Copy)]
pub struct ReadListEntry {
    pub head_index: usize,
    pub device: u64,
    pub inode: u64,
    pub locality: Option<u64>,
}

/// Locality-ordered list of files to be read for a processing phase.
/// Scratch structure: built fresh per `PathListHead`, discarded once that
/// head's phase is done.
#[derive(Debug, Default)]
pub struct ReadList {
    entries: Vec<ReadListEntry>,
}

impl ReadList {
    pub fn new() -> Self {
        ReadList { entries: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(&mut self, entry: ReadListEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReadListEntry> {
        self.entries.iter()
    }

    /// Fills the read list from `head`'s still-valid entries and sorts it.
    /// When `hardlink_is_unique` is set, consecutive entries sharing
    /// `(device, inode)` after sorting are compacted: the first is kept,
    /// the rest are eliminated from `head` right away so they're never
    /// read twice.
    pub fn rebuild(&mut self, head: &mut PathListHead, probe: &dyn LocalityProbe, arena: &PathArena, hardlink_is_unique: bool) {
        self.clear();
        let by_locality = {
            let indices: Vec<usize> = head.valid_indices().collect();
            for i in &indices {
                let e = head.entries()[*i];
                let path = arena.get(e.path);
                let locality = e.locality.or_else(|| probe.locality(path, e.device, e.inode));
                self.push(ReadListEntry { head_index: *i, device: e.device, inode: e.inode, locality });
            }
            self.entries.iter().any(|e| e.locality.is_some())
        };

        self.sort(by_locality);

        if hardlink_is_unique {
            self.compact_hardlinks(head);
        }
    }

    fn sort(&mut self, by_locality: bool) {
        if by_locality {
            self.entries.sort_by_key(|e| (e.locality.unwrap_or(u64::MAX), e.device, e.inode));
        } else {
            self.entries.sort_by_key(|e| (e.device, e.inode));
        }
    }

    fn compact_hardlinks(&mut self, head: &mut PathListHead) {
        let mut kept: Vec<ReadListEntry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            let is_duplicate_inode = kept.last().map_or(false, |prev| prev.device == entry.device && prev.inode == entry.inode);
            if is_duplicate_inode {
                head.eliminate(entry.head_index);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
    }
}
