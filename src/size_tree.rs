use crate::path_arena::PathEntry;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// State machine driven by the Processor, attached to each `PathListHead`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadState {
    Ready,
    SizeUnique,
    Hashing(u32),
    Bytewise,
    DoneDup,
    DoneUnique,
}

/// A bucket of `PathEntry` values that all share `size`. Created on
/// first-seen size, appended to during traversal, frozen once traversal
/// ends, then consumed by the Processor.
#[derive(Debug)]
pub struct PathListHead {
    pub size: u64,
    pub state: HeadState,
    entries: SmallVec<[PathEntry; 4]>,
    candidate_count: usize,
}

impl PathListHead {
    fn new(size: u64) -> Self {
        PathListHead { size, state: HeadState::Ready, entries: SmallVec::new(), candidate_count: 0 }
    }

    pub fn push(&mut self, entry: PathEntry) {
        debug_assert!(entry.valid);
        self.entries.push(entry);
        self.candidate_count += 1;
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [PathEntry] {
        &mut self.entries
    }

    pub fn candidate_count(&self) -> usize {
        self.candidate_count
    }

    /// Clears `valid` on the entry at `index` and decrements the
    /// candidate count. Idempotent: clearing an already-invalid entry is a
    /// no-op, so pruning passes never need to check first.
    pub fn eliminate(&mut self, index: usize) {
        if self.entries[index].valid {
            self.entries[index].valid = false;
            self.candidate_count -= 1;
        }
    }

    pub fn valid_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().enumerate().filter(|(_, e)| e.valid).map(|(i, _)| i)
    }
}

/// Mapping from file size to the bucket of paths sharing that size.
/// Mutated only by the Indexer during traversal; read only after the scan
/// signals "done".
#[derive(Debug, Default)]
pub struct SizeTree {
    by_size: BTreeMap<u64, PathListHead>,
}

impl SizeTree {
    pub fn new() -> Self {
        SizeTree { by_size: BTreeMap::new() }
    }

    pub fn get_or_create(&mut self, size: u64) -> &mut PathListHead {
        self.by_size.entry(size).or_insert_with(|| PathListHead::new(size))
    }

    pub fn len(&self) -> usize {
        self.by_size.len()
    }

    /// Every head with candidate-count 1, for the optional `save_uniques`
    /// fact-reporting pass. Order is unspecified.
    pub fn unique_sized_heads(&self) -> impl Iterator<Item = &PathListHead> {
        self.by_size.values().filter(|h| h.candidate_count() == 1)
    }

    /// Drains every head with candidate-count >= 2 into a worklist for the
    /// Processor. Order is unspecified (ascending by size, an artifact of
    /// the backing BTreeMap, but callers must not depend on that).
    pub fn drain_multi(&mut self) -> Vec<PathListHead> {
        let mut keep = BTreeMap::new();
        let mut multi = Vec::new();
        for (size, head) in std::mem::take(&mut self.by_size) {
            if head.candidate_count() >= 2 {
                multi.push(head);
            } else {
                keep.insert(size, head);
            }
        }
        self.by_size = keep;
        multi
    }
}
