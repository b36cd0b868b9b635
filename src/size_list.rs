use crate::size_tree::{HeadState, PathListHead, SizeTree};

/// The ordered worklist the Processor iterates. Constructed once from
/// `SizeTree::drain_multi`; heads eliminated mid-processing (state moves to
/// `DoneUnique`/`DoneDup`) are simply skipped by later iteration, never
/// removed from the list itself.
#[derive(Debug, Default)]
pub struct SizeList {
    heads: Vec<PathListHead>,
}

impl SizeList {
    pub fn from_size_tree(tree: &mut SizeTree) -> Self {
        SizeList { heads: tree.drain_multi() }
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PathListHead> {
        self.heads.iter_mut().filter(|h| !matches!(h.state, HeadState::DoneDup | HeadState::DoneUnique))
    }

    pub fn heads(&self) -> &[PathListHead] {
        &self.heads
    }
}
