use smallvec::SmallVec;
use std::collections::HashMap;

pub type Digest = [u8; 32];

/// Group-by-hash accumulator used to split a candidate set during one
/// hash phase. Entries landing on the same digest form a group; singleton
/// groups are the files that just proved themselves different from
/// everything else in the set at this prefix length.
#[derive(Debug, Default)]
pub struct HashList {
    groups: HashMap<Digest, SmallVec<[usize; 4]>>,
}

impl HashList {
    pub fn new() -> Self {
        HashList { groups: HashMap::new() }
    }

    /// `head_index` identifies the entry within its `PathListHead` so the
    /// caller can map groups back to entries without the HashList needing
    /// to know anything about PathListHead itself.
    pub fn add(&mut self, head_index: usize, digest: Digest) {
        self.groups.entry(digest).or_default().push(head_index);
    }

    /// Consumes the accumulator, returning every group. Order of groups,
    /// and order within a group, is unspecified.
    pub fn into_groups(self) -> Vec<SmallVec<[usize; 4]>> {
        self.groups.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_digest_groups_together() {
        let mut hl = HashList::new();
        let d1 = [1u8; 32];
        let d2 = [2u8; 32];
        hl.add(0, d1);
        hl.add(1, d1);
        hl.add(2, d2);

        let mut groups = hl.into_groups();
        groups.sort_by_key(|g| g.len());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].as_slice(), &[2]);
        let mut big = groups[1].clone();
        big.sort();
        assert_eq!(big.as_slice(), &[0, 1]);
    }
}
