use dupe_sieve::{
    run_scan, Config, Indexer, InMemoryResultSink, InlineSink, InodeLocality, Processor, Scanner, SizeList, StatsCollector,
};
use proptest::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempdir::TempDir;

fn small_content() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}

fn file_tree() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    prop::collection::vec((prop::string::string_regex("[a-z]{3,8}").unwrap(), small_content()), 1..12)
}

fn scan(dir: &TempDir) -> InMemoryResultSink {
    let mut config = Config::default();
    config.roots = vec![dir.path().to_path_buf()];
    config.min_size = 0;
    let mut sink = InMemoryResultSink::default();
    run_scan(&config, &mut sink, Arc::new(AtomicBool::new(false))).unwrap();
    sink
}

proptest! {
    // Invariant 3: every member of a reported duplicate set shares the
    // same byte content (and therefore the same size).
    #[test]
    fn duplicate_set_members_all_share_identical_content(files in file_tree()) {
        let dir = TempDir::new("prop-content").unwrap();
        let mut by_name = HashMap::new();
        for (i, (name, content)) in files.iter().enumerate() {
            let unique_name = format!("{}-{}", name, i);
            fs::write(dir.path().join(&unique_name), content).unwrap();
            by_name.insert(unique_name, content.clone());
        }

        let sink = scan(&dir);
        for (_size, paths) in &sink.duplicate_sets {
            let first = by_name.get(paths[0].file_name().unwrap().to_str().unwrap()).unwrap();
            for p in paths {
                let content = by_name.get(p.file_name().unwrap().to_str().unwrap()).unwrap();
                prop_assert_eq!(content, first);
            }
        }
    }

    // Invariant: a path never appears in more than one reported duplicate set.
    #[test]
    fn no_path_appears_in_two_duplicate_sets(files in file_tree()) {
        let dir = TempDir::new("prop-disjoint").unwrap();
        for (i, (name, content)) in files.iter().enumerate() {
            fs::write(dir.path().join(format!("{}-{}", name, i)), content).unwrap();
        }

        let sink = scan(&dir);
        let mut seen = std::collections::HashSet::new();
        for (_size, paths) in &sink.duplicate_sets {
            for p in paths {
                prop_assert!(seen.insert(p.clone()), "path reported in more than one duplicate set: {:?}", p);
            }
        }
    }

    // Invariant 3 (size): all members of a reported set agree with the
    // reported size, which equals their actual on-disk size.
    #[test]
    fn reported_size_matches_each_members_actual_size(files in file_tree()) {
        let dir = TempDir::new("prop-size").unwrap();
        for (i, (name, content)) in files.iter().enumerate() {
            fs::write(dir.path().join(format!("{}-{}", name, i)), content).unwrap();
        }

        let sink = scan(&dir);
        for (size, paths) in &sink.duplicate_sets {
            for p in paths {
                let actual = fs::metadata(p).unwrap().len();
                prop_assert_eq!(actual, *size);
            }
        }
    }

    // Invariant: a duplicate set always has at least two members.
    #[test]
    fn every_duplicate_set_has_at_least_two_members(files in file_tree()) {
        let dir = TempDir::new("prop-min-members").unwrap();
        for (i, (name, content)) in files.iter().enumerate() {
            fs::write(dir.path().join(format!("{}-{}", name, i)), content).unwrap();
        }

        let sink = scan(&dir);
        for (_size, paths) in &sink.duplicate_sets {
            prop_assert!(paths.len() >= 2);
        }
    }

    // Invariant 8: a path-list's candidate count only ever shrinks once
    // processing starts (hardlink collapsing, hash-phase elimination, and
    // byte-compare all remove candidates; none ever add one back).
    #[test]
    fn candidate_count_never_increases_during_processing(files in file_tree()) {
        let dir = TempDir::new("prop-monotone").unwrap();
        for (i, (name, content)) in files.iter().enumerate() {
            fs::write(dir.path().join(format!("{}-{}", name, i)), content).unwrap();
        }

        let mut config = Config::default();
        config.roots = vec![dir.path().to_path_buf()];
        config.min_size = 0;

        let mut indexer = Indexer::new();
        {
            let cancel = Arc::new(AtomicBool::new(false));
            let mut scanner = Scanner::new(&config, cancel);
            let mut sink = InlineSink::new(&mut indexer);
            scanner.scan(&config, &mut sink).unwrap();
        }

        let mut list = SizeList::from_size_tree(&mut indexer.tree);
        let before: Vec<usize> = list.heads().iter().map(|h| h.candidate_count()).collect();

        let probe = InodeLocality;
        let cancel = Arc::new(AtomicBool::new(false));
        let processor = Processor::new(&probe, cancel);
        let mut sink = InMemoryResultSink::default();
        let mut stats = StatsCollector::new();
        processor.process(&mut list, &indexer.arena, &config, &mut sink, &mut stats).unwrap();

        for (head, count_before) in list.heads().iter().zip(before) {
            prop_assert!(head.candidate_count() <= count_before);
        }
    }
}

#[test]
fn hardlink_is_unique_collapses_linked_paths_into_one_identity() {
    let dir = TempDir::new("prop-hardlink-policy").unwrap();
    fs::write(dir.path().join("a"), b"hardlinked payload").unwrap();
    fs::hard_link(dir.path().join("a"), dir.path().join("b")).unwrap();
    fs::write(dir.path().join("c"), b"hardlinked payload").unwrap();

    let mut config = Config::default();
    config.roots = vec![dir.path().to_path_buf()];
    config.min_size = 0;
    let mut sink = InMemoryResultSink::default();
    run_scan(&config, &mut sink, Arc::new(AtomicBool::new(false))).unwrap();

    // a/b are the same inode and collapse; only a (or b) vs c is reported.
    assert_eq!(sink.duplicate_sets.len(), 1);
    assert_eq!(sink.duplicate_sets[0].1.len(), 2);
}
