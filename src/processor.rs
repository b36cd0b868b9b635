use crate::byte_compare::ByteCompare;
use crate::config::Config;
use crate::error::CoreResult;
use crate::hash_list::HashList;
use crate::hasher::PhaseHasher;
use crate::locality::LocalityProbe;
use crate::path_arena::PathArena;
use crate::read_list::ReadList;
use crate::result_sink::ResultSink;
use crate::size_list::SizeList;
use crate::size_tree::{HeadState, PathListHead};
use crate::stats::StatsCollector;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Drives every multi-candidate `PathListHead` through progressive
/// prefix-hash elimination and a final byte-exact tie-break. One
/// `Processor` is built per scan; it holds only the locality probe and the
/// cancellation flag, so it can run against any `SizeList`.
pub struct Processor<'a> {
    probe: &'a dyn LocalityProbe,
    cancel: Arc<AtomicBool>,
}

impl<'a> Processor<'a> {
    pub fn new(probe: &'a dyn LocalityProbe, cancel: Arc<AtomicBool>) -> Self {
        Processor { probe, cancel }
    }

    /// Processes every head in `size_list`. Returns `Ok(true)` if the
    /// whole list was resolved, `Ok(false)` if cancellation cut it short
    /// (the caller should `sink.abort()` rather than `commit()` in that
    /// case).
    pub fn process(&self, size_list: &mut SizeList, arena: &PathArena, config: &Config, sink: &mut dyn ResultSink, stats: &mut StatsCollector) -> CoreResult<bool> {
        for head in size_list.iter_mut() {
            if self.cancel.load(Ordering::SeqCst) {
                return Ok(false);
            }
            self.process_head(head, arena, config, sink, stats);
            if self.cancel.load(Ordering::SeqCst) && !matches!(head.state, HeadState::DoneDup | HeadState::DoneUnique) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn process_head(&self, head: &mut PathListHead, arena: &PathArena, config: &Config, sink: &mut dyn ResultSink, stats: &mut StatsCollector) {
        let size = head.size;

        let before = head.candidate_count();
        let mut read_list = ReadList::new();
        read_list.rebuild(head, self.probe, arena, config.hardlink_is_unique);
        for _ in 0..before.saturating_sub(head.candidate_count()) {
            stats.record_hardlink_collapsed();
        }

        if head.candidate_count() < 2 {
            head.state = HeadState::DoneUnique;
            return;
        }

        // Locality-ordered sequence of indices into `head`; groups keep
        // this relative order as they split, so later reads still follow
        // the same sweep across the underlying device.
        let order: Vec<usize> = read_list.iter().map(|e| e.head_index).collect();
        let mut hashers: HashMap<usize, PhaseHasher> = HashMap::new();
        let mut active_groups: Vec<Vec<usize>> = vec![order.clone()];
        let mut phase = 0usize;

        'phases: loop {
            if self.cancel.load(Ordering::SeqCst) {
                head.state = HeadState::Hashing(phase as u32);
                return;
            }

            let mut hash_list = HashList::new();
            for group in &active_groups {
                for &idx in group {
                    if self.cancel.load(Ordering::SeqCst) {
                        head.state = HeadState::Hashing(phase as u32);
                        return;
                    }

                    let entry = head.entries()[idx];
                    let path = arena.get(entry.path);
                    let target = config.hash_schedule.prefix_len(phase, size);
                    let hasher = hashers.entry(idx).or_insert_with(PhaseHasher::new);

                    match File::open(path).and_then(|mut f| hasher.advance_to(&mut f, target)) {
                        Ok((digest, _read)) => hash_list.add(idx, digest),
                        Err(_) => {
                            stats.record_error();
                            head.eliminate(idx);
                        }
                    }
                }
            }

            let mut next_groups = Vec::new();
            for group in hash_list.into_groups() {
                if group.len() < 2 {
                    for idx in group {
                        head.eliminate(idx);
                    }
                    continue;
                }
                let mut group: Vec<usize> = group.into_iter().collect();
                group.sort_by_key(|i| order.iter().position(|o| o == i).unwrap_or(usize::MAX));
                next_groups.push(group);
            }
            active_groups = next_groups;

            if active_groups.is_empty() {
                head.state = HeadState::DoneUnique;
                return;
            }

            if config.hash_schedule.is_full(phase, size) {
                break 'phases;
            }
            phase += 1;
            head.state = HeadState::Hashing(phase as u32);
        }

        head.state = HeadState::Bytewise;
        let any_dup = self.resolve_byte_exact(head, arena, size, &active_groups, sink, stats);
        head.state = if any_dup { HeadState::DoneDup } else { HeadState::DoneUnique };
    }

    fn resolve_byte_exact(&self, head: &mut PathListHead, arena: &PathArena, size: u64, groups: &[Vec<usize>], sink: &mut dyn ResultSink, stats: &mut StatsCollector) -> bool {
        let mut any_dup = false;
        for group in groups {
            if self.cancel.load(Ordering::SeqCst) {
                break;
            }
            let members: Vec<(usize, &Path)> = group.iter().map(|&i| (i, arena.get(head.entries()[i].path))).collect();
            match ByteCompare::partition(&members) {
                Ok(classes) => {
                    for class in classes {
                        if class.len() < 2 {
                            continue;
                        }
                        let mut paths: Vec<PathBuf> = class.iter().map(|&i| arena.get(head.entries()[i].path).to_path_buf()).collect();
                        paths.sort();
                        stats.record_duplicate_set(paths.len());
                        sink.record_duplicate_set(size, &paths);
                        any_dup = true;
                    }
                }
                Err(_) => stats.record_error(),
            }
        }
        any_dup
    }
}
