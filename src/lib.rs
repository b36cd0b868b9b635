#[cfg(feature = "json")]
extern crate serde_derive;
#[cfg(feature = "json")]
extern crate serde_json;

mod byte_compare;
mod config;
mod error;
mod hash_list;
mod hasher;
mod indexer;
mod lazyfile;
mod locality;
mod path_arena;
mod processor;
mod read_list;
mod result_sink;
mod scanner;
mod size_list;
mod size_tree;
mod stats;

pub use crate::config::{Config, HashSchedule};
pub use crate::error::{CoreError, CoreResult};
pub use crate::indexer::{ChannelSink, Indexer, InlineSink, TupleSink};
pub use crate::locality::{FiemapLocality, InodeLocality, LocalityProbe};
pub use crate::path_arena::{PathArena, PathEntry, PathId};
pub use crate::processor::Processor;
#[cfg(feature = "json")]
pub use crate::result_sink::JsonResultSink;
pub use crate::result_sink::{InMemoryResultSink, NullResultSink, ResultSink, TextResultSink};
pub use crate::scanner::{FileTuple, Scanner};
pub use crate::size_list::SizeList;
pub use crate::size_tree::{HeadState, PathListHead, SizeTree};
pub use crate::stats::StatsCollector;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Runs the whole pipeline against `config`, reporting results to `sink`.
/// This is the convenience wrapper the binary (and anything else embedding
/// the crate) calls; it wires Scanner -> Indexer -> Processor the same way
/// whether traversal and indexing run on one thread or two, governed by
/// `config.threaded_sizetree`.
pub fn run_scan(config: &Config, sink: &mut dyn ResultSink, cancel: Arc<AtomicBool>) -> CoreResult<StatsCollector> {
    sink.begin().map_err(CoreError::Sink)?;

    let (mut indexer, mut stats, completed_scan) = if config.threaded_sizetree {
        scan_threaded(config, cancel.clone())?
    } else {
        scan_inline(config, cancel.clone())?
    };
    stats.max_pathlist = indexer.stats.max_pathlist;
    stats.max_pathlist_size = indexer.stats.max_pathlist_size;

    if !completed_scan {
        sink.abort();
        return Ok(stats);
    }

    check_pathlist_invariant(&stats)?;

    if config.save_uniques {
        for head in indexer.tree.unique_sized_heads() {
            if let Some(entry) = head.entries().first() {
                sink.record_unique_size(head.size, indexer.arena.get(entry.path));
            }
        }
    }

    let mut size_list = SizeList::from_size_tree(&mut indexer.tree);
    let probe = InodeLocality;
    let processor = Processor::new(&probe, cancel.clone());
    let completed = processor.process(&mut size_list, &indexer.arena, config, sink, &mut stats)?;

    if completed && !cancel.load(Ordering::SeqCst) {
        sink.commit().map_err(CoreError::Sink)?;
    } else {
        sink.abort();
    }

    Ok(stats)
}

/// A path-list bucket bigger than the total number of files scanned can't
/// happen under correct operation: mirrors the original's
/// `stats_max_pathlist > stats_files_count` sanity check, run once after
/// the scan phase completes.
fn check_pathlist_invariant(stats: &StatsCollector) -> CoreResult<()> {
    if stats.max_pathlist > stats.files_count {
        return Err(CoreError::Invariant(format!(
            "path-list of {} entries (size {}) exceeds {} files scanned in total",
            stats.max_pathlist, stats.max_pathlist_size, stats.files_count
        )));
    }
    Ok(())
}

fn scan_inline(config: &Config, cancel: Arc<AtomicBool>) -> CoreResult<(Indexer, StatsCollector, bool)> {
    let mut indexer = Indexer::new();
    let mut scanner = Scanner::new(config, cancel.clone());
    {
        let mut sink = InlineSink::new(&mut indexer);
        scanner.scan(config, &mut sink)?;
    }
    let completed = !cancel.load(Ordering::SeqCst);
    Ok((indexer, *scanner.stats(), completed))
}

fn scan_threaded(config: &Config, cancel: Arc<AtomicBool>) -> CoreResult<(Indexer, StatsCollector, bool)> {
    let (tx, rx) = crossbeam_channel::bounded(4096);
    let scan_cancel = cancel.clone();
    let scan_config = config.clone();

    let scanner_thread = thread::spawn(move || -> CoreResult<StatsCollector> {
        let mut scanner = Scanner::new(&scan_config, scan_cancel);
        let mut sink = ChannelSink::new(tx);
        scanner.scan(&scan_config, &mut sink)?;
        Ok(*scanner.stats())
    });

    let mut indexer = Indexer::new();
    crate::indexer::drain_channel(&mut indexer, rx, &cancel);

    let stats = scanner_thread
        .join()
        .map_err(|_| CoreError::Invariant("scanner thread panicked".into()))??;
    let completed = !cancel.load(Ordering::SeqCst);
    Ok((indexer, stats, completed))
}
