use crate::path_arena::{PathArena, PathEntry};
use crate::scanner::FileTuple;
use crate::size_tree::SizeTree;
use crate::stats::StatsCollector;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Consumes `(path, size, device, inode)` tuples produced by the Scanner
/// and inserts them into the `SizeTree`, interning the path on the way in.
/// Owns the `PathArena` and `SizeTree` for the whole traversal, plus its
/// own `StatsCollector` for the counters it alone can observe (the size of
/// each path-list bucket as it grows).
pub struct Indexer {
    pub arena: PathArena,
    pub tree: SizeTree,
    pub stats: StatsCollector,
}

impl Indexer {
    pub fn new() -> Self {
        Indexer { arena: PathArena::new(), tree: SizeTree::new(), stats: StatsCollector::new() }
    }

    pub fn index(&mut self, tuple: FileTuple) {
        let path_id = self.arena.intern(tuple.path);
        let entry = PathEntry::new(path_id, tuple.device, tuple.inode);
        let size = tuple.size;
        let head = self.tree.get_or_create(size);
        head.push(entry);
        self.stats.record_pathlist_len(size, head.candidate_count() as u64);
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new()
    }
}

/// The `process_file` function-pointer capability from the original: lets
/// the Scanner hand off a tuple without knowing whether it's going
/// straight into an `Indexer` or onto a channel for a separate thread.
pub trait TupleSink {
    fn submit(&mut self, tuple: FileTuple);
}

/// Single-threaded mode: the Scanner calls the Indexer directly.
pub struct InlineSink<'a> {
    indexer: &'a mut Indexer,
}

impl<'a> InlineSink<'a> {
    pub fn new(indexer: &'a mut Indexer) -> Self {
        InlineSink { indexer }
    }
}

impl TupleSink for InlineSink<'_> {
    fn submit(&mut self, tuple: FileTuple) {
        self.indexer.index(tuple);
    }
}

/// Two-thread mode: the Scanner pushes tuples onto a bounded channel; a
/// separate Indexer thread drains it. End-of-stream is signaled by
/// dropping the sender, which the consumer observes as a closed channel.
pub struct ChannelSink {
    tx: Sender<FileTuple>,
}

impl ChannelSink {
    pub fn new(tx: Sender<FileTuple>) -> Self {
        ChannelSink { tx }
    }
}

impl TupleSink for ChannelSink {
    fn submit(&mut self, tuple: FileTuple) {
        // Backpressure: a full bounded channel blocks the Scanner here
        // until the Indexer thread catches up.
        let _ = self.tx.send(tuple);
    }
}

/// Runs on the consumer thread in two-thread mode: drains the channel
/// until the Scanner's sender is dropped, checking `cancel` between
/// tuples so a cooperative cancellation can unwind promptly even while
/// the Scanner is still producing.
pub fn drain_channel(indexer: &mut Indexer, rx: Receiver<FileTuple>, cancel: &Arc<AtomicBool>) {
    while let Ok(tuple) = rx.recv() {
        indexer.index(tuple);
        if cancel.load(Ordering::SeqCst) {
            break;
        }
    }
}
