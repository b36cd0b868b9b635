use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::indexer::TupleSink;
use crate::stats::StatsCollector;
use std::ffi::OsString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One file admitted to the pipeline: its path, size, and the
/// (device, inode) identity needed for hardlink collapsing.
#[derive(Debug, Clone)]
pub struct FileTuple {
    pub path: PathBuf,
    pub size: u64,
    pub device: u64,
    pub inode: u64,
}

/// Recursive directory walk, converted to an explicit work stack so a
/// pathologically deep tree can't exhaust the call stack. Emits
/// `FileTuple`s to whatever `TupleSink` the caller configured (direct
/// indexing, or a channel feeding a separate Indexer thread).
pub struct Scanner {
    exclude: std::collections::HashSet<OsString>,
    stats: StatsCollector,
    cancel: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(config: &Config, cancel: Arc<AtomicBool>) -> Self {
        Scanner { exclude: config.exclude.iter().map(|s| OsString::from(s.as_str())).collect(), stats: StatsCollector::new(), cancel }
    }

    pub fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    /// Walks every configured root, feeding `sink`. A null/empty root is a
    /// configuration bug, not a transient I/O error, so it aborts instead
    /// of being logged and skipped.
    pub fn scan(&mut self, config: &Config, sink: &mut dyn TupleSink) -> CoreResult<()> {
        if config.roots.is_empty() {
            return Err(CoreError::Configuration("no roots configured".into()));
        }

        let mut pending: Vec<PathBuf> = Vec::new();
        for root in &config.roots {
            if root.as_os_str().is_empty() {
                return Err(CoreError::Configuration("empty root path".into()));
            }
            pending.push(root.clone());
        }

        while let Some(dir) = pending.pop() {
            if self.cancel.load(Ordering::SeqCst) {
                break;
            }
            self.scan_dir(&dir, config, sink, &mut pending);
        }
        Ok(())
    }

    fn scan_dir(&mut self, dir: &Path, config: &Config, sink: &mut dyn TupleSink, pending: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                if config.verbosity >= 3 {
                    eprintln!("{}: {}", dir.display(), err);
                }
                return;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            if self.cancel.load(Ordering::SeqCst) {
                return;
            }

            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }
            if !config.scan_hidden && name.to_string_lossy().starts_with('.') {
                continue;
            }
            if self.exclude.contains(&name) {
                self.stats.record_ignored();
                continue;
            }

            let path = entry.path();
            if path_contains_separator(&path, config.path_separator) {
                if config.verbosity >= 1 {
                    println!("SKIP (reserved separator) [{}]", path.display());
                }
                continue;
            }

            let metadata = match fs::symlink_metadata(&path) {
                Ok(m) => m,
                Err(_) => {
                    self.stats.record_error();
                    if config.verbosity >= 1 {
                        println!("SKIP (stat error) [{}]", path.display());
                    }
                    continue;
                }
            };

            self.admit(path, metadata, config, sink, pending);
        }
    }

    fn admit(&mut self, path: PathBuf, metadata: fs::Metadata, config: &Config, sink: &mut dyn TupleSink, pending: &mut Vec<PathBuf>) {
        let ty = metadata.file_type();
        if ty.is_dir() {
            pending.push(path);
            return;
        }
        if ty.is_symlink() || !ty.is_file() {
            self.stats.record_ignored();
            return;
        }

        let size = metadata.size();
        if !config.admits_size(size) {
            self.stats.record_ignored();
            return;
        }

        self.stats.record_file(size);
        if config.verbosity >= 2 && self.stats.should_report_progress() {
            println!("Files scanned: {}", self.stats.files_count);
        }

        sink.submit(FileTuple { path, size, device: metadata.dev(), inode: metadata.ino() });
    }
}

fn path_contains_separator(path: &Path, separator: u8) -> bool {
    if separator == 0 {
        return false;
    }
    path.as_os_str().as_bytes().contains(&separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{Indexer, InlineSink};
    use std::fs::File;
    use std::io::Write;
    use tempdir::TempDir;

    fn make_config(root: &Path) -> Config {
        let mut c = Config::default();
        c.roots = vec![root.to_path_buf()];
        c.min_size = 0;
        c
    }

    #[test]
    fn empty_roots_is_a_configuration_error() {
        let cancel = Arc::new(AtomicBool::new(false));
        let mut scanner = Scanner::new(&Config::default(), cancel);
        let mut indexer = Indexer::new();
        let mut sink = InlineSink::new(&mut indexer);
        let err = scanner.scan(&Config::default(), &mut sink).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn walks_nested_directories_and_admits_files() {
        let dir = TempDir::new("scanner-walk").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("a")).unwrap().write_all(b"hello").unwrap();
        File::create(dir.path().join("sub/b")).unwrap().write_all(b"world").unwrap();

        let config = make_config(dir.path());
        let cancel = Arc::new(AtomicBool::new(false));
        let mut scanner = Scanner::new(&config, cancel);
        let mut indexer = Indexer::new();
        {
            let mut sink = InlineSink::new(&mut indexer);
            scanner.scan(&config, &mut sink).unwrap();
        }
        assert_eq!(scanner.stats().files_count, 2);
        assert_eq!(indexer.tree.get_or_create(5).candidate_count(), 2);
    }

    #[test]
    fn hidden_files_are_skipped_unless_configured_in() {
        let dir = TempDir::new("scanner-hidden").unwrap();
        File::create(dir.path().join(".hidden")).unwrap().write_all(b"Z").unwrap();
        File::create(dir.path().join("visible")).unwrap().write_all(b"Z").unwrap();

        let config = make_config(dir.path());
        let cancel = Arc::new(AtomicBool::new(false));
        let mut scanner = Scanner::new(&config, cancel);
        let mut indexer = Indexer::new();
        {
            let mut sink = InlineSink::new(&mut indexer);
            scanner.scan(&config, &mut sink).unwrap();
        }
        assert_eq!(scanner.stats().files_count, 1);

        let mut hidden_config = config.clone();
        hidden_config.scan_hidden = true;
        let cancel = Arc::new(AtomicBool::new(false));
        let mut scanner = Scanner::new(&hidden_config, cancel);
        let mut indexer = Indexer::new();
        {
            let mut sink = InlineSink::new(&mut indexer);
            scanner.scan(&hidden_config, &mut sink).unwrap();
        }
        assert_eq!(scanner.stats().files_count, 2);
    }
}
