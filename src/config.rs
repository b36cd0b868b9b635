use std::path::PathBuf;

/// Prefix lengths tried, in order, before falling back to a byte-exact
/// comparison. The last entry always means "the whole file" regardless of
/// its numeric value, since no file is longer than itself.
#[derive(Debug, Clone)]
pub struct HashSchedule(Vec<u64>);

impl Default for HashSchedule {
    fn default() -> Self {
        HashSchedule(vec![8 * 1024, 64 * 1024])
    }
}

impl HashSchedule {
    pub fn new(prefixes: Vec<u64>) -> Self {
        HashSchedule(prefixes)
    }

    /// Prefix length for phase `phase` given a file of `size` bytes.
    /// Phases past the configured schedule mean "full file".
    pub fn prefix_len(&self, phase: usize, size: u64) -> u64 {
        match self.0.get(phase) {
            Some(&len) => len.min(size),
            None => size,
        }
    }

    /// True once `phase`'s prefix is the whole file, i.e. no further phase
    /// is needed and the next step is the byte-exact pass.
    pub fn is_full(&self, phase: usize, size: u64) -> bool {
        self.prefix_len(phase, size) >= size
    }
}

/// All tunables accepted by the pipeline. Built by the `dupe-sieve` binary
/// from `getopts` matches; every field here corresponds to one of the
/// configuration inputs enumerated in the external interface.
#[derive(Debug, Clone)]
pub struct Config {
    pub roots: Vec<PathBuf>,
    pub min_size: u64,
    pub scan_hidden: bool,
    pub hardlink_is_unique: bool,
    pub threaded_sizetree: bool,
    pub save_uniques: bool,
    pub path_separator: u8,
    pub hash_schedule: HashSchedule,
    pub verbosity: u8,
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            roots: Vec::new(),
            min_size: 1,
            scan_hidden: false,
            hardlink_is_unique: true,
            threaded_sizetree: false,
            save_uniques: false,
            path_separator: 0,
            hash_schedule: HashSchedule::default(),
            verbosity: 0,
            exclude: Vec::new(),
        }
    }
}

impl Config {
    pub fn admits_size(&self, size: u64) -> bool {
        size > self.min_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_caps_at_file_size() {
        let s = HashSchedule::default();
        assert_eq!(s.prefix_len(0, 100), 100);
        assert_eq!(s.prefix_len(0, 1_000_000), 8 * 1024);
        assert_eq!(s.prefix_len(1, 1_000_000), 64 * 1024);
        assert_eq!(s.prefix_len(2, 1_000_000), 1_000_000);
        assert!(s.is_full(2, 1_000_000));
        assert!(!s.is_full(0, 1_000_000));
    }

    #[test]
    fn admits_strictly_greater_than_min_size() {
        let mut c = Config::default();
        c.min_size = 4;
        assert!(!c.admits_size(4));
        assert!(c.admits_size(5));
    }
}
