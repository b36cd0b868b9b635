use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Receives finished duplicate sets and unique-size facts. Exactly one
/// `begin` precedes any records; exactly one of `commit`/`abort` follows
/// the last record. A real embedded-database-backed sink is left to
/// downstream integrators (see SPEC_FULL.md §1); the two sinks in this
/// module are the in-process defaults the `dupe-sieve` binary wires up.
pub trait ResultSink {
    fn begin(&mut self) -> io::Result<()>;
    fn record_duplicate_set(&mut self, size: u64, paths: &[PathBuf]);
    fn record_unique_size(&mut self, size: u64, path: &Path);
    fn commit(&mut self) -> io::Result<()>;
    fn abort(&mut self);
}

/// Prints progress and duplicate sets to stdout as they're found, in the
/// teacher's own `ui.rs` idiom (throttled-by-elapsed-time progress line,
/// `{a => b}` combined-path notation for a pair).
pub struct TextResultSink {
    start: Option<Instant>,
    sets_found: usize,
}

impl TextResultSink {
    pub fn new() -> Self {
        TextResultSink { start: None, sets_found: 0 }
    }
}

impl Default for TextResultSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for TextResultSink {
    fn begin(&mut self) -> io::Result<()> {
        self.start = Some(Instant::now());
        Ok(())
    }

    fn record_duplicate_set(&mut self, size: u64, paths: &[PathBuf]) {
        self.sets_found += 1;
        println!("Dupe set ({} bytes, {} files):", size, paths.len());
        match paths {
            [a, b] => println!("  {}", combined_paths(a, b)),
            _ => {
                for p in paths {
                    println!("  {}", p.display());
                }
            }
        }
    }

    fn record_unique_size(&mut self, _size: u64, _path: &Path) {
        // Uniques are only interesting for downstream querying, not interactive output.
    }

    fn commit(&mut self) -> io::Result<()> {
        let elapsed = self.start.map(|s| s.elapsed()).unwrap_or(Duration::ZERO);
        println!("Found {} duplicate set(s) in {:.1}s.", self.sets_found, elapsed.as_secs_f64());
        Ok(())
    }

    fn abort(&mut self) {
        println!("Scan cancelled; no results recorded.");
    }
}

/// Renders two paths sharing a common prefix/suffix as one line with the
/// differing middle segment bracketed, e.g. `foo/{bar => baz}/a.txt`.
fn combined_paths(base: &Path, relativize: &Path) -> String {
    let base: Vec<_> = base.iter().collect();
    let relativize: Vec<_> = relativize.iter().collect();

    let mut out = String::with_capacity(80);
    let mut prefix_len = 0;
    for (comp, _) in base.iter().zip(relativize.iter()).take_while(|&(a, b)| a == b) {
        prefix_len += 1;
        let comp = comp.to_string_lossy();
        out += &comp;
        if comp != "/" {
            out.push('/');
        }
    }

    let suffix: Vec<_> = base
        .iter()
        .skip(prefix_len)
        .rev()
        .zip(relativize.iter().skip(prefix_len).rev())
        .take_while(|&(a, b)| a == b)
        .map(|(_, b)| b.to_string_lossy())
        .collect();

    let base_unique: Vec<_> = base[prefix_len..base.len() - suffix.len()].iter().map(|b| b.to_string_lossy()).collect();

    out.push('{');
    if base_unique.is_empty() {
        out.push('.');
    } else {
        out += &base_unique.join("/");
    }
    out += " => ";

    let rel_unique: Vec<_> = relativize[prefix_len..relativize.len() - suffix.len()].iter().map(|b| b.to_string_lossy()).collect();
    if rel_unique.is_empty() {
        out.push('.');
    } else {
        out += &rel_unique.join("/");
    }
    out.push('}');

    for comp in suffix.into_iter().rev() {
        out.push('/');
        out += &comp;
    }
    out
}

/// Discards everything. Used for `-q`/`--quiet`.
#[derive(Default)]
pub struct NullResultSink;

impl ResultSink for NullResultSink {
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }
    fn record_duplicate_set(&mut self, _size: u64, _paths: &[PathBuf]) {}
    fn record_unique_size(&mut self, _size: u64, _path: &Path) {}
    fn commit(&mut self) -> io::Result<()> {
        Ok(())
    }
    fn abort(&mut self) {}
}

/// Accumulates every record in memory and returns it as one JSON document
/// on `commit`, matching the teacher's `json.rs` idiom of buffering
/// everything and printing one `serde_json::to_string_pretty` blob at the
/// end rather than streaming records as NDJSON.
#[cfg(feature = "json")]
pub struct JsonResultSink {
    dupes: Vec<JsonDupeSet>,
    uniques: Vec<JsonUnique>,
}

#[cfg(feature = "json")]
#[derive(serde_derive::Serialize)]
struct JsonDupeSet {
    size: u64,
    paths: Vec<PathBuf>,
}

#[cfg(feature = "json")]
#[derive(serde_derive::Serialize)]
struct JsonUnique {
    size: u64,
    path: PathBuf,
}

#[cfg(feature = "json")]
#[derive(serde_derive::Serialize)]
struct JsonDocument<'a> {
    creator: String,
    dupes: &'a [JsonDupeSet],
    uniques: &'a [JsonUnique],
}

#[cfg(feature = "json")]
impl JsonResultSink {
    pub fn new() -> Self {
        JsonResultSink { dupes: Vec::new(), uniques: Vec::new() }
    }
}

#[cfg(feature = "json")]
impl Default for JsonResultSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "json")]
impl ResultSink for JsonResultSink {
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn record_duplicate_set(&mut self, size: u64, paths: &[PathBuf]) {
        self.dupes.push(JsonDupeSet { size, paths: paths.to_vec() });
    }

    fn record_unique_size(&mut self, size: u64, path: &Path) {
        self.uniques.push(JsonUnique { size, path: path.to_path_buf() });
    }

    fn commit(&mut self) -> io::Result<()> {
        let doc = JsonDocument {
            creator: format!("dupe-sieve {}", env!("CARGO_PKG_VERSION")),
            dupes: &self.dupes,
            uniques: &self.uniques,
        };
        let json = serde_json::to_string_pretty(&doc).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        println!("{}", json);
        Ok(())
    }

    fn abort(&mut self) {
        self.dupes.clear();
        self.uniques.clear();
    }
}

/// Collects records without printing anything. Used by tests that assert
/// on exactly which duplicate sets were produced.
#[derive(Default)]
pub struct InMemoryResultSink {
    pub begun: bool,
    pub committed: bool,
    pub aborted: bool,
    pub duplicate_sets: Vec<(u64, Vec<PathBuf>)>,
    pub unique_sizes: Vec<(u64, PathBuf)>,
}

impl ResultSink for InMemoryResultSink {
    fn begin(&mut self) -> io::Result<()> {
        self.begun = true;
        Ok(())
    }

    fn record_duplicate_set(&mut self, size: u64, paths: &[PathBuf]) {
        self.duplicate_sets.push((size, paths.to_vec()));
    }

    fn record_unique_size(&mut self, size: u64, path: &Path) {
        self.unique_sizes.push((size, path.to_path_buf()));
    }

    fn commit(&mut self) -> io::Result<()> {
        self.committed = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_sink_records_everything_it_sees() {
        let mut sink = InMemoryResultSink::default();
        sink.begin().unwrap();
        sink.record_duplicate_set(4, &[PathBuf::from("/a"), PathBuf::from("/b")]);
        sink.record_unique_size(7, Path::new("/c"));
        sink.commit().unwrap();

        assert!(sink.begun);
        assert!(sink.committed);
        assert!(!sink.aborted);
        assert_eq!(sink.duplicate_sets.len(), 1);
        assert_eq!(sink.unique_sizes.len(), 1);
    }

    #[test]
    fn combined_paths_brackets_the_differing_middle_segment() {
        let a = PathBuf::from("foo/bar/baz/a.txt");
        let b = PathBuf::from("foo/baz/quz/zzz/a.txt");
        assert_eq!(&combined_paths(&a, &b), "foo/{bar/baz => baz/quz/zzz}/a.txt");

        let c = PathBuf::from("foo/baz/quz/zzz/b.txt");
        let d = PathBuf::from("b.txt");
        assert_eq!(&combined_paths(&c, &d), "{foo/baz/quz/zzz => .}/b.txt");
        assert_eq!(&combined_paths(&d, &c), "{. => foo/baz/quz/zzz}/b.txt");
    }
}
