use dupe_sieve::{Config, HashSchedule, NullResultSink, ResultSink, TextResultSink};
#[cfg(feature = "json")]
use dupe_sieve::JsonResultSink;
use getopts::Options;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() {
    let mut opts = Options::new();
    opts.optflag("s", "small", "Also consider files at or under the block-size heuristic");
    opts.optflag("", "save-uniques", "Also report files whose size is unique in the scanned trees");
    opts.optflag("", "hardlinks-not-unique", "Treat hardlinked paths as distinct files instead of collapsing them");
    opts.optflag("", "threaded", "Run the directory walk and the size-bucket indexer on separate threads");
    opts.optopt("", "hash-schedule", "Comma-separated prefix lengths in bytes tried before a full-file hash", "<n,n,...>");
    opts.optopt("", "path-separator", "Reserved separator byte (as a number); paths containing it are skipped", "<byte>");
    opts.optmulti("e", "exclude", "Don't scan directories or files with that exact name", "<name>");
    opts.optflag("", "json", "Display results as JSON");
    opts.optflag("q", "quiet", "Suppress result output");
    opts.optflagmulti("v", "verbose", "Increase diagnostic verbosity (repeatable)");
    opts.optflag("h", "help", "This help text");

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| env!("CARGO_PKG_NAME").to_owned());

    let matches = match opts.parse(args) {
        Ok(m) => m,
        Err(err) => {
            writeln!(&mut std::io::stderr(), "{}", err).unwrap();
            std::process::exit(1);
        }
    };

    if matches.opt_present("h") || matches.free.is_empty() {
        println!(
            "Finds duplicate files by content (v{}).\n{}\n\n{}",
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_HOMEPAGE"),
            opts.usage(&(opts.short_usage(&program) + " <files or directories>"))
        );
        return;
    }

    let mut config = Config::default();
    config.roots = matches.free.iter().map(PathBuf::from).collect();
    config.scan_hidden = false;
    config.min_size = if matches.opt_present("small") { 0 } else { 1 };
    config.save_uniques = matches.opt_present("save-uniques");
    config.hardlink_is_unique = !matches.opt_present("hardlinks-not-unique");
    config.threaded_sizetree = matches.opt_present("threaded");
    config.exclude = matches.opt_strs("exclude");
    config.verbosity = matches.opt_count("v") as u8;

    if let Some(raw) = matches.opt_str("hash-schedule") {
        match parse_hash_schedule(&raw) {
            Ok(schedule) => config.hash_schedule = schedule,
            Err(err) => {
                writeln!(&mut std::io::stderr(), "Error: {}", err).unwrap();
                std::process::exit(1);
            }
        }
    }

    if let Some(raw) = matches.opt_str("path-separator") {
        match raw.parse::<u8>() {
            Ok(byte) => config.path_separator = byte,
            Err(_) => {
                writeln!(&mut std::io::stderr(), "Error: --path-separator must be a number 0-255").unwrap();
                std::process::exit(1);
            }
        }
    }

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_cancel = cancel.clone();
    ctrlc::set_handler(move || {
        handler_cancel.store(true, Ordering::SeqCst);
    })
    .ok();

    let quiet = matches.opt_present("q");
    let want_json = matches.opt_present("json");

    let mut sink: Box<dyn ResultSink> = if want_json {
        json_sink()
    } else if quiet {
        Box::new(NullResultSink)
    } else {
        Box::new(TextResultSink::new())
    };

    let exit_code = match dupe_sieve::run_scan(&config, sink.as_mut(), cancel) {
        Ok(_stats) => 0,
        Err(err) => {
            writeln!(&mut std::io::stderr(), "Error: {}", err).unwrap();
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(feature = "json")]
fn json_sink() -> Box<dyn ResultSink> {
    Box::new(JsonResultSink::new())
}

#[cfg(not(feature = "json"))]
fn json_sink() -> Box<dyn ResultSink> {
    writeln!(&mut std::io::stderr(), "This binary was compiled without JSON support.").unwrap();
    std::process::exit(2);
}

fn parse_hash_schedule(raw: &str) -> Result<HashSchedule, String> {
    let mut prefixes = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let n: u64 = part.parse().map_err(|_| format!("invalid hash schedule entry: {}", part))?;
        prefixes.push(n);
    }
    if prefixes.is_empty() {
        return Err("hash schedule must have at least one entry".into());
    }
    Ok(HashSchedule::new(prefixes))
}
