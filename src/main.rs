use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use clap::{App, Arg};

use market_title_extractor::config::ExtractionConfig;
use market_title_extractor::pattern::{PatternLibrary, TomlPatternLibrary};
use market_title_extractor::result::ExtractionResult;

/// Demonstration pattern library bundled with the CLI so `--patterns` is
/// optional -- see DESIGN.md for why this is deliberately modest.
const BUILTIN_PATTERNS: &str = include_str!("../data/builtin_patterns.toml");

fn main() {
    let matches = App::new("extract-titles")
        .version("0.1.0")
        .author("Matthew Scheffel <mscheffel@gmail.com>")
        .about("Extracts market-term, date, report-type, geography, and topic fields from market-research report titles")
        .arg(
            Arg::with_name("patterns")
                .long("patterns")
                .value_name("FILE")
                .help("Pattern library TOML document (defaults to a small built-in demonstration library)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("FILE")
                .help("Extraction config TOML document (defaults to ExtractionConfig::default())")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("input")
                .long("input")
                .value_name("FILE")
                .help("One title per line (defaults to stdin)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("input-dir")
                .long("input-dir")
                .value_name("DIR")
                .help("Read titles, one per line, from every file under DIR (recursive)")
                .takes_value(true)
                .conflicts_with("input"),
        )
        .arg(
            Arg::with_name("output")
                .long("output")
                .value_name("FILE")
                .help("Write one ExtractionResult JSON object per line (defaults to stdout)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("workers")
                .long("workers")
                .value_name("N")
                .help("Worker thread pool size (defaults to available parallelism)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("preserve-order")
                .long("preserve-order")
                .help("Sort results back into input order before writing (workers complete out of order otherwise)"),
        )
        .get_matches();

    let library: Box<dyn PatternLibrary + Send + Sync> = match matches.value_of("patterns") {
        Some(path) => match TomlPatternLibrary::load(path) {
            Ok(lib) => Box::new(lib),
            Err(e) => {
                eprintln!("fatal: failed to load pattern library from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => match TomlPatternLibrary::from_str(BUILTIN_PATTERNS) {
            Ok(lib) => Box::new(lib),
            Err(e) => {
                eprintln!("fatal: built-in pattern library failed to load: {}", e);
                std::process::exit(1);
            }
        },
    };

    let config = match matches.value_of("config") {
        Some(path) => match ExtractionConfig::from_toml_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("fatal: failed to load config from {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => ExtractionConfig::default(),
    };

    let titles = match read_titles(&matches) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("fatal: failed to read input: {}", e);
            std::process::exit(1);
        }
    };

    let workers = matches
        .value_of("workers")
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(|| thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
        .max(1);

    let mut results = run_pool(titles, library.into(), config, workers);

    if matches.is_present("preserve-order") {
        results.sort_by_key(|(index, _)| *index);
    }

    if let Err(e) = write_results(&matches, &results) {
        eprintln!("fatal: failed to write output: {}", e);
        std::process::exit(1);
    }
}

fn read_titles(matches: &clap::ArgMatches) -> io::Result<Vec<(usize, String)>> {
    let mut lines = Vec::new();

    if let Some(dir) = matches.value_of("input-dir") {
        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        paths.sort();
        for path in paths {
            let file = File::open(&path)?;
            for line in BufReader::new(file).lines() {
                lines.push(line?);
            }
        }
    } else if let Some(path) = matches.value_of("input") {
        let file = File::open(path)?;
        for line in BufReader::new(file).lines() {
            lines.push(line?);
        }
    } else {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            lines.push(line?);
        }
    }

    Ok(lines.into_iter().enumerate().collect())
}

/// Fixed-size worker-pool model from SPEC_FULL.md §5: a bounded channel of
/// input titles feeds N worker threads sharing the pattern library by `Arc`,
/// each publishing `ExtractionResult`s onto an output channel a single
/// collector (this function's caller) drains. Output order is allowed to
/// diverge from input order -- each result carries its originating index so a
/// caller that wants input order back can sort on it cheaply (`--preserve-order`).
fn run_pool(
    titles: Vec<(usize, String)>,
    library: Arc<dyn PatternLibrary + Send + Sync>,
    config: ExtractionConfig,
    workers: usize,
) -> Vec<(usize, ExtractionResult)> {
    let (tx_in, rx_in) = mpsc::channel::<(usize, String)>();
    let rx_in = Arc::new(Mutex::new(rx_in));
    let (tx_out, rx_out) = mpsc::channel::<(usize, ExtractionResult)>();

    for title in titles {
        // Channel send only fails if every receiver already dropped, which
        // cannot happen before workers are spawned below.
        let _ = tx_in.send(title);
    }
    drop(tx_in);

    let mut handles = Vec::with_capacity(workers);
    for _ in 0..workers {
        let rx_in = Arc::clone(&rx_in);
        let tx_out = tx_out.clone();
        let library = Arc::clone(&library);
        let config = config.clone();

        handles.push(thread::spawn(move || loop {
            let next = {
                let rx = rx_in.lock().expect("input channel mutex poisoned");
                rx.recv()
            };
            match next {
                Ok((index, title)) => {
                    let result = market_title_extractor::extract(&title, library.as_ref(), &config);
                    if let Some(note) = &result.notes {
                        eprintln!("title_index={} note={}", index, note);
                    }
                    if tx_out.send((index, result)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }));
    }
    drop(tx_out);

    let collected: Vec<(usize, ExtractionResult)> = rx_out.into_iter().collect();
    for handle in handles {
        let _ = handle.join();
    }
    collected
}

fn write_results(matches: &clap::ArgMatches, results: &[(usize, ExtractionResult)]) -> io::Result<()> {
    let mut writer: Box<dyn Write> = match matches.value_of("output") {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout()),
    };

    for (_, result) in results {
        let line = serde_json::to_string(result).expect("ExtractionResult always serializes");
        writeln!(writer, "{}", line)?;
    }

    Ok(())
}
