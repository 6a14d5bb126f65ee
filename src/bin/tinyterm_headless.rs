//! tinyterm Headless Runner
//!
//! Feeds a byte stream from stdin or a file through a terminal session and
//! prints the resulting screen as text or a JSON snapshot.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use tinyterm::{Config, Session};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut cols: Option<u16> = None;
    let mut rows: Option<u16> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut input_file: Option<String> = None;
    let mut chunk_size: Option<usize> = None;
    let mut output_format = OutputFormat::Text;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "-c" | "--cols" => {
                cols = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "-r" | "--rows" => {
                rows = value.and_then(|v| v.parse().ok());
                i += 1;
            }
            "--config" => {
                config_path = value.map(PathBuf::from);
                i += 1;
            }
            "-f" | "--file" => {
                input_file = value.cloned();
                i += 1;
            }
            "--chunk" => {
                chunk_size = value.and_then(|v| v.parse().ok()).filter(|&n| n > 0);
                i += 1;
            }
            "-j" | "--json" => output_format = OutputFormat::Json,
            "-t" | "--text" => output_format = OutputFormat::Text,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            other => {
                if input_file.is_none() && !other.starts_with('-') {
                    input_file = Some(other.to_string());
                } else {
                    eprintln!("Unknown argument: {}", other);
                    return ExitCode::FAILURE;
                }
            }
        }
        i += 1;
    }

    let mut config = match &config_path {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(cols) = cols {
        config.columns = cols;
    }
    if let Some(rows) = rows {
        config.rows = rows;
    }

    let input_data = match &input_file {
        Some(path) => match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut data = Vec::new();
            if let Err(e) = io::stdin().read_to_end(&mut data) {
                eprintln!("Error reading stdin: {}", e);
                return ExitCode::FAILURE;
            }
            data
        }
    };

    let mut session = Session::with_config(&config);
    match chunk_size {
        Some(n) => input_data.chunks(n).for_each(|chunk| session.feed(chunk)),
        None => session.feed(&input_data),
    }
    let snapshot = session.snapshot();

    match output_format {
        OutputFormat::Text => {
            println!("Terminal State ({}x{}):", snapshot.cols, snapshot.rows);
            println!("Cursor: ({}, {})", snapshot.cursor_row, snapshot.cursor_col);
            if !snapshot.title.is_empty() {
                println!("Title: {}", snapshot.title);
            }
            println!("---");
            print!("{}", snapshot.to_text());
            println!("---");
        }
        OutputFormat::Json => match snapshot.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing snapshot: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn print_help() {
    println!("tinyterm headless runner");
    println!();
    println!("Usage: tinyterm-headless [OPTIONS] [INPUT_FILE]");
    println!();
    println!("Options:");
    println!("  -c, --cols <N>       Set terminal width (default: 80)");
    println!("  -r, --rows <N>       Set terminal height (default: 24)");
    println!("      --config <PATH>  Load settings from a JSON config file");
    println!("  -f, --file <PATH>    Read input from file");
    println!("      --chunk <N>      Feed input in chunks of N bytes");
    println!("  -j, --json           Output snapshot as JSON");
    println!("  -t, --text           Output snapshot as text (default)");
    println!("  -h, --help           Show this help message");
    println!();
    println!("If no input file is specified, reads from stdin.");
    println!();
    println!("Examples:");
    println!("  printf 'Hello\\x1b[31mWorld\\x1b[0m' | tinyterm-headless");
    println!("  tinyterm-headless -c 120 -r 40 input.txt");
    println!("  tinyterm-headless --json < capture.bin > snapshot.json");
}
