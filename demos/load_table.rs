//! Load a delimited text file with encoding fallback and print its shape.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example load_table -- "Ejemplo plantilla post cosecha.csv" --max-rows 100
//! ```
//!
//! Rewrite as UTF-8 comma-separated text:
//! ```sh
//! cargo run --example load_table -- export.csv -o clean.csv --output-delimiter ,
//! ```
//!
//! Set `RUST_LOG=loquat=debug` to see each encoding attempt.

use clap::Parser;
use loquat::{CandidateEncodingList, EncodingFallbackLoader, LoaderConfig, WriterConfig, write_delimited_path};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Load a delimited text file, trying candidate encodings in order
#[derive(Parser, Debug)]
#[command(name = "load_table", version)]
struct Args {
    /// Input file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Field delimiter
    #[arg(short, long, default_value_t = ';')]
    delimiter: char,

    /// Read at most this many data rows
    #[arg(short = 'n', long)]
    max_rows: Option<usize>,

    /// Candidate encodings, in trial order
    #[arg(short, long, value_delimiter = ',', default_value = "utf-8,latin-1,cp1252")]
    encodings: Vec<String>,

    /// YAML loader configuration; overrides the options above
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the table back out as UTF-8 delimited text
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Delimiter for the output file
    #[arg(long, default_value_t = ';')]
    output_delimiter: char,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => LoaderConfig::from_yaml_str(&std::fs::read_to_string(path)?)?,
        None => LoaderConfig::new()
            .with_delimiter(args.delimiter)
            .with_max_rows(args.max_rows)
            .with_encodings(CandidateEncodingList::from_labels(&args.encodings)?),
    };

    let loader = EncodingFallbackLoader::new(config)?;
    let loaded = loader.load(&args.input)?;

    println!("Encoding: {} ({} attempt(s))", loaded.encoding, loaded.attempts());
    println!("Rows: {}", loaded.table.row_count());
    println!("Columns:");
    for column in loaded.table.columns() {
        let filled = column.values().iter().filter(|v| !v.is_empty()).count();
        println!("  {} ({} of {} filled)", column.name(), filled, column.len());
    }

    if let Some(output) = &args.output {
        let writer_config = WriterConfig {
            delimiter: args.output_delimiter,
            ..WriterConfig::default()
        };
        write_delimited_path(&loaded.table, output, &writer_config)?;
        println!("Written: {}", output.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}
