//! settlement-engine CLI
//!
//! Settle supplier transactions from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Settle a CSV batch and print a summary
//! settlement-engine settle --input transactions.csv
//!
//! # Write the CSV report, restricted to January
//! settlement-engine settle --input transactions.csv --output report.csv \
//!     --start-date 2024-01-01 --end-date 2024-01-31
//!
//! # Generate a random batch for testing
//! settlement-engine generate --suppliers 10 --transactions 200 --output transactions.csv
//! ```

use chrono::{NaiveDate, Utc};
use settlement_engine::core::currency::RateTable;
use settlement_engine::fx::provider::SimulatedRateProvider;
use settlement_engine::ingest::csv::{read_transactions_file, write_transactions};
use settlement_engine::ingest::validator::Validator;
use settlement_engine::report::csv_writer::write_report_file;
use settlement_engine::settlement::engine::SettlementEngine;
use settlement_engine::simulation::generator::{generate_batch, GeneratorConfig};
use std::error::Error;
use std::fs::{self, File};
use std::io;
use std::process;

type CliResult = Result<(), Box<dyn Error>>;

fn print_usage() {
    eprintln!(
        r#"settlement-engine — multi-currency supplier settlement

USAGE:
    settlement-engine <COMMAND> [OPTIONS]

COMMANDS:
    settle      Settle a transaction CSV per supplier
    generate    Generate a random transaction CSV (for testing)
    help        Show this message

OPTIONS (settle):
    --input <FILE>          Path to transaction CSV (required)
    --output <FILE>         Write the settlement report CSV here
    --rates <FILE>          JSON rate table (default: built-in USD table)
    --start-date <DATE>     Only settle transactions on or after YYYY-MM-DD
    --end-date <DATE>       Only settle transactions on or before YYYY-MM-DD
    --format <FORMAT>       Output format: text (default) or json

OPTIONS (generate):
    --suppliers <N>         Number of suppliers (default: 5)
    --transactions <N>      Total number of transactions (default: 100)
    --output <FILE>         Write to file instead of stdout

EXAMPLES:
    settlement-engine settle --input transactions.csv
    settlement-engine settle --input transactions.csv --output report.csv --format json
    settlement-engine generate --suppliers 20 --transactions 500 --output batch.csv

Set RUST_LOG=debug for per-line conversion logs."#
    );
}

/// Value following a flag, or exit with a message naming the flag.
fn flag_value(args: &[String], i: usize, what: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| {
        eprintln!("{what}");
        process::exit(1);
    })
}

fn parse_date(flag: &str, value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_else(|e| {
        eprintln!("{flag} expects YYYY-MM-DD, got '{value}': {e}");
        process::exit(1);
    })
}

fn parse_count(flag: &str, value: &str) -> usize {
    value.parse().unwrap_or_else(|_| {
        eprintln!("{flag} requires a number");
        process::exit(1);
    })
}

fn cmd_settle(args: &[String]) -> CliResult {
    let mut input_path = None;
    let mut output_path: Option<String> = None;
    let mut rates_path: Option<String> = None;
    let mut start_date = None;
    let mut end_date = None;
    let mut format = "text".to_string();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(flag_value(args, i, "--input requires a file path"));
            }
            "--output" => {
                i += 1;
                output_path = Some(flag_value(args, i, "--output requires a file path"));
            }
            "--rates" => {
                i += 1;
                rates_path = Some(flag_value(args, i, "--rates requires a file path"));
            }
            "--start-date" => {
                i += 1;
                let value = flag_value(args, i, "--start-date requires a date");
                start_date = Some(parse_date("--start-date", &value));
            }
            "--end-date" => {
                i += 1;
                let value = flag_value(args, i, "--end-date requires a date");
                end_date = Some(parse_date("--end-date", &value));
            }
            "--format" => {
                i += 1;
                format = flag_value(args, i, "--format requires 'text' or 'json'");
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| {
        eprintln!("Error: --input <FILE> is required");
        process::exit(1);
    });
    if format != "text" && format != "json" {
        eprintln!("Unknown format '{format}': expected 'text' or 'json'");
        process::exit(1);
    }
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            eprintln!("--start-date {start} is after --end-date {end}");
            process::exit(1);
        }
    }

    let rates = match rates_path {
        Some(rates_path) => RateTable::from_json(&fs::read_to_string(&rates_path)?)?,
        None => RateTable::default(),
    };

    let records = read_transactions_file(&path)?;
    log::info!("read {} transactions from {}", records.len(), path);

    let batch = Validator::new(&rates).validate_batch(records, Utc::now())?;
    let batch = batch.within_dates(start_date, end_date);
    log::info!("{} transactions in date range", batch.len());

    let engine = SettlementEngine::new(SimulatedRateProvider::new(rates));
    let run = engine.calculate(batch.transactions())?;

    if let Some(output_path) = output_path {
        write_report_file(&output_path, run.settlements())?;
        log::info!("report written to {}", output_path);
    }

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        println!("{}", run);
    }
    Ok(())
}

fn cmd_generate(args: &[String]) -> CliResult {
    let mut suppliers = 5usize;
    let mut transactions = 100usize;
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--suppliers" => {
                i += 1;
                suppliers = parse_count("--suppliers", &flag_value(args, i, "--suppliers requires a number"));
            }
            "--transactions" => {
                i += 1;
                transactions =
                    parse_count("--transactions", &flag_value(args, i, "--transactions requires a number"));
            }
            "--output" => {
                i += 1;
                output_path = Some(flag_value(args, i, "--output requires a file path"));
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = GeneratorConfig {
        supplier_count: suppliers,
        transaction_count: transactions,
        ..Default::default()
    };
    let batch = generate_batch(&config, Utc::now());

    match output_path {
        Some(path) => {
            write_transactions(File::create(&path)?, batch.transactions())?;
            eprintln!(
                "Generated {} transactions across {} suppliers → {}",
                batch.len(),
                batch.suppliers().len(),
                path
            );
        }
        None => write_transactions(io::stdout().lock(), batch.transactions())?,
    }
    Ok(())
}

fn report_error(err: &dyn Error) {
    eprintln!("Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    let result = match command {
        "settle" => cmd_settle(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    };

    if let Err(err) = result {
        report_error(err.as_ref());
        process::exit(1);
    }
}
