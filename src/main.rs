//! Credit File CLI
//!
//! Reads transfer instructions from CSV, builds the batch, and writes the
//! raw credit file plus its encrypted zip.
//!
//! # Usage
//!
//! ```bash
//! CREDIT_FILE_PASSWORD=secret cargo run -- instructions.csv 00xx 2
//! ```
//!
//! # Environment Variables
//!
//! - `CREDIT_FILE_PASSWORD`: archive password (required)
//! - `CREDIT_FILE_OUTPUT_DIR`: output directory, defaults to `.`
//! - `CREDIT_FILE_DATE`: effective date `YYYY-MM-DD`, defaults to today
//! - `CREDIT_FILE_FINALIZE`: `1` to reject appends after generation
//! - `RUST_LOG`: Set to `debug` or `info` to control logging verbosity

use credit_file::{read_records, Batch, BatchConfig, CreditFileError, Result};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(CreditFileError::MissingArgument);
    }

    let input_path = &args[1];
    let agency_code = &args[2];
    let sequence_number = match args.get(3) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| CreditFileError::Config(format!("invalid sequence number {:?}", raw)))?,
        None => 1,
    };

    let config = BatchConfig::from_env(agency_code, sequence_number)?;

    let file = File::open(input_path)?;
    let records = read_records(BufReader::new(file))?;

    let mut batch = Batch::new(config);
    batch.append_all(records)?;

    let zip_path = batch.generate()?;
    println!("{}", zip_path.display());

    Ok(())
}
