//! Batch identity and generation settings.

use crate::error::{CreditFileError, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::env;
use std::path::PathBuf;

/// Environment variable holding the archive password.
pub const ENV_PASSWORD: &str = "CREDIT_FILE_PASSWORD";
/// Environment variable holding the output directory.
pub const ENV_OUTPUT_DIR: &str = "CREDIT_FILE_OUTPUT_DIR";
/// Environment variable overriding the effective date (`YYYY-MM-DD`).
pub const ENV_DATE: &str = "CREDIT_FILE_DATE";
/// Environment variable selecting finalize-once generation.
pub const ENV_FINALIZE: &str = "CREDIT_FILE_FINALIZE";

/// What happens to appends once a file has been generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    /// Appends stay allowed; a previously generated file silently goes stale.
    #[default]
    Permissive,

    /// The first successful generation finalizes the batch.
    FinalizeOnce,
}

/// Settings that name the batch and its output files.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub agency_code: String,
    pub password: String,
    pub sequence_number: u32,
    pub output_dir: PathBuf,
    pub date: NaiveDateTime,
    pub mode: GenerationMode,
}

impl BatchConfig {
    /// Sequence 1, output to `/`, dated now, permissive mode.
    pub fn new(agency_code: impl Into<String>, password: impl Into<String>) -> Self {
        BatchConfig {
            agency_code: agency_code.into(),
            password: password.into(),
            sequence_number: 1,
            output_dir: PathBuf::from("/"),
            date: Local::now().naive_local(),
            mode: GenerationMode::Permissive,
        }
    }

    /// Sets the sequence number appended to the batch number.
    pub fn with_sequence_number(mut self, sequence_number: u32) -> Self {
        self.sequence_number = sequence_number;
        self
    }

    /// Sets the directory the raw file and archive are written to.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Sets the effective date used in the batch number.
    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.date = date;
        self
    }

    /// Sets the generation mode.
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builds a configuration for the CLI from the `CREDIT_FILE_*` environment.
    ///
    /// The password is required; the output directory defaults to `.`.
    pub fn from_env(agency_code: &str, sequence_number: u32) -> Result<Self> {
        let password = env::var(ENV_PASSWORD)
            .map_err(|_| CreditFileError::Config(format!("{} is not set", ENV_PASSWORD)))?;

        let output_dir = env::var(ENV_OUTPUT_DIR).unwrap_or_else(|_| ".".to_string());

        let mut config = BatchConfig::new(agency_code, password)
            .with_sequence_number(sequence_number)
            .with_output_dir(output_dir);

        if let Ok(raw) = env::var(ENV_DATE) {
            config = config.with_date(parse_date(&raw)?);
        }

        if let Ok(raw) = env::var(ENV_FINALIZE) {
            if parse_flag(&raw) {
                config = config.with_mode(GenerationMode::FinalizeOnce);
            }
        }

        Ok(config)
    }
}

/// Parses `YYYY-MM-DD` as midnight of that day.
pub fn parse_date(raw: &str) -> Result<NaiveDateTime> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| CreditFileError::Config(format!("invalid date {:?}, expected YYYY-MM-DD", raw)))
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
