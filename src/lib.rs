//! # Credit File
//!
//! Builds the pipe-delimited credit file a bank ingests for a batch of
//! transfer instructions, and packages it into an AES-encrypted zip.
//!
//! ## Design Principles
//!
//! - **Checksum chain**: every record's checksum is folded into a running
//!   value seeded by the previous record
//! - **Exact totals**: amounts are summed as integer cents via `rust_decimal`
//! - **Explicit lifecycle**: a record's checksums are unavailable until computed
//! - **Fixed layout**: `|`-delimited, CRLF-terminated, no quoting
//!
//! The checksum is an arithmetic reconciliation aid, not a cryptographic MAC.
//!
//! ## Example
//!
//! ```no_run
//! use credit_file::{Amount, Batch, BatchConfig, Record};
//! use std::str::FromStr;
//!
//! let mut record = Record::new();
//! record.reference_number = "LBPT001722444438".to_string();
//! record.timestamp = chrono::NaiveDate::from_ymd_opt(2023, 5, 18)
//!     .and_then(|d| d.and_hms_opt(7, 30, 0));
//! record.source_account_number = Some("8656003520".to_string());
//! record.receivers_account_number = Some("0276000055".to_string());
//! record.transaction_amount = Some(Amount::from_str("102.18").unwrap());
//!
//! let mut batch = Batch::new(BatchConfig::new("00xx", "secret").with_output_dir("./out"));
//! batch.append(record).unwrap();
//! let zip_path = batch.generate().unwrap();
//! println!("{}", zip_path.display());
//! ```

pub mod archive;
pub mod batch;
pub mod codec;
pub mod config;
pub mod decimal;
pub mod error;
pub mod input;
pub mod record;

pub use archive::{Archiver, ZipArchiver};
pub use batch::Batch;
pub use config::{BatchConfig, GenerationMode};
pub use decimal::{Amount, MoneyTotal};
pub use error::{CreditFileError, Result};
pub use input::read_records;
pub use record::{ChecksumState, Checksums, Record};
