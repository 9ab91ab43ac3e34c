//! Archive packaging boundary.
//!
//! The batch only needs "put this file into a password-protected container".
//! `ZipArchiver` does that with the `zip` crate's WinZip AES-256 support.

use crate::error::{CreditFileError, Result};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{AesMode, CompressionMethod, ZipWriter};

/// Packages a rendered document into a protected archive.
pub trait Archiver {
    /// Writes `destination` containing a single entry named after `source`'s
    /// file name, protected with `password`.
    fn archive(&self, source: &Path, destination: &Path, password: &str) -> Result<()>;
}

/// Deflate-compressed zip with AES-256 encrypted entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive(&self, source: &Path, destination: &Path, password: &str) -> Result<()> {
        if password.is_empty() {
            return Err(CreditFileError::Archive(
                "archive password must not be empty".to_string(),
            ));
        }

        let entry_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                CreditFileError::Archive(format!("invalid source file name: {}", source.display()))
            })?;

        write_zip(source, destination, entry_name, password)?;
        Ok(())
    }
}

fn write_zip(source: &Path, destination: &Path, entry_name: &str, password: &str) -> ZipResult<()> {
    let mut input = BufReader::new(File::open(source)?);
    let mut zip = ZipWriter::new(File::create(destination)?);

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .with_aes_encryption(AesMode::Aes256, password);

    zip.start_file(entry_name, options)?;
    io::copy(&mut input, &mut zip)?;
    zip.finish()?;
    Ok(())
}
