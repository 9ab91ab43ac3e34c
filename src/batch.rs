//! Credit file batch: checksum chaining, totals and document generation.
//!
//! Records are appended one at a time. Each append seeds the record with the
//! running chain value, computes its checksums, and folds them into the batch
//! totals. Generation renders the document, writes `<batch>.txt` and packages
//! it into `<batch>.zip`.

use crate::archive::{Archiver, ZipArchiver};
use crate::codec::LineWriter;
use crate::config::{BatchConfig, GenerationMode};
use crate::decimal::{Amount, MoneyTotal};
use crate::error::{CreditFileError, Result};
use crate::record::{ChecksumState, Record};
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A settlement file under construction.
///
/// # Invariants
///
/// - `running_chain` is the running checksum of the last appended record (0 when empty)
/// - `checksum_sum` is the sum of every record's own checksum
/// - `total` is the exact sum of every record's amount in minor units
/// - records are never removed or reordered
pub struct Batch {
    config: BatchConfig,

    /// Appended records, in insertion order.
    records: Vec<Record>,

    running_chain: i64,
    checksum_sum: i64,
    total: MoneyTotal,

    raw_file_path: Option<PathBuf>,
    zip_file_path: Option<PathBuf>,

    /// Set after the first successful generation in finalize-once mode.
    finalized: bool,
}

impl Batch {
    /// Creates an empty batch.
    pub fn new(config: BatchConfig) -> Self {
        Batch {
            config,
            records: Vec::new(),
            running_chain: 0,
            checksum_sum: 0,
            total: MoneyTotal::ZERO,
            raw_file_path: None,
            zip_file_path: None,
            finalized: false,
        }
    }

    /// Appends a record, chaining its checksum onto the batch.
    ///
    /// Either every piece of batch state advances or none does.
    pub fn append(&mut self, mut record: Record) -> Result<()> {
        if self.finalized {
            warn!(
                "Rejecting record {} for finalized batch {}",
                record.reference_number,
                self.batch_number()
            );
            return Err(CreditFileError::Finalized);
        }

        let checksums = record.compute_with(self.running_chain)?;
        let checksum_sum = self
            .checksum_sum
            .checked_add(checksums.checksum)
            .ok_or(CreditFileError::ChecksumOverflow)?;
        let total = self.total.checked_add(record.amount()?)?;

        self.running_chain = checksums.running_checksum;
        self.checksum_sum = checksum_sum;
        self.total = total;

        debug!(
            "Row {}: appended {} checksum {} running {}",
            self.records.len() + 1,
            record.reference_number,
            checksums.checksum,
            checksums.running_checksum
        );

        self.records.push(record);
        Ok(())
    }

    /// Appends records in order, stopping at the first failure.
    pub fn append_all<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Record>,
    {
        for record in records {
            self.append(record)?;
        }
        Ok(())
    }

    /// `<agency>_<YYYYMMDD><sequence:06>`, used for the header and file names.
    pub fn batch_number(&self) -> String {
        format!(
            "{}_{}{:06}",
            self.config.agency_code,
            self.config.date.format("%Y%m%d"),
            self.config.sequence_number
        )
    }

    /// Changes the sequence number used by the next generation.
    pub fn set_sequence_number(&mut self, sequence_number: u32) {
        self.config.sequence_number = sequence_number;
    }

    /// Changes the effective date used by the next generation.
    pub fn set_date(&mut self, date: NaiveDateTime) {
        self.config.date = date;
    }

    /// Current identity and generation settings.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Appended records, in insertion order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of appended records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Chain seed for the next append.
    pub fn running_chain(&self) -> i64 {
        self.running_chain
    }

    /// Order-independent sum of record checksums, as written in the footer.
    pub fn checksum_sum(&self) -> i64 {
        self.checksum_sum
    }

    /// Exact total of all amounts.
    pub fn total_amount(&self) -> Amount {
        self.total.to_amount()
    }

    /// Path of the last written raw document, if any.
    pub fn raw_file_path(&self) -> Option<&Path> {
        self.raw_file_path.as_deref()
    }

    /// Path of the last written archive, if any.
    pub fn zip_file_path(&self) -> Option<&Path> {
        self.zip_file_path.as_deref()
    }

    /// `true` once a finalize-once batch has been generated.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Renders header, data lines and footer to `writer`.
    pub fn render<W: Write>(&self, writer: W) -> Result<W> {
        self.verify_chain()?;
        self.write_document(writer)
    }

    /// Renders the whole document into a string.
    pub fn render_to_string(&self) -> Result<String> {
        let bytes = self.render(Vec::new())?;
        String::from_utf8(bytes).map_err(|e| CreditFileError::Render {
            row: 0,
            reason: e.to_string(),
        })
    }

    /// Writes the raw document and its encrypted zip, returning the zip path.
    pub fn generate(&mut self) -> Result<PathBuf> {
        self.generate_with(&ZipArchiver)
    }

    /// Like [`Batch::generate`] with a caller-supplied archiver.
    ///
    /// A raw file written before an archive failure stays on disk.
    pub fn generate_with<A: Archiver + ?Sized>(&mut self, archiver: &A) -> Result<PathBuf> {
        self.verify_chain()?;

        let batch_number = self.batch_number();
        let raw_path = self.config.output_dir.join(format!("{}.txt", batch_number));
        let zip_path = self.config.output_dir.join(format!("{}.zip", batch_number));

        let file = File::create(&raw_path)?;
        let mut writer = self.write_document(BufWriter::new(file))?;
        writer.flush()?;
        drop(writer);

        info!(
            "Wrote {} with {} records to {}",
            batch_number,
            self.records.len(),
            raw_path.display()
        );
        self.raw_file_path = Some(raw_path.clone());

        archiver.archive(&raw_path, &zip_path, &self.config.password)?;
        info!("Archived {} to {}", batch_number, zip_path.display());
        self.zip_file_path = Some(zip_path.clone());

        if self.config.mode == GenerationMode::FinalizeOnce {
            self.finalized = true;
        }

        Ok(zip_path)
    }

    fn write_document<W: Write>(&self, writer: W) -> Result<W> {
        let mut lines = LineWriter::new(writer);
        lines.write_header(&self.batch_number())?;
        for record in &self.records {
            lines.write_record(record)?;
        }
        lines.write_footer(self.records.len(), self.total, self.checksum_sum)?;
        lines.finish()
    }

    /// Walks the chain from 0 and checks every record was computed against
    /// the value its position implies.
    fn verify_chain(&self) -> Result<()> {
        let mut expected = 0i64;
        for (idx, record) in self.records.iter().enumerate() {
            let row = idx + 1;
            match record.state() {
                ChecksumState::Uncomputed => {
                    return Err(CreditFileError::Render {
                        row,
                        reason: "checksum not computed".to_string(),
                    });
                }
                ChecksumState::Computed(c) if c.incoming_chain != expected => {
                    return Err(CreditFileError::Render {
                        row,
                        reason: format!(
                            "computed against chain {} but batch chain is {}",
                            c.incoming_chain, expected
                        ),
                    });
                }
                ChecksumState::Computed(c) => expected = c.running_checksum,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap()
    }

    fn record(reference: &str, amount: &str, source: &str, receiver: &str) -> Record {
        let mut record = Record::new();
        record.reference_number = reference.to_string();
        record.timestamp = NaiveDate::from_ymd_opt(2023, 5, 18)
            .and_then(|d| d.and_hms_opt(7, 30, 0));
        record.source_account_number = Some(source.to_string());
        record.receivers_account_number = Some(receiver.to_string());
        record.transaction_amount = Some(Amount::from_str(amount).unwrap());
        record
    }

    fn batch() -> Batch {
        Batch::new(BatchConfig::new("00xx", "LBP1234567890").with_date(date(2025, 6, 18)))
    }

    #[test]
    fn test_batch_number() {
        let mut batch = batch();
        batch.set_sequence_number(2);
        assert_eq!(batch.batch_number(), "00xx_20250618000002");
    }

    #[test]
    fn test_first_record_running_equals_checksum() {
        let mut batch = batch();
        batch
            .append(record("R1", "102.18", "8656003520", "0276000055"))
            .unwrap();

        let r = &batch.records()[0];
        assert_eq!(r.checksum(), Some(36_529_350));
        assert_eq!(r.running_checksum(), Some(36_529_350));
        assert_eq!(batch.running_chain(), 36_529_350);
        assert_eq!(batch.checksum_sum(), 36_529_350);
    }

    #[test]
    fn test_chain_carries_into_next_record() {
        let mut batch = batch();
        batch
            .append(record("R1", "102.18", "8656003520", "0276000055"))
            .unwrap();
        batch
            .append(record("R2", "103.18", "8656003520", "8655000861"))
            .unwrap();

        let second = 10318 * (3520 + 861);
        let r2 = &batch.records()[1];
        assert_eq!(r2.checksum(), Some(second));
        assert_eq!(r2.running_checksum(), Some(36_529_350 + second));
        assert_eq!(batch.record_count(), 2);
        assert_eq!(batch.total_amount().to_string(), "205.36");
    }

    #[test]
    fn test_chain_is_order_dependent_sum_is_not() {
        let r1 = record("R1", "102.18", "8656003520", "0276000055");
        let r2 = record("R2", "103.18", "8656003520", "8655000861");

        let mut forward = batch();
        forward.append_all([r1.clone(), r2.clone()]).unwrap();
        let mut reverse = batch();
        reverse.append_all([r2, r1]).unwrap();

        assert_eq!(forward.checksum_sum(), reverse.checksum_sum());
        let last = |b: &Batch| b.records().last().and_then(|r| r.running_checksum());
        assert_eq!(last(&forward), last(&reverse));

        let first = |b: &Batch| b.records()[0].running_checksum();
        assert_ne!(first(&forward), first(&reverse));
    }

    #[test]
    fn test_money_total_is_exact() {
        let mut batch = batch();
        for i in 0..3 {
            batch
                .append(record(&format!("R{}", i), "0.10", "111111", "222222"))
                .unwrap();
        }

        let doc = batch.render_to_string().unwrap();
        let footer = doc.lines().last().unwrap();
        assert!(footer.starts_with("3|0.30|"));
    }

    #[test]
    fn test_empty_batch_footer() {
        let doc = batch().render_to_string().unwrap();
        assert_eq!(doc, "00xx_20250618000001\r\n0|0.00|0\r\n");
    }

    #[test]
    fn test_failed_append_leaves_state_untouched() {
        let mut batch = batch();
        batch
            .append(record("R1", "1.00", "000001", "000002"))
            .unwrap();

        let mut bad = record("R2", "1.00", "000001", "000002");
        bad.timestamp = None;
        assert!(matches!(
            batch.append(bad),
            Err(CreditFileError::MissingField { field: "timestamp" })
        ));

        assert_eq!(batch.record_count(), 1);
        assert_eq!(batch.running_chain(), 300);
        assert_eq!(batch.checksum_sum(), 300);
        assert_eq!(batch.total_amount().to_string(), "1.00");
    }

    #[test]
    fn test_render_rejects_uncomputed_record() {
        let mut batch = batch();
        batch.records.push(record("R1", "1.00", "000001", "000002"));

        assert!(matches!(
            batch.render_to_string(),
            Err(CreditFileError::Render { row: 1, .. })
        ));
    }

    #[test]
    fn test_render_rejects_stale_chain() {
        let mut batch = batch();
        batch
            .append(record("R1", "1.00", "000001", "000002"))
            .unwrap();

        let mut stale = record("R2", "1.00", "000001", "000002");
        stale.compute_with(0).unwrap();
        batch.records.push(stale);

        assert!(matches!(
            batch.render_to_string(),
            Err(CreditFileError::Render { row: 2, .. })
        ));
    }

    #[test]
    fn test_generate_writes_raw_and_zip() {
        let dir = tempfile::tempdir().unwrap();
        let mut batch = Batch::new(
            BatchConfig::new("00xx", "LBP1234567890")
                .with_output_dir(dir.path())
                .with_date(date(2025, 6, 18))
                .with_sequence_number(2),
        );
        batch
            .append(record("R1", "102.18", "8656003520", "0276000055"))
            .unwrap();

        let zip_path = batch.generate().unwrap();

        assert_eq!(zip_path, dir.path().join("00xx_20250618000002.zip"));
        assert!(zip_path.exists());
        assert_eq!(
            batch.raw_file_path(),
            Some(dir.path().join("00xx_20250618000002.txt").as_path())
        );
        assert_eq!(batch.zip_file_path(), Some(zip_path.as_path()));
    }

    #[test]
    fn test_finalize_once_rejects_appends_after_generate() {
        let dir = tempfile::tempdir().unwrap();
        let mut batch = Batch::new(
            BatchConfig::new("00xx", "pw")
                .with_output_dir(dir.path())
                .with_mode(GenerationMode::FinalizeOnce),
        );
        batch
            .append(record("R1", "1.00", "000001", "000002"))
            .unwrap();
        batch.generate().unwrap();

        assert!(batch.is_finalized());
        assert!(matches!(
            batch.append(record("R2", "1.00", "000001", "000002")),
            Err(CreditFileError::Finalized)
        ));
        assert_eq!(batch.record_count(), 1);
    }

    #[test]
    fn test_permissive_mode_allows_appends_after_generate() {
        let dir = tempfile::tempdir().unwrap();
        let mut batch = Batch::new(BatchConfig::new("00xx", "pw").with_output_dir(dir.path()));
        batch
            .append(record("R1", "1.00", "000001", "000002"))
            .unwrap();
        batch.generate().unwrap();

        batch
            .append(record("R2", "1.00", "000001", "000002"))
            .unwrap();
        assert!(!batch.is_finalized());
        assert_eq!(batch.record_count(), 2);
    }

    struct FailingArchiver;

    impl Archiver for FailingArchiver {
        fn archive(&self, _: &Path, _: &Path, _: &str) -> Result<()> {
            Err(CreditFileError::Archive("disk full".to_string()))
        }
    }

    #[test]
    fn test_archive_failure_keeps_raw_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut batch = Batch::new(BatchConfig::new("00xx", "pw").with_output_dir(dir.path()));
        batch
            .append(record("R1", "1.00", "000001", "000002"))
            .unwrap();

        assert!(matches!(
            batch.generate_with(&FailingArchiver),
            Err(CreditFileError::Archive(_))
        ));
        let raw = batch.raw_file_path().unwrap();
        assert!(raw.exists());
        assert!(batch.zip_file_path().is_none());
        assert_eq!(batch.record_count(), 1);
    }
}
