//! Line codec for the pipe-delimited credit file.
//!
//! Every line is `|`-joined and CRLF-terminated. Field values are written
//! verbatim: a value containing `|` or a line break corrupts the layout, and
//! that is a property of the bank format.

use crate::decimal::MoneyTotal;
use crate::error::{CreditFileError, Result};
use crate::record::Record;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::io::Write;

/// Field delimiter.
pub const DELIMITER: u8 = b'|';

/// Number of fields on a data line.
pub const DATA_FIELD_COUNT: usize = 32;

/// Placeholder written for absent remarks and detail fields.
pub const NULL_LITERAL: &str = "null";

/// Writes header, data and footer lines to an underlying writer.
pub struct LineWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl<W: Write> LineWriter<W> {
    /// Wraps `writer` with the `|`/CRLF/no-quoting line layout.
    pub fn new(writer: W) -> Self {
        let inner = WriterBuilder::new()
            .delimiter(DELIMITER)
            .terminator(Terminator::CRLF)
            .quote_style(QuoteStyle::Never)
            .has_headers(false)
            .flexible(true)
            .from_writer(writer);
        LineWriter { inner }
    }

    /// Header line: the batch number alone.
    pub fn write_header(&mut self, batch_number: &str) -> Result<()> {
        self.inner.write_record([batch_number]).map_err(write_error)?;
        Ok(())
    }

    /// One data line for a record.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        self.inner
            .write_record(data_fields(record)?)
            .map_err(write_error)?;
        Ok(())
    }

    /// Footer line: `count|total|checksum_sum`.
    pub fn write_footer(
        &mut self,
        record_count: usize,
        total: MoneyTotal,
        checksum_sum: i64,
    ) -> Result<()> {
        self.inner.write_record([
            record_count.to_string(),
            total.to_string(),
            checksum_sum.to_string(),
        ])
            .map_err(write_error)?;
        Ok(())
    }

    /// Flushes buffered lines and returns the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|e| CreditFileError::Io(e.into_error()))
    }
}

/// Surfaces failures of the underlying writer as `Io`, whichever call hits them.
fn write_error(err: csv::Error) -> CreditFileError {
    if !err.is_io_error() {
        return CreditFileError::Csv(err);
    }
    match err.into_kind() {
        csv::ErrorKind::Io(io_err) => CreditFileError::Io(io_err),
        _ => unreachable!("is_io_error implies ErrorKind::Io"),
    }
}

/// Fields of a data line, in wire order.
///
/// Merchant fields and middle names render empty when absent; remarks and
/// details render `null`.
pub fn data_fields(record: &Record) -> Result<Vec<String>> {
    let timestamp = record.timestamp()?;
    let amount = record.amount()?;

    let mut fields = Vec::with_capacity(DATA_FIELD_COUNT);
    fields.push(record.reference_number.clone());
    fields.push(record.transaction_type.clone());
    fields.push(timestamp.format("%Y%m%d").to_string());
    fields.push(timestamp.format("%H%M%S").to_string());
    fields.push(record.settlement_type.clone());
    fields.push(record.target_crediting_application.clone());
    fields.push(record.destination_bank_code.clone());
    fields.push(or_empty(&record.source_account_number));
    fields.push(or_empty(&record.receivers_account_number));
    fields.push(or_empty(&record.merchant_biller_code));
    fields.push(or_empty(&record.merchant_reference_number));
    fields.push(amount.to_string());

    fields.push(record.remitters_last_name.clone());
    fields.push(record.remitters_first_name.clone());
    fields.push(or_empty(&record.remitters_middle_name));
    fields.push(record.remitters_address.clone());

    fields.push(record.receivers_last_name.clone());
    fields.push(record.receivers_first_name.clone());
    fields.push(or_empty(&record.receivers_middle_name));
    fields.push(record.receivers_address.clone());
    fields.push(record.receivers_city.clone());
    fields.push(record.receivers_province.clone());

    fields.push(record.organization_code.clone());
    fields.push(record.currency_code.clone());
    fields.push(record.email_address.clone());
    fields.push(record.customer_type.clone());

    fields.push(or_null(&record.remarks));
    for detail in &record.details {
        fields.push(or_null(detail));
    }

    debug_assert_eq!(fields.len(), DATA_FIELD_COUNT);
    Ok(fields)
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn or_null(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| NULL_LITERAL.to_string())
}
