//! CSV input rows for the command line tool.

use crate::decimal::Amount;
use crate::error::{CreditFileError, Result};
use crate::record::Record;
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::Deserialize;
use std::io::Read;
use std::str::FromStr;

/// Accepted format of the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Raw instruction row as read from CSV.
///
/// Empty cells deserialize as `None`; optional fields keep that, mandatory
/// ones are reported when the row is converted.
#[derive(Debug, Deserialize)]
pub struct RecordRow {
    pub reference_number: String,
    pub transaction_type: String,
    pub timestamp: Option<String>,
    pub settlement_type: String,
    pub target_crediting_application: String,
    pub destination_bank_code: String,
    pub source_account_number: Option<String>,
    pub receivers_account_number: Option<String>,
    pub merchant_biller_code: Option<String>,
    pub merchant_reference_number: Option<String>,
    pub transaction_amount: Option<String>,
    pub remitters_last_name: String,
    pub remitters_first_name: String,
    pub remitters_middle_name: Option<String>,
    pub remitters_address: String,
    pub receivers_last_name: String,
    pub receivers_first_name: String,
    pub receivers_middle_name: Option<String>,
    pub receivers_address: String,
    pub receivers_city: String,
    pub receivers_province: String,
    pub organization_code: String,
    pub currency_code: String,
    pub email_address: String,
    pub customer_type: String,
    pub remarks: Option<String>,
    pub details1: Option<String>,
    pub details2: Option<String>,
    pub details3: Option<String>,
    pub details4: Option<String>,
    pub details5: Option<String>,
}

impl RecordRow {
    /// Converts the raw row into a `Record`.
    ///
    /// Missing amounts, timestamps and account numbers are left as `None`
    /// and surface as `MissingField` when the record is appended.
    pub fn into_record(self) -> std::result::Result<Record, String> {
        let transaction_amount = non_empty(self.transaction_amount)
            .map(|raw| Amount::from_str(&raw).map_err(|e| e.to_string()))
            .transpose()?;

        let timestamp = non_empty(self.timestamp)
            .map(|raw| {
                NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
                    .map_err(|e| format!("invalid timestamp {:?}: {}", raw, e))
            })
            .transpose()?;

        let mut record = Record::new();
        record.reference_number = self.reference_number;
        record.transaction_type = self.transaction_type;
        record.timestamp = timestamp;
        record.settlement_type = self.settlement_type;
        record.target_crediting_application = self.target_crediting_application;
        record.destination_bank_code = self.destination_bank_code;
        record.source_account_number = non_empty(self.source_account_number);
        record.receivers_account_number = non_empty(self.receivers_account_number);
        record.merchant_biller_code = non_empty(self.merchant_biller_code);
        record.merchant_reference_number = non_empty(self.merchant_reference_number);
        record.transaction_amount = transaction_amount;
        record.remitters_last_name = self.remitters_last_name;
        record.remitters_first_name = self.remitters_first_name;
        record.remitters_middle_name = non_empty(self.remitters_middle_name);
        record.remitters_address = self.remitters_address;
        record.receivers_last_name = self.receivers_last_name;
        record.receivers_first_name = self.receivers_first_name;
        record.receivers_middle_name = non_empty(self.receivers_middle_name);
        record.receivers_address = self.receivers_address;
        record.receivers_city = self.receivers_city;
        record.receivers_province = self.receivers_province;
        record.organization_code = self.organization_code;
        record.currency_code = self.currency_code;
        record.email_address = self.email_address;
        record.customer_type = self.customer_type;
        record.remarks = non_empty(self.remarks);
        record.details = [
            non_empty(self.details1),
            non_empty(self.details2),
            non_empty(self.details3),
            non_empty(self.details4),
            non_empty(self.details5),
        ];
        Ok(record)
    }
}

/// Reads every instruction row from a CSV reader with a header line.
///
/// The first malformed row aborts the read; no row is skipped.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let mut records = Vec::new();
    for (row_idx, result) in csv_reader.deserialize::<RecordRow>().enumerate() {
        let row = row_idx + 2; // 1-indexed, accounting for header row

        let raw = result.map_err(|e| CreditFileError::InvalidRecord {
            row,
            message: e.to_string(),
        })?;
        let record = raw
            .into_record()
            .map_err(|message| CreditFileError::InvalidRecord { row, message })?;

        debug!("Row {}: read {}", row, record.reference_number);
        records.push(record);
    }

    Ok(records)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
