//! Settlement instruction record and its checksum computation.
//!
//! A record's checksum is `cents(amount) * (last6(source) + last6(receiver))`.
//! The running checksum adds the chain value carried in from the previous
//! record of the batch.

use crate::decimal::Amount;
use crate::error::{CreditFileError, Result};
use chrono::NaiveDateTime;

/// Number of trailing account-number characters that feed the checksum.
const ACCOUNT_DIGITS: usize = 6;

/// Checksum values computed for a record against a given chain seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checksums {
    /// Chain value injected before computation.
    pub incoming_chain: i64,

    /// This record's own checksum.
    pub checksum: i64,

    /// `checksum + incoming_chain`.
    pub running_checksum: i64,
}

/// Lifecycle of a record's derived checksum fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumState {
    /// Not computed yet, or invalidated by a new chain seed.
    #[default]
    Uncomputed,

    /// Computed against `Checksums::incoming_chain`.
    Computed(Checksums),
}

/// One money-transfer instruction.
///
/// Code fields (transaction type, settlement type, bank code, ...) are stored
/// as opaque strings. Fields required by the checksum are `Option`s so that a
/// missing value is reported instead of silently defaulting.
#[derive(Debug, Clone, Default)]
pub struct Record {
    pub reference_number: String,
    pub transaction_type: String,
    pub timestamp: Option<NaiveDateTime>,
    pub settlement_type: String,
    pub target_crediting_application: String,
    pub destination_bank_code: String,
    pub source_account_number: Option<String>,
    pub receivers_account_number: Option<String>,
    pub merchant_biller_code: Option<String>,
    pub merchant_reference_number: Option<String>,
    pub transaction_amount: Option<Amount>,

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
    pub details: [Option<String>; 5],

    incoming_chain: i64,
    state: ChecksumState,
}

impl Record {
    /// Creates an empty record with no mandatory fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects the chain value carried in from the previous record.
    ///
    /// A computation made against a different seed is discarded.
    pub fn set_incoming_chain(&mut self, chain: i64) {
        if let ChecksumState::Computed(c) = self.state {
            if c.incoming_chain != chain {
                self.state = ChecksumState::Uncomputed;
            }
        }
        self.incoming_chain = chain;
    }

    /// The chain value currently injected (0 until set).
    pub fn incoming_chain(&self) -> i64 {
        self.incoming_chain
    }

    /// Computes checksum and running checksum against the injected chain value.
    ///
    /// The record is left unchanged on error.
    pub fn compute(&mut self) -> Result<Checksums> {
        let checksums = self.evaluate(self.incoming_chain)?;
        self.state = ChecksumState::Computed(checksums);
        Ok(checksums)
    }

    /// Injects `chain` and computes in one step.
    pub fn compute_with(&mut self, chain: i64) -> Result<Checksums> {
        let checksums = self.evaluate(chain)?;
        self.incoming_chain = chain;
        self.state = ChecksumState::Computed(checksums);
        Ok(checksums)
    }

    /// Current checksum lifecycle state.
    pub fn state(&self) -> ChecksumState {
        self.state
    }

    /// Computed checksums, or `None` while uncomputed.
    pub fn checksums(&self) -> Option<Checksums> {
        match self.state {
            ChecksumState::Computed(c) => Some(c),
            ChecksumState::Uncomputed => None,
        }
    }

    /// This record's own checksum, or `None` while uncomputed.
    pub fn checksum(&self) -> Option<i64> {
        self.checksums().map(|c| c.checksum)
    }

    /// Checksum plus incoming chain, or `None` while uncomputed.
    pub fn running_checksum(&self) -> Option<i64> {
        self.checksums().map(|c| c.running_checksum)
    }

    /// Transaction amount, failing if it was never assigned.
    pub fn amount(&self) -> Result<Amount> {
        self.transaction_amount
            .ok_or(CreditFileError::MissingField {
                field: "transaction_amount",
            })
    }

    /// Timestamp, failing if it was never assigned.
    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        self.timestamp
            .ok_or(CreditFileError::MissingField { field: "timestamp" })
    }

    fn evaluate(&self, incoming_chain: i64) -> Result<Checksums> {
        let cents = self.amount()?.to_minor_units()?;
        self.timestamp()?;

        let source = account_digits(
            "source_account_number",
            self.source_account_number.as_deref(),
        )?;
        let receiver = account_digits(
            "receivers_account_number",
            self.receivers_account_number.as_deref(),
        )?;

        let checksum = source
            .checked_add(receiver)
            .and_then(|digits| cents.checked_mul(digits))
            .ok_or(CreditFileError::ChecksumOverflow)?;
        let running_checksum = checksum
            .checked_add(incoming_chain)
            .ok_or(CreditFileError::ChecksumOverflow)?;

        Ok(Checksums {
            incoming_chain,
            checksum,
            running_checksum,
        })
    }
}

/// Parses the rightmost six characters of an account number as base 10.
///
/// Shorter account numbers use every character; nothing is padded or
/// trimmed, so the digits always match the rendered field.
fn account_digits(field: &'static str, value: Option<&str>) -> Result<i64> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Err(CreditFileError::MissingField { field }),
    };

    let invalid = || CreditFileError::InvalidAccountNumber {
        field,
        value: value.to_string(),
    };

    let start = value
        .char_indices()
        .rev()
        .nth(ACCOUNT_DIGITS - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    let tail = &value[start..];

    if !tail.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    tail.parse::<i64>().map_err(|_| invalid())
}
