//! Calculation records
//!
//! A [`Calculation`] is built by running an operation, so its result is
//! always consistent with its operation and operands. [`CalculationRecord`]
//! is the flat, all-text form written to storage.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CalcError, Result};
use crate::input::{parse_decimal, ParsedDecimal};
use crate::operations::Operation;
use crate::registry::OperationRegistry;

/// ISO-8601 layout used for persisted timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One executed operation
///
/// Equality compares operation, operands and result; the timestamp is
/// ignored.
#[derive(Debug, Clone)]
pub struct Calculation {
    operation: String,
    operand1: Decimal,
    operand2: Decimal,
    result: Decimal,
    timestamp: NaiveDateTime,
}

impl Calculation {
    /// Run `operation` on the operands and record the outcome
    ///
    /// # Errors
    /// Propagates the operation's error unchanged: [`CalcError::Validation`]
    /// for rejected operands, [`CalcError::Operation`] for failed arithmetic.
    pub fn new(operation: &dyn Operation, operand1: Decimal, operand2: Decimal) -> Result<Self> {
        let result = operation.execute(operand1, operand2)?;
        Ok(Self {
            operation: operation.name().to_string(),
            operand1,
            operand2,
            result,
            timestamp: Local::now().naive_local(),
        })
    }

    /// Resolve `name` in `registry` and record the outcome
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] if the name is unknown or the
    /// operation rejects the operands.
    pub fn create(
        registry: &OperationRegistry,
        name: &str,
        operand1: Decimal,
        operand2: Decimal,
    ) -> Result<Self> {
        let operation = registry.create(name)?;
        Self::new(operation.as_ref(), operand1, operand2)
            .map_err(|e| e.into_operation(&format!("Cannot calculate {name}")))
    }

    /// Replace the timestamp, used when restoring from storage
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn operand1(&self) -> Decimal {
        self.operand1
    }

    pub fn operand2(&self) -> Decimal {
        self.operand2
    }

    pub fn result(&self) -> Decimal {
        self.result
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Flatten into an all-text storage row
    pub fn to_storable(&self) -> CalculationRecord {
        CalculationRecord {
            operation: self.operation.clone(),
            operand1: self.operand1.to_string(),
            operand2: self.operand2.to_string(),
            result: self.result.to_string(),
            timestamp: self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Rebuild a calculation from a storage row
    ///
    /// The result is recomputed from the stored operands. A stored result
    /// that disagrees is reported through [`Restored::warning`] rather than
    /// failing the restore.
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] naming the malformed field, or if
    /// the operation is unknown or rejects the stored operands.
    pub fn from_storable(
        record: &CalculationRecord,
        registry: &OperationRegistry,
    ) -> Result<Restored> {
        let operand1 = parse_field("operand1", &record.operand1)?;
        let operand2 = parse_field("operand2", &record.operand2)?;
        let stored_result = parse_field("result", &record.result)?;
        let timestamp = parse_timestamp(&record.timestamp)?;

        let calculation =
            Self::create(registry, &record.operation, operand1, operand2)?.with_timestamp(timestamp);

        let warning = (calculation.result != stored_result).then(|| {
            let warning = IntegrityWarning {
                operation: calculation.operation.clone(),
                operand1,
                operand2,
                stored: stored_result,
                recomputed: calculation.result,
            };
            log::warn!("{warning}");
            warning
        });

        Ok(Restored {
            calculation,
            warning,
        })
    }
}

impl PartialEq for Calculation {
    fn eq(&self, other: &Self) -> bool {
        self.operation == other.operation
            && self.operand1 == other.operand1
            && self.operand2 == other.operand2
            && self.result == other.result
    }
}

impl Eq for Calculation {}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}, {}) = {}",
            self.operation, self.operand1, self.operand2, self.result
        )
    }
}

/// Flat storage form of a [`Calculation`]
///
/// Field order is the column order of the history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub operation: String,
    pub operand1: String,
    pub operand2: String,
    pub result: String,
    pub timestamp: String,
}

impl CalculationRecord {
    pub const COLUMNS: [&'static str; 5] =
        ["operation", "operand1", "operand2", "result", "timestamp"];
}

/// A restored calculation plus any integrity finding
#[derive(Debug, Clone)]
pub struct Restored {
    pub calculation: Calculation,
    pub warning: Option<IntegrityWarning>,
}

/// Stored result disagrees with the recomputed one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityWarning {
    pub operation: String,
    pub operand1: Decimal,
    pub operand2: Decimal,
    pub stored: Decimal,
    pub recomputed: Decimal,
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stored result {} for {}({}, {}) does not match recomputed {}",
            self.stored, self.operation, self.operand1, self.operand2, self.recomputed
        )
    }
}

fn parse_field(field: &str, text: &str) -> Result<Decimal> {
    match parse_decimal(text) {
        ParsedDecimal::Value(value) => Ok(value),
        ParsedDecimal::OutOfRange | ParsedDecimal::Invalid => Err(CalcError::operation(format!(
            "Invalid {field} value '{text}' in history record"
        ))),
    }
}

/// Accepts the naive ISO layout written by this crate and RFC 3339 with an offset.
fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| {
            DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Local).naive_local())
        })
        .map_err(|e| {
            CalcError::operation(format!(
                "Invalid timestamp value '{text}' in history record: {e}"
            ))
        })
}
