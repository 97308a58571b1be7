//! Calculator configuration
//!
//! Settings are read once at startup, either built directly or loaded from
//! `CALCULATOR_*` environment variables, and validated before the
//! calculator is constructed.

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{CalcError, Result};
use crate::input::{parse_decimal, ParsedDecimal};

pub const DEFAULT_MAX_HISTORY_SIZE: usize = 1000;
pub const DEFAULT_PRECISION: u32 = 10;
pub const DEFAULT_ENCODING: &str = "utf-8";

const HISTORY_FILE_NAME: &str = "calculator_history.csv";
const LOG_FILE_NAME: &str = "calculator.log";

/// Static calculator settings
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorConfig {
    /// Root for the default log and history locations
    pub base_dir: PathBuf,
    /// Oldest entries are evicted beyond this many calculations
    pub max_history_size: usize,
    /// Persist history after every calculation
    pub auto_save: bool,
    /// Decimal places shown when displaying results
    pub precision: u32,
    /// Largest accepted operand magnitude
    pub max_input_value: Decimal,
    /// Text encoding for history and log files
    pub default_encoding: String,
    pub log_dir_override: Option<PathBuf>,
    pub log_file_override: Option<PathBuf>,
    pub history_dir_override: Option<PathBuf>,
    pub history_file_override: Option<PathBuf>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self::with_base_dir(PathBuf::from("."))
    }
}

impl CalculatorConfig {
    /// Default settings rooted at `base_dir`
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            auto_save: true,
            precision: DEFAULT_PRECISION,
            max_input_value: Decimal::MAX,
            default_encoding: DEFAULT_ENCODING.to_string(),
            log_dir_override: None,
            log_file_override: None,
            history_dir_override: None,
            history_file_override: None,
        }
    }

    /// Load settings from the process environment
    ///
    /// # Errors
    /// Returns [`CalcError::Configuration`] if a variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup
    ///
    /// Unset keys fall back to defaults; `base_dir` defaults to the current
    /// directory.
    ///
    /// # Errors
    /// Returns [`CalcError::Configuration`] naming the offending variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_dir = lookup("CALCULATOR_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::with_base_dir(base_dir);

        if let Some(size) = parse_var(&lookup, "CALCULATOR_MAX_HISTORY_SIZE")? {
            config.max_history_size = size;
        }
        if let Some(flag) = lookup("CALCULATOR_AUTO_SAVE") {
            let flag = flag.trim().to_lowercase();
            config.auto_save = flag == "true" || flag == "1";
        }
        if let Some(precision) = parse_var(&lookup, "CALCULATOR_PRECISION")? {
            config.precision = precision;
        }
        if let Some(raw) = lookup("CALCULATOR_MAX_INPUT_VALUE") {
            config.max_input_value = parse_max_input(&raw)?;
        }
        if let Some(encoding) = lookup("CALCULATOR_DEFAULT_ENCODING") {
            config.default_encoding = encoding;
        }

        config.log_dir_override = lookup("CALCULATOR_LOG_DIR").map(PathBuf::from);
        config.log_file_override = lookup("CALCULATOR_LOG_FILE").map(PathBuf::from);
        config.history_dir_override = lookup("CALCULATOR_HISTORY_DIR").map(PathBuf::from);
        config.history_file_override = lookup("CALCULATOR_HISTORY_FILE").map(PathBuf::from);

        Ok(config)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir_override
            .clone()
            .unwrap_or_else(|| self.base_dir.join("logs"))
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_file_override
            .clone()
            .unwrap_or_else(|| self.log_dir().join(LOG_FILE_NAME))
    }

    pub fn history_dir(&self) -> PathBuf {
        self.history_dir_override
            .clone()
            .unwrap_or_else(|| self.base_dir.join("history"))
    }

    pub fn history_file(&self) -> PathBuf {
        self.history_file_override
            .clone()
            .unwrap_or_else(|| self.history_dir().join(HISTORY_FILE_NAME))
    }

    /// Check that every setting is usable
    ///
    /// # Errors
    /// Returns [`CalcError::Configuration`] if a numeric setting is not
    /// strictly positive or the encoding is not UTF-8.
    pub fn validate(&self) -> Result<()> {
        if self.max_history_size == 0 {
            return Err(CalcError::configuration("max_history_size must be positive"));
        }
        if self.precision == 0 {
            return Err(CalcError::configuration("precision must be positive"));
        }
        if self.max_input_value <= Decimal::ZERO {
            return Err(CalcError::configuration("max_input_value must be positive"));
        }

        let encoding = self.default_encoding.to_lowercase().replace('_', "-");
        if encoding != "utf-8" && encoding != "utf8" {
            return Err(CalcError::configuration(format!(
                "Unsupported encoding: {} (only utf-8 is supported)",
                self.default_encoding
            )));
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| CalcError::configuration(format!("Invalid {key} '{raw}': {e}")))
        })
        .transpose()
}

/// Limits beyond the decimal range clamp to the largest representable value.
fn parse_max_input(raw: &str) -> Result<Decimal> {
    match parse_decimal(raw) {
        ParsedDecimal::Value(value) => Ok(value),
        ParsedDecimal::OutOfRange if !raw.trim().starts_with('-') => {
            log::info!("CALCULATOR_MAX_INPUT_VALUE {raw} clamped to {}", Decimal::MAX);
            Ok(Decimal::MAX)
        }
        _ => Err(CalcError::configuration(format!(
            "Invalid CALCULATOR_MAX_INPUT_VALUE '{raw}'"
        ))),
    }
}
