//! Calculation-state engine for an interactive decimal calculator
//!
//! Binary operations run on exact decimals through pluggable strategies.
//! Every successful calculation is recorded in a bounded history that
//! supports snapshot-based undo/redo, fans out to observers, and
//! round-trips through a CSV history file.
//!
//! ```
//! use std::sync::Arc;
//! use memento_calc::calculator::Calculator;
//! use memento_calc::config::CalculatorConfig;
//! use memento_calc::registry::OperationRegistry;
//! use memento_calc::storage::CsvHistoryStore;
//!
//! let dir = std::env::temp_dir().join("memento-calc-doc");
//! let config = CalculatorConfig::with_base_dir(&dir);
//! let store = Arc::new(CsvHistoryStore::new(config.history_file()));
//! let mut calc = Calculator::new(config, OperationRegistry::with_builtins(), store).unwrap();
//!
//! calc.select_operation("add").unwrap();
//! assert_eq!(calc.perform("0.1", "0.2").unwrap().to_string(), "0.3");
//! assert!(calc.undo());
//! assert!(calc.history().is_empty());
//! ```

pub mod calculation;
pub mod calculator;
pub mod config;
pub mod error;
pub mod format;
pub mod history;
pub mod input;
pub mod observer;
pub mod operations;
pub mod registry;
pub mod repl;
pub mod storage;

pub use calculation::{Calculation, CalculationRecord};
pub use calculator::Calculator;
pub use config::CalculatorConfig;
pub use error::{CalcError, Result};
pub use operations::{Arithmetic, Operation};
pub use registry::OperationRegistry;
