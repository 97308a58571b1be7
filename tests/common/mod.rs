#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::str::FromStr;
use std::sync::Arc;

use memento_calc::calculation::Calculation;
use memento_calc::history::History;
use memento_calc::observer::CalculationObserver;
use memento_calc::storage::CsvHistoryStore;
use memento_calc::{CalcError, Calculator, CalculatorConfig, OperationRegistry};
use rust_decimal::Decimal;

pub mod helpers;

/// Parse decimal text in tests
pub fn dec(text: &str) -> Decimal {
    Decimal::from_str(text).unwrap()
}

/// Config rooted in a temporary directory
pub fn temp_config(dir: &Path) -> CalculatorConfig {
    CalculatorConfig::with_base_dir(dir)
}

/// CSV-backed calculator with the built-in operations
pub fn calculator_in(dir: &Path) -> Calculator {
    calculator_with(temp_config(dir))
}

pub fn calculator_with(config: CalculatorConfig) -> Calculator {
    let store = Arc::new(CsvHistoryStore::new(config.history_file()));
    Calculator::new(config, OperationRegistry::with_builtins(), store).unwrap()
}

/// Select `op` and run it
pub fn run(calc: &mut Calculator, op: &str, a: &str, b: &str) -> Result<Decimal, CalcError> {
    calc.select_operation(op)?;
    calc.perform(a, b)
}

pub fn history_vec(calc: &Calculator) -> Vec<Calculation> {
    calc.history().to_vec()
}

/// Observer that records what it saw into a shared log
#[derive(Debug)]
pub struct RecordingObserver {
    pub name: &'static str,
    pub seen: Rc<RefCell<Vec<String>>>,
}

impl CalculationObserver for RecordingObserver {
    fn update(&mut self, calculation: &Calculation, history: &History) -> Result<(), CalcError> {
        self.seen.borrow_mut().push(format!(
            "{}:{}:{}",
            self.name,
            calculation.result(),
            history.len()
        ));
        Ok(())
    }
}

/// Observer that always fails
#[derive(Debug)]
pub struct FailingObserver;

impl CalculationObserver for FailingObserver {
    fn update(&mut self, _calculation: &Calculation, _history: &History) -> Result<(), CalcError> {
        Err(CalcError::operation("observer exploded"))
    }
}
