//! Calculation observers
//!
//! Observers are notified synchronously, in registration order, after every
//! successful calculation. An observer error is returned to whoever called
//! [`Calculator::perform`](crate::calculator::Calculator::perform).

use std::fmt;
use std::sync::Arc;

use crate::calculation::{Calculation, CalculationRecord};
use crate::error::Result;
use crate::history::History;
use crate::storage::HistoryStore;

/// Listener for new calculations
pub trait CalculationObserver: fmt::Debug {
    /// Called once per successful calculation
    ///
    /// `history` already contains `calculation`.
    ///
    /// # Errors
    /// Any error is propagated to the caller of `perform`.
    fn update(&mut self, calculation: &Calculation, history: &History) -> Result<()>;
}

/// Handle returned by `add_observer`, used to remove the observer again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// Writes every calculation to the log
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl CalculationObserver for LoggingObserver {
    fn update(&mut self, calculation: &Calculation, _history: &History) -> Result<()> {
        log::info!(
            "Calculation performed: {} ({}, {}) = {}",
            calculation.operation(),
            calculation.operand1(),
            calculation.operand2(),
            calculation.result()
        );
        Ok(())
    }
}

/// Persists the full history after each calculation
#[derive(Debug)]
pub struct AutoSaveObserver {
    store: Arc<dyn HistoryStore>,
    enabled: bool,
}

impl AutoSaveObserver {
    pub fn new(store: Arc<dyn HistoryStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }
}

impl CalculationObserver for AutoSaveObserver {
    fn update(&mut self, _calculation: &Calculation, history: &History) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let rows: Vec<CalculationRecord> = history.iter().map(Calculation::to_storable).collect();
        self.store.write_all(&rows)?;
        log::info!("History auto-saved");
        Ok(())
    }
}
