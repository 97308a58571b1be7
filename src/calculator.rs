//! Calculator orchestrator
//!
//! The [`Calculator`] owns the history, the undo/redo stacks, the selected
//! operation and the observer list. It validates raw operands, runs the
//! selected operation, records the result and fans out notifications.

use std::fs;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::calculation::{Calculation, IntegrityWarning, Restored};
use crate::config::CalculatorConfig;
use crate::error::{CalcError, Result};
use crate::format::format_calculation;
use crate::history::{History, HistorySnapshot};
use crate::input::validate_number;
use crate::observer::{CalculationObserver, ObserverId};
use crate::operations::Operation;
use crate::registry::OperationRegistry;
use crate::storage::{CsvHistoryStore, HistoryStore};

/// Calculator lifecycle state
///
/// 1. Idle - no operation selected, `perform` is rejected
/// 2. Ready - an operation is selected and `perform` runs it
#[derive(Debug)]
enum CalculatorState {
    /// No operation selected yet
    Idle,
    /// Operation selected, awaiting operands
    Ready(Box<dyn Operation>),
}

/// Calculation-state engine
///
/// Handles:
/// - Operation selection through the owned registry
/// - Operand validation and execution
/// - Bounded history with snapshot-based undo/redo
/// - Observer fan-out
/// - History persistence through a [`HistoryStore`]
pub struct Calculator {
    config: CalculatorConfig,
    registry: OperationRegistry,
    store: Arc<dyn HistoryStore>,
    state: CalculatorState,
    history: History,
    undo_stack: Vec<HistorySnapshot>,
    redo_stack: Vec<HistorySnapshot>,
    observers: Vec<(ObserverId, Box<dyn CalculationObserver>)>,
    next_observer_id: u64,
    integrity_warnings: Vec<IntegrityWarning>,
}

impl Calculator {
    /// Create a calculator with an empty history
    ///
    /// # Errors
    /// Returns [`CalcError::Configuration`] if `config` fails validation.
    pub fn new(
        config: CalculatorConfig,
        registry: OperationRegistry,
        store: Arc<dyn HistoryStore>,
    ) -> Result<Self> {
        config.validate()?;
        log::debug!("Creating calculator with {:?}", registry);

        let history = History::new(config.max_history_size);
        Ok(Self {
            config,
            registry,
            store,
            state: CalculatorState::Idle,
            history,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            observers: Vec::new(),
            next_observer_id: 0,
            integrity_warnings: Vec::new(),
        })
    }

    /// Create a CSV-backed calculator at `config.history_file()` with the
    /// built-in operations, loading any saved history
    ///
    /// A history file that cannot be loaded is logged and skipped; the
    /// calculator then starts empty.
    ///
    /// # Errors
    /// Returns [`CalcError::Configuration`] if `config` is invalid or the
    /// history directory cannot be created.
    pub fn open(config: CalculatorConfig) -> Result<Self> {
        config.validate()?;

        let history_dir = config.history_dir();
        fs::create_dir_all(&history_dir).map_err(|e| {
            CalcError::configuration(format!(
                "Cannot create history directory {}: {e}",
                history_dir.display()
            ))
        })?;

        let store = Arc::new(CsvHistoryStore::new(config.history_file()));
        let mut calculator = Self::new(config, OperationRegistry::with_builtins(), store)?;

        match calculator.load() {
            // The startup load is the session's starting point, not an undoable step.
            Ok(()) => calculator.undo_stack.clear(),
            Err(e) => log::warn!("Could not load existing history: {e}"),
        }

        log::info!("Calculator initialized with configuration");
        Ok(calculator)
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Mutable registry access for runtime extension
    pub fn registry_mut(&mut self) -> &mut OperationRegistry {
        &mut self.registry
    }

    /// Shared handle to the backing store, e.g. for an auto-save observer
    pub fn store(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.store)
    }

    // ------------------------------------------------------------------
    // Operation selection
    // ------------------------------------------------------------------

    /// Select the operation used by subsequent `perform` calls
    pub fn set_operation(&mut self, operation: Box<dyn Operation>) {
        log::info!("Set operation: {}", operation.display_name());
        self.state = CalculatorState::Ready(operation);
    }

    /// Look `name` up in the registry and select it
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] if the name is not registered; the
    /// current selection is left unchanged.
    pub fn select_operation(&mut self, name: &str) -> Result<()> {
        let operation = self.registry.create(name)?;
        self.set_operation(operation);
        Ok(())
    }

    /// Check if an operation is selected
    pub fn is_ready(&self) -> bool {
        matches!(self.state, CalculatorState::Ready(_))
    }

    pub fn operation(&self) -> Option<&dyn Operation> {
        match &self.state {
            CalculatorState::Idle => None,
            CalculatorState::Ready(operation) => Some(operation.as_ref()),
        }
    }

    // ------------------------------------------------------------------
    // Calculation
    // ------------------------------------------------------------------

    /// Run the selected operation on two raw operands
    ///
    /// On success the pre-calculation history is pushed onto the undo
    /// stack, the redo stack is cleared, the calculation is appended
    /// (evicting the oldest entry when over capacity) and every observer is
    /// notified.
    ///
    /// # Errors
    /// - [`CalcError::Operation`] if no operation is selected or arithmetic fails
    /// - [`CalcError::Validation`] if an operand is not a number, exceeds
    ///   the configured maximum, or is rejected by the operation
    ///
    /// History, stacks and observers are untouched by any of the above.
    /// An observer error is returned as-is after the calculation has been
    /// recorded.
    pub fn perform(&mut self, a: &str, b: &str) -> Result<Decimal> {
        let CalculatorState::Ready(operation) = &self.state else {
            return Err(CalcError::operation("No operation set"));
        };

        let calculation = validate_number(a, &self.config)
            .and_then(|a| Ok((a, validate_number(b, &self.config)?)))
            .and_then(|(a, b)| Calculation::new(operation.as_ref(), a, b))
            .inspect_err(|e| match e {
                CalcError::Validation(_) => log::error!("Validation error: {e}"),
                _ => log::error!("Operation failed: {e}"),
            })?;
        let result = calculation.result();

        self.record_undo_point();
        self.history.push(calculation.clone());

        self.notify(&calculation)?;
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Restore the history as it was before the last recorded change
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.history.snapshot());
        self.history.restore(previous);
        log::debug!("Undo: history now has {} entries", self.history.len());
        true
    }

    /// Re-apply the last undone change
    ///
    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo_stack.pop() else {
            return false;
        };
        self.push_undo(self.history.snapshot());
        self.history.restore(next);
        log::debug!("Redo: history now has {} entries", self.history.len());
        true
    }

    /// Snapshot the live history before a change; the redo branch is dropped.
    fn record_undo_point(&mut self) {
        self.push_undo(self.history.snapshot());
        self.redo_stack.clear();
    }

    /// Undo depth is capped at `max_history_size`, dropping the oldest snapshot.
    fn push_undo(&mut self, snapshot: HistorySnapshot) {
        self.undo_stack.push(snapshot);
        if self.undo_stack.len() > self.config.max_history_size {
            self.undo_stack.remove(0);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Empty the history and both undo and redo stacks. Cannot be undone.
    pub fn clear(&mut self) {
        self.history.clear();
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::info!("History cleared");
    }

    // ------------------------------------------------------------------
    // History access
    // ------------------------------------------------------------------

    pub fn history(&self) -> &History {
        &self.history
    }

    /// History lines for display, results rounded to the configured precision
    pub fn show_history(&self) -> Vec<String> {
        self.history
            .iter()
            .map(|c| format_calculation(c, self.config.precision))
            .collect()
    }

    /// Integrity warnings collected by the most recent `load`
    pub fn integrity_warnings(&self) -> &[IntegrityWarning] {
        &self.integrity_warnings
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write the full history to the store
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] if the store cannot be written.
    pub fn save(&self) -> Result<()> {
        let rows: Vec<_> = self.history.iter().map(Calculation::to_storable).collect();
        self.store.write_all(&rows).inspect_err(|e| {
            log::error!("Failed to save history: {e}");
        })?;

        if rows.is_empty() {
            log::info!("Empty history saved");
        } else {
            log::info!("History saved: {} calculations", rows.len());
        }
        Ok(())
    }

    /// Replace the history with the stored one
    ///
    /// Rows are restored in order; results are recomputed and mismatches
    /// reported through [`integrity_warnings`](Self::integrity_warnings).
    /// A load is an undoable change: the pre-load history is pushed onto the
    /// undo stack and the redo stack is cleared.
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] if the store cannot be read or any
    /// row is malformed; the current history is then left untouched.
    pub fn load(&mut self) -> Result<()> {
        let restored = self
            .store
            .read_all()
            .and_then(|rows| {
                rows.iter()
                    .map(|row| Calculation::from_storable(row, &self.registry))
                    .collect::<Result<Vec<Restored>>>()
            })
            .map_err(|e| {
                log::error!("Failed to load history: {e}");
                CalcError::operation(format!("Failed to load history: {}", e.message()))
            })?;

        let mut calculations = Vec::with_capacity(restored.len());
        let mut warnings = Vec::new();
        for Restored {
            calculation,
            warning,
        } in restored
        {
            calculations.push(calculation);
            warnings.extend(warning);
        }

        log::info!("Loaded {} calculations from history", calculations.len());
        self.record_undo_point();
        self.history.replace(calculations);
        self.integrity_warnings = warnings;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register an observer; returns a handle for `remove_observer`
    pub fn add_observer(&mut self, observer: Box<dyn CalculationObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer_id);
        self.next_observer_id += 1;
        log::info!("Added observer: {observer:?}");
        self.observers.push((id, observer));
        id
    }

    /// Unregister an observer; returns `false` if the handle is unknown
    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let Some(index) = self.observers.iter().position(|(oid, _)| *oid == id) else {
            return false;
        };
        let (_, observer) = self.observers.remove(index);
        log::info!("Removed observer: {observer:?}");
        true
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Call every observer in registration order, stopping at the first error
    ///
    /// # Errors
    /// Returns the first observer error unchanged.
    pub fn notify(&mut self, calculation: &Calculation) -> Result<()> {
        for (_, observer) in self.observers.iter_mut() {
            observer.update(calculation, &self.history)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Calculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calculator")
            .field("state", &self.state)
            .field("history_len", &self.history.len())
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
