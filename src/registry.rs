//! Operation registry
//!
//! Name-based lookup of operation strategies, seeded with the built-ins and
//! extensible at runtime.

use std::collections::HashMap;
use std::fmt;

use crate::error::{CalcError, Result};
use crate::operations::{Arithmetic, Operation};

/// Produces a fresh strategy instance for every lookup.
pub type OperationFactory = Box<dyn Fn() -> Box<dyn Operation> + Send + Sync>;

/// Registry of arithmetic operations
///
/// Maps case-insensitive operation names to factories. A registry is an
/// owned value handed to the [`Calculator`](crate::calculator::Calculator);
/// there is no process-wide table.
///
/// # Example
/// ```
/// use memento_calc::operations::Operation;
/// use memento_calc::registry::OperationRegistry;
///
/// let registry = OperationRegistry::with_builtins();
/// let op = registry.create("ADD").unwrap();
/// assert_eq!(op.name(), "add");
/// assert!(registry.create("frobnicate").is_err());
/// ```
pub struct OperationRegistry {
    /// Map of lowercase operation name to factory
    factories: HashMap<String, OperationFactory>,
}

impl OperationRegistry {
    /// Create a new empty registry
    ///
    /// # Example
    /// ```
    /// use memento_calc::registry::OperationRegistry;
    ///
    /// let registry = OperationRegistry::new();
    /// assert!(registry.is_empty());
    /// ```
    pub fn new() -> Self {
        log::debug!("Creating new operation registry");
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry seeded with the ten built-in operations
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for arithmetic in Arithmetic::ALL {
            registry.insert(
                arithmetic.key(),
                Box::new(move || -> Box<dyn Operation> { Box::new(arithmetic) }),
            );
        }
        registry
    }

    /// Register an operation factory
    ///
    /// If an operation with the same name already exists, it is replaced.
    /// This allows built-ins to be overridden at runtime.
    ///
    /// The factory is probed once: the strategy it produces must report a
    /// non-empty name.
    ///
    /// # Errors
    /// Returns [`CalcError::Validation`] if `name` is blank or contains
    /// whitespace, or if the factory produces an unnamed strategy.
    ///
    /// # Example
    /// ```
    /// use memento_calc::operations::Arithmetic;
    /// use memento_calc::registry::OperationRegistry;
    ///
    /// let mut registry = OperationRegistry::new();
    /// registry
    ///     .register("plus", || Box::new(Arithmetic::Add))
    ///     .unwrap();
    /// assert!(registry.contains("Plus"));
    /// ```
    pub fn register<F>(&mut self, name: &str, factory: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Operation> + Send + Sync + 'static,
    {
        let key = name.trim();
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(CalcError::validation(format!(
                "Invalid operation name: '{name}'"
            )));
        }
        if factory().name().trim().is_empty() {
            return Err(CalcError::validation(format!(
                "Operation registered as '{key}' does not report a name"
            )));
        }

        self.insert(key, Box::new(factory));
        Ok(())
    }

    fn insert(&mut self, name: &str, factory: OperationFactory) {
        let key = name.to_lowercase();
        if self.factories.insert(key.clone(), factory).is_some() {
            log::info!("Replacing operation: {key}");
        } else {
            log::debug!("Registering operation: {key}");
        }
    }

    /// Create a strategy by name (case-insensitive)
    ///
    /// # Errors
    /// Returns [`CalcError::Operation`] naming the requested identifier if it
    /// is not registered.
    pub fn create(&self, name: &str) -> Result<Box<dyn Operation>> {
        let key = name.trim().to_lowercase();
        match self.factories.get(&key) {
            Some(factory) => Ok(factory()),
            None => Err(CalcError::operation(format!(
                "Unknown operation: '{}'. Supported operations are: {}",
                name,
                self.names().join(", ")
            ))),
        }
    }

    /// Check if an operation is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.trim().to_lowercase())
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered operations
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.names())
            .finish()
    }
}
