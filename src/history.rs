//! Bounded calculation history and its snapshots

use std::collections::VecDeque;

use crate::calculation::Calculation;

/// Ordered calculations, oldest first, capped at `max_size`
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Calculation>,
    max_size: usize,
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size,
        }
    }

    /// Append a calculation, evicting the oldest entries beyond the cap.
    pub fn push(&mut self, calculation: Calculation) {
        self.entries.push_back(calculation);
        self.trim();
    }

    /// Replace the contents wholesale, keeping only the newest `max_size`.
    pub fn replace(&mut self, calculations: Vec<Calculation>) {
        self.entries = calculations.into();
        self.trim();
    }

    fn trim(&mut self) {
        while self.entries.len() > self.max_size {
            if let Some(evicted) = self.entries.pop_front() {
                log::debug!("History full, evicted: {evicted}");
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn last(&self) -> Option<&Calculation> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Calculation> {
        self.entries.iter()
    }

    /// Owned copy of the entries, oldest first.
    pub fn to_vec(&self) -> Vec<Calculation> {
        self.entries.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            entries: self.to_vec(),
        }
    }

    pub fn restore(&mut self, snapshot: HistorySnapshot) {
        self.replace(snapshot.entries);
    }
}

/// Independent point-in-time copy of a [`History`]
///
/// A snapshot owns its entries; later changes to the history do not reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    entries: Vec<Calculation>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Calculation] {
        &self.entries
    }
}
