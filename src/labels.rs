// src/labels.rs
//! Label allocation for extracted entities.
//!
//! Two disciplines coexist. *Interned* labels are derived from a structural
//! key (`class;lang.Int`, `field;{#12};INSTANCE`, …); re-deriving the same
//! key always yields the same label, which is what lets one part of the
//! extraction reference an entity another part produced. *Fresh* labels are
//! unique within a run and never reproducible: every statement, expression
//! and synthesized wrapper gets one.

use rustc_hash::FxHashMap;
use std::fmt;

/// Identity of one emitted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u32);

impl Label {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocates and interns labels for one extraction run.
#[derive(Debug, Default)]
pub struct LabelStore {
    lookup: FxHashMap<String, Label>,
    /// Structural key per label; `None` for fresh labels.
    keys: Vec<Option<String>>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label for a structural key, allocating on first use.
    pub fn intern(&mut self, key: &str) -> Label {
        if let Some(id) = self.lookup.get(key) {
            return *id;
        }
        let id = Label(self.keys.len() as u32);
        self.keys.push(Some(key.to_string()));
        self.lookup.insert(key.to_string(), id);
        id
    }

    /// Label for a key that is already known to be interned.
    pub fn get(&self, key: &str) -> Option<Label> {
        self.lookup.get(key).copied()
    }

    /// A run-unique label with no derivable key.
    pub fn fresh(&mut self) -> Label {
        let id = Label(self.keys.len() as u32);
        self.keys.push(None);
        id
    }

    /// The structural key a label was interned under, if any.
    pub fn key(&self, label: Label) -> Option<&str> {
        self.keys[label.0 as usize].as_deref()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
