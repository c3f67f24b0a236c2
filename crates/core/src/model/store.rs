//! Record store with linker-style scoped symbol tables.
//!
//! Registration mimics what a linker would accept: one global per name
//! program-wide, one local per `(name, unit)`, weak symbols held apart until
//! every unit has been ingested and then promoted only where no strong
//! global claims the name.

use std::collections::HashMap;

use thiserror::Error;

use super::{FuncId, FunctionRecord, Linkage, Readiness};

/// Fatal symbol-table conditions. Proceeding past any of these would let the
/// analysis silently pick an arbitrary definition, which breaks the
/// soundness of every bound derived from it.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate global symbol '{name}'")]
    DuplicateGlobal { name: String },

    #[error("duplicate local symbol '{name}' in {translation_unit}")]
    DuplicateLocal { name: String, translation_unit: String },

    #[error("duplicate weak symbol '{name}'")]
    DuplicateWeak { name: String },

    #[error("unknown binding '{binding}' for symbol '{symbol}'")]
    UnknownBinding { binding: String, symbol: String },
}

/// Flat store of [`FunctionRecord`]s plus the lookup tables used for
/// linkage-scoped resolution.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<FunctionRecord>,
    globals: HashMap<String, FuncId>,
    locals: HashMap<(String, String), FuncId>,
    weak: HashMap<String, FuncId>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: FuncId) -> &FunctionRecord {
        &self.records[id.0]
    }

    pub fn get_mut(&mut self, id: FuncId) -> &mut FunctionRecord {
        &mut self.records[id.0]
    }

    /// Iterate record ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = FuncId> {
        (0..self.records.len()).map(FuncId)
    }

    pub fn records(&self) -> &[FunctionRecord] {
        &self.records
    }

    /// Register a symbol-table sighting of a function, creating its record.
    ///
    /// Duplicate registrations within a linkage scope are fatal; the same
    /// local name in two different units is two unrelated functions and is
    /// accepted.
    pub fn register(
        &mut self,
        translation_unit: &str,
        name: &str,
        linkage: Linkage,
    ) -> Result<FuncId, StoreError> {
        let id = FuncId(self.records.len());
        match linkage {
            Linkage::Global => {
                if self.globals.contains_key(name) {
                    return Err(StoreError::DuplicateGlobal { name: name.to_string() });
                }
                self.globals.insert(name.to_string(), id);
            }
            Linkage::Local => {
                let key = (name.to_string(), translation_unit.to_string());
                if self.locals.contains_key(&key) {
                    return Err(StoreError::DuplicateLocal {
                        name: name.to_string(),
                        translation_unit: translation_unit.to_string(),
                    });
                }
                self.locals.insert(key, id);
            }
            Linkage::Weak => {
                if self.weak.contains_key(name) {
                    return Err(StoreError::DuplicateWeak { name: name.to_string() });
                }
                self.weak.insert(name.to_string(), id);
            }
        }
        self.records.push(FunctionRecord::new(name, translation_unit, linkage));
        Ok(id)
    }

    /// Seed a manual-override record under the synthetic manual unit.
    ///
    /// The record is globally visible so that calls from any unit terminate
    /// on the declared bound.
    pub fn seed_manual(&mut self, name: &str, stack_bytes: u64) -> Result<FuncId, StoreError> {
        if self.globals.contains_key(name) {
            return Err(StoreError::DuplicateGlobal { name: name.to_string() });
        }
        let id = FuncId(self.records.len());
        self.globals.insert(name.to_string(), id);
        self.records.push(FunctionRecord::manual(name, stack_bytes));
        Ok(id)
    }

    /// Promote weak symbols after every unit's symbol table is ingested.
    ///
    /// A weak name becomes globally resolvable only when no strong global of
    /// that name exists; otherwise the strong definition wins and the weak
    /// record is marked superseded.
    pub fn promote_weak_symbols(&mut self) {
        let weak: Vec<(String, FuncId)> =
            self.weak.iter().map(|(name, id)| (name.clone(), *id)).collect();
        for (name, id) in weak {
            if self.globals.contains_key(&name) {
                self.records[id.0].readiness = Readiness::Superseded;
                log::debug!("weak symbol '{name}' superseded by a strong global");
            } else {
                self.globals.insert(name, id);
            }
        }
    }

    /// Resolve a callee name as seen from `caller_tu`.
    ///
    /// Globals are visible from any unit; locals only from their own. A miss
    /// is not an error: the target is likely library or vector code with no
    /// visible definition.
    pub fn resolve(&self, caller_tu: &str, callee_name: &str) -> Option<FuncId> {
        if let Some(id) = self.globals.get(callee_name) {
            return Some(*id);
        }
        self.locals.get(&(callee_name.to_string(), caller_tu.to_string())).copied()
    }

    /// Resolve a function by its pretty name, scoped like [`resolve`].
    ///
    /// Stack-usage reports identify functions by decorated name while the
    /// symbol tables use linker names, so this scans demangled names instead.
    /// Callers treat a miss as a fatal artifact mismatch.
    ///
    /// [`resolve`]: RecordStore::resolve
    pub fn resolve_by_demangled_name(&self, tu: &str, pretty_name: &str) -> Option<FuncId> {
        for id in self.globals.values() {
            if self.records[id.0].demangled_name.as_deref() == Some(pretty_name) {
                return Some(*id);
            }
        }
        for ((_, unit), id) in &self.locals {
            if unit == tu && self.records[id.0].demangled_name.as_deref() == Some(pretty_name) {
                return Some(*id);
            }
        }
        None
    }
}
