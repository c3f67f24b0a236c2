//! Core data model for per-function stack records.
//!
//! One [`FunctionRecord`] exists per function seen in any symbol table, plus
//! one per manual override. Records are created when their symbol is first
//! sighted and enriched across the ingestion phases (call-graph dump, then
//! stack-usage report) before evaluation.

mod store;

pub use store::{RecordStore, StoreError};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Translation-unit name under which manual-override records are filed.
///
/// Manual functions have no compiled artifacts, so they get a synthetic unit
/// that cannot collide with a real file name.
pub const MANUAL_UNIT: &str = "#manual";

/// Stable index of a record inside a [`RecordStore`].
///
/// Records are addressed by index rather than by reference so graph
/// traversal state (memoization, on-path marks) can live in flat arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FuncId(pub usize);

/// Linkage class of a symbol, as reported by the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Visible program-wide; names are unique across the whole program.
    Global,
    /// Unit-private (`static`); unique only within one translation unit.
    Local,
    /// Overridable global-like symbol; promoted to global visibility only if
    /// no strong global of the same name exists anywhere.
    Weak,
}

/// Terminal result of evaluating a function's worst-case stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorstCase {
    /// Not evaluated yet (or never evaluated because the record is incomplete).
    Unknown,
    /// Upper bound in bytes on the deepest call path through this function.
    Bounded(u64),
    /// No finite bound exists: recursion or an indirect call was found.
    Unbounded,
}

impl WorstCase {
    pub fn is_known(self) -> bool {
        !matches!(self, WorstCase::Unknown)
    }
}

/// Ingestion readiness of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    /// Still missing call-graph or stack-usage data.
    Pending,
    /// All required fields populated; eligible for evaluation.
    Ready,
    /// Weak symbol that lost promotion to a strong global of the same name.
    /// Excluded from validation, evaluation, and reporting.
    Superseded,
}

/// Everything known about one function across all artifact kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Linker-level symbol name.
    pub name: String,
    /// Translation unit that defines this function.
    pub translation_unit: String,
    pub linkage: Linkage,
    /// Pretty/decorated name from the call-graph dump; set during call-graph
    /// ingestion and used to match stack-usage entries.
    pub demangled_name: Option<String>,
    /// Stack consumed by this frame alone, excluding callees.
    pub local_stack_bytes: Option<u64>,
    /// True when any call site in this function has a syntactically
    /// undeterminable target (e.g. through a function pointer). Never cleared.
    pub has_indirect_call: bool,
    /// Callee names exactly as written in the call-graph dump.
    pub raw_callees: BTreeSet<String>,
    /// Callees that resolved to a record in the store.
    pub resolved_callees: BTreeSet<FuncId>,
    /// Callee names with no matching record (library code, interrupt vectors).
    /// Grows transitively during evaluation: a callee's unresolved names taint
    /// every caller's bound.
    pub unresolved_callees: BTreeSet<String>,
    /// Single-assignment evaluation result.
    pub worst_case: WorstCase,
    /// True for operator-supplied override records.
    pub is_manual: bool,
    pub readiness: Readiness,
}

impl FunctionRecord {
    pub fn new(name: impl Into<String>, translation_unit: impl Into<String>, linkage: Linkage) -> Self {
        Self {
            name: name.into(),
            translation_unit: translation_unit.into(),
            linkage,
            demangled_name: None,
            local_stack_bytes: None,
            has_indirect_call: false,
            raw_callees: BTreeSet::new(),
            resolved_callees: BTreeSet::new(),
            unresolved_callees: BTreeSet::new(),
            worst_case: WorstCase::Unknown,
            is_manual: false,
            readiness: Readiness::Pending,
        }
    }

    /// Build a manual-override record: a leaf with a pre-seeded bound that
    /// terminates any call path reaching it.
    pub fn manual(name: impl Into<String>, stack_bytes: u64) -> Self {
        let mut record = Self::new(name, MANUAL_UNIT, Linkage::Global);
        record.local_stack_bytes = Some(stack_bytes);
        record.worst_case = WorstCase::Bounded(stack_bytes);
        record.is_manual = true;
        record.readiness = Readiness::Ready;
        record
    }

    /// Name to show in reports: the pretty name when the call-graph dump
    /// provided one, the linker name otherwise.
    pub fn display_name(&self) -> &str {
        self.demangled_name.as_deref().unwrap_or(&self.name)
    }

    /// Record the evaluation result. The result is single-assignment: once a
    /// terminal value is set it never changes, and conflicting assignments are
    /// a logic error.
    pub fn set_worst_case(&mut self, value: WorstCase) {
        debug_assert!(
            self.worst_case == WorstCase::Unknown || self.worst_case == value,
            "worst case for {} reassigned from {:?} to {:?}",
            self.name,
            self.worst_case,
            value
        );
        if self.worst_case == WorstCase::Unknown {
            self.worst_case = value;
        }
    }
}
