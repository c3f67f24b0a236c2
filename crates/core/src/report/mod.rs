//! Report assembly: final per-function rows, ordering, and rendering.
//!
//! The report is a read-only view of the finalized record store. Rows with
//! no finite bound sort first, then finite bounds in descending order, so
//! the most stack-hungry paths top the table; rows left incomplete by
//! ingestion problems sink to the bottom.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{Readiness, RecordStore, WorstCase};

/// One function's final analysis result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub translation_unit: String,
    pub function: String,
    pub worst_case: WorstCase,
    pub unresolved: Vec<String>,
    pub is_manual: bool,
}

/// Finalized, ordered report over every reportable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackReport {
    pub rows: Vec<ReportRow>,
}

impl StackReport {
    pub fn from_store(store: &RecordStore) -> Self {
        let mut rows: Vec<ReportRow> = store
            .records()
            .iter()
            .filter(|record| record.readiness != Readiness::Superseded)
            .map(|record| ReportRow {
                translation_unit: record.translation_unit.clone(),
                function: record.display_name().to_string(),
                worst_case: record.worst_case,
                unresolved: record.unresolved_callees.iter().cloned().collect(),
                is_manual: record.is_manual,
            })
            .collect();

        rows.sort_by_cached_key(sort_class);
        Self { rows }
    }

    /// Render the aligned text table, columns sized to content.
    pub fn render_text(&self) -> String {
        let tu_width = self
            .rows
            .iter()
            .map(|row| row.translation_unit.len())
            .max()
            .unwrap_or(0)
            .max(16);
        let name_width =
            self.rows.iter().map(|row| row.function.len()).max().unwrap_or(0).max(13);

        let mut out = String::new();
        out.push_str(&format!(
            "{:<tu$}  {:<name$}  {:>14}  {:<17}\n",
            "Translation Unit",
            "Function Name",
            "Stack",
            "Unresolved Dependencies",
            tu = tu_width + 2,
            name = name_width + 2,
        ));
        for row in &self.rows {
            out.push_str(&format!(
                "{:<tu$}  {:<name$}  {:>14}  {:<17}\n",
                row.translation_unit,
                row.function,
                stack_cell(row),
                unresolved_cell(row),
                tu = tu_width + 2,
                name = name_width + 2,
            ));
        }
        out
    }
}

/// Composite sort key: unbounded first, then bounds descending, incomplete
/// rows last, with identity as the tie-break for stable output.
fn sort_class(row: &ReportRow) -> (u8, std::cmp::Reverse<u64>, String, String) {
    let (class, bytes) = match row.worst_case {
        WorstCase::Unbounded => (0, 0),
        WorstCase::Bounded(bytes) => (1, bytes),
        WorstCase::Unknown => (2, 0),
    };
    (class, std::cmp::Reverse(bytes), row.translation_unit.clone(), row.function.clone())
}

/// Stack column text. A finite bound computed over unresolved calls is
/// provisional (those callees were assumed to cost zero bytes) and renders
/// as `unbounded:<n>` to keep it from reading as a proven number.
fn stack_cell(row: &ReportRow) -> String {
    match row.worst_case {
        WorstCase::Unbounded => "unbounded".to_string(),
        WorstCase::Bounded(bytes) if row.unresolved.is_empty() => bytes.to_string(),
        WorstCase::Bounded(bytes) => format!("unbounded:{bytes}"),
        WorstCase::Unknown => "incomplete".to_string(),
    }
}

fn unresolved_cell(row: &ReportRow) -> String {
    if row.unresolved.is_empty() {
        String::new()
    } else {
        format!("({})", row.unresolved.join(", "))
    }
}

/// Why a budgeted function failed its budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetViolationKind {
    /// Recursion or indirect calls: no finite bound exists.
    Unbounded,
    /// The bound fits, but unresolved callees make it unprovable.
    Provisional { bound: u64 },
    /// The proven bound exceeds the budget.
    OverBudget { bound: u64 },
    /// No analyzable row for this function.
    NotAnalyzed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetViolation {
    pub function: String,
    pub budget_bytes: u64,
    pub kind: BudgetViolationKind,
}

impl std::fmt::Display for BudgetViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            BudgetViolationKind::Unbounded => {
                write!(f, "{}: unbounded (budget {} bytes)", self.function, self.budget_bytes)
            }
            BudgetViolationKind::Provisional { bound } => write!(
                f,
                "{}: bound {} bytes is provisional, unresolved calls assumed free (budget {})",
                self.function, bound, self.budget_bytes
            ),
            BudgetViolationKind::OverBudget { bound } => write!(
                f,
                "{}: {} bytes exceeds budget of {} bytes",
                self.function, bound, self.budget_bytes
            ),
            BudgetViolationKind::NotAnalyzed => {
                write!(f, "{}: not analyzed (budget {} bytes)", self.function, self.budget_bytes)
            }
        }
    }
}

/// Check per-function byte budgets against the report.
///
/// A budget is satisfied only by a proven finite bound at or under the
/// limit. Every row sharing the budgeted display name must satisfy it
/// (locals in different units can share a name).
pub fn check_budgets(
    report: &StackReport,
    budgets: &BTreeMap<String, u64>,
) -> Vec<BudgetViolation> {
    let mut violations = Vec::new();

    for (function, budget) in budgets {
        let rows: Vec<&ReportRow> =
            report.rows.iter().filter(|row| &row.function == function).collect();
        if rows.is_empty() {
            violations.push(BudgetViolation {
                function: function.clone(),
                budget_bytes: *budget,
                kind: BudgetViolationKind::NotAnalyzed,
            });
            continue;
        }
        for row in rows {
            let kind = match row.worst_case {
                WorstCase::Unbounded => Some(BudgetViolationKind::Unbounded),
                WorstCase::Unknown => Some(BudgetViolationKind::NotAnalyzed),
                WorstCase::Bounded(bound) if bound > *budget => {
                    Some(BudgetViolationKind::OverBudget { bound })
                }
                WorstCase::Bounded(bound) if !row.unresolved.is_empty() => {
                    Some(BudgetViolationKind::Provisional { bound })
                }
                WorstCase::Bounded(_) => None,
            };
            if let Some(kind) = kind {
                violations.push(BudgetViolation {
                    function: function.clone(),
                    budget_bytes: *budget,
                    kind,
                });
            }
        }
    }
    violations
}
