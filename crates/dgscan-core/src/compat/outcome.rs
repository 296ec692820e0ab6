use crate::compat::schema::{SegregationStatus, Severity};
use serde::{Deserialize, Serialize};

/// A segregation conflict between two confirmed items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// The lower UN number of the pair.
    pub item_a: String,
    pub item_b: String,
    /// Human-readable rule, e.g. "class 3 vs class 5.1: may not be loaded together".
    pub rule: String,
    pub severity: Severity,
    pub status: SegregationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Result of a compatibility check. Recomputed on every check, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityVerdict {
    /// True iff there are no error-severity conflicts.
    pub compliant: bool,
    pub conflicts: Vec<Conflict>,
}

impl CompatibilityVerdict {
    pub fn errors(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| c.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| c.severity == Severity::Warning)
    }
}
