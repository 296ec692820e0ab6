use crate::model::HazardClass;
use serde::{Deserialize, Serialize};

/// Segregation requirement between two hazard classes or groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegregationStatus {
    Compatible,
    /// May not be transported together.
    Prohibited,
    AwayFrom,
    SeparatedFrom,
    SeparatedByCompartment,
    SeparatedLongitudinally,
    /// Allowed subject to conditions stated in the rule note.
    Conditional,
}

/// Conflict severity. Only errors block finalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl SegregationStatus {
    /// Severity of a conflict with this status, `None` when compatible.
    pub fn severity(&self) -> Option<Severity> {
        match self {
            SegregationStatus::Compatible => None,
            SegregationStatus::Prohibited => Some(Severity::Error),
            SegregationStatus::AwayFrom
            | SegregationStatus::SeparatedFrom
            | SegregationStatus::SeparatedByCompartment
            | SegregationStatus::SeparatedLongitudinally
            | SegregationStatus::Conditional => Some(Severity::Warning),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SegregationStatus::Compatible => "compatible",
            SegregationStatus::Prohibited => "may not be loaded together",
            SegregationStatus::AwayFrom => "must be kept away from each other",
            SegregationStatus::SeparatedFrom => "must be separated from each other",
            SegregationStatus::SeparatedByCompartment => "must be in separate compartments",
            SegregationStatus::SeparatedLongitudinally => {
                "must be separated longitudinally by an intervening compartment"
            }
            SegregationStatus::Conditional => "allowed only under stated conditions",
        }
    }
}

/// A segregation table as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegregationTableDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub class_rules: Vec<ClassRuleDef>,
    #[serde(default)]
    pub group_rules: Vec<GroupRuleDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRuleDef {
    pub classes: [HazardClass; 2],
    pub status: SegregationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRuleDef {
    pub groups: [String; 2],
    pub status: SegregationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
