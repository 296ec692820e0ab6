use crate::compat::{parse_segregation_table_str, SegregationTable};
use crate::error::DgError;

const ADG_CLASS_JSON: &str = include_str!("../../../../rules/segregation-adg.json");

/// Available predefined segregation tables.
pub const PRESETS: &[&str] = &["adg-class"];

/// Load a predefined segregation table by name.
pub fn load_preset(name: &str) -> Result<SegregationTable, DgError> {
    match name {
        "adg-class" => parse_segregation_table_str(ADG_CLASS_JSON),
        _ => Err(DgError::SegregationTableInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}
