use crate::catalog::{parse_catalog_str, CatalogIndex};
use crate::error::DgError;

const ADG_CORE_JSON: &str = include_str!("../../../../rules/dg-catalog.json");

/// Available predefined catalogs.
pub const PRESETS: &[&str] = &["adg-core"];

/// Load a predefined catalog by name.
pub fn load_preset(name: &str) -> Result<CatalogIndex, DgError> {
    match name {
        "adg-core" => parse_catalog_str(ADG_CORE_JSON, "preset:adg-core"),
        _ => Err(DgError::catalog(
            format!("preset:{}", name),
            format!("unknown preset. Available: {}", PRESETS.join(", ")),
        )),
    }
}
