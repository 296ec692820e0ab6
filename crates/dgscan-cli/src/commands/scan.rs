use dgscan_core::error::DgError;
use std::path::Path;

use crate::commands::{load_reference_catalog, load_scan_options, read_document, ReferenceArgs, TuningArgs};
use crate::output;

pub fn run(
    input_file: &Path,
    reference: &ReferenceArgs,
    tuning: &TuningArgs,
    output_format: &str,
) -> Result<(), DgError> {
    let catalog = load_reference_catalog(reference)?;
    let options = load_scan_options(tuning)?;
    let pages = read_document(input_file)?;
    let report = dgscan_core::scan_pages(&pages, &catalog, &options)?;

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_scan(&report),
    }

    Ok(())
}
