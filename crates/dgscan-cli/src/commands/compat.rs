use dgscan_core::compat::check_un_numbers;
use dgscan_core::error::DgError;

use crate::commands::{load_reference_catalog, load_reference_table, ReferenceArgs};
use crate::output;

pub fn run(un_numbers: &[String], reference: &ReferenceArgs, output_format: &str) -> Result<(), DgError> {
    let catalog = load_reference_catalog(reference)?;
    let table = load_reference_table(reference)?;
    let verdict = check_un_numbers(un_numbers, &catalog, &table)?;

    match output_format {
        "json" => output::json::print(&verdict)?,
        _ => output::table::print_verdict(&verdict),
    }

    Ok(())
}
