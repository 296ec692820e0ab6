use dgscan_core::catalog::builtin;
use dgscan_core::catalog::schema::DgCatalogEntry;
use dgscan_core::error::DgError;
use std::collections::HashMap;
use std::path::Path;

use crate::commands::{load_reference_catalog, ReferenceArgs};

pub fn list(preset: Option<&str>) -> Result<(), DgError> {
    let Some(name) = preset else {
        println!("Available predefined catalogs:\n");
        for name in builtin::PRESETS {
            let catalog = builtin::load_preset(name)?;
            println!(
                "  {:<10} {} (v{}, {} entries)",
                name,
                catalog.name(),
                catalog.version(),
                catalog.len()
            );
            if let Some(desc) = catalog.description() {
                println!("             {}", desc);
            }
            println!();
        }
        return Ok(());
    };

    let catalog = builtin::load_preset(name)?;
    println!("{} (version {})\n", catalog.name(), catalog.version());
    for entry in catalog.entries() {
        print_entry_line(entry);
    }
    Ok(())
}

pub fn show(un_number: &str, reference: &ReferenceArgs) -> Result<(), DgError> {
    let catalog = load_reference_catalog(reference)?;
    let entry = catalog
        .lookup_by_un_number(un_number)
        .ok_or_else(|| DgError::UnknownUnNumber(un_number.to_string()))?;

    println!("UN{}  {}", entry.un_number, entry.proper_shipping_name);
    println!(
        "  Class:            {} ({})",
        entry.hazard_class,
        entry.hazard_class.name()
    );
    if !entry.sub_hazard_classes.is_empty() {
        let subs: Vec<String> = entry
            .sub_hazard_classes
            .iter()
            .map(|c| format!("{} ({})", c, c.name()))
            .collect();
        println!("  Subsidiary risks: {}", subs.join(", "));
    }
    println!(
        "  Packing group:    {}",
        entry
            .packing_group
            .map(|pg| pg.to_string())
            .unwrap_or_else(|| "-".into())
    );
    if !entry.synonyms.is_empty() {
        let syns: Vec<String> = entry
            .synonyms
            .iter()
            .map(|s| {
                if s.weight() < 1.0 {
                    format!("{} (weight {})", s.term(), s.weight())
                } else {
                    s.term().to_string()
                }
            })
            .collect();
        println!("  Synonyms:         {}", syns.join(", "));
    }
    if !entry.segregation_groups.is_empty() {
        println!("  Segregation:      {}", entry.segregation_groups.join(", "));
    }
    Ok(())
}

pub fn search(term: &str, reference: &ReferenceArgs) -> Result<(), DgError> {
    let catalog = load_reference_catalog(reference)?;
    let hits = catalog.lookup(term);
    if hits.is_empty() {
        println!("No catalog entries match '{}'.", term);
        return Ok(());
    }
    for entry in hits {
        print_entry_line(entry);
    }
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), DgError> {
    let catalog = dgscan_core::catalog::load_catalog(file)?;

    println!(
        "Catalog '{}' (v{}) is valid.",
        catalog.name(),
        catalog.version()
    );
    println!("  Entries: {}", catalog.len());

    // Potential issues (warnings, not errors)
    let mut warnings = Vec::new();
    let mut seen_names: HashMap<String, &str> = HashMap::new();
    for entry in catalog.entries() {
        let class = entry.hazard_class.parent().unwrap_or(entry.hazard_class);
        if entry.packing_group.is_none() && !matches!(class.code(), "1" | "2" | "7") {
            warnings.push(format!("UN{} has no packing group", entry.un_number));
        }
        let key = entry.proper_shipping_name.to_lowercase();
        if let Some(other) = seen_names.insert(key, &entry.un_number) {
            warnings.push(format!(
                "UN{} and UN{} share the name '{}', name matches will be ambiguous",
                other, entry.un_number, entry.proper_shipping_name
            ));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

fn print_entry_line(entry: &DgCatalogEntry) {
    println!(
        "  UN{}  {:<5} {:<4} {}",
        entry.un_number,
        entry.hazard_class.code(),
        entry
            .packing_group
            .map(|pg| pg.to_string())
            .unwrap_or_else(|| "-".into()),
        entry.proper_shipping_name
    );
}
