use dgscan_core::compat::{builtin, SegregationStatus, SegregationTable};
use dgscan_core::error::DgError;
use std::path::Path;

pub fn list() -> Result<(), DgError> {
    println!("Available predefined segregation tables:\n");
    for name in builtin::PRESETS {
        let table = builtin::load_preset(name)?;
        println!(
            "  {:<10} {} (v{}, {} class rules, {} group rules)",
            name,
            table.name(),
            table.version(),
            table.class_rules().len(),
            table.group_rules().len()
        );
        if let Some(desc) = table.description() {
            println!("             {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn explain(preset: &str) -> Result<(), DgError> {
    let table = builtin::load_preset(preset)?;
    print_explanation(&table);
    Ok(())
}

fn print_explanation(table: &SegregationTable) {
    println!("{} (version {})\n", table.name(), table.version());
    if let Some(desc) = table.description() {
        println!("{}\n", desc);
    }

    println!("Class pairs:\n");
    for rule in table.class_rules() {
        let [a, b] = rule.classes;
        println!(
            "  {} ({}) and {} ({}) {}",
            a,
            a.name(),
            b,
            b.name(),
            rule.status.describe()
        );
        if let Some(note) = &rule.note {
            println!("      {}", note);
        }
    }

    if !table.group_rules().is_empty() {
        println!("\nSegregation groups:\n");
        for rule in table.group_rules() {
            println!(
                "  {} and {} {}",
                rule.groups[0],
                rule.groups[1],
                rule.status.describe()
            );
            if let Some(note) = &rule.note {
                println!("      {}", note);
            }
        }
    }

    println!("\nPairs not listed are compatible. Prohibited pairs block finalization;");
    println!("every other requirement is reported as a warning.");
}

pub fn validate(file: &Path) -> Result<(), DgError> {
    let table = dgscan_core::compat::load_segregation_table(file)?;

    println!(
        "Segregation table '{}' (v{}) is valid.",
        table.name(),
        table.version()
    );
    println!("  Class rules: {}", table.class_rules().len());
    println!("  Group rules: {}", table.group_rules().len());

    let mut warnings = Vec::new();
    for rule in table.class_rules() {
        if rule.status == SegregationStatus::Compatible && rule.note.is_none() {
            warnings.push(format!(
                "class {} vs {} is listed as compatible; unlisted pairs already are",
                rule.classes[0], rule.classes[1]
            ));
        }
        if rule.status == SegregationStatus::Conditional && rule.note.is_none() {
            warnings.push(format!(
                "class {} vs {} is conditional but states no condition",
                rule.classes[0], rule.classes[1]
            ));
        }
    }
    let prohibited = table
        .class_rules()
        .iter()
        .filter(|r| r.status == SegregationStatus::Prohibited)
        .count();
    if prohibited == 0 {
        warnings.push("no prohibited class pairs; nothing will block finalization".to_string());
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
