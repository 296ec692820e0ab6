use crate::catalog::schema::DgCatalogEntry;
use crate::catalog::CatalogIndex;
use crate::compat::outcome::{CompatibilityVerdict, Conflict};
use crate::compat::schema::Severity;
use crate::compat::SegregationTable;
use crate::error::DgError;
use std::collections::{BTreeMap, HashSet};

/// Check a set of dangerous goods items against a segregation table.
///
/// Items are de-duplicated by UN number and every unordered pair is checked
/// across all of its hazard classes (subsidiary classes included) and
/// segregation groups. Pairs are reported with the lower UN number first,
/// so the verdict does not depend on input order.
pub fn check(items: &[DgCatalogEntry], table: &SegregationTable) -> CompatibilityVerdict {
    let unique: BTreeMap<&str, &DgCatalogEntry> =
        items.iter().map(|e| (e.un_number.as_str(), e)).collect();
    let unique: Vec<&DgCatalogEntry> = unique.into_values().collect();

    let mut conflicts = Vec::new();
    for (i, a) in unique.iter().enumerate() {
        for b in &unique[i + 1..] {
            check_pair(a, b, table, &mut conflicts);
        }
    }
    conflicts.sort_by(|x, y| {
        (&x.item_a, &x.item_b, x.severity, &x.rule).cmp(&(&y.item_a, &y.item_b, y.severity, &y.rule))
    });

    let compliant = !conflicts.iter().any(|c| c.severity == Severity::Error);
    tracing::info!(
        items = unique.len(),
        conflicts = conflicts.len(),
        compliant,
        "compatibility checked"
    );

    CompatibilityVerdict {
        compliant,
        conflicts,
    }
}

/// Check plain UN numbers, resolving them through the catalog.
pub fn check_un_numbers<S: AsRef<str>>(
    un_numbers: &[S],
    catalog: &CatalogIndex,
    table: &SegregationTable,
) -> Result<CompatibilityVerdict, DgError> {
    let items = un_numbers
        .iter()
        .map(|un| {
            catalog
                .lookup_by_un_number(un.as_ref())
                .cloned()
                .ok_or_else(|| DgError::UnknownUnNumber(un.as_ref().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(check(&items, table))
}

fn check_pair(
    a: &DgCatalogEntry,
    b: &DgCatalogEntry,
    table: &SegregationTable,
    conflicts: &mut Vec<Conflict>,
) {
    // Several class combinations can resolve to the same rule.
    let mut seen: HashSet<String> = HashSet::new();

    for ca in a.all_hazard_classes() {
        for cb in b.all_hazard_classes() {
            let Some(rule) = table.class_rule(ca, cb) else {
                continue;
            };
            let Some(severity) = rule.status.severity() else {
                continue;
            };
            let text = format!(
                "class {} vs class {}: {}",
                rule.classes[0].min(rule.classes[1]),
                rule.classes[0].max(rule.classes[1]),
                rule.status.describe()
            );
            if seen.insert(text.clone()) {
                conflicts.push(Conflict {
                    item_a: a.un_number.clone(),
                    item_b: b.un_number.clone(),
                    rule: text,
                    severity,
                    status: rule.status,
                    note: rule.note.clone(),
                });
            }
        }
    }

    for ga in &a.segregation_groups {
        for gb in &b.segregation_groups {
            let Some(rule) = table.group_rule(ga, gb) else {
                continue;
            };
            let Some(severity) = rule.status.severity() else {
                continue;
            };
            let (g1, g2) = if rule.groups[0] <= rule.groups[1] {
                (&rule.groups[0], &rule.groups[1])
            } else {
                (&rule.groups[1], &rule.groups[0])
            };
            let text = format!("{} vs {}: {}", g1, g2, rule.status.describe());
            if seen.insert(text.clone()) {
                conflicts.push(Conflict {
                    item_a: a.un_number.clone(),
                    item_b: b.un_number.clone(),
                    rule: text,
                    severity,
                    status: rule.status,
                    note: rule.note.clone(),
                });
            }
        }
    }
}
