pub mod builtin;
pub mod checker;
pub mod outcome;
pub mod schema;

use crate::error::DgError;
use crate::model::HazardClass;
use schema::{ClassRuleDef, GroupRuleDef, SegregationTableDef};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub use checker::{check, check_un_numbers};
pub use outcome::{CompatibilityVerdict, Conflict};
pub use schema::{SegregationStatus, Severity};

/// Indexed segregation table. Lookups are symmetric.
#[derive(Debug)]
pub struct SegregationTable {
    def: SegregationTableDef,
    class_index: HashMap<(HazardClass, HazardClass), usize>,
    group_index: HashMap<(String, String), usize>,
}

/// Load a segregation table from a JSON file.
pub fn load_segregation_table(path: &Path) -> Result<SegregationTable, DgError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DgError::SegregationTableInvalid(format!("{}: {}", path.display(), e))
    })?;
    parse_segregation_table_str(&content)
}

/// Parse a segregation table from a JSON string.
pub fn parse_segregation_table_str(json: &str) -> Result<SegregationTable, DgError> {
    let def: SegregationTableDef = serde_json::from_str(json)
        .map_err(|e| DgError::SegregationTableInvalid(e.to_string()))?;
    SegregationTable::new(def)
}

/// Validate that a segregation table is well-formed.
pub fn validate_segregation_table(def: &SegregationTableDef) -> Result<(), String> {
    if def.class_rules.is_empty() && def.group_rules.is_empty() {
        return Err("table has no rules".into());
    }

    let mut seen = HashSet::new();
    for rule in &def.class_rules {
        let key = class_key(rule.classes[0], rule.classes[1]);
        if !seen.insert(key) {
            return Err(format!(
                "duplicate rule for classes {} and {}",
                key.0, key.1
            ));
        }
    }

    let mut seen = HashSet::new();
    for rule in &def.group_rules {
        if rule.groups.iter().any(|g| g.trim().is_empty()) {
            return Err("group rule with an empty group name".into());
        }
        let key = group_key(&rule.groups[0], &rule.groups[1]);
        if !seen.insert(key.clone()) {
            return Err(format!("duplicate rule for groups '{}' and '{}'", key.0, key.1));
        }
    }

    Ok(())
}

impl SegregationTable {
    pub fn new(def: SegregationTableDef) -> Result<Self, DgError> {
        validate_segregation_table(&def).map_err(DgError::SegregationTableInvalid)?;

        let class_index = def
            .class_rules
            .iter()
            .enumerate()
            .map(|(i, r)| (class_key(r.classes[0], r.classes[1]), i))
            .collect();
        let group_index = def
            .group_rules
            .iter()
            .enumerate()
            .map(|(i, r)| (group_key(&r.groups[0], &r.groups[1]), i))
            .collect();

        tracing::info!(
            table = %def.name,
            class_rules = def.class_rules.len(),
            group_rules = def.group_rules.len(),
            "loaded segregation table"
        );

        Ok(SegregationTable {
            def,
            class_index,
            group_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn version(&self) -> &str {
        &self.def.version
    }

    pub fn description(&self) -> Option<&str> {
        self.def.description.as_deref()
    }

    pub fn class_rules(&self) -> &[ClassRuleDef] {
        &self.def.class_rules
    }

    pub fn group_rules(&self) -> &[GroupRuleDef] {
        &self.def.group_rules
    }

    /// Rule for two classes. A division without a rule of its own falls back
    /// to its parent class, first on one side, then on both.
    pub fn class_rule(&self, a: HazardClass, b: HazardClass) -> Option<&ClassRuleDef> {
        let pa = a.parent();
        let pb = b.parent();
        let attempts = [
            Some((a, b)),
            pa.map(|pa| (pa, b)),
            pb.map(|pb| (a, pb)),
            pa.zip(pb),
        ];
        attempts
            .into_iter()
            .flatten()
            .find_map(|(x, y)| self.class_index.get(&class_key(x, y)))
            .map(|&i| &self.def.class_rules[i])
    }

    pub fn group_rule(&self, a: &str, b: &str) -> Option<&GroupRuleDef> {
        self.group_index
            .get(&group_key(a, b))
            .map(|&i| &self.def.group_rules[i])
    }
}

fn class_key(a: HazardClass, b: HazardClass) -> (HazardClass, HazardClass) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn group_key(a: &str, b: &str) -> (String, String) {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SegregationTable {
        parse_segregation_table_str(
            r#"{
                "name": "Test", "version": "1",
                "class_rules": [
                    { "classes": ["3", "5.1"], "status": "prohibited" },
                    { "classes": ["4", "5.1"], "status": "prohibited" },
                    { "classes": ["8", "5"], "status": "separated_from" }
                ],
                "group_rules": [
                    { "groups": ["Acids", "alkalis"], "status": "separated_from" }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_lookup_symmetric() {
        let t = table();
        let ab = t.class_rule(HazardClass::FlammableLiquid, HazardClass::Oxidizer);
        let ba = t.class_rule(HazardClass::Oxidizer, HazardClass::FlammableLiquid);
        assert!(ab.is_some());
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_parent_fallback() {
        let t = table();
        let rule = t
            .class_rule(HazardClass::DangerousWhenWet, HazardClass::Oxidizer)
            .unwrap();
        assert_eq!(rule.classes, [HazardClass::Solid, HazardClass::Oxidizer]);
        // 5.2 falls back to 5
        let rule = t
            .class_rule(HazardClass::OrganicPeroxide, HazardClass::Corrosive)
            .unwrap();
        assert_eq!(rule.status, SegregationStatus::SeparatedFrom);
        assert!(t
            .class_rule(HazardClass::FlammableLiquid, HazardClass::Corrosive)
            .is_none());
    }

    #[test]
    fn test_group_rule_case_insensitive() {
        let t = table();
        assert!(t.group_rule("alkalis", "acids").is_some());
        assert!(t.group_rule("acids", "cyanides").is_none());
    }

    #[test]
    fn test_duplicate_pair_rejected() {
        let json = r#"{ "name": "Dup", "version": "1", "class_rules": [
            { "classes": ["3", "5.1"], "status": "prohibited" },
            { "classes": ["5.1", "3"], "status": "away_from" }
        ] }"#;
        assert!(matches!(
            parse_segregation_table_str(json),
            Err(DgError::SegregationTableInvalid(_))
        ));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let json = r#"{ "name": "Bad", "version": "1", "class_rules": [
            { "classes": ["3", "5.1"], "status": "forbidden" }
        ] }"#;
        assert!(parse_segregation_table_str(json).is_err());
    }

    #[test]
    fn test_empty_table_rejected() {
        let json = r#"{ "name": "Empty", "version": "1", "class_rules": [] }"#;
        assert!(parse_segregation_table_str(json).is_err());
    }
}
