pub mod builtin;
pub mod schema;

use crate::error::DgError;
use crate::matching::normalize::{jaccard, normalize_term, token_set};
use schema::{CatalogDef, DgCatalogEntry};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

/// Read-only lookup structure over a dangerous goods catalog.
///
/// Entries are kept sorted by UN number, so every lookup result is in a
/// stable order. The index is never mutated after construction and can be
/// shared between threads behind an `Arc`.
#[derive(Debug)]
pub struct CatalogIndex {
    name: String,
    version: String,
    description: Option<String>,
    entries: Vec<DgCatalogEntry>,
    by_un: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
    by_synonym: HashMap<String, Vec<(usize, f64)>>,
    by_token: HashMap<String, Vec<usize>>,
    normalized_names: Vec<String>,
}

/// Load a catalog from a JSON file.
pub fn load_catalog(path: &Path) -> Result<CatalogIndex, DgError> {
    let origin = path.display().to_string();
    let content =
        std::fs::read_to_string(path).map_err(|e| DgError::catalog(&origin, e.to_string()))?;
    parse_catalog_str(&content, &origin)
}

/// Parse a catalog from a JSON string. `origin` names the source in errors.
pub fn parse_catalog_str(json: &str, origin: &str) -> Result<CatalogIndex, DgError> {
    let def: CatalogDef =
        serde_json::from_str(json).map_err(|e| DgError::catalog(origin, e.to_string()))?;
    CatalogIndex::new(def, origin)
}

/// Validate that a catalog is well-formed.
pub fn validate_catalog(def: &CatalogDef) -> Result<(), String> {
    if def.entries.is_empty() {
        return Err("catalog has no entries".into());
    }

    let mut seen = HashSet::new();
    for entry in &def.entries {
        if !is_un_number(&entry.un_number) {
            return Err(format!(
                "UN number '{}' must be exactly four digits",
                entry.un_number
            ));
        }
        if !seen.insert(entry.un_number.as_str()) {
            return Err(format!("duplicate UN number '{}'", entry.un_number));
        }
        if normalize_term(&entry.proper_shipping_name).is_empty() {
            return Err(format!(
                "UN{} has an empty proper shipping name",
                entry.un_number
            ));
        }
        for syn in &entry.synonyms {
            if normalize_term(syn.term()).is_empty() {
                return Err(format!("UN{} has an empty synonym", entry.un_number));
            }
            let w = syn.weight();
            if !(w > 0.0 && w <= 1.0) {
                return Err(format!(
                    "UN{} synonym '{}' has weight {} outside (0, 1]",
                    entry.un_number,
                    syn.term(),
                    w
                ));
            }
        }
    }

    Ok(())
}

/// True for exactly four ASCII digits.
pub fn is_un_number(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}

impl CatalogIndex {
    pub fn new(def: CatalogDef, origin: &str) -> Result<Self, DgError> {
        validate_catalog(&def).map_err(|reason| DgError::catalog(origin, reason))?;

        let mut entries = def.entries;
        entries.sort_by(|a, b| a.un_number.cmp(&b.un_number));

        let mut by_un = HashMap::new();
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_synonym: HashMap<String, Vec<(usize, f64)>> = HashMap::new();
        let mut by_token: HashMap<String, Vec<usize>> = HashMap::new();
        let mut normalized_names = Vec::with_capacity(entries.len());

        for (idx, entry) in entries.iter().enumerate() {
            by_un.insert(entry.un_number.clone(), idx);

            let name = normalize_term(&entry.proper_shipping_name);
            for token in token_set(&name) {
                let list = by_token.entry(token.to_string()).or_default();
                if list.last() != Some(&idx) {
                    list.push(idx);
                }
            }
            by_name.entry(name.clone()).or_default().push(idx);
            normalized_names.push(name);

            for syn in &entry.synonyms {
                by_synonym
                    .entry(normalize_term(syn.term()))
                    .or_default()
                    .push((idx, syn.weight()));
            }
        }

        tracing::info!(
            catalog = %def.name,
            version = %def.version,
            entries = entries.len(),
            "loaded dangerous goods catalog"
        );

        Ok(CatalogIndex {
            name: def.name,
            version: def.version,
            description: def.description,
            entries,
            by_un,
            by_name,
            by_synonym,
            by_token,
            normalized_names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, sorted by UN number.
    pub fn entries(&self) -> &[DgCatalogEntry] {
        &self.entries
    }

    /// Look up an entry by UN number. Accepts "1263", "UN1263" and "UN 1263".
    pub fn lookup_by_un_number(&self, un: &str) -> Option<&DgCatalogEntry> {
        let trimmed = un.trim();
        let digits = trimmed
            .strip_prefix("UN")
            .or_else(|| trimmed.strip_prefix("un"))
            .unwrap_or(trimmed)
            .trim();
        self.by_un.get(digits).map(|&idx| &self.entries[idx])
    }

    /// Free-text lookup for search boxes and manual matching.
    ///
    /// Results come in tiers: UN number, exact name, exact synonym, name
    /// prefix, then names containing every token of the term. Each entry
    /// appears once, at its highest tier.
    pub fn lookup(&self, term: &str) -> Vec<&DgCatalogEntry> {
        let norm = normalize_term(term);
        if norm.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<usize> = Vec::new();

        if let Some(entry) = self.lookup_by_un_number(term) {
            hits.extend(self.by_un.get(&entry.un_number).copied());
        }
        hits.extend(self.exact_name_hits(&norm).iter().copied());
        hits.extend(self.synonym_hits(&norm).iter().map(|(idx, _)| *idx));
        hits.extend(
            self.normalized_names
                .iter()
                .enumerate()
                .filter(|(_, name)| name.starts_with(&norm))
                .map(|(idx, _)| idx),
        );

        let term_tokens = token_set(&norm);
        hits.extend(
            self.normalized_names
                .iter()
                .enumerate()
                .filter(|(_, name)| term_tokens.is_subset(&token_set(name)))
                .map(|(idx, _)| idx),
        );

        let mut seen = HashSet::new();
        hits.into_iter()
            .filter(|idx| seen.insert(*idx))
            .map(|idx| &self.entries[idx])
            .collect()
    }

    pub(crate) fn entry(&self, idx: usize) -> &DgCatalogEntry {
        &self.entries[idx]
    }

    pub(crate) fn index_of_un(&self, un: &str) -> Option<usize> {
        self.by_un.get(un).copied()
    }

    /// Entries whose normalized proper shipping name equals `normalized`.
    pub(crate) fn exact_name_hits(&self, normalized: &str) -> &[usize] {
        self.by_name.get(normalized).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Entries with a synonym equal to `normalized`, with the synonym weight.
    pub(crate) fn synonym_hits(&self, normalized: &str) -> &[(usize, f64)] {
        self.by_synonym
            .get(normalized)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entries whose name token set has Jaccard similarity of at least
    /// `min_similarity` with `tokens`, in UN-number order.
    pub(crate) fn partial_name_hits(
        &self,
        tokens: &BTreeSet<&str>,
        min_similarity: f64,
    ) -> Vec<(usize, f64)> {
        let mut candidates: BTreeSet<usize> = BTreeSet::new();
        for token in tokens {
            if let Some(list) = self.by_token.get(*token) {
                candidates.extend(list.iter().copied());
            }
        }

        candidates
            .into_iter()
            .filter_map(|idx| {
                let sim = jaccard(tokens, &token_set(&self.normalized_names[idx]));
                (sim >= min_similarity).then_some((idx, sim))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HazardClass, PackingGroup};

    fn sample() -> CatalogIndex {
        let json = r#"{
            "name": "Test",
            "version": "1.0",
            "entries": [
                { "un_number": "3066", "proper_shipping_name": "Paint", "hazard_class": "8", "packing_group": "II" },
                { "un_number": "1263", "proper_shipping_name": "Paint", "hazard_class": "3", "packing_group": "II",
                  "synonyms": ["lacquer", { "term": "enamel", "weight": 0.8 }] },
                { "un_number": "1830", "proper_shipping_name": "Sulphuric acid", "hazard_class": "8",
                  "synonyms": ["sulfuric acid", "battery acid"], "segregation_groups": ["acids"] }
            ]
        }"#;
        parse_catalog_str(json, "test").unwrap()
    }

    #[test]
    fn test_entries_sorted_by_un() {
        let cat = sample();
        let uns: Vec<&str> = cat.entries().iter().map(|e| e.un_number.as_str()).collect();
        assert_eq!(uns, vec!["1263", "1830", "3066"]);
    }

    #[test]
    fn test_lookup_by_un_number_forms() {
        let cat = sample();
        assert_eq!(
            cat.lookup_by_un_number("1263").unwrap().hazard_class,
            HazardClass::FlammableLiquid
        );
        assert!(cat.lookup_by_un_number("UN1263").is_some());
        assert!(cat.lookup_by_un_number("UN 1830").is_some());
        assert!(cat.lookup_by_un_number("9999").is_none());
    }

    #[test]
    fn test_lookup_exact_name_returns_all_entries() {
        let cat = sample();
        let hits = cat.lookup("PAINT");
        let uns: Vec<&str> = hits.iter().map(|e| e.un_number.as_str()).collect();
        assert_eq!(uns, vec!["1263", "3066"]);
        assert_eq!(hits[0].packing_group, Some(PackingGroup::II));
    }

    #[test]
    fn test_lookup_synonym_prefix_and_subset() {
        let cat = sample();
        assert_eq!(cat.lookup("battery acid")[0].un_number, "1830");
        assert_eq!(cat.lookup("sulph")[0].un_number, "1830");
        assert_eq!(cat.lookup("acid")[0].un_number, "1830");
        assert!(cat.lookup("   ").is_empty());
    }

    #[test]
    fn test_partial_name_hits() {
        let cat = sample();
        let tokens = token_set("sulphuric acid");
        let hits = cat.partial_name_hits(&tokens, 0.7);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1, 1.0);
    }

    #[test]
    fn test_empty_catalog_unavailable() {
        let json = r#"{ "name": "Empty", "version": "1", "entries": [] }"#;
        assert!(matches!(
            parse_catalog_str(json, "empty"),
            Err(DgError::CatalogUnavailable { .. })
        ));
    }

    #[test]
    fn test_bad_un_number_rejected() {
        let json = r#"{ "name": "Bad", "version": "1", "entries": [
            { "un_number": "12A3", "proper_shipping_name": "X", "hazard_class": "3" }
        ] }"#;
        assert!(parse_catalog_str(json, "bad").is_err());
    }

    #[test]
    fn test_unknown_hazard_class_rejected() {
        let json = r#"{ "name": "Bad", "version": "1", "entries": [
            { "un_number": "1234", "proper_shipping_name": "X", "hazard_class": "12" }
        ] }"#;
        assert!(parse_catalog_str(json, "bad").is_err());
    }

    #[test]
    fn test_duplicate_un_rejected() {
        let json = r#"{ "name": "Bad", "version": "1", "entries": [
            { "un_number": "1234", "proper_shipping_name": "X", "hazard_class": "3" },
            { "un_number": "1234", "proper_shipping_name": "Y", "hazard_class": "3" }
        ] }"#;
        assert!(parse_catalog_str(json, "bad").is_err());
    }

    #[test]
    fn test_synonym_weight_out_of_range_rejected() {
        let json = r#"{ "name": "Bad", "version": "1", "entries": [
            { "un_number": "1234", "proper_shipping_name": "X", "hazard_class": "3",
              "synonyms": [{ "term": "y", "weight": 1.5 }] }
        ] }"#;
        assert!(parse_catalog_str(json, "bad").is_err());
    }

    #[test]
    fn test_missing_file_unavailable() {
        let err = load_catalog(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, DgError::CatalogUnavailable { .. }));
    }
}
