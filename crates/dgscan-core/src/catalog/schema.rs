use crate::model::{HazardClass, PackingGroup};
use serde::{Deserialize, Serialize};

/// A dangerous goods reference catalog as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    pub entries: Vec<DgCatalogEntry>,
}

/// A single dangerous goods list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DgCatalogEntry {
    /// Four-digit UN number without the "UN" prefix (e.g., "1263").
    pub un_number: String,
    pub proper_shipping_name: String,
    pub hazard_class: HazardClass,
    #[serde(default)]
    pub sub_hazard_classes: Vec<HazardClass>,
    #[serde(default)]
    pub packing_group: Option<PackingGroup>,
    /// Trade names and common names that identify this entry.
    #[serde(default)]
    pub synonyms: Vec<SynonymDef>,
    /// Segregation groups (e.g., "acids", "cyanides") used by group rules.
    #[serde(default)]
    pub segregation_groups: Vec<String>,
}

impl DgCatalogEntry {
    /// Primary class followed by subsidiary classes, without duplicates.
    pub fn all_hazard_classes(&self) -> Vec<HazardClass> {
        let mut classes = vec![self.hazard_class];
        for sub in &self.sub_hazard_classes {
            if !classes.contains(sub) {
                classes.push(*sub);
            }
        }
        classes
    }

    /// "UN1263 Paint" style label for reports.
    pub fn label(&self) -> String {
        format!("UN{} {}", self.un_number, self.proper_shipping_name)
    }
}

/// A synonym, either a bare term (weight 1.0) or a weighted term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SynonymDef {
    Plain(String),
    Weighted {
        term: String,
        #[serde(default = "default_weight")]
        weight: f64,
    },
}

fn default_weight() -> f64 {
    1.0
}

impl SynonymDef {
    pub fn term(&self) -> &str {
        match self {
            SynonymDef::Plain(term) => term,
            SynonymDef::Weighted { term, .. } => term,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            SynonymDef::Plain(_) => 1.0,
            SynonymDef::Weighted { weight, .. } => *weight,
        }
    }
}
