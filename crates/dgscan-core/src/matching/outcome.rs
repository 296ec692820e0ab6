use crate::catalog::schema::DgCatalogEntry;
use crate::model::PackingGroup;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Automatic,
    Manual,
}

/// Which matching rule produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    UnNumber,
    ProperName,
    PartialName,
    Synonym,
    Manual,
}

/// A catalog hit within one text segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Session-unique id (e.g., "cand_seg_1_0_0").
    pub id: String,
    pub segment_id: String,
    pub page: usize,
    pub line_index: usize,
    /// Byte range of `matched_text` within the segment text.
    pub byte_range: Range<usize>,
    /// The text as it appears in the document.
    pub matched_text: String,
    /// Normalized grouping key ("un1263", "paint").
    pub keyword: String,
    pub catalog_entry: DgCatalogEntry,
    /// In [0, 1].
    pub confidence: f64,
    pub source: MatchSource,
    pub match_kind: MatchKind,
    /// Full text of the originating line.
    pub context: String,
}

impl MatchCandidate {
    pub fn un_number(&self) -> &str {
        &self.catalog_entry.un_number
    }
}

/// A quantity as written on a manifest line (e.g., "200 L", "1,5 kg").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: Decimal,
    /// Lowercased unit ("l", "kg", "pcs"). Packaging words such as "drums"
    /// end up in [`LineItemDetails::packaging`] instead.
    pub unit: String,
}

/// Line-item details stated next to a detected dangerous good.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    /// Packing group written on the document, which may differ from the catalog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stated_packing_group: Option<PackingGroup>,
}

impl LineItemDetails {
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.packaging.is_none() && self.stated_packing_group.is_none()
    }
}

/// Candidates describing one keyword occurrence, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordCluster {
    pub keyword: String,
    pub page: usize,
    /// First line of the cluster within its page.
    pub line_index: usize,
    /// Lines the cluster spans, joined with " | ".
    pub context: String,
    pub candidates: Vec<MatchCandidate>,
    #[serde(default, skip_serializing_if = "LineItemDetails::is_empty")]
    pub details: LineItemDetails,
}

impl KeywordCluster {
    /// Highest-ranked candidate. Clusters are never empty.
    pub fn top(&self) -> &MatchCandidate {
        &self.candidates[0]
    }
}

/// A line that looks like dangerous goods text but matched nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedEntry {
    pub segment_id: String,
    pub page: usize,
    pub line_index: usize,
    pub text: String,
    /// What made the line look like dangerous goods text.
    pub indicator: String,
}
