pub mod audit;
pub mod catalog;
pub mod compat;
pub mod error;
pub mod extraction;
pub mod ledger;
pub mod matching;
pub mod model;
pub mod reconcile;
pub mod segment;
pub mod session;

use catalog::CatalogIndex;
use error::DgError;
use extraction::{pages_to_text, PageContent, PdfExtractor};
use matching::{KeywordCluster, MatchCandidate, MatcherOptions, RegulatoryFlag, UnmatchedEntry};
use reconcile::ReconcileOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline tuning. Every field has a default, so a partial JSON file works.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub matcher: MatcherOptions,
    pub reconcile: ReconcileOptions,
}

/// Load options from a JSON file.
pub fn load_options(path: &Path) -> Result<ScanOptions, DgError> {
    let content = std::fs::read_to_string(path)?;
    let options: ScanOptions = serde_json::from_str(&content)?;
    if !(0.0..=1.0).contains(&options.matcher.min_confidence) {
        return Err(DgError::MalformedInput(format!(
            "min_confidence {} outside [0, 1]",
            options.matcher.min_confidence
        )));
    }
    if options.matcher.max_window_tokens == 0 {
        return Err(DgError::MalformedInput(
            "max_window_tokens must be at least 1".into(),
        ));
    }
    Ok(options)
}

/// Detection result for one document, without any operator decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub catalog: String,
    pub segments: usize,
    pub candidates: Vec<MatchCandidate>,
    pub clusters: Vec<KeywordCluster>,
    pub unmatched: Vec<UnmatchedEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<RegulatoryFlag>,
}

impl ScanReport {
    /// One line per cluster: keyword, page and the best candidate.
    pub fn summary(&self) -> Vec<String> {
        self.clusters
            .iter()
            .map(|c| {
                let top = c.top();
                format!(
                    "p{} '{}' -> {} ({:.0}%)",
                    c.page,
                    c.keyword,
                    top.catalog_entry.label(),
                    top.confidence * 100.0
                )
            })
            .collect()
    }
}

/// Main API entry point: detect dangerous goods in already extracted text.
pub fn scan_text(
    raw_text: &str,
    page_boundaries: &[usize],
    catalog: &CatalogIndex,
    options: &ScanOptions,
) -> Result<ScanReport, DgError> {
    let segments = segment::segment(raw_text, page_boundaries)?;
    let candidates = matching::match_segments(&segments, catalog, &options.matcher);
    let clusters = reconcile::reconcile(&candidates, &options.reconcile);
    let unmatched = matching::find_unmatched_entries(&segments, &candidates);
    let flags = matching::regulatory_flags(&clusters);

    tracing::info!(
        segments = segments.len(),
        candidates = candidates.len(),
        clusters = clusters.len(),
        flags = flags.len(),
        "scan complete"
    );

    Ok(ScanReport {
        catalog: catalog.name().to_string(),
        segments: segments.len(),
        candidates,
        clusters,
        unmatched,
        flags,
    })
}

/// Detect dangerous goods in extracted pages.
pub fn scan_pages(
    pages: &[PageContent],
    catalog: &CatalogIndex,
    options: &ScanOptions,
) -> Result<ScanReport, DgError> {
    let (text, boundaries) = pages_to_text(pages);
    scan_text(&text, &boundaries, catalog, options)
}

/// Extract a PDF and detect dangerous goods in it.
pub fn scan_pdf(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    catalog: &CatalogIndex,
    options: &ScanOptions,
) -> Result<ScanReport, DgError> {
    let pages = extractor.extract_pages(pdf_bytes)?;
    tracing::debug!(backend = extractor.backend_name(), pages = pages.len(), "extracted");
    scan_pages(&pages, catalog, options)
}
