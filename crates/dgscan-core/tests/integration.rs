//! Integration tests for the detection and validation pipeline.
//!
//! Uses a MockExtractor that returns pre-built PageContent without
//! invoking pdftotext, so these tests run without poppler-utils.

use std::sync::Arc;

use dgscan_core::catalog::builtin::load_preset as load_catalog_preset;
use dgscan_core::catalog::CatalogIndex;
use dgscan_core::compat::builtin::load_preset as load_table_preset;
use dgscan_core::compat::{check, check_un_numbers, parse_segregation_table_str, Severity};
use dgscan_core::error::DgError;
use dgscan_core::extraction::{PageContent, PdfExtractor};
use dgscan_core::matching::{match_segments, MatchKind};
use dgscan_core::reconcile::{reconcile, ReconcileOptions};
use dgscan_core::segment::segment;
use dgscan_core::session::{SessionState, ValidationSession};
use dgscan_core::{scan_pdf, scan_text, ScanOptions};

struct MockExtractor {
    pages: Vec<PageContent>,
}

impl PdfExtractor for MockExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageContent>, DgError> {
        Ok(self.pages.clone())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn page(number: usize, lines: &[&str]) -> PageContent {
    PageContent {
        page_number: number,
        lines: lines.iter().map(|s| s.to_string()).collect(),
    }
}

fn catalog() -> CatalogIndex {
    load_catalog_preset("adg-core").unwrap()
}

fn session() -> ValidationSession {
    ValidationSession::new(
        Arc::new(catalog()),
        Arc::new(load_table_preset("adg-class").unwrap()),
        ScanOptions::default(),
    )
}

fn manifest() -> MockExtractor {
    MockExtractor {
        pages: vec![
            page(
                1,
                &[
                    "DANGEROUS GOODS DECLARATION",
                    "Consignor: Acme Coatings Pty Ltd",
                    "",
                    "  Item  Description                         Class  PG   Qty",
                    "  1     UN1263 Paint, flammable               3      II   4 drums 200 L",
                    "  2     Acetone                               3      II   12 x 5 L",
                    "        UN1090",
                    "  3     Office stationery                                  2 boxes",
                ],
            ),
            page(
                2,
                &[
                    "  4     UN1942 Ammonium nitrate               5.1    III  500 kg",
                    "  5     Paint                                              20 L",
                    "  6     UN 9999 Unlisted hazardous sample",
                ],
            ),
        ],
    }
}

// ---------------------------------------------------------------------------
// Scenario: UN number and shipping name on one line merge into one cluster
// ---------------------------------------------------------------------------
#[test]
fn un_number_and_name_merge_into_one_cluster() {
    let report = scan_text("UN1263 Paint, flammable\n", &[], &catalog(), &ScanOptions::default()).unwrap();

    let un = report
        .candidates
        .iter()
        .find(|c| c.match_kind == MatchKind::UnNumber)
        .unwrap();
    assert_eq!(un.un_number(), "1263");
    assert_eq!(un.confidence, 1.0);
    assert!(report
        .candidates
        .iter()
        .any(|c| c.un_number() == "1263" && c.matched_text == "Paint" && c.confidence >= 0.95));

    assert_eq!(report.clusters.len(), 1);
    let cluster = &report.clusters[0];
    assert_eq!(cluster.page, 1);
    assert_eq!(cluster.top().id, un.id);
    assert_eq!(cluster.candidates.len(), report.candidates.len());
}

// ---------------------------------------------------------------------------
// Scenario: flammable liquid with oxidizer is a prohibited combination
// ---------------------------------------------------------------------------
#[test]
fn flammable_liquid_with_oxidizer_is_not_compliant() {
    let table = parse_segregation_table_str(
        r#"{ "name": "3/5.1", "version": "1",
             "class_rules": [{ "classes": ["3", "5.1"], "status": "prohibited" }] }"#,
    )
    .unwrap();
    let verdict = check_un_numbers(&["1263", "1942"], &catalog(), &table).unwrap();
    assert!(!verdict.compliant);
    assert_eq!(verdict.conflicts.len(), 1);
    assert_eq!(verdict.conflicts[0].severity, Severity::Error);

    let builtin = load_table_preset("adg-class").unwrap();
    let verdict = check_un_numbers(&["1263", "1942"], &catalog(), &builtin).unwrap();
    assert!(!verdict.compliant);
    assert_eq!(verdict.conflicts.len(), 1);
}

// ---------------------------------------------------------------------------
// Scenario: a single corrosive item is compliant
// ---------------------------------------------------------------------------
#[test]
fn single_corrosive_is_compliant() {
    let table = load_table_preset("adg-class").unwrap();
    let verdict = check_un_numbers(&["1830"], &catalog(), &table).unwrap();
    assert!(verdict.compliant);
    assert!(verdict.conflicts.is_empty());
}

// ---------------------------------------------------------------------------
// Scenario: rejecting a stale candidate fails and leaves the ledger alone
// ---------------------------------------------------------------------------
#[test]
fn stale_candidate_is_rejected_without_side_effects() {
    let mut s = session();
    s.run("UN1263 Paint\n", &[]).unwrap();
    let id = s.clusters()[0].top().id.clone();
    s.confirm(&id, "alice").unwrap();

    let history = s.ledger().history().to_vec();
    let state = s.state();
    let err = s.reject("cand_from_another_session", "alice").unwrap_err();
    assert!(matches!(err, DgError::UnknownCandidate(_)));
    assert_eq!(err.user_message(), "this selection is no longer valid, please refresh");
    assert_eq!(s.ledger().history(), history.as_slice());
    assert_eq!(s.state(), state);
    assert_eq!(s.confirmed_set().len(), 1);
}

// ---------------------------------------------------------------------------
// Scenario: empty document finalizes through the acknowledgment path
// ---------------------------------------------------------------------------
#[test]
fn empty_document_finalizes_with_acknowledgment() {
    let segments = segment("", &[]).unwrap();
    let candidates = match_segments(&segments, &catalog(), &Default::default());
    assert!(candidates.is_empty());
    assert!(reconcile(&candidates, &ReconcileOptions::default()).is_empty());

    let mut s = session();
    s.run("", &[]).unwrap();
    s.check_compatibility().unwrap();
    assert_eq!(s.state(), SessionState::Blocked);

    s.acknowledge_no_dangerous_goods("alice").unwrap();
    s.check_compatibility().unwrap();
    assert_eq!(s.state(), SessionState::Finalizable);
    let finalized = s.finalize().unwrap();
    assert!(finalized.confirmed.is_empty());
    assert_eq!(
        finalized.no_dangerous_goods.unwrap().acknowledged_by,
        "alice"
    );
}

// ---------------------------------------------------------------------------
// Property: match -> reconcile is deterministic
// ---------------------------------------------------------------------------
#[test]
fn scan_is_deterministic() {
    let cat = catalog();
    let extractor = manifest();
    let first = scan_pdf(&[], &extractor, &cat, &ScanOptions::default()).unwrap();
    let first_json = serde_json::to_string(&first.clusters).unwrap();
    for _ in 0..5 {
        let again = scan_pdf(&[], &extractor, &cat, &ScanOptions::default()).unwrap();
        assert_eq!(serde_json::to_string(&again.clusters).unwrap(), first_json);
    }
}

// ---------------------------------------------------------------------------
// Property: reconciliation is idempotent and ignores input order
// ---------------------------------------------------------------------------
#[test]
fn reconcile_is_idempotent() {
    let report = scan_pdf(&[], &manifest(), &catalog(), &ScanOptions::default()).unwrap();
    let opts = ReconcileOptions::default();
    let once = reconcile(&report.candidates, &opts);
    assert_eq!(once, reconcile(&report.candidates, &opts));

    let mut shuffled = report.candidates.clone();
    shuffled.reverse();
    shuffled.rotate_left(3);
    assert_eq!(once, reconcile(&shuffled, &opts));
    assert_eq!(once, report.clusters);
}

// ---------------------------------------------------------------------------
// Property: an exact UN number match outranks name matches for the same item
// ---------------------------------------------------------------------------
#[test]
fn un_number_outranks_name_matches() {
    let cat = catalog();
    for entry in cat.entries() {
        let text = format!(
            "UN{} {}\n{} consignment\n",
            entry.un_number, entry.proper_shipping_name, entry.proper_shipping_name
        );
        let report = scan_text(&text, &[], &cat, &ScanOptions::default()).unwrap();
        let cluster = report
            .clusters
            .iter()
            .find(|c| c.candidates.iter().any(|m| m.match_kind == MatchKind::UnNumber))
            .unwrap_or_else(|| panic!("no UN cluster for {}", entry.un_number));

        let un_pos = cluster
            .candidates
            .iter()
            .position(|m| m.match_kind == MatchKind::UnNumber && m.un_number() == entry.un_number)
            .unwrap();
        for (pos, m) in cluster.candidates.iter().enumerate() {
            if m.un_number() == entry.un_number && m.match_kind != MatchKind::UnNumber {
                assert!(un_pos < pos, "UN{} ranked below {:?}", entry.un_number, m.match_kind);
                assert!(m.confidence < 1.0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property: ledger last write wins
// ---------------------------------------------------------------------------
#[test]
fn ledger_last_write_wins() {
    let mut s = session();
    s.run("UN1263 Paint\nUN1090 Acetone\n", &[]).unwrap();
    let paint = s.clusters()[0].top().id.clone();
    let acetone = s.clusters()[1].top().id.clone();

    s.confirm(&paint, "alice").unwrap();
    s.reject(&paint, "alice").unwrap();
    assert!(s.confirmed_set().iter().all(|r| r.candidate_id != paint));

    s.reject(&acetone, "bob").unwrap();
    s.confirm(&acetone, "bob").unwrap();
    assert!(s.confirmed_set().iter().any(|r| r.candidate_id == acetone));

    assert_eq!(s.ledger().history().len(), 4);
}

// ---------------------------------------------------------------------------
// Property: compatibility is symmetric in input order
// ---------------------------------------------------------------------------
#[test]
fn compatibility_is_symmetric() {
    let cat = catalog();
    let table = load_table_preset("adg-class").unwrap();
    let entries = cat.entries();
    for a in entries {
        for b in entries {
            let ab = check(&[a.clone(), b.clone()], &table);
            let ba = check(&[b.clone(), a.clone()], &table);
            assert_eq!(ab, ba, "UN{} / UN{}", a.un_number, b.un_number);
        }
    }
}

// ---------------------------------------------------------------------------
// End to end: multi-page manifest through a session
// ---------------------------------------------------------------------------
#[test]
fn multi_page_manifest_session() {
    let report = scan_pdf(&[], &manifest(), &catalog(), &ScanOptions::default()).unwrap();

    // UN1263 line, Acetone + UN1090 on adjacent lines, UN1942 and Paint on page 2
    let keywords: Vec<(usize, &str)> = report
        .clusters
        .iter()
        .map(|c| (c.page, c.keyword.as_str()))
        .collect();
    assert_eq!(
        keywords,
        vec![(1, "un1263"), (1, "un1090"), (2, "un1942"), (2, "paint")]
    );
    assert_eq!(report.clusters[1].context, "  2     Acetone                               3      II   12 x 5 L |         UN1090");
    assert_eq!(report.unmatched.len(), 2);
    assert_eq!(report.unmatched[0].indicator, "DANGEROUS GOODS");

    let pages = manifest().pages;
    let (text, boundaries) = dgscan_core::extraction::pages_to_text(&pages);
    let mut s = session();
    s.run(&text, &boundaries).unwrap();
    assert_eq!(s.clusters(), report.clusters.as_slice());

    let ids: Vec<String> = s.clusters().iter().map(|c| c.top().id.clone()).collect();
    for id in &ids[..3] {
        s.confirm(id, "alice").unwrap();
    }
    let verdict = s.check_compatibility().unwrap();
    assert!(!verdict.compliant);
    assert_eq!(s.state(), SessionState::Blocked);

    s.reject(&ids[2], "alice").unwrap();
    assert!(s.check_compatibility().unwrap().compliant);
    let finalized = s.finalize().unwrap();
    let uns: Vec<&str> = finalized.confirmed.iter().map(|r| r.un_number.as_str()).collect();
    assert_eq!(uns, vec!["1263", "1090"]);
}

#[test]
fn malformed_boundaries_fail_the_run() {
    let err = scan_text("abc\ndef\n", &[0, 10], &catalog(), &ScanOptions::default()).unwrap_err();
    assert!(matches!(err, DgError::MalformedInput(_)));
    assert_eq!(err.user_message(), "could not process this document, please re-upload");
}
