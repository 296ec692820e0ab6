use crate::catalog::CatalogIndex;
use crate::matching::normalize::{token_set, tokenize, Token};
use crate::matching::outcome::{MatchCandidate, MatchKind, MatchSource, UnmatchedEntry};
use crate::model::TextSegment;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

pub const UN_NUMBER_CONFIDENCE: f64 = 1.0;
pub const EXACT_NAME_CONFIDENCE: f64 = 0.95;
pub const SYNONYM_CONFIDENCE: f64 = 0.75;
pub const PARTIAL_BASE_CONFIDENCE: f64 = 0.5;
pub const PARTIAL_SIMILARITY_FACTOR: f64 = 0.45;
pub const PARTIAL_MIN_SIMILARITY: f64 = 0.7;

/// Prefixed UN numbers: "UN1263", "UN 1263", "UN-1263", "U.N. 1263", "UN No. 1263".
/// The digit run is captured whole so that longer runs can be rejected.
static UN_PREFIXED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bU\.?\s?N\.?(?:\s*NO\.?)?[\s\-:#]*(\d+)").expect("valid UN regex")
});

/// Numeric runs including decimal separators, so "1,263.50" is one run.
static NUMBER_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)*").expect("valid number regex"));

static DG_INDICATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bU\.?\s?N\.?(?:\s*NO\.?)?[\s\-:#]*\d{4}\b|\bdangerous\s+goods?\b|\bhazard(?:ous)?\b|\bclass\s+[1-9](?:\.[1-6])?\b",
    )
    .expect("valid indicator regex")
});

/// Matcher tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherOptions {
    /// Longest shipping-name window, in tokens.
    pub max_window_tokens: usize,
    /// Candidates below this confidence are dropped.
    pub min_confidence: f64,
    /// Look up bare 4-digit numbers as UN numbers.
    pub accept_bare_un_numbers: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        MatcherOptions {
            max_window_tokens: 8,
            min_confidence: 0.3,
            accept_bare_un_numbers: true,
        }
    }
}

/// Scan segments for catalog hits.
///
/// Segments are scanned in parallel; the result is in segment order and,
/// within a segment, in order of position.
pub fn match_segments(
    segments: &[TextSegment],
    catalog: &CatalogIndex,
    options: &MatcherOptions,
) -> Vec<MatchCandidate> {
    let per_segment: Vec<Vec<MatchCandidate>> = segments
        .par_iter()
        .map(|segment| match_segment(segment, catalog, options))
        .collect();

    let candidates: Vec<MatchCandidate> = per_segment.into_iter().flatten().collect();
    tracing::debug!(
        segments = segments.len(),
        candidates = candidates.len(),
        "matched segments"
    );
    candidates
}

/// Scan a single segment.
pub fn match_segment(
    segment: &TextSegment,
    catalog: &CatalogIndex,
    options: &MatcherOptions,
) -> Vec<MatchCandidate> {
    let text = segment.text.as_str();
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<Hit> = Vec::new();
    let un_spans = find_un_spans(text, options.accept_bare_un_numbers);

    for span in &un_spans {
        if let Some(idx) = catalog.index_of_un(&span.digits) {
            hits.push(Hit {
                range: span.range.clone(),
                entry_idx: idx,
                confidence: UN_NUMBER_CONFIDENCE,
                kind: MatchKind::UnNumber,
                keyword: format!("un{}", span.digits),
            });
        }
    }

    let tokens = tokenize(text);
    for run in token_runs(&tokens, &un_spans) {
        scan_names(run, catalog, options, &mut hits);
    }

    hits.retain(|h| h.confidence >= options.min_confidence);
    hits.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
            .then_with(|| a.entry_idx.cmp(&b.entry_idx))
    });

    hits.into_iter()
        .enumerate()
        .map(|(n, hit)| MatchCandidate {
            id: format!("cand_{}_{}", segment.id, n),
            segment_id: segment.id.clone(),
            page: segment.page,
            line_index: segment.line_index,
            matched_text: text[hit.range.clone()].to_string(),
            byte_range: hit.range,
            keyword: hit.keyword,
            catalog_entry: catalog.entry(hit.entry_idx).clone(),
            confidence: hit.confidence,
            source: MatchSource::Automatic,
            match_kind: hit.kind,
            context: text.to_string(),
        })
        .collect()
}

/// Lines that look like dangerous goods text but produced no candidate.
pub fn find_unmatched_entries(
    segments: &[TextSegment],
    candidates: &[MatchCandidate],
) -> Vec<UnmatchedEntry> {
    let matched: std::collections::HashSet<&str> =
        candidates.iter().map(|c| c.segment_id.as_str()).collect();

    let entries: Vec<UnmatchedEntry> = segments
        .iter()
        .filter(|s| !matched.contains(s.id.as_str()))
        .filter_map(|s| {
            let indicator = DG_INDICATOR_RE.find(&s.text)?;
            Some(UnmatchedEntry {
                segment_id: s.id.clone(),
                page: s.page,
                line_index: s.line_index,
                text: s.text.clone(),
                indicator: indicator.as_str().to_string(),
            })
        })
        .collect();

    for entry in &entries {
        tracing::warn!(
            segment = %entry.segment_id,
            indicator = %entry.indicator,
            "dangerous goods text without a catalog match"
        );
    }
    entries
}

struct Hit {
    range: Range<usize>,
    entry_idx: usize,
    confidence: f64,
    kind: MatchKind,
    keyword: String,
}

#[derive(Debug)]
struct UnSpan {
    range: Range<usize>,
    digits: String,
}

fn find_un_spans(text: &str, accept_bare: bool) -> Vec<UnSpan> {
    let mut spans: Vec<UnSpan> = UN_PREFIXED_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let digits = caps.get(1)?;
            (digits.as_str().len() == 4).then(|| UnSpan {
                range: whole.range(),
                digits: digits.as_str().to_string(),
            })
        })
        .collect();

    if accept_bare {
        let bytes = text.as_bytes();
        let bare: Vec<UnSpan> = NUMBER_RUN_RE
            .find_iter(text)
            .filter(|m| m.as_str().len() == 4 && m.as_str().bytes().all(|b| b.is_ascii_digit()))
            .filter(|m| !spans.iter().any(|s| overlaps(&s.range, &m.range())))
            .filter(|m| {
                let before = text[..m.start()].chars().next_back();
                let after = text[m.end()..].chars().next();
                !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
            })
            .map(|m| UnSpan {
                range: m.range(),
                digits: String::from_utf8_lossy(&bytes[m.range()]).into_owned(),
            })
            .collect();
        spans.extend(bare);
        spans.sort_by_key(|s| s.range.start);
    }

    spans
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Maximal runs of contiguous tokens that do not touch a UN number.
fn token_runs<'a>(tokens: &'a [Token], un_spans: &[UnSpan]) -> Vec<&'a [Token]> {
    let mut runs = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        let range = token.start..token.end;
        if un_spans.iter().any(|s| overlaps(&s.range, &range)) {
            if start < i {
                runs.push(&tokens[start..i]);
            }
            start = i + 1;
        }
    }
    if start < tokens.len() {
        runs.push(&tokens[start..]);
    }
    runs
}

/// Sliding-window name scan. At each position the best-scoring window wins
/// (the longer one on ties) and the scan continues after it, so hits from
/// one segment never overlap.
fn scan_names(
    run: &[Token],
    catalog: &CatalogIndex,
    options: &MatcherOptions,
    hits: &mut Vec<Hit>,
) {
    let mut i = 0;
    while i < run.len() {
        let max_w = options.max_window_tokens.min(run.len() - i);
        let mut best: Option<(usize, String, BTreeMap<usize, (f64, MatchKind)>)> = None;

        for w in 1..=max_w {
            let window = &run[i..i + w];
            let normalized = window
                .iter()
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let scored = score_window(&normalized, catalog, options.min_confidence);
            let Some(top) = max_confidence(&scored) else {
                continue;
            };
            let better = match &best {
                Some((_, _, current)) => max_confidence(current).is_none_or(|c| top >= c),
                None => true,
            };
            if better {
                best = Some((w, normalized, scored));
            }
        }

        match best {
            Some((w, keyword, scored)) => {
                let range = run[i].start..run[i + w - 1].end;
                for (entry_idx, (confidence, kind)) in scored {
                    hits.push(Hit {
                        range: range.clone(),
                        entry_idx,
                        confidence,
                        kind,
                        keyword: keyword.clone(),
                    });
                }
                i += w;
            }
            None => i += 1,
        }
    }
}

/// Best confidence per catalog entry for one normalized window.
fn score_window(
    normalized: &str,
    catalog: &CatalogIndex,
    min_confidence: f64,
) -> BTreeMap<usize, (f64, MatchKind)> {
    let mut scored: BTreeMap<usize, (f64, MatchKind)> = BTreeMap::new();
    let mut offer = |idx: usize, confidence: f64, kind: MatchKind| {
        if confidence < min_confidence {
            return;
        }
        let slot = scored.entry(idx).or_insert((confidence, kind));
        if confidence > slot.0 {
            *slot = (confidence, kind);
        }
    };

    for &idx in catalog.exact_name_hits(normalized) {
        offer(idx, EXACT_NAME_CONFIDENCE, MatchKind::ProperName);
    }
    for &(idx, weight) in catalog.synonym_hits(normalized) {
        offer(idx, SYNONYM_CONFIDENCE * weight, MatchKind::Synonym);
    }
    let exact = catalog.exact_name_hits(normalized);
    let tokens = token_set(normalized);
    for (idx, similarity) in catalog
        .partial_name_hits(&tokens, PARTIAL_MIN_SIMILARITY)
        .into_iter()
        .filter(|(idx, _)| !exact.contains(idx))
    {
        offer(
            idx,
            PARTIAL_BASE_CONFIDENCE + PARTIAL_SIMILARITY_FACTOR * similarity,
            MatchKind::PartialName,
        );
    }

    scored
}

fn max_confidence(scored: &BTreeMap<usize, (f64, MatchKind)>) -> Option<f64> {
    scored.values().map(|(c, _)| *c).reduce(f64::max)
}
