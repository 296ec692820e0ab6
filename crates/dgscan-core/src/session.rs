use crate::catalog::schema::DgCatalogEntry;
use crate::catalog::CatalogIndex;
use crate::compat::{self, CompatibilityVerdict, Conflict, SegregationTable};
use crate::error::DgError;
use crate::ledger::{ConfirmationLedger, ConfirmationRecord};
use crate::matching::outcome::{
    KeywordCluster, MatchCandidate, MatchKind, MatchSource, UnmatchedEntry,
};
use crate::matching::{find_unmatched_entries, match_segments};
use crate::model::TextSegment;
use crate::reconcile::reconcile;
use crate::segment::segment;
use crate::ScanOptions;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Manifest validation lifecycle.
///
/// `Uploaded -> Extracting -> Matched -> Confirming (self loop) ->
/// CompatibilityChecked -> Finalizable | Blocked`. `Blocked` is not terminal:
/// further decisions move the session back to `Confirming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uploaded,
    Extracting,
    Matched,
    Confirming,
    CompatibilityChecked,
    Finalizable,
    Blocked,
    Finalized,
    Abandoned,
}

impl SessionState {
    fn as_str(&self) -> &'static str {
        match self {
            SessionState::Uploaded => "uploaded",
            SessionState::Extracting => "extracting",
            SessionState::Matched => "matched",
            SessionState::Confirming => "confirming",
            SessionState::CompatibilityChecked => "compatibility_checked",
            SessionState::Finalizable => "finalizable",
            SessionState::Blocked => "blocked",
            SessionState::Finalized => "finalized",
            SessionState::Abandoned => "abandoned",
        }
    }

    /// States in which operators may confirm, reject or acknowledge.
    fn accepts_decisions(&self) -> bool {
        matches!(
            self,
            SessionState::Matched
                | SessionState::Confirming
                | SessionState::CompatibilityChecked
                | SessionState::Finalizable
                | SessionState::Blocked
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit statement that a manifest carries no dangerous goods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub acknowledged_by: String,
    pub acknowledged_at: DateTime<Utc>,
}

/// Why a session cannot be finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Blocker {
    /// No item confirmed and no "no dangerous goods" acknowledgment.
    NothingConfirmed,
    /// Error-severity segregation conflicts among the confirmed items.
    IncompatibleGoods { conflicts: Vec<Conflict> },
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocker::NothingConfirmed => write!(
                f,
                "no dangerous goods confirmed and no \"no dangerous goods\" acknowledgment"
            ),
            Blocker::IncompatibleGoods { conflicts } => {
                write!(f, "{} segregation conflict(s) must be resolved", conflicts.len())
            }
        }
    }
}

/// Input for the external "finalize shipment" call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizedManifest {
    pub confirmed: Vec<ConfirmationRecord>,
    pub verdict: CompatibilityVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_dangerous_goods: Option<Acknowledgment>,
    pub finalized_at: DateTime<Utc>,
}

/// One manifest validation, from upload to finalize or abandon.
///
/// The catalog and segregation table are shared, read-only inputs. Every
/// other piece of state lives and dies with the session.
#[derive(Debug)]
pub struct ValidationSession {
    catalog: Arc<CatalogIndex>,
    table: Arc<SegregationTable>,
    options: ScanOptions,
    state: SessionState,
    segments: Vec<TextSegment>,
    candidates: Vec<MatchCandidate>,
    clusters: Vec<KeywordCluster>,
    unmatched: Vec<UnmatchedEntry>,
    ledger: ConfirmationLedger,
    acknowledgment: Option<Acknowledgment>,
    last_verdict: Option<CompatibilityVerdict>,
    manual_count: usize,
}

impl ValidationSession {
    pub fn new(
        catalog: Arc<CatalogIndex>,
        table: Arc<SegregationTable>,
        options: ScanOptions,
    ) -> Self {
        ValidationSession {
            catalog,
            table,
            options,
            state: SessionState::Uploaded,
            segments: Vec::new(),
            candidates: Vec::new(),
            clusters: Vec::new(),
            unmatched: Vec::new(),
            ledger: ConfirmationLedger::new(),
            acknowledgment: None,
            last_verdict: None,
            manual_count: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn segments(&self) -> &[TextSegment] {
        &self.segments
    }

    pub fn candidates(&self) -> &[MatchCandidate] {
        &self.candidates
    }

    pub fn clusters(&self) -> &[KeywordCluster] {
        &self.clusters
    }

    /// Lines that look like dangerous goods text without a catalog match.
    pub fn unmatched(&self) -> &[UnmatchedEntry] {
        &self.unmatched
    }

    pub fn ledger(&self) -> &ConfirmationLedger {
        &self.ledger
    }

    pub fn confirmed_set(&self) -> Vec<ConfirmationRecord> {
        self.ledger.confirmed_set()
    }

    pub fn acknowledgment(&self) -> Option<&Acknowledgment> {
        self.acknowledgment.as_ref()
    }

    /// Verdict of the most recent compatibility check, for display only.
    pub fn last_verdict(&self) -> Option<&CompatibilityVerdict> {
        self.last_verdict.as_ref()
    }

    /// Segment, match and reconcile an extracted document.
    ///
    /// Malformed input fails the run and leaves the session `Uploaded`.
    pub fn run(&mut self, raw_text: &str, page_boundaries: &[usize]) -> Result<&[KeywordCluster], DgError> {
        self.require(self.state == SessionState::Uploaded, "run the pipeline")?;
        self.transition(SessionState::Extracting);

        let segments = match segment(raw_text, page_boundaries) {
            Ok(segments) => segments,
            Err(e) => {
                self.transition(SessionState::Uploaded);
                return Err(e);
            }
        };

        let candidates = match_segments(&segments, &self.catalog, &self.options.matcher);
        self.unmatched = find_unmatched_entries(&segments, &candidates);
        self.ledger.register(&candidates);
        self.clusters = reconcile(&candidates, &self.options.reconcile);
        self.candidates = candidates;
        self.segments = segments;

        tracing::info!(
            segments = self.segments.len(),
            candidates = self.candidates.len(),
            clusters = self.clusters.len(),
            unmatched = self.unmatched.len(),
            "manifest scanned"
        );
        self.transition(SessionState::Matched);
        Ok(&self.clusters)
    }

    pub fn confirm(&mut self, candidate_id: &str, user_id: &str) -> Result<ConfirmationRecord, DgError> {
        self.require(self.state.accepts_decisions(), "confirm")?;
        let record = self.ledger.confirm(candidate_id, user_id)?;
        if self.acknowledgment.take().is_some() {
            tracing::info!("no dangerous goods acknowledgment withdrawn by confirmation");
        }
        self.transition(SessionState::Confirming);
        Ok(record)
    }

    pub fn reject(&mut self, candidate_id: &str, user_id: &str) -> Result<ConfirmationRecord, DgError> {
        self.require(self.state.accepts_decisions(), "reject")?;
        let record = self.ledger.reject(candidate_id, user_id)?;
        self.transition(SessionState::Confirming);
        Ok(record)
    }

    /// Add an operator-identified item on a segment, then re-reconcile.
    ///
    /// Manual candidates have confidence 1.0 and rank below automatic ones
    /// of equal confidence.
    pub fn add_manual_candidate(
        &mut self,
        segment_id: &str,
        un_number: &str,
    ) -> Result<MatchCandidate, DgError> {
        self.require(self.state.accepts_decisions(), "add a manual candidate")?;
        let segment = self
            .segments
            .iter()
            .find(|s| s.id == segment_id)
            .ok_or_else(|| DgError::MalformedInput(format!("unknown segment '{}'", segment_id)))?;
        let entry = self
            .catalog
            .lookup_by_un_number(un_number)
            .ok_or_else(|| DgError::UnknownUnNumber(un_number.to_string()))?;

        self.manual_count += 1;
        let candidate = manual_candidate(segment, entry, self.manual_count);
        self.ledger.register(std::slice::from_ref(&candidate));
        self.candidates.push(candidate.clone());
        self.clusters = reconcile(&self.candidates, &self.options.reconcile);

        self.transition(SessionState::Confirming);
        Ok(candidate)
    }

    /// Declare that the manifest carries no dangerous goods.
    ///
    /// Only possible while nothing is confirmed. A later confirmation
    /// withdraws the acknowledgment.
    pub fn acknowledge_no_dangerous_goods(&mut self, user_id: &str) -> Result<(), DgError> {
        self.require(
            self.state.accepts_decisions() && self.ledger.confirmed_set().is_empty(),
            "acknowledge no dangerous goods",
        )?;
        if !self.unmatched.is_empty() || !self.candidates.is_empty() {
            tracing::warn!(
                candidates = self.candidates.len(),
                unmatched = self.unmatched.len(),
                "no dangerous goods acknowledged on a document with dangerous goods text"
            );
        }
        self.acknowledgment = Some(Acknowledgment {
            acknowledged_by: user_id.to_string(),
            acknowledged_at: Utc::now(),
        });
        self.transition(SessionState::Confirming);
        Ok(())
    }

    /// Recompute the verdict for the current confirmed set and decide
    /// between `Finalizable` and `Blocked`.
    pub fn check_compatibility(&mut self) -> Result<CompatibilityVerdict, DgError> {
        self.require(self.state.accepts_decisions(), "check compatibility")?;
        let verdict = self.verdict();
        self.transition(SessionState::CompatibilityChecked);

        let next = if self.blockers_for(&verdict).is_empty() {
            SessionState::Finalizable
        } else {
            SessionState::Blocked
        };
        self.last_verdict = Some(verdict.clone());
        self.transition(next);
        Ok(verdict)
    }

    /// Everything that currently prevents finalization. Always recomputed.
    pub fn blockers(&self) -> Vec<Blocker> {
        self.blockers_for(&self.verdict())
    }

    /// Advisory messages that do not block finalization. Always recomputed.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.acknowledgment.is_some() && !self.unmatched.is_empty() {
            warnings.push(format!(
                "\"no dangerous goods\" acknowledged, but {} line(s) look like dangerous goods text",
                self.unmatched.len()
            ));
        }
        warnings.extend(
            self.verdict()
                .warnings()
                .map(|c| format!("UN{} / UN{}: {}", c.item_a, c.item_b, c.rule)),
        );
        warnings
    }

    /// Produce the input of the external "finalize shipment" call.
    ///
    /// The verdict is recomputed; if anything blocks, the session moves to
    /// `Blocked` and the call fails.
    pub fn finalize(&mut self) -> Result<FinalizedManifest, DgError> {
        self.require(self.state == SessionState::Finalizable, "finalize")?;
        let verdict = self.verdict();
        if !self.blockers_for(&verdict).is_empty() {
            self.last_verdict = Some(verdict);
            self.transition(SessionState::Blocked);
            return Err(self.invalid("finalize"));
        }

        let manifest = FinalizedManifest {
            confirmed: self.ledger.confirmed_set(),
            verdict,
            no_dangerous_goods: self.acknowledgment.clone(),
            finalized_at: Utc::now(),
        };
        tracing::info!(
            confirmed = manifest.confirmed.len(),
            warnings = manifest.verdict.conflicts.len(),
            "manifest finalized"
        );
        self.transition(SessionState::Finalized);
        Ok(manifest)
    }

    /// Drop the session without finalizing. The ledger history stays readable.
    pub fn abandon(&mut self) -> Result<(), DgError> {
        self.require(
            !matches!(self.state, SessionState::Finalized | SessionState::Abandoned),
            "abandon",
        )?;
        self.transition(SessionState::Abandoned);
        Ok(())
    }

    /// Catalog entries of the confirmed candidates.
    fn confirmed_items(&self) -> Vec<DgCatalogEntry> {
        self.ledger
            .confirmed_set()
            .iter()
            .filter_map(|r| self.candidates.iter().find(|c| c.id == r.candidate_id))
            .map(|c| c.catalog_entry.clone())
            .collect()
    }

    /// Verdict for the current confirmed set, without a state change.
    pub fn verdict(&self) -> CompatibilityVerdict {
        compat::check(&self.confirmed_items(), &self.table)
    }

    fn blockers_for(&self, verdict: &CompatibilityVerdict) -> Vec<Blocker> {
        let mut blockers = Vec::new();
        if self.ledger.confirmed_set().is_empty() && self.acknowledgment.is_none() {
            blockers.push(Blocker::NothingConfirmed);
        }
        if !verdict.compliant {
            blockers.push(Blocker::IncompatibleGoods {
                conflicts: verdict.errors().cloned().collect(),
            });
        }
        blockers
    }

    fn require(&self, allowed: bool, action: &str) -> Result<(), DgError> {
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &str) -> DgError {
        DgError::InvalidTransition {
            from: self.state.to_string(),
            action: action.to_string(),
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "session transition");
            self.state = next;
        }
    }
}

fn manual_candidate(segment: &TextSegment, entry: &DgCatalogEntry, n: usize) -> MatchCandidate {
    MatchCandidate {
        id: format!("manual_{}", n),
        segment_id: segment.id.clone(),
        page: segment.page,
        line_index: segment.line_index,
        byte_range: 0..segment.text.len(),
        matched_text: segment.text.clone(),
        keyword: format!("un{}", entry.un_number),
        catalog_entry: entry.clone(),
        confidence: 1.0,
        source: MatchSource::Manual,
        match_kind: MatchKind::Manual,
        context: segment.text.clone(),
    }
}
