use crate::compat::{Conflict, Severity};
use crate::ledger::ConfirmationRecord;
use crate::matching::flags::{regulatory_flags, RegulatoryFlag};
use crate::matching::outcome::{KeywordCluster, MatchKind, MatchSource};
use crate::session::{SessionState, ValidationSession};
use serde::{Deserialize, Serialize};

pub const AUDIT_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Critical,
    Important,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditCandidate {
    pub candidate_id: String,
    pub un_number: String,
    pub proper_shipping_name: String,
    pub matched_text: String,
    pub confidence: f64,
    pub match_kind: MatchKind,
    pub source: MatchSource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditDetection {
    pub detection_id: String,
    pub keyword: String,
    pub page: usize,
    pub line_index: usize,
    pub context: String,
    pub candidates: Vec<AuditCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditWarning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    pub message: String,
    pub severity: AuditSeverity,
}

/// What a validation session saw and decided, for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditBundle {
    pub schema_version: String,
    pub state: SessionState,
    pub detections: Vec<AuditDetection>,
    /// Full ledger history, including superseded decisions.
    pub decisions: Vec<ConfirmationRecord>,
    pub compliant: bool,
    pub conflicts: Vec<Conflict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<AuditWarning>,
    /// Advisory flags on the detected goods.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<RegulatoryFlag>,
}

pub fn build_audit_bundle(session: &ValidationSession) -> AuditBundle {
    let verdict = session.verdict();

    let detections = session
        .clusters()
        .iter()
        .enumerate()
        .map(|(idx, cluster)| build_detection(idx, cluster))
        .collect();

    let mut warnings: Vec<AuditWarning> = session
        .unmatched()
        .iter()
        .map(|u| AuditWarning {
            segment_id: Some(u.segment_id.clone()),
            message: format!(
                "page {} line {}: '{}' looks like dangerous goods text ({}) but matched no catalog entry",
                u.page,
                u.line_index + 1,
                u.text,
                u.indicator
            ),
            severity: AuditSeverity::Important,
        })
        .collect();

    if let Some(ack) = session.acknowledgment() {
        warnings.push(AuditWarning {
            segment_id: None,
            message: format!(
                "\"no dangerous goods\" acknowledged by {} at {}",
                ack.acknowledged_by,
                ack.acknowledged_at.to_rfc3339()
            ),
            severity: if session.unmatched().is_empty() && session.candidates().is_empty() {
                AuditSeverity::Info
            } else {
                AuditSeverity::Critical
            },
        });
    }

    warnings.extend(verdict.conflicts.iter().map(|c| AuditWarning {
        segment_id: None,
        message: format!("UN{} / UN{}: {}", c.item_a, c.item_b, c.rule),
        severity: match c.severity {
            Severity::Error => AuditSeverity::Critical,
            Severity::Warning => AuditSeverity::Important,
        },
    }));

    AuditBundle {
        schema_version: AUDIT_SCHEMA_VERSION.to_string(),
        state: session.state(),
        detections,
        decisions: session.ledger().history().to_vec(),
        compliant: verdict.compliant,
        conflicts: verdict.conflicts,
        warnings,
        flags: regulatory_flags(session.clusters()),
    }
}

fn build_detection(idx: usize, cluster: &KeywordCluster) -> AuditDetection {
    AuditDetection {
        detection_id: format!("det_{}_{}", cluster.page, idx),
        keyword: cluster.keyword.clone(),
        page: cluster.page,
        line_index: cluster.line_index,
        context: cluster.context.clone(),
        candidates: cluster
            .candidates
            .iter()
            .map(|c| AuditCandidate {
                candidate_id: c.id.clone(),
                un_number: c.un_number().to_string(),
                proper_shipping_name: c.catalog_entry.proper_shipping_name.clone(),
                matched_text: c.matched_text.clone(),
                confidence: c.confidence,
                match_kind: c.match_kind,
                source: c.source,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScanOptions;
    use std::sync::Arc;

    fn session() -> ValidationSession {
        let catalog = crate::catalog::builtin::load_preset("adg-core").unwrap();
        let table = crate::compat::builtin::load_preset("adg-class").unwrap();
        ValidationSession::new(Arc::new(catalog), Arc::new(table), ScanOptions::default())
    }

    #[test]
    fn test_bundle_keeps_full_history() {
        let mut s = session();
        s.run("UN1263 Paint\nUN9999 unknown goods\n", &[]).unwrap();
        let id = s.clusters()[0].top().id.clone();
        s.confirm(&id, "alice").unwrap();
        s.reject(&id, "bob").unwrap();

        let bundle = build_audit_bundle(&s);
        assert_eq!(bundle.schema_version, AUDIT_SCHEMA_VERSION);
        assert_eq!(bundle.decisions.len(), 2);
        assert_eq!(bundle.detections.len(), 1);
        assert_eq!(bundle.detections[0].candidates[0].un_number, "1263");
        assert!(bundle.compliant);
        assert_eq!(bundle.warnings.len(), 1);
        assert_eq!(bundle.warnings[0].segment_id.as_deref(), Some("seg_1_1"));
        assert!(bundle.flags.is_empty());
    }

    #[test]
    fn test_bundle_serializes() {
        let mut s = session();
        s.run("UN1263 Paint\nUN1942 Ammonium nitrate\n", &[]).unwrap();
        let ids: Vec<String> = s.clusters().iter().map(|c| c.top().id.clone()).collect();
        for id in &ids {
            s.confirm(id, "alice").unwrap();
        }
        let bundle = build_audit_bundle(&s);
        assert!(!bundle.compliant);
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["state"], "confirming");
        assert_eq!(json["conflicts"][0]["severity"], "error");
        assert_eq!(json["decisions"][0]["decision"], "confirmed");
        assert_eq!(json["flags"][0]["kind"], "mixed_classes");
    }
}
