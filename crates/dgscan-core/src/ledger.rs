use crate::catalog::schema::DgCatalogEntry;
use crate::error::DgError;
use crate::matching::outcome::MatchCandidate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Confirmed,
    Rejected,
}

/// One confirm or reject action by an operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRecord {
    pub candidate_id: String,
    pub un_number: String,
    /// "UN1263 Paint, class 3" style description of the confirmed item.
    pub description: String,
    pub confirmed_by: String,
    pub confirmed_at: DateTime<Utc>,
    pub decision: Decision,
    /// Ledger-wide sequence number; the highest per candidate wins.
    pub sequence: u64,
}

#[derive(Debug, Clone)]
struct KnownCandidate {
    un_number: String,
    description: String,
}

/// Append-only record of confirm/reject decisions for one session.
///
/// Only candidate ids registered through [`ConfirmationLedger::register`]
/// are accepted. Every decision is retained; the latest one per candidate
/// determines the confirmed set.
#[derive(Debug, Clone, Default)]
pub struct ConfirmationLedger {
    order: Vec<String>,
    known: HashMap<String, KnownCandidate>,
    records: Vec<ConfirmationRecord>,
    next_sequence: u64,
}

impl ConfirmationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make candidates eligible for decisions. Already known ids are kept as is.
    pub fn register(&mut self, candidates: &[MatchCandidate]) {
        for cand in candidates {
            if self.known.contains_key(&cand.id) {
                continue;
            }
            self.order.push(cand.id.clone());
            self.known.insert(
                cand.id.clone(),
                KnownCandidate {
                    un_number: cand.un_number().to_string(),
                    description: describe(&cand.catalog_entry),
                },
            );
        }
    }

    pub fn is_known(&self, candidate_id: &str) -> bool {
        self.known.contains_key(candidate_id)
    }

    pub fn confirm(&mut self, candidate_id: &str, user_id: &str) -> Result<ConfirmationRecord, DgError> {
        self.record(candidate_id, user_id, Decision::Confirmed)
    }

    pub fn reject(&mut self, candidate_id: &str, user_id: &str) -> Result<ConfirmationRecord, DgError> {
        self.record(candidate_id, user_id, Decision::Rejected)
    }

    /// Every record in the order it was made.
    pub fn history(&self) -> &[ConfirmationRecord] {
        &self.records
    }

    /// The latest record for a candidate, if any decision was made.
    pub fn latest(&self, candidate_id: &str) -> Option<&ConfirmationRecord> {
        self.records
            .iter()
            .filter(|r| r.candidate_id == candidate_id)
            .max_by_key(|r| r.sequence)
    }

    /// Candidates whose latest decision is "confirmed", in registration order.
    pub fn confirmed_set(&self) -> Vec<ConfirmationRecord> {
        self.order
            .iter()
            .filter_map(|id| self.latest(id))
            .filter(|r| r.decision == Decision::Confirmed)
            .cloned()
            .collect()
    }

    fn record(
        &mut self,
        candidate_id: &str,
        user_id: &str,
        decision: Decision,
    ) -> Result<ConfirmationRecord, DgError> {
        let Some(known) = self.known.get(candidate_id) else {
            tracing::warn!(candidate = candidate_id, "decision for unknown candidate rejected");
            return Err(DgError::UnknownCandidate(candidate_id.to_string()));
        };

        self.next_sequence += 1;
        let record = ConfirmationRecord {
            candidate_id: candidate_id.to_string(),
            un_number: known.un_number.clone(),
            description: known.description.clone(),
            confirmed_by: user_id.to_string(),
            confirmed_at: Utc::now(),
            decision,
            sequence: self.next_sequence,
        };
        self.records.push(record.clone());
        Ok(record)
    }
}

fn describe(entry: &DgCatalogEntry) -> String {
    format!("{}, class {}", entry.label(), entry.hazard_class)
}
