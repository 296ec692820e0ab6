use crate::matching::details::extract_details;
use crate::matching::outcome::{KeywordCluster, MatchCandidate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Reconciler tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileOptions {
    /// Maximum line distance between linked candidates on the same page.
    pub line_window: usize,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions { line_window: 5 }
    }
}

/// Group candidates into ranked keyword clusters.
///
/// Two candidates are linked when they sit on the same page within
/// `line_window` lines of each other and share either the normalized keyword
/// or the UN number. Clusters are the connected components of that relation,
/// so a UN number on one line and the shipping name on the next end up in one
/// cluster. The output does not depend on input order.
pub fn reconcile(candidates: &[MatchCandidate], options: &ReconcileOptions) -> Vec<KeywordCluster> {
    let mut ordered: Vec<&MatchCandidate> = candidates.iter().collect();
    ordered.sort_by(|a, b| position_order(a, b));

    let mut sets = DisjointSet::new(ordered.len());
    for i in 0..ordered.len() {
        for j in (i + 1)..ordered.len() {
            let (a, b) = (ordered[i], ordered[j]);
            // Sorted by page then line: nothing further can link to `a`.
            if b.page != a.page || b.line_index > a.line_index + options.line_window {
                break;
            }
            if a.keyword == b.keyword || a.un_number() == b.un_number() {
                sets.union(i, j);
            }
        }
    }

    // Slots in order of each cluster's first member.
    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut groups: Vec<Vec<&MatchCandidate>> = Vec::new();
    for (i, cand) in ordered.iter().enumerate() {
        let root = sets.find(i);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(*cand);
    }

    let clusters: Vec<KeywordCluster> = groups.into_iter().map(build_cluster).collect();
    tracing::debug!(
        candidates = candidates.len(),
        clusters = clusters.len(),
        "reconciled candidates"
    );
    clusters
}

/// Ranking within a cluster: confidence, automatic before manual, entries
/// with a packing group before those without, then UN number and id.
pub fn rank_order(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| {
            let a_pg = a.catalog_entry.packing_group.is_some();
            let b_pg = b.catalog_entry.packing_group.is_some();
            b_pg.cmp(&a_pg)
        })
        .then_with(|| a.un_number().cmp(b.un_number()))
        .then_with(|| a.id.cmp(&b.id))
}

fn position_order(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    a.page
        .cmp(&b.page)
        .then_with(|| a.line_index.cmp(&b.line_index))
        .then_with(|| a.byte_range.start.cmp(&b.byte_range.start))
        .then_with(|| a.byte_range.end.cmp(&b.byte_range.end))
        .then_with(|| a.id.cmp(&b.id))
}

fn build_cluster(members: Vec<&MatchCandidate>) -> KeywordCluster {
    let page = members[0].page;
    let line_index = members[0].line_index;

    // Members are in position order, so lines come out top to bottom.
    let mut lines: Vec<(usize, &str)> = Vec::new();
    for m in &members {
        if !lines.iter().any(|(l, _)| *l == m.line_index) {
            lines.push((m.line_index, m.context.as_str()));
        }
    }
    let context = lines
        .iter()
        .map(|(_, text)| *text)
        .collect::<Vec<_>>()
        .join(" | ");
    let details = extract_details(&context);

    let mut candidates: Vec<MatchCandidate> = members.into_iter().cloned().collect();
    candidates.sort_by(rank_order);

    KeywordCluster {
        keyword: candidates[0].keyword.clone(),
        page,
        line_index,
        context,
        candidates,
        details,
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        DisjointSet {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// The smaller root always wins, so roots do not depend on union order.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::schema::DgCatalogEntry;
    use crate::matching::outcome::{MatchKind, MatchSource};
    use crate::model::{HazardClass, PackingGroup};

    fn entry(un: &str, pg: Option<PackingGroup>) -> DgCatalogEntry {
        DgCatalogEntry {
            un_number: un.into(),
            proper_shipping_name: "Paint".into(),
            hazard_class: HazardClass::FlammableLiquid,
            sub_hazard_classes: vec![],
            packing_group: pg,
            synonyms: vec![],
            segregation_groups: vec![],
        }
    }

    fn cand(id: &str, page: usize, line: usize, keyword: &str, un: &str, conf: f64) -> MatchCandidate {
        MatchCandidate {
            id: id.into(),
            segment_id: format!("seg_{}_{}", page, line),
            page,
            line_index: line,
            byte_range: 0..5,
            matched_text: keyword.into(),
            keyword: keyword.into(),
            catalog_entry: entry(un, Some(PackingGroup::II)),
            confidence: conf,
            source: MatchSource::Automatic,
            match_kind: MatchKind::ProperName,
            context: format!("line {} {}", line, keyword),
        }
    }

    #[test]
    fn test_un_and_name_merge_across_lines() {
        let cands = vec![
            cand("a", 1, 0, "un1263", "1263", 1.0),
            cand("b", 1, 1, "paint", "1263", 0.95),
            cand("c", 1, 1, "paint", "3066", 0.95),
        ];
        let clusters = reconcile(&cands, &ReconcileOptions::default());
        assert_eq!(clusters.len(), 1);
        let ids: Vec<&str> = clusters[0].candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(clusters[0].keyword, "un1263");
        assert_eq!(clusters[0].context, "line 0 un1263 | line 1 paint");
    }

    #[test]
    fn test_same_keyword_different_pages_stay_apart() {
        let cands = vec![
            cand("a", 1, 0, "paint", "1263", 0.95),
            cand("b", 2, 0, "paint", "1263", 0.95),
        ];
        let clusters = reconcile(&cands, &ReconcileOptions::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].page, 1);
        assert_eq!(clusters[1].page, 2);
    }

    #[test]
    fn test_line_window_bound() {
        let cands = vec![
            cand("a", 1, 0, "paint", "1263", 0.95),
            cand("b", 1, 6, "paint", "1263", 0.95),
        ];
        assert_eq!(reconcile(&cands, &ReconcileOptions::default()).len(), 2);
        let wide = ReconcileOptions { line_window: 6 };
        assert_eq!(reconcile(&cands, &wide).len(), 1);
    }

    #[test]
    fn test_tie_breaks() {
        let mut manual = cand("m", 1, 0, "paint", "1263", 0.95);
        manual.source = MatchSource::Manual;
        let mut no_pg = cand("n", 1, 0, "paint", "3066", 0.95);
        no_pg.catalog_entry.packing_group = None;
        let auto = cand("z", 1, 0, "paint", "3066", 0.95);

        let clusters = reconcile(&[manual, no_pg, auto], &ReconcileOptions::default());
        let ids: Vec<&str> = clusters[0].candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "n", "m"]);
    }

    #[test]
    fn test_input_order_irrelevant() {
        let cands = vec![
            cand("a", 1, 0, "un1263", "1263", 1.0),
            cand("b", 1, 1, "paint", "1263", 0.95),
            cand("c", 1, 9, "acetone", "1090", 0.95),
            cand("d", 2, 3, "paint", "3066", 0.95),
        ];
        let mut reversed = cands.clone();
        reversed.reverse();
        let opts = ReconcileOptions::default();
        let first = reconcile(&cands, &opts);
        assert_eq!(first, reconcile(&reversed, &opts));
        assert_eq!(first, reconcile(&cands, &opts));
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_empty() {
        assert!(reconcile(&[], &ReconcileOptions::default()).is_empty());
    }
}
