use dgscan_core::compat::{CompatibilityVerdict, Conflict, Severity};
use dgscan_core::matching::{
    regulatory_flags, KeywordCluster, LineItemDetails, RegulatoryFlag, UnmatchedEntry,
};
use dgscan_core::session::{Blocker, ValidationSession};
use dgscan_core::ScanReport;

pub fn print_scan(report: &ScanReport) {
    println!("=== {} ===\n", report.catalog);

    if report.clusters.is_empty() {
        println!("  No dangerous goods detected in {} line(s).\n", report.segments);
    } else {
        println!(
            "  {} keyword(s), {} candidate(s) in {} line(s)\n",
            report.clusters.len(),
            report.candidates.len(),
            report.segments
        );
        for cluster in &report.clusters {
            print_cluster(cluster);
        }
    }

    print_flags(&report.flags);
    print_unmatched(&report.unmatched);
}

fn print_cluster(cluster: &KeywordCluster) {
    println!(
        "  p{} l{}  '{}'  {}",
        cluster.page,
        cluster.line_index + 1,
        cluster.keyword,
        details_summary(&cluster.details)
    );
    for (rank, cand) in cluster.candidates.iter().enumerate() {
        let marker = if rank == 0 { "*" } else { " " };
        let entry = &cand.catalog_entry;
        println!(
            "    {} {:<22} {:<40} class {:<4} {:>4.0}%  {:?}",
            marker,
            cand.id,
            entry.label(),
            entry.hazard_class.code(),
            cand.confidence * 100.0,
            cand.match_kind
        );
    }
    println!("      \"{}\"", cluster.context);
    println!();
}

fn details_summary(details: &LineItemDetails) -> String {
    let mut parts = Vec::new();
    if let Some(q) = &details.quantity {
        parts.push(format!("{} {}", q.amount, q.unit));
    }
    if let Some(p) = &details.packaging {
        parts.push(p.clone());
    }
    if let Some(pg) = details.stated_packing_group {
        parts.push(format!("PG {}", pg));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}]", parts.join(", "))
    }
}

fn print_flags(flags: &[RegulatoryFlag]) {
    if flags.is_empty() {
        return;
    }
    println!("  Regulatory flags:");
    for flag in flags {
        println!("    ! {}", flag);
    }
    println!();
}

fn print_unmatched(unmatched: &[UnmatchedEntry]) {
    if unmatched.is_empty() {
        return;
    }
    println!("  Lines that look like dangerous goods but matched nothing:");
    for entry in unmatched {
        println!(
            "    p{} l{} ({}): {}",
            entry.page,
            entry.line_index + 1,
            entry.indicator,
            entry.text.trim()
        );
    }
    println!();
}

pub fn print_verdict(verdict: &CompatibilityVerdict) {
    if verdict.compliant {
        println!("  Compatibility: OK");
    } else {
        println!("  Compatibility: NOT COMPLIANT");
    }

    if verdict.conflicts.is_empty() {
        println!("  No segregation requirements apply.\n");
        return;
    }
    println!();
    for conflict in &verdict.conflicts {
        print_conflict(conflict);
    }
    println!();
}

fn print_conflict(conflict: &Conflict) {
    let label = match conflict.severity {
        Severity::Error => "ERROR",
        Severity::Warning => "warn ",
    };
    println!(
        "    {}  UN{} / UN{}  {}",
        label, conflict.item_a, conflict.item_b, conflict.rule
    );
    if let Some(note) = &conflict.note {
        println!("           {}", note);
    }
}

pub fn print_validation(
    session: &ValidationSession,
    verdict: &CompatibilityVerdict,
    blockers: &[Blocker],
    warnings: &[String],
) {
    for cluster in session.clusters() {
        print_cluster(cluster);
    }
    print_flags(&regulatory_flags(session.clusters()));
    print_unmatched(session.unmatched());

    let confirmed = session.confirmed_set();
    if confirmed.is_empty() {
        match session.acknowledgment() {
            Some(ack) => println!(
                "  Acknowledged as carrying no dangerous goods by {} at {}\n",
                ack.acknowledged_by,
                ack.acknowledged_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("  Nothing confirmed.\n"),
        }
    } else {
        println!("  Confirmed:");
        for record in &confirmed {
            println!(
                "    {:<22} {}  (by {})",
                record.candidate_id, record.description, record.confirmed_by
            );
        }
        println!();
    }

    print_verdict(verdict);

    if !warnings.is_empty() {
        println!("  Warnings:");
        for w in warnings {
            println!("    - {}", w);
        }
        println!();
    }
    if !blockers.is_empty() {
        println!("  Blocked:");
        for b in blockers {
            println!("    - {}", b);
        }
        println!();
    }

    println!("  Session state: {}", session.state());
}
