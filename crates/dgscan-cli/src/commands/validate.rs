use dgscan_core::audit::build_audit_bundle;
use dgscan_core::error::DgError;
use dgscan_core::extraction::pages_to_text;
use dgscan_core::session::{SessionState, ValidationSession};
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::{
    load_reference_catalog, load_reference_table, load_scan_options, read_document, ReferenceArgs,
    TuningArgs,
};
use crate::output;

pub struct ValidateArgs {
    pub input_file: PathBuf,
    pub reference: ReferenceArgs,
    pub tuning: TuningArgs,
    pub confirm: Vec<String>,
    pub reject: Vec<String>,
    pub accept_top: bool,
    pub no_dg: bool,
    pub user: String,
    pub audit: Option<PathBuf>,
    pub output: String,
}

/// Returns whether the manifest was finalized.
pub fn run(args: ValidateArgs) -> Result<bool, DgError> {
    let catalog = Arc::new(load_reference_catalog(&args.reference)?);
    let table = Arc::new(load_reference_table(&args.reference)?);
    let options = load_scan_options(&args.tuning)?;

    let pages = read_document(&args.input_file)?;
    let (text, boundaries) = pages_to_text(&pages);

    let mut session = ValidationSession::new(catalog, table, options);
    session.run(&text, &boundaries)?;

    let mut to_confirm: Vec<String> = Vec::new();
    if args.accept_top {
        to_confirm.extend(session.clusters().iter().map(|c| c.top().id.clone()));
    }
    to_confirm.extend(args.confirm.iter().cloned());

    // A stale id fails that single decision, not the session.
    for id in &to_confirm {
        if let Err(e) = session.confirm(id, &args.user) {
            report_rejected_decision(id, &e);
        }
    }
    for id in &args.reject {
        if let Err(e) = session.reject(id, &args.user) {
            report_rejected_decision(id, &e);
        }
    }
    if args.no_dg {
        session.acknowledge_no_dangerous_goods(&args.user)?;
    }

    let verdict = session.check_compatibility()?;
    let blockers = session.blockers();
    let warnings = session.warnings();

    if let Some(path) = &args.audit {
        let bundle = build_audit_bundle(&session);
        std::fs::write(path, serde_json::to_string_pretty(&bundle)?)?;
    }

    let finalized = if session.state() == SessionState::Finalizable {
        Some(session.finalize()?)
    } else {
        None
    };

    match args.output.as_str() {
        "json" => output::json::print(&serde_json::json!({
            "state": session.state(),
            "clusters": session.clusters(),
            "confirmed": session.confirmed_set(),
            "verdict": &verdict,
            "blockers": blockers,
            "warnings": warnings,
            "finalized": &finalized,
        }))?,
        _ => output::table::print_validation(&session, &verdict, &blockers, &warnings),
    }

    Ok(finalized.is_some())
}

fn report_rejected_decision(id: &str, e: &DgError) {
    eprintln!("Warning: {} ({}): {}", e.user_message(), id, e);
}
