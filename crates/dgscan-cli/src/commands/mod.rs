pub mod catalog;
pub mod compat;
pub mod rules;
pub mod scan;
pub mod validate;

use clap::Args;
use dgscan_core::catalog::{builtin as catalog_builtin, load_catalog, CatalogIndex};
use dgscan_core::compat::{builtin as compat_builtin, load_segregation_table, SegregationTable};
use dgscan_core::error::DgError;
use dgscan_core::extraction::pdftotext::PdftotextExtractor;
use dgscan_core::extraction::xlsx::extract_xlsx_pages;
use dgscan_core::extraction::{PageContent, PdfExtractor};
use dgscan_core::ScanOptions;
use std::path::{Path, PathBuf};

/// Reference data selection shared by several commands.
#[derive(Args, Debug, Clone)]
pub struct ReferenceArgs {
    /// Custom JSON catalog file (overrides --catalog-preset)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Predefined catalog
    #[arg(long, value_name = "NAME", default_value = "adg-core")]
    pub catalog_preset: String,

    /// Custom JSON segregation table (overrides --rules-preset)
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Predefined segregation table
    #[arg(long, value_name = "NAME", default_value = "adg-class")]
    pub rules_preset: String,
}

/// Matcher and reconciler tuning.
#[derive(Args, Debug, Clone)]
pub struct TuningArgs {
    /// JSON options file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Drop candidates below this confidence
    #[arg(long, value_name = "0..1")]
    pub min_confidence: Option<f64>,

    /// Line distance within which matches are clustered
    #[arg(long, value_name = "LINES")]
    pub window: Option<usize>,
}

pub fn load_reference_catalog(args: &ReferenceArgs) -> Result<CatalogIndex, DgError> {
    match &args.catalog {
        Some(path) => load_catalog(path),
        None => catalog_builtin::load_preset(&args.catalog_preset),
    }
}

pub fn load_reference_table(args: &ReferenceArgs) -> Result<SegregationTable, DgError> {
    match &args.rules {
        Some(path) => load_segregation_table(path),
        None => compat_builtin::load_preset(&args.rules_preset),
    }
}

pub fn load_scan_options(args: &TuningArgs) -> Result<ScanOptions, DgError> {
    let mut options = match &args.config {
        Some(path) => dgscan_core::load_options(path)?,
        None => ScanOptions::default(),
    };
    if let Some(min) = args.min_confidence {
        if !(0.0..=1.0).contains(&min) {
            return Err(DgError::MalformedInput(format!(
                "--min-confidence {} outside [0, 1]",
                min
            )));
        }
        options.matcher.min_confidence = min;
    }
    if let Some(window) = args.window {
        options.reconcile.line_window = window;
    }
    Ok(options)
}

/// Read a manifest into pages, choosing the reader by file extension.
pub fn read_document(path: &Path) -> Result<Vec<PageContent>, DgError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => {
            let bytes = std::fs::read(path)?;
            PdftotextExtractor::new().extract_pages(&bytes)
        }
        "xlsx" => {
            let bytes = std::fs::read(path)?;
            extract_xlsx_pages(&bytes)
        }
        _ => {
            let text = std::fs::read_to_string(path)?;
            // Form feeds separate pages, as in pdftotext output.
            Ok(text
                .split('\x0c')
                .enumerate()
                .map(|(i, page)| PageContent {
                    page_number: i + 1,
                    lines: page.lines().map(|l| l.to_string()).collect(),
                })
                .collect())
        }
    }
}
