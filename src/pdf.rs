// ABOUTME: Pagination exporter for the slide-audit application
// ABOUTME: Prints a deck opened in print mode to a single PDF, one page per slide

use crate::browser::DeckPage;
use crate::errors::{AuditError, Result};
use crate::settle::SettlePolicy;
use crate::utils;
use log::info;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Configuration for PDF export
#[derive(Debug, Clone)]
pub struct PdfConfig {
    pub output_path: PathBuf,
    pub settle: SettlePolicy,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("deck.pdf"),
            settle: SettlePolicy::default(),
        }
    }
}

/// Export a deck that was loaded through its print URL.
///
/// Every print page is brought into view and must settle on its own before
/// anything is written. A page that never settles aborts the export, so the
/// output file only ever holds a complete deck.
pub fn export_pdf(deck: &dyn DeckPage, config: &PdfConfig) -> Result<PathBuf> {
    let outline = deck.outline()?;
    outline.ensure_not_empty()?;

    let slide_count = outline.slide_count();
    let page_count = deck.page_count()?;
    if page_count != slide_count {
        return Err(AuditError::PaginationError(format!(
            "print layout has {} page(s) but the deck has {} slide(s)",
            page_count, slide_count
        )));
    }

    info!(
        "Settling {} print pages at {}",
        page_count, outline.canvas
    );
    let start_time = Instant::now();

    for page in 0..page_count {
        deck.reveal_page(page)?;
        config.settle.wait(page + 1, || deck.readiness(Some(page)))?;
    }

    let pdf = deck.print_pdf(outline.canvas)?;
    if !pdf.starts_with(b"%PDF") {
        return Err(AuditError::CaptureError(
            "browser returned something other than a PDF".to_string(),
        ));
    }

    utils::ensure_parent_directory_exists(&config.output_path)?;
    fs::write(&config.output_path, &pdf)?;

    info!(
        "Exported {} pages to {:?} in {:.2} seconds",
        page_count,
        config.output_path,
        start_time.elapsed().as_secs_f64()
    );

    Ok(config.output_path.clone())
}
