// ABOUTME: Library module for the slide-audit program.
// ABOUTME: Contains the overflow auditor, slide rasterizer and PDF exporter for HTML decks.

// Reexport modules
pub mod audit;
pub mod browser;
pub mod config;
pub mod deck;
pub mod errors;
pub mod geometry;
pub mod pdf;
pub mod raster;
pub mod selector;
pub mod settle;
pub mod utils;

// Reexport common types and functions
pub use audit::{audit_deck, AuditConfig, OverflowReport, SlideReport, SlideStatus};
pub use browser::{BrowserConfig, ChromeDeck, DeckPage};
pub use config::Config;
pub use deck::{Canvas, DeckOutline, DeckSource, SlidePosition};
pub use errors::{AuditError, Result};
pub use geometry::{Axis, Overflow, ProbeMeasurement};
pub use pdf::{export_pdf, PdfConfig};
pub use raster::{export_slides, RasterConfig, RasterSummary};
pub use selector::SlideSelector;
pub use settle::{Readiness, SettlePolicy};
