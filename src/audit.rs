// ABOUTME: Overflow auditor for the slide-audit application
// ABOUTME: Walks every slide in navigation order, measures it and builds a pass/fail report

use crate::browser::DeckPage;
use crate::deck::{Canvas, SlidePosition};
use crate::errors::{AuditError, Result, EXIT_INCOMPLETE};
use crate::geometry::{format_px, Axis, Overflow};
use crate::settle::SettlePolicy;
use log::{info, warn};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Instant;

/// Exit code when at least one slide overflows
pub const EXIT_OVERFLOW: i32 = 1;

/// Configuration for an audit run
#[derive(Debug, Clone, Default)]
pub struct AuditConfig {
    pub settle: SettlePolicy,
}

/// Outcome for one slide
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SlideStatus {
    Clean,
    Overflow { axis: Axis, overflow: Overflow },
    /// Content never settled, so the slide was not measured
    Timeout { waited_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideReport {
    #[serde(flatten)]
    pub position: SlidePosition,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub slide_id: String,
    #[serde(flatten)]
    pub status: SlideStatus,
}

impl SlideReport {
    fn describe(&self) -> String {
        let mut text = format!("Slide {}", self.position);
        if !self.label.is_empty() {
            let _ = write!(text, " ({})", self.label);
        } else if !self.slide_id.is_empty() {
            let _ = write!(text, " ({})", self.slide_id);
        }
        text
    }
}

/// Result of auditing one deck
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverflowReport {
    pub canvas: Canvas,
    pub entries: Vec<SlideReport>,
}

impl OverflowReport {
    pub fn overflowing(&self) -> impl Iterator<Item = &SlideReport> {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, SlideStatus::Overflow { .. }))
    }

    pub fn timed_out(&self) -> impl Iterator<Item = &SlideReport> {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, SlideStatus::Timeout { .. }))
    }

    pub fn passed(&self) -> bool {
        self.overflowing().next().is_none() && self.timed_out().next().is_none()
    }

    /// 0 when every slide fits, 1 on any overflow, 3 when slides went unmeasured
    pub fn exit_status(&self) -> i32 {
        if self.overflowing().next().is_some() {
            EXIT_OVERFLOW
        } else if self.timed_out().next().is_some() {
            EXIT_INCOMPLETE
        } else {
            0
        }
    }

    /// Human-readable report, one line per slide followed by a summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let status = match &entry.status {
                SlideStatus::Clean => "OK".to_string(),
                SlideStatus::Overflow { overflow, .. } => format!("OVERFLOW by {}", overflow),
                SlideStatus::Timeout { waited_ms } => {
                    format!("TIMEOUT after {}ms, not measured", waited_ms)
                }
            };
            let _ = writeln!(out, "  {}: {}", entry.describe(), status);
        }
        out.push('\n');

        let overflowing: Vec<&SlideReport> = self.overflowing().collect();
        let timed_out: Vec<&SlideReport> = self.timed_out().collect();

        if !overflowing.is_empty() {
            let _ = writeln!(out, "FAILED: {} slide(s) have overflow:", overflowing.len());
            for entry in &overflowing {
                if let SlideStatus::Overflow { axis, overflow } = &entry.status {
                    let _ = writeln!(
                        out,
                        "  Slide {}: {}px overflow ({})",
                        entry.position,
                        format_px(overflow.magnitude()),
                        axis
                    );
                }
            }
        }
        if !timed_out.is_empty() {
            let heading = if overflowing.is_empty() {
                "INCOMPLETE"
            } else {
                "Also"
            };
            let _ = writeln!(
                out,
                "{}: {} slide(s) did not finish rendering:",
                heading,
                timed_out.len()
            );
            for entry in &timed_out {
                let _ = writeln!(out, "  Slide {}", entry.position);
            }
        }
        if overflowing.is_empty() && timed_out.is_empty() {
            let _ = writeln!(
                out,
                "PASSED: All {} slides fit within {}.",
                self.entries.len(),
                self.canvas
            );
        }
        out
    }

    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Measure every slide of a loaded deck.
///
/// Load and navigation failures abort the run. A slide that does not settle
/// is recorded as a timeout and the walk continues with the next slide.
pub fn audit_deck(deck: &dyn DeckPage, config: &AuditConfig) -> Result<OverflowReport> {
    let outline = deck.outline()?;
    outline.ensure_not_empty()?;

    let positions = outline.positions();
    info!(
        "Checking {} slides against a {} canvas",
        positions.len(),
        outline.canvas
    );

    let start_time = Instant::now();
    let mut entries = Vec::with_capacity(positions.len());

    for position in positions {
        deck.activate(position)?;

        let settled = config
            .settle
            .wait(position.index, || deck.readiness(None));
        let entry = match settled {
            Ok(()) => {
                let measurement = deck.probe()?;
                let overflow = Overflow::measure(&measurement, outline.canvas);
                let status = if overflow.is_overflowing() {
                    warn!("Slide {} overflows by {}", position, overflow);
                    SlideStatus::Overflow {
                        axis: overflow.axis(),
                        overflow,
                    }
                } else {
                    SlideStatus::Clean
                };
                SlideReport {
                    position,
                    label: measurement.label,
                    slide_id: measurement.slide_id,
                    status,
                }
            }
            Err(AuditError::RenderTimeout { waited_ms, .. }) => SlideReport {
                position,
                label: String::new(),
                slide_id: String::new(),
                status: SlideStatus::Timeout { waited_ms },
            },
            Err(e) => return Err(e),
        };
        entries.push(entry);
    }

    info!(
        "Audit complete in {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    Ok(OverflowReport {
        canvas: outline.canvas,
        entries,
    })
}
