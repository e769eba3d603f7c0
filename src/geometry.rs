// ABOUTME: Geometry prober for the slide-audit application
// ABOUTME: Measures rendered slide content and computes per-axis overflow against the canvas

use crate::deck::Canvas;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Excess smaller than this is layout rounding, not overflow
pub const SUBPIXEL_TOLERANCE: f64 = 0.5;

/// Runs in the page against the current slide's `<section>`.
///
/// Walks the section's descendants, text nodes included, and returns, as a
/// JSON string, the extent of laid-out content relative to the section's
/// top-left corner in unscaled CSS pixels. Elements hidden with
/// `visibility: hidden` still occupy layout and are measured. Decorative
/// layers and the inside of clipping or scrolling containers are skipped.
pub const PROBE_SCRIPT: &str = r#"
(() => {
    const section = Reveal.getCurrentSlide();
    if (!section) { return JSON.stringify(null); }

    const root = section.getBoundingClientRect();
    const scaleX = section.offsetWidth ? root.width / section.offsetWidth : 1;
    const scaleY = section.offsetHeight ? root.height / section.offsetHeight : 1;

    const isDecorative = (el, style) => {
        if (el.getAttribute('data-overflow') === 'ignore') return true;
        if (el.getAttribute('aria-hidden') === 'true') return true;
        if (style.display === 'none') return true;
        const media = ['IMG', 'VIDEO', 'CANVAS'].includes(el.tagName);
        const detached = style.position === 'absolute' || style.position === 'fixed';
        return media && detached && style.objectFit === 'cover';
    };
    const clips = (style) => ['auto', 'scroll', 'hidden', 'clip']
        .some(v => style.overflowX === v || style.overflowY === v);

    let right = 0;
    let bottom = 0;
    const extend = (rect) => {
        if (rect.width > 0 || rect.height > 0) {
            right = Math.max(right, (rect.right - root.left) / scaleX);
            bottom = Math.max(bottom, (rect.bottom - root.top) / scaleY);
        }
    };
    const visit = (el) => {
        for (const node of el.childNodes) {
            if (node.nodeType === Node.TEXT_NODE) {
                if (!node.textContent.trim()) continue;
                const range = document.createRange();
                range.selectNodeContents(node);
                extend(range.getBoundingClientRect());
                continue;
            }
            if (node.nodeType !== Node.ELEMENT_NODE) continue;
            const style = getComputedStyle(node);
            if (isDecorative(node, style)) continue;
            extend(node.getBoundingClientRect());
            if (!clips(style)) visit(node);
        }
    };
    visit(section);

    const own = getComputedStyle(section);
    right += parseFloat(own.paddingRight) || 0;
    bottom += parseFloat(own.paddingBottom) || 0;

    let label = '';
    let before = section.previousSibling;
    while (before && before.nodeType === Node.TEXT_NODE && !before.textContent.trim()) {
        before = before.previousSibling;
    }
    if (before && before.nodeType === Node.COMMENT_NODE) {
        label = before.textContent.trim();
    }

    return JSON.stringify({
        content_width: right,
        content_height: bottom,
        label: label,
        slide_id: section.getAttribute('data-slide-id') || ''
    });
})()
"#;

/// Raw result of running the probe on one slide
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeMeasurement {
    pub content_width: f64,
    pub content_height: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub slide_id: String,
}

impl ProbeMeasurement {
    pub fn new(content_width: f64, content_height: f64) -> Self {
        Self {
            content_width,
            content_height,
            label: String::new(),
            slide_id: String::new(),
        }
    }
}

/// Which axes a slide overflows on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    None,
    Horizontal,
    Vertical,
    Both,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::None => "none",
            Axis::Horizontal => "horizontal",
            Axis::Vertical => "vertical",
            Axis::Both => "both",
        };
        f.write_str(name)
    }
}

/// Per-axis overflow in CSS pixels, zero when content fits
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Overflow {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Overflow {
    /// Compare a measurement against the fixed canvas, each axis independently
    pub fn measure(measurement: &ProbeMeasurement, canvas: Canvas) -> Self {
        Self {
            horizontal: excess(measurement.content_width, canvas.width),
            vertical: excess(measurement.content_height, canvas.height),
        }
    }

    pub fn axis(&self) -> Axis {
        match (self.horizontal > 0.0, self.vertical > 0.0) {
            (false, false) => Axis::None,
            (true, false) => Axis::Horizontal,
            (false, true) => Axis::Vertical,
            (true, true) => Axis::Both,
        }
    }

    pub fn is_overflowing(&self) -> bool {
        self.axis() != Axis::None
    }

    /// Largest overflow across both axes
    pub fn magnitude(&self) -> f64 {
        self.horizontal.max(self.vertical)
    }
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.axis() {
            Axis::None => write!(f, "fits"),
            Axis::Horizontal => write!(f, "{}px horizontal", format_px(self.horizontal)),
            Axis::Vertical => write!(f, "{}px vertical", format_px(self.vertical)),
            Axis::Both => write!(
                f,
                "{}px horizontal, {}px vertical",
                format_px(self.horizontal),
                format_px(self.vertical)
            ),
        }
    }
}

fn excess(extent: f64, visible: u32) -> f64 {
    if !extent.is_finite() {
        return 0.0;
    }
    let over = extent - f64::from(visible);
    if over < SUBPIXEL_TOLERANCE {
        0.0
    } else {
        (over * 10.0).round() / 10.0
    }
}

/// Format pixels without a trailing `.0` for whole values
pub fn format_px(px: f64) -> String {
    if px.fract() == 0.0 {
        format!("{}", px as i64)
    } else {
        format!("{:.1}", px)
    }
}
