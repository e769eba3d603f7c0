// ABOUTME: Settle policy for the slide-audit application
// ABOUTME: Waits for fonts, images and dynamic layout to stop changing before measuring or capturing

use crate::errors::{AuditError, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::thread;
use std::time::{Duration, Instant};

/// Snapshot of asynchronous rendering state for a slide or print page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Readiness {
    pub fonts_ready: bool,
    pub images_pending: u32,
    /// Changes whenever box sizes or the number of canvases change
    pub fingerprint: String,
}

impl Readiness {
    pub fn is_idle(&self) -> bool {
        self.fonts_ready && self.images_pending == 0
    }
}

/// How long to wait for a slide to finish rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    /// Fixed pause after activation
    pub settle: Duration,
    /// Upper bound on readiness polling after the fixed pause
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(300),
            timeout: Duration::from_millis(10000),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl SettlePolicy {
    /// Sleep the fixed settle interval, then poll `probe` until the slide is idle
    /// and its fingerprint repeats on two consecutive polls.
    ///
    /// `slide` is only used to label the timeout error.
    pub fn wait<F>(&self, slide: usize, mut probe: F) -> Result<()>
    where
        F: FnMut() -> Result<Readiness>,
    {
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }

        let started = Instant::now();
        let mut previous: Option<Readiness> = None;

        loop {
            let current = probe()?;
            debug!("Slide {} readiness: {:?}", slide, current);

            if current.is_idle() && previous.as_ref() == Some(&current) {
                return Ok(());
            }

            if started.elapsed() >= self.timeout {
                let waited_ms = (self.settle + started.elapsed()).as_millis() as u64;
                warn!("Slide {} still rendering after {}ms", slide, waited_ms);
                return Err(AuditError::RenderTimeout { slide, waited_ms });
            }

            previous = Some(current);
            thread::sleep(self.poll_interval);
        }
    }
}

/// Readiness probe for the current slide, or for print page `page` when set.
///
/// Returns a JSON string matching [`Readiness`].
pub fn readiness_script(page: Option<usize>) -> String {
    let target = match page {
        Some(i) => format!("document.querySelectorAll('.pdf-page')[{}]", i),
        None => "Reveal.getCurrentSlide()".to_string(),
    };

    format!(
        r#"
(() => {{
    const root = {target};
    if (!root) {{
        return JSON.stringify({{ fonts_ready: false, images_pending: 0, fingerprint: 'missing' }});
    }}
    const pending = Array.from(root.querySelectorAll('img')).filter(img => !img.complete).length;
    let boxes = 0;
    for (const el of root.querySelectorAll('*')) {{
        boxes = (boxes * 31 + el.offsetWidth * 7 + el.offsetHeight) | 0;
    }}
    const canvases = root.querySelectorAll('canvas').length;
    return JSON.stringify({{
        fonts_ready: document.fonts ? document.fonts.status === 'loaded' : true,
        images_pending: pending,
        fingerprint: canvases + '|' + root.scrollWidth + 'x' + root.scrollHeight + '|' + boxes
    }});
}})()
"#
    )
}
