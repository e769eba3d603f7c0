// ABOUTME: Browser automation module for the slide-audit application
// ABOUTME: Defines the deck page capability and drives it with a headless Chrome instance

use crate::deck::{Canvas, DeckOutline, SlidePosition};
use crate::errors::{AuditError, Result};
use crate::geometry::{ProbeMeasurement, PROBE_SCRIPT};
use crate::settle::{readiness_script, Readiness};
use headless_chrome::protocol::cdp::Page;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use url::Url;

/// CSS pixels per inch, used to size PDF pages
const CSS_PX_PER_INCH: f64 = 96.0;

/// What the audit and export pipelines need from a loaded deck.
///
/// Implementations own exactly one document. Slide activation mutates the
/// document's viewport state, so callers walk slides one at a time.
pub trait DeckPage {
    /// Canvas size and slide groups in navigation order
    fn outline(&self) -> Result<DeckOutline>;

    /// Turn off transitions and on-screen controls before capturing
    fn prepare_capture(&self) -> Result<()>;

    /// Make `position` the current slide
    fn activate(&self, position: SlidePosition) -> Result<()>;

    /// Rendering state of the current slide, or of print page `page`
    fn readiness(&self, page: Option<usize>) -> Result<Readiness>;

    /// Measure the current slide's content
    fn probe(&self) -> Result<ProbeMeasurement>;

    /// PNG of the canvas region at `scale` device pixels per CSS pixel
    fn capture(&self, canvas: Canvas, scale: u32) -> Result<Vec<u8>>;

    /// Number of pages laid out in print mode
    fn page_count(&self) -> Result<usize>;

    /// Scroll print page `page` into view so lazily rendered content starts
    fn reveal_page(&self, page: usize) -> Result<()>;

    /// Print the whole document, one canvas-sized page per slide
    fn print_pdf(&self, canvas: Canvas) -> Result<Vec<u8>>;
}

/// Configuration for launching the headless browser
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub browser_path: Option<String>,
    /// Initial window size; reset to the deck's canvas once it is known
    pub window: Canvas,
    pub load_timeout_ms: u64,
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser_path: None,
            window: Canvas::default(),
            load_timeout_ms: 30000, // 30 seconds
            sandbox: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OutlineProbe {
    width: Option<f64>,
    height: Option<f64>,
    groups: Vec<usize>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Indices {
    h: usize,
    v: usize,
}

// Counts leaf sections from the DOM rather than the runtime's index so the
// same script works after print mode has moved slides into page wrappers.
const OUTLINE_SCRIPT: &str = r#"
(() => {
    const config = Reveal.getConfig();
    const size = (value) => {
        const n = Number(value);
        return Number.isFinite(n) && n > 0 ? n : null;
    };
    const leaves = Array.from(document.querySelectorAll('.reveal .slides section'))
        .filter(s => !s.classList.contains('stack') && !s.querySelector('section'));
    const groups = [];
    let current = null;
    for (const leaf of leaves) {
        let top = leaf;
        while (top.parentElement && top.parentElement.closest('section')) {
            top = top.parentElement.closest('section');
        }
        if (top === current) {
            groups[groups.length - 1] += 1;
        } else {
            groups.push(1);
            current = top;
        }
    }
    return JSON.stringify({ width: size(config.width), height: size(config.height), groups });
})()
"#;

const READY_SCRIPT: &str =
    "typeof Reveal !== 'undefined' && typeof Reveal.isReady === 'function' && Reveal.isReady()";

const CAPTURE_SETUP_SCRIPT: &str = "Reveal.configure({ transition: 'none', backgroundTransition: 'none', controls: false, progress: false }); true";

/// A deck loaded in its own headless Chrome instance.
///
/// The browser process lives exactly as long as this value.
pub struct ChromeDeck {
    tab: Arc<Tab>,
    url: String,
    // Fields drop in order, so the Chrome process goes after its tab
    _browser: Browser,
}

impl ChromeDeck {
    /// Launch a browser and load the deck at `url`.
    ///
    /// Fails with [`AuditError::LoadFailure`] when the document cannot be
    /// navigated to or its slide runtime never becomes ready.
    pub fn open(url: &Url, config: &BrowserConfig) -> Result<Self> {
        let deck = Self::launch(url, config)?;

        // Slides render at the deck's own canvas; match the viewport to it
        let canvas = deck.outline()?.canvas;
        if canvas != config.window {
            info!(
                "Deck canvas is {}, relaunching with a matching window",
                canvas
            );
            drop(deck);
            let resized = BrowserConfig {
                window: canvas,
                ..config.clone()
            };
            return Self::launch(url, &resized);
        }

        Ok(deck)
    }

    fn launch(url: &Url, config: &BrowserConfig) -> Result<Self> {
        let mut launch_options_builder = LaunchOptionsBuilder::default();

        launch_options_builder.window_size(Some((config.window.width, config.window.height)));
        launch_options_builder.headless(true);
        launch_options_builder.sandbox(config.sandbox);
        launch_options_builder
            .idle_browser_timeout(Duration::from_millis(config.load_timeout_ms.max(60000)));

        if let Some(browser_path) = &config.browser_path {
            launch_options_builder.path(Some(browser_path.into()));
        }

        let launch_options = launch_options_builder
            .build()
            .map_err(|e| AuditError::BrowserError {
                message: format!("Failed to build browser options: {:?}", e),
                source: None,
            })?;

        info!("Launching headless browser");
        let browser = Browser::new(launch_options)
            .map_err(|e| AuditError::browser("Failed to launch browser", e))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AuditError::browser("Failed to create new tab", e))?;
        tab.set_default_timeout(Duration::from_millis(config.load_timeout_ms));

        info!("Opening deck at URL: {}", url);
        tab.navigate_to(url.as_str())
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| AuditError::LoadFailure(format!("navigation to {} failed: {}", url, e)))?;

        tab.wait_for_element("body")
            .map_err(|e| AuditError::LoadFailure(format!("document has no body: {}", e)))?;

        let deck = Self {
            _browser: browser,
            tab,
            url: url.to_string(),
        };
        deck.wait_until_ready(Duration::from_millis(config.load_timeout_ms))?;
        Ok(deck)
    }

    /// Poll the slide runtime until it reports ready
    fn wait_until_ready(&self, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            let ready = self
                .tab
                .evaluate(READY_SCRIPT, false)
                .ok()
                .and_then(|result| result.value)
                .and_then(|value| value.as_bool())
                .unwrap_or(false);

            if ready {
                info!(
                    "Deck ready after {:.2} seconds",
                    started.elapsed().as_secs_f64()
                );
                return Ok(());
            }

            if started.elapsed() >= timeout {
                return Err(AuditError::LoadFailure(format!(
                    "slide runtime at {} did not initialise within {}ms",
                    self.url,
                    timeout.as_millis()
                )));
            }
            thread::sleep(Duration::from_millis(100));
        }
    }

    fn run(&self, script: &str) -> Result<Option<serde_json::Value>> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| AuditError::browser("Script evaluation failed", e))?;
        Ok(result.value)
    }

    /// Evaluate a script that returns `JSON.stringify(...)` and decode it
    fn run_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        match self.run(script)? {
            Some(serde_json::Value::String(json)) => Ok(serde_json::from_str(&json)?),
            other => Err(AuditError::BrowserError {
                message: format!("script returned {:?} instead of JSON", other),
                source: None,
            }),
        }
    }
}

impl DeckPage for ChromeDeck {
    fn outline(&self) -> Result<DeckOutline> {
        let probe: OutlineProbe = self.run_json(OUTLINE_SCRIPT)?;
        let default = Canvas::default();
        let canvas = Canvas::new(
            probe.width.map(|w| w.round() as u32).unwrap_or(default.width),
            probe.height.map(|h| h.round() as u32).unwrap_or(default.height),
        );
        debug!("Deck outline: canvas {}, groups {:?}", canvas, probe.groups);
        Ok(DeckOutline::new(canvas, probe.groups))
    }

    fn prepare_capture(&self) -> Result<()> {
        self.run(CAPTURE_SETUP_SCRIPT)?;
        Ok(())
    }

    fn activate(&self, position: SlidePosition) -> Result<()> {
        // Show every fragment so the slide is measured and captured fully built
        let script = format!(
            "Reveal.slide({}, {}, Number.MAX_SAFE_INTEGER); JSON.stringify(Reveal.getIndices())",
            position.h, position.v
        );
        let indices: Indices = self.run_json(&script)?;
        if indices != (Indices { h: position.h, v: position.v }) {
            warn!("Slide {} did not become current: {:?}", position, indices);
            return Err(AuditError::BrowserError {
                message: format!(
                    "navigation to slide {} landed on [{},{}]",
                    position, indices.h, indices.v
                ),
                source: None,
            });
        }
        Ok(())
    }

    fn readiness(&self, page: Option<usize>) -> Result<Readiness> {
        self.run_json(&readiness_script(page))
    }

    fn probe(&self) -> Result<ProbeMeasurement> {
        let measurement: Option<ProbeMeasurement> = self.run_json(PROBE_SCRIPT)?;
        measurement.ok_or_else(|| AuditError::BrowserError {
            message: "no current slide to measure".to_string(),
            source: None,
        })
    }

    fn capture(&self, canvas: Canvas, scale: u32) -> Result<Vec<u8>> {
        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: f64::from(canvas.width),
            height: f64::from(canvas.height),
            scale: f64::from(scale),
        };
        self.tab
            .capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                Some(clip),
                true,
            )
            .map_err(|e| AuditError::CaptureError(format!("screenshot failed: {}", e)))
    }

    fn page_count(&self) -> Result<usize> {
        let count = self
            .run("document.querySelectorAll('.pdf-page').length")?
            .and_then(|value| value.as_u64())
            .unwrap_or(0);
        Ok(count as usize)
    }

    fn reveal_page(&self, page: usize) -> Result<()> {
        let script = format!(
            "(() => {{ const p = document.querySelectorAll('.pdf-page')[{}]; if (p) p.scrollIntoView(); return !!p; }})()",
            page
        );
        match self.run(&script)?.and_then(|value| value.as_bool()) {
            Some(true) => Ok(()),
            _ => Err(AuditError::PaginationError(format!(
                "print page {} does not exist",
                page + 1
            ))),
        }
    }

    fn print_pdf(&self, canvas: Canvas) -> Result<Vec<u8>> {
        let options = PrintToPdfOptions {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            paper_width: Some(f64::from(canvas.width) / CSS_PX_PER_INCH),
            paper_height: Some(f64::from(canvas.height) / CSS_PX_PER_INCH),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            margin_right: Some(0.0),
            ..Default::default()
        };
        self.tab
            .print_to_pdf(Some(options))
            .map_err(|e| AuditError::CaptureError(format!("printing to PDF failed: {}", e)))
    }
}
