// ABOUTME: Configuration module for the slide-audit application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::audit::AuditConfig;
use crate::browser::BrowserConfig;
use crate::pdf::PdfConfig;
use crate::raster::RasterConfig;
use crate::selector::SlideSelector;
use crate::settle::SettlePolicy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_SETTLE_MS: u64 = 300;
const DEFAULT_TIMEOUT_MS: u64 = 10000;
const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30000;
const DEFAULT_SCALE: u32 = 4;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub browser_path: Option<String>,
    /// Fixed wait after activating a slide
    pub settle_ms: u64,
    /// Readiness polling bound per slide or page
    pub timeout_ms: u64,
    /// Bound on document load and runtime initialisation
    pub load_timeout_ms: u64,
    pub scale: u32,
    /// Run Chrome with its sandbox; containers running as root need it off
    pub sandbox: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_path: None,
            settle_ms: DEFAULT_SETTLE_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            load_timeout_ms: DEFAULT_LOAD_TIMEOUT_MS,
            scale: DEFAULT_SCALE,
            sandbox: true,
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let browser_path = env::var("BROWSER_PATH").ok().filter(|p| !p.is_empty());

        Self {
            browser_path,
            settle_ms: env_number("SLIDE_AUDIT_SETTLE_MS").unwrap_or(DEFAULT_SETTLE_MS),
            timeout_ms: env_number("SLIDE_AUDIT_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS),
            load_timeout_ms: env_number("SLIDE_AUDIT_LOAD_TIMEOUT_MS")
                .unwrap_or(DEFAULT_LOAD_TIMEOUT_MS),
            scale: env_number("SLIDE_AUDIT_SCALE").unwrap_or(DEFAULT_SCALE),
            sandbox: env::var("SLIDE_AUDIT_NO_SANDBOX")
                .map(|s| s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }

    /// Settle policy shared by every command
    pub fn get_settle_policy(&self) -> SettlePolicy {
        SettlePolicy {
            settle: Duration::from_millis(self.settle_ms),
            timeout: Duration::from_millis(self.timeout_ms),
            ..SettlePolicy::default()
        }
    }

    pub fn get_browser_config(&self) -> BrowserConfig {
        BrowserConfig {
            browser_path: self.browser_path.clone(),
            load_timeout_ms: self.load_timeout_ms,
            sandbox: self.sandbox,
            ..BrowserConfig::default()
        }
    }

    pub fn get_audit_config(&self) -> AuditConfig {
        AuditConfig {
            settle: self.get_settle_policy(),
        }
    }

    /// Get a raster configuration with defaults from this config
    pub fn get_raster_config(
        &self,
        output_dir: PathBuf,
        selector: Option<SlideSelector>,
        scale: Option<u32>,
    ) -> RasterConfig {
        RasterConfig {
            output_dir,
            selector,
            scale: scale.unwrap_or(self.scale),
            settle: self.get_settle_policy(),
        }
    }

    pub fn get_pdf_config(&self, output_path: PathBuf) -> PdfConfig {
        PdfConfig {
            output_path,
            settle: self.get_settle_policy(),
        }
    }
}

fn env_number<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| parse_number(&s))
}

/// Parse a numeric setting; values that do not fit the target type are ignored
pub(crate) fn parse_number<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}
