// ABOUTME: Deck model for the slide-audit application
// ABOUTME: Describes canvas size, slide groups, navigation order and document sources

use crate::errors::{AuditError, Result};
use crate::utils;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Fixed pixel size shared by every slide in a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
        }
    }
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel dimensions of a capture of this canvas at the given multiplier
    pub fn scaled(&self, scale: u32) -> (u32, u32) {
        (self.width * scale, self.height * scale)
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A leaf slide's place in the deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidePosition {
    /// 1-based index in navigation order
    pub index: usize,
    /// Horizontal group, 0-based
    pub h: usize,
    /// Position within a vertical stack, 0-based
    pub v: usize,
}

impl fmt::Display for SlidePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{},{}]", self.index, self.h, self.v)
    }
}

/// Structure of a loaded deck as discovered from its rendered DOM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckOutline {
    pub canvas: Canvas,
    /// Number of leaf slides in each horizontal group
    pub groups: Vec<usize>,
}

impl DeckOutline {
    pub fn new(canvas: Canvas, groups: Vec<usize>) -> Self {
        Self { canvas, groups }
    }

    /// All leaf slides, horizontal groups outer and vertical slides inner
    pub fn positions(&self) -> Vec<SlidePosition> {
        let mut positions = Vec::with_capacity(self.slide_count());
        for (h, &depth) in self.groups.iter().enumerate() {
            for v in 0..depth.max(1) {
                positions.push(SlidePosition {
                    index: positions.len() + 1,
                    h,
                    v,
                });
            }
        }
        positions
    }

    pub fn slide_count(&self) -> usize {
        self.groups.iter().map(|&depth| depth.max(1)).sum()
    }

    /// Fail when the document exposes no slides at all
    pub fn ensure_not_empty(&self) -> Result<()> {
        if self.groups.is_empty() {
            return Err(AuditError::LoadFailure("no slides found in deck".to_string()));
        }
        Ok(())
    }
}

/// Where a deck document is loaded from
#[derive(Debug, Clone)]
pub struct DeckSource {
    url: Url,
    path: Option<PathBuf>,
}

impl DeckSource {
    /// Interpret a CLI argument as either a URL or a local file
    pub fn parse(input: &str) -> Result<Self> {
        let is_url = ["http://", "https://", "file://"]
            .iter()
            .any(|scheme| input.starts_with(scheme));

        if is_url {
            let url = Url::parse(input)
                .map_err(|e| AuditError::LoadFailure(format!("invalid URL {}: {}", input, e)))?;
            let path = if url.scheme() == "file" {
                url.to_file_path().ok()
            } else {
                None
            };
            return Ok(Self { url, path });
        }

        Self::from_path(Path::new(input))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        utils::validate_file_exists(path)
            .map_err(|e| AuditError::LoadFailure(e.to_string()))?;
        let absolute = utils::get_absolute_path(path)?;
        let url = Url::from_file_path(&absolute).map_err(|_| {
            AuditError::LoadFailure(format!("cannot build a file URL for {:?}", absolute))
        })?;
        Ok(Self {
            url,
            path: Some(absolute),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Local file backing this source, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// URL that switches the deck into its print layout, one page per slide
    /// however tall the slide's content is
    pub fn print_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut()
            .append_key_only("print-pdf")
            .append_pair("pdfSeparateFragments", "false")
            .append_pair("pdfMaxPagesPerSlide", "1");
        url
    }

    /// Default directory for slide images: `slides/` next to the deck
    pub fn default_slides_dir(&self) -> PathBuf {
        match self.path.as_ref().and_then(|p| p.parent()) {
            Some(parent) => parent.join("slides"),
            None => PathBuf::from("slides"),
        }
    }

    /// Default PDF path: the deck path with a `.pdf` extension
    pub fn default_pdf_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.with_extension("pdf"),
            None => PathBuf::from("deck.pdf"),
        }
    }
}

impl fmt::Display for DeckSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
