// ABOUTME: Slide rasterizer for the slide-audit application
// ABOUTME: Captures selected slides as fixed-size PNG images using a loaded deck page

use crate::browser::DeckPage;
use crate::errors::{AuditError, Result};
use crate::selector::SlideSelector;
use crate::settle::SettlePolicy;
use crate::utils;
use image::io::Reader as ImageReader;
use log::{info, warn};
use std::collections::BTreeSet;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Largest accepted scale multiplier
pub const MAX_SCALE: u32 = 8;

/// Configuration for slide rasterization
#[derive(Debug, Clone)]
pub struct RasterConfig {
    pub output_dir: PathBuf,
    /// Slides to export; every slide when `None`
    pub selector: Option<SlideSelector>,
    /// Device pixels per CSS pixel
    pub scale: u32,
    pub settle: SettlePolicy,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("slides"),
            selector: None,
            scale: 4,
            settle: SettlePolicy::default(),
        }
    }
}

/// What a rasterization run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSummary {
    /// Written images in ascending slide order
    pub written: Vec<PathBuf>,
    /// Slides skipped because their content never settled
    pub timed_out: Vec<usize>,
    /// Pixel size of every written image
    pub pixel_size: (u32, u32),
}

/// File name for slide `index` in a deck of `slide_count` slides
pub fn slide_file_name(index: usize, slide_count: usize) -> String {
    format!("slide-{}.png", utils::zero_pad(index, slide_count))
}

/// Export slides of a loaded deck as PNG files.
///
/// The selector, scale and output directory are all validated before the
/// first capture, so a bad request leaves no partial output behind.
pub fn export_slides(deck: &dyn DeckPage, config: &RasterConfig) -> Result<RasterSummary> {
    if config.scale == 0 || config.scale > MAX_SCALE {
        return Err(AuditError::ValidationError(format!(
            "scale must be between 1 and {}, got {}",
            MAX_SCALE, config.scale
        )));
    }

    let outline = deck.outline()?;
    outline.ensure_not_empty()?;
    let slide_count = outline.slide_count();

    let selected: BTreeSet<usize> = match &config.selector {
        Some(selector) => selector.resolve(slide_count)?,
        None => (1..=slide_count).collect(),
    };

    utils::validate_directory_writable(&config.output_dir)?;

    let canvas = outline.canvas;
    let pixel_size = canvas.scaled(config.scale);
    info!(
        "Rendering {} of {} slides at {}x{}px",
        selected.len(),
        slide_count,
        pixel_size.0,
        pixel_size.1
    );

    deck.prepare_capture()?;

    let start_time = Instant::now();
    let mut written = Vec::with_capacity(selected.len());
    let mut timed_out = Vec::new();

    for position in outline
        .positions()
        .into_iter()
        .filter(|p| selected.contains(&p.index))
    {
        deck.activate(position)?;

        match config
            .settle
            .wait(position.index, || deck.readiness(None))
        {
            Ok(()) => {}
            Err(AuditError::RenderTimeout { slide, waited_ms }) => {
                warn!(
                    "Skipping slide {}: still rendering after {}ms",
                    slide, waited_ms
                );
                timed_out.push(slide);
                continue;
            }
            Err(e) => return Err(e),
        }

        let png = deck.capture(canvas, config.scale)?;
        check_dimensions(&png, pixel_size, position.index)?;

        let output_file = config
            .output_dir
            .join(slide_file_name(position.index, slide_count));
        write_image(&output_file, &png)?;
        info!(
            "Exported {:?} ({}x{}px)",
            output_file, pixel_size.0, pixel_size.1
        );
        written.push(output_file);
    }

    info!(
        "Rendering complete. Captured {} slides in {:.2} seconds",
        written.len(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(RasterSummary {
        written,
        timed_out,
        pixel_size,
    })
}

/// Reject captures whose pixel size is not exactly the scaled canvas
fn check_dimensions(png: &[u8], expected: (u32, u32), slide: usize) -> Result<()> {
    let actual = ImageReader::new(Cursor::new(png))
        .with_guessed_format()
        .map_err(AuditError::FileError)?
        .into_dimensions()?;

    if actual != expected {
        return Err(AuditError::CaptureError(format!(
            "slide {} captured at {}x{}px, expected {}x{}px",
            slide, actual.0, actual.1, expected.0, expected.1
        )));
    }
    Ok(())
}

// Write through a temporary name so an interrupted write never leaves a
// half-written image under the final name
fn write_image(path: &Path, data: &[u8]) -> Result<()> {
    let partial = path.with_extension("png.partial");
    fs::write(&partial, data)?;
    fs::rename(&partial, path)?;
    Ok(())
}

