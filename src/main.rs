// ABOUTME: Main entry point for the slide-audit program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use clap::{Args, Parser, Subcommand};
use slide_audit::errors::EXIT_INCOMPLETE;
use slide_audit::{AuditError, ChromeDeck, Config, DeckSource, SlideSelector};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Chrome/Chromium executable to use
    #[arg(long, global = true)]
    browser: Option<String>,

    /// Fixed wait after activating each slide, in milliseconds
    #[arg(long, global = true)]
    settle_ms: Option<u64>,

    /// How long a slide may keep rendering after the settle wait, in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every slide for content overflow
    Check(CheckArgs),

    /// Export slides as PNG images
    ExportSlides(ExportSlidesArgs),

    /// Export the deck as a PDF, one page per slide
    ExportPdf(ExportPdfArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Path or URL of the deck
    deck: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ExportSlidesArgs {
    /// Path or URL of the deck
    deck: String,

    /// Slides to export, e.g. "1,3,5-7" (default: all)
    #[arg(long)]
    slides: Option<String>,

    /// Output directory (default: slides/ next to the deck)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Device scale factor (default: 4)
    #[arg(long)]
    scale: Option<u32>,
}

#[derive(Args)]
struct ExportPdfArgs {
    /// Path or URL of the deck
    deck: String,

    /// Output PDF path (default: deck name with .pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::from_env();
    if cli.browser.is_some() {
        config.browser_path = cli.browser.clone();
    }
    if let Some(settle_ms) = cli.settle_ms {
        config.settle_ms = settle_ms;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }

    let result = match &cli.command {
        Commands::Check(args) => run_check(args, &config),
        Commands::ExportSlides(args) => run_export_slides(args, &config),
        Commands::ExportPdf(args) => run_export_pdf(args, &config),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run_check(args: &CheckArgs, config: &Config) -> Result<i32, AuditError> {
    let source = DeckSource::parse(&args.deck)?;
    let deck = ChromeDeck::open(source.url(), &config.get_browser_config())?;
    let report = slide_audit::audit_deck(&deck, &config.get_audit_config())?;

    if args.json {
        println!("{}", report.render_json()?);
    } else {
        println!("Checked {} slides in {}\n", report.entries.len(), source);
        print!("{}", report.render_text());
    }
    Ok(report.exit_status())
}

fn run_export_slides(args: &ExportSlidesArgs, config: &Config) -> Result<i32, AuditError> {
    // Syntax errors surface before a browser is launched
    let selector = args
        .slides
        .as_deref()
        .map(SlideSelector::parse)
        .transpose()?;

    let source = DeckSource::parse(&args.deck)?;
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| source.default_slides_dir());
    let raster_config = config.get_raster_config(output_dir, selector, args.scale);

    let deck = ChromeDeck::open(source.url(), &config.get_browser_config())?;
    let summary = slide_audit::export_slides(&deck, &raster_config)?;

    for path in &summary.written {
        println!(
            "  Exported {} ({}x{}px)",
            path.display(),
            summary.pixel_size.0,
            summary.pixel_size.1
        );
    }
    println!(
        "\n{} slide(s) exported to {}/",
        summary.written.len(),
        raster_config.output_dir.display()
    );

    if summary.timed_out.is_empty() {
        Ok(0)
    } else {
        let skipped: Vec<String> = summary.timed_out.iter().map(|n| n.to_string()).collect();
        eprintln!(
            "Error: slide(s) {} did not finish rendering and were not exported",
            skipped.join(", ")
        );
        Ok(EXIT_INCOMPLETE)
    }
}

fn run_export_pdf(args: &ExportPdfArgs, config: &Config) -> Result<i32, AuditError> {
    let source = DeckSource::parse(&args.deck)?;
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| source.default_pdf_path());
    let pdf_config = config.get_pdf_config(output_path);

    let deck = ChromeDeck::open(&source.print_url(), &config.get_browser_config())?;
    let path = slide_audit::export_pdf(&deck, &pdf_config)?;

    println!("Exported PDF: {}", path.display());
    Ok(0)
}
