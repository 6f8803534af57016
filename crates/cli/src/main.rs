//! CLI tool for rebranding PowerPoint and Word documents.

use anyhow::{Context, Result};
use clap::Parser;
use rebrand_core::{
    output_filename, DocumentFormat, ImageData, RebrandConfig, RebrandOutput, ReplacementImages,
};
use rebrand_docx::DocxRebrander;
use rebrand_pptx::PptxRebrander;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Replace legacy logos and favicons and restyle text in .pptx and .docx files.
#[derive(Parser, Debug)]
#[command(name = "rebrand")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input document(s) (.pptx or .docx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Replacement logo image (PNG, JPEG, GIF or BMP)
    #[arg(long)]
    logo: PathBuf,

    /// Replacement favicon image (PowerPoint only)
    #[arg(long)]
    favicon: Option<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix for output file names (default: from config, "ISPA_")
    #[arg(long)]
    prefix: Option<String>,

    /// JSON file overriding thresholds, placements and styles
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the processing report of each file as JSON on stdout
    #[arg(long)]
    report: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RebrandConfig::default(),
    };
    if let Some(prefix) = &args.prefix {
        config = config.with_output_prefix(prefix.as_str());
    }
    let images = load_images(&args.logo, args.favicon.as_deref())?;

    let mut failures = 0;
    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match process_file(input_path, &config, &images) {
            Ok(output) => {
                let output_path = get_output_path(input_path, args.output.as_ref(), &config.output_prefix)?;
                write_output(&output_path, &output.bytes)?;
                for warning in output.report.diagnostics.warnings() {
                    eprintln!("Warning ({}): {}", input_path.display(), warning.message.trim());
                }
                if args.report {
                    println!("{}", serde_json::to_string_pretty(&output.report)?);
                }
                if args.verbose {
                    eprintln!("Written to: {}", output_path.display());
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} file(s) failed", failures, args.input.len());
    }
    Ok(())
}

/// Read a partial `RebrandConfig` JSON file.
fn load_config(path: &Path) -> Result<RebrandConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn load_image(path: &Path) -> Result<ImageData> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    ImageData::new(bytes).with_context(|| format!("Unsupported image {}", path.display()))
}

fn load_images(logo: &Path, favicon: Option<&Path>) -> Result<ReplacementImages> {
    let images = ReplacementImages::new(load_image(logo)?);
    Ok(match favicon {
        Some(path) => images.with_favicon(load_image(path)?),
        None => images,
    })
}

/// Detect the format from content, falling back to the file extension.
fn detect_format(input_path: &Path, bytes: &[u8]) -> Result<DocumentFormat> {
    DocumentFormat::sniff(bytes)
        .or_else(|| {
            input_path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(DocumentFormat::from_extension)
        })
        .ok_or_else(|| anyhow::anyhow!("Could not detect file format (expected .pptx or .docx)"))
}

/// Rebrand a single document.
fn process_file(
    input_path: &Path,
    config: &RebrandConfig,
    images: &ReplacementImages,
) -> Result<RebrandOutput> {
    let bytes = std::fs::read(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;

    let format = detect_format(input_path, &bytes)?;
    log::debug!("Processing {} as {}", input_path.display(), format);

    let output = match format {
        DocumentFormat::Pptx => PptxRebrander::new(config.clone()).rebrand(&bytes, images)?,
        DocumentFormat::Docx => DocxRebrander::new(config.clone()).rebrand(&bytes, images)?,
    };
    Ok(output)
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>, prefix: &str) -> Result<PathBuf> {
    let original = input_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document");

    let output_filename = output_filename(prefix, original);

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &[u8]) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}
