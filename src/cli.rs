use crate::config::{load_config, load_plot_spec};
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::pipeline::build_figure;
use crate::render::{create_output_file, render_svg, write_output_svg};
use crate::text_metrics::{FontMeasurer, TextMeasurer};
use crate::workbook::load_workbook;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MOSFIG_LOG";

#[derive(Parser, Debug)]
#[command(name = "mosfig", version, about = "Labeled multi-panel figures from a mosaic layout")]
pub struct Args {
    /// Workbook (.xlsx/.xls/.ods spreadsheet, or JSON sheet -> column -> values)
    #[arg(short = 'x', long = "workbook", visible_alias = "xlsx")]
    pub workbook: PathBuf,

    /// Plot spec (YAML with sheet2panel and layout)
    #[arg(short = 'y', long = "yaml")]
    pub yaml: PathBuf,

    /// Output file
    #[arg(short = 'o', long = "out")]
    pub out: PathBuf,

    /// Style sheet (JSON5: theme, themeVariables, layout, figure)
    #[arg(short = 'c', long = "style")]
    pub style: Option<PathBuf>,

    /// Figure width in inches
    #[arg(long = "width")]
    pub width: Option<f32>,

    /// Figure height in inches
    #[arg(long = "height")]
    pub height: Option<f32>,

    /// Output format. Defaults to the output file extension, else SVG.
    #[arg(short = 'e', long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Also write the solved layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    execute(&args)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs one rendering job. Every input is loaded, the whole layout solved and
/// every output file opened before anything is written.
pub fn execute(args: &Args) -> Result<()> {
    let spec = load_plot_spec(&args.yaml)?;
    let workbook = load_workbook(&args.workbook)?;
    let mut config = load_config(args.style.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    config.validate()?;

    let measurer: Arc<dyn TextMeasurer> = Arc::new(FontMeasurer::new(config.theme.font_family.clone()));
    let layout = build_figure(&spec, &workbook, &config, measurer)?;
    let svg = render_svg(&layout.figure)?;
    let dump = match &args.dump_layout {
        Some(path) => Some((LayoutDump::from_layout(&layout), create_output_file(path)?)),
        None => None,
    };

    match output_format(args.format, &args.out) {
        OutputFormat::Svg => write_output_svg(&svg, Some(&args.out))?,
        OutputFormat::Png => write_png(&svg, &args.out, &config)?,
    }
    if let Some((dump, file)) = dump {
        write_layout_dump(file, &dump)?;
    }
    info!(
        output = %args.out.display(),
        warnings = layout.warnings.len(),
        "figure written"
    );
    Ok(())
}

fn output_format(explicit: Option<OutputFormat>, out: &Path) -> OutputFormat {
    if let Some(format) = explicit {
        return format;
    }
    let is_png = out
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false);
    if is_png { OutputFormat::Png } else { OutputFormat::Svg }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, out: &Path, config: &crate::config::Config) -> Result<()> {
    crate::render::write_output_png(svg, out, &config.render, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _out: &Path, _config: &crate::config::Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}
