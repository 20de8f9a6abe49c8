use crate::cloud_dump::write_cloud_dump;
use crate::config::load_config;
use crate::host::LogHost;
use crate::layout::{RotationMode, SpiralLayout};
use crate::pipeline::{PassOutcome, RenderInputs, RenderPipeline};
use crate::render::{render_svg, write_output_png, write_output_svg};
use crate::source::RowSet;
use crate::text_metrics::FontMetrics;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "wordcloud", version, about = "Word cloud renderer in Rust")]
pub struct Args {
    /// Input rows (.json/.json5) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, cloud settings, pipeline tuning)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Canvas width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Canvas height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// Word rotations
    #[arg(long = "rotation", value_enum)]
    pub rotation: Option<RotationMode>,

    /// Use raw sizes as pixel font sizes
    #[arg(long = "no-normalize")]
    pub no_normalize: bool,

    /// Render every word in Impact
    #[arg(long = "impact")]
    pub impact: bool,

    /// Start words at random positions instead of the center
    #[arg(long = "random")]
    pub random: bool,

    /// Layout seed
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Write the finished layout as JSON
    #[arg(long = "dump")]
    pub dump: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

pub fn run() -> Result<()> {
    run_with(Args::parse())
}

pub fn run_with(args: Args) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(rotation) = args.rotation {
        config.cloud.rotation = rotation;
    }
    if let Some(seed) = args.seed {
        config.pipeline.seed = seed;
    }
    config.cloud.normalize_font &= !args.no_normalize;
    config.cloud.use_impact_font |= args.impact;
    config.cloud.random_placement |= args.random;

    let input = read_input(args.input.as_deref())?;
    let rows = RowSet::parse(&input)?;
    if rows.rows.is_empty() {
        tracing::warn!("input holds no rows");
    }

    let inputs = RenderInputs {
        canvas: config.render.canvas(),
        settings: config.cloud,
    };
    let mut host = LogHost::default();
    let mut pipeline = RenderPipeline::new(config.clone(), FontMetrics, SpiralLayout);
    let mut outcome = pipeline.render(&rows, &inputs, &mut host, Instant::now())?;
    while outcome == PassOutcome::Pending {
        outcome = pipeline.tick(&mut host, Instant::now())?;
    }
    tracing::info!(?outcome, placed = pipeline.cloud().placements.len(), "render finished");

    if let Some(path) = args.dump.as_deref() {
        write_cloud_dump(path, pipeline.cloud())?;
    }

    let svg = render_svg(pipeline.cloud(), None, None, &config.theme);
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render, &config.theme)?;
        }
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
