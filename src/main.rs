use clap::Parser;
use pixtrace::{LoadOptions, ThresholdMethod, TraceParams, TurnPolicy};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pixtrace", about = "Bitmap image to smooth vector outline")]
struct Cli {
    /// Input image path (PNG, JPEG, BMP, PNM)
    input: PathBuf,

    /// Output SVG path (defaults to the input with an .svg extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How ambiguous diagonal crossings are resolved:
    /// black, white, left, right, minority, majority
    #[arg(long, default_value = "majority")]
    turnpolicy: TurnPolicy,

    /// Drop contours enclosing fewer than this many pixels
    #[arg(long, default_value = "2")]
    turdsize: u32,

    /// Corner threshold (0 = polygon, ~1.34 = no corners)
    #[arg(long, default_value = "1.0")]
    alphamax: f64,

    /// Maximum deviation of merged curves, in pixels
    #[arg(long, default_value = "0.2")]
    opttolerance: f64,

    /// Do not merge adjacent curve segments
    #[arg(long)]
    longcurve: bool,

    /// Invert the image before tracing
    #[arg(long)]
    invert: bool,

    /// Fixed brightness threshold (0-255); darker pixels are foreground
    #[arg(long, default_value = "128", conflicts_with = "otsu")]
    threshold: u8,

    /// Pick the threshold with Otsu's method
    #[arg(long)]
    otsu: bool,

    /// Also render a PNG preview of the traced outline
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Preview scale factor relative to the source image
    #[arg(long, default_value = "4.0")]
    preview_scale: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let load = LoadOptions {
        threshold: if cli.otsu {
            ThresholdMethod::Otsu
        } else {
            ThresholdMethod::Fixed(cli.threshold)
        },
        invert: cli.invert,
    };
    let params = TraceParams {
        turn_policy: cli.turnpolicy,
        speckle_size: cli.turdsize,
        alphamax: cli.alphamax,
        opticurve: !cli.longcurve,
        opttolerance: cli.opttolerance,
    };
    params.validate()?;

    eprintln!();
    eprintln!("  pixtrace \u{00b7} {}", cli.input.display());
    eprintln!();

    let grid = pixtrace::load_bitmap(&cli.input, &load)?;
    let threshold_name = match load.threshold {
        ThresholdMethod::Otsu => "Otsu".to_string(),
        ThresholdMethod::Fixed(t) => format!("fixed {}", t),
    };
    eprintln!(
        "  Load        {}x{} px, {} threshold, {} foreground",
        grid.width(),
        grid.height(),
        threshold_name,
        grid.count_foreground(),
    );

    let outline = pixtrace::trace(&grid, &params)?;
    let holes = outline.contours().iter().filter(|c| c.sign.is_hole()).count();
    let curves = outline.curve_count();
    eprintln!(
        "  Trace       {} contours ({} outer, {} hole) \u{2192} {} curves + {} lines  ({})",
        outline.contours().len(),
        outline.contours().len() - holes,
        holes,
        curves,
        outline.segment_count() - curves,
        params.turn_policy,
    );

    let output = cli.output.unwrap_or_else(|| cli.input.with_extension("svg"));
    pixtrace::output::write_svg(&outline, &output)?;

    if let Some(preview) = &cli.preview {
        pixtrace::render::save_preview(&outline, preview, cli.preview_scale)?;
        eprintln!("  Preview     {}", preview.display());
    }

    eprintln!();
    eprintln!("  \u{2713} {}", output.display());
    eprintln!();

    Ok(())
}
