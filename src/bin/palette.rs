use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_palette_wasm::{ExportFormat, ExtractionMethod, PaletteConfig, PaletteError, PaletteState, PixelBuffer};

/// Extract color palettes from images, or generate random ones.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input image paths. Without any, a random palette is printed.
    inputs: Vec<PathBuf>,

    /// Number of colors in the palette (1-10)
    #[arg(short = 'k', long, default_value_t = 5)]
    n_colors: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Hex)]
    format: ExportFormat,

    /// Clustering backend used for images
    #[arg(short, long, value_enum, default_value_t = ExtractionMethod::Sampled)]
    method: ExtractionMethod,

    /// Seed for reproducible palettes
    #[arg(short, long)]
    seed: Option<u64>,

    /// Color to keep locked in every palette (hex, rgb(...) or hsl(...)); repeatable
    #[arg(long)]
    keep: Vec<String>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log extraction details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "image_palette_wasm=debug"
    } else {
        "image_palette_wasm=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    let config = match &args.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PaletteConfig::from_json(&json).context("invalid config")?
        }
        None => PaletteConfig::default(),
    };

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut state = PaletteState::with_config(rng, config)?;
    state.set_method(args.method);

    if !args.keep.is_empty() {
        state
            .import(&args.keep.join("\n"))
            .context("parsing --keep colors")?;
        state.lock_all();
    }

    if args.inputs.is_empty() {
        state.generate(args.n_colors);
        println!("{}", state.export_text(args.format));
        return Ok(());
    }

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let buffer = PixelBuffer::decode(&bytes, state.config().working_size)
            .with_context(|| format!("decoding {}", input.display()))?;

        match state.extract_from_image(buffer, args.n_colors) {
            Ok(()) => {}
            Err(PaletteError::InsufficientData) => {
                tracing::warn!(path = %input.display(), "No usable pixels, using a random palette");
                state.generate(args.n_colors);
            }
            Err(err) => return Err(err).context("palette extraction failed"),
        }

        if args.inputs.len() > 1 {
            println!("# {}", input.display());
        }
        println!("{}", state.export_text(args.format));
    }

    Ok(())
}
