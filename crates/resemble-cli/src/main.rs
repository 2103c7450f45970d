//! resemble: compare two images and render a visual diff.
//!
//! Decodes both images, scales the second to the first's size when they
//! differ, runs the comparison and prints a summary. The diff raster is
//! written when `--output` is given.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin resemble -- [OPTIONS] <FIRST> <SECOND>
//! ```
//!
//! Set `RUST_LOG=debug` to see sampling and per-run details.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use image::RgbaImage;
use image::imageops::{self, FilterType};
use resemble_core::{AnalysisOptions, Argb, CompareError, Pixel};

/// Perceptual image comparison.
///
/// Compares FIRST and SECOND pixel by pixel under per-channel tolerances
/// and reports how many pixels differ and where.
#[derive(Parser)]
#[command(name = "resemble", version)]
struct Cli {
    /// Reference image (PNG, JPEG, BMP, WebP).
    first: PathBuf,

    /// Image to compare against the reference.
    second: PathBuf,

    /// Write the diff raster to this path (format from the extension).
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Tolerance preset.
    #[arg(long, value_enum, default_value_t = Preset::IgnoreLess)]
    preset: Preset,

    /// How mismatched pixels are rendered.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_ERROR_PIXEL)]
    error_pixel: ErrorPixel,

    /// Marker color as `R,G,B` or `R,G,B,A` (0-255 each).
    #[arg(long, value_parser = parse_error_color)]
    error_color: Option<Argb>,

    /// Compare antialiased edges by brightness only.
    #[arg(long)]
    ignore_antialiasing: bool,

    /// Compare brightness and alpha only.
    #[arg(long)]
    ignore_colors: bool,

    /// Fail on size mismatch instead of scaling the second image.
    #[arg(long)]
    no_scale: bool,

    /// Alpha multiplier (0.0-1.0) for pixels copied into the diff.
    #[arg(long, default_value_t = AnalysisOptions::DEFAULT_PIXEL_TRANSPARENCY)]
    transparency: f64,

    /// Side length above which antialiasing-aware runs sample sparsely.
    /// `0` disables sampling.
    #[arg(long, default_value_t = AnalysisOptions::DEFAULT_LARGE_IMAGE_THRESHOLD)]
    large_image_threshold: f64,

    /// Full analysis options as a JSON string.
    ///
    /// When provided, all other option flags are ignored. Missing fields
    /// take their defaults.
    #[arg(long)]
    options_json: Option<String>,

    /// Print the summary as JSON instead of a text report.
    #[arg(long)]
    json: bool,
}

/// Tolerance preset selection.
#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Moderate tolerance on every channel.
    IgnoreLess,
    /// Zero tolerance.
    IgnoreNothing,
    /// Wider tolerance with antialiasing detection.
    IgnoreAntialiasing,
    /// Brightness-only comparison.
    IgnoreColors,
}

/// Error pixel strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum ErrorPixel {
    /// Solid marker color.
    Flat,
    /// Second image tinted with the marker color.
    Movement,
    /// Marker color, opacity proportional to the difference.
    FlatDifferenceIntensity,
    /// Tinted second image, weighted by the difference.
    MovementDifferenceIntensity,
}

/// Maps a [`resemble_core::ErrorPixel`] to the local CLI [`ErrorPixel`] enum.
const fn error_pixel_from_core(e: resemble_core::ErrorPixel) -> ErrorPixel {
    match e {
        resemble_core::ErrorPixel::Flat => ErrorPixel::Flat,
        resemble_core::ErrorPixel::Movement => ErrorPixel::Movement,
        resemble_core::ErrorPixel::FlatDifferenceIntensity => ErrorPixel::FlatDifferenceIntensity,
        resemble_core::ErrorPixel::MovementDifferenceIntensity => {
            ErrorPixel::MovementDifferenceIntensity
        }
    }
}

/// The CLI default strategy, derived from
/// [`AnalysisOptions::DEFAULT_ERROR_PIXEL`] so the two cannot silently
/// diverge.
const CLI_DEFAULT_ERROR_PIXEL: ErrorPixel =
    error_pixel_from_core(AnalysisOptions::DEFAULT_ERROR_PIXEL);

/// Parse `R,G,B` or `R,G,B,A` into an opaque-by-default color.
fn parse_error_color(s: &str) -> Result<Argb, String> {
    let parts = s
        .split(',')
        .map(|p| {
            p.trim()
                .parse::<u8>()
                .map_err(|e| format!("invalid channel {:?}: {e}", p.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    match parts[..] {
        [red, green, blue] => Ok(Argb::new(u8::MAX, red, green, blue)),
        [red, green, blue, alpha] => Ok(Argb::new(alpha, red, green, blue)),
        _ => Err(format!(
            "expected 3 or 4 comma-separated channels, got {}",
            parts.len()
        )),
    }
}

/// Build [`AnalysisOptions`] from CLI arguments.
///
/// If `--options-json` is provided, the JSON is parsed directly and all
/// individual option flags are ignored. Otherwise the preset is refined by
/// the individual flags.
fn options_from_cli(cli: &Cli) -> Result<AnalysisOptions, String> {
    let options = if let Some(ref json) = cli.options_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --options-json: {e}"))?
    } else {
        let preset = match cli.preset {
            Preset::IgnoreLess => AnalysisOptions::ignore_less(),
            Preset::IgnoreNothing => AnalysisOptions::ignore_nothing(),
            Preset::IgnoreAntialiasing => AnalysisOptions::ignore_antialiasing(),
            Preset::IgnoreColors => AnalysisOptions::ignore_colors(),
        };
        AnalysisOptions {
            error_pixel_color: cli
                .error_color
                .map_or_else(|| preset.error_pixel_color.clone(), Pixel::from),
            error_pixel: match cli.error_pixel {
                ErrorPixel::Flat => resemble_core::ErrorPixel::Flat,
                ErrorPixel::Movement => resemble_core::ErrorPixel::Movement,
                ErrorPixel::FlatDifferenceIntensity => {
                    resemble_core::ErrorPixel::FlatDifferenceIntensity
                }
                ErrorPixel::MovementDifferenceIntensity => {
                    resemble_core::ErrorPixel::MovementDifferenceIntensity
                }
            },
            ignore_antialiasing: preset.ignore_antialiasing || cli.ignore_antialiasing,
            ignore_colors: preset.ignore_colors || cli.ignore_colors,
            scale_to_same_size: !cli.no_scale,
            pixel_transparency: cli.transparency,
            large_image_threshold: cli.large_image_threshold,
            ..preset
        }
    };
    options.validate().map_err(|e| e.to_string())?;
    Ok(options)
}

fn load_rgba(path: &Path) -> Result<RgbaImage, String> {
    let image = image::open(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    log::debug!(
        "decoded {} ({}x{}, {:?})",
        path.display(),
        image.width(),
        image.height(),
        image.color(),
    );
    Ok(image.into_rgba8())
}

/// Resize `second` to `first`'s size when allowed and needed.
fn match_sizes(
    first: &RgbaImage,
    second: RgbaImage,
    options: &AnalysisOptions,
) -> RgbaImage {
    if !options.scale_to_same_size || first.dimensions() == second.dimensions() {
        return second;
    }
    let (width, height) = first.dimensions();
    log::info!(
        "scaling second image from {}x{} to {width}x{height}",
        second.width(),
        second.height(),
    );
    imageops::resize(&second, width, height, FilterType::Triangle)
}

fn report_error(json: bool, err: &CompareError) {
    eprintln!("Comparison error: {err}");
    if json {
        match serde_json::to_string_pretty(err) {
            Ok(s) => println!("{s}"),
            Err(e) => eprintln!("Error serializing error: {e}"),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let options = match options_from_cli(&cli) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    log::debug!("options: {options:?}");

    let (first, second) = match (load_rgba(&cli.first), load_rgba(&cli.second)) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(msg), _) | (_, Err(msg)) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let second = match_sizes(&first, second, &options);

    let result = match resemble_core::compare(&first, &second, &options) {
        Ok(r) => r,
        Err(e) => {
            report_error(cli.json, &e);
            return ExitCode::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&result.summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", result.summary.report());
    }

    if let Some(ref path) = cli.output {
        if let Err(e) = result.output.save(path) {
            eprintln!("Error writing diff to {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        log::info!("diff written to {}", path.display());
    }

    ExitCode::SUCCESS
}
