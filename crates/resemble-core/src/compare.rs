//! Whole-image comparison.
//!
//! [`compare`] walks both images in lockstep, classifies each pixel pair
//! with the similarity checks on [`Pixel`], and writes one output cell per
//! pair: a faded copy for similar pairs, a grayscale copy where only
//! brightness is compared, or an error pixel for mismatches.
//!
//! Output rows are independent, so the loop runs row-parallel with rayon.
//! Each worker owns one [`RowSurface`] and samples its own source pixels.

use image::DynamicImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::antialias::is_antialiased;
use crate::color::Argb;
use crate::error_pixel::ErrorPixelTransformer;
use crate::options::AnalysisOptions;
use crate::pixel::Pixel;
use crate::surface::{
    BYTES_PER_PIXEL, RasterSurface, RasterSurfaceMut, RowSurface, check_dimensions_match,
    ensure_rgba8,
};
use crate::types::{CompareError, DiffBounds, Dimensions, PixelError, RgbaImage};

/// On large images with antialiasing detection, every pixel on a row or
/// column divisible by this stride is skipped.
pub const LARGE_IMAGE_SKIP_STRIDE: u32 = 6;

/// Aggregate numbers for one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Size of both inputs and of the output.
    pub dimensions: Dimensions,
    /// `width * height`.
    pub total_pixels: u64,
    /// Pixels actually classified (less than `total_pixels` when sampling).
    pub compared_pixels: u64,
    /// Pixels rendered as error pixels.
    pub mismatch_count: u64,
    /// `mismatch_count / total_pixels * 100`, or `0` for empty images.
    pub mismatch_percentage: f64,
    /// Bounding box of all mismatches, if there were any.
    pub diff_bounds: Option<DiffBounds>,
}

impl ComparisonSummary {
    /// Whether no pixel was reported as a mismatch.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.mismatch_count == 0
    }

    /// Generate a human-readable text report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Comparison Report\n{}", "=".repeat(40)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.dimensions.width, self.dimensions.height, self.total_pixels,
        ));
        lines.push(format!("Compared: {} pixels", self.compared_pixels));
        lines.push(format!(
            "Mismatched: {} pixels ({:.2}%)",
            self.mismatch_count, self.mismatch_percentage,
        ));
        match self.diff_bounds {
            Some(b) => lines.push(format!(
                "Diff bounds: left={} top={} right={} bottom={} ({}x{})",
                b.left,
                b.top,
                b.right,
                b.bottom,
                b.width(),
                b.height(),
            )),
            None => lines.push("Diff bounds: none".to_owned()),
        }

        lines.join("\n")
    }
}

/// Summary plus the rendered difference image.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    /// Aggregate numbers.
    pub summary: ComparisonSummary,
    /// One cell per input pixel.
    pub output: RgbaImage,
}

/// Compare two RGBA images of equal size.
///
/// # Errors
///
/// Returns [`CompareError::InvalidOptions`] if `options` fail validation,
/// [`CompareError::DimensionMismatch`] if the images differ in size, or
/// [`CompareError::Pixel`] if a per-pixel operation fails.
pub fn compare(
    first: &RgbaImage,
    second: &RgbaImage,
    options: &AnalysisOptions,
) -> Result<ComparisonResult, CompareError> {
    options.validate()?;
    let dimensions = check_dimensions_match(first, second)?;
    let skip_stride = skip_stride(dimensions, options);

    log::debug!(
        "comparing {}x{} images (error pixel {}, ignore colors {}, ignore antialiasing {})",
        dimensions.width,
        dimensions.height,
        options.error_pixel,
        options.ignore_colors,
        options.ignore_antialiasing,
    );

    let comparer = Comparer {
        first,
        second,
        options,
        skip_stride,
    };

    let mut output = RgbaImage::new(dimensions.width, dimensions.height);
    let row_bytes = dimensions.width as usize * BYTES_PER_PIXEL;
    let stats = if row_bytes == 0 {
        RowStats::default()
    } else {
        output
            .par_chunks_mut(row_bytes)
            .zip(0..dimensions.height)
            .map(|(row, y)| comparer.compare_row(&mut RowSurface::new(row, y, dimensions)))
            .try_reduce(RowStats::default, |a, b| Ok(a.merge(b)))?
    };

    let total_pixels = dimensions.pixel_count();
    let summary = ComparisonSummary {
        dimensions,
        total_pixels,
        compared_pixels: stats.compared,
        mismatch_count: stats.mismatches,
        mismatch_percentage: percentage(stats.mismatches, total_pixels),
        diff_bounds: stats.bounds,
    };

    log::debug!(
        "{} of {} compared pixels mismatched ({:.2}%)",
        summary.mismatch_count,
        summary.compared_pixels,
        summary.mismatch_percentage,
    );

    Ok(ComparisonResult { summary, output })
}

/// Compare two decoded images, which must both be stored as RGBA8.
///
/// # Errors
///
/// Returns [`CompareError::InvalidSurfaceType`] if either image uses a
/// different color type, plus everything [`compare`] returns.
pub fn compare_dynamic(
    first: &DynamicImage,
    second: &DynamicImage,
    options: &AnalysisOptions,
) -> Result<ComparisonResult, CompareError> {
    let first = ensure_rgba8(first, "first")?;
    let second = ensure_rgba8(second, "second")?;
    compare(first, second, options)
}

/// The sampling stride to use, if the image is large enough for
/// antialiasing-aware comparison to skip pixels.
fn skip_stride(dimensions: Dimensions, options: &AnalysisOptions) -> Option<u32> {
    let threshold = options.large_image_threshold;
    let large = threshold > 0.0
        && (f64::from(dimensions.width) > threshold || f64::from(dimensions.height) > threshold);
    if options.ignore_antialiasing && large {
        log::debug!(
            "{}x{} exceeds large image threshold {threshold}, skipping every {}th row and column",
            dimensions.width,
            dimensions.height,
            LARGE_IMAGE_SKIP_STRIDE,
        );
        Some(LARGE_IMAGE_SKIP_STRIDE)
    } else {
        None
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Per-row counters, merged across workers.
#[derive(Debug, Default, Clone, Copy)]
struct RowStats {
    compared: u64,
    mismatches: u64,
    bounds: Option<DiffBounds>,
}

impl RowStats {
    fn record_mismatch(&mut self, x: u32, y: u32) {
        self.mismatches += 1;
        let mut bounds = self.bounds.unwrap_or_else(|| DiffBounds::at(x, y));
        bounds.include(x, y);
        self.bounds = Some(bounds);
    }

    fn merge(self, other: Self) -> Self {
        let bounds = match (self.bounds, other.bounds) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };
        Self {
            compared: self.compared + other.compared,
            mismatches: self.mismatches + other.mismatches,
            bounds,
        }
    }
}

/// What happened to one pixel pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Similar,
    Mismatch,
}

struct Comparer<'a> {
    first: &'a RgbaImage,
    second: &'a RgbaImage,
    options: &'a AnalysisOptions,
    skip_stride: Option<u32>,
}

impl Comparer<'_> {
    fn compare_row(&self, row: &mut RowSurface<'_>) -> Result<RowStats, PixelError> {
        let y = row.y();
        let mut stats = RowStats::default();
        for x in 0..row.dimensions().width {
            if self.is_skipped(x, y) {
                continue;
            }
            stats.compared += 1;
            if self.compare_pixel(row, x, y)? == Outcome::Mismatch {
                stats.record_mismatch(x, y);
            }
        }
        Ok(stats)
    }

    fn is_skipped(&self, x: u32, y: u32) -> bool {
        self.skip_stride
            .is_some_and(|stride| x % stride == 0 || y % stride == 0)
    }

    fn compare_pixel<S>(&self, out: &mut S, x: u32, y: u32) -> Result<Outcome, PixelError>
    where
        S: RasterSurfaceMut + ?Sized,
    {
        let options = self.options;
        let tolerance = &options.tolerance;
        let p1 = Pixel::from_surface(self.first, x, y)?;
        let p2 = Pixel::from_surface(self.second, x, y)?;

        if options.ignore_colors {
            return self.brightness_only(out, x, y, &p1, &p2);
        }

        if p1.is_argb_similar(&p2, tolerance)? {
            out.write(x, y, self.faded(&p1)?)?;
            return Ok(Outcome::Similar);
        }

        if options.ignore_antialiasing
            && (is_antialiased(self.first, &p1, x, y, tolerance)?
                || is_antialiased(self.second, &p2, x, y, tolerance)?)
        {
            return self.brightness_only(out, x, y, &p1, &p2);
        }

        self.mismatch(out, x, y, &p1, &p2)
    }

    fn brightness_only<S>(
        &self,
        out: &mut S,
        x: u32,
        y: u32,
        p1: &Pixel,
        p2: &Pixel,
    ) -> Result<Outcome, PixelError>
    where
        S: RasterSurfaceMut + ?Sized,
    {
        if p1.is_pixel_brightness_similar(p2, &self.options.tolerance)? {
            out.write(x, y, self.grayscale(p2)?)?;
            Ok(Outcome::Similar)
        } else {
            self.mismatch(out, x, y, p1, p2)
        }
    }

    fn mismatch<S>(
        &self,
        out: &mut S,
        x: u32,
        y: u32,
        p1: &Pixel,
        p2: &Pixel,
    ) -> Result<Outcome, PixelError>
    where
        S: RasterSurfaceMut + ?Sized,
    {
        self.options
            .error_pixel
            .transform(out, x, y, p1, p2, self.options)?;
        Ok(Outcome::Mismatch)
    }

    /// `pixel` with its alpha scaled by the transparency multiplier.
    fn faded(&self, pixel: &Pixel) -> Result<Argb, PixelError> {
        let color = pixel.argb()?;
        Ok(Argb {
            alpha: self.fade_alpha(color.alpha),
            ..color
        })
    }

    /// `pixel`'s brightness in all three color channels, alpha faded.
    fn grayscale(&self, pixel: &Pixel) -> Result<Argb, PixelError> {
        let brightness = pixel.min_brightness()?;
        Ok(Argb::new(
            self.fade_alpha(pixel.alpha()?),
            brightness,
            brightness,
            brightness,
        ))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn fade_alpha(&self, alpha: u8) -> u8 {
        let faded = f64::from(alpha) * self.options.pixel_transparency;
        Argb::clamped(faded as i32, 0, 0, 0).alpha
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;
    use crate::error_pixel::ErrorPixel;

    const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);

    #[test]
    fn identical_images_have_no_mismatch() {
        let img = RgbaImage::from_pixel(4, 3, Rgba([12, 34, 56, 255]));
        let result = compare(&img, &img, &AnalysisOptions::default()).unwrap();
        assert!(result.summary.is_match());
        assert_eq!(result.summary.compared_pixels, 12);
        assert_eq!(result.summary.diff_bounds, None);
        assert_eq!(result.output, img);
    }

    #[test]
    fn single_changed_pixel_is_located() {
        let a = RgbaImage::from_pixel(5, 5, Rgba([0, 0, 0, 255]));
        let mut b = a.clone();
        b.put_pixel(3, 1, Rgba([255, 255, 255, 255]));

        let result = compare(&a, &b, &AnalysisOptions::default()).unwrap();
        assert_eq!(result.summary.mismatch_count, 1);
        assert_eq!(result.summary.diff_bounds, Some(DiffBounds::at(3, 1)));
        assert!((result.summary.mismatch_percentage - 4.0).abs() < 1e-9);
        assert_eq!(result.output.get_pixel(3, 1), &YELLOW);
        assert_eq!(result.output.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn bounds_span_rows() {
        let a = RgbaImage::from_pixel(6, 6, Rgba([0, 0, 0, 255]));
        let mut b = a.clone();
        b.put_pixel(1, 4, Rgba([255, 0, 0, 255]));
        b.put_pixel(5, 0, Rgba([0, 255, 0, 255]));

        let summary = compare(&a, &b, &AnalysisOptions::default()).unwrap().summary;
        assert_eq!(summary.mismatch_count, 2);
        assert_eq!(
            summary.diff_bounds,
            Some(DiffBounds {
                left: 1,
                top: 0,
                right: 5,
                bottom: 4
            })
        );
    }

    #[test]
    fn transparency_fades_similar_pixels() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 200]));
        let options = AnalysisOptions {
            pixel_transparency: 0.5,
            ..AnalysisOptions::default()
        };
        let result = compare(&img, &img, &options).unwrap();
        assert_eq!(result.output.get_pixel(1, 1), &Rgba([10, 20, 30, 100]));
    }

    #[test]
    fn ignore_colors_writes_grayscale_of_second() {
        // Same brightness, different hue.
        let a = RgbaImage::from_pixel(1, 1, Rgba([77, 77, 77, 255]));
        let b = RgbaImage::from_pixel(1, 1, Rgba([255, 0, 0, 255]));
        let result = compare(&a, &b, &AnalysisOptions::ignore_colors()).unwrap();
        assert!(result.summary.is_match());
        assert_eq!(result.output.get_pixel(0, 0), &Rgba([77, 77, 77, 255]));

        let strict = compare(&a, &b, &AnalysisOptions::default()).unwrap();
        assert_eq!(strict.summary.mismatch_count, 1);
    }

    #[test]
    fn ignore_colors_still_flags_brightness_change() {
        let a = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let b = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let result = compare(&a, &b, &AnalysisOptions::ignore_colors()).unwrap();
        assert_eq!(result.summary.mismatch_count, 1);
    }

    #[test]
    fn antialiased_pixels_compare_by_brightness() {
        // A lone slightly-tinted pixel has no equivalent neighbours, so it
        // is treated as antialiased and compared on brightness only.
        let a = RgbaImage::from_pixel(3, 3, Rgba([100, 100, 100, 255]));
        let mut b = a.clone();
        b.put_pixel(1, 1, Rgba([140, 100, 100, 255]));

        let strict = compare(&a, &b, &AnalysisOptions::ignore_less()).unwrap();
        assert_eq!(strict.summary.mismatch_count, 1);

        let lenient = compare(&a, &b, &AnalysisOptions::ignore_antialiasing()).unwrap();
        assert!(lenient.summary.is_match());
    }

    #[test]
    fn large_images_skip_stride_rows_and_columns() {
        let a = RgbaImage::from_pixel(12, 7, Rgba([0, 0, 0, 255]));
        let options = AnalysisOptions {
            large_image_threshold: 10.0,
            ..AnalysisOptions::ignore_antialiasing()
        };
        let result = compare(&a, &a, &options).unwrap();
        // Columns 0 and 6, rows 0 and 6 are skipped: 10 x 5 remain.
        assert_eq!(result.summary.compared_pixels, 50);
        assert_eq!(result.summary.total_pixels, 84);
        assert_eq!(result.output.get_pixel(6, 3), &Rgba([0, 0, 0, 0]));
        assert_eq!(result.output.get_pixel(5, 3), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn zero_threshold_disables_sampling() {
        let a = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let options = AnalysisOptions {
            large_image_threshold: 0.0,
            ..AnalysisOptions::ignore_antialiasing()
        };
        let result = compare(&a, &a, &options).unwrap();
        assert_eq!(result.summary.compared_pixels, 64);
    }

    #[test]
    fn movement_strategy_is_used_for_mismatches() {
        let a = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255]));
        let b = RgbaImage::from_pixel(1, 1, Rgba([100, 100, 100, 255]));
        let options = AnalysisOptions {
            error_pixel: ErrorPixel::Movement,
            ..AnalysisOptions::default()
        };
        let result = compare(&a, &b, &options).unwrap();
        assert_eq!(result.output.get_pixel(0, 0), &Rgba([177, 177, 0, 255]));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let a = RgbaImage::new(4, 4);
        let b = RgbaImage::new(4, 5);
        assert!(matches!(
            compare(&a, &b, &AnalysisOptions::default()),
            Err(CompareError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let a = RgbaImage::new(1, 1);
        let options = AnalysisOptions {
            pixel_transparency: -0.1,
            ..AnalysisOptions::default()
        };
        assert!(matches!(
            compare(&a, &a, &options),
            Err(CompareError::InvalidOptions(_))
        ));
    }

    #[test]
    fn empty_images_compare_cleanly() {
        let a = RgbaImage::new(0, 0);
        let summary = compare(&a, &a, &AnalysisOptions::default()).unwrap().summary;
        assert_eq!(summary.total_pixels, 0);
        assert!(summary.mismatch_percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn compare_dynamic_requires_rgba8() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(2, 2));
        let rgb = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        assert!(compare_dynamic(&rgba, &rgba, &AnalysisOptions::default()).is_ok());
        assert!(matches!(
            compare_dynamic(&rgba, &rgb, &AnalysisOptions::default()),
            Err(CompareError::InvalidSurfaceType { ref name, .. }) if name == "second"
        ));
    }

    #[test]
    fn report_mentions_counts() {
        let summary = ComparisonSummary {
            dimensions: Dimensions::new(10, 10),
            total_pixels: 100,
            compared_pixels: 100,
            mismatch_count: 5,
            mismatch_percentage: 5.0,
            diff_bounds: Some(DiffBounds::at(2, 3)),
        };
        let report = summary.report();
        assert!(report.contains("10x10"));
        assert!(report.contains("Mismatched: 5 pixels (5.00%)"));
        assert!(report.contains("left=2 top=3"));
    }

    #[test]
    fn summary_serializes() {
        let a = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        let summary = compare(&a, &a, &AnalysisOptions::default()).unwrap().summary;
        let json = serde_json::to_string(&summary).unwrap();
        let back: ComparisonSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary, back);
    }
}
