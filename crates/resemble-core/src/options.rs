//! Per-run configuration for an image comparison.

use serde::{Deserialize, Serialize};

use crate::error_pixel::ErrorPixel;
use crate::pixel::Pixel;
use crate::types::CompareError;

/// Configuration for one comparison run.
///
/// Missing fields in a serialized document take their [`Default`] values,
/// so `{"ignore_colors": true}` is a complete configuration.
///
/// The [`tolerance`](Self::tolerance) pixel is not a color: each of its
/// channels is the largest difference still considered similar for that
/// channel. Its max-brightness slot is also the contrast threshold used by
/// antialiasing detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Per-channel similarity thresholds.
    pub tolerance: Pixel,

    /// Marker color written for dissimilar pixels.
    pub error_pixel_color: Pixel,

    /// How dissimilar pixels are rendered.
    pub error_pixel: ErrorPixel,

    /// Treat antialiased edges as brightness-only comparisons.
    pub ignore_antialiasing: bool,

    /// Compare brightness and alpha only.
    pub ignore_colors: bool,

    /// Scale the second image to the first's size before comparing.
    /// Consumed by whoever loads the images; the comparison itself
    /// requires equal sizes.
    pub scale_to_same_size: bool,

    /// Multiplier in `[0, 1]` applied to the alpha of pixels copied
    /// unchanged into the output.
    pub pixel_transparency: f64,

    /// Side length above which antialiasing-aware comparisons sample the
    /// image sparsely instead of checking every pixel. `0` disables
    /// sampling.
    pub large_image_threshold: f64,
}

impl AnalysisOptions {
    /// Default alpha, red, green and blue tolerance.
    pub const DEFAULT_COLOR_TOLERANCE: u8 = 16;
    /// Default min-brightness tolerance.
    pub const DEFAULT_MIN_BRIGHTNESS: u8 = 16;
    /// Default max-brightness tolerance (contrast threshold).
    pub const DEFAULT_MAX_BRIGHTNESS: u8 = 240;
    /// Default marker color, opaque yellow, as `0xAARRGGBB`.
    pub const DEFAULT_ERROR_COLOR: u32 = 0xFFFF_FF00;
    /// Default rendering strategy.
    pub const DEFAULT_ERROR_PIXEL: ErrorPixel = ErrorPixel::Flat;
    /// Default scaling behavior.
    pub const DEFAULT_SCALE_TO_SAME_SIZE: bool = true;
    /// Default output transparency multiplier.
    pub const DEFAULT_PIXEL_TRANSPARENCY: f64 = 1.0;
    /// Default large-image threshold in pixels.
    pub const DEFAULT_LARGE_IMAGE_THRESHOLD: f64 = 1200.0;

    /// Build a tolerance pixel from per-channel thresholds.
    ///
    /// `color` is `[alpha, red, green, blue]`. Without an explicit `hue`
    /// threshold the hue slot is derived from the color thresholds like
    /// any other pixel.
    #[must_use]
    pub fn tolerance_pixel(
        color: [u8; 4],
        min_brightness: u8,
        max_brightness: u8,
        hue: Option<f64>,
    ) -> Pixel {
        let [alpha, red, green, blue] = color;
        let mut tolerance = Pixel::new(alpha, red, green, blue);
        tolerance.set_min_brightness(min_brightness);
        tolerance.set_max_brightness(max_brightness);
        if let Some(degrees) = hue {
            tolerance.set_hue(degrees);
        }
        tolerance
    }

    /// Same as [`Default`]: moderate tolerance on every channel.
    #[must_use]
    pub fn ignore_less() -> Self {
        Self::default()
    }

    /// Zero tolerance: any channel difference is a mismatch.
    #[must_use]
    pub fn ignore_nothing() -> Self {
        Self {
            tolerance: Self::tolerance_pixel([0, 0, 0, 0], 0, 255, None),
            ..Self::default()
        }
    }

    /// Wider color tolerance and antialiasing detection enabled.
    #[must_use]
    pub fn ignore_antialiasing() -> Self {
        Self {
            tolerance: Self::tolerance_pixel([32, 32, 32, 32], 64, 96, None),
            ignore_antialiasing: true,
            ..Self::default()
        }
    }

    /// Brightness-only comparison.
    #[must_use]
    pub fn ignore_colors() -> Self {
        Self {
            tolerance: Self::tolerance_pixel([16, 255, 255, 255], 16, 240, None),
            ignore_colors: true,
            ..Self::default()
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InvalidOptions`] if `pixel_transparency` is
    /// outside `[0, 1]` or `large_image_threshold` is negative or not
    /// finite.
    pub fn validate(&self) -> Result<(), CompareError> {
        if !(0.0..=1.0).contains(&self.pixel_transparency) {
            return Err(CompareError::InvalidOptions(format!(
                "pixel_transparency must be within [0, 1], got {}",
                self.pixel_transparency
            )));
        }
        if !self.large_image_threshold.is_finite() || self.large_image_threshold < 0.0 {
            return Err(CompareError::InvalidOptions(format!(
                "large_image_threshold must be finite and non-negative, got {}",
                self.large_image_threshold
            )));
        }
        Ok(())
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            tolerance: Self::tolerance_pixel(
                [Self::DEFAULT_COLOR_TOLERANCE; 4],
                Self::DEFAULT_MIN_BRIGHTNESS,
                Self::DEFAULT_MAX_BRIGHTNESS,
                None,
            ),
            error_pixel_color: Pixel::from_argb(Self::DEFAULT_ERROR_COLOR),
            error_pixel: Self::DEFAULT_ERROR_PIXEL,
            ignore_antialiasing: false,
            ignore_colors: false,
            scale_to_same_size: Self::DEFAULT_SCALE_TO_SAME_SIZE,
            pixel_transparency: Self::DEFAULT_PIXEL_TRANSPARENCY,
            large_image_threshold: Self::DEFAULT_LARGE_IMAGE_THRESHOLD,
        }
    }
}
