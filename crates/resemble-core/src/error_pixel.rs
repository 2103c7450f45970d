//! Error pixels: how a dissimilar pixel pair is drawn into the output.
//!
//! This module defines the [`ErrorPixelTransformer`] trait for pluggable
//! marker rendering and the [`ErrorPixel`] enum for selecting a strategy at
//! runtime.
//!
//! Every strategy is a pure function of the two source pixels and the
//! analysis options, and writes exactly one output cell. Strategies hold no
//! state, so disjoint coordinates can be rendered concurrently.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::{self, Argb};
use crate::options::AnalysisOptions;
use crate::pixel::Pixel;
use crate::surface::RasterSurfaceMut;
use crate::types::PixelError;

/// Share of the marker color in the intensity-weighted movement blend at
/// maximum RGB distance.
const MOVEMENT_INTENSITY_WEIGHT: f64 = 0.8;

/// Selects how dissimilar pixels are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorPixel {
    /// The configured error color, verbatim.
    #[default]
    Flat,

    /// The second image's pixel tinted with the error color.
    ///
    /// Alpha comes from the second pixel; each color channel is
    /// `(d2 * (e / 255) + e) / 2` in integer arithmetic.
    Movement,

    /// The error color with alpha set to the RGB distance between the two
    /// pixels, so stronger differences are more opaque.
    FlatDifferenceIntensity,

    /// Movement blend weighted by the RGB distance.
    ///
    /// With `ratio = distance / 255 * 0.8`, each color channel is
    /// `(1 - ratio) * (d2 * (e / 255) + ratio * e)`, truncated. Alpha
    /// comes from the second pixel.
    MovementDifferenceIntensity,
}

impl ErrorPixel {
    /// Every strategy, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Flat,
        Self::Movement,
        Self::FlatDifferenceIntensity,
        Self::MovementDifferenceIntensity,
    ];
}

impl fmt::Display for ErrorPixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flat => f.write_str("Flat"),
            Self::Movement => f.write_str("Movement"),
            Self::FlatDifferenceIntensity => f.write_str("FlatDifferenceIntensity"),
            Self::MovementDifferenceIntensity => f.write_str("MovementDifferenceIntensity"),
        }
    }
}

/// Trait for error pixel rendering strategies.
///
/// Input: the pixel from each source image and the run's options.
/// Output: one ARGB color for the output raster.
pub trait ErrorPixelTransformer {
    /// Compute the marker color for a dissimilar pair.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if a channel the strategy
    /// reads has been invalidated.
    fn error_color(
        &self,
        first: &Pixel,
        second: &Pixel,
        options: &AnalysisOptions,
    ) -> Result<Argb, PixelError>;

    /// Compute the marker color and write it at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Propagates [`error_color`](Self::error_color) failures and returns
    /// [`PixelError::OutOfBounds`] if `(x, y)` is outside `dest`.
    fn transform<S>(
        &self,
        dest: &mut S,
        x: u32,
        y: u32,
        first: &Pixel,
        second: &Pixel,
        options: &AnalysisOptions,
    ) -> Result<(), PixelError>
    where
        S: RasterSurfaceMut + ?Sized,
    {
        let color = self.error_color(first, second, options)?;
        dest.write(x, y, color)
    }
}

impl ErrorPixelTransformer for ErrorPixel {
    fn error_color(
        &self,
        first: &Pixel,
        second: &Pixel,
        options: &AnalysisOptions,
    ) -> Result<Argb, PixelError> {
        let error = &options.error_pixel_color;
        match *self {
            Self::Flat => error.argb(),
            Self::Movement => movement(second, error),
            Self::FlatDifferenceIntensity => flat_difference_intensity(first, second, error),
            Self::MovementDifferenceIntensity => {
                movement_difference_intensity(first, second, error)
            }
        }
    }
}

/// `(d2 * (e / 255) + e) / 2` with integer division throughout.
///
/// `e / 255` is `1` only for a saturated error channel, so the source pixel
/// shows through only where the error color is fully on.
fn movement(second: &Pixel, error: &Pixel) -> Result<Argb, PixelError> {
    let blend = |d2: u8, e: u8| {
        let (d2, e) = (i32::from(d2), i32::from(e));
        (d2 * (e / 255) + e) / 2
    };
    Ok(Argb::clamped(
        i32::from(second.alpha()?),
        blend(second.red()?, error.red()?),
        blend(second.green()?, error.green()?),
        blend(second.blue()?, error.blue()?),
    ))
}

#[allow(clippy::cast_possible_truncation)]
fn flat_difference_intensity(
    first: &Pixel,
    second: &Pixel,
    error: &Pixel,
) -> Result<Argb, PixelError> {
    let distance = color::colors_distance_rgb(first, second)?;
    Ok(Argb::clamped(
        distance as i32,
        i32::from(error.red()?),
        i32::from(error.green()?),
        i32::from(error.blue()?),
    ))
}

#[allow(clippy::cast_possible_truncation)]
fn movement_difference_intensity(
    first: &Pixel,
    second: &Pixel,
    error: &Pixel,
) -> Result<Argb, PixelError> {
    let ratio = color::colors_distance_rgb(first, second)? / 255.0 * MOVEMENT_INTENSITY_WEIGHT;
    let ratio1 = 1.0 - ratio;
    let blend = |d2: u8, e: u8| {
        let (d2, e) = (i32::from(d2), i32::from(e));
        let tinted = f64::from(d2 * (e / 255));
        (ratio1 * ratio.mul_add(f64::from(e), tinted)) as i32
    };
    Ok(Argb::clamped(
        i32::from(second.alpha()?),
        blend(second.red()?, error.red()?),
        blend(second.green()?, error.green()?),
        blend(second.blue()?, error.blue()?),
    ))
}
