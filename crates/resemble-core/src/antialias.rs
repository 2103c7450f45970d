//! Antialiasing detection.
//!
//! A pixel is treated as antialiased when its 3x3 neighbourhood in its own
//! image looks like a smoothed edge: several high-contrast neighbours,
//! several neighbours of a clearly different hue, or too few neighbours of
//! exactly the same color.

use crate::pixel::Pixel;
use crate::surface::RasterSurface;
use crate::types::PixelError;

/// Hue difference in degrees above which a neighbour counts as a different
/// hue (0.3 of a full turn).
pub const DIFFERENT_HUE_DEGREES: f64 = 108.0;

/// Neighbour offsets, excluding the centre.
const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Whether `pixel`, located at `(x, y)` in `surface`, sits on an
/// antialiased edge.
///
/// Neighbours outside the surface are ignored, so corner and edge pixels
/// have fewer candidates for the same-color count.
///
/// # Errors
///
/// Returns [`PixelError`] if sampling a neighbour fails or `tolerance`
/// lacks a max-brightness value.
pub fn is_antialiased<S>(
    surface: &S,
    pixel: &Pixel,
    x: u32,
    y: u32,
    tolerance: &Pixel,
) -> Result<bool, PixelError>
where
    S: RasterSurface + ?Sized,
{
    let dimensions = surface.dimensions();
    let hue = pixel.hue()?;

    let mut contrasting = 0_u32;
    let mut different_hue = 0_u32;
    let mut equivalent = 0_u32;

    for (dx, dy) in NEIGHBOURS {
        let (Ok(nx), Ok(ny)) = (
            u32::try_from(i64::from(x) + dx),
            u32::try_from(i64::from(y) + dy),
        ) else {
            continue;
        };
        if !dimensions.contains(nx, ny) {
            continue;
        }

        let neighbour = Pixel::from_surface(surface, nx, ny)?;
        if pixel.is_contrasting(&neighbour, tolerance)? {
            contrasting += 1;
        }
        if pixel.is_rgb_same(&neighbour)? {
            equivalent += 1;
        }
        if (neighbour.hue()? - hue).abs() > DIFFERENT_HUE_DEGREES {
            different_hue += 1;
        }
        if contrasting > 1 || different_hue > 1 {
            return Ok(true);
        }
    }

    Ok(equivalent < 2)
}
