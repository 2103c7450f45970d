//! Pure color math: ARGB packing, brightness, hue and RGB distance.
//!
//! These functions define the numeric semantics every tolerance check and
//! intensity-aware error pixel depends on:
//!
//! - brightness is the weighted luminance `0.30*R + 0.59*G + 0.11*B`,
//!   rounded to the nearest integer
//! - hue is the HSV hue angle in degrees, `[0, 360)`, and `0` for grays
//! - RGB distance is the mean absolute channel difference, `[0, 255]`

use serde::{Deserialize, Serialize};

use crate::pixel::Pixel;
use crate::types::PixelError;

/// A color in alpha, red, green, blue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Argb {
    /// Opacity.
    pub alpha: u8,
    /// Red intensity.
    pub red: u8,
    /// Green intensity.
    pub green: u8,
    /// Blue intensity.
    pub blue: u8,
}

impl Argb {
    /// Create a color from its four channels.
    #[must_use]
    pub const fn new(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self {
            alpha,
            red,
            green,
            blue,
        }
    }

    /// Pack into a 32-bit `0xAARRGGBB` value.
    #[must_use]
    pub const fn to_packed(self) -> u32 {
        pack_argb(self.alpha, self.red, self.green, self.blue)
    }

    /// Unpack a 32-bit `0xAARRGGBB` value.
    #[must_use]
    pub const fn from_packed(argb: u32) -> Self {
        let (alpha, red, green, blue) = unpack_argb(argb);
        Self::new(alpha, red, green, blue)
    }

    /// Build a color from integer channel values, clamping each to `0..=255`.
    #[must_use]
    pub const fn clamped(alpha: i32, red: i32, green: i32, blue: i32) -> Self {
        Self::new(
            clamp_channel(alpha),
            clamp_channel(red),
            clamp_channel(green),
            clamp_channel(blue),
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
const fn clamp_channel(value: i32) -> u8 {
    if value < 0 {
        0
    } else if value > 255 {
        255
    } else {
        value as u8
    }
}

/// Pack four 8-bit channels into `0xAARRGGBB`.
#[must_use]
pub const fn pack_argb(alpha: u8, red: u8, green: u8, blue: u8) -> u32 {
    ((alpha as u32) << 24) | ((red as u32) << 16) | ((green as u32) << 8) | blue as u32
}

/// Split `0xAARRGGBB` into `(alpha, red, green, blue)`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn unpack_argb(argb: u32) -> (u8, u8, u8, u8) {
    (
        (argb >> 24) as u8,
        (argb >> 16) as u8,
        (argb >> 8) as u8,
        argb as u8,
    )
}

/// Perceptual brightness of an RGB triple, `0..=255`.
///
/// Integer form of `0.30*R + 0.59*G + 0.11*B`, rounded half up. The
/// weights sum to one, so grays map to themselves.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn brightness(red: u8, green: u8, blue: u8) -> u8 {
    let weighted = 30 * red as u32 + 59 * green as u32 + 11 * blue as u32;
    ((weighted + 50) / 100) as u8
}

/// HSV hue of an RGB triple in degrees, `[0, 360)`.
///
/// Achromatic colors (`R == G == B`) have hue `0`.
#[must_use]
pub fn hue(red: u8, green: u8, blue: u8) -> f64 {
    let max = red.max(green).max(blue);
    let min = red.min(green).min(blue);
    if max == min {
        return 0.0;
    }

    let chroma = f64::from(max - min);
    let (r, g, b) = (f64::from(red), f64::from(green), f64::from(blue));
    let sector = if max == red {
        ((g - b) / chroma).rem_euclid(6.0)
    } else if max == green {
        (b - r) / chroma + 2.0
    } else {
        (r - g) / chroma + 4.0
    };

    let degrees = sector * 60.0;
    if degrees >= 360.0 { degrees - 360.0 } else { degrees }
}

/// Distance between the RGB triples of two pixels, `[0, 255]`.
///
/// Mean of the absolute red, green and blue differences. Symmetric, zero
/// for equal colors and 255 between black and white. Alpha is ignored.
///
/// # Errors
///
/// Returns [`PixelError::ValueUnavailable`] if a red, green or blue
/// channel of either pixel has been invalidated.
pub fn colors_distance_rgb(first: &Pixel, second: &Pixel) -> Result<f64, PixelError> {
    let diff = |a: u8, b: u8| f64::from(a.abs_diff(b));
    let total = diff(first.red()?, second.red()?)
        + diff(first.green()?, second.green()?)
        + diff(first.blue()?, second.blue()?);
    Ok(total / 3.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn pack_places_alpha_most_significant() {
        assert_eq!(pack_argb(0x12, 0x34, 0x56, 0x78), 0x1234_5678);
        assert_eq!(unpack_argb(0xFF00_80FF), (0xFF, 0x00, 0x80, 0xFF));
    }

    #[test]
    fn pack_unpack_round_trip_every_channel_value() {
        // Sweep one channel at a time; the others hold distinct values so a
        // shifted or overlapping channel would show up.
        let base = [0x5A_u8, 0xA5, 0x3C, 0xC3];
        for channel in 0..4 {
            for v in 0..=u8::MAX {
                let mut c = base;
                c[channel] = v;
                let [a, r, g, b] = c;
                assert_eq!(
                    unpack_argb(pack_argb(a, r, g, b)),
                    (a, r, g, b),
                    "channel {channel} value {v}"
                );
            }
        }
    }

    #[test]
    fn argb_packed_conversions_agree() {
        let color = Argb::new(200, 10, 20, 30);
        assert_eq!(Argb::from_packed(color.to_packed()), color);
    }

    #[test]
    fn clamped_limits_channels() {
        assert_eq!(Argb::clamped(-5, 300, 128, 255), Argb::new(0, 255, 128, 255));
    }

    #[test]
    fn brightness_of_grays_is_identity() {
        for v in [0_u8, 1, 16, 128, 200, 255] {
            assert_eq!(brightness(v, v, v), v);
        }
    }

    #[test]
    fn brightness_weights_green_highest() {
        let r = brightness(255, 0, 0);
        let g = brightness(0, 255, 0);
        let b = brightness(0, 0, 255);
        assert_eq!((r, g, b), (77, 150, 28));
        assert!(g > r && r > b);
    }

    #[test]
    fn hue_of_primaries() {
        assert!((hue(255, 0, 0) - 0.0).abs() < 1e-9);
        assert!((hue(0, 255, 0) - 120.0).abs() < 1e-9);
        assert!((hue(0, 0, 255) - 240.0).abs() < 1e-9);
        assert!((hue(255, 255, 0) - 60.0).abs() < 1e-9);
        assert!((hue(255, 0, 255) - 300.0).abs() < 1e-9);
    }

    #[test]
    fn hue_of_gray_is_zero() {
        assert!(hue(128, 128, 128).abs() < f64::EPSILON);
        assert!(hue(0, 0, 0).abs() < f64::EPSILON);
    }

    #[test]
    fn hue_stays_below_full_turn() {
        // Red with a touch of blue lands just below 360.
        let h = hue(255, 0, 1);
        assert!(h > 359.0 && h < 360.0, "hue was {h}");
    }

    #[test]
    fn hue_ignores_saturation_and_value() {
        assert!((hue(255, 0, 0) - hue(100, 50, 50)).abs() < 1e-9);
    }

    #[test]
    fn distance_black_white_is_max() {
        let black = Pixel::new(255, 0, 0, 0);
        let white = Pixel::new(255, 255, 255, 255);
        assert!((colors_distance_rgb(&black, &white).unwrap() - 255.0).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric_and_ignores_alpha() {
        let a = Pixel::new(0, 10, 20, 30);
        let b = Pixel::new(255, 40, 5, 30);
        let ab = colors_distance_rgb(&a, &b).unwrap();
        let ba = colors_distance_rgb(&b, &a).unwrap();
        assert!((ab - ba).abs() < f64::EPSILON);
        assert!((ab - 15.0).abs() < f64::EPSILON);
    }
}
