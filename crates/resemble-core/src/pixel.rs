//! A pixel with lazily derived brightness and hue.
//!
//! [`Pixel`] owns one [`ChannelValue`] per [`Channel`]. Alpha, red, green
//! and blue are set explicitly. Min-brightness, max-brightness and hue
//! follow a fixed dependency graph:
//!
//! ```text
//! red, green, blue --> min_brightness + max_brightness (derived together)
//!                  \-> hue
//! ```
//!
//! Writing red, green or blue clears the three derived slots. Reading a
//! cleared derived slot recomputes it from the current red, green and blue.
//! Alpha is never derived.
//!
//! The same type doubles as a tolerance pixel: its channel values are then
//! per-channel thresholds for the similarity checks.

use serde::{Deserialize, Serialize};

use crate::channel::{Channel, ChannelValue};
use crate::color::{self, Argb};
use crate::surface::RasterSurface;
use crate::types::PixelError;

/// An ARGB pixel plus cached brightness and hue.
///
/// Channel values are `u8`, so out-of-range colors cannot be constructed;
/// callers computing colors in wider integer types clamp through
/// [`Argb::clamped`] before building a pixel.
///
/// Equality compares resolved channel values: a cached derived value and
/// one that has not been computed yet are the same as long as they
/// resolve to the same number.
#[derive(Debug, Clone)]
pub struct Pixel {
    alpha: ChannelValue<u8>,
    red: ChannelValue<u8>,
    green: ChannelValue<u8>,
    blue: ChannelValue<u8>,
    min_brightness: ChannelValue<u8>,
    max_brightness: ChannelValue<u8>,
    hue: ChannelValue<f64>,
}

impl Default for Pixel {
    /// Fully transparent black.
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

impl Pixel {
    /// Create a pixel from explicit channel values. Derived channels start
    /// unavailable.
    #[must_use]
    pub fn new(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self {
            alpha: ChannelValue::with_value(Channel::Alpha, alpha),
            red: ChannelValue::with_value(Channel::Red, red),
            green: ChannelValue::with_value(Channel::Green, green),
            blue: ChannelValue::with_value(Channel::Blue, blue),
            min_brightness: ChannelValue::unavailable(Channel::MinBrightness),
            max_brightness: ChannelValue::unavailable(Channel::MaxBrightness),
            hue: ChannelValue::unavailable(Channel::Hue),
        }
    }

    /// Create a pixel from a packed `0xAARRGGBB` value.
    #[must_use]
    pub fn from_argb(argb: u32) -> Self {
        Self::from(Argb::from_packed(argb))
    }

    /// Sample a pixel from `surface` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::OutOfBounds`] if `(x, y)` is outside the
    /// surface.
    pub fn from_surface<S>(surface: &S, x: u32, y: u32) -> Result<Self, PixelError>
    where
        S: RasterSurface + ?Sized,
    {
        surface.sample(x, y).map(Self::from)
    }

    // --- Reading ---

    /// Alpha channel.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if alpha was invalidated.
    pub fn alpha(&self) -> Result<u8, PixelError> {
        self.alpha.get()
    }

    /// Red channel.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if red was invalidated.
    pub fn red(&self) -> Result<u8, PixelError> {
        self.red.get()
    }

    /// Green channel.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if green was invalidated.
    pub fn green(&self) -> Result<u8, PixelError> {
        self.green.get()
    }

    /// Blue channel.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if blue was invalidated.
    pub fn blue(&self) -> Result<u8, PixelError> {
        self.blue.get()
    }

    /// Min-brightness, deriving both brightness channels if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if the value must be
    /// derived and a red, green or blue channel was invalidated.
    pub fn min_brightness(&self) -> Result<u8, PixelError> {
        self.min_brightness.get_or_derive(|| self.derive_brightness())
    }

    /// Max-brightness, deriving both brightness channels if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if the value must be
    /// derived and a red, green or blue channel was invalidated.
    pub fn max_brightness(&self) -> Result<u8, PixelError> {
        self.max_brightness.get_or_derive(|| self.derive_brightness())
    }

    /// Hue in degrees, deriving it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if the value must be
    /// derived and a red, green or blue channel was invalidated.
    pub fn hue(&self) -> Result<f64, PixelError> {
        self.hue.get_or_derive(|| {
            Ok(color::hue(self.red()?, self.green()?, self.blue()?))
        })
    }

    /// Any channel as a number, deriving it if needed.
    ///
    /// # Errors
    ///
    /// Same as the channel's own accessor.
    pub fn value(&self, channel: Channel) -> Result<f64, PixelError> {
        match channel {
            Channel::Hue => self.hue(),
            other => self.byte(other).map(f64::from),
        }
    }

    /// Alpha, red, green and blue as one color.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if any of them was
    /// invalidated.
    pub fn argb(&self) -> Result<Argb, PixelError> {
        Ok(Argb::new(
            self.alpha()?,
            self.red()?,
            self.green()?,
            self.blue()?,
        ))
    }

    /// Whether `channel` currently holds a value (without deriving it).
    #[must_use]
    pub fn is_available(&self, channel: Channel) -> bool {
        match self.byte_slot(channel) {
            Some(slot) => slot.is_available(),
            None => self.hue.is_available(),
        }
    }

    fn byte(&self, channel: Channel) -> Result<u8, PixelError> {
        match channel {
            Channel::MinBrightness => self.min_brightness(),
            Channel::MaxBrightness => self.max_brightness(),
            other => self
                .byte_slot(other)
                .ok_or(PixelError::ValueUnavailable(other))?
                .get(),
        }
    }

    /// The `u8` slot for `channel`; `None` for hue.
    const fn byte_slot(&self, channel: Channel) -> Option<&ChannelValue<u8>> {
        match channel {
            Channel::Alpha => Some(&self.alpha),
            Channel::Red => Some(&self.red),
            Channel::Green => Some(&self.green),
            Channel::Blue => Some(&self.blue),
            Channel::MinBrightness => Some(&self.min_brightness),
            Channel::MaxBrightness => Some(&self.max_brightness),
            Channel::Hue => None,
        }
    }

    /// Brightness from the current RGB, stored into both brightness slots.
    fn derive_brightness(&self) -> Result<u8, PixelError> {
        let value = color::brightness(self.red()?, self.green()?, self.blue()?);
        self.min_brightness.fill(value);
        self.max_brightness.fill(value);
        Ok(value)
    }

    // --- Writing ---

    /// Set alpha. Derived channels are unaffected.
    pub fn set_alpha(&mut self, alpha: u8) {
        self.alpha.set(alpha);
    }

    /// Set red and invalidate brightness and hue.
    pub fn set_red(&mut self, red: u8) {
        self.red.set(red);
        self.rgb_changed();
    }

    /// Set green and invalidate brightness and hue.
    pub fn set_green(&mut self, green: u8) {
        self.green.set(green);
        self.rgb_changed();
    }

    /// Set blue and invalidate brightness and hue.
    pub fn set_blue(&mut self, blue: u8) {
        self.blue.set(blue);
        self.rgb_changed();
    }

    /// Override min-brightness until red, green or blue change.
    pub fn set_min_brightness(&mut self, value: u8) {
        self.min_brightness.set(value);
    }

    /// Override max-brightness until red, green or blue change.
    pub fn set_max_brightness(&mut self, value: u8) {
        self.max_brightness.set(value);
    }

    /// Override hue until red, green or blue change.
    pub fn set_hue(&mut self, degrees: f64) {
        self.hue.set(degrees);
    }

    /// Set all four base channels.
    pub fn set_argb(&mut self, alpha: u8, red: u8, green: u8, blue: u8) {
        self.set_alpha(alpha);
        self.set_red(red);
        self.set_green(green);
        self.set_blue(blue);
    }

    /// Set all four base channels from a packed `0xAARRGGBB` value.
    pub fn set_argb_packed(&mut self, argb: u32) {
        let (alpha, red, green, blue) = color::unpack_argb(argb);
        self.set_argb(alpha, red, green, blue);
    }

    /// Set all four base channels from the cell of `surface` at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::OutOfBounds`] if `(x, y)` is outside the
    /// surface; the pixel is left unchanged.
    pub fn set_argb_from_surface<S>(&mut self, surface: &S, x: u32, y: u32) -> Result<(), PixelError>
    where
        S: RasterSurface + ?Sized,
    {
        let c = surface.sample(x, y)?;
        self.set_argb(c.alpha, c.red, c.green, c.blue);
        Ok(())
    }

    /// Mark `channel` unavailable without assigning a value.
    ///
    /// Invalidating red, green or blue also invalidates the derived
    /// channels; a later read of those then fails until the base channel
    /// is set again.
    pub fn invalidate(&mut self, channel: Channel) {
        match channel {
            Channel::Alpha => self.alpha.invalidate(),
            Channel::Red => self.red.invalidate(),
            Channel::Green => self.green.invalidate(),
            Channel::Blue => self.blue.invalidate(),
            Channel::MinBrightness => self.min_brightness.invalidate(),
            Channel::MaxBrightness => self.max_brightness.invalidate(),
            Channel::Hue => self.hue.invalidate(),
        }
        if channel.is_rgb() {
            self.rgb_changed();
        }
    }

    fn rgb_changed(&mut self) {
        self.min_brightness.invalidate();
        self.max_brightness.invalidate();
        self.hue.invalidate();
    }

    // --- Comparison ---

    /// Whether red, green and blue are exactly equal. Alpha is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if an RGB channel of
    /// either pixel was invalidated.
    pub fn is_rgb_same(&self, other: &Self) -> Result<bool, PixelError> {
        Ok(self.red.is_same(&other.red)?
            && self.green.is_same(&other.green)?
            && self.blue.is_same(&other.blue)?)
    }

    /// Whether red, green, blue and alpha are each within `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if a needed channel of
    /// either pixel or of `tolerance` has no value.
    pub fn is_argb_similar(&self, other: &Self, tolerance: &Self) -> Result<bool, PixelError> {
        Ok(self.red.is_color_similar(&other.red, tolerance)?
            && self.green.is_color_similar(&other.green, tolerance)?
            && self.blue.is_color_similar(&other.blue, tolerance)?
            && self.alpha.is_color_similar(&other.alpha, tolerance)?)
    }

    /// Whether alpha and min-brightness are within `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if a needed channel of
    /// either pixel or of `tolerance` has no value.
    pub fn is_pixel_brightness_similar(
        &self,
        other: &Self,
        tolerance: &Self,
    ) -> Result<bool, PixelError> {
        if !self.alpha.is_color_similar(&other.alpha, tolerance)? {
            return Ok(false);
        }
        self.min_brightness()?;
        other.min_brightness()?;
        self.min_brightness
            .is_color_similar(&other.min_brightness, tolerance)
    }

    /// Whether the min-brightness difference exceeds the tolerance
    /// pixel's max-brightness.
    ///
    /// The threshold deliberately comes from the max-brightness slot; the
    /// tolerance presets are tuned around that mapping.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if a needed channel of
    /// either pixel or of `tolerance` has no value.
    pub fn is_contrasting(&self, other: &Self, tolerance: &Self) -> Result<bool, PixelError> {
        let difference = self.min_brightness()?.abs_diff(other.min_brightness()?);
        Ok(difference > tolerance.max_brightness()?)
    }
}

impl PartialEq for Pixel {
    fn eq(&self, other: &Self) -> bool {
        self.alpha.get() == other.alpha.get()
            && self.red.get() == other.red.get()
            && self.green.get() == other.green.get()
            && self.blue.get() == other.blue.get()
            && self.min_brightness() == other.min_brightness()
            && self.max_brightness() == other.max_brightness()
            && self.hue() == other.hue()
    }
}

impl From<Argb> for Pixel {
    fn from(color: Argb) -> Self {
        Self::new(color.alpha, color.red, color.green, color.blue)
    }
}

/// Serde-compatible proxy for `Pixel`.
///
/// Base channels are always stored. Brightness and hue are stored only
/// when they currently hold a value, so overrides such as a hue tolerance
/// survive a round trip.
#[derive(Serialize, Deserialize)]
struct PixelProxy {
    alpha: u8,
    red: u8,
    green: u8,
    blue: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hue: Option<f64>,
}

impl Serialize for Pixel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let color = self.argb().map_err(serde::ser::Error::custom)?;
        let proxy = PixelProxy {
            alpha: color.alpha,
            red: color.red,
            green: color.green,
            blue: color.blue,
            min_brightness: self.min_brightness.get().ok(),
            max_brightness: self.max_brightness.get().ok(),
            hue: self.hue.get().ok(),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pixel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PixelProxy::deserialize(deserializer)?;
        let mut pixel = Self::new(proxy.alpha, proxy.red, proxy.green, proxy.blue);
        if let Some(value) = proxy.min_brightness {
            pixel.set_min_brightness(value);
        }
        if let Some(value) = proxy.max_brightness {
            pixel.set_max_brightness(value);
        }
        if let Some(degrees) = proxy.hue {
            pixel.set_hue(degrees);
        }
        Ok(pixel)
    }
}
