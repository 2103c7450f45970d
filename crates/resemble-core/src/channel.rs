//! Pixel channels and their cached values.
//!
//! A [`Channel`] names one independently toleranced component of a
//! [`Pixel`](crate::Pixel). A [`ChannelValue`] holds the current value of
//! one channel together with its availability: a value is available once it
//! has been set (directly or by derivation) and becomes unavailable again
//! when it is invalidated.
//!
//! Derived channels are filled lazily through a shared reference, so the
//! slot is a [`OnceLock`]. Clearing a slot needs `&mut`, which is what makes
//! invalidation and derivation impossible to interleave on one pixel.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::types::PixelError;

/// The seven channels of a pixel, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Opacity, 0 (transparent) to 255 (opaque).
    Alpha,
    /// Red intensity, 0 to 255.
    Red,
    /// Green intensity, 0 to 255.
    Green,
    /// Blue intensity, 0 to 255.
    Blue,
    /// Lower brightness bound, 0 to 255. Derived from red, green and blue.
    MinBrightness,
    /// Upper brightness bound, 0 to 255. Derived from red, green and blue.
    MaxBrightness,
    /// Hue angle in degrees, `[0, 360)`. Derived from red, green and blue.
    Hue,
}

impl Channel {
    /// Every channel, in enumeration order.
    pub const ALL: [Self; 7] = [
        Self::Alpha,
        Self::Red,
        Self::Green,
        Self::Blue,
        Self::MinBrightness,
        Self::MaxBrightness,
        Self::Hue,
    ];

    /// Position of the channel in [`Channel::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the channel is computed from red, green and blue on demand.
    #[must_use]
    pub const fn is_derived(self) -> bool {
        matches!(self, Self::MinBrightness | Self::MaxBrightness | Self::Hue)
    }

    /// Whether writing this channel invalidates the derived channels.
    #[must_use]
    pub const fn is_rgb(self) -> bool {
        matches!(self, Self::Red | Self::Green | Self::Blue)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alpha => f.write_str("ALPHA"),
            Self::Red => f.write_str("RED"),
            Self::Green => f.write_str("GREEN"),
            Self::Blue => f.write_str("BLUE"),
            Self::MinBrightness => f.write_str("MIN_BRIGHTNESS"),
            Self::MaxBrightness => f.write_str("MAX_BRIGHTNESS"),
            Self::Hue => f.write_str("HUE"),
        }
    }
}

/// The value slot of a single channel.
///
/// Created either empty ([`ChannelValue::unavailable`]) or seeded
/// ([`ChannelValue::with_value`]). Reading an empty slot fails with
/// [`PixelError::ValueUnavailable`]; derivation is the owning pixel's job.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelValue<T> {
    channel: Channel,
    value: OnceLock<T>,
}

impl<T: Copy> ChannelValue<T> {
    /// An empty slot for `channel`.
    #[must_use]
    pub const fn unavailable(channel: Channel) -> Self {
        Self {
            channel,
            value: OnceLock::new(),
        }
    }

    /// A slot for `channel` already holding `value`.
    #[must_use]
    pub fn with_value(channel: Channel, value: T) -> Self {
        Self {
            channel,
            value: OnceLock::from(value),
        }
    }

    /// The channel this slot belongs to.
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Whether a value is currently stored.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.value.get().is_some()
    }

    /// The stored value.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if nothing is stored.
    pub fn get(&self) -> Result<T, PixelError> {
        self.value
            .get()
            .copied()
            .ok_or(PixelError::ValueUnavailable(self.channel))
    }

    /// Store `value` and mark the slot available.
    pub fn set(&mut self, value: T) {
        self.value = OnceLock::from(value);
    }

    /// Mark the slot unavailable, discarding the stored value.
    pub fn invalidate(&mut self) {
        self.value.take();
    }

    /// Return the stored value, or compute it with `derive` and store it.
    ///
    /// A failing `derive` leaves the slot unavailable.
    pub(crate) fn get_or_derive(
        &self,
        derive: impl FnOnce() -> Result<T, PixelError>,
    ) -> Result<T, PixelError> {
        if let Some(value) = self.value.get() {
            return Ok(*value);
        }
        let value = derive()?;
        Ok(*self.value.get_or_init(|| value))
    }

    /// Fill an empty slot through a shared reference.
    ///
    /// Used when one derivation produces several channels at once. A slot
    /// that already holds a value keeps it.
    pub(crate) fn fill(&self, value: T) {
        let _ = self.value.set(value);
    }
}

impl<T: Copy + PartialEq> ChannelValue<T> {
    /// Exact equality of the stored values.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if either slot is empty.
    pub fn is_same(&self, other: &Self) -> Result<bool, PixelError> {
        Ok(self.get()? == other.get()?)
    }
}

impl<T: Copy + Into<f64>> ChannelValue<T> {
    /// Whether `|self - other|` is within the tolerance pixel's threshold
    /// for this slot's channel.
    ///
    /// The threshold is looked up by this slot's own channel kind, so a
    /// red slot is compared against the tolerance pixel's red value and a
    /// hue slot against its hue.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::ValueUnavailable`] if either slot is empty or
    /// the tolerance value cannot be produced.
    pub fn is_color_similar(
        &self,
        other: &Self,
        tolerance: &crate::Pixel,
    ) -> Result<bool, PixelError> {
        let difference = (self.get()?.into() - other.get()?.into()).abs();
        Ok(difference <= tolerance.value(self.channel)?)
    }
}

impl<T: Copy + fmt::Display> fmt::Display for ChannelValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(value) => write!(f, "{}={value}", self.channel),
            None => write!(f, "{}=-", self.channel),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Pixel;

    #[test]
    fn channel_order_matches_index() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn only_brightness_and_hue_are_derived() {
        let derived: Vec<Channel> = Channel::ALL
            .into_iter()
            .filter(|c| c.is_derived())
            .collect();
        assert_eq!(
            derived,
            vec![Channel::MinBrightness, Channel::MaxBrightness, Channel::Hue]
        );
    }

    #[test]
    fn unavailable_slot_fails_to_read() {
        let slot = ChannelValue::<u8>::unavailable(Channel::Alpha);
        assert!(!slot.is_available());
        assert!(matches!(
            slot.get(),
            Err(PixelError::ValueUnavailable(Channel::Alpha))
        ));
    }

    #[test]
    fn set_marks_available() {
        let mut slot = ChannelValue::<u8>::unavailable(Channel::Red);
        slot.set(42);
        assert!(slot.is_available());
        assert_eq!(slot.get().unwrap(), 42);

        slot.set(7);
        assert_eq!(slot.get().unwrap(), 7);
    }

    #[test]
    fn invalidate_discards_value() {
        let mut slot = ChannelValue::with_value(Channel::Green, 10_u8);
        slot.invalidate();
        assert!(!slot.is_available());
        assert!(slot.get().is_err());
    }

    #[test]
    fn get_or_derive_only_runs_once() {
        let slot = ChannelValue::<u8>::unavailable(Channel::MinBrightness);
        let mut calls = 0;
        let first = slot
            .get_or_derive(|| {
                calls += 1;
                Ok(99)
            })
            .unwrap();
        let second = slot.get_or_derive(|| Ok(1)).unwrap();
        assert_eq!((first, second, calls), (99, 99, 1));
    }

    #[test]
    fn failed_derivation_leaves_slot_empty() {
        let slot = ChannelValue::<u8>::unavailable(Channel::MinBrightness);
        let result = slot.get_or_derive(|| Err(PixelError::ValueUnavailable(Channel::Red)));
        assert!(matches!(
            result,
            Err(PixelError::ValueUnavailable(Channel::Red))
        ));
        assert!(!slot.is_available());
    }

    #[test]
    fn is_same_is_exact() {
        let a = ChannelValue::with_value(Channel::Blue, 100_u8);
        let b = ChannelValue::with_value(Channel::Blue, 100_u8);
        let c = ChannelValue::with_value(Channel::Blue, 101_u8);
        assert!(a.is_same(&b).unwrap());
        assert!(!a.is_same(&c).unwrap());
    }

    #[test]
    fn is_color_similar_uses_own_channel_threshold() {
        // Red tolerance 10, blue tolerance 0.
        let tolerance = Pixel::new(0, 10, 0, 0);

        let red_a = ChannelValue::with_value(Channel::Red, 100_u8);
        let red_b = ChannelValue::with_value(Channel::Red, 110_u8);
        let red_c = ChannelValue::with_value(Channel::Red, 111_u8);
        assert!(red_a.is_color_similar(&red_b, &tolerance).unwrap());
        assert!(!red_a.is_color_similar(&red_c, &tolerance).unwrap());

        let blue_a = ChannelValue::with_value(Channel::Blue, 100_u8);
        let blue_b = ChannelValue::with_value(Channel::Blue, 101_u8);
        assert!(!blue_a.is_color_similar(&blue_b, &tolerance).unwrap());
    }

    #[test]
    fn display_shows_missing_values() {
        let slot = ChannelValue::<f64>::unavailable(Channel::Hue);
        assert_eq!(slot.to_string(), "HUE=-");
        let slot = ChannelValue::with_value(Channel::Alpha, 255_u8);
        assert_eq!(slot.to_string(), "ALPHA=255");
    }
}
