//! Shared types for the resemble comparison core.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;

/// Re-export `RgbaImage` so downstream crates can hand rasters to the
/// comparison without depending on `image` directly.
pub use image::RgbaImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether `(x, y)` lies inside the grid.
    #[must_use]
    pub const fn contains(self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }
}

/// Bounding box of all mismatched pixels, inclusive on every side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffBounds {
    /// Leftmost mismatched column.
    pub left: u32,
    /// Topmost mismatched row.
    pub top: u32,
    /// Rightmost mismatched column.
    pub right: u32,
    /// Bottommost mismatched row.
    pub bottom: u32,
}

impl DiffBounds {
    /// Bounds covering the single pixel `(x, y)`.
    #[must_use]
    pub const fn at(x: u32, y: u32) -> Self {
        Self {
            left: x,
            top: y,
            right: x,
            bottom: y,
        }
    }

    /// Grow the bounds to include `(x, y)`.
    pub fn include(&mut self, x: u32, y: u32) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x);
        self.bottom = self.bottom.max(y);
    }

    /// Smallest bounds covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Width of the box in pixels.
    #[must_use]
    pub const fn width(self) -> u32 {
        self.right - self.left + 1
    }

    /// Height of the box in pixels.
    #[must_use]
    pub const fn height(self) -> u32 {
        self.bottom - self.top + 1
    }
}

/// Errors raised by the pixel color algebra.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PixelError {
    /// A channel was read before being set and could not be derived.
    #[error("channel {0} has no value")]
    ValueUnavailable(Channel),

    /// A raster surface was accessed outside its grid.
    #[error("coordinate ({x}, {y}) is outside the {width}x{height} surface")]
    OutOfBounds {
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
        /// Surface width.
        width: u32,
        /// Surface height.
        height: u32,
    },
}

/// Errors that can occur while comparing two images.
///
/// Uses custom `Serialize`/`Deserialize` through a proxy enum so
/// a failed comparison can be reported as JSON.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompareError {
    /// The two images (or an image and the output) differ in size.
    #[error(
        "size mismatch (first {}x{}, second {}x{})",
        .first.width,
        .first.height,
        .second.width,
        .second.height
    )]
    DimensionMismatch {
        /// Dimensions of the first image.
        first: Dimensions,
        /// Dimensions of the second image.
        second: Dimensions,
    },

    /// An image is not stored as 8-bit RGBA.
    #[error("invalid {name} surface type {found}, expected Rgba8")]
    InvalidSurfaceType {
        /// Which input was rejected.
        name: String,
        /// The color type that was found.
        found: String,
    },

    /// Analysis options are out of range.
    #[error("invalid analysis options: {0}")]
    InvalidOptions(String),

    /// A per-pixel operation failed.
    #[error(transparent)]
    Pixel(#[from] PixelError),

    /// A per-pixel failure known only by its message, as read back from a
    /// serialized [`CompareError::Pixel`].
    #[error("{0}")]
    PixelMessage(String),
}

/// Serde-compatible proxy for `CompareError`.
///
/// `PixelError` is flattened to its `Display` string; deserializing it
/// yields [`CompareError::PixelMessage`] carrying that message since the
/// channel or coordinate cannot be recovered from text.
#[derive(Serialize, Deserialize)]
enum CompareErrorProxy {
    DimensionMismatch {
        first: Dimensions,
        second: Dimensions,
    },
    InvalidSurfaceType {
        name: String,
        found: String,
    },
    InvalidOptions(String),
    Pixel(String),
}

impl Serialize for CompareError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::DimensionMismatch { first, second } => CompareErrorProxy::DimensionMismatch {
                first: *first,
                second: *second,
            },
            Self::InvalidSurfaceType { name, found } => CompareErrorProxy::InvalidSurfaceType {
                name: name.clone(),
                found: found.clone(),
            },
            Self::InvalidOptions(s) => CompareErrorProxy::InvalidOptions(s.clone()),
            Self::Pixel(e) => CompareErrorProxy::Pixel(e.to_string()),
            Self::PixelMessage(s) => CompareErrorProxy::Pixel(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompareError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = CompareErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            CompareErrorProxy::DimensionMismatch { first, second } => {
                Self::DimensionMismatch { first, second }
            }
            CompareErrorProxy::InvalidSurfaceType { name, found } => {
                Self::InvalidSurfaceType { name, found }
            }
            CompareErrorProxy::InvalidOptions(s) => Self::InvalidOptions(s),
            CompareErrorProxy::Pixel(msg) => Self::PixelMessage(msg),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_pixel_count_does_not_overflow() {
        let d = Dimensions::new(u32::MAX, 2);
        assert_eq!(d.pixel_count(), u64::from(u32::MAX) * 2);
    }

    #[test]
    fn dimensions_contains() {
        let d = Dimensions::new(3, 2);
        assert!(d.contains(0, 0));
        assert!(d.contains(2, 1));
        assert!(!d.contains(3, 0));
        assert!(!d.contains(0, 2));
    }

    #[test]
    fn diff_bounds_grow() {
        let mut bounds = DiffBounds::at(5, 5);
        bounds.include(2, 7);
        bounds.include(9, 1);
        assert_eq!(
            bounds,
            DiffBounds {
                left: 2,
                top: 1,
                right: 9,
                bottom: 7
            }
        );
        assert_eq!(bounds.width(), 8);
        assert_eq!(bounds.height(), 7);
    }

    #[test]
    fn diff_bounds_union() {
        let a = DiffBounds::at(1, 1);
        let b = DiffBounds::at(4, 0);
        assert_eq!(
            a.union(b),
            DiffBounds {
                left: 1,
                top: 0,
                right: 4,
                bottom: 1
            }
        );
    }

    #[test]
    fn error_value_unavailable_display() {
        let err = PixelError::ValueUnavailable(Channel::Hue);
        assert_eq!(err.to_string(), "channel HUE has no value");
    }

    #[test]
    fn error_dimension_mismatch_display() {
        let err = CompareError::DimensionMismatch {
            first: Dimensions::new(10, 20),
            second: Dimensions::new(10, 21),
        };
        assert_eq!(err.to_string(), "size mismatch (first 10x20, second 10x21)");
    }

    #[test]
    fn error_pixel_is_transparent() {
        let err = CompareError::from(PixelError::OutOfBounds {
            x: 4,
            y: 0,
            width: 4,
            height: 4,
        });
        assert_eq!(
            err.to_string(),
            "coordinate (4, 0) is outside the 4x4 surface"
        );
    }

    #[test]
    fn compare_error_serde_round_trip_dimension_mismatch() {
        let err = CompareError::DimensionMismatch {
            first: Dimensions::new(1, 2),
            second: Dimensions::new(3, 4),
        };
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: CompareError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn compare_error_serde_pixel_keeps_category_and_message() {
        let err = CompareError::Pixel(PixelError::ValueUnavailable(Channel::Red));
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: CompareError = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            deserialized,
            CompareError::PixelMessage(ref s) if s == "channel RED has no value"
        ));
        assert_eq!(deserialized.to_string(), err.to_string());

        // Serializing again yields the same document.
        assert_eq!(serde_json::to_string(&deserialized).unwrap(), json);
    }
}
