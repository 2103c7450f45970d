//! resemble-core: Perceptual pixel comparison (sans-IO).
//!
//! Compares two RGBA rasters pixel by pixel under per-channel tolerances:
//! sample -> classify (color, brightness, antialiasing) -> render.
//!
//! The building blocks are a [`Pixel`] whose brightness and hue are derived
//! lazily from its red, green and blue channels, the color math in
//! [`color`], and the [`ErrorPixel`] strategies that decide how mismatches
//! are drawn into the output raster.
//!
//! This crate has **no I/O dependencies**: it reads and writes in-memory
//! rasters through [`RasterSurface`]. Decoding, scaling and encoding live in
//! `resemble-cli`.

pub mod antialias;
pub mod channel;
pub mod color;
pub mod compare;
pub mod error_pixel;
pub mod options;
pub mod pixel;
pub mod surface;
pub mod types;

pub use channel::{Channel, ChannelValue};
pub use color::Argb;
pub use compare::{ComparisonResult, ComparisonSummary, compare, compare_dynamic};
pub use error_pixel::{ErrorPixel, ErrorPixelTransformer};
pub use options::AnalysisOptions;
pub use pixel::Pixel;
pub use surface::{RasterSurface, RasterSurfaceMut, RowSurface};
pub use types::{CompareError, DiffBounds, Dimensions, PixelError, RgbaImage};
