//! Raster surfaces: width x height grids of ARGB cells.
//!
//! The comparison core never decodes or allocates images itself. It reads
//! and writes cells through [`RasterSurface`] and [`RasterSurfaceMut`],
//! implemented here for [`image::RgbaImage`] and for [`RowSurface`], a
//! single mutable row of an RGBA buffer that lets parallel workers each
//! own one output row.

use image::{DynamicImage, Rgba, RgbaImage};

use crate::color::Argb;
use crate::types::{CompareError, Dimensions, PixelError};

/// Bytes per RGBA8 cell.
pub const BYTES_PER_PIXEL: usize = 4;

/// Read access to a grid of ARGB cells.
pub trait RasterSurface {
    /// Width and height of the grid.
    fn dimensions(&self) -> Dimensions;

    /// Read the cell at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::OutOfBounds`] if `(x, y)` is not readable.
    fn sample(&self, x: u32, y: u32) -> Result<Argb, PixelError>;
}

/// Write access to a grid of ARGB cells.
pub trait RasterSurfaceMut: RasterSurface {
    /// Overwrite the cell at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`PixelError::OutOfBounds`] if `(x, y)` is not writable.
    fn write(&mut self, x: u32, y: u32, color: Argb) -> Result<(), PixelError>;
}

impl From<Rgba<u8>> for Argb {
    fn from(Rgba([red, green, blue, alpha]): Rgba<u8>) -> Self {
        Self::new(alpha, red, green, blue)
    }
}

impl From<Argb> for Rgba<u8> {
    fn from(color: Argb) -> Self {
        Self([color.red, color.green, color.blue, color.alpha])
    }
}

const fn out_of_bounds(x: u32, y: u32, dimensions: Dimensions) -> PixelError {
    PixelError::OutOfBounds {
        x,
        y,
        width: dimensions.width,
        height: dimensions.height,
    }
}

impl RasterSurface for RgbaImage {
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    fn sample(&self, x: u32, y: u32) -> Result<Argb, PixelError> {
        self.get_pixel_checked(x, y)
            .map(|p| Argb::from(*p))
            .ok_or_else(|| out_of_bounds(x, y, RasterSurface::dimensions(self)))
    }
}

impl RasterSurfaceMut for RgbaImage {
    fn write(&mut self, x: u32, y: u32, color: Argb) -> Result<(), PixelError> {
        let dimensions = RasterSurface::dimensions(self);
        let cell = self
            .get_pixel_mut_checked(x, y)
            .ok_or_else(|| out_of_bounds(x, y, dimensions))?;
        *cell = color.into();
        Ok(())
    }
}

/// One mutable row of an RGBA8 buffer, addressed in full-image coordinates.
///
/// Only cells on row `y` are accessible; every other coordinate is
/// reported as out of bounds.
#[derive(Debug)]
pub struct RowSurface<'a> {
    row: &'a mut [u8],
    y: u32,
    dimensions: Dimensions,
}

impl<'a> RowSurface<'a> {
    /// Wrap `row`, the raw bytes of row `y` of an image of `dimensions`.
    ///
    /// `row` must hold `dimensions.width * 4` bytes; shorter rows make the
    /// missing cells inaccessible.
    #[must_use]
    pub const fn new(row: &'a mut [u8], y: u32, dimensions: Dimensions) -> Self {
        Self {
            row,
            y,
            dimensions,
        }
    }

    /// The image row this surface covers.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    fn offset(&self, x: u32, y: u32) -> Result<usize, PixelError> {
        let start = x as usize * BYTES_PER_PIXEL;
        if y != self.y || x >= self.dimensions.width || start + BYTES_PER_PIXEL > self.row.len()
        {
            return Err(out_of_bounds(x, y, self.dimensions));
        }
        Ok(start)
    }
}

impl RasterSurface for RowSurface<'_> {
    fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    fn sample(&self, x: u32, y: u32) -> Result<Argb, PixelError> {
        let i = self.offset(x, y)?;
        let cell = &self.row[i..i + BYTES_PER_PIXEL];
        Ok(Argb::new(cell[3], cell[0], cell[1], cell[2]))
    }
}

impl RasterSurfaceMut for RowSurface<'_> {
    fn write(&mut self, x: u32, y: u32, color: Argb) -> Result<(), PixelError> {
        let i = self.offset(x, y)?;
        self.row[i..i + BYTES_PER_PIXEL]
            .copy_from_slice(&[color.red, color.green, color.blue, color.alpha]);
        Ok(())
    }
}

/// Borrow `image` as 8-bit RGBA.
///
/// # Errors
///
/// Returns [`CompareError::InvalidSurfaceType`] if `image` uses any other
/// color type. `name` identifies the input in the error message.
pub fn ensure_rgba8<'a>(image: &'a DynamicImage, name: &str) -> Result<&'a RgbaImage, CompareError> {
    image
        .as_rgba8()
        .ok_or_else(|| CompareError::InvalidSurfaceType {
            name: name.to_owned(),
            found: format!("{:?}", image.color()),
        })
}

/// Check that two surfaces share the same width and height.
///
/// # Errors
///
/// Returns [`CompareError::DimensionMismatch`] if they differ.
pub fn check_dimensions_match<A, B>(first: &A, second: &B) -> Result<Dimensions, CompareError>
where
    A: RasterSurface + ?Sized,
    B: RasterSurface + ?Sized,
{
    let (a, b) = (first.dimensions(), second.dimensions());
    if a == b {
        Ok(a)
    } else {
        Err(CompareError::DimensionMismatch {
            first: a,
            second: b,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rgba_image_sample_reorders_channels() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 40]));
        assert_eq!(img.sample(1, 1).unwrap(), Argb::new(40, 10, 20, 30));
    }

    #[test]
    fn rgba_image_sample_out_of_bounds() {
        let img = RgbaImage::new(2, 3);
        assert_eq!(
            img.sample(2, 0),
            Err(PixelError::OutOfBounds {
                x: 2,
                y: 0,
                width: 2,
                height: 3
            })
        );
    }

    #[test]
    fn rgba_image_write_then_sample() {
        let mut img = RgbaImage::new(3, 3);
        img.write(1, 2, Argb::new(255, 1, 2, 3)).unwrap();
        assert_eq!(img.get_pixel(1, 2), &Rgba([1, 2, 3, 255]));
        assert!(img.write(3, 0, Argb::default()).is_err());
    }

    #[test]
    fn row_surface_only_touches_its_row() {
        let dims = Dimensions::new(2, 4);
        let mut bytes = vec![0_u8; 2 * BYTES_PER_PIXEL];
        let mut row = RowSurface::new(&mut bytes, 3, dims);

        row.write(1, 3, Argb::new(9, 8, 7, 6)).unwrap();
        assert_eq!(row.sample(1, 3).unwrap(), Argb::new(9, 8, 7, 6));
        assert!(row.write(0, 2, Argb::default()).is_err());
        assert!(row.sample(2, 3).is_err());
        assert_eq!(bytes, vec![0, 0, 0, 0, 8, 7, 6, 9]);
    }

    #[test]
    fn ensure_rgba8_accepts_rgba() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(1, 1));
        assert!(ensure_rgba8(&img, "first").is_ok());
    }

    #[test]
    fn ensure_rgba8_rejects_gray() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::new(1, 1));
        let err = ensure_rgba8(&img, "second").unwrap_err();
        assert!(matches!(
            err,
            CompareError::InvalidSurfaceType { ref name, ref found } if name == "second" && found == "L8"
        ));
    }

    #[test]
    fn dimension_check() {
        let a = RgbaImage::new(4, 5);
        let b = RgbaImage::new(4, 5);
        let c = RgbaImage::new(5, 4);
        assert_eq!(check_dimensions_match(&a, &b).unwrap(), Dimensions::new(4, 5));
        assert!(matches!(
            check_dimensions_match(&a, &c),
            Err(CompareError::DimensionMismatch { .. })
        ));
    }
}
