//! In-memory RGB image shared by every primitive and effect.

use crate::error::{ArtError, Result};
use crate::filters::{LumaPlane, calculate_luminance};
use image::{RgbImage, RgbaImage, imageops};
use serde::{Deserialize, Serialize};

pub use image::Rgb;

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// An RGB image with checked accessors
///
/// Width and height are always positive. Samples are stored row-major, so the
/// pixel at `(x, y)` lives at index `y * width + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    image: RgbImage,
}

impl PixelBuffer {
    /// Build a buffer from packed `R, G, B` samples
    pub fn from_raw(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        let expected = width as usize * height as usize * 3;
        if samples.len() != expected {
            return Err(ArtError::InvalidBuffer {
                reason: format!(
                    "expected {} samples for {}x{}, got {}",
                    expected,
                    width,
                    height,
                    samples.len()
                ),
            });
        }
        let image = RgbImage::from_raw(width, height, samples).ok_or_else(|| {
            ArtError::InvalidBuffer {
                reason: "sample container too small".to_string(),
            }
        })?;
        Ok(Self { image })
    }

    pub fn from_rgb_image(image: RgbImage) -> Result<Self> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self { image })
    }

    /// Build a buffer filled with a single colour
    pub fn from_pixel(width: u32, height: u32, color: Rgb<u8>) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            image: RgbImage::from_pixel(width, height, color),
        })
    }

    /// Build a buffer by evaluating `f` at every coordinate
    pub fn from_fn<F>(width: u32, height: u32, f: F) -> Result<Self>
    where
        F: FnMut(u32, u32) -> Rgb<u8>,
    {
        check_dimensions(width, height)?;
        Ok(Self {
            image: RgbImage::from_fn(width, height, f),
        })
    }

    /// Flatten an RGBA image over a solid background colour
    pub fn from_rgba(img: &RgbaImage, background: Rgb<u8>) -> Result<Self> {
        Self::from_fn(img.width(), img.height(), |x, y| {
            let p = img.get_pixel(x, y);
            let alpha = p[3] as u32;
            let blend = |fg: u8, bg: u8| -> u8 {
                ((fg as u32 * alpha + bg as u32 * (255 - alpha) + 127) / 255) as u8
            };
            Rgb([
                blend(p[0], background[0]),
                blend(p[1], background[1]),
                blend(p[2], background[2]),
            ])
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Number of pixels
    pub fn len(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Always false: buffers are never zero-area
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Full-buffer rectangle
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    pub fn get(&self, x: u32, y: u32) -> Result<Rgb<u8>> {
        self.check_coords(x, y)?;
        Ok(*self.image.get_pixel(x, y))
    }

    pub fn set(&mut self, x: u32, y: u32, color: Rgb<u8>) -> Result<()> {
        self.check_coords(x, y)?;
        self.image.put_pixel(x, y, color);
        Ok(())
    }

    /// Unchecked read for loops that already iterate inside the bounds
    #[inline]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn pixels(&self) -> impl ExactSizeIterator<Item = &Rgb<u8>> {
        self.image.pixels()
    }

    /// Packed `R, G, B` samples
    pub fn samples(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_rgb_image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb_image(self) -> RgbImage {
        self.image
    }

    /// Grey plane with values in [0, 1]
    pub fn luminance(&self) -> LumaPlane {
        calculate_luminance(self)
    }

    /// Intersect `rect` with the buffer
    ///
    /// Fails with [`ArtError::EmptyRegion`] when the rectangle has zero area or
    /// lies entirely outside the buffer.
    pub fn clamp_rect(&self, rect: Rect) -> Result<Rect> {
        let right = rect.right().min(self.width());
        let bottom = rect.bottom().min(self.height());
        if rect.is_empty() || rect.x >= right || rect.y >= bottom {
            return Err(ArtError::EmptyRegion {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            });
        }
        Ok(Rect::new(rect.x, rect.y, right - rect.x, bottom - rect.y))
    }

    /// Copy the in-bounds part of `rect` into a new buffer
    pub fn crop(&self, rect: Rect) -> Result<PixelBuffer> {
        let r = self.clamp_rect(rect)?;
        let view = imageops::crop_imm(&self.image, r.x, r.y, r.width, r.height);
        Ok(Self {
            image: view.to_image(),
        })
    }

    /// Mean colour of the in-bounds part of `rect`, rounded to the nearest integer
    pub fn block_average(&self, rect: Rect) -> Result<Rgb<u8>> {
        let r = self.clamp_rect(rect)?;
        let mut sums = [0u64; 3];
        for y in r.y..r.bottom() {
            for x in r.x..r.right() {
                let p = self.pixel(x, y);
                for (sum, &c) in sums.iter_mut().zip(p.0.iter()) {
                    *sum += c as u64;
                }
            }
        }
        let n = r.area();
        Ok(Rgb(sums.map(|s| ((s + n / 2) / n) as u8)))
    }

    /// Shrink so that the longest side is at most `max_dim`, keeping the aspect ratio
    ///
    /// Buffers that already fit are returned unchanged. Resampling uses Lanczos3.
    pub fn constrain(&self, max_dim: u32) -> Result<PixelBuffer> {
        if max_dim == 0 {
            return Err(ArtError::InvalidParameter {
                name: "max_dim",
                value: max_dim.to_string(),
                expected: ">= 1".to_string(),
            });
        }
        let (width, height) = self.dimensions();
        let longest = width.max(height);
        if longest <= max_dim {
            return Ok(self.clone());
        }

        let ratio = max_dim as f64 / longest as f64;
        let target_width = ((width as f64 * ratio) as u32).max(1);
        let target_height = ((height as f64 * ratio) as u32).max(1);
        log::debug!(
            "constraining {}x{} to {}x{}",
            width,
            height,
            target_width,
            target_height
        );

        let resized = imageops::resize(
            &self.image,
            target_width,
            target_height,
            imageops::FilterType::Lanczos3,
        );
        Ok(Self { image: resized })
    }

    fn check_coords(&self, x: u32, y: u32) -> Result<()> {
        if x >= self.width() || y >= self.height() {
            return Err(ArtError::OutOfBounds {
                x,
                y,
                width: self.width(),
                height: self.height(),
            });
        }
        Ok(())
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ArtError::InvalidBuffer {
            reason: format!("dimensions must be positive, got {}x{}", width, height),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 0]))
            .unwrap()
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        let err = PixelBuffer::from_raw(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(err, ArtError::InvalidBuffer { .. }));
    }

    #[test]
    fn test_from_raw_rejects_zero_dimensions() {
        assert!(PixelBuffer::from_raw(0, 4, vec![]).is_err());
        assert!(PixelBuffer::from_pixel(4, 0, Rgb([0, 0, 0])).is_err());
    }

    #[test]
    fn test_from_raw_index_layout() {
        let samples = vec![1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 4];
        let buf = PixelBuffer::from_raw(2, 2, samples).unwrap();
        // index = y * width + x
        assert_eq!(buf.get(1, 0).unwrap(), Rgb([2, 2, 2]));
        assert_eq!(buf.get(0, 1).unwrap(), Rgb([3, 3, 3]));
    }

    #[test]
    fn test_get_out_of_bounds() {
        let buf = gradient(4, 3);
        assert_eq!(
            buf.get(4, 0),
            Err(ArtError::OutOfBounds {
                x: 4,
                y: 0,
                width: 4,
                height: 3
            })
        );
        assert!(buf.get(0, 3).is_err());
    }

    #[test]
    fn test_set_then_get() {
        let mut buf = gradient(4, 3);
        buf.set(3, 2, Rgb([9, 8, 7])).unwrap();
        assert_eq!(buf.get(3, 2).unwrap(), Rgb([9, 8, 7]));
        assert!(buf.set(5, 5, Rgb([0, 0, 0])).is_err());
    }

    #[test]
    fn test_block_average_clamps_to_edge() {
        let buf = PixelBuffer::from_fn(4, 4, |x, _| {
            if x < 3 { Rgb([0, 0, 0]) } else { Rgb([200, 100, 50]) }
        })
        .unwrap();
        // Only column 3 is inside the rectangle once clamped
        let avg = buf.block_average(Rect::new(3, 0, 10, 10)).unwrap();
        assert_eq!(avg, Rgb([200, 100, 50]));
    }

    #[test]
    fn test_block_average_rounds() {
        let buf = PixelBuffer::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([3, 1, 255]) }
        })
        .unwrap();
        assert_eq!(buf.block_average(buf.bounds()).unwrap(), Rgb([2, 1, 128]));
    }

    #[test]
    fn test_block_average_zero_area_is_error() {
        let buf = gradient(4, 4);
        assert!(matches!(
            buf.block_average(Rect::new(0, 0, 0, 2)),
            Err(ArtError::EmptyRegion { .. })
        ));
        assert!(buf.block_average(Rect::new(8, 8, 2, 2)).is_err());
    }

    #[test]
    fn test_crop() {
        let buf = gradient(6, 6);
        let cropped = buf.crop(Rect::new(4, 4, 5, 5)).unwrap();
        assert_eq!(cropped.dimensions(), (2, 2));
        assert_eq!(cropped.get(0, 0).unwrap(), buf.get(4, 4).unwrap());
    }

    #[test]
    fn test_constrain_keeps_small_buffers() {
        let buf = gradient(10, 5);
        assert_eq!(buf.constrain(800).unwrap(), buf);
    }

    #[test]
    fn test_constrain_preserves_aspect() {
        let buf = gradient(20, 10);
        let small = buf.constrain(10).unwrap();
        assert_eq!(small.dimensions(), (10, 5));
        assert!(buf.constrain(0).is_err());
    }

    #[test]
    fn test_from_rgba_flattens_alpha() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 0, 0, 0]));
        let buf = PixelBuffer::from_rgba(&img, Rgb([255, 255, 255])).unwrap();
        assert_eq!(buf.get(0, 0).unwrap(), Rgb([255, 0, 0]));
        assert_eq!(buf.get(1, 0).unwrap(), Rgb([255, 255, 255]));
    }
}
