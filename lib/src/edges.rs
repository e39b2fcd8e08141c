use crate::buffer::PixelBuffer;
use crate::config::check_range;
use crate::error::{ArtError, Result};
use crate::filters::{calculate_luminance, gaussian_blur, sobel_gradients};
use image::Rgb;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Bound;

/// Gradient direction quantised into the four sectors used by non-maximum suppression
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GradientSector {
    Horizontal,   // 0°: compare left/right neighbours
    Diagonal,     // 45°: compare down-right/up-left
    Vertical,     // 90°: compare up/down
    AntiDiagonal, // 135°: compare down-left/up-right
}

impl GradientSector {
    /// Pixel offsets of the two neighbours lying along the gradient
    pub fn neighbour_offsets(self) -> [(i32, i32); 2] {
        match self {
            GradientSector::Horizontal => [(-1, 0), (1, 0)],
            GradientSector::Diagonal => [(1, 1), (-1, -1)],
            GradientSector::Vertical => [(0, -1), (0, 1)],
            GradientSector::AntiDiagonal => [(-1, 1), (1, -1)],
        }
    }
}

/// Classify a gradient angle
///
/// # Arguments
/// * `angle` - Gradient angle in radians from atan2(Gy, Gx), y pointing down
pub fn classify_gradient(angle: f32) -> GradientSector {
    // Fold into [0, 180)
    let mut degrees = angle.to_degrees();
    if degrees < 0.0 {
        degrees += 180.0;
    }
    if degrees >= 180.0 {
        degrees -= 180.0;
    }

    if !(22.5..157.5).contains(&degrees) {
        GradientSector::Horizontal
    } else if degrees < 67.5 {
        GradientSector::Diagonal
    } else if degrees < 112.5 {
        GradientSector::Vertical
    } else {
        GradientSector::AntiDiagonal
    }
}

/// Canny-style edge detector settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDetector {
    /// Gaussian smoothing sigma, (0, 5]
    pub sigma: f32,
    /// Weak edge threshold on gradient magnitude
    pub low_threshold: f32,
    /// Strong edge threshold on gradient magnitude
    pub high_threshold: f32,
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self {
            sigma: 2.0,
            low_threshold: 0.1,
            high_threshold: 0.2,
        }
    }
}

impl EdgeDetector {
    pub fn with_sigma(sigma: f32) -> Self {
        Self {
            sigma,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_range(
            "sigma",
            self.sigma,
            (Bound::Excluded(0.0), Bound::Included(5.0)),
        )?;
        check_range(
            "low_threshold",
            self.low_threshold,
            (Bound::Excluded(0.0), Bound::Unbounded),
        )?;
        check_range("high_threshold", self.high_threshold, self.low_threshold..)?;
        Ok(())
    }

    /// Run the full detection pipeline
    ///
    /// 1. Luminance
    /// 2. 5-tap Gaussian smoothing
    /// 3. Sobel gradients, magnitude and direction
    /// 4. Non-maximum suppression along the gradient
    /// 5. Double threshold with 8-connected hysteresis
    pub fn detect(&self, buf: &PixelBuffer) -> Result<EdgeMap> {
        self.validate()?;
        let (width, height) = buf.dimensions();

        let lum = calculate_luminance(buf);
        let smoothed = gaussian_blur(&lum, self.sigma);
        let (gx, gy) = sobel_gradients(&smoothed);

        let magnitude: Vec<f32> = gx
            .as_raw()
            .iter()
            .zip(gy.as_raw().iter())
            .map(|(&x, &y)| (x * x + y * y).sqrt())
            .collect();

        let suppressed = non_maximum_suppression(&magnitude, gx.as_raw(), gy.as_raw(), width, height)?;
        let edges = hysteresis(
            &suppressed,
            width,
            height,
            self.low_threshold,
            self.high_threshold,
        )?;

        log::debug!(
            "edge detection on {}x{} (sigma {}): {} edge pixels",
            width,
            height,
            self.sigma,
            edges.iter().filter(|&&e| e).count()
        );

        Ok(EdgeMap {
            width,
            height,
            magnitude: suppressed,
            edges,
        })
    }
}

/// Thin gradient ridges to single-pixel lines
///
/// Border pixels are always suppressed. Every plane must hold exactly
/// `width * height` values.
pub fn non_maximum_suppression(
    magnitude: &[f32],
    gx: &[f32],
    gy: &[f32],
    width: u32,
    height: u32,
) -> Result<Vec<f32>> {
    check_plane("magnitude", magnitude, width, height)?;
    check_plane("gx", gx, width, height)?;
    check_plane("gy", gy, width, height)?;
    let w = width as i32;
    let h = height as i32;

    let suppressed: Vec<f32> = (0..magnitude.len())
        .into_par_iter()
        .map(|idx| {
            let x = idx as i32 % w;
            let y = idx as i32 / w;
            if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
                return 0.0;
            }

            let m = magnitude[idx];
            if m <= 0.0 {
                return 0.0;
            }

            let sector = classify_gradient(gy[idx].atan2(gx[idx]));
            let is_max = sector.neighbour_offsets().iter().all(|&(dx, dy)| {
                let n = ((y + dy) * w + (x + dx)) as usize;
                m >= magnitude[n]
            });

            if is_max { m } else { 0.0 }
        })
        .collect();
    Ok(suppressed)
}

/// Keep strong pixels and every weak pixel 8-connected to one
pub fn hysteresis(suppressed: &[f32], width: u32, height: u32, low: f32, high: f32) -> Result<Vec<bool>> {
    check_plane("suppressed", suppressed, width, height)?;
    let w = width as i32;
    let h = height as i32;
    let mut edges = vec![false; suppressed.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (idx, &m) in suppressed.iter().enumerate() {
        if m >= high && !edges[idx] {
            edges[idx] = true;
            stack.push(idx);

            while let Some(current) = stack.pop() {
                let cx = current as i32 % w;
                let cy = current as i32 / w;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        let nx = cx + dx;
                        let ny = cy + dy;
                        if (dx == 0 && dy == 0) || nx < 0 || ny < 0 || nx >= w || ny >= h {
                            continue;
                        }
                        let n = (ny * w + nx) as usize;
                        if !edges[n] && suppressed[n] >= low {
                            edges[n] = true;
                            stack.push(n);
                        }
                    }
                }
            }
        }
    }

    Ok(edges)
}

fn check_plane(name: &str, plane: &[f32], width: u32, height: u32) -> Result<()> {
    let expected = width as u64 * height as u64;
    if plane.len() as u64 != expected {
        return Err(ArtError::InvalidBuffer {
            reason: format!(
                "{} plane holds {} values, expected {} for {}x{}",
                name,
                plane.len(),
                expected,
                width,
                height
            ),
        });
    }
    Ok(())
}

/// Result of edge detection
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    width: u32,
    height: u32,
    magnitude: Vec<f32>,
    edges: Vec<bool>,
}

impl EdgeMap {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether `(x, y)` is an edge; coordinates outside the map are not
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.edges[(y * self.width + x) as usize]
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|&&e| e).count()
    }

    /// Suppressed gradient magnitude at each pixel
    pub fn magnitude(&self) -> &[f32] {
        &self.magnitude
    }

    /// Render as a greyscale buffer
    ///
    /// # Arguments
    /// * `soft` - Keep relative magnitude instead of pure white edges
    /// * `invert` - Dark strokes on a light background
    pub fn to_buffer(&self, soft: bool, invert: bool) -> Result<PixelBuffer> {
        let max = self
            .magnitude
            .iter()
            .zip(self.edges.iter())
            .filter(|&(_, &e)| e)
            .map(|(&m, _)| m)
            .fold(0.0f32, f32::max);

        PixelBuffer::from_fn(self.width, self.height, |x, y| {
            let idx = (y * self.width + x) as usize;
            let mut value = if !self.edges[idx] {
                0
            } else if soft && max > 0.0 {
                ((self.magnitude[idx] / max) * 255.0).round().clamp(1.0, 255.0) as u8
            } else {
                255
            };
            if invert {
                value = 255 - value;
            }
            Rgb([value, value, value])
        })
    }
}
