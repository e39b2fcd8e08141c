//! Colour-shifting and tessellating styles: pop art saturation, stained-glass
//! mosaic and glitch

use crate::buffer::PixelBuffer;
use crate::config::{GlitchParams, MosaicParams};
use crate::error::Result;
use ::palette::{Hsv, IntoColor, Srgb};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Mosaic grout colour
pub const GROUT_COLOR: Rgb<u8> = Rgb([20, 20, 20]);

/// Scale a colour's HSV saturation by `boost`, clamped to full saturation
pub fn saturate(color: Rgb<u8>, boost: f32) -> Rgb<u8> {
    let rgb: Srgb<f32> = Srgb::new(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    );

    let mut hsv: Hsv = rgb.into_color();
    hsv.saturation = (hsv.saturation * boost).clamp(0.0, 1.0);

    let out: Srgb<f32> = hsv.into_color();
    Rgb([
        (out.red * 255.0).round().clamp(0.0, 255.0) as u8,
        (out.green * 255.0).round().clamp(0.0, 255.0) as u8,
        (out.blue * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Uniform grid over the seed points for nearest-seed queries
struct SeedGrid {
    seeds: Vec<(u32, u32)>,
    cell: u32,
    cols: u32,
    rows: u32,
    buckets: Vec<Vec<usize>>,
}

impl SeedGrid {
    fn new(seeds: Vec<(u32, u32)>, width: u32, height: u32) -> Self {
        let area = width as f64 * height as f64;
        let cell = ((area / seeds.len().max(1) as f64).sqrt().ceil() as u32).max(1);
        let cols = width.div_ceil(cell);
        let rows = height.div_ceil(cell);

        let mut buckets = vec![Vec::new(); (cols * rows) as usize];
        for (i, &(x, y)) in seeds.iter().enumerate() {
            buckets[((y / cell) * cols + x / cell) as usize].push(i);
        }

        Self {
            seeds,
            cell,
            cols,
            rows,
            buckets,
        }
    }

    /// Index of the closest seed; ties go to the lowest index
    fn nearest(&self, x: u32, y: u32) -> usize {
        let cx = (x / self.cell) as i64;
        let cy = (y / self.cell) as i64;
        let mut best = (u64::MAX, usize::MAX);

        for ring in 0..=self.cols.max(self.rows) as i64 {
            // Anything in a farther ring is at least this far away
            let reach = ((ring - 1).max(0) * self.cell as i64) as u64;
            if best.1 != usize::MAX && reach * reach > best.0 {
                break;
            }
            for by in (cy - ring)..=(cy + ring) {
                for bx in (cx - ring)..=(cx + ring) {
                    let on_ring = (by - cy).abs() == ring || (bx - cx).abs() == ring;
                    if !on_ring || bx < 0 || by < 0 || bx >= self.cols as i64 || by >= self.rows as i64 {
                        continue;
                    }
                    for &i in &self.buckets[(by * self.cols as i64 + bx) as usize] {
                        let (sx, sy) = self.seeds[i];
                        let dx = sx as i64 - x as i64;
                        let dy = sy as i64 - y as i64;
                        let candidate = ((dx * dx + dy * dy) as u64, i);
                        if candidate < best {
                            best = candidate;
                        }
                    }
                }
            }
        }
        best.1
    }
}

/// Stained-glass tessellation
///
/// Seed points are scattered with a seeded RNG. Every pixel joins its nearest
/// seed's cell, each cell is filled with the mean colour of its pixels and
/// cell edges are drawn `border_width` pixels wide in [`GROUT_COLOR`].
pub fn mosaic(buf: &PixelBuffer, params: &MosaicParams) -> Result<PixelBuffer> {
    params.validate()?;
    let (width, height) = buf.dimensions();

    let mut rng = StdRng::seed_from_u64(params.seed);
    let seeds: Vec<(u32, u32)> = (0..params.cells)
        .map(|_| (rng.gen_range(0..width), rng.gen_range(0..height)))
        .collect();
    let grid = SeedGrid::new(seeds, width, height);

    let cells: Vec<usize> = (0..height)
        .into_par_iter()
        .flat_map_iter(|y| {
            let grid = &grid;
            (0..width).map(move |x| grid.nearest(x, y))
        })
        .collect();

    let mut sums = vec![[0u64; 4]; params.cells as usize];
    for (p, &cell) in buf.pixels().zip(&cells) {
        let s = &mut sums[cell];
        s[0] += p[0] as u64;
        s[1] += p[1] as u64;
        s[2] += p[2] as u64;
        s[3] += 1;
    }
    let means: Vec<Rgb<u8>> = sums
        .iter()
        .map(|s| {
            let n = s[3].max(1);
            Rgb([0, 1, 2].map(|ch| ((s[ch] + n / 2) / n) as u8))
        })
        .collect();

    let at = |x: u32, y: u32| cells[(y * width + x) as usize];
    let mut edges = GrayImage::new(width, height);
    if params.border_width > 0 {
        for y in 0..height {
            for x in 0..width {
                let c = at(x, y);
                let split = (x + 1 < width && at(x + 1, y) != c) || (y + 1 < height && at(x, y + 1) != c);
                if split {
                    edges.put_pixel(x, y, Luma([255]));
                }
            }
        }
        if params.border_width > 1 {
            edges = dilate(&edges, Norm::LInf, (params.border_width - 1) as u8);
        }
    }

    log::debug!(
        "mosaic: {} cells over {}x{}, border {}",
        params.cells,
        width,
        height,
        params.border_width
    );

    let image = RgbImage::from_fn(width, height, |x, y| {
        if edges.get_pixel(x, y)[0] > 0 {
            GROUT_COLOR
        } else {
            means[at(x, y)]
        }
    });
    PixelBuffer::from_rgb_image(image)
}

/// VHS-style glitch: channel shift, block displacement and bright scanlines
pub fn glitch(buf: &PixelBuffer, params: &GlitchParams) -> Result<PixelBuffer> {
    params.validate()?;
    let (width, height) = buf.dimensions();
    let src = buf.as_rgb_image();
    let mut rng = StdRng::seed_from_u64(params.seed);

    // Red rolls right, blue rolls left
    let shift = 3 * params.intensity % width;
    let mut out = RgbImage::from_fn(width, height, |x, y| {
        let red = src.get_pixel((x + width - shift) % width, y)[0];
        let green = src.get_pixel(x, y)[1];
        let blue = src.get_pixel((x + shift) % width, y)[2];
        Rgb([red, green, blue])
    });

    for _ in 0..2 * params.intensity {
        let block_h = rng.gen_range(2..(height / 8).max(3)).min(height);
        let block_w = rng.gen_range(width / 4..width).max(1);
        let y = rng.gen_range(0..=height - block_h);
        let x = rng.gen_range(0..(width - block_w).max(1));
        let reach = (width / 6) as i64;
        let offset = rng.gen_range(-reach..=reach);
        let target = (x as i64 + offset).clamp(0, (width - block_w) as i64) as u32;

        let block = image::imageops::crop_imm(&out, x, y, block_w, block_h).to_image();
        image::imageops::replace(&mut out, &block, target as i64, y as i64);
    }

    for _ in 0..4 * params.intensity {
        let y = rng.gen_range(0..height);
        let thickness = rng.gen_range(1..3);
        let brightness = rng.gen_range(0..40u8);
        for row in y..(y + thickness).min(height) {
            for x in 0..width {
                let p = out.get_pixel_mut(x, row);
                p.0 = p.0.map(|c| c.saturating_add(brightness));
            }
        }
    }

    log::debug!("glitch: intensity {} on {}x{}", params.intensity, width, height);
    PixelBuffer::from_rgb_image(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
        })
        .unwrap()
    }

    #[test]
    fn test_saturate_grey_stays_grey() {
        assert_eq!(saturate(Rgb([128, 128, 128]), 3.0), Rgb([128, 128, 128]));
    }

    #[test]
    fn test_saturate_clamps() {
        let out = saturate(Rgb([200, 100, 100]), 10.0);
        assert_eq!(out, Rgb([200, 0, 0]));
        assert_eq!(saturate(Rgb([200, 100, 100]), 1.0), Rgb([200, 100, 100]));
    }

    #[test]
    fn test_seed_grid_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        let seeds: Vec<(u32, u32)> = (0..40)
            .map(|_| (rng.gen_range(0..57), rng.gen_range(0..31)))
            .collect();
        let grid = SeedGrid::new(seeds.clone(), 57, 31);
        for y in 0..31 {
            for x in 0..57 {
                let brute = seeds
                    .iter()
                    .enumerate()
                    .map(|(i, &(sx, sy))| {
                        let dx = sx as i64 - x as i64;
                        let dy = sy as i64 - y as i64;
                        ((dx * dx + dy * dy) as u64, i)
                    })
                    .min()
                    .unwrap();
                assert_eq!(grid.nearest(x, y), brute.1);
            }
        }
    }

    #[test]
    fn test_mosaic_solid_input() {
        let buf = PixelBuffer::from_pixel(40, 30, Rgb([90, 160, 200])).unwrap();
        let params = MosaicParams {
            cells: 12,
            border_width: 0,
            seed: 1,
        };
        assert_eq!(mosaic(&buf, &params).unwrap(), buf);
    }

    #[test]
    fn test_mosaic_draws_grout() {
        let buf = PixelBuffer::from_pixel(40, 30, Rgb([90, 160, 200])).unwrap();
        let params = MosaicParams {
            cells: 12,
            border_width: 2,
            seed: 1,
        };
        let out = mosaic(&buf, &params).unwrap();
        let grout = out.pixels().filter(|&&p| p == GROUT_COLOR).count();
        assert!(grout > 0 && grout < out.len());
        assert!(out.pixels().all(|&p| p == GROUT_COLOR || p == Rgb([90, 160, 200])));
    }

    #[test]
    fn test_mosaic_is_seeded() {
        let buf = photo(60, 40);
        let params = MosaicParams::default();
        assert_eq!(mosaic(&buf, &params).unwrap(), mosaic(&buf, &params).unwrap());
        let other = MosaicParams { seed: 43, ..params };
        assert_ne!(mosaic(&buf, &params).unwrap(), mosaic(&buf, &other).unwrap());
    }

    #[test]
    fn test_glitch_is_seeded() {
        let buf = photo(64, 48);
        let params = GlitchParams::default();
        let a = glitch(&buf, &params).unwrap();
        assert_eq!(a, glitch(&buf, &params).unwrap());
        assert_eq!(a.dimensions(), buf.dimensions());
        assert_ne!(a, buf);
    }

    #[test]
    fn test_glitch_tiny_buffer() {
        let buf = photo(1, 1);
        let params = GlitchParams {
            intensity: 15,
            seed: 3,
        };
        assert_eq!(glitch(&buf, &params).unwrap().dimensions(), (1, 1));
    }

    #[test]
    fn test_glitch_rejects_intensity() {
        let buf = photo(8, 8);
        let params = GlitchParams {
            intensity: 0,
            seed: 3,
        };
        assert!(glitch(&buf, &params).is_err());
    }
}
