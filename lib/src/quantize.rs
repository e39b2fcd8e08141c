use crate::buffer::PixelBuffer;
use crate::config::check_range;
use crate::error::Result;
use image::Rgb;
use rayon::prelude::*;
use std::collections::HashMap;

/// A distinct colour and how many pixels carry it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColorCount {
    rgb: [u8; 3],
    count: usize,
}

/// A bucket of histogram entries in the median-cut
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<ColorCount>,
}

impl ColorBox {
    fn population(&self) -> usize {
        self.colors.iter().map(|c| c.count).sum()
    }

    /// Per-channel (max - min)
    fn ranges(&self) -> [u8; 3] {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for c in &self.colors {
            for ch in 0..3 {
                min[ch] = min[ch].min(c.rgb[ch]);
                max[ch] = max[ch].max(c.rgb[ch]);
            }
        }
        [0, 1, 2].map(|ch| max[ch].saturating_sub(min[ch]))
    }

    /// Channel with the greatest range, ties resolved R, G, B
    fn widest_channel(&self) -> (usize, u8) {
        let ranges = self.ranges();
        let mut best = (0, ranges[0]);
        for (ch, &r) in ranges.iter().enumerate().skip(1) {
            if r > best.1 {
                best = (ch, r);
            }
        }
        best
    }

    fn can_split(&self) -> bool {
        self.colors.len() > 1
    }

    /// Split score: widest range weighted by pixel count
    fn score(&self) -> u64 {
        self.widest_channel().1 as u64 * self.population() as u64
    }

    /// Split at the pixel-weighted median of the widest channel
    ///
    /// Both halves are non-empty.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.colors
            .sort_by_key(|c| (c.rgb[channel], c.rgb[0], c.rgb[1], c.rgb[2]));

        let half = self.population() / 2;
        let mut acc = 0;
        let mut split_idx = 0;
        for (i, c) in self.colors.iter().enumerate() {
            acc += c.count;
            if acc >= half {
                split_idx = i;
                break;
            }
        }
        split_idx = split_idx.min(self.colors.len() - 2);

        let right = self.colors.split_off(split_idx + 1);
        (self, ColorBox { colors: right })
    }

    /// Frequency-weighted mean, rounded
    fn mean(&self) -> Rgb<u8> {
        let mut sums = [0u64; 3];
        let mut total = 0u64;
        for c in &self.colors {
            let n = c.count as u64;
            for ch in 0..3 {
                sums[ch] += c.rgb[ch] as u64 * n;
            }
            total += n;
        }
        let total = total.max(1);
        Rgb(sums.map(|s| ((s + total / 2) / total) as u8))
    }
}

/// Squared Euclidean RGB distance
#[inline]
pub fn distance_sq(a: Rgb<u8>, b: Rgb<u8>) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

/// Index of the closest palette entry; ties go to the lowest index
pub fn nearest_index(color: Rgb<u8>, palette: &[Rgb<u8>]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = u32::MAX;
    for (i, &p) in palette.iter().enumerate() {
        let dist = distance_sq(color, p);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

/// Result of colour quantization
///
/// Every palette entry is used by at least one pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantized {
    width: u32,
    height: u32,
    palette: Vec<Rgb<u8>>,
    counts: Vec<usize>,
    indices: Vec<u32>,
}

impl Quantized {
    /// Bucket colours in bucket order
    pub fn palette(&self) -> &[Rgb<u8>] {
        &self.palette
    }

    /// Pixels assigned to each bucket
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Bucket index per pixel, row-major
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn total_pixels(&self) -> usize {
        self.indices.len()
    }

    pub fn index_at(&self, x: u32, y: u32) -> u32 {
        self.indices[(y * self.width + x) as usize]
    }

    /// Paint every pixel with its bucket colour
    pub fn to_buffer(&self) -> Result<PixelBuffer> {
        PixelBuffer::from_fn(self.width, self.height, |x, y| {
            self.palette[self.index_at(x, y) as usize]
        })
    }
}

/// Reduce a buffer to at most `max_colors` colours with median-cut
///
/// Buffers with no more than `max_colors` distinct colours keep them
/// unchanged, listed in order of first appearance.
pub fn quantize(buf: &PixelBuffer, max_colors: usize) -> Result<Quantized> {
    check_range("max_colors", max_colors, 1..)?;

    // Histogram in first-appearance order
    let mut lookup: HashMap<[u8; 3], u32> = HashMap::new();
    let mut histogram: Vec<ColorCount> = Vec::new();
    let mut pixel_colors: Vec<u32> = Vec::with_capacity(buf.len());
    for p in buf.pixels() {
        let idx = *lookup.entry(p.0).or_insert_with(|| {
            histogram.push(ColorCount { rgb: p.0, count: 0 });
            (histogram.len() - 1) as u32
        });
        histogram[idx as usize].count += 1;
        pixel_colors.push(idx);
    }

    let representatives: Vec<Rgb<u8>> = if histogram.len() <= max_colors {
        histogram.iter().map(|c| Rgb(c.rgb)).collect()
    } else {
        median_cut(histogram.clone(), max_colors)
    };

    // Map each distinct colour to its nearest representative
    let assignment: Vec<usize> = histogram
        .par_iter()
        .map(|c| nearest_index(Rgb(c.rgb), &representatives))
        .collect();

    // Drop representatives nothing maps to, keeping bucket order
    let mut used = vec![false; representatives.len()];
    for &a in &assignment {
        used[a] = true;
    }
    let mut remap = vec![0u32; representatives.len()];
    let mut palette = Vec::with_capacity(representatives.len());
    for (i, &color) in representatives.iter().enumerate() {
        if used[i] {
            remap[i] = palette.len() as u32;
            palette.push(color);
        }
    }

    let mut counts = vec![0usize; palette.len()];
    let indices: Vec<u32> = pixel_colors
        .iter()
        .map(|&c| {
            let bucket = remap[assignment[c as usize]];
            counts[bucket as usize] += 1;
            bucket
        })
        .collect();

    log::debug!(
        "quantized {} distinct colours to {} (requested {})",
        histogram.len(),
        palette.len(),
        max_colors
    );

    Ok(Quantized {
        width: buf.width(),
        height: buf.height(),
        palette,
        counts,
        indices,
    })
}

fn median_cut(colors: Vec<ColorCount>, max_colors: usize) -> Vec<Rgb<u8>> {
    let mut boxes = vec![ColorBox { colors }];

    while boxes.len() < max_colors {
        let mut best: Option<(usize, u64)> = None;
        for (i, b) in boxes.iter().enumerate() {
            if !b.can_split() {
                continue;
            }
            let score = b.score();
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        let Some((idx, _)) = best else {
            break;
        };

        let placeholder = ColorBox { colors: Vec::new() };
        let (left, right) = std::mem::replace(&mut boxes[idx], placeholder).split();
        boxes[idx] = left;
        boxes.push(right);
    }

    boxes.iter().map(ColorBox::mean).collect()
}
