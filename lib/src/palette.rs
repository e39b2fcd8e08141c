//! Dominant colours and colour-by-number templates

use crate::buffer::PixelBuffer;
use crate::config::check_range;
use crate::error::Result;
use crate::quantize::{Quantized, quantize};
use image::{ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use imageproc::region_labelling::{Connectivity, connected_components};
use serde::Serialize;

/// Lowercase `#rrggbb`
pub fn hex(color: Rgb<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaletteEntry {
    /// Quantizer bucket this colour came from
    pub bucket: usize,
    pub rgb: [u8; 3],
    pub hex: String,
    pub pixel_count: usize,
    /// Share of all pixels, in [0, 1]
    pub coverage: f64,
}

impl PaletteEntry {
    pub fn color(&self) -> Rgb<u8> {
        Rgb(self.rgb)
    }
}

/// Colours ordered by decreasing coverage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    total_pixels: usize,
}

impl Palette {
    /// Rank the buckets of a quantization by coverage; ties keep bucket order
    pub fn from_quantized(q: &Quantized) -> Self {
        let total = q.total_pixels();
        let mut entries: Vec<PaletteEntry> = q
            .palette()
            .iter()
            .zip(q.counts())
            .enumerate()
            .map(|(bucket, (&color, &count))| PaletteEntry {
                bucket,
                rgb: color.0,
                hex: hex(color),
                pixel_count: count,
                coverage: count as f64 / total as f64,
            })
            .collect();
        // Stable sort keeps ascending bucket order among equal counts
        entries.sort_by(|a, b| b.pixel_count.cmp(&a.pixel_count));

        Self {
            entries,
            total_pixels: total,
        }
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_pixels(&self) -> usize {
        self.total_pixels
    }

    /// Coverage not attributed to any listed colour
    pub fn other_fraction(&self) -> f64 {
        let listed: f64 = self.entries.iter().map(|e| e.coverage).sum();
        (1.0 - listed).max(0.0)
    }

    /// `(hex, coverage)` pairs for charting
    pub fn distribution(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|e| (e.hex.clone(), e.coverage))
            .collect()
    }
}

/// The `count` most dominant colours of a buffer
pub fn extract_palette(buf: &PixelBuffer, count: usize) -> Result<Palette> {
    check_range("count", count, 1..)?;
    let q = quantize(buf, count)?;
    Ok(Palette::from_quantized(&q))
}

/// Colour of the numbers printed on a template
pub const LABEL_COLOR: Rgb<u8> = Rgb([130, 130, 130]);

/// 3x5 digit bitmaps, one byte per row, leftmost column in bit 2
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b001, 0b001, 0b001],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    /// Number painted in the template, 1 = most dominant colour
    pub label: u32,
    pub region_id: u32,
    pub rgb: [u8; 3],
    pub hex: String,
    pub coverage: f64,
}

/// Where to print a label inside one connected patch of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelAnchor {
    pub label: u32,
    pub x: u32,
    pub y: u32,
    /// Size of the patch in pixels
    pub pixel_count: usize,
}

/// Colour-by-number template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorByNumber {
    width: u32,
    height: u32,
    legend: Vec<LegendEntry>,
    anchors: Vec<LabelAnchor>,
    #[serde(skip)]
    regions: Vec<u32>,
    #[serde(skip)]
    boundary: Vec<bool>,
    #[serde(skip)]
    preview: PixelBuffer,
}

impl ColorByNumber {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Legend ordered by label
    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    pub fn anchors(&self) -> &[LabelAnchor] {
        &self.anchors
    }

    /// Region id (quantizer bucket) per pixel, row-major
    pub fn regions(&self) -> &[u32] {
        &self.regions
    }

    pub fn region_at(&self, x: u32, y: u32) -> u32 {
        self.regions[(y * self.width + x) as usize]
    }

    pub fn label_of(&self, region_id: u32) -> Option<u32> {
        self.legend
            .iter()
            .find(|e| e.region_id == region_id)
            .map(|e| e.label)
    }

    pub fn is_boundary(&self, x: u32, y: u32) -> bool {
        self.boundary[(y * self.width + x) as usize]
    }

    /// Filled reference image
    pub fn preview(&self) -> &PixelBuffer {
        &self.preview
    }

    /// Black region outlines on white
    pub fn outline(&self) -> Result<PixelBuffer> {
        PixelBuffer::from_fn(self.width, self.height, |x, y| {
            if self.is_boundary(x, y) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    /// Printable template: the outline with every anchor's number on it
    pub fn numbered_outline(&self) -> Result<PixelBuffer> {
        let mut canvas = self.outline()?.into_rgb_image();
        let scale = label_scale(self.width);
        for anchor in &self.anchors {
            draw_label(&mut canvas, anchor.label, anchor.x, anchor.y, scale);
        }
        PixelBuffer::from_rgb_image(canvas)
    }
}

/// Size of one font dot: 1 px below 450 px of width, 2 px from there
fn label_scale(width: u32) -> u32 {
    (width / 45).clamp(8, 13) / 5
}

/// Print `label` centred on (cx, cy); whatever falls off the canvas is clipped
fn draw_label(canvas: &mut RgbImage, label: u32, cx: u32, cy: u32, scale: u32) {
    let digits: Vec<usize> = label
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| d as usize)
        .collect();
    let s = scale as i32;
    let text_w = (4 * digits.len() as i32 - 1) * s;
    let left = cx as i32 - text_w / 2;
    let top = cy as i32 - 5 * s / 2;

    for (i, &d) in digits.iter().enumerate() {
        let x0 = left + 4 * s * i as i32;
        for (row, &bits) in DIGITS[d].iter().enumerate() {
            for col in 0..3u8 {
                if bits >> (2 - col) & 1 == 1 {
                    let dot = Rect::at(x0 + col as i32 * s, top + row as i32 * s).of_size(scale, scale);
                    draw_filled_rect_mut(canvas, dot, LABEL_COLOR);
                }
            }
        }
    }
}

/// Flag pixels whose 4-neighbourhood contains another region
pub fn region_boundaries(regions: &[u32], width: u32, height: u32) -> Vec<bool> {
    let w = width as usize;
    let h = height as usize;
    let mut boundary = vec![false; regions.len()];
    for y in 0..h {
        for x in 0..w {
            let id = regions[y * w + x];
            let differs = (x > 0 && regions[y * w + x - 1] != id)
                || (x + 1 < w && regions[y * w + x + 1] != id)
                || (y > 0 && regions[(y - 1) * w + x] != id)
                || (y + 1 < h && regions[(y + 1) * w + x] != id);
            boundary[y * w + x] = differs;
        }
    }
    boundary
}

/// Build a colour-by-number template with `count` colours
///
/// # Arguments
/// * `min_region_pct` - Patches smaller than this share of the image (and
///   never below 20 pixels) get no label anchor
pub fn color_by_number(buf: &PixelBuffer, count: usize, min_region_pct: f32) -> Result<ColorByNumber> {
    check_range("count", count, 1..)?;
    check_range("min_region_pct", min_region_pct, 0.0..=100.0)?;

    let q = quantize(buf, count)?;
    let palette = Palette::from_quantized(&q);
    let (width, height) = buf.dimensions();

    let legend: Vec<LegendEntry> = palette
        .entries()
        .iter()
        .enumerate()
        .map(|(rank, e)| LegendEntry {
            label: rank as u32 + 1,
            region_id: e.bucket as u32,
            rgb: e.rgb,
            hex: e.hex.clone(),
            coverage: e.coverage,
        })
        .collect();

    let mut labels = vec![0u32; q.palette().len()];
    for entry in &legend {
        labels[entry.region_id as usize] = entry.label;
    }

    let regions = q.indices().to_vec();
    let boundary = region_boundaries(&regions, width, height);
    let total = regions.len();
    let min_size = ((total as f64 * min_region_pct as f64 / 100.0) as usize).max(20);
    let anchors = label_anchors(&regions, width, height, &labels, min_size);

    log::debug!(
        "colour-by-number: {} colours, {} labelled patches (min {} px)",
        legend.len(),
        anchors.len(),
        min_size
    );

    Ok(ColorByNumber {
        width,
        height,
        legend,
        anchors,
        regions,
        boundary,
        preview: q.to_buffer()?,
    })
}

#[derive(Debug, Clone, Copy, Default)]
struct Patch {
    region: u32,
    count: usize,
    sum_x: u64,
    sum_y: u64,
}

/// One anchor per 4-connected patch of at least `min_size` pixels
///
/// The anchor is the patch centroid, or the patch pixel nearest to it when the
/// centroid falls outside the patch.
fn label_anchors(regions: &[u32], width: u32, height: u32, labels: &[u32], min_size: usize) -> Vec<LabelAnchor> {
    // Offset ids by one so no region collides with the background value
    let ids: ImageBuffer<Luma<u32>, Vec<u32>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([regions[(y * width + x) as usize] + 1]));
    let components = connected_components(&ids, Connectivity::Four, Luma([0u32]));

    let mut patches: Vec<Patch> = Vec::new();
    for (x, y, p) in components.enumerate_pixels() {
        let c = p[0] as usize;
        if c >= patches.len() {
            patches.resize(c + 1, Patch::default());
        }
        let patch = &mut patches[c];
        patch.region = regions[(y * width + x) as usize];
        patch.count += 1;
        patch.sum_x += x as u64;
        patch.sum_y += y as u64;
    }

    let centroids: Vec<Option<(u32, u32)>> = patches
        .iter()
        .map(|p| {
            (p.count >= min_size && p.count > 0).then(|| {
                ((p.sum_x / p.count as u64) as u32, (p.sum_y / p.count as u64) as u32)
            })
        })
        .collect();

    // Nearest member pixel for patches whose centroid lies outside them
    let mut nearest: Vec<Option<(u64, u32, u32)>> = vec![None; patches.len()];
    for (c, centroid) in centroids.iter().enumerate() {
        if let Some((cx, cy)) = centroid {
            if components.get_pixel(*cx, *cy)[0] as usize == c {
                nearest[c] = Some((0, *cx, *cy));
            }
        }
    }
    for (x, y, p) in components.enumerate_pixels() {
        let c = p[0] as usize;
        let Some((cx, cy)) = centroids[c] else {
            continue;
        };
        let dx = x as i64 - cx as i64;
        let dy = y as i64 - cy as i64;
        let dist = (dx * dx + dy * dy) as u64;
        if nearest[c].is_none_or(|(best, _, _)| dist < best) {
            nearest[c] = Some((dist, x, y));
        }
    }

    patches
        .iter()
        .zip(nearest)
        .filter_map(|(patch, best)| {
            best.map(|(_, x, y)| LabelAnchor {
                label: labels[patch.region as usize],
                x,
                y,
                pixel_count: patch.count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bands() -> PixelBuffer {
        PixelBuffer::from_fn(90, 30, |x, _| match x / 30 {
            0 => Rgb([220, 30, 30]),
            1 => Rgb([30, 220, 30]),
            _ => Rgb([30, 30, 220]),
        })
        .unwrap()
    }

    #[test]
    fn test_hex_is_lowercase() {
        assert_eq!(hex(Rgb([200, 168, 78])), "#c8a84e");
        assert_eq!(hex(Rgb([0, 10, 255])), "#000aff");
    }

    #[test]
    fn test_palette_sorted_by_coverage() {
        let buf = PixelBuffer::from_fn(10, 10, |x, y| {
            if y < 2 {
                Rgb([0, 0, 0])
            } else if x < 3 {
                Rgb([255, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
        .unwrap();
        let palette = extract_palette(&buf, 3).unwrap();
        let hexes: Vec<&str> = palette.entries().iter().map(|e| e.hex.as_str()).collect();
        assert_eq!(hexes, vec!["#ffffff", "#ff0000", "#000000"]);
        assert_eq!(palette.entries()[0].pixel_count, 56);
        assert!((palette.entries()[0].coverage - 0.56).abs() < 1e-12);
    }

    #[test]
    fn test_palette_ties_keep_bucket_order() {
        let palette = extract_palette(&bands(), 3).unwrap();
        let buckets: Vec<usize> = palette.entries().iter().map(|e| e.bucket).collect();
        assert_eq!(buckets, vec![0, 1, 2]);
    }

    #[test]
    fn test_coverage_sums_to_one() {
        let buf = PixelBuffer::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, 128])).unwrap();
        let palette = extract_palette(&buf, 8).unwrap();
        let sum: f64 = palette.entries().iter().map(|e| e.coverage).sum();
        assert!(sum <= 1.0 + 1e-9 && sum >= 1.0 - 1e-9);
        assert!(palette.other_fraction() < 1e-9);
        assert_eq!(palette.distribution().len(), palette.len());
    }

    #[test]
    fn test_region_boundaries() {
        let regions = vec![
            0, 0, 1, //
            0, 0, 1, //
            0, 0, 1,
        ];
        let boundary = region_boundaries(&regions, 3, 3);
        assert_eq!(
            boundary,
            vec![
                false, true, true, //
                false, true, true, //
                false, true, true,
            ]
        );
    }

    #[test]
    fn test_color_by_number_legend_and_labels() {
        let buf = PixelBuffer::from_fn(40, 40, |x, _| {
            if x < 30 { Rgb([240, 240, 240]) } else { Rgb([20, 20, 120]) }
        })
        .unwrap();
        let template = color_by_number(&buf, 4, 0.4).unwrap();
        assert_eq!(template.legend().len(), 2);
        assert_eq!(template.legend()[0].label, 1);
        assert_eq!(template.legend()[0].hex, "#f0f0f0");

        let light = template.region_at(0, 0);
        let dark = template.region_at(39, 0);
        assert_eq!(template.label_of(light), Some(1));
        assert_eq!(template.label_of(dark), Some(2));
        assert!(template.is_boundary(29, 5) && template.is_boundary(30, 5));
        assert!(!template.is_boundary(10, 5));
        assert_eq!(template.preview(), &buf);

        let outline = template.outline().unwrap();
        assert_eq!(outline.get(29, 0).unwrap(), Rgb([0, 0, 0]));
        assert_eq!(outline.get(0, 0).unwrap(), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_anchor_at_centroid() {
        let buf = PixelBuffer::from_fn(40, 40, |x, _| {
            if x < 20 { Rgb([255, 255, 0]) } else { Rgb([0, 0, 0]) }
        })
        .unwrap();
        let template = color_by_number(&buf, 2, 1.0).unwrap();
        let mut anchors = template.anchors().to_vec();
        anchors.sort_by_key(|a| a.x);
        assert_eq!(anchors.len(), 2);
        assert_eq!((anchors[0].x, anchors[0].y), (9, 19));
        assert_eq!((anchors[1].x, anchors[1].y), (29, 19));
        assert_eq!(anchors[0].pixel_count, 800);
    }

    #[test]
    fn test_numbered_outline_prints_labels() {
        let buf = PixelBuffer::from_fn(40, 40, |x, _| {
            if x < 20 { Rgb([255, 255, 0]) } else { Rgb([0, 0, 0]) }
        })
        .unwrap();
        let template = color_by_number(&buf, 2, 1.0).unwrap();
        let outline = template.outline().unwrap();
        let numbered = template.numbered_outline().unwrap();

        for anchor in template.anchors() {
            assert_eq!(outline.get(anchor.x, anchor.y).unwrap(), Rgb([255, 255, 255]));
            assert_eq!(numbered.get(anchor.x, anchor.y).unwrap(), LABEL_COLOR);
        }
        // "1" lights 8 dots and "2" lights 11
        let printed = numbered.pixels().filter(|&&p| p == LABEL_COLOR).count();
        assert_eq!(printed, 19);
        assert_eq!(numbered.get(0, 0).unwrap(), Rgb([255, 255, 255]));
        assert_eq!(numbered.get(19, 0).unwrap(), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_labels_clip_at_canvas_edge() {
        let mut canvas = RgbImage::from_pixel(6, 6, Rgb([255, 255, 255]));
        draw_label(&mut canvas, 10, 0, 0, 2);
        // The "1" falls off the left edge; the "0" starts at x = 1
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(1, 0), LABEL_COLOR);
        assert_eq!(*canvas.get_pixel(3, 1), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(5, 4), LABEL_COLOR);
        assert_eq!(*canvas.get_pixel(5, 5), Rgb([255, 255, 255]));
        assert_eq!(label_scale(40), 1);
        assert_eq!(label_scale(800), 2);
    }

    #[test]
    fn test_anchor_moves_inside_ring() {
        // A ring whose centroid lies in the hole
        let buf = PixelBuffer::from_fn(30, 30, |x, y| {
            let edge = x < 5 || y < 5 || x >= 25 || y >= 25;
            if edge { Rgb([200, 0, 0]) } else { Rgb([0, 0, 200]) }
        })
        .unwrap();
        let template = color_by_number(&buf, 2, 0.0).unwrap();
        let ring = template.region_at(0, 0);
        let label = template.label_of(ring).unwrap();
        let anchor = template
            .anchors()
            .iter()
            .find(|a| a.label == label)
            .unwrap();
        assert_eq!(template.region_at(anchor.x, anchor.y), ring);
    }

    #[test]
    fn test_small_patches_get_no_anchor() {
        let buf = PixelBuffer::from_fn(50, 50, |x, y| {
            if x < 3 && y < 3 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        })
        .unwrap();
        let template = color_by_number(&buf, 2, 0.0).unwrap();
        // 9-pixel patch is under the 20 pixel floor
        assert_eq!(template.anchors().len(), 1);
        assert_eq!(template.anchors()[0].label, 1);
    }
}
