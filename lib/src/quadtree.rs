//! Variance-driven quadtree decomposition
//!
//! Nodes live in a flat arena; a node refers to its four children by index.
//! Node 0 is always the root.

use crate::buffer::{PixelBuffer, Rect};
use crate::config::QuadtreeParams;
use crate::error::Result;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use serde::Serialize;

/// Outline colour used when borders are shown
pub const BORDER_COLOR: Rgb<u8> = Rgb([30, 30, 30]);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadNode {
    pub rect: Rect,
    /// Mean colour of the rectangle
    pub color: [u8; 3],
    /// Mean over channels of the per-channel mean squared deviation
    pub variance: f64,
    pub depth: u32,
    /// Arena indices of the TL, TR, BL, BR children
    pub children: Option<[usize; 4]>,
}

impl QuadNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quadtree {
    nodes: Vec<QuadNode>,
}

impl Quadtree {
    /// Decompose the whole buffer
    pub fn build(buf: &PixelBuffer, params: &QuadtreeParams) -> Result<Self> {
        params.validate()?;
        let mut tree = Quadtree { nodes: Vec::new() };
        tree.build_node(buf, buf.bounds(), 0, params);
        log::debug!(
            "quadtree on {}x{}: {} nodes, {} leaves",
            buf.width(),
            buf.height(),
            tree.nodes.len(),
            tree.leaf_count()
        );
        Ok(tree)
    }

    fn build_node(&mut self, buf: &PixelBuffer, rect: Rect, depth: u32, params: &QuadtreeParams) -> usize {
        let (color, variance) = region_stats(buf, rect);
        let idx = self.nodes.len();
        self.nodes.push(QuadNode {
            rect,
            color: color.0,
            variance,
            depth,
            children: None,
        });

        // Halving first keeps huge block sizes from overflowing
        let splittable = rect.width.min(rect.height) / 2 >= params.min_block_size;
        if variance <= params.variance_threshold || !splittable || depth >= params.max_depth {
            return idx;
        }

        log::trace!("splitting {:?} at depth {} (variance {:.1})", rect, depth, variance);
        let children = split_rect(rect).map(|r| self.build_node(buf, r, depth + 1, params));
        self.nodes[idx].children = Some(children);
        idx
    }

    pub fn root(&self) -> &QuadNode {
        &self.nodes[0]
    }

    /// All nodes in depth-first pre-order
    pub fn nodes(&self) -> &[QuadNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&QuadNode> {
        self.nodes.get(index)
    }

    pub fn children(&self, node: &QuadNode) -> impl Iterator<Item = &QuadNode> {
        node.children
            .into_iter()
            .flatten()
            .map(move |i| &self.nodes[i])
    }

    pub fn leaves(&self) -> impl Iterator<Item = &QuadNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    /// Deepest leaf depth (the root is depth 0)
    pub fn depth(&self) -> u32 {
        self.leaves().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Paint every leaf as a flat block, optionally outlined
    pub fn render(&self, outline: Option<Rgb<u8>>) -> Result<PixelBuffer> {
        let root = self.root().rect;
        let mut canvas = RgbImage::new(root.width, root.height);

        for leaf in self.leaves() {
            draw_filled_rect_mut(&mut canvas, to_draw_rect(leaf.rect), Rgb(leaf.color));
        }
        if let Some(color) = outline {
            for leaf in self.leaves() {
                draw_hollow_rect_mut(&mut canvas, to_draw_rect(leaf.rect), color);
            }
        }

        PixelBuffer::from_rgb_image(canvas)
    }
}

fn to_draw_rect(rect: Rect) -> imageproc::rect::Rect {
    imageproc::rect::Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height)
}

/// Split into TL, TR, BL, BR; odd sizes give the extra pixel to the left/top half
pub fn split_rect(rect: Rect) -> [Rect; 4] {
    let left_w = rect.width.div_ceil(2);
    let right_w = rect.width / 2;
    let top_h = rect.height.div_ceil(2);
    let bottom_h = rect.height / 2;
    [
        Rect::new(rect.x, rect.y, left_w, top_h),
        Rect::new(rect.x + left_w, rect.y, right_w, top_h),
        Rect::new(rect.x, rect.y + top_h, left_w, bottom_h),
        Rect::new(rect.x + left_w, rect.y + top_h, right_w, bottom_h),
    ]
}

/// Mean colour (rounded) and mean per-channel variance of a rectangle
pub fn region_stats(buf: &PixelBuffer, rect: Rect) -> (Rgb<u8>, f64) {
    let mut sum = [0.0f64; 3];
    let mut sum_sq = [0.0f64; 3];
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let p = buf.pixel(x, y);
            for ch in 0..3 {
                let v = p[ch] as f64;
                sum[ch] += v;
                sum_sq[ch] += v * v;
            }
        }
    }

    let n = rect.area().max(1) as f64;
    let mut variance = 0.0;
    let mut mean = [0u8; 3];
    for ch in 0..3 {
        let m = sum[ch] / n;
        variance += (sum_sq[ch] / n - m * m).max(0.0);
        mean[ch] = m.round().clamp(0.0, 255.0) as u8;
    }
    (Rgb(mean), variance / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noise(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            let v = ((x * 7919 + y * 104729) % 251) as u8;
            Rgb([v, v.wrapping_mul(3), v.wrapping_add(97)])
        })
        .unwrap()
    }

    fn params(threshold: f64, min_block_size: u32, max_depth: u32) -> QuadtreeParams {
        QuadtreeParams {
            variance_threshold: threshold,
            min_block_size,
            max_depth,
            show_borders: false,
        }
    }

    #[test]
    fn test_solid_buffer_is_single_leaf() {
        let buf = PixelBuffer::from_pixel(10, 10, Rgb([255, 0, 0])).unwrap();
        let tree = Quadtree::build(&buf, &params(0.5, 1, 12)).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.root().rect, Rect::new(0, 0, 10, 10));
        assert_eq!(tree.root().color, [255, 0, 0]);
        assert_eq!(tree.root().variance, 0.0);
    }

    #[test]
    fn test_leaves_tile_root() {
        let buf = noise(37, 23);
        let tree = Quadtree::build(&buf, &params(10.0, 1, 12)).unwrap();
        let mut coverage = vec![0u32; 37 * 23];
        for leaf in tree.leaves() {
            for y in leaf.rect.y..leaf.rect.bottom() {
                for x in leaf.rect.x..leaf.rect.right() {
                    coverage[(y * 37 + x) as usize] += 1;
                }
            }
        }
        assert!(coverage.iter().all(|&c| c == 1));
        let area: u64 = tree.leaves().map(|l| l.rect.area()).sum();
        assert_eq!(area, 37 * 23);
    }

    #[test]
    fn test_nodes_have_zero_or_four_children() {
        let buf = noise(32, 32);
        let tree = Quadtree::build(&buf, &params(10.0, 1, 4)).unwrap();
        for node in tree.nodes() {
            let n = tree.children(node).count();
            assert!(n == 0 || n == 4);
            if n == 4 {
                let area: u64 = tree.children(node).map(|c| c.rect.area()).sum();
                assert_eq!(area, node.rect.area());
            }
        }
    }

    #[test]
    fn test_min_block_size_respected() {
        let buf = noise(64, 48);
        let tree = Quadtree::build(&buf, &params(1.0, 4, 12)).unwrap();
        for leaf in tree.leaves() {
            assert!(leaf.rect.width >= 4 && leaf.rect.height >= 4);
            assert!(leaf.rect.area() >= 16);
        }
    }

    #[test]
    fn test_huge_min_block_size_is_single_leaf() {
        let buf = PixelBuffer::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 0])).unwrap();
        for min_block_size in [u32::MAX / 2 + 1, u32::MAX] {
            let tree = Quadtree::build(&buf, &params(1.0, min_block_size, 12)).unwrap();
            assert_eq!(tree.leaf_count(), 1);
            assert_eq!(tree.root().rect, buf.bounds());
        }
    }

    #[test]
    fn test_max_depth_respected() {
        let buf = noise(128, 128);
        let tree = Quadtree::build(&buf, &params(1.0, 1, 3)).unwrap();
        assert_eq!(tree.depth(), 3);
        assert!(tree.leaves().all(|l| l.depth <= 3));
        assert_eq!(tree.leaf_count(), 64);
    }

    #[test]
    fn test_split_rect_odd_dimensions() {
        let quads = split_rect(Rect::new(2, 3, 5, 3));
        assert_eq!(quads[0], Rect::new(2, 3, 3, 2));
        assert_eq!(quads[1], Rect::new(5, 3, 2, 2));
        assert_eq!(quads[2], Rect::new(2, 5, 3, 1));
        assert_eq!(quads[3], Rect::new(5, 5, 2, 1));
    }

    #[test]
    fn test_region_stats() {
        let buf = PixelBuffer::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([10, 10, 10]) }
        })
        .unwrap();
        let (mean, variance) = region_stats(&buf, buf.bounds());
        assert_eq!(mean, Rgb([5, 5, 5]));
        assert!((variance - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_with_outline() {
        let buf = PixelBuffer::from_fn(8, 8, |x, _| {
            if x < 4 { Rgb([200, 0, 0]) } else { Rgb([0, 0, 200]) }
        })
        .unwrap();
        let tree = Quadtree::build(&buf, &params(1.0, 1, 6)).unwrap();
        assert_eq!(tree.leaf_count(), 4);

        let plain = tree.render(None).unwrap();
        assert_eq!(plain, buf);

        let outlined = tree.render(Some(BORDER_COLOR)).unwrap();
        assert_eq!(outlined.get(0, 0).unwrap(), BORDER_COLOR);
        assert_eq!(outlined.get(1, 1).unwrap(), Rgb([200, 0, 0]));
    }
}
