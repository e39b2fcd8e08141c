use crate::buffer::{PixelBuffer, Rect};
use crate::config::{
    AsciiParams, ColorItParams, GlitchParams, MosaicParams, PaletteParams, PixelArtParams,
    PopArtParams, QuadtreeParams, SketchParams,
};
use crate::error::Result;
use crate::glyph::{GlyphGrid, map_glyphs};
use crate::palette::{ColorByNumber, Palette, color_by_number, extract_palette};
use crate::quadtree::{BORDER_COLOR, Quadtree};
use crate::quantize::quantize;
use crate::stylize::{glitch, mosaic, saturate};
use image::Rgb;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Chunky pixel art
///
/// The buffer is divided into `block_size` cells (edge cells may be smaller),
/// each cell is averaged, the cell colours are quantized to `palette_size`
/// colours and every cell is painted back at full size.
pub fn pixel_art(buf: &PixelBuffer, params: &PixelArtParams) -> Result<PixelBuffer> {
    let (width, height) = buf.dimensions();
    params.validate(width, height)?;

    let block = params.block_size;
    let cols = width.div_ceil(block);
    let rows = height.div_ceil(block);

    let cells: Vec<Rgb<u8>> = (0..rows * cols)
        .into_par_iter()
        .map(|i| {
            let (cx, cy) = (i % cols, i / cols);
            buf.block_average(Rect::new(cx * block, cy * block, block, block))
        })
        .collect::<Result<_>>()?;
    let small = PixelBuffer::from_fn(cols, rows, |x, y| cells[(y * cols + x) as usize])?;

    let q = quantize(&small, params.palette_size as usize)?;
    log::debug!(
        "pixel art: {}x{} cells of {} px, {} colours",
        cols,
        rows,
        block,
        q.palette().len()
    );

    PixelBuffer::from_fn(width, height, |x, y| {
        q.palette()[q.index_at(x / block, y / block) as usize]
    })
}

/// ASCII mosaic
pub fn ascii_art(buf: &PixelBuffer, params: &AsciiParams) -> Result<GlyphGrid> {
    map_glyphs(buf, params)
}

/// Pencil sketch: edge strokes, dark on white unless `invert` is off
pub fn sketch(buf: &PixelBuffer, params: &SketchParams) -> Result<PixelBuffer> {
    params.validate()?;
    let edges = params.detector().detect(buf)?;
    edges.to_buffer(params.soft, params.invert)
}

/// Flat-shaded quadtree leaves
pub fn quadtree_art(buf: &PixelBuffer, params: &QuadtreeParams) -> Result<PixelBuffer> {
    let tree = Quadtree::build(buf, params)?;
    tree.render(params.show_borders.then_some(BORDER_COLOR))
}

/// Posterised colours with boosted saturation
pub fn pop_art(buf: &PixelBuffer, params: &PopArtParams) -> Result<PixelBuffer> {
    params.validate()?;
    let q = quantize(buf, params.palette_size as usize)?;
    let boosted: Vec<Rgb<u8>> = q
        .palette()
        .iter()
        .map(|&c| saturate(c, params.saturation_boost))
        .collect();

    let (width, height) = buf.dimensions();
    PixelBuffer::from_fn(width, height, |x, y| boosted[q.index_at(x, y) as usize])
}

/// Dominant colours with their coverage
pub fn dominant_palette(buf: &PixelBuffer, params: &PaletteParams) -> Result<Palette> {
    params.validate()?;
    extract_palette(buf, params.count as usize)
}

/// Colour-by-number template
pub fn color_it(buf: &PixelBuffer, params: &ColorItParams) -> Result<ColorByNumber> {
    params.validate()?;
    color_by_number(buf, params.count as usize, params.min_region_pct)
}

/// A style together with its parameters
///
/// Serialises as `{"effect": "pixel-art", "block_size": 8, ...}`; omitted
/// parameters take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum Effect {
    PixelArt(PixelArtParams),
    Ascii(AsciiParams),
    Sketch(SketchParams),
    Quadtree(QuadtreeParams),
    PopArt(PopArtParams),
    Palette(PaletteParams),
    ColorIt(ColorItParams),
    Mosaic(MosaicParams),
    Glitch(GlitchParams),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::PixelArt(_) => "pixel-art",
            Effect::Ascii(_) => "ascii",
            Effect::Sketch(_) => "sketch",
            Effect::Quadtree(_) => "quadtree",
            Effect::PopArt(_) => "pop-art",
            Effect::Palette(_) => "palette",
            Effect::ColorIt(_) => "color-it",
            Effect::Mosaic(_) => "mosaic",
            Effect::Glitch(_) => "glitch",
        }
    }

    /// Check the parameters against a buffer of the given size
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        match self {
            Effect::PixelArt(p) => p.validate(width, height),
            Effect::Ascii(p) => p.validate(),
            Effect::Sketch(p) => p.validate(),
            Effect::Quadtree(p) => p.validate(),
            Effect::PopArt(p) => p.validate(),
            Effect::Palette(p) => p.validate(),
            Effect::ColorIt(p) => p.validate(),
            Effect::Mosaic(p) => p.validate(),
            Effect::Glitch(p) => p.validate(),
        }
    }

    /// Run the effect; the input buffer is never modified
    pub fn apply(&self, buf: &PixelBuffer) -> Result<Artifact> {
        self.validate(buf.width(), buf.height())?;
        log::debug!("applying {} to {}x{}", self.name(), buf.width(), buf.height());

        Ok(match self {
            Effect::PixelArt(p) => Artifact::Image(pixel_art(buf, p)?),
            Effect::Ascii(p) => Artifact::Text(ascii_art(buf, p)?),
            Effect::Sketch(p) => Artifact::Image(sketch(buf, p)?),
            Effect::Quadtree(p) => Artifact::Image(quadtree_art(buf, p)?),
            Effect::PopArt(p) => Artifact::Image(pop_art(buf, p)?),
            Effect::Palette(p) => Artifact::Palette(dominant_palette(buf, p)?),
            Effect::ColorIt(p) => Artifact::ColorByNumber(color_it(buf, p)?),
            Effect::Mosaic(p) => Artifact::Image(mosaic(buf, p)?),
            Effect::Glitch(p) => Artifact::Image(glitch(buf, p)?),
        })
    }
}

/// Output of an effect
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Image(PixelBuffer),
    Text(GlyphGrid),
    Palette(Palette),
    ColorByNumber(ColorByNumber),
}

impl Artifact {
    pub fn as_image(&self) -> Option<&PixelBuffer> {
        match self {
            Artifact::Image(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&GlyphGrid> {
        match self {
            Artifact::Text(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn as_palette(&self) -> Option<&Palette> {
        match self {
            Artifact::Palette(palette) => Some(palette),
            _ => None,
        }
    }

    pub fn as_color_by_number(&self) -> Option<&ColorByNumber> {
        match self {
            Artifact::ColorByNumber(template) => Some(template),
            _ => None,
        }
    }
}
