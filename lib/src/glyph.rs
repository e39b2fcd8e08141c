use crate::buffer::{PixelBuffer, Rect};
use crate::config::AsciiParams;
use crate::error::Result;
use crate::filters::luminance;
use crate::lut::{Ramp, glyph_for_luminance};
use image::Rgb;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Whether glyphs keep the colour of the cell they came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    #[default]
    Mono,
    Color,
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mono" => Ok(ColorMode::Mono),
            "color" | "colour" => Ok(ColorMode::Color),
            _ => Err(format!("unknown colour mode `{}` (expected mono or color)", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    /// Average cell colour, only in colour mode
    pub color: Option<Rgb<u8>>,
}

/// Rows of glyphs, all rows the same length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphGrid {
    ramp: Ramp,
    rows: Vec<Vec<Glyph>>,
}

impl GlyphGrid {
    pub fn columns(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn ramp(&self) -> Ramp {
        self.ramp
    }

    pub fn rows(&self) -> &[Vec<Glyph>] {
        &self.rows
    }

    pub fn get(&self, column: usize, row: usize) -> Option<&Glyph> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Plain text, rows joined by newlines
    pub fn to_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.iter().map(|g| g.ch).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text with 24-bit ANSI foreground colours; identical to [`Self::to_text`] in mono mode
    pub fn to_ansi(&self) -> String {
        let mut out = String::new();
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let mut coloured = false;
            for g in row {
                match g.color {
                    Some(c) => {
                        out.push_str(&format!("\x1b[38;2;{};{};{}m{}", c[0], c[1], c[2], g.ch));
                        coloured = true;
                    }
                    None => out.push(g.ch),
                }
            }
            if coloured {
                out.push_str("\x1b[0m");
            }
        }
        out
    }
}

/// Grid size for an image, correcting for glyphs being taller than wide
///
/// `rows = max(1, floor(columns * height / width * aspect))`
pub fn grid_dimensions(width: u32, height: u32, columns: u32, aspect: f32) -> (u32, u32) {
    let rows = (columns as f64 * height as f64 / width as f64 * aspect as f64).floor() as u32;
    (columns, rows.max(1))
}

/// Source span of cell `index` when `extent` pixels are divided into `cells` cells
///
/// Spans are never empty, even when there are more cells than pixels.
fn cell_span(index: u32, cells: u32, extent: u32) -> (u32, u32) {
    let start = (index as u64 * extent as u64 / cells as u64) as u32;
    let end = ((index as u64 + 1) * extent as u64 / cells as u64) as u32;
    let start = start.min(extent - 1);
    (start, end.max(start + 1) - start)
}

/// Convert a buffer to a glyph grid
///
/// Each cell is the average of its source pixels; its luminance selects a
/// ramp glyph (darkest pixels take the ramp's first glyph).
pub fn map_glyphs(buf: &PixelBuffer, params: &AsciiParams) -> Result<GlyphGrid> {
    params.validate()?;
    let (width, height) = buf.dimensions();
    let (columns, row_count) = grid_dimensions(width, height, params.columns, params.aspect);
    log::debug!("glyph grid {}x{} from {}x{}", columns, row_count, width, height);

    let rows: Vec<Vec<Glyph>> = (0..row_count)
        .into_par_iter()
        .map(|row| -> Result<Vec<Glyph>> {
            let (y, h) = cell_span(row, row_count, height);
            (0..columns)
                .map(|col| {
                    let (x, w) = cell_span(col, columns, width);
                    let avg = buf.block_average(Rect::new(x, y, w, h))?;
                    Ok(Glyph {
                        ch: glyph_for_luminance(luminance(avg), params.ramp),
                        color: match params.color_mode {
                            ColorMode::Color => Some(avg),
                            ColorMode::Mono => None,
                        },
                    })
                })
                .collect()
        })
        .collect::<Result<_>>()?;

    Ok(GlyphGrid {
        ramp: params.ramp,
        rows,
    })
}
