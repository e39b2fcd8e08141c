//! Art Renderer - stylised renderings of raster images
//!
//! Pure, deterministic transforms from an RGB [`PixelBuffer`] to pixel art,
//! ASCII mosaics, pencil sketches, quadtree blocks, pop art, dominant-colour
//! palettes, colour-by-number templates, stained-glass mosaics and glitch art.
//!
//! # Example
//! ```no_run
//! use art_rendr::{Effect, PixelArtParams, PixelBuffer, Rgb};
//!
//! let input = image::open("photo.jpg").unwrap().to_rgba8();
//! let buf = PixelBuffer::from_rgba(&input, Rgb([255, 255, 255])).unwrap();
//! let effect = Effect::PixelArt(PixelArtParams::default());
//! let artifact = effect.apply(&buf.constrain(800).unwrap()).unwrap();
//! if let Some(img) = artifact.as_image() {
//!     img.as_rgb_image().save("pixel_art.png").unwrap();
//! }
//! ```

pub mod buffer;
pub mod config;
pub mod edges;
pub mod error;
pub mod filters;
pub mod glyph;
pub mod lut;
pub mod palette;
pub mod processor;
pub mod quadtree;
pub mod quantize;
pub mod stylize;

// Re-export main types for convenience
pub use buffer::{PixelBuffer, Rect, Rgb};
pub use config::{
    AsciiParams, ColorItParams, GlitchParams, MosaicParams, PaletteParams, PixelArtParams,
    PopArtParams, QuadtreeParams, SketchParams,
};
pub use edges::{EdgeDetector, EdgeMap};
pub use error::{ArtError, Result};
pub use glyph::{ColorMode, GlyphGrid};
pub use lut::Ramp;
pub use crate::palette::{ColorByNumber, LABEL_COLOR, Palette, PaletteEntry};
pub use processor::{Artifact, Effect};
pub use quadtree::Quadtree;
pub use quantize::{Quantized, quantize};
