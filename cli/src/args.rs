use art_rendr::{
    AsciiParams, ColorItParams, ColorMode, Effect, GlitchParams, MosaicParams, PaletteParams,
    PixelArtParams, PopArtParams, QuadtreeParams, Ramp, SketchParams,
};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// art-rendr - turn photos into pixel art, ASCII, sketches and more
#[derive(Parser, Debug)]
#[command(name = "art-rendr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Shrink the input so its longest side is at most this many pixels
    #[arg(long, global = true, default_value_t = 800)]
    pub max_dim: u32,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunky blocks with a reduced palette
    PixelArt(PixelArtArgs),

    /// Text mosaic from a character ramp
    Ascii(AsciiArgs),

    /// Pencil sketch from detected edges
    Sketch(SketchArgs),

    /// Flat blocks from a variance-driven quadtree
    Quadtree(QuadtreeArgs),

    /// Posterised colours with boosted saturation
    PopArt(PopArtArgs),

    /// Dominant colours as JSON
    Palette(PaletteArgs),

    /// Colour-by-number outline, preview and legend
    ColorIt(ColorItArgs),

    /// Stained-glass cells
    Mosaic(MosaicArgs),

    /// Channel shift and block displacement
    Glitch(GlitchArgs),

    /// Run an effect described by a JSON file
    Apply(ApplyArgs),
}

#[derive(Args, Debug)]
pub struct IoArgs {
    /// Input image (any format the `image` crate decodes)
    pub input: PathBuf,

    /// Output file; defaults depend on the effect
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct PixelArtArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Side of each pixel block
    #[arg(short, long, default_value_t = 10)]
    pub block_size: u32,

    /// Number of colours
    #[arg(short, long, default_value_t = 16)]
    pub palette_size: u32,
}

#[derive(Args, Debug)]
pub struct AsciiArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Characters per row
    #[arg(short, long, default_value_t = 100)]
    pub columns: u32,

    /// standard, blocks, minimal or detailed
    #[arg(short, long, default_value_t = Ramp::Standard)]
    pub ramp: Ramp,

    /// Keep cell colours (ANSI escapes in the output)
    #[arg(long)]
    pub color: bool,

    /// Glyph width to height ratio
    #[arg(long, default_value_t = 0.45)]
    pub aspect: f32,
}

#[derive(Args, Debug)]
pub struct SketchArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Smoothing sigma
    #[arg(short, long, default_value_t = 2.0)]
    pub sigma: f32,

    #[arg(long, default_value_t = 0.1)]
    pub low_threshold: f32,

    #[arg(long, default_value_t = 0.2)]
    pub high_threshold: f32,

    /// Shade strokes by edge strength
    #[arg(long)]
    pub soft: bool,

    /// Light strokes on black instead of dark on white
    #[arg(long)]
    pub dark: bool,
}

#[derive(Args, Debug)]
pub struct QuadtreeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Variance at or below which a block stays whole
    #[arg(short, long, default_value_t = 225.0)]
    pub threshold: f64,

    #[arg(long, default_value_t = 2)]
    pub min_block_size: u32,

    #[arg(long, default_value_t = 6)]
    pub max_depth: u32,

    /// Hide block outlines
    #[arg(long)]
    pub no_borders: bool,
}

#[derive(Args, Debug)]
pub struct PopArtArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[arg(short, long, default_value_t = 4)]
    pub palette_size: u32,

    #[arg(short, long, default_value_t = 1.5)]
    pub saturation: f32,
}

#[derive(Args, Debug)]
pub struct PaletteArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Number of colours
    #[arg(short, long, default_value_t = 6)]
    pub count: u32,
}

#[derive(Args, Debug)]
pub struct ColorItArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Number of colours
    #[arg(short, long, default_value_t = 8)]
    pub count: u32,

    /// Smallest patch, in percent of the image, that gets a number
    #[arg(long, default_value_t = 0.4)]
    pub min_region_pct: f32,
}

#[derive(Args, Debug)]
pub struct MosaicArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[arg(short, long, default_value_t = 300)]
    pub cells: u32,

    #[arg(short, long, default_value_t = 2)]
    pub border_width: u32,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Args, Debug)]
pub struct GlitchArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[arg(short, long, default_value_t = 5)]
    pub intensity: u32,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// JSON such as {"effect": "pixel-art", "block_size": 8}
    #[arg(short, long)]
    pub effect: PathBuf,
}

/// Where a command's effect comes from
#[derive(Debug, PartialEq)]
pub enum EffectSource<'a> {
    Flags(Effect),
    File(&'a Path),
}

impl Commands {
    /// Input/output paths and the effect the command asks for
    pub fn split(&self) -> (&IoArgs, EffectSource<'_>) {
        match self {
            Commands::PixelArt(a) => (
                &a.io,
                EffectSource::Flags(Effect::PixelArt(PixelArtParams {
                    block_size: a.block_size,
                    palette_size: a.palette_size,
                })),
            ),
            Commands::Ascii(a) => (
                &a.io,
                EffectSource::Flags(Effect::Ascii(AsciiParams {
                    columns: a.columns,
                    ramp: a.ramp,
                    color_mode: if a.color { ColorMode::Color } else { ColorMode::Mono },
                    aspect: a.aspect,
                })),
            ),
            Commands::Sketch(a) => (
                &a.io,
                EffectSource::Flags(Effect::Sketch(SketchParams {
                    sigma: a.sigma,
                    low_threshold: a.low_threshold,
                    high_threshold: a.high_threshold,
                    soft: a.soft,
                    invert: !a.dark,
                })),
            ),
            Commands::Quadtree(a) => (
                &a.io,
                EffectSource::Flags(Effect::Quadtree(QuadtreeParams {
                    variance_threshold: a.threshold,
                    min_block_size: a.min_block_size,
                    max_depth: a.max_depth,
                    show_borders: !a.no_borders,
                })),
            ),
            Commands::PopArt(a) => (
                &a.io,
                EffectSource::Flags(Effect::PopArt(PopArtParams {
                    palette_size: a.palette_size,
                    saturation_boost: a.saturation,
                })),
            ),
            Commands::Palette(a) => (&a.io, EffectSource::Flags(Effect::Palette(PaletteParams { count: a.count }))),
            Commands::ColorIt(a) => (
                &a.io,
                EffectSource::Flags(Effect::ColorIt(ColorItParams {
                    count: a.count,
                    min_region_pct: a.min_region_pct,
                })),
            ),
            Commands::Mosaic(a) => (
                &a.io,
                EffectSource::Flags(Effect::Mosaic(MosaicParams {
                    cells: a.cells,
                    border_width: a.border_width,
                    seed: a.seed,
                })),
            ),
            Commands::Glitch(a) => (
                &a.io,
                EffectSource::Flags(Effect::Glitch(GlitchParams {
                    intensity: a.intensity,
                    seed: a.seed,
                })),
            ),
            Commands::Apply(a) => (&a.io, EffectSource::File(&a.effect)),
        }
    }
}
