/// Basic example: Run every effect on a generated test image
///
/// Draws a few simple shapes, then writes one output per effect into the
/// current directory.
use art_rendr::{
    AsciiParams, Artifact, ColorItParams, Effect, GlitchParams, MosaicParams, PaletteParams,
    PixelArtParams, PixelBuffer, PopArtParams, QuadtreeParams, Rgb, SketchParams,
};

fn main() {
    println!("Art Renderer - Basic Example");
    println!("============================\n");

    // Create a 240x160 test image: sky gradient, sun, ground and a red diagonal
    let width = 240;
    let height = 160;
    let (sun_x, sun_y, radius) = (170.0, 55.0, 30.0);
    let img = PixelBuffer::from_fn(width, height, |x, y| {
        let dx = x as f32 - sun_x;
        let dy = y as f32 - sun_y;
        if (dx * dx + dy * dy).sqrt() < radius {
            Rgb([250, 210, 60])
        } else if y > 110 {
            Rgb([60, 130 + (x % 40) as u8, 50])
        } else if x.abs_diff(y) < 3 {
            Rgb([220, 30, 30])
        } else {
            Rgb([80, 120, (150 + y / 2) as u8])
        }
    })
    .expect("Failed to build test image");

    println!("Created test image: {}x{}\n", width, height);
    img.as_rgb_image()
        .save("basic_input.png")
        .expect("Failed to save input");

    let effects = [
        Effect::PixelArt(PixelArtParams {
            block_size: 8,
            palette_size: 8,
        }),
        Effect::Ascii(AsciiParams {
            columns: 60,
            ..Default::default()
        }),
        Effect::Sketch(SketchParams::default()),
        Effect::Quadtree(QuadtreeParams::default()),
        Effect::PopArt(PopArtParams::default()),
        Effect::Palette(PaletteParams::default()),
        Effect::ColorIt(ColorItParams::default()),
        Effect::Mosaic(MosaicParams {
            cells: 120,
            ..Default::default()
        }),
        Effect::Glitch(GlitchParams::default()),
    ];

    for effect in effects {
        let artifact = effect.apply(&img).expect("Effect failed");
        match artifact {
            Artifact::Image(out) => {
                let path = format!("basic_{}.png", effect.name());
                out.as_rgb_image().save(&path).expect("Failed to save output");
                println!("✓ {:<10} -> {}", effect.name(), path);
            }
            Artifact::Text(grid) => {
                println!("✓ {:<10} -> {}x{} glyphs", effect.name(), grid.columns(), grid.row_count());
                println!("{}\n", grid.to_text());
            }
            Artifact::Palette(palette) => {
                println!("✓ {:<10} -> {} colours", effect.name(), palette.len());
                for entry in palette.entries() {
                    println!("    {}  {:>5.1}%", entry.hex, entry.coverage * 100.0);
                }
            }
            Artifact::ColorByNumber(template) => {
                let outline = template
                    .numbered_outline()
                    .expect("Failed to draw outline");
                outline
                    .as_rgb_image()
                    .save("basic_color-it.png")
                    .expect("Failed to save outline");
                println!(
                    "✓ {:<10} -> basic_color-it.png ({} colours, {} labels)",
                    effect.name(),
                    template.legend().len(),
                    template.anchors().len()
                );
            }
        }
    }

    println!("\nAll effects complete!");
}
