mod args;

use anyhow::{Context, Result};
use args::{Cli, EffectSource, IoArgs};
use art_rendr::{Artifact, ColorByNumber, Effect, PixelBuffer, Rgb};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    // Configure logging
    env_logger::init();

    let cli = Cli::parse();
    let (io, effect) = cli.command.split();
    let effect = match effect {
        EffectSource::Flags(effect) => effect,
        EffectSource::File(path) => load_effect(path)?,
    };

    let buf = load_buffer(&io.input, cli.max_dim)?;
    log::info!(
        "running {} on {} ({}x{})",
        effect.name(),
        io.input.display(),
        buf.width(),
        buf.height()
    );

    let artifact = effect
        .apply(&buf)
        .with_context(|| format!("{} failed", effect.name()))?;
    write_artifact(&artifact, &effect, io)
}

fn load_effect(path: &Path) -> Result<Effect> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read effect file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid effect in {}", path.display()))
}

/// Decode, flatten alpha over white and shrink to `max_dim`
fn load_buffer(path: &Path, max_dim: u32) -> Result<PixelBuffer> {
    let img = image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .to_rgba8();
    let buf = PixelBuffer::from_rgba(&img, Rgb([255, 255, 255]))?;
    Ok(buf.constrain(max_dim)?)
}

/// `photo.jpg` + `pixel-art` + `png` -> `photo_pixel-art.png`
fn default_output(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_{}.{}", stem, suffix, extension))
}

fn write_artifact(artifact: &Artifact, effect: &Effect, io: &IoArgs) -> Result<()> {
    match artifact {
        Artifact::Image(buf) => {
            let path = io
                .output
                .clone()
                .unwrap_or_else(|| default_output(&io.input, effect.name(), "png"));
            save_image(buf, &path)
        }
        Artifact::Text(grid) => {
            let text = grid.to_ansi();
            match &io.output {
                Some(path) => write_file(path, &text),
                None => {
                    println!("{}", text);
                    Ok(())
                }
            }
        }
        Artifact::Palette(palette) => {
            let json = serde_json::to_string_pretty(palette)?;
            match &io.output {
                Some(path) => write_file(path, &json),
                None => {
                    println!("{}", json);
                    Ok(())
                }
            }
        }
        Artifact::ColorByNumber(template) => write_color_by_number(template, io),
    }
}

/// Numbered outline PNG, filled preview PNG and a JSON legend side by side
fn write_color_by_number(template: &ColorByNumber, io: &IoArgs) -> Result<()> {
    let outline_path = io
        .output
        .clone()
        .unwrap_or_else(|| default_output(&io.input, "color-it", "png"));
    save_image(&template.numbered_outline()?, &outline_path)?;

    let preview_path = default_output(&outline_path, "preview", "png");
    save_image(template.preview(), &preview_path)?;

    let legend_path = outline_path.with_extension("json");
    write_file(&legend_path, &serde_json::to_string_pretty(template)?)
}

fn save_image(buf: &PixelBuffer, path: &Path) -> Result<()> {
    buf.as_rgb_image()
        .save(path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
