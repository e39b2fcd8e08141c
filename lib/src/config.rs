//! Per-effect parameter records
//!
//! Each record has defaults matching the usual slider positions and a
//! `validate` method that must pass before the effect touches any pixels.

use crate::edges::EdgeDetector;
use crate::error::{ArtError, Result};
use crate::glyph::ColorMode;
use crate::lut::Ramp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::ops::{Bound, RangeBounds};

/// Check that `value` lies in `range`, naming the parameter in the error
///
/// NaN never passes.
pub fn check_range<T, R>(name: &'static str, value: T, range: R) -> Result<()>
where
    T: PartialOrd + Display,
    R: RangeBounds<T>,
{
    if range.contains(&value) {
        return Ok(());
    }
    Err(ArtError::InvalidParameter {
        name,
        value: value.to_string(),
        expected: describe_range(&range),
    })
}

fn describe_range<T: Display, R: RangeBounds<T>>(range: &R) -> String {
    let low = match range.start_bound() {
        Bound::Included(v) => format!("[{}", v),
        Bound::Excluded(v) => format!("({}", v),
        Bound::Unbounded => "(-inf".to_string(),
    };
    let high = match range.end_bound() {
        Bound::Included(v) => format!("{}]", v),
        Bound::Excluded(v) => format!("{})", v),
        Bound::Unbounded => "inf)".to_string(),
    };
    format!("{}, {}", low, high)
}

/// Chunky down-sampled look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelArtParams {
    pub block_size: u32,   // [2, min(W, H)], default 10
    pub palette_size: u32, // [2, 256], default 16
}

impl Default for PixelArtParams {
    fn default() -> Self {
        Self {
            block_size: 10,
            palette_size: 16,
        }
    }
}

impl PixelArtParams {
    /// Block size is bounded by the buffer, so validation needs its dimensions
    pub fn validate(&self, width: u32, height: u32) -> Result<()> {
        check_range("block_size", self.block_size, 2..=width.min(height))?;
        check_range("palette_size", self.palette_size, 2..=256)?;
        Ok(())
    }
}

/// Text mosaic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsciiParams {
    pub columns: u32, // [10, 300], default 100
    pub ramp: Ramp,
    pub color_mode: ColorMode,
    /// Glyph width / height correction, (0, 2], default 0.45
    pub aspect: f32,
}

impl Default for AsciiParams {
    fn default() -> Self {
        Self {
            columns: 100,
            ramp: Ramp::Standard,
            color_mode: ColorMode::Mono,
            aspect: 0.45,
        }
    }
}

impl AsciiParams {
    pub fn validate(&self) -> Result<()> {
        check_range("columns", self.columns, 10..=300)?;
        check_range(
            "aspect",
            self.aspect,
            (Bound::Excluded(0.0), Bound::Included(2.0)),
        )?;
        Ok(())
    }
}

/// Pencil sketch built on the edge detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchParams {
    pub sigma: f32, // (0, 5], default 2.0
    pub low_threshold: f32,
    pub high_threshold: f32,
    /// Keep gradient strength instead of solid strokes
    pub soft: bool,
    /// Dark strokes on white (default) instead of light strokes on black
    pub invert: bool,
}

impl Default for SketchParams {
    fn default() -> Self {
        let detector = EdgeDetector::default();
        Self {
            sigma: detector.sigma,
            low_threshold: detector.low_threshold,
            high_threshold: detector.high_threshold,
            soft: false,
            invert: true,
        }
    }
}

impl SketchParams {
    pub fn detector(&self) -> EdgeDetector {
        EdgeDetector {
            sigma: self.sigma,
            low_threshold: self.low_threshold,
            high_threshold: self.high_threshold,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.detector().validate()
    }
}

/// Variance-driven block decomposition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeParams {
    /// Mean per-channel variance at or below which a block stops splitting, > 0
    pub variance_threshold: f64,
    /// Smallest leaf side, >= 1
    pub min_block_size: u32,
    /// Recursion cap, [1, 12]
    pub max_depth: u32,
    pub show_borders: bool,
}

impl Default for QuadtreeParams {
    fn default() -> Self {
        Self {
            variance_threshold: 225.0,
            min_block_size: 2,
            max_depth: 6,
            show_borders: true,
        }
    }
}

impl QuadtreeParams {
    pub fn validate(&self) -> Result<()> {
        check_range(
            "variance_threshold",
            self.variance_threshold,
            (Bound::Excluded(0.0), Bound::Excluded(f64::INFINITY)),
        )?;
        check_range("min_block_size", self.min_block_size, 1..)?;
        check_range("max_depth", self.max_depth, 1..=12)?;
        Ok(())
    }
}

/// Posterised, over-saturated look
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopArtParams {
    pub palette_size: u32,     // [2, 16], default 4
    pub saturation_boost: f32, // >= 1.0, default 1.5
}

impl Default for PopArtParams {
    fn default() -> Self {
        Self {
            palette_size: 4,
            saturation_boost: 1.5,
        }
    }
}

impl PopArtParams {
    pub fn validate(&self) -> Result<()> {
        check_range("palette_size", self.palette_size, 2..=16)?;
        check_range(
            "saturation_boost",
            self.saturation_boost,
            (Bound::Included(1.0), Bound::Excluded(f32::INFINITY)),
        )?;
        Ok(())
    }
}

/// Dominant colour extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteParams {
    pub count: u32, // [2, 32], default 6
}

impl Default for PaletteParams {
    fn default() -> Self {
        Self { count: 6 }
    }
}

impl PaletteParams {
    pub fn validate(&self) -> Result<()> {
        check_range("count", self.count, 2..=32)
    }
}

/// Colour-by-number template
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorItParams {
    pub count: u32, // [2, 24], default 8
    /// Smallest region (percent of the image) that receives a number label
    pub min_region_pct: f32,
}

impl Default for ColorItParams {
    fn default() -> Self {
        Self {
            count: 8,
            min_region_pct: 0.4,
        }
    }
}

impl ColorItParams {
    pub fn validate(&self) -> Result<()> {
        check_range("count", self.count, 2..=24)?;
        check_range("min_region_pct", self.min_region_pct, 0.0..=100.0)?;
        Ok(())
    }
}

/// Stained-glass cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct MosaicParams {
    pub cells: u32,        // [2, 5000], default 300
    pub border_width: u32, // [0, 4], default 2
    pub seed: u64,
}

impl Default for MosaicParams {
    fn default() -> Self {
        Self {
            cells: 300,
            border_width: 2,
            seed: 42,
        }
    }
}

impl MosaicParams {
    pub fn validate(&self) -> Result<()> {
        check_range("cells", self.cells, 2..=5000)?;
        check_range("border_width", self.border_width, 0..=4)?;
        Ok(())
    }
}

/// Channel shift and block displacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GlitchParams {
    pub intensity: u32, // [1, 15], default 5
    pub seed: u64,
}

impl Default for GlitchParams {
    fn default() -> Self {
        Self {
            intensity: 5,
            seed: 42,
        }
    }
}

impl GlitchParams {
    pub fn validate(&self) -> Result<()> {
        check_range("intensity", self.intensity, 1..=15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PixelArtParams::default().validate(100, 100).is_ok());
        assert!(AsciiParams::default().validate().is_ok());
        assert!(SketchParams::default().validate().is_ok());
        assert!(QuadtreeParams::default().validate().is_ok());
        assert!(PopArtParams::default().validate().is_ok());
        assert!(PaletteParams::default().validate().is_ok());
        assert!(ColorItParams::default().validate().is_ok());
        assert!(MosaicParams::default().validate().is_ok());
        assert!(GlitchParams::default().validate().is_ok());
    }

    #[test]
    fn test_check_range_error_message() {
        let err = check_range("max_depth", 13u32, 1..=12).unwrap_err();
        assert_eq!(
            err,
            ArtError::InvalidParameter {
                name: "max_depth",
                value: "13".to_string(),
                expected: "[1, 12]".to_string(),
            }
        );
    }

    #[test]
    fn test_check_range_open_bounds() {
        let open = (Bound::Excluded(0.0f32), Bound::Included(5.0));
        assert!(check_range("sigma", 0.0f32, open).is_err());
        assert!(check_range("sigma", 0.01f32, open).is_ok());
        assert!(check_range("sigma", f32::NAN, open).is_err());
        let err = check_range("sigma", 6.0f32, open).unwrap_err();
        assert!(err.to_string().contains("(0, 5]"));
    }

    #[test]
    fn test_invalid_block_size() {
        let mut params = PixelArtParams::default();
        params.block_size = 1;
        assert!(params.validate(100, 100).is_err());

        // Larger than the shorter side
        params.block_size = 51;
        assert!(params.validate(100, 50).is_err());
        params.block_size = 50;
        assert!(params.validate(100, 50).is_ok());
    }

    #[test]
    fn test_invalid_palette_size() {
        let params = PixelArtParams {
            palette_size: 257,
            ..Default::default()
        };
        assert!(params.validate(100, 100).is_err());
    }

    #[test]
    fn test_invalid_quadtree() {
        let mut params = QuadtreeParams::default();
        params.max_depth = 13;
        assert!(params.validate().is_err());
        params.max_depth = 12;
        params.variance_threshold = 0.0;
        assert!(params.validate().is_err());
        params.variance_threshold = 1.0;
        params.min_block_size = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_invalid_pop_art() {
        let params = PopArtParams {
            saturation_boost: 0.9,
            ..Default::default()
        };
        assert!(params.validate().is_err());
        let params = PopArtParams {
            palette_size: 17,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_invalid_ascii_columns() {
        let mut params = AsciiParams::default();
        params.columns = 9;
        assert!(params.validate().is_err());
        params.columns = 301;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_params_deserialize_with_defaults() {
        let params: QuadtreeParams = serde_json::from_str(r#"{"max_depth": 8}"#).unwrap();
        assert_eq!(params.max_depth, 8);
        assert_eq!(params.min_block_size, 2);
    }
}
