//! Character ramps for brightness-to-glyph mapping
//!
//! Every ramp is ordered from the densest-looking glyph (used for the darkest
//! pixels) to the lightest-looking one (used for the brightest).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classic 10-level ramp
pub const STANDARD_CHARS: [char; 10] = ['@', '%', '#', '*', '+', '=', '-', ':', '.', ' '];

/// Unicode shade blocks
pub const BLOCK_CHARS: [char; 5] = ['█', '▓', '▒', '░', ' '];

/// Sparse 5-level ramp
pub const MINIMAL_CHARS: [char; 5] = ['#', '=', ':', '.', ' '];

/// 70-level ramp for wide outputs
pub const DETAILED_CHARS: [char; 70] = [
    '$', '@', 'B', '%', '8', '&', 'W', 'M', '#', '*', 'o', 'a', 'h', 'k',
    'b', 'd', 'p', 'q', 'w', 'm', 'Z', 'O', '0', 'Q', 'L', 'C', 'J', 'U',
    'Y', 'X', 'z', 'c', 'v', 'u', 'n', 'x', 'r', 'j', 'f', 't', '/', '\\',
    '|', '(', ')', '1', '{', '}', '[', ']', '?', '-', '_', '+', '~', '<',
    '>', 'i', '!', 'l', 'I', ';', ':', ',', '"', '^', '`', '\'', '.', ' ',
];

/// Selectable character ramp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ramp {
    #[default]
    Standard,
    Blocks,
    Minimal,
    Detailed,
}

impl Ramp {
    pub const ALL: [Ramp; 4] = [Ramp::Standard, Ramp::Blocks, Ramp::Minimal, Ramp::Detailed];

    pub fn chars(self) -> &'static [char] {
        match self {
            Ramp::Standard => &STANDARD_CHARS,
            Ramp::Blocks => &BLOCK_CHARS,
            Ramp::Minimal => &MINIMAL_CHARS,
            Ramp::Detailed => &DETAILED_CHARS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Ramp::Standard => "standard",
            Ramp::Blocks => "blocks",
            Ramp::Minimal => "minimal",
            Ramp::Detailed => "detailed",
        }
    }
}

impl fmt::Display for Ramp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Ramp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ramp::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| format!("unknown ramp `{}` (expected standard, blocks, minimal or detailed)", s))
    }
}

/// Bucket index for a luminance value on the 0..=255 scale
///
/// Buckets are linear: `floor(lum / 256 * n)`, clamped to `n - 1`.
pub fn luminance_bucket(luminance: f32, buckets: usize) -> usize {
    let lum = luminance.clamp(0.0, 255.0);
    let index = (lum / 256.0 * buckets as f32).floor() as usize;
    index.min(buckets.saturating_sub(1))
}

/// Get the glyph for a luminance value on the 0..=255 scale
pub fn glyph_for_luminance(luminance: f32, ramp: Ramp) -> char {
    let chars = ramp.chars();
    chars[luminance_bucket(luminance, chars.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_darkest_maps_to_first_char() {
        for ramp in Ramp::ALL {
            assert_eq!(glyph_for_luminance(0.0, ramp), ramp.chars()[0]);
        }
    }

    #[test]
    fn test_brightest_maps_to_last_char() {
        for ramp in Ramp::ALL {
            let last = *ramp.chars().last().unwrap();
            assert_eq!(glyph_for_luminance(255.0, ramp), last);
        }
    }

    #[test]
    fn test_bucket_is_linear() {
        assert_eq!(luminance_bucket(25.0, 10), 0);
        assert_eq!(luminance_bucket(26.0, 10), 1);
        assert_eq!(luminance_bucket(128.0, 10), 5);
        assert_eq!(luminance_bucket(300.0, 10), 9);
        assert_eq!(luminance_bucket(-4.0, 10), 0);
    }

    #[test]
    fn test_detailed_ramp_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for c in DETAILED_CHARS {
            assert!(seen.insert(c), "duplicate glyph {:?}", c);
        }
    }

    #[test]
    fn test_ramp_from_str() {
        assert_eq!("blocks".parse::<Ramp>().unwrap(), Ramp::Blocks);
        assert!("braille".parse::<Ramp>().is_err());
        for ramp in Ramp::ALL {
            assert_eq!(ramp.to_string().parse::<Ramp>().unwrap(), ramp);
        }
    }
}
