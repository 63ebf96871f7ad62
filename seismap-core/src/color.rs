//! RGB colors and hex encoding
//!
//! Global invariants enforced:
//! - Hex output is always lowercase `#rrggbb`, two digits per channel
//! - Alpha suffixes are appended textually, never blended

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Alpha suffix appended to side-face colors (0x80 = ~50% opacity)
pub const SIDE_FACE_ALPHA: &str = "80";

/// Returned by [`rgb_to_hex`] when the input cannot be parsed
pub const FALLBACK_HEX: &str = "#000000";

/// Errors produced while parsing a color string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorParseError {
    #[error("expected `#rrggbb`, got {0:?}")]
    InvalidHex(String),
    #[error("expected `rgb(r, g, b)`, got {0:?}")]
    InvalidRgb(String),
    #[error("channel value {value} in {input:?} is outside 0-255")]
    ChannelOutOfRange { input: String, value: String },
}

/// An 8-bit-per-channel RGB triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Encode as lowercase `#rrggbb`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// CSS functional notation, e.g. `rgb(255,69,0)`
    pub fn to_css(self) -> String {
        format!("rgb({},{},{})", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb` (leading `#` optional, any case)
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let digits = input.trim().strip_prefix('#').unwrap_or(input.trim());
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::InvalidHex(input.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| ColorParseError::InvalidHex(input.to_string()))
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Parse CSS `rgb(r, g, b)` with optional whitespace after commas
    pub fn from_css(input: &str) -> Result<Self, ColorParseError> {
        static RGB_RE: OnceLock<Regex> = OnceLock::new();
        let re = RGB_RE.get_or_init(|| {
            Regex::new(r"^\s*rgb\(\s*([0-9]+)\s*,\s*([0-9]+)\s*,\s*([0-9]+)\s*\)\s*$").unwrap()
        });

        let caps = re
            .captures(input)
            .ok_or_else(|| ColorParseError::InvalidRgb(input.to_string()))?;
        let channel = |idx: usize| {
            let raw = &caps[idx];
            raw.parse::<u8>()
                .map_err(|_| ColorParseError::ChannelOutOfRange {
                    input: input.to_string(),
                    value: raw.to_string(),
                })
        };
        Ok(Rgb::new(channel(1)?, channel(2)?, channel(3)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Accepts either `#rrggbb` or `rgb(r, g, b)`
impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim_start().starts_with("rgb") {
            Rgb::from_css(s)
        } else {
            Rgb::from_hex(s)
        }
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

/// Convert a CSS `rgb(r, g, b)` string to `#rrggbb`
///
/// Unparseable input yields [`FALLBACK_HEX`] (pure black) and a warning.
/// Tier colors are validated when a table is built, so this path only
/// triggers on strings that bypassed that validation.
pub fn rgb_to_hex(css: &str) -> String {
    match Rgb::from_css(css) {
        Ok(color) => color.to_hex(),
        Err(e) => {
            tracing::warn!(input = css, error = %e, "unparseable color, using black");
            FALLBACK_HEX.to_string()
        }
    }
}

/// Parse `#rrggbb` into an [`Rgb`]
pub fn hex_to_rgb(hex: &str) -> Result<Rgb, ColorParseError> {
    Rgb::from_hex(hex)
}

/// Append an alpha suffix to a hex color
///
/// This is plain string concatenation (`#rrggbb` + `aa`). No compositing
/// happens here; the renderer interprets the trailing pair as alpha.
pub fn with_alpha_suffix(hex: &str, alpha: &str) -> String {
    let mut out = String::with_capacity(hex.len() + alpha.len());
    out.push_str(hex);
    out.push_str(alpha);
    out
}

/// Check that an alpha suffix is exactly two hex digits
pub fn is_valid_alpha_suffix(alpha: &str) -> bool {
    alpha.len() == 2 && alpha.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_hex_zero_pads() {
        assert_eq!(Rgb::new(5, 0, 255).to_hex(), "#0500ff");
        assert_eq!(Rgb::new(255, 69, 0).to_hex(), "#ff4500");
    }

    #[test]
    fn test_from_hex_accepts_upper_and_missing_hash() {
        assert_eq!(Rgb::from_hex("#FAFCF3").unwrap(), Rgb::new(250, 252, 243));
        assert_eq!(Rgb::from_hex("fafcf3").unwrap(), Rgb::new(250, 252, 243));
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Rgb::from_hex("#fff").is_err());
        assert!(Rgb::from_hex("#gggggg").is_err());
        assert!(Rgb::from_hex("").is_err());
        assert!(Rgb::from_hex("#ff45001").is_err());
    }

    #[test]
    fn test_from_css_with_and_without_spaces() {
        assert_eq!(Rgb::from_css("rgb(255,69,0)").unwrap(), Rgb::new(255, 69, 0));
        assert_eq!(
            Rgb::from_css("rgb(139, 210, 206)").unwrap(),
            Rgb::new(139, 210, 206)
        );
    }

    #[test]
    fn test_from_css_rejects_out_of_range_channel() {
        let err = Rgb::from_css("rgb(256,0,0)").unwrap_err();
        assert!(matches!(err, ColorParseError::ChannelOutOfRange { .. }));
    }

    #[test]
    fn test_from_css_rejects_non_ascii_digits() {
        let err = Rgb::from_css("rgb(\u{661},2,3)").unwrap_err();
        assert!(matches!(err, ColorParseError::InvalidRgb(_)));
        assert_eq!(rgb_to_hex("rgb(\u{661},2,3)"), "#000000");
    }

    #[test]
    fn test_rgb_to_hex_falls_back_to_black() {
        assert_eq!(rgb_to_hex("not a color"), "#000000");
        assert_eq!(rgb_to_hex("rgba(1,2,3,0.5)"), "#000000");
        assert_eq!(rgb_to_hex("rgb(240,248,255)"), "#f0f8ff");
    }

    #[test]
    fn test_from_str_dispatches_on_notation() {
        assert_eq!("rgb(1,2,3)".parse::<Rgb>().unwrap(), Rgb::new(1, 2, 3));
        assert_eq!("#010203".parse::<Rgb>().unwrap(), Rgb::new(1, 2, 3));
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let json = serde_json::to_string(&Rgb::new(255, 97, 3)).unwrap();
        assert_eq!(json, "\"#ff6103\"");
        let back: Rgb = serde_json::from_str("\"rgb(255,97,3)\"").unwrap();
        assert_eq!(back, Rgb::new(255, 97, 3));
        assert!(serde_json::from_str::<Rgb>("\"nope\"").is_err());
    }

    #[test]
    fn test_alpha_suffix_is_concatenation() {
        assert_eq!(with_alpha_suffix("#ff4500", SIDE_FACE_ALPHA), "#ff450080");
        assert!(is_valid_alpha_suffix("80"));
        assert!(is_valid_alpha_suffix("fF"));
        assert!(!is_valid_alpha_suffix("8"));
        assert!(!is_valid_alpha_suffix("zz"));
    }
}
