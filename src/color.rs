//! Color validation for design-token values
//!
//! Color tokens must be hex notation: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.

use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Input string doesn't start with '#'
    #[error("'{0}' is not a hex color (must start with '#')")]
    MissingHash(String),
    /// Invalid length (must be 3, 4, 6, or 8 hex chars after #)
    #[error("invalid color length {0}, expected 3, 4, 6, or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// An RGBA color decoded from hex notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

/// Parse a hex color string into RGBA.
///
/// - `#RGB` / `#RGBA` - each digit is doubled (e.g., `#F00` -> red)
/// - `#RRGGBB` - alpha defaults to 255 (opaque)
/// - `#RRGGBBAA` - explicit alpha channel
///
/// # Examples
///
/// ```
/// use styleconf::color::{parse_hex_color, Rgba};
///
/// assert_eq!(parse_hex_color("#F00").unwrap(), Rgba([255, 0, 0, 255]));
/// assert_eq!(parse_hex_color("#06B6D4").unwrap(), Rgba([6, 182, 212, 255]));
/// ```
pub fn parse_hex_color(s: &str) -> Result<Rgba, ColorError> {
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    let hex = s.strip_prefix('#').ok_or_else(|| ColorError::MissingHash(s.to_string()))?;

    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }

    // All characters are ASCII hex digits from here on.
    let digits: Vec<u8> = hex.bytes().map(hex_value).collect();

    match digits.len() {
        3 => Ok(Rgba([digits[0] * 17, digits[1] * 17, digits[2] * 17, 255])),
        4 => Ok(Rgba([digits[0] * 17, digits[1] * 17, digits[2] * 17, digits[3] * 17])),
        6 => Ok(Rgba([
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
            255,
        ])),
        8 => Ok(Rgba([
            digits[0] * 16 + digits[1],
            digits[2] * 16 + digits[3],
            digits[4] * 16 + digits[5],
            digits[6] * 16 + digits[7],
        ])),
        len => Err(ColorError::InvalidLength(len)),
    }
}

/// Check that a string is acceptable as a color token value.
pub fn validate_color_token(s: &str) -> Result<(), ColorError> {
    parse_hex_color(s).map(|_| ())
}

/// Value of a single ASCII hex digit
fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_long_forms() {
        assert_eq!(parse_hex_color("#fff"), Ok(Rgba([255, 255, 255, 255])));
        assert_eq!(parse_hex_color("#0008"), Ok(Rgba([0, 0, 0, 136])));
        assert_eq!(parse_hex_color("#ECFEFF"), Ok(Rgba([236, 254, 255, 255])));
        assert_eq!(parse_hex_color("#11223380"), Ok(Rgba([17, 34, 51, 128])));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(parse_hex_color(""), Err(ColorError::Empty));
        assert_eq!(parse_hex_color("blue"), Err(ColorError::MissingHash("blue".to_string())));
        assert_eq!(parse_hex_color("#12345"), Err(ColorError::InvalidLength(5)));
        assert_eq!(parse_hex_color("#GG0000"), Err(ColorError::InvalidHex('G')));
        assert_eq!(parse_hex_color("#"), Err(ColorError::InvalidLength(0)));
    }

    #[test]
    fn test_only_hex_passes_validation() {
        assert!(validate_color_token("#06B6D4").is_ok());
        for keyword in ["transparent", "currentColor", "inherit", "red"] {
            assert_eq!(
                validate_color_token(keyword),
                Err(ColorError::MissingHash(keyword.to_string())),
                "{keyword} should be rejected"
            );
        }
    }
}
