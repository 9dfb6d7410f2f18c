//! Color parsing, normalization and luminance classification.
//!
//! Accepts the CSS color syntaxes a browser canvas understands for
//! `fillStyle` (hex, `rgb()`/`rgba()`, `hsl()`/`hsla()` and named colors)
//! and canonicalizes them to a lowercase 6-digit hex string. Alpha is
//! parsed but discarded.

use std::fmt;
use std::str::FromStr;

use crate::error::{QuoteError, QuoteResult};

/// Brightness above which a color counts as light.
const LIGHT_THRESHOLD: f64 = 127.5;

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Pure white.
    pub const WHITE: Self = Self::new(255, 255, 255);
    /// Pure black.
    pub const BLACK: Self = Self::new(0, 0, 0);

    /// Create a color from its channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a packed `0xRRGGBB` value.
    #[must_use]
    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }

    /// Canonical `#rrggbb` form.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// HSP perceived brightness, `sqrt(0.299 r² + 0.587 g² + 0.114 b²)`.
    #[must_use]
    pub fn brightness(self) -> f64 {
        let (r, g, b) = (f64::from(self.r), f64::from(self.g), f64::from(self.b));
        (0.299 * r * r + 0.587 * g * g + 0.114 * b * b).sqrt()
    }

    /// Whether the color is perceived as light.
    #[must_use]
    pub fn is_light(self) -> bool {
        self.brightness() > LIGHT_THRESHOLD
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_color(s)
    }
}

/// Normalize any recognized color string to canonical `#rrggbb`.
///
/// # Errors
///
/// Returns [`QuoteError::InvalidColor`] if the string is not a recognized color.
pub fn normalize(color: &str) -> QuoteResult<String> {
    parse_color(color).map(Rgb::to_hex)
}

/// Whether a color string describes a light color.
///
/// # Errors
///
/// Returns [`QuoteError::InvalidColor`] if the string is not a recognized color.
pub fn is_light(color: &str) -> QuoteResult<bool> {
    parse_color(color).map(Rgb::is_light)
}

/// Lighten a color by `percent` of the full channel range.
///
/// Each channel gets `floor(255 * percent / 100)` added and is clamped to 255.
///
/// # Errors
///
/// Returns [`QuoteError::InvalidColor`] if the string is not a recognized color.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn lighten(color: &str, percent: f32) -> QuoteResult<String> {
    let rgb = parse_color(color)?;
    let amount = (255.0 * f64::from(percent) / 100.0).floor() as i32;
    let add = |channel: u8| (i32::from(channel) + amount).clamp(0, 255) as u8;
    Ok(Rgb::new(add(rgb.r), add(rgb.g), add(rgb.b)).to_hex())
}

/// Parse a CSS-like color string.
///
/// # Errors
///
/// Returns [`QuoteError::InvalidColor`] if the string is not a recognized color.
pub fn parse_color(color: &str) -> QuoteResult<Rgb> {
    let invalid = || QuoteError::InvalidColor(color.to_string());
    let trimmed = color.trim().to_ascii_lowercase();

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(invalid);
    }

    if let Some((name, args)) = split_function(&trimmed) {
        return match name {
            "rgb" | "rgba" => parse_rgb_args(&args),
            "hsl" | "hsla" => parse_hsl_args(&args),
            _ => None,
        }
        .ok_or_else(invalid);
    }

    if trimmed == "transparent" {
        return Ok(Rgb::BLACK);
    }

    NAMED_COLORS
        .binary_search_by_key(&trimmed.as_str(), |(name, _)| name)
        .map(|idx| Rgb::from_u32(NAMED_COLORS[idx].1))
        .map_err(|_| invalid())
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 | 4 => Some(Rgb::new(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17)),
        6 | 8 => Some(Rgb::new(byte(0)?, byte(2)?, byte(4)?)),
        _ => None,
    }
}

/// Split `name(a, b, c)` into the function name and its arguments.
///
/// Arguments may be separated by commas, whitespace, or `/` before alpha.
fn split_function(input: &str) -> Option<(&str, Vec<&str>)> {
    let open = input.find('(')?;
    let inner = input.strip_suffix(')')?.get(open + 1..)?;
    let name = input[..open].trim();
    let args: Vec<&str> = inner
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect();
    Some((name, args))
}

fn parse_rgb_args(args: &[&str]) -> Option<Rgb> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    if let Some(alpha) = args.get(3) {
        parse_alpha(alpha)?;
    }
    Some(Rgb::new(
        parse_rgb_channel(args[0])?,
        parse_rgb_channel(args[1])?,
        parse_rgb_channel(args[2])?,
    ))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_rgb_channel(raw: &str) -> Option<u8> {
    let value = if let Some(pct) = raw.strip_suffix('%') {
        pct.parse::<f64>().ok()? * 255.0 / 100.0
    } else {
        raw.parse::<f64>().ok()?
    };
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn parse_alpha(raw: &str) -> Option<f64> {
    let value = if let Some(pct) = raw.strip_suffix('%') {
        pct.parse::<f64>().ok()? / 100.0
    } else {
        raw.parse::<f64>().ok()?
    };
    value.is_finite().then(|| value.clamp(0.0, 1.0))
}

fn parse_hsl_args(args: &[&str]) -> Option<Rgb> {
    if !(3..=4).contains(&args.len()) {
        return None;
    }
    if let Some(alpha) = args.get(3) {
        parse_alpha(alpha)?;
    }
    let hue = args[0]
        .strip_suffix("deg")
        .unwrap_or(args[0])
        .parse::<f64>()
        .ok()?;
    let sat = args[1].strip_suffix('%')?.parse::<f64>().ok()? / 100.0;
    let light = args[2].strip_suffix('%')?.parse::<f64>().ok()? / 100.0;
    if !(hue.is_finite() && sat.is_finite() && light.is_finite()) {
        return None;
    }
    Some(hsl_to_rgb(hue, sat.clamp(0.0, 1.0), light.clamp(0.0, 1.0)))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hsl_to_rgb(hue: f64, sat: f64, light: f64) -> Rgb {
    let h = hue.rem_euclid(360.0) / 360.0;
    let q = if light < 0.5 {
        light * (1.0 + sat)
    } else {
        light + sat - light * sat
    };
    let p = 2.0 * light - q;
    let channel = |t: f64| -> u8 {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };
    Rgb::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// CSS named colors, sorted by name for binary search.
const NAMED_COLORS: &[(&str, u32)] = &[
    ("aliceblue", 0xF0F8FF),
    ("antiquewhite", 0xFAEBD7),
    ("aqua", 0x00FFFF),
    ("aquamarine", 0x7FFFD4),
    ("azure", 0xF0FFFF),
    ("beige", 0xF5F5DC),
    ("bisque", 0xFFE4C4),
    ("black", 0x000000),
    ("blanchedalmond", 0xFFEBCD),
    ("blue", 0x0000FF),
    ("blueviolet", 0x8A2BE2),
    ("brown", 0xA52A2A),
    ("burlywood", 0xDEB887),
    ("cadetblue", 0x5F9EA0),
    ("chartreuse", 0x7FFF00),
    ("chocolate", 0xD2691E),
    ("coral", 0xFF7F50),
    ("cornflowerblue", 0x6495ED),
    ("cornsilk", 0xFFF8DC),
    ("crimson", 0xDC143C),
    ("cyan", 0x00FFFF),
    ("darkblue", 0x00008B),
    ("darkcyan", 0x008B8B),
    ("darkgoldenrod", 0xB8860B),
    ("darkgray", 0xA9A9A9),
    ("darkgreen", 0x006400),
    ("darkgrey", 0xA9A9A9),
    ("darkkhaki", 0xBDB76B),
    ("darkmagenta", 0x8B008B),
    ("darkolivegreen", 0x556B2F),
    ("darkorange", 0xFF8C00),
    ("darkorchid", 0x9932CC),
    ("darkred", 0x8B0000),
    ("darksalmon", 0xE9967A),
    ("darkseagreen", 0x8FBC8F),
    ("darkslateblue", 0x483D8B),
    ("darkslategray", 0x2F4F4F),
    ("darkslategrey", 0x2F4F4F),
    ("darkturquoise", 0x00CED1),
    ("darkviolet", 0x9400D3),
    ("deeppink", 0xFF1493),
    ("deepskyblue", 0x00BFFF),
    ("dimgray", 0x696969),
    ("dimgrey", 0x696969),
    ("dodgerblue", 0x1E90FF),
    ("firebrick", 0xB22222),
    ("floralwhite", 0xFFFAF0),
    ("forestgreen", 0x228B22),
    ("fuchsia", 0xFF00FF),
    ("gainsboro", 0xDCDCDC),
    ("ghostwhite", 0xF8F8FF),
    ("gold", 0xFFD700),
    ("goldenrod", 0xDAA520),
    ("gray", 0x808080),
    ("green", 0x008000),
    ("greenyellow", 0xADFF2F),
    ("grey", 0x808080),
    ("honeydew", 0xF0FFF0),
    ("hotpink", 0xFF69B4),
    ("indianred", 0xCD5C5C),
    ("indigo", 0x4B0082),
    ("ivory", 0xFFFFF0),
    ("khaki", 0xF0E68C),
    ("lavender", 0xE6E6FA),
    ("lavenderblush", 0xFFF0F5),
    ("lawngreen", 0x7CFC00),
    ("lemonchiffon", 0xFFFACD),
    ("lightblue", 0xADD8E6),
    ("lightcoral", 0xF08080),
    ("lightcyan", 0xE0FFFF),
    ("lightgoldenrodyellow", 0xFAFAD2),
    ("lightgray", 0xD3D3D3),
    ("lightgreen", 0x90EE90),
    ("lightgrey", 0xD3D3D3),
    ("lightpink", 0xFFB6C1),
    ("lightsalmon", 0xFFA07A),
    ("lightseagreen", 0x20B2AA),
    ("lightskyblue", 0x87CEFA),
    ("lightslategray", 0x778899),
    ("lightslategrey", 0x778899),
    ("lightsteelblue", 0xB0C4DE),
    ("lightyellow", 0xFFFFE0),
    ("lime", 0x00FF00),
    ("limegreen", 0x32CD32),
    ("linen", 0xFAF0E6),
    ("magenta", 0xFF00FF),
    ("maroon", 0x800000),
    ("mediumaquamarine", 0x66CDAA),
    ("mediumblue", 0x0000CD),
    ("mediumorchid", 0xBA55D3),
    ("mediumpurple", 0x9370DB),
    ("mediumseagreen", 0x3CB371),
    ("mediumslateblue", 0x7B68EE),
    ("mediumspringgreen", 0x00FA9A),
    ("mediumturquoise", 0x48D1CC),
    ("mediumvioletred", 0xC71585),
    ("midnightblue", 0x191970),
    ("mintcream", 0xF5FFFA),
    ("mistyrose", 0xFFE4E1),
    ("moccasin", 0xFFE4B5),
    ("navajowhite", 0xFFDEAD),
    ("navy", 0x000080),
    ("oldlace", 0xFDF5E6),
    ("olive", 0x808000),
    ("olivedrab", 0x6B8E23),
    ("orange", 0xFFA500),
    ("orangered", 0xFF4500),
    ("orchid", 0xDA70D6),
    ("palegoldenrod", 0xEEE8AA),
    ("palegreen", 0x98FB98),
    ("paleturquoise", 0xAFEEEE),
    ("palevioletred", 0xDB7093),
    ("papayawhip", 0xFFEFD5),
    ("peachpuff", 0xFFDAB9),
    ("peru", 0xCD853F),
    ("pink", 0xFFC0CB),
    ("plum", 0xDDA0DD),
    ("powderblue", 0xB0E0E6),
    ("purple", 0x800080),
    ("rebeccapurple", 0x663399),
    ("red", 0xFF0000),
    ("rosybrown", 0xBC8F8F),
    ("royalblue", 0x4169E1),
    ("saddlebrown", 0x8B4513),
    ("salmon", 0xFA8072),
    ("sandybrown", 0xF4A460),
    ("seagreen", 0x2E8B57),
    ("seashell", 0xFFF5EE),
    ("sienna", 0xA0522D),
    ("silver", 0xC0C0C0),
    ("skyblue", 0x87CEEB),
    ("slateblue", 0x6A5ACD),
    ("slategray", 0x708090),
    ("slategrey", 0x708090),
    ("snow", 0xFFFAFA),
    ("springgreen", 0x00FF7F),
    ("steelblue", 0x4682B4),
    ("tan", 0xD2B48C),
    ("teal", 0x008080),
    ("thistle", 0xD8BFD8),
    ("tomato", 0xFF6347),
    ("turquoise", 0x40E0D0),
    ("violet", 0xEE82EE),
    ("wheat", 0xF5DEB3),
    ("white", 0xFFFFFF),
    ("whitesmoke", 0xF5F5F5),
    ("yellow", 0xFFFF00),
    ("yellowgreen", 0x9ACD32),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_table_is_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_normalize_hex_forms() {
        assert_eq!(normalize("#1B1429").unwrap(), "#1b1429");
        assert_eq!(normalize("#fff").unwrap(), "#ffffff");
        assert_eq!(normalize("#abcd").unwrap(), "#aabbcc");
        assert_eq!(normalize("#11223380").unwrap(), "#112233");
        assert_eq!(normalize("  #ABCDEF ").unwrap(), "#abcdef");
    }

    #[test]
    fn test_normalize_functions_and_names() {
        assert_eq!(normalize("rgb(255, 0, 0)").unwrap(), "#ff0000");
        assert_eq!(normalize("rgba(0,128,255,0.5)").unwrap(), "#0080ff");
        assert_eq!(normalize("rgb(100% 0% 0% / 50%)").unwrap(), "#ff0000");
        assert_eq!(normalize("hsl(120, 100%, 25%)").unwrap(), "#008000");
        assert_eq!(normalize("RebeccaPurple").unwrap(), "#663399");
        assert_eq!(normalize("white").unwrap(), "#ffffff");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        for bad in ["", "#12", "#ggg", "rgb(1,2)", "hsl(1, 2, 3)", "notacolor", "rgb(a,b,c)"] {
            assert!(
                matches!(normalize(bad), Err(QuoteError::InvalidColor(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_is_light_threshold() {
        assert!(!is_light("#1b1429").unwrap());
        assert!(is_light("#ffffff").unwrap());
        assert!(is_light("#fff").unwrap());
        assert!(!is_light("rgb(0, 0, 0)").unwrap());
        // Brightness of 127 grey is exactly 127.0, below the threshold.
        assert!(!is_light("#7f7f7f").unwrap());
        assert!(is_light("#808080").unwrap());
    }

    #[test]
    fn test_lighten_clamps() {
        assert_eq!(lighten("#000000", 10.0).unwrap(), "#191919");
        assert_eq!(lighten("#f0f0f0", 50.0).unwrap(), "#ffffff");
        assert!(lighten("1b1429", 0.0).is_err());
        assert_eq!(lighten("#1b1429", 0.0).unwrap(), "#1b1429");
    }

    #[test]
    fn test_rgb_from_str() {
        let rgb: Rgb = "navy".parse().unwrap();
        assert_eq!(rgb, Rgb::new(0, 0, 128));
        assert_eq!(rgb.to_string(), "#000080");
    }
}
