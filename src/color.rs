//! HSL, RGB and hex conversions.
//!
//! HSL with integer degrees and percentages is the canonical color form in
//! this crate. RGB and hex are always derived from it, so a color picked in
//! RGB (eyedropper, hex input) is stored after a round trip through
//! [`rgb_to_hsl`].

use std::fmt;
use std::str::FromStr;

use crate::error::PaletteError;

/// A color in integer HSL: hue in degrees `0..360`, saturation and lightness
/// in percent `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    h: u16,
    s: u8,
    l: u8,
}

impl Color {
    /// Hue wraps modulo 360; saturation and lightness saturate at 100.
    pub fn new(h: u16, s: u8, l: u8) -> Self {
        Self {
            h: h % 360,
            s: s.min(100),
            l: l.min(100),
        }
    }

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let (h, s, l) = rgb_to_hsl(r, g, b);
        Self::new(h, s, l)
    }

    pub fn hue(&self) -> u16 {
        self.h
    }

    pub fn saturation(&self) -> u8 {
        self.s
    }

    pub fn lightness(&self) -> u8 {
        self.l
    }

    pub fn to_hsl(&self) -> (u16, u8, u8) {
        (self.h, self.s, self.l)
    }

    pub fn to_rgb(&self) -> (u8, u8, u8) {
        hsl_to_rgb(self.h, self.s, self.l)
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        hsl_to_hex(self.h, self.s, self.l)
    }

    /// Uppercase `#RRGGBB`, the form shown on swatch labels.
    pub fn hex_upper(&self) -> String {
        self.to_hex().to_uppercase()
    }

    pub fn rgb_css(&self) -> String {
        let (r, g, b) = self.to_rgb();
        format!("rgb({r}, {g}, {b})")
    }

    pub fn hsl_css(&self) -> String {
        format!("hsl({}, {}%, {}%)", self.h, self.s, self.l)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Convert HSL (degrees, percent, percent) to 8-bit RGB.
///
/// Uses the `k = (n + h / 30) mod 12` channel formulation, with every channel
/// rounded to the nearest integer.
pub fn hsl_to_rgb(h: u16, s: u8, l: u8) -> (u8, u8, u8) {
    let h = f64::from(h % 360);
    let s = f64::from(s.min(100)) / 100.0;
    let l = f64::from(l.min(100)) / 100.0;
    let a = s * l.min(1.0 - l);

    let channel = |n: f64| -> u8 {
        let k = (n + h / 30.0) % 12.0;
        let c = l - a * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0);
        (255.0 * c).round().clamp(0.0, 255.0) as u8
    };

    (channel(0.0), channel(8.0), channel(4.0))
}

/// Convert HSL to a lowercase, zero-padded `#rrggbb` string.
pub fn hsl_to_hex(h: u16, s: u8, l: u8) -> String {
    let (r, g, b) = hsl_to_rgb(h, s, l);
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Convert 8-bit RGB to integer HSL.
///
/// Achromatic input (`max == min`) yields hue and saturation 0. A hue that
/// rounds up to 360 is reported as 0.
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (u16, u8, u8) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    let lightness = (l * 100.0).round() as u8;

    if max == min {
        return (0, 0, lightness);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let sector = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    let h = sector / 6.0;

    (
        ((h * 360.0).round() as u16) % 360,
        (s * 100.0).round() as u8,
        lightness,
    )
}

impl FromStr for Color {
    type Err = PaletteError;

    /// Accepts `#rrggbb`, `rrggbb`, `#rgb`, `rgb(r, g, b)` and
    /// `hsl(h, s%, l%)`, case-insensitively.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim().to_ascii_lowercase();
        let invalid = || PaletteError::invalid_color(input);

        if let Some(args) = function_args(&text, "rgb") {
            let [r, g, b] = args.ok_or_else(invalid)?;
            let channel = |v: &str| v.parse::<u8>().map_err(|_| invalid());
            return Ok(Color::from_rgb(channel(r)?, channel(g)?, channel(b)?));
        }

        if let Some(args) = function_args(&text, "hsl") {
            let [h, s, l] = args.ok_or_else(invalid)?;
            let h = h.parse::<u16>().ok().filter(|h| *h < 360).ok_or_else(invalid)?;
            let percent = |v: &str| {
                v.strip_suffix('%')
                    .unwrap_or(v)
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .filter(|p| *p <= 100)
                    .ok_or_else(invalid)
            };
            return Ok(Color::new(h, percent(s)?, percent(l)?));
        }

        let hex = text.strip_prefix('#').unwrap_or(&text);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let (r, g, b) = match hex.len() {
            6 => (
                u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?,
                u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?,
                u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?,
            ),
            3 => {
                let digit = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| invalid())
                };
                (digit(0)?, digit(1)?, digit(2)?)
            }
            _ => return Err(invalid()),
        };
        Ok(Color::from_rgb(r, g, b))
    }
}

/// Split `name(a, b, c)` into its three trimmed arguments.
///
/// Returns `None` when `text` is not a call to `name`, `Some(None)` when it is
/// but the argument list is malformed.
fn function_args<'a>(text: &'a str, name: &str) -> Option<Option<[&'a str; 3]>> {
    let inner = text.strip_prefix(name)?.trim_start().strip_prefix('(')?;
    let Some(inner) = inner.strip_suffix(')') else {
        return Some(None);
    };
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    Some(match parts.as_slice() {
        [a, b, c] => Some([*a, *b, *c]),
        _ => None,
    })
}
