//! Text export of palette entries, and import of exported text.

use std::fmt;
use std::str::FromStr;

use crate::color::Color;
use crate::error::{PaletteError, Result};
use crate::state::PaletteEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "native-bin", derive(clap::ValueEnum))]
pub enum ExportFormat {
    /// `#rrggbb`
    #[default]
    Hex,
    /// `rgb(r, g, b)`
    Rgb,
    /// `hsl(h, s%, l%)`
    Hsl,
}

impl ExportFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Hex => "hex",
            ExportFormat::Rgb => "rgb",
            ExportFormat::Hsl => "hsl",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExportFormat {
    type Err = PaletteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(ExportFormat::Hex),
            "rgb" => Ok(ExportFormat::Rgb),
            "hsl" => Ok(ExportFormat::Hsl),
            _ => Err(PaletteError::UnknownFormat { name: s.to_string() }),
        }
    }
}

pub fn format_color(color: &Color, format: ExportFormat) -> String {
    match format {
        ExportFormat::Hex => color.to_hex(),
        ExportFormat::Rgb => color.rgb_css(),
        ExportFormat::Hsl => color.hsl_css(),
    }
}

/// One formatted string per entry, in palette order.
pub fn export(entries: &[PaletteEntry], format: ExportFormat) -> Vec<String> {
    entries
        .iter()
        .map(|entry| format_color(&entry.color, format))
        .collect()
}

/// Newline-joined export, ready for the clipboard.
pub fn export_text(entries: &[PaletteEntry], format: ExportFormat) -> String {
    export(entries, format).join("\n")
}

/// Parse one color per non-empty line, in any export format.
///
/// The whole text is rejected if any line is malformed or no line holds a
/// color.
pub fn import(text: &str) -> Result<Vec<Color>> {
    let colors = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::parse::<Color>)
        .collect::<Result<Vec<_>>>()?;

    if colors.is_empty() {
        return Err(PaletteError::InsufficientData);
    }
    Ok(colors)
}
