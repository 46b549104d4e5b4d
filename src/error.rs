//! Error types for palette extraction and palette editing.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PaletteError>;

#[derive(Error, Debug)]
pub enum PaletteError {
    /// The pixel buffer or sample set is too small to cluster.
    #[error("not enough pixel data to extract colors")]
    InsufficientData,

    /// A color string could not be parsed as hex, `rgb(...)` or `hsl(...)`.
    #[error("invalid color format: {input:?}")]
    InvalidColorFormat { input: String },

    #[error("unknown export format {name:?} (expected hex, rgb or hsl)")]
    UnknownFormat { name: String },

    #[error("palette entry {index} does not exist (palette has {len} entries)")]
    EntryOutOfRange { index: usize, len: usize },

    /// Raw RGBA data whose length does not match the stated dimensions.
    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGBA")]
    InvalidDimensions { width: u32, height: u32, len: usize },

    #[error("unable to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl PaletteError {
    pub(crate) fn invalid_color(input: impl Into<String>) -> Self {
        PaletteError::InvalidColorFormat {
            input: input.into(),
        }
    }
}
