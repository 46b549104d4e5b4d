//! Tunables for sampling, clustering and random palette generation.
//!
//! Every field has a default, so a config file only needs to name the values
//! it changes:
//!
//! ```
//! use image_palette_wasm::PaletteConfig;
//!
//! let config = PaletteConfig::from_json(r#"{ "default_count": 6 }"#).unwrap();
//! assert_eq!(config.default_count, 6);
//! assert_eq!(config.sample_step, 10);
//! ```

use serde::Deserialize;

use crate::error::{PaletteError, Result};
use crate::state::MAX_ENTRIES;

/// Largest `sample_step` whose byte stride still fits in a `usize`.
pub const MAX_SAMPLE_STEP: usize = usize::MAX / 4;

/// Inclusive percentage range used when drawing random saturation/lightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PercentRange {
    pub min: u8,
    pub max: u8,
}

impl PercentRange {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Pixels between two samples (every `sample_step`-th pixel is sampled).
    pub sample_step: usize,
    /// Fixed number of k-means iterations.
    pub iterations: usize,
    /// Palette size used by `load_image`, `refresh_from_image` and `clear_image`.
    pub default_count: usize,
    /// Longest side an encoded image is scaled down to before sampling.
    pub working_size: u32,
    pub saturation: PercentRange,
    pub lightness: PercentRange,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            sample_step: 10,
            iterations: crate::kmeans::ITERATIONS,
            default_count: 5,
            working_size: 400,
            saturation: PercentRange::new(60, 99),
            lightness: PercentRange::new(30, 69),
        }
    }
}

impl PaletteConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PaletteConfig =
            serde_json::from_str(json).map_err(|e| PaletteError::InvalidConfig {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Byte stride matching `sample_step` for a 4-bytes-per-pixel buffer.
    pub fn stride(&self) -> usize {
        self.sample_step.saturating_mul(4)
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(PaletteError::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if self.sample_step == 0 {
            return fail("sample_step must be at least 1");
        }
        if self.sample_step > MAX_SAMPLE_STEP {
            return fail("sample_step is too large");
        }
        if self.iterations == 0 {
            return fail("iterations must be at least 1");
        }
        if self.default_count == 0 || self.default_count > MAX_ENTRIES {
            return fail("default_count must be between 1 and 10");
        }
        if self.working_size == 0 {
            return fail("working_size must be at least 1");
        }
        for (name, range) in [("saturation", self.saturation), ("lightness", self.lightness)] {
            if range.min > range.max || range.max > 100 {
                return Err(PaletteError::InvalidConfig {
                    reason: format!("{name} range {}..={} is not within 0..=100", range.min, range.max),
                });
            }
        }
        Ok(())
    }
}
