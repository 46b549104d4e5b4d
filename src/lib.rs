//! Color-palette extraction from images, with an editable palette session.
//!
//! Pipeline: a decoded RGBA buffer is sampled every 10th pixel
//! ([`sampler`]), the samples are clustered with a fixed-budget k-means
//! ([`kmeans`]), centroids are stored as HSL ([`color`]) in a
//! [`PaletteState`] that honours locked entries ([`state`]), and the palette
//! is exported as hex, rgb or hsl text ([`export`]).
//!
//! [`PaletteApp`] exposes the session to JavaScript via `wasm-bindgen`.

use js_sys::Array;
use rand::SeedableRng;
use rand::rngs::StdRng;
use wasm_bindgen::prelude::*;

pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod kmeans;
pub mod sampler;
pub mod state;

pub use color::{Color, hsl_to_hex, hsl_to_rgb, rgb_to_hsl};
pub use config::{PaletteConfig, PercentRange};
pub use error::{PaletteError, Result};
pub use export::ExportFormat;
pub use sampler::{Pixel, PixelBuffer};
pub use state::{ExtractionMethod, MAX_ENTRIES, PaletteEntry, PaletteState};

fn to_js(err: PaletteError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ------------------------------------------------------------
// wasm surface
// ------------------------------------------------------------

/// Browser-facing palette session.
///
/// Every method maps to one user action; entries are addressed by their
/// position in the palette.
#[wasm_bindgen]
pub struct PaletteApp {
    state: PaletteState<StdRng>,
}

#[wasm_bindgen]
impl PaletteApp {
    /// Create a session, optionally from a JSON config.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> std::result::Result<PaletteApp, JsValue> {
        let config = match config_json {
            Some(json) => PaletteConfig::from_json(&json).map_err(to_js)?,
            None => PaletteConfig::default(),
        };
        let state = PaletteState::with_config(StdRng::from_os_rng(), config).map_err(to_js)?;
        Ok(PaletteApp { state })
    }

    pub fn generate(&mut self, count: usize) {
        self.state.generate(count);
    }

    /// Decode an uploaded image and extract a palette from it.
    ///
    /// Returns `false` when the image had no usable pixels and a random
    /// palette was generated instead.
    pub fn load_image(&mut self, input: Vec<u8>) -> std::result::Result<bool, JsValue> {
        let outcome = self.state.load_encoded(&input);
        self.fall_back_on_empty(outcome)
    }

    /// Same as `load_image` for RGBA bytes already read from a canvas.
    pub fn load_rgba(
        &mut self,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> std::result::Result<bool, JsValue> {
        let buffer = PixelBuffer::new(width, height, data).map_err(to_js)?;
        let outcome = self.state.load_image(buffer);
        self.fall_back_on_empty(outcome)
    }

    pub fn refresh_from_image(&mut self) -> std::result::Result<(), JsValue> {
        self.state.refresh_from_image().map_err(to_js)
    }

    pub fn clear_image(&mut self) {
        self.state.clear_image();
    }

    pub fn add_one(&mut self) -> std::result::Result<bool, JsValue> {
        self.state.add_one().map_err(to_js)
    }

    pub fn remove_one(&mut self, index: usize) -> std::result::Result<bool, JsValue> {
        self.state.remove_one(index).map_err(to_js)
    }

    pub fn toggle_lock(&mut self, index: usize) -> std::result::Result<bool, JsValue> {
        self.state.toggle_lock(index).map_err(to_js)
    }

    pub fn lock_all(&mut self) {
        self.state.lock_all();
    }

    pub fn unlock_all(&mut self) {
        self.state.unlock_all();
    }

    /// Set an entry from a hex, `rgb(...)` or `hsl(...)` string.
    pub fn set_color(&mut self, index: usize, text: &str) -> std::result::Result<(), JsValue> {
        self.state.set_color_str(index, text).map_err(to_js)
    }

    /// Eyedropper: set an entry from the active image at `(x, y)`.
    pub fn pick_color(&mut self, index: usize, x: u32, y: u32) -> std::result::Result<bool, JsValue> {
        self.state.pick_color(index, x, y).map_err(to_js)
    }

    pub fn import_text(&mut self, text: &str) -> std::result::Result<(), JsValue> {
        self.state.import(text).map_err(to_js)
    }

    /// Clipboard text in `"hex"`, `"rgb"` or `"hsl"` format.
    pub fn export_text(&self, format: &str) -> std::result::Result<String, JsValue> {
        let format: ExportFormat = format.parse().map_err(to_js)?;
        Ok(self.state.export_text(format))
    }

    /// Swatch colors as `#rrggbb` strings.
    pub fn colors(&self) -> Array {
        let colors = Array::new();
        for hex in self.state.export(ExportFormat::Hex) {
            colors.push(&JsValue::from_str(&hex));
        }
        colors
    }

    pub fn locked(&self) -> Array {
        let locked = Array::new();
        for entry in self.state.entries() {
            locked.push(&JsValue::from_bool(entry.locked));
        }
        locked
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn has_image(&self) -> bool {
        self.state.has_image()
    }
}

impl PaletteApp {
    fn fall_back_on_empty(&mut self, outcome: Result<()>) -> std::result::Result<bool, JsValue> {
        match outcome {
            Ok(()) => Ok(true),
            Err(PaletteError::InsufficientData) => {
                tracing::warn!("Image has no usable pixels, generating a random palette");
                let count = self.state.config().default_count;
                self.state.generate(count);
                Ok(false)
            }
            Err(err) => Err(to_js(err)),
        }
    }
}

// ------------------------------------------------------------
// Native helper
// ------------------------------------------------------------

/// Decode `input` and return `n_colors` palette colors as `#rrggbb`.
///
/// `seed` drives centroid seeding, so equal inputs give equal palettes.
#[cfg(not(target_arch = "wasm32"))]
pub fn extract_palette_bytes(
    input: &[u8],
    n_colors: usize,
    method: ExtractionMethod,
    seed: u64,
) -> Result<Vec<String>> {
    let mut state = PaletteState::new(StdRng::seed_from_u64(seed));
    state.set_method(method);
    let buffer = PixelBuffer::decode(input, state.config().working_size)?;
    state.extract_from_image(buffer, n_colors)?;
    Ok(state.export(ExportFormat::Hex))
}
