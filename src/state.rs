//! Palette session state: entries, lock flags, the active image and the
//! random source.
//!
//! A [`PaletteState`] always holds between 1 and [`MAX_ENTRIES`] entries.
//! Regeneration (random or from an image) replaces unlocked entries only;
//! locked entries keep their color and relative order and new entries are
//! appended after them.

use rand::Rng;

use crate::color::Color;
use crate::config::PaletteConfig;
use crate::error::{PaletteError, Result};
use crate::export::{self, ExportFormat};
use crate::kmeans;
use crate::sampler::PixelBuffer;

/// Upper bound on palette size.
pub const MAX_ENTRIES: usize = 10;

/// One swatch of the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    pub color: Color,
    /// Locked entries survive regeneration.
    pub locked: bool,
}

impl PaletteEntry {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            locked: false,
        }
    }
}

/// Which clusterer fills palette slots from an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "native-bin", derive(clap::ValueEnum))]
pub enum ExtractionMethod {
    /// Fixed-budget RGB k-means over every 10th pixel.
    #[default]
    Sampled,
    /// `kmeans_colors` in CIE Lab over every opaque pixel.
    Lab,
}

pub struct PaletteState<R> {
    entries: Vec<PaletteEntry>,
    image: Option<PixelBuffer>,
    rng: R,
    config: PaletteConfig,
    method: ExtractionMethod,
}

impl<R: Rng> PaletteState<R> {
    /// A session with the default config and a random palette of
    /// `default_count` colors.
    pub fn new(rng: R) -> Self {
        Self::build(rng, PaletteConfig::default())
    }

    pub fn with_config(rng: R, config: PaletteConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(rng, config))
    }

    fn build(rng: R, config: PaletteConfig) -> Self {
        let mut state = Self {
            entries: Vec::with_capacity(MAX_ENTRIES),
            image: None,
            rng,
            config,
            method: ExtractionMethod::default(),
        };
        state.generate(state.config.default_count);
        state
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn colors(&self) -> Vec<Color> {
        self.entries.iter().map(|e| e.color).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Never true once constructed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn locked_count(&self) -> usize {
        self.entries.iter().filter(|e| e.locked).count()
    }

    pub fn config(&self) -> &PaletteConfig {
        &self.config
    }

    pub fn method(&self) -> ExtractionMethod {
        self.method
    }

    pub fn set_method(&mut self, method: ExtractionMethod) {
        self.method = method;
    }

    pub fn image(&self) -> Option<&PixelBuffer> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Replace unlocked entries with random colors until the palette holds
    /// `count` entries (clamped to `1..=10`, never dropping locked ones).
    pub fn generate(&mut self, count: usize) {
        let slots = self.open_slots(count);
        let colors: Vec<Color> = (0..slots).map(|_| self.random_color()).collect();
        self.replace_unlocked(colors);
        tracing::debug!(
            requested = count,
            added = slots,
            total = self.entries.len(),
            "Generated random palette"
        );
    }

    /// Fill the unlocked slots with colors clustered from `buffer`, which
    /// becomes the active image.
    ///
    /// Fails with `InsufficientData` without touching the palette when the
    /// buffer has nothing to sample.
    pub fn extract_from_image(&mut self, buffer: PixelBuffer, count: usize) -> Result<()> {
        let slots = self.open_slots(count);
        let colors = extract_colors(&self.config, self.method, &mut self.rng, &buffer, slots)?;
        tracing::info!(
            width = buffer.width(),
            height = buffer.height(),
            colors = colors.len(),
            "Extracted palette from image"
        );
        self.image = Some(buffer);
        self.replace_unlocked(colors);
        Ok(())
    }

    /// Make `buffer` the active image and extract `default_count` colors.
    pub fn load_image(&mut self, buffer: PixelBuffer) -> Result<()> {
        self.extract_from_image(buffer, self.config.default_count)
    }

    /// Decode an encoded image at the configured working size, then
    /// [`load_image`](Self::load_image) it.
    pub fn load_encoded(&mut self, bytes: &[u8]) -> Result<()> {
        let buffer = PixelBuffer::decode(bytes, self.config.working_size)?;
        self.load_image(buffer)
    }

    /// Re-run extraction on the active image.
    pub fn refresh_from_image(&mut self) -> Result<()> {
        let Some(image) = &self.image else {
            return Err(PaletteError::InsufficientData);
        };
        let slots = self.open_slots(self.config.default_count);
        let colors = extract_colors(&self.config, self.method, &mut self.rng, image, slots)?;
        self.replace_unlocked(colors);
        Ok(())
    }

    /// Drop the active image and go back to a random palette.
    pub fn clear_image(&mut self) {
        if self.image.take().is_some() {
            tracing::info!("Cleared active image");
        }
        self.generate(self.config.default_count);
    }

    /// Append one color. Returns `false` when the palette is already full.
    ///
    /// With an active image the color is the last centroid of a clustering
    /// one larger than the current palette; otherwise it is random.
    pub fn add_one(&mut self) -> Result<bool> {
        if self.entries.len() >= MAX_ENTRIES {
            return Ok(false);
        }

        let color = match &self.image {
            Some(image) => {
                let k = self.entries.len() + 1;
                let colors = extract_colors(&self.config, self.method, &mut self.rng, image, k)?;
                match colors.last() {
                    Some(color) => *color,
                    None => self.random_color(),
                }
            }
            None => self.random_color(),
        };

        self.entries.push(PaletteEntry::new(color));
        Ok(true)
    }

    /// Remove the entry at `index`. Returns `false` (and keeps it) when it is
    /// the only entry left.
    pub fn remove_one(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        if self.entries.len() <= 1 {
            return Ok(false);
        }
        self.entries.remove(index);
        Ok(true)
    }

    /// Flip the lock on one entry and return the new state.
    pub fn toggle_lock(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        entry.locked = !entry.locked;
        Ok(entry.locked)
    }

    pub fn lock_all(&mut self) {
        self.entries.iter_mut().for_each(|e| e.locked = true);
    }

    pub fn unlock_all(&mut self) {
        self.entries.iter_mut().for_each(|e| e.locked = false);
    }

    /// Overwrite the color of one entry. The lock flag is unchanged.
    pub fn set_color(&mut self, index: usize, color: Color) -> Result<()> {
        self.check_index(index)?;
        self.entries[index].color = color;
        Ok(())
    }

    /// Parse `text` as a color and set it. Nothing changes if parsing fails.
    pub fn set_color_str(&mut self, index: usize, text: &str) -> Result<()> {
        let color: Color = text.parse()?;
        self.set_color(index, color)
    }

    /// Set an entry to the active image's color at `(x, y)`.
    ///
    /// Returns `false` when the point is outside the image.
    pub fn pick_color(&mut self, index: usize, x: u32, y: u32) -> Result<bool> {
        self.check_index(index)?;
        let image = self.image.as_ref().ok_or(PaletteError::InsufficientData)?;
        let Some(pixel) = image.pixel_at(x, y) else {
            return Ok(false);
        };
        self.entries[index].color = Color::from_rgb(pixel.red, pixel.green, pixel.blue);
        Ok(true)
    }

    /// Replace every entry with colors parsed from exported text, unlocked
    /// and truncated to [`MAX_ENTRIES`].
    pub fn import(&mut self, text: &str) -> Result<()> {
        let colors = export::import(text)?;
        self.entries = colors
            .into_iter()
            .take(MAX_ENTRIES)
            .map(PaletteEntry::new)
            .collect();
        Ok(())
    }

    pub fn export(&self, format: ExportFormat) -> Vec<String> {
        export::export(&self.entries, format)
    }

    pub fn export_text(&self, format: ExportFormat) -> String {
        export::export_text(&self.entries, format)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(PaletteError::EntryOutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        Ok(())
    }

    /// Number of entries a regeneration to `count` adds next to the locked ones.
    fn open_slots(&self, count: usize) -> usize {
        count
            .clamp(1, MAX_ENTRIES)
            .saturating_sub(self.locked_count())
    }

    fn replace_unlocked(&mut self, colors: Vec<Color>) {
        self.entries.retain(|e| e.locked);
        self.entries.extend(colors.into_iter().map(PaletteEntry::new));
        self.entries.truncate(MAX_ENTRIES);
    }

    fn random_color(&mut self) -> Color {
        let saturation = self.config.saturation;
        let lightness = self.config.lightness;
        Color::new(
            self.rng.random_range(0..360),
            self.rng.random_range(saturation.min..=saturation.max),
            self.rng.random_range(lightness.min..=lightness.max),
        )
    }
}

fn extract_colors<R: Rng>(
    config: &PaletteConfig,
    method: ExtractionMethod,
    rng: &mut R,
    buffer: &PixelBuffer,
    k: usize,
) -> Result<Vec<Color>> {
    match method {
        ExtractionMethod::Sampled => {
            let samples = buffer.samples(config.stride())?;
            kmeans::cluster_with_iterations(&samples, k, config.iterations, rng)
        }
        ExtractionMethod::Lab => {
            let pixels = buffer.opaque_pixels();
            kmeans::cluster_lab(&pixels, k, rng.random())
        }
    }
}
