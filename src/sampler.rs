//! Pixel buffers and stride sampling.

use image::{DynamicImage, GenericImageView, RgbaImage, imageops::FilterType};
use palette::Srgb;

use crate::error::{PaletteError, Result};

/// One sampled RGB pixel. Alpha is dropped when sampling.
pub type Pixel = Srgb<u8>;

/// Bytes between two samples: every 10th pixel of a 4-bytes-per-pixel buffer.
pub const DEFAULT_STRIDE: usize = 4 * 10;

/// Take one pixel every `stride` bytes, starting at offset 0.
///
/// A pixel is taken wherever at least three bytes (r, g, b) remain at the
/// offset. A `stride` of 0 samples every pixel.
pub fn sample(buffer: &[u8], stride: usize) -> Result<Vec<Pixel>> {
    let stride = if stride == 0 { 4 } else { stride };

    let samples: Vec<Pixel> = (0..buffer.len())
        .step_by(stride)
        .filter_map(|offset| buffer.get(offset..offset + 3))
        .map(|rgb| Srgb::new(rgb[0], rgb[1], rgb[2]))
        .collect();

    if samples.is_empty() {
        return Err(PaletteError::InsufficientData);
    }

    tracing::debug!(bytes = buffer.len(), stride, samples = samples.len(), "Sampled pixel buffer");
    Ok(samples)
}

/// A decoded image as row-major RGBA bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes. `data` must hold exactly `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(PaletteError::InvalidDimensions {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Decode an encoded image (PNG, JPEG, ...) and scale it so its longest
    /// side is at most `working_size`, keeping the aspect ratio.
    pub fn decode(bytes: &[u8], working_size: u32) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(&img, working_size))
    }

    pub fn from_image(img: &DynamicImage, working_size: u32) -> Self {
        let (orig_w, orig_h) = img.dimensions();
        let max_side = orig_w.max(orig_h);

        let rgba: RgbaImage = if max_side > working_size && working_size > 0 {
            let ratio = working_size as f32 / max_side as f32;
            let w = ((orig_w as f32) * ratio).round().max(1.0) as u32;
            let h = ((orig_h as f32) * ratio).round().max(1.0) as u32;
            tracing::debug!(orig_w, orig_h, w, h, "Scaling image to working size");
            image::imageops::resize(img, w, h, FilterType::Triangle)
        } else {
            img.to_rgba8()
        };

        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            data: rgba.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Color under `(x, y)`, or `None` outside the image.
    pub fn pixel_at(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let rgb = self.data.get(idx..idx + 3)?;
        Some(Srgb::new(rgb[0], rgb[1], rgb[2]))
    }

    pub fn samples(&self, stride: usize) -> Result<Vec<Pixel>> {
        sample(&self.data, stride)
    }

    /// Opaque pixels only, for the Lab backend.
    pub fn opaque_pixels(&self) -> Vec<Pixel> {
        self.data
            .chunks_exact(4)
            .filter(|chunk| chunk[3] != 0)
            .map(|chunk| Srgb::new(chunk[0], chunk[1], chunk[2]))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use pretty_assertions::assert_eq;

    fn gradient(pixels: usize) -> Vec<u8> {
        (0..pixels)
            .flat_map(|i| [i as u8, (i * 2) as u8, (i * 3) as u8, 255])
            .collect()
    }

    #[test]
    fn samples_every_tenth_pixel() {
        let samples = sample(&gradient(25), DEFAULT_STRIDE).unwrap();
        assert_eq!(
            samples,
            vec![Srgb::new(0, 0, 0), Srgb::new(10, 20, 30), Srgb::new(20, 40, 60)]
        );
    }

    #[test]
    fn three_bytes_is_enough() {
        assert_eq!(sample(&[1, 2, 3], DEFAULT_STRIDE).unwrap(), vec![Srgb::new(1, 2, 3)]);
    }

    #[test]
    fn too_small_buffer_is_insufficient() {
        assert!(matches!(sample(&[], DEFAULT_STRIDE), Err(PaletteError::InsufficientData)));
        assert!(matches!(sample(&[9, 9], DEFAULT_STRIDE), Err(PaletteError::InsufficientData)));
    }

    #[test]
    fn zero_stride_samples_every_pixel() {
        assert_eq!(sample(&gradient(7), 0).unwrap().len(), 7);
    }

    #[test]
    fn new_checks_length() {
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            PixelBuffer::new(2, 2, vec![0; 15]),
            Err(PaletteError::InvalidDimensions { width: 2, height: 2, len: 15 })
        ));
    }

    #[test]
    fn pixel_at_reads_row_major() {
        let buffer = PixelBuffer::new(5, 5, gradient(25)).unwrap();
        assert_eq!(buffer.pixel_at(2, 1), Some(Srgb::new(7, 14, 21)));
        assert_eq!(buffer.pixel_at(5, 0), None);
        assert_eq!(buffer.pixel_at(0, 5), None);
    }

    #[test]
    fn opaque_pixels_skip_transparent() {
        let data = vec![1, 1, 1, 255, 2, 2, 2, 0, 3, 3, 3, 10];
        let buffer = PixelBuffer::new(3, 1, data).unwrap();
        assert_eq!(
            buffer.opaque_pixels(),
            vec![Srgb::new(1, 1, 1), Srgb::new(3, 3, 3)]
        );
    }

    #[test]
    fn decode_scales_to_working_size() {
        let img = RgbaImage::from_pixel(800, 200, Rgba([10, 200, 30, 255]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let buffer = PixelBuffer::decode(&png, 400).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (400, 100));
        assert_eq!(buffer.data().len(), 400 * 100 * 4);
        assert_eq!(buffer.pixel_at(123, 45), Some(Srgb::new(10, 200, 30)));

        let small = PixelBuffer::decode(&png, 1000).unwrap();
        assert_eq!((small.width(), small.height()), (800, 200));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            PixelBuffer::decode(b"not an image", 400),
            Err(PaletteError::ImageDecode(_))
        ));
    }
}
