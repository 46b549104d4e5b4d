use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::Regex;

use image_palette_wasm::{
    Color, ExportFormat, ExtractionMethod, MAX_ENTRIES, PaletteApp, PaletteError, PaletteState,
    PixelBuffer, extract_palette_bytes,
};

fn encode_png(img: RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn split_image() -> Vec<u8> {
    encode_png(RgbaImage::from_fn(40, 20, |x, _| {
        if x < 20 {
            Rgba([220, 30, 30, 255])
        } else {
            Rgba([30, 30, 220, 255])
        }
    }))
}

#[test]
fn uniform_image_gives_uniform_palette() {
    let png = encode_png(RgbaImage::from_pixel(64, 64, Rgba([51, 102, 153, 255])));
    let palette = extract_palette_bytes(&png, 5, ExtractionMethod::Sampled, 9).unwrap();
    assert_eq!(palette, vec!["#336699"; 5]);
}

#[test]
fn extraction_is_reproducible_per_seed() {
    let png = split_image();
    let a = extract_palette_bytes(&png, 3, ExtractionMethod::Sampled, 11).unwrap();
    let b = extract_palette_bytes(&png, 3, ExtractionMethod::Sampled, 11).unwrap();
    assert_eq!(a, b);

    let hex = Regex::new("^#[0-9a-f]{6}$").unwrap();
    assert_eq!(a.len(), 3);
    assert!(a.iter().all(|c| hex.is_match(c)));
}

#[test]
fn undecodable_bytes_are_reported() {
    assert!(matches!(
        extract_palette_bytes(b"\x89PNG but not really", 5, ExtractionMethod::Sampled, 0),
        Err(PaletteError::ImageDecode(_))
    ));
}

#[test]
fn locked_colors_survive_an_image_upload() {
    let mut state = PaletteState::new(StdRng::seed_from_u64(5));
    state.set_color_str(0, "#00ff00").unwrap();
    state.toggle_lock(0).unwrap();

    state.load_encoded(&split_image()).unwrap();

    assert!(state.has_image());
    assert_eq!(state.len(), 5);
    assert_eq!(state.entries()[0].color, Color::new(120, 100, 50));
    assert!(state.entries()[0].locked);
    assert_eq!(state.locked_count(), 1);

    // Centroids are means of red and blue samples, so they sit on the
    // red-purple-blue arc and never near the locked green.
    for entry in &state.entries()[1..] {
        let hue = entry.color.hue();
        assert!(hue == 0 || hue >= 240, "unexpected {}", entry.color);
    }
}

#[test]
fn palette_stays_within_bounds_through_a_session() {
    let mut state = PaletteState::new(StdRng::seed_from_u64(8));
    for _ in 0..20 {
        state.add_one().unwrap();
    }
    assert_eq!(state.len(), MAX_ENTRIES);

    for _ in 0..20 {
        state.remove_one(0).unwrap();
    }
    assert_eq!(state.len(), 1);

    state.load_image(PixelBuffer::new(10, 10, vec![200; 400]).unwrap()).unwrap();
    for _ in 0..20 {
        state.add_one().unwrap();
    }
    assert_eq!(state.len(), MAX_ENTRIES);
    assert!(state.colors().iter().all(|c| *c == Color::from_rgb(200, 200, 200)));
}

#[test]
fn clipboard_text_restores_a_palette() {
    let mut source = PaletteState::new(StdRng::seed_from_u64(21));
    source.generate(7);
    let text = source.export_text(ExportFormat::Hsl);
    assert_eq!(text.lines().count(), 7);

    let mut target = PaletteState::new(StdRng::seed_from_u64(22));
    target.import(&text).unwrap();
    assert_eq!(target.colors(), source.colors());
}

#[test]
fn lab_extraction_through_the_native_helper() {
    let palette = extract_palette_bytes(&split_image(), 2, ExtractionMethod::Lab, 3).unwrap();
    assert_eq!(palette.len(), 2);
}

#[test]
fn wasm_session_without_a_browser() {
    let mut app = PaletteApp::new(None).unwrap();
    assert_eq!(app.len(), 5);
    assert!(!app.is_empty());
    app.generate(7);
    assert_eq!(app.len(), 7);
    assert_eq!(app.export_text("hsl").unwrap().lines().count(), 7);
    assert!(!app.has_image());
}
