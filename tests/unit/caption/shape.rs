use super::*;

const FONT: &str = "tests/data/fonts/DejaVuSans.ttf";

fn renderer() -> ParleyCaptionRenderer {
    let font = CaptionFont::load(Path::new(FONT)).unwrap();
    ParleyCaptionRenderer::new(Arc::new(font), Rgba8::WHITE)
}

#[test]
fn font_family_is_detected_from_bytes() {
    let font = CaptionFont::load(Path::new(FONT)).unwrap();
    assert!(!font.family().trim().is_empty());
}

#[test]
fn missing_font_is_asset_unavailable() {
    let err = CaptionFont::load(Path::new("tests/data/fonts/missing.ttf")).unwrap_err();
    assert!(matches!(err, ReelError::AssetUnavailable(_)));
}

#[test]
fn garbage_font_bytes_are_rejected() {
    assert!(CaptionFont::from_bytes(b"not a font".to_vec()).is_err());
}

#[test]
fn larger_sizes_measure_wider() {
    let mut r = renderer();
    let small = r.shape("ocean", 50, 960.0, 1800.0).unwrap();
    let large = r.shape("ocean", 100, 960.0, 1800.0).unwrap();
    assert!(small.width > 0.0);
    assert!(large.width > small.width);
    assert!(large.height > small.height);
}

#[test]
fn single_long_word_overflows_a_narrow_box() {
    let mut r = renderer();
    let shaped = r.shape("extraordinarily", 100, 200.0, 1800.0).unwrap();
    assert!(shaped.width > 200.0);
}

#[test]
fn brush_carries_caption_color() {
    let mut r = renderer();
    let shaped = r.shape("hi", 60, 960.0, 1800.0).unwrap();
    let mut seen = false;
    for line in shaped.glyphs.layout.lines() {
        for item in line.items() {
            if let parley::layout::PositionedLayoutItem::GlyphRun(run) = item {
                assert_eq!(run.style().brush, CaptionBrush::from(Rgba8::WHITE));
                seen = true;
            }
        }
    }
    assert!(seen);
}
