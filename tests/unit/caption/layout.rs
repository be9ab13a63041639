use super::*;

/// Monospace stand-in: every char is `0.6 * font_size` wide, one line tall.
#[derive(Default)]
struct MonoRenderer {
    fail_above: Option<u32>,
    fail_always: bool,
    calls: Vec<(String, u32)>,
}

impl CaptionRenderer for MonoRenderer {
    type Glyphs = u32;

    fn shape(
        &mut self,
        text: &str,
        font_size: u32,
        _box_width: f32,
        _box_height: f32,
    ) -> ReelResult<ShapedCaption<u32>> {
        self.calls.push((text.to_string(), font_size));
        if self.fail_always || self.fail_above.is_some_and(|limit| font_size > limit) {
            return Err(ReelError::media("font backend unavailable"));
        }
        Ok(ShapedCaption {
            width: text.chars().count() as f32 * font_size as f32 * 3.0 / 5.0,
            height: font_size as f32 * 1.2,
            glyphs: font_size,
        })
    }
}

fn layout(box_width: f32) -> CaptionLayout {
    CaptionLayout {
        max_font_size: 100,
        min_font_size: 50,
        font_size_step: 10,
        max_chars: 10,
        ellipsis: "...".to_string(),
        box_width,
        box_height: 1800.0,
    }
}

fn word(text: &str, start: f64, end: f64) -> WordTiming {
    WordTiming {
        text: text.to_string(),
        start,
        end,
    }
}

#[test]
fn sizes_run_from_max_to_min_inclusive() {
    assert_eq!(layout(400.0).font_sizes(), vec![100, 90, 80, 70, 60, 50]);
    let coarse = CaptionLayout {
        font_size_step: 30,
        ..layout(400.0)
    };
    assert_eq!(coarse.font_sizes(), vec![100, 70, 50]);
    let single = CaptionLayout {
        max_font_size: 50,
        ..layout(400.0)
    };
    assert_eq!(single.font_sizes(), vec![50]);
}

#[test]
fn short_word_fits_at_max_size() {
    let mut r = MonoRenderer::default();
    let block = layout(400.0).layout(&mut r, &word("cat", 1.25, 1.5)).unwrap();
    assert_eq!(block.font_size, 100);
    assert_eq!(block.text, "cat");
    assert!(!block.truncated);
    assert_eq!(block.glyphs, 100);
    assert_eq!(r.calls.len(), 1);
}

#[test]
fn medium_word_takes_largest_fitting_size() {
    // 6 chars: 6 * 0.6 * size <= 300 holds first at 80.
    let mut r = MonoRenderer::default();
    let block = layout(300.0).layout(&mut r, &word("planet", 0.0, 0.4)).unwrap();
    assert_eq!(block.font_size, 80);
    assert!(block.width <= 300.0);
    let tried: Vec<u32> = r.calls.iter().map(|(_, s)| *s).collect();
    assert_eq!(tried, vec![100, 90, 80]);
}

#[test]
fn long_word_falls_back_to_truncated_prefix_at_min_size() {
    let mut r = MonoRenderer::default();
    let w = word("extraordinarily", 2.0, 2.75);
    let block = layout(400.0).layout(&mut r, &w).unwrap();
    assert_eq!(block.text, "extraordin...");
    assert_eq!(block.font_size, 50);
    assert!(block.truncated);
    assert!(block.width <= 400.0);
    assert_eq!(block.start, w.start);
    assert_eq!(block.end, w.end);
}

#[test]
fn truncation_keeps_shortening_until_it_fits() {
    let mut r = MonoRenderer::default();
    let block = layout(300.0)
        .layout(&mut r, &word("extraordinarily", 0.0, 1.0))
        .unwrap();
    // (k + 3) * 30 <= 300 first holds at k = 7.
    assert_eq!(block.text, "extraor...");
    assert!(block.width <= 300.0);
}

#[test]
fn width_never_exceeds_box_for_any_word() {
    let l = layout(250.0);
    for text in ["a", "to", "ocean", "jellyfish", "incomprehensibilities", ""] {
        let mut r = MonoRenderer::default();
        let block = l.layout(&mut r, &word(text, 0.0, 1.0)).unwrap();
        assert!(block.width <= l.box_width, "{text}: {}", block.width);
    }
}

#[test]
fn shaping_errors_count_as_not_fitting() {
    let mut r = MonoRenderer {
        fail_above: Some(60),
        ..MonoRenderer::default()
    };
    let block = layout(400.0).layout(&mut r, &word("cat", 0.0, 1.0)).unwrap();
    assert_eq!(block.font_size, 60);
}

#[test]
fn fallback_failure_is_a_recoverable_caption_error() {
    let mut r = MonoRenderer {
        fail_always: true,
        ..MonoRenderer::default()
    };
    let err = layout(400.0).layout(&mut r, &word("cat", 0.0, 1.0)).unwrap_err();
    assert!(matches!(err, ReelError::CaptionRender(_)));
    assert!(err.is_recoverable());
}

#[test]
fn layout_all_skips_unrenderable_words_and_keeps_the_rest() {
    let l = CaptionLayout {
        // Too wide on its own at the minimum size, so nothing can fit.
        ellipsis: "\u{2026}".repeat(11),
        ..layout(300.0)
    };
    let words = vec![
        word("sea", 0.0, 0.3),
        word("extraordinarily", 0.3, 1.0),
        word("otters", 1.0, 1.4),
    ];
    let mut r = MonoRenderer::default();
    let batch = layout_all(&l, &mut r, &words).unwrap();
    let texts: Vec<_> = batch.blocks.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(texts, ["sea", "otters"]);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].word.text, "extraordinarily");
}

#[test]
fn parallel_layout_matches_sequential_order() {
    let l = layout(400.0);
    let words: Vec<_> = (0..64)
        .map(|i| {
            let text = "w".repeat(1 + i % 17);
            word(&text, i as f64 * 0.25, i as f64 * 0.25 + 0.3)
        })
        .collect();

    let mut r = MonoRenderer::default();
    let seq = layout_all(&l, &mut r, &words).unwrap();
    let par = layout_parallel(&l, MonoRenderer::default, &words, Some(4)).unwrap();

    assert_eq!(seq.blocks.len(), par.blocks.len());
    for (a, b) in seq.blocks.iter().zip(&par.blocks) {
        assert_eq!(a.text, b.text);
        assert_eq!(a.font_size, b.font_size);
        assert_eq!(a.start, b.start);
        assert_eq!(a.end, b.end);
    }
}

#[test]
fn zero_threads_is_rejected() {
    let err = layout_parallel(&layout(400.0), MonoRenderer::default, &[], Some(0)).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn active_window_is_half_open() {
    let mut r = MonoRenderer::default();
    let block = layout(400.0).layout(&mut r, &word("cat", 1.0, 2.0)).unwrap();
    assert!(!block.is_active_at(0.999));
    assert!(block.is_active_at(1.0));
    assert!(block.is_active_at(1.999));
    assert!(!block.is_active_at(2.0));
}

#[test]
fn parley_long_word_truncates_to_fit_narrow_box() {
    use crate::caption::shape::{CaptionFont, ParleyCaptionRenderer};
    use crate::foundation::core::Rgba8;

    let font = CaptionFont::load(std::path::Path::new("tests/data/fonts/DejaVuSans.ttf")).unwrap();
    let mut renderer = ParleyCaptionRenderer::new(std::sync::Arc::new(font), Rgba8::WHITE);
    let l = layout(300.0);

    let block = l
        .layout(&mut renderer, &word("extraordinarily", 1.25, 2.5))
        .unwrap();
    assert!(block.truncated);
    assert_eq!(block.font_size, 50);
    assert_eq!(block.text, "extraordi...");
    assert!(block.width > 0.0 && block.width <= 300.0, "{}", block.width);
    assert_eq!((block.start, block.end), (1.25, 2.5));

    let short = l.layout(&mut renderer, &word("sun", 0.0, 0.4)).unwrap();
    assert!(!short.truncated);
    assert_eq!(short.font_size, 100);
    assert!(short.width <= 300.0);
}
