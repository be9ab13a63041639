use super::*;
use crate::assets::media::MediaClip;
use crate::timeline::normalize::normalize;

fn track(seconds: f64) -> MixedTrack {
    MixedTrack {
        sample_rate: 100,
        channels: 2,
        interleaved_f32: vec![0.0; (seconds * 100.0) as usize * 2],
    }
}

fn caption(text: &str, start: f64, end: f64) -> CaptionBlock<()> {
    CaptionBlock {
        text: text.to_string(),
        font_size: 100,
        width: 10.0,
        height: 10.0,
        box_width: 960.0,
        box_height: 1800.0,
        start,
        end,
        truncated: false,
        glyphs: (),
    }
}

fn clip(duration_sec: f64) -> NormalizedClip {
    let media = MediaClip {
        source_path: PathBuf::from("clip.mp4"),
        duration_sec,
        video: None,
        audio: None,
    };
    normalize(&media, 4.0).unwrap()
}

#[test]
fn video_is_trimmed_to_audio_duration() {
    let tl = RenderTimeline::new(&clip(1.5), track(4.0), Vec::<CaptionBlock<()>>::new(), PathBuf::from("o.mp4"))
        .unwrap();
    let total: f64 = tl.video.iter().map(ClipSegment::duration_sec).sum();
    assert!((total - 4.0).abs() < 1e-9);
    assert_eq!(tl.video.len(), 3);
}

#[test]
fn overlapping_captions_are_both_active_in_order() {
    let tl = RenderTimeline::new(
        &clip(5.0),
        track(4.0),
        vec![caption("first", 0.0, 1.0), caption("second", 0.8, 1.5)],
        PathBuf::from("o.mp4"),
    )
    .unwrap();
    let at: Vec<_> = tl.active_captions(0.9).map(|c| c.text.as_str()).collect();
    assert_eq!(at, ["first", "second"]);
    let later: Vec<_> = tl.active_captions(1.2).map(|c| c.text.as_str()).collect();
    assert_eq!(later, ["second"]);
}

#[test]
fn empty_audio_is_rejected() {
    assert!(
        RenderTimeline::new(&clip(5.0), track(0.0), Vec::<CaptionBlock<()>>::new(), PathBuf::from("o.mp4"))
            .is_err()
    );
}
