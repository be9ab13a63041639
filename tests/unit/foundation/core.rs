use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_frame_times_follow_rational_rate() {
    let fps = Fps::new(30000, 1001).unwrap();
    assert!((fps.frames_to_secs(30) - 1.001).abs() < 1e-12);
}

#[test]
fn fps_ceil_covers_partial_frames_without_float_noise() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(4.0), 120);
    assert_eq!(fps.secs_to_frames_ceil(4.01), 121);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
}

#[test]
fn canvas_rect_spans_frame() {
    let c = Canvas {
        width: 1080,
        height: 1920,
    };
    assert_eq!(c.rect(), Rect::new(0.0, 0.0, 1080.0, 1920.0));
}
