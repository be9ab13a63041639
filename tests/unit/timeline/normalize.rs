use super::*;

fn clip(duration_sec: f64) -> MediaClip {
    MediaClip {
        source_path: PathBuf::from("footage/ocean.mp4"),
        duration_sec,
        video: None,
        audio: None,
    }
}

#[test]
fn short_clip_loops_three_times_then_trims_to_narration() {
    let n = normalize(&clip(1.5), 4.0).unwrap();
    assert_eq!(n.loop_count(), 3);
    assert!((n.duration_sec() - 4.5).abs() < 1e-9);

    let trimmed = n.trim_to(4.0).unwrap();
    assert_eq!(trimmed.len(), 3);
    assert_eq!(trimmed[0].start_sec, 0.0);
    assert!((trimmed[0].end_sec - 1.5).abs() < 1e-9);
    assert!((trimmed[1].end_sec - 1.5).abs() < 1e-9);
    assert!((trimmed[2].end_sec - 1.0).abs() < 1e-9);
    let total: f64 = trimmed.iter().map(ClipSegment::duration_sec).sum();
    assert!((total - 4.0).abs() < 1e-9);
}

#[test]
fn long_clip_passes_through() {
    let n = normalize(&clip(12.0), 4.0).unwrap();
    assert_eq!(n.loop_count(), 1);
    assert_eq!(n.duration_sec(), 12.0);
    let trimmed = n.trim_to(4.0).unwrap();
    assert_eq!(trimmed.len(), 1);
    assert_eq!(trimmed[0].end_sec, 4.0);
}

#[test]
fn loop_count_is_ceil_of_ratio() {
    for (d, t) in [(1.0, 3.0), (0.7, 5.0), (2.0, 2.5), (3.0, 3.0), (0.25, 10.1)] {
        let n = normalize(&clip(d), t).unwrap();
        assert_eq!(n.loop_count(), (t / d).ceil() as usize, "d={d} t={t}");
        assert!(n.duration_sec() >= t);
    }
}

#[test]
fn non_positive_target_is_invalid_duration() {
    for t in [0.0, -1.0, f64::NAN] {
        assert!(matches!(
            normalize(&clip(1.0), t).unwrap_err(),
            ReelError::InvalidDuration(_)
        ));
    }
}

#[test]
fn empty_clip_is_invalid_duration() {
    assert!(matches!(
        normalize(&clip(0.0), 2.0).unwrap_err(),
        ReelError::InvalidDuration(_)
    ));
}

#[test]
fn trimming_past_the_end_is_rejected() {
    let n = normalize(&clip(1.0), 2.0).unwrap();
    assert!(n.trim_to(2.5).is_err());
}

#[test]
fn window_starts_inside_a_later_loop() {
    let n = normalize(&clip(1.5), 4.0).unwrap();
    let w = n.window(2.0, 1.5).unwrap();
    assert_eq!(w.len(), 2);
    assert!((w[0].start_sec - 0.5).abs() < 1e-9);
    assert!((w[0].end_sec - 1.5).abs() < 1e-9);
    assert_eq!(w[1].start_sec, 0.0);
    assert!((w[1].end_sec - 0.5).abs() < 1e-9);
}
