use super::*;

#[test]
fn ratio_parsing_rejects_zero_denominator() {
    assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
    assert_eq!(parse_ff_ratio("25/1"), Some((25, 1)));
    assert_eq!(parse_ff_ratio("0/0"), None);
    assert_eq!(parse_ff_ratio("abc"), None);
}

#[test]
fn pcm_duration_counts_frames_not_samples() {
    let pcm = AudioPcm {
        sample_rate: 4,
        channels: 2,
        interleaved_f32: vec![0.0; 16],
    };
    assert_eq!(pcm.frames(), 8);
    assert!((pcm.duration_sec() - 2.0).abs() < 1e-12);
}

#[test]
fn probe_missing_file_is_asset_unavailable() {
    let err = probe_media(Path::new("definitely/not/here.mp4")).unwrap_err();
    assert!(matches!(err, ReelError::AssetUnavailable(_)));
}

#[test]
fn require_stream_reports_missing_kind() {
    let clip = MediaClip {
        source_path: PathBuf::from("voice.mp3"),
        duration_sec: 3.0,
        video: None,
        audio: Some(AudioStreamInfo {
            sample_rate: 24_000,
            channels: 1,
        }),
    };
    assert!(clip.require_audio().is_ok());
    assert!(matches!(
        clip.require_video().unwrap_err(),
        ReelError::AssetUnavailable(_)
    ));
}

#[test]
fn decode_limit_must_be_positive() {
    let err = decode_audio_f32_stereo(Path::new("music.mp3"), 48_000, Some(0.0)).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn decode_limit_reads_only_the_window() {
    if !media_tools_available() {
        return;
    }
    let src = crate::foundation::scratch::TempFileGuard::new(
        crate::foundation::scratch::scratch_path("decode_limit", "wav"),
    );
    let path = src.path().unwrap().to_path_buf();
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-y", "-f", "lavfi", "-i"])
        .arg("sine=frequency=220:sample_rate=8000")
        .args(["-t", "3"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success());

    let full = decode_audio_f32_stereo(&path, 8_000, None).unwrap();
    let window = decode_audio_f32_stereo(&path, 8_000, Some(0.5)).unwrap();
    assert!((full.duration_sec() - 3.0).abs() < 0.01, "{}", full.duration_sec());
    assert!((window.duration_sec() - 0.5).abs() < 0.01, "{}", window.duration_sec());
    assert_eq!(window.channels, 2);
}
