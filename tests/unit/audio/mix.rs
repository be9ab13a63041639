use super::*;

fn cfg(rate: u32) -> MixConfig {
    MixConfig {
        sample_rate: rate,
        ..MixConfig::default()
    }
}

fn constant_pcm(rate: u32, seconds: f64, value: f32) -> AudioPcm {
    let frames = (seconds * f64::from(rate)).round() as usize;
    AudioPcm {
        sample_rate: rate,
        channels: 2,
        interleaved_f32: vec![value; frames * 2],
    }
}

#[test]
fn output_duration_equals_narration() {
    let spec = AudioMixSpec::new(&cfg(100), 1.5, 10.0).unwrap();
    let narration = constant_pcm(100, 1.5, 0.5);
    let music = constant_pcm(100, 10.0, 1.0);
    let mixed = mix(&spec, &narration, &music).unwrap();
    assert_eq!(mixed.frames(), 150);
    assert!((mixed.duration_sec() - 1.5).abs() < 1e-9);
}

#[test]
fn music_is_ducked_under_narration() {
    let spec = AudioMixSpec::new(&cfg(100), 1.0, 2.0).unwrap();
    assert_eq!(spec.narration_gain, 1.0);
    assert_eq!(spec.music_gain, 0.08);
    let mixed = mix(
        &spec,
        &constant_pcm(100, 1.0, 0.5),
        &constant_pcm(100, 2.0, 1.0),
    )
    .unwrap();
    for s in &mixed.interleaved_f32 {
        assert!((s - 0.58).abs() < 1e-6);
    }
}

#[test]
fn loud_inputs_are_not_clamped() {
    let spec = AudioMixSpec::new(&cfg(10), 1.0, 1.0).unwrap();
    let mixed = mix(
        &spec,
        &constant_pcm(10, 1.0, 1.0),
        &constant_pcm(10, 1.0, 1.0),
    )
    .unwrap();
    assert!(mixed.interleaved_f32.iter().all(|s| (s - 1.08).abs() < 1e-6));
}

#[test]
fn short_music_is_insufficient() {
    let err = AudioMixSpec::new(&cfg(100), 5.0, 3.0).unwrap_err();
    match err {
        ReelError::InsufficientMusic {
            music_sec,
            narration_sec,
        } => {
            assert_eq!(music_sec, 3.0);
            assert_eq!(narration_sec, 5.0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn equal_length_music_is_accepted() {
    assert!(AudioMixSpec::new(&cfg(100), 5.0, 5.0).is_ok());
    assert!(AudioMixSpec::new(&cfg(100), 5.0, 5.0 - MUSIC_DURATION_TOLERANCE_SEC / 2.0).is_ok());
}

#[test]
fn decoded_tail_shortfall_counts_as_silence() {
    let spec = AudioMixSpec::new(&cfg(10), 1.0, 1.0).unwrap();
    let mixed = mix(
        &spec,
        &constant_pcm(10, 0.5, 1.0),
        &constant_pcm(10, 1.0, 0.0),
    )
    .unwrap();
    assert_eq!(mixed.frames(), 10);
    assert_eq!(mixed.interleaved_f32[0], 1.0);
    assert_eq!(mixed.interleaved_f32[19], 0.0);
}

#[test]
fn mono_input_is_rejected() {
    let spec = AudioMixSpec::new(&cfg(10), 1.0, 1.0).unwrap();
    let mono = AudioPcm {
        sample_rate: 10,
        channels: 1,
        interleaved_f32: vec![0.0; 10],
    };
    assert!(matches!(
        mix(&spec, &mono, &constant_pcm(10, 1.0, 0.0)).unwrap_err(),
        ReelError::Validation(_)
    ));
}

#[test]
fn f32le_file_roundtrips_bytes() {
    let dir = std::env::temp_dir().join(format!("factreel_mix_{}", std::process::id()));
    let path = dir.join("mix.f32le");
    write_mix_to_f32le_file(&[0.25, -1.0], &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 8);
    assert_eq!(f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]), -1.0);
    let _ = std::fs::remove_dir_all(&dir);
}
