use super::*;
use crate::foundation::scratch::{TempFileGuard, scratch_path};

#[test]
fn never_completing_conversion_times_out() {
    let path = scratch_path("never_ready", "wav");
    let err = poll_until_ready(
        &path,
        Duration::from_millis(30),
        Duration::from_millis(5),
        || Ok(Completion::Running),
    )
    .unwrap_err();
    match err {
        ReelError::FileNotReady { path: p, waited_ms } => {
            assert_eq!(p, path);
            assert!(waited_ms >= 30);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ready_after_a_few_polls() {
    let path = scratch_path("ready_later", "wav");
    let _guard = TempFileGuard::new(&path);
    let mut polls = 0;
    poll_until_ready(
        &path,
        Duration::from_secs(5),
        Duration::from_millis(1),
        || {
            polls += 1;
            if polls < 3 {
                return Ok(Completion::Running);
            }
            std::fs::write(&path, b"RIFF")?;
            Ok(Completion::Succeeded)
        },
    )
    .unwrap();
    assert_eq!(polls, 3);
}

#[test]
fn exit_without_file_is_media_error() {
    let path = scratch_path("exited_empty", "wav");
    let err = poll_until_ready(
        &path,
        Duration::from_secs(1),
        Duration::from_millis(1),
        || Ok(Completion::Succeeded),
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Media(_)));
}

#[test]
fn canonical_wav_spec_is_checked() {
    let path = scratch_path("canonical", "wav");
    let _guard = TempFileGuard::new(&path);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut w = hound::WavWriter::create(&path, spec).unwrap();
    for s in [0i16, 100, -100, i16::MAX] {
        w.write_sample(s).unwrap();
    }
    w.finalize().unwrap();

    assert_eq!(
        read_canonical_wav(&path, 16_000).unwrap(),
        vec![0, 100, -100, i16::MAX]
    );
    assert!(matches!(
        read_canonical_wav(&path, 8_000).unwrap_err(),
        ReelError::Media(_)
    ));
}
