use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ReelError::invalid_duration("x")
            .to_string()
            .contains("invalid duration:")
    );
    assert!(
        ReelError::geometry("x")
            .to_string()
            .contains("geometry error:")
    );
    assert!(
        ReelError::caption_render("x")
            .to_string()
            .contains("caption render error:")
    );
    assert!(
        ReelError::asset_unavailable("x")
            .to_string()
            .contains("asset unavailable:")
    );
    assert!(ReelError::media("x").to_string().contains("media error:"));
}

#[test]
fn structured_variants_render_their_fields() {
    let err = ReelError::InsufficientMusic {
        music_sec: 2.0,
        narration_sec: 4.5,
    };
    let msg = err.to_string();
    assert!(msg.contains("2.000s"));
    assert!(msg.contains("4.500s"));

    let err = ReelError::FileNotReady {
        path: PathBuf::from("tmp/voice.wav"),
        waited_ms: 250,
    };
    assert!(err.to_string().contains("250ms"));
    assert!(err.to_string().contains("voice.wav"));
}

#[test]
fn only_caption_errors_are_recoverable() {
    assert!(ReelError::caption_render("x").is_recoverable());
    assert!(!ReelError::geometry("x").is_recoverable());
    assert!(!ReelError::invalid_duration("x").is_recoverable());
    assert!(
        !ReelError::InsufficientMusic {
            music_sec: 0.0,
            narration_sec: 1.0
        }
        .is_recoverable()
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ReelError::from(base);
    assert!(err.to_string().contains("boom"));
}
