use super::*;
use crate::align::backend::RecognitionResult;

struct SilentBackend;

impl AlignmentBackend for SilentBackend {
    fn begin(&mut self, _sample_rate: u32, _transcript: &str) -> ReelResult<()> {
        Ok(())
    }

    fn accept_chunk(&mut self, _samples: &[i16]) -> ReelResult<Vec<RecognitionResult>> {
        Ok(Vec::new())
    }

    fn finish(&mut self) -> ReelResult<Vec<RecognitionResult>> {
        Ok(Vec::new())
    }
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("factreel_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn output_name_uses_first_words_lowercased() {
    let out = OutputConfig::default();
    let p = output_path_for(
        "Honey Never Spoils: archaeologists found 3000 year old honey in Egyptian tombs",
        &out,
    )
    .unwrap();
    assert_eq!(
        p,
        PathBuf::from("output_videos/honey_never_spoils:_archaeologists_found_3000_year_old.mp4")
    );
}

#[test]
fn output_name_is_deterministic_and_strips_separators() {
    let out = OutputConfig {
        name_words: 3,
        extension: ".mov".to_string(),
        dir: PathBuf::from("out"),
        ..OutputConfig::default()
    };
    let a = output_path_for("Cats / dogs\\ sleep  a lot", &out).unwrap();
    let b = output_path_for("Cats / dogs\\ sleep  a lot", &out).unwrap();
    assert_eq!(a, b);
    assert_eq!(a, PathBuf::from("out/cats_dogs_sleep.mov"));
}

#[test]
fn blank_fact_cannot_name_a_file() {
    assert!(matches!(
        output_path_for("   ", &OutputConfig::default()).unwrap_err(),
        ReelError::Validation(_)
    ));
    assert!(output_path_for("/ \\ //", &OutputConfig::default()).is_err());
}

#[test]
fn music_pick_is_stable_and_ignores_other_files() {
    let dir = scratch_dir("music_pick");
    for name in ["a.mp3", "b.MP3", "c.mp3", "notes.txt"] {
        std::fs::write(dir.join(name), b"x").unwrap();
    }
    let first = pick_music(&dir, "octopuses have three hearts").unwrap();
    let again = pick_music(&dir, "octopuses have three hearts").unwrap();
    assert_eq!(first, again);
    assert_ne!(first.file_name().unwrap(), "notes.txt");

    let picks: std::collections::HashSet<_> = (0..32)
        .map(|i| pick_music(&dir, &format!("fact {i}")).unwrap())
        .collect();
    assert!(picks.len() > 1);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn empty_or_missing_music_folder_is_asset_unavailable() {
    let dir = scratch_dir("music_empty");
    assert!(matches!(
        pick_music(&dir, "x").unwrap_err(),
        ReelError::AssetUnavailable(_)
    ));
    assert!(matches!(
        pick_music(&dir.join("nope"), "x").unwrap_err(),
        ReelError::AssetUnavailable(_)
    ));
    let _ = std::fs::remove_dir_all(&dir);
}

fn test_config() -> ReelConfig {
    let mut cfg = ReelConfig::default();
    cfg.captions.font_path = PathBuf::from("tests/data/fonts/DejaVuSans.ttf");
    cfg
}

#[test]
fn missing_font_fails_construction() {
    let mut cfg = test_config();
    cfg.captions.font_path = PathBuf::from("tests/data/fonts/absent.ttf");
    assert!(matches!(
        FactReel::new(cfg, SilentBackend).err().unwrap(),
        ReelError::AssetUnavailable(_)
    ));
}

#[test]
fn missing_inputs_fail_before_compositing() {
    let out_dir = scratch_dir("missing_inputs");
    let mut cfg = test_config();
    cfg.output.dir = out_dir.join("videos");
    let mut reel = FactReel::new(cfg, SilentBackend).unwrap();
    let job = RenderJob {
        fact: "Sloths can hold their breath".to_string(),
        video: PathBuf::from("missing/video.mp4"),
        narration: PathBuf::from("missing/narration.mp3"),
        music: PathBuf::from("missing/music.mp3"),
    };
    assert!(matches!(
        reel.render(&job).unwrap_err(),
        ReelError::AssetUnavailable(_)
    ));
    assert!(!out_dir.join("videos").exists());
    let _ = std::fs::remove_dir_all(&out_dir);
}
