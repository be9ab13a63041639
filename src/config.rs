//! Render configuration.
//!
//! Every component receives the slice of [`ReelConfig`] it needs at construction. Values come from
//! [`ReelConfig::default`], an optional JSON file, and finally `FACTREEL_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Fps, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};

/// Top-level configuration for one or more renders.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    /// Output frame, frame rate and file naming.
    pub output: OutputConfig,
    /// Encoder quality/speed policy.
    pub encode: EncodeSettings,
    /// Narration/music mix policy.
    pub mix: MixConfig,
    /// Caption font and fitting search.
    pub captions: CaptionConfig,
    /// Narration canonicalization and alignment backend.
    pub align: AlignConfig,
    /// Stock-footage cache location.
    pub cache: CacheConfig,
}

/// Output frame and file naming.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames per second.
    pub fps: u32,
    /// Directory rendered files are written into.
    pub dir: PathBuf,
    /// Container extension, without the dot.
    pub extension: String,
    /// How many words of the fact text make up the file name.
    pub name_words: usize,
    /// Fill colour behind footage narrower than the frame.
    pub background: Rgba8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            dir: PathBuf::from("output_videos"),
            extension: "mp4".to_string(),
            name_words: 8,
            background: Rgba8::BLACK,
        }
    }
}

/// Encoder settings handed to `ffmpeg`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncodeSettings {
    /// Video codec name (`-c:v`).
    pub video_codec: String,
    /// Audio codec name (`-c:a`).
    pub audio_codec: String,
    /// Encoder speed/quality preset (`-preset`).
    pub preset: String,
    /// Target video bitrate in kbit/s.
    pub bitrate_kbps: u32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            preset: "slow".to_string(),
            bitrate_kbps: 4000,
        }
    }
}

/// Fixed gains applied when summing narration and music.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MixConfig {
    /// Narration gain; stays at unity.
    pub narration_gain: f32,
    /// Music ducking gain.
    pub music_gain: f32,
    /// Sample rate both tracks are decoded and summed at.
    pub sample_rate: u32,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            narration_gain: 1.0,
            music_gain: 0.08,
            sample_rate: 48_000,
        }
    }
}

/// Caption font and fitting search parameters.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// TTF/OTF file used for every caption.
    pub font_path: PathBuf,
    /// First (largest) size tried.
    pub max_font_size: u32,
    /// Last (smallest) size tried, also the size of truncated captions.
    pub min_font_size: u32,
    /// Decrement between tried sizes.
    pub font_size_step: u32,
    /// Inset from every frame edge to the caption box.
    pub padding_px: u32,
    /// Characters kept when a word has to be truncated.
    pub max_chars: usize,
    /// Marker appended to truncated words.
    pub ellipsis: String,
    /// Caption fill colour.
    pub color: Rgba8,
    /// Worker threads for parallel layout; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from("fonts/caption.ttf"),
            max_font_size: 100,
            min_font_size: 50,
            font_size_step: 10,
            padding_px: 60,
            max_chars: 10,
            ellipsis: "...".to_string(),
            color: Rgba8::WHITE,
            threads: None,
        }
    }
}

/// Narration canonicalization and alignment backend settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    /// External aligner program. `None` disables captions.
    pub command: Option<String>,
    /// Arguments for `command`; `{sample_rate}` and `{transcript}` are substituted.
    pub args: Vec<String>,
    /// Canonical sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per chunk streamed to the backend.
    pub chunk_frames: usize,
    /// Upper bound on the wait for the canonical file.
    pub ready_timeout_ms: u64,
    /// Interval between readiness checks.
    pub poll_interval_ms: u64,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            sample_rate: 16_000,
            chunk_frames: 4000,
            ready_timeout_ms: 30_000,
            poll_interval_ms: 100,
        }
    }
}

/// Stock-footage cache location.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding cached downloads.
    pub dir: PathBuf,
    /// Extension given to cached files.
    pub extension: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("footage_cache"),
            extension: "mp4".to_string(),
        }
    }
}

impl ReelConfig {
    /// Read a JSON config file. Missing sections and fields keep their defaults.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ReelError::serde(format!("parse config '{}': {e}", path.display())))
    }

    /// Apply `FACTREEL_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `FACTREEL_*` overrides from `lookup`. Unparsable values are ignored.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse::<T>().ok())
        }

        if let Some(v) = parsed::<u32>(&lookup, "FACTREEL_WIDTH").filter(|&n| n > 0) {
            self.output.width = v;
        }
        if let Some(v) = parsed::<u32>(&lookup, "FACTREEL_HEIGHT").filter(|&n| n > 0) {
            self.output.height = v;
        }
        if let Some(v) = parsed::<u32>(&lookup, "FACTREEL_FPS").filter(|&n| n > 0) {
            self.output.fps = v;
        }
        if let Some(v) = lookup("FACTREEL_OUTPUT_DIR").filter(|s| !s.is_empty()) {
            self.output.dir = PathBuf::from(v);
        }
        if let Some(v) = parsed::<u32>(&lookup, "FACTREEL_BITRATE_KBPS").filter(|&n| n > 0) {
            self.encode.bitrate_kbps = v;
        }
        if let Some(v) = lookup("FACTREEL_PRESET").filter(|s| !s.is_empty()) {
            self.encode.preset = v;
        }
        if let Some(v) = parsed::<f32>(&lookup, "FACTREEL_MUSIC_GAIN")
            .filter(|g| g.is_finite() && *g >= 0.0)
        {
            self.mix.music_gain = v;
        }
        if let Some(v) = lookup("FACTREEL_FONT").filter(|s| !s.is_empty()) {
            self.captions.font_path = PathBuf::from(v);
        }
        if let Some(v) = parsed::<u32>(&lookup, "FACTREEL_FONT_MAX").filter(|&n| n > 0) {
            self.captions.max_font_size = v;
        }
        if let Some(v) = parsed::<u32>(&lookup, "FACTREEL_FONT_MIN").filter(|&n| n > 0) {
            self.captions.min_font_size = v;
        }
        if let Some(v) = parsed::<u32>(&lookup, "FACTREEL_FONT_STEP").filter(|&n| n > 0) {
            self.captions.font_size_step = v;
        }
        if let Some(v) = parsed::<u32>(&lookup, "FACTREEL_CAPTION_PADDING") {
            self.captions.padding_px = v;
        }
        if let Some(v) = lookup("FACTREEL_ALIGNER").filter(|s| !s.is_empty()) {
            self.align.command = Some(v);
        }
        if let Some(v) = parsed::<u64>(&lookup, "FACTREEL_ALIGN_TIMEOUT_MS").filter(|&n| n > 0) {
            self.align.ready_timeout_ms = v;
        }
        if let Some(v) = lookup("FACTREEL_CACHE_DIR").filter(|s| !s.is_empty()) {
            self.cache.dir = PathBuf::from(v);
        }
        self
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> ReelResult<()> {
        let out = &self.output;
        if out.width == 0 || out.height == 0 {
            return Err(ReelError::validation(
                "output width/height must be non-zero",
            ));
        }
        if !out.width.is_multiple_of(2) || !out.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "output width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if out.fps == 0 {
            return Err(ReelError::validation("output fps must be non-zero"));
        }
        if out.name_words == 0 {
            return Err(ReelError::validation("output name_words must be >= 1"));
        }
        if self.encode.bitrate_kbps == 0 {
            return Err(ReelError::validation("encode bitrate must be non-zero"));
        }

        let mix = &self.mix;
        if !mix.music_gain.is_finite() || mix.music_gain < 0.0 {
            return Err(ReelError::validation("music gain must be finite and >= 0"));
        }
        if !mix.narration_gain.is_finite() || mix.narration_gain < 0.0 {
            return Err(ReelError::validation(
                "narration gain must be finite and >= 0",
            ));
        }
        if mix.sample_rate == 0 {
            return Err(ReelError::validation("mix sample rate must be non-zero"));
        }

        let cap = &self.captions;
        if cap.min_font_size == 0 || cap.min_font_size > cap.max_font_size {
            return Err(ReelError::validation(
                "caption font sizes must satisfy 0 < min <= max",
            ));
        }
        if cap.font_size_step == 0 {
            return Err(ReelError::validation("caption font size step must be >= 1"));
        }
        if cap.max_chars == 0 {
            return Err(ReelError::validation("caption max_chars must be >= 1"));
        }
        self.caption_box()?;

        let align = &self.align;
        if align.sample_rate == 0 || align.chunk_frames == 0 {
            return Err(ReelError::validation(
                "alignment sample rate and chunk size must be non-zero",
            ));
        }
        if align.ready_timeout_ms == 0 || align.poll_interval_ms == 0 {
            return Err(ReelError::validation(
                "alignment timeout and poll interval must be non-zero",
            ));
        }
        Ok(())
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.output.width,
            height: self.output.height,
        }
    }

    /// Output frame rate.
    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::new(self.output.fps, 1)
    }

    /// Caption box size: the canvas inset by the caption padding on every side.
    pub fn caption_box(&self) -> ReelResult<(f32, f32)> {
        let pad = u64::from(self.captions.padding_px) * 2;
        let w = u64::from(self.output.width).saturating_sub(pad);
        let h = u64::from(self.output.height).saturating_sub(pad);
        if w == 0 || h == 0 {
            return Err(ReelError::validation(format!(
                "caption padding {}px leaves no room inside {}x{}",
                self.captions.padding_px, self.output.width, self.output.height
            )));
        }
        Ok((w as f32, h as f32))
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
