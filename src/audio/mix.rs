use std::path::Path;

use anyhow::Context as _;

use crate::assets::media::AudioPcm;
use crate::config::MixConfig;
use crate::foundation::error::{ReelError, ReelResult};

/// Tolerance for container duration rounding when comparing music against narration.
pub const MUSIC_DURATION_TOLERANCE_SEC: f64 = 1e-3;

/// Gains and window for one narration/music mix.
///
/// Computed once per render and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioMixSpec {
    pub narration_gain: f32,
    pub music_gain: f32,
    pub sample_rate: u32,
    /// Music is read from `[0, window_sec]`; also the output duration.
    pub window_sec: f64,
}

impl AudioMixSpec {
    pub fn new(cfg: &MixConfig, narration_sec: f64, music_sec: f64) -> ReelResult<Self> {
        if !narration_sec.is_finite() || narration_sec <= 0.0 {
            return Err(ReelError::invalid_duration(format!(
                "narration duration must be finite and > 0 (got {narration_sec})"
            )));
        }
        if !music_sec.is_finite() || music_sec + MUSIC_DURATION_TOLERANCE_SEC < narration_sec {
            return Err(ReelError::InsufficientMusic {
                music_sec,
                narration_sec,
            });
        }
        if cfg.sample_rate == 0 {
            return Err(ReelError::validation("mix sample_rate must be > 0"));
        }
        Ok(Self {
            narration_gain: cfg.narration_gain,
            music_gain: cfg.music_gain,
            sample_rate: cfg.sample_rate,
            window_sec: narration_sec,
        })
    }

    pub fn output_frames(&self) -> usize {
        (self.window_sec * f64::from(self.sample_rate)).round() as usize
    }
}

/// Interleaved stereo result of [`mix`].
#[derive(Clone, Debug, PartialEq)]
pub struct MixedTrack {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl MixedTrack {
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_sec(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate.max(1))
    }
}

/// Sum narration and windowed music with their fixed gains.
///
/// Samples past the end of either input count as silence. No limiter is applied.
#[tracing::instrument(skip_all, fields(window_sec = spec.window_sec, music_gain = spec.music_gain))]
pub fn mix(spec: &AudioMixSpec, narration: &AudioPcm, music: &AudioPcm) -> ReelResult<MixedTrack> {
    for (name, pcm) in [("narration", narration), ("music", music)] {
        if pcm.sample_rate != spec.sample_rate || pcm.channels != 2 {
            return Err(ReelError::validation(format!(
                "{name} pcm must be stereo at {} Hz (got {} ch at {} Hz)",
                spec.sample_rate, pcm.channels, pcm.sample_rate
            )));
        }
    }

    let frames = spec.output_frames();
    let mut out = vec![0.0f32; frames * 2];
    add_scaled(&mut out, &narration.interleaved_f32, spec.narration_gain);
    add_scaled(&mut out, &music.interleaved_f32, spec.music_gain);

    tracing::debug!(frames, "audio mixed");
    Ok(MixedTrack {
        sample_rate: spec.sample_rate,
        channels: 2,
        interleaved_f32: out,
    })
}

fn add_scaled(dst: &mut [f32], src: &[f32], gain: f32) {
    if gain == 0.0 {
        return;
    }
    for (d, s) in dst.iter_mut().zip(src) {
        *d += s * gain;
    }
}

pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create audio mix output directory '{}'",
                parent.display()
            )
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes)
        .with_context(|| format!("failed to write mixed audio file '{}'", out_path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
