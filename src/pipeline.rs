use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::align::adapter::{Aligner, WordTiming};
use crate::align::backend::AlignmentBackend;
use crate::assets::media::{MediaClip, decode_audio_f32_stereo, probe_media};
use crate::audio::mix::{AudioMixSpec, MixedTrack, mix};
use crate::caption::layout::{CaptionLayout, SkippedCaption, layout_all, layout_parallel};
use crate::caption::shape::{CaptionFont, ParleyCaptionRenderer, ParleyGlyphs};
use crate::config::{OutputConfig, ReelConfig};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::Fnv1a64;
use crate::render::compositor::Compositor;
use crate::render::frame::FrameRgba;
use crate::render::source::SegmentFrameSource;
use crate::timeline::normalize::{NormalizedClip, normalize};
use crate::timeline::render_timeline::RenderTimeline;

/// Inputs for one fact video.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderJob {
    /// Fact text; also the alignment transcript and the source of the output name.
    pub fact: String,
    pub video: PathBuf,
    pub narration: PathBuf,
    pub music: PathBuf,
}

/// What a finished render produced.
#[derive(Clone, Debug)]
pub struct RenderOutcome {
    pub output_path: PathBuf,
    pub duration_sec: f64,
    pub words: usize,
    pub captions: usize,
    pub skipped: Vec<SkippedCaption>,
}

/// Runs the whole fact-video flow with one configuration and alignment backend.
pub struct FactReel<B> {
    cfg: ReelConfig,
    font: Arc<CaptionFont>,
    aligner: Aligner<B>,
}

struct Prepared {
    narration_sec: f64,
    clip: NormalizedClip,
    video_size: (u32, u32),
    audio: MixedTrack,
    words: Vec<WordTiming>,
}

impl<B: AlignmentBackend + Send> FactReel<B> {
    pub fn new(cfg: ReelConfig, backend: B) -> ReelResult<Self> {
        cfg.validate()?;
        let font = Arc::new(CaptionFont::load(&cfg.captions.font_path)?);
        tracing::debug!(family = font.family(), "caption font loaded");
        let aligner = Aligner::new(backend, cfg.align.clone());
        Ok(Self { cfg, font, aligner })
    }

    pub fn config(&self) -> &ReelConfig {
        &self.cfg
    }

    /// Render `job` to its deterministic output path.
    #[tracing::instrument(skip_all, fields(fact = %job.fact))]
    pub fn render(&mut self, job: &RenderJob) -> ReelResult<RenderOutcome> {
        let output_path = output_path_for(&job.fact, &self.cfg.output)?;
        let prepared = self.prepare(job)?;

        let layout = CaptionLayout::from_config(&self.cfg)?;
        let font = self.font.clone();
        let color = self.cfg.captions.color;
        let batch = layout_parallel(
            &layout,
            move || ParleyCaptionRenderer::new(font.clone(), color),
            &prepared.words,
            self.cfg.captions.threads,
        )?;
        tracing::info!(
            captions = batch.blocks.len(),
            skipped = batch.skipped.len(),
            "captions laid out"
        );

        let captions = batch.blocks.len();
        let timeline = RenderTimeline::new(
            &prepared.clip,
            prepared.audio,
            batch.blocks,
            output_path.clone(),
        )?;

        let compositor = Compositor::from_config(&self.cfg)?;
        let geometry = compositor.geometry_for(prepared.video_size.0, prepared.video_size.1)?;
        let mut source =
            SegmentFrameSource::new(timeline.video.clone(), geometry, compositor.fps())?;
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            background: self.cfg.output.background,
            ..FfmpegSinkOpts::new(&output_path)
        });
        let out = compositor.render(&timeline, &mut source, &mut sink)?;

        Ok(RenderOutcome {
            output_path: out,
            duration_sec: prepared.narration_sec,
            words: prepared.words.len(),
            captions,
            skipped: batch.skipped,
        })
    }

    /// Composite the single frame shown at `at_sec`, without encoding.
    #[tracing::instrument(skip_all, fields(fact = %job.fact, at_sec))]
    pub fn render_frame(&mut self, job: &RenderJob, at_sec: f64) -> ReelResult<FrameRgba> {
        let prepared = self.prepare(job)?;
        if !at_sec.is_finite() || at_sec < 0.0 || at_sec >= prepared.narration_sec {
            return Err(ReelError::validation(format!(
                "preview time {at_sec}s is outside the {:.3}s render",
                prepared.narration_sec
            )));
        }

        let layout = CaptionLayout::from_config(&self.cfg)?;
        let mut renderer = ParleyCaptionRenderer::new(self.font.clone(), self.cfg.captions.color);
        let active: Vec<WordTiming> = prepared
            .words
            .iter()
            .filter(|w| w.start <= at_sec && at_sec < w.end)
            .cloned()
            .collect();
        let batch = layout_all(&layout, &mut renderer, &active)?;

        let timeline: RenderTimeline<ParleyGlyphs> = RenderTimeline::new(
            &prepared.clip,
            prepared.audio,
            batch.blocks,
            output_path_for(&job.fact, &self.cfg.output)?,
        )?;

        let compositor = Compositor::from_config(&self.cfg)?;
        let geometry = compositor.geometry_for(prepared.video_size.0, prepared.video_size.1)?;
        let frame_sec = compositor.fps().frame_duration_secs();
        let window = prepared
            .clip
            .window(at_sec, frame_sec.min(prepared.clip.duration_sec() - at_sec))?;
        let mut source = SegmentFrameSource::new(window, geometry, compositor.fps())?;
        compositor.render_still(&timeline, &mut source, at_sec)
    }

    /// Probe, normalize, then mix and align in parallel.
    fn prepare(&mut self, job: &RenderJob) -> ReelResult<Prepared> {
        let video = probe_media(&job.video)?;
        let narration = probe_media(&job.narration)?;
        let music = probe_media(&job.music)?;
        let v = video.require_video()?;
        let video_size = (v.width, v.height);
        narration.require_audio()?;
        music.require_audio()?;

        let narration_sec = narration.duration_sec;
        let clip = normalize(&video, narration_sec)?;
        let spec = AudioMixSpec::new(&self.cfg.mix, narration_sec, music.duration_sec)?;

        let aligner = &mut self.aligner;
        let (audio, words) = rayon::join(
            || mix_files(&spec, &narration, &music),
            || aligner.align(&job.narration, &job.fact),
        );
        let audio = audio?;
        let words = words?;
        tracing::info!(
            narration_sec,
            loops = clip.loop_count(),
            words = words.len(),
            "inputs prepared"
        );

        Ok(Prepared {
            narration_sec,
            clip,
            video_size,
            audio,
            words,
        })
    }
}

fn mix_files(spec: &AudioMixSpec, narration: &MediaClip, music: &MediaClip) -> ReelResult<MixedTrack> {
    let narration_pcm = decode_audio_f32_stereo(&narration.source_path, spec.sample_rate, None)?;
    let music_pcm = decode_audio_f32_stereo(
        &music.source_path,
        spec.sample_rate,
        Some(spec.window_sec),
    )?;
    mix(spec, &narration_pcm, &music_pcm)
}

/// Output file for `fact`: its first words, lowercased and joined by `_`, in the output directory.
pub fn output_path_for(fact: &str, out: &OutputConfig) -> ReelResult<PathBuf> {
    let stem = fact
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| *c != '/' && *c != '\\')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .take(out.name_words)
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() || stem.chars().all(|c| c == '.') {
        return Err(ReelError::validation(
            "fact text yields an empty output file name",
        ));
    }
    let ext = out.extension.trim_start_matches('.');
    Ok(out.dir.join(format!("{stem}.{ext}")))
}

/// Pick an `.mp3` from `folder`, stable for a given `seed_text`.
pub fn pick_music(folder: &Path, seed_text: &str) -> ReelResult<PathBuf> {
    let entries = std::fs::read_dir(folder).map_err(|e| {
        ReelError::asset_unavailable(format!(
            "music folder '{}' is not readable: {e}",
            folder.display()
        ))
    })?;

    let mut tracks: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("mp3"))
        })
        .collect();
    if tracks.is_empty() {
        return Err(ReelError::asset_unavailable(format!(
            "music folder '{}' has no .mp3 files",
            folder.display()
        )));
    }
    tracks.sort();

    let mut h = Fnv1a64::new_default();
    h.write_bytes(seed_text.as_bytes());
    let idx = (h.finish() % tracks.len() as u64) as usize;
    Ok(tracks.swap_remove(idx))
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
