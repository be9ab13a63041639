use std::path::PathBuf;

use crate::audio::mix::MixedTrack;
use crate::caption::layout::CaptionBlock;
use crate::foundation::error::{ReelError, ReelResult};
use crate::timeline::normalize::{ClipSegment, NormalizedClip};

/// Everything one render composites, alive only for that render.
///
/// The video is already trimmed to the mixed audio's duration.
#[derive(Debug)]
pub struct RenderTimeline<G> {
    pub video: Vec<ClipSegment>,
    pub audio: MixedTrack,
    /// Captions in word order; later entries draw on top.
    pub captions: Vec<CaptionBlock<G>>,
    pub output_path: PathBuf,
}

impl<G> RenderTimeline<G> {
    pub fn new(
        video: &NormalizedClip,
        audio: MixedTrack,
        captions: Vec<CaptionBlock<G>>,
        output_path: PathBuf,
    ) -> ReelResult<Self> {
        let duration = audio.duration_sec();
        if duration <= 0.0 {
            return Err(ReelError::invalid_duration("mixed audio is empty"));
        }
        Ok(Self {
            video: video.trim_to(duration)?,
            audio,
            captions,
            output_path,
        })
    }

    pub fn duration_sec(&self) -> f64 {
        self.audio.duration_sec()
    }

    /// Captions on screen at `t`, bottom-most first.
    pub fn active_captions(&self, t: f64) -> impl Iterator<Item = &CaptionBlock<G>> {
        self.captions.iter().filter(move |c| c.is_active_at(t))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/render_timeline.rs"]
mod tests;
