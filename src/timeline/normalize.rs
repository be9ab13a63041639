use std::path::PathBuf;

use crate::assets::media::MediaClip;
use crate::foundation::error::{ReelError, ReelResult};

/// One play-through of (part of) a source clip.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipSegment {
    pub source: PathBuf,
    pub start_sec: f64,
    pub end_sec: f64,
}

impl ClipSegment {
    pub fn duration_sec(&self) -> f64 {
        self.end_sec - self.start_sec
    }
}

/// A clip looped (or passed through) so that it covers a target duration.
///
/// Every loop is an independent copy starting from the source's first frame; nothing carries over
/// between copies. The sequence may run past the target and is cut to length by [`Self::trim_to`].
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedClip {
    pub segments: Vec<ClipSegment>,
    pub target_sec: f64,
}

impl NormalizedClip {
    /// Total duration before truncation. Always `>= target_sec`.
    pub fn duration_sec(&self) -> f64 {
        self.segments.iter().map(ClipSegment::duration_sec).sum()
    }

    pub fn loop_count(&self) -> usize {
        self.segments.len()
    }

    /// Segments covering exactly `[0, duration_sec)`.
    ///
    /// Fails if the clip does not reach `duration_sec`.
    pub fn trim_to(&self, duration_sec: f64) -> ReelResult<Vec<ClipSegment>> {
        self.window(0.0, duration_sec)
    }

    /// Segments covering exactly `[from_sec, from_sec + duration_sec)` of the looped clip.
    pub fn window(&self, from_sec: f64, duration_sec: f64) -> ReelResult<Vec<ClipSegment>> {
        if !duration_sec.is_finite() || duration_sec <= 0.0 {
            return Err(ReelError::invalid_duration(format!(
                "trim duration must be finite and > 0 (got {duration_sec})"
            )));
        }
        if !from_sec.is_finite() || from_sec < 0.0 {
            return Err(ReelError::invalid_duration(format!(
                "window start must be finite and >= 0 (got {from_sec})"
            )));
        }
        let wanted_end = from_sec + duration_sec;
        if self.duration_sec() + DURATION_EPS < wanted_end {
            return Err(ReelError::invalid_duration(format!(
                "normalized clip covers {:.3}s, cannot cut {from_sec:.3}s..{wanted_end:.3}s",
                self.duration_sec()
            )));
        }

        let mut out = Vec::with_capacity(self.segments.len());
        let mut skip = from_sec;
        let mut remaining = duration_sec;
        for seg in &self.segments {
            if remaining <= DURATION_EPS {
                break;
            }
            let len = seg.duration_sec();
            if skip >= len {
                skip -= len;
                continue;
            }
            let take = (len - skip).min(remaining);
            out.push(ClipSegment {
                source: seg.source.clone(),
                start_sec: seg.start_sec + skip,
                end_sec: seg.start_sec + skip + take,
            });
            remaining -= take;
            skip = 0.0;
        }
        Ok(out)
    }
}

const DURATION_EPS: f64 = 1e-9;

/// Loop or pass through `clip` so that it covers `target_sec`.
#[tracing::instrument(skip(clip), fields(source = %clip.source_path.display(), clip_sec = clip.duration_sec))]
pub fn normalize(clip: &MediaClip, target_sec: f64) -> ReelResult<NormalizedClip> {
    if !target_sec.is_finite() || target_sec <= 0.0 {
        return Err(ReelError::invalid_duration(format!(
            "target duration must be finite and > 0 (got {target_sec})"
        )));
    }
    let clip_sec = clip.duration_sec;
    if !clip_sec.is_finite() || clip_sec <= 0.0 {
        return Err(ReelError::invalid_duration(format!(
            "clip '{}' has unusable duration {clip_sec}",
            clip.source_path.display()
        )));
    }

    let copy = ClipSegment {
        source: clip.source_path.clone(),
        start_sec: 0.0,
        end_sec: clip_sec,
    };
    let mut segments = vec![copy.clone()];
    let mut covered = clip_sec;
    while covered < target_sec {
        segments.push(copy.clone());
        covered += clip_sec;
    }

    tracing::debug!(loops = segments.len(), covered_sec = covered, "clip normalized");
    Ok(NormalizedClip {
        segments,
        target_sec,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/normalize.rs"]
mod tests;
