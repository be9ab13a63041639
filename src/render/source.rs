use crate::assets::media::RawVideoReader;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::geometry::FrameGeometry;
use crate::timeline::normalize::ClipSegment;

/// Sequential supplier of video frames for the compositor.
///
/// Frames are `geometry.visible_width x geometry.target_height` straight RGBA8. Once the
/// underlying video runs out the source keeps returning its last frame.
pub trait FrameSource {
    fn geometry(&self) -> FrameGeometry;

    /// Fill `out` with the next frame.
    fn next_frame(&mut self, out: &mut Vec<u8>) -> ReelResult<()>;
}

/// Decodes trimmed clip segments back to back, one `ffmpeg` process per segment.
pub struct SegmentFrameSource {
    geometry: FrameGeometry,
    fps: Fps,
    segments: Vec<ClipSegment>,
    /// Frames each segment contributes to the output timeline.
    budgets: Vec<u64>,
    next_segment: usize,
    current: Option<(RawVideoReader, u64)>,
    last: Vec<u8>,
}

impl SegmentFrameSource {
    pub fn new(segments: Vec<ClipSegment>, geometry: FrameGeometry, fps: Fps) -> ReelResult<Self> {
        if segments.is_empty() {
            return Err(ReelError::invalid_duration("no clip segments to decode"));
        }
        let budgets = segment_frame_budgets(&segments, fps);
        Ok(Self {
            geometry,
            fps,
            segments,
            budgets,
            next_segment: 0,
            current: None,
            last: Vec::new(),
        })
    }

    fn open_next(&mut self) -> ReelResult<bool> {
        while self.next_segment < self.segments.len() {
            let i = self.next_segment;
            self.next_segment += 1;
            let budget = self.budgets[i];
            if budget == 0 {
                continue;
            }
            let seg = &self.segments[i];
            tracing::debug!(
                segment = i,
                source = %seg.source.display(),
                frames = budget,
                "decoding clip segment"
            );
            let reader = RawVideoReader::spawn(
                &seg.source,
                seg.start_sec,
                seg.duration_sec(),
                &self.geometry.ffmpeg_filter(self.fps),
                self.geometry.frame_len(),
                budget,
            )?;
            self.current = Some((reader, budget));
            return Ok(true);
        }
        Ok(false)
    }
}

impl FrameSource for SegmentFrameSource {
    fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    fn next_frame(&mut self, out: &mut Vec<u8>) -> ReelResult<()> {
        loop {
            if self.current.is_none() && !self.open_next()? {
                break;
            }
            let Some((reader, remaining)) = self.current.as_mut() else {
                break;
            };
            if *remaining == 0 {
                self.current = None;
                continue;
            }
            *remaining -= 1;
            if reader.next_frame(out)? {
                self.last.clone_from(out);
                return Ok(());
            }
            // Segment ended early: hold its last frame for the rest of its budget.
            if self.last.is_empty() {
                return Err(ReelError::media("video decoder produced no frames"));
            }
            out.clone_from(&self.last);
            return Ok(());
        }

        if self.last.is_empty() {
            return Err(ReelError::media("video decoder produced no frames"));
        }
        out.clone_from(&self.last);
        Ok(())
    }
}

/// Frames per segment so that segment boundaries land on rounded timeline frames.
pub(crate) fn segment_frame_budgets(segments: &[ClipSegment], fps: Fps) -> Vec<u64> {
    let rate = fps.as_f64();
    let mut out = Vec::with_capacity(segments.len());
    let mut elapsed = 0.0f64;
    for seg in segments {
        let start = (elapsed * rate).round() as u64;
        elapsed += seg.duration_sec();
        let end = (elapsed * rate).round() as u64;
        out.push(end.saturating_sub(start));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/source.rs"]
mod tests;
