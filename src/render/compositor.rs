use std::path::PathBuf;
use std::sync::Arc;

use crate::audio::mix::write_mix_to_f32le_file;
use crate::caption::layout::CaptionBlock;
use crate::caption::shape::{CaptionPaint, CaptionPlacement};
use crate::config::{EncodeSettings, ReelConfig};
use crate::encode::sink::{AudioInputConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, Rect, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::scratch::{TempFileGuard, scratch_path};
use crate::render::frame::FrameRgba;
use crate::render::geometry::FrameGeometry;
use crate::render::source::FrameSource;
use crate::timeline::render_timeline::RenderTimeline;

/// Merges video, captions and mixed audio into encoded output.
pub struct Compositor {
    canvas: Canvas,
    fps: Fps,
    background: Rgba8,
    encode: EncodeSettings,
}

impl Compositor {
    pub fn new(canvas: Canvas, fps: Fps, background: Rgba8, encode: EncodeSettings) -> ReelResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ReelError::geometry(format!(
                "output canvas has non-positive size {}x{}",
                canvas.width, canvas.height
            )));
        }
        Ok(Self {
            canvas,
            fps,
            background,
            encode,
        })
    }

    pub fn from_config(cfg: &ReelConfig) -> ReelResult<Self> {
        Self::new(
            cfg.canvas(),
            cfg.fps()?,
            cfg.output.background,
            cfg.encode.clone(),
        )
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Geometry for a source of the given size on this compositor's canvas.
    pub fn geometry_for(&self, src_width: u32, src_height: u32) -> ReelResult<FrameGeometry> {
        FrameGeometry::fit(src_width, src_height, self.canvas.width, self.canvas.height)
    }

    /// Number of output frames for `duration_sec`; the last frame still starts inside it.
    pub fn frame_count(&self, duration_sec: f64) -> u64 {
        self.fps.secs_to_frames_ceil(duration_sec)
    }

    /// Composite every frame of `timeline` into `sink` and return the output path.
    ///
    /// Any failure aborts the render; the sink is never finalized in that case.
    #[tracing::instrument(skip_all, fields(out = %timeline.output_path.display(), captions = timeline.captions.len()))]
    pub fn render<G: CaptionPaint>(
        &self,
        timeline: &RenderTimeline<G>,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
    ) -> ReelResult<PathBuf> {
        let geometry = source.geometry();
        self.check_geometry(&geometry)?;

        let duration_sec = timeline.duration_sec();
        let frames = self.frame_count(duration_sec);
        if frames == 0 {
            return Err(ReelError::invalid_duration(format!(
                "render duration {duration_sec:.3}s yields no frames"
            )));
        }

        let audio_tmp = TempFileGuard::new(scratch_path("mix", "f32le"));
        let audio_path = audio_tmp
            .path()
            .ok_or_else(|| ReelError::media("audio scratch path missing (unexpected)"))?
            .to_path_buf();
        write_mix_to_f32le_file(&timeline.audio.interleaved_f32, &audio_path)?;

        sink.begin(SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
            duration_sec,
            encode: self.encode.clone(),
            audio: Some(AudioInputConfig {
                path: audio_path,
                sample_rate: timeline.audio.sample_rate,
                channels: timeline.audio.channels,
            }),
        })?;

        let mut video = Vec::with_capacity(geometry.frame_len());
        for i in 0..frames {
            source.next_frame(&mut video)?;
            let t = self.fps.frames_to_secs(i);
            let frame = self.compose(&geometry, &video, timeline.active_captions(t))?;
            sink.push_frame(FrameIndex(i), &frame)?;
        }
        sink.end()?;
        drop(audio_tmp);

        tracing::info!(frames, duration_sec, "render finished");
        Ok(timeline.output_path.clone())
    }

    /// Composite the single frame shown at `t`.
    pub fn render_still<G: CaptionPaint>(
        &self,
        timeline: &RenderTimeline<G>,
        source: &mut dyn FrameSource,
        t: f64,
    ) -> ReelResult<FrameRgba> {
        let geometry = source.geometry();
        self.check_geometry(&geometry)?;
        let mut video = Vec::with_capacity(geometry.frame_len());
        source.next_frame(&mut video)?;
        self.compose(&geometry, &video, timeline.active_captions(t))
    }

    fn check_geometry(&self, geometry: &FrameGeometry) -> ReelResult<()> {
        if geometry.target_width != self.canvas.width || geometry.target_height != self.canvas.height {
            return Err(ReelError::geometry(format!(
                "frame source targets {}x{}, canvas is {}x{}",
                geometry.target_width, geometry.target_height, self.canvas.width, self.canvas.height
            )));
        }
        Ok(())
    }

    /// Background, then video, then each caption in order.
    pub(crate) fn compose<'a, G: CaptionPaint + 'a>(
        &self,
        geometry: &FrameGeometry,
        video_rgba: &[u8],
        captions: impl Iterator<Item = &'a CaptionBlock<G>>,
    ) -> ReelResult<FrameRgba> {
        if video_rgba.len() != geometry.frame_len() {
            return Err(ReelError::validation(format!(
                "video frame is {} bytes, expected {}",
                video_rgba.len(),
                geometry.frame_len()
            )));
        }
        let width: u16 = self
            .canvas
            .width
            .try_into()
            .map_err(|_| ReelError::geometry("canvas width exceeds u16"))?;
        let height: u16 = self
            .canvas
            .height
            .try_into()
            .map_err(|_| ReelError::geometry("canvas height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(width, height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let bg = self.background;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        ctx.fill_rect(&rect_to_cpu(self.canvas.rect()));

        let video = video_image(video_rgba, geometry.visible_width, geometry.target_height)?;
        let video_rect = geometry.video_rect();
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((video_rect.x0, 0.0)));
        ctx.set_paint(video);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            video_rect.width(),
            video_rect.height(),
        ));

        for caption in captions {
            let placement = caption_placement(self.canvas, caption);
            caption.glyphs.paint(&mut ctx, &placement);
        }

        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRgba {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

/// Caption box centered on the canvas, text extent centered in the box.
pub fn caption_placement<G>(canvas: Canvas, caption: &CaptionBlock<G>) -> CaptionPlacement {
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let bw = f64::from(caption.box_width);
    let bh = f64::from(caption.box_height);
    let box_rect = Rect::new((cw - bw) / 2.0, (ch - bh) / 2.0, (cw + bw) / 2.0, (ch + bh) / 2.0);

    let w = f64::from(caption.width);
    let h = f64::from(caption.height);
    let center = box_rect.center();
    let content_rect = Rect::new(
        center.x - w / 2.0,
        center.y - h / 2.0,
        center.x + w / 2.0,
        center.y + h / 2.0,
    );
    CaptionPlacement {
        box_rect,
        content_rect,
    }
}

pub(crate) fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// Wrap opaque straight RGBA8 video pixels as an image paint.
fn video_image(rgba: &[u8], width: u32, height: u32) -> ReelResult<vello_cpu::Image> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::geometry("video width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::geometry("video height exceeds u16"))?;

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba.chunks_exact(4) {
        // Decoded video is opaque, so straight and premultiplied agree.
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: 255,
        });
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, false);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
