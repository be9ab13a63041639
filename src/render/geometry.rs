use crate::foundation::core::{Fps, Rect};
use crate::foundation::error::{ReelError, ReelResult};

/// How a source frame maps onto the output canvas.
///
/// The source is scaled to the canvas height keeping its aspect ratio. A wider result is cropped
/// symmetrically to the canvas width; a narrower one is centered with background bars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameGeometry {
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Columns removed from the left of the scaled frame.
    pub crop_x: u32,
    /// Width of the part of the scaled frame that lands on the canvas.
    pub visible_width: u32,
    /// Canvas column where the visible part starts.
    pub offset_x: u32,
    pub target_width: u32,
    pub target_height: u32,
}

impl FrameGeometry {
    pub fn fit(src_width: u32, src_height: u32, target_width: u32, target_height: u32) -> ReelResult<Self> {
        if src_width == 0 || src_height == 0 {
            return Err(ReelError::geometry(format!(
                "source frame has non-positive size {src_width}x{src_height}"
            )));
        }
        if target_width == 0 || target_height == 0 {
            return Err(ReelError::geometry(format!(
                "output frame has non-positive size {target_width}x{target_height}"
            )));
        }

        // Even widths keep the scaler and yuv420p output happy.
        let exact = f64::from(src_width) * f64::from(target_height) / f64::from(src_height);
        let scaled_width = ((exact / 2.0).round() * 2.0) as u32;
        if scaled_width == 0 {
            return Err(ReelError::geometry(format!(
                "{src_width}x{src_height} scales to zero width at height {target_height}"
            )));
        }

        let (crop_x, visible_width, offset_x) = if scaled_width >= target_width {
            ((scaled_width - target_width) / 2, target_width, 0)
        } else {
            (0, scaled_width, (target_width - scaled_width) / 2)
        };

        Ok(Self {
            scaled_width,
            scaled_height: target_height,
            crop_x,
            visible_width,
            offset_x,
            target_width,
            target_height,
        })
    }

    pub fn is_pillarboxed(&self) -> bool {
        self.visible_width < self.target_width
    }

    /// Canvas rect covered by video pixels.
    pub fn video_rect(&self) -> Rect {
        Rect::new(
            f64::from(self.offset_x),
            0.0,
            f64::from(self.offset_x + self.visible_width),
            f64::from(self.target_height),
        )
    }

    /// Byte length of one decoded RGBA8 frame of the visible region.
    pub fn frame_len(&self) -> usize {
        self.visible_width as usize * self.target_height as usize * 4
    }

    /// `ffmpeg` filter graph producing visible-region frames at `fps`.
    pub fn ffmpeg_filter(&self, fps: Fps) -> String {
        format!(
            "fps={}/{},scale={}:{},crop={}:{}:{}:0",
            fps.num,
            fps.den,
            self.scaled_width,
            self.scaled_height,
            self.visible_width,
            self.target_height,
            self.crop_x
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/geometry.rs"]
mod tests;
