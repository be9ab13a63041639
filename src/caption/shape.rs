use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::caption::layout::{CaptionRenderer, ShapedCaption};
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::{ReelError, ReelResult};

/// RGBA8 brush carried through parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptionBrush {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for CaptionBrush {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Caption font bytes plus the family name they register under.
pub struct CaptionFont {
    bytes: Arc<Vec<u8>>,
    family: String,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("family", &self.family)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl CaptionFont {
    pub fn load(path: &Path) -> ReelResult<Self> {
        if !path.is_file() {
            return Err(ReelError::asset_unavailable(format!(
                "caption font '{}' does not exist",
                path.display()
            )));
        }
        let bytes = std::fs::read(path)
            .with_context(|| format!("read caption font '{}'", path.display()))?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let family = register_family(&mut font_ctx, &bytes)?;
        Ok(Self {
            bytes: Arc::new(bytes),
            family,
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }
}

fn register_family(font_ctx: &mut parley::FontContext, bytes: &[u8]) -> ReelResult<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    let family_id = families
        .first()
        .map(|(id, _)| *id)
        .ok_or_else(|| ReelError::asset_unavailable("no font families registered from font bytes"))?;
    Ok(font_ctx
        .collection
        .family_name(family_id)
        .ok_or_else(|| ReelError::asset_unavailable("registered font family has no name"))?
        .to_string())
}

/// Shaped caption ready to paint: the parley layout and the font its glyph ids refer to.
#[derive(Clone)]
pub struct ParleyGlyphs {
    pub layout: Arc<parley::Layout<CaptionBrush>>,
    pub font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for ParleyGlyphs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParleyGlyphs")
            .field("lines", &self.layout.lines().count())
            .finish_non_exhaustive()
    }
}

/// [`CaptionRenderer`] backed by parley shaping and line breaking.
///
/// Not `Sync`; parallel layout builds one per worker.
pub struct ParleyCaptionRenderer {
    font: Arc<CaptionFont>,
    paint_font: vello_cpu::peniko::FontData,
    brush: CaptionBrush,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<CaptionBrush>,
    registered: bool,
}

impl ParleyCaptionRenderer {
    pub fn new(font: Arc<CaptionFont>, color: Rgba8) -> Self {
        let paint_font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
            0,
        );
        Self {
            font,
            paint_font,
            brush: color.into(),
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: false,
        }
    }

    fn ensure_registered(&mut self) -> ReelResult<()> {
        if !self.registered {
            register_family(&mut self.font_ctx, &self.font.bytes)?;
            self.registered = true;
        }
        Ok(())
    }
}

impl CaptionRenderer for ParleyCaptionRenderer {
    type Glyphs = ParleyGlyphs;

    fn shape(
        &mut self,
        text: &str,
        font_size: u32,
        box_width: f32,
        _box_height: f32,
    ) -> ReelResult<ShapedCaption<ParleyGlyphs>> {
        if font_size == 0 {
            return Err(ReelError::caption_render("font size must be > 0"));
        }
        self.ensure_registered()?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.font.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(font_size as f32));
        builder.push_default(parley::style::StyleProperty::Brush(self.brush));

        let mut layout: parley::Layout<CaptionBrush> = builder.build(text);
        layout.break_all_lines(Some(box_width));
        layout.align(
            Some(box_width),
            parley::Alignment::Center,
            parley::AlignmentOptions::default(),
        );

        let mut width = 0.0f32;
        let mut height = 0.0f32;
        for line in layout.lines() {
            let m = line.metrics();
            width = width.max(m.advance);
            height += m.ascent + m.descent + m.leading;
        }
        if !width.is_finite() || !height.is_finite() {
            return Err(ReelError::caption_render(format!(
                "shaping '{text}' at {font_size}px produced a non-finite extent"
            )));
        }

        Ok(ShapedCaption {
            width,
            height,
            glyphs: ParleyGlyphs {
                layout: Arc::new(layout),
                font: self.paint_font.clone(),
            },
        })
    }
}

/// Where a caption lands on the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionPlacement {
    /// The caption box, centered on the frame.
    pub box_rect: Rect,
    /// The measured text extent, centered in the box.
    pub content_rect: Rect,
}

/// Paints a shaped caption onto a frame.
pub trait CaptionPaint {
    fn paint(&self, ctx: &mut vello_cpu::RenderContext, placement: &CaptionPlacement);
}

impl CaptionPaint for ParleyGlyphs {
    fn paint(&self, ctx: &mut vello_cpu::RenderContext, placement: &CaptionPlacement) {
        // Lines are already centered across the box width by the layout.
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            placement.box_rect.x0,
            placement.content_rect.y0,
        )));
        for line in self.layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/caption/shape.rs"]
mod tests;
