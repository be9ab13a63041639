use rayon::prelude::*;

use crate::align::adapter::WordTiming;
use crate::config::ReelConfig;
use crate::foundation::error::{ReelError, ReelResult};

/// Text shaped at one font size, with its measured extent.
#[derive(Clone, Debug)]
pub struct ShapedCaption<G> {
    pub width: f32,
    pub height: f32,
    pub glyphs: G,
}

/// Shapes caption text for the layout search.
pub trait CaptionRenderer {
    /// Whatever the compositor needs later to paint the accepted size.
    type Glyphs;

    /// Shape `text` centered and wrapped inside a `box_width` x `box_height` box.
    fn shape(
        &mut self,
        text: &str,
        font_size: u32,
        box_width: f32,
        box_height: f32,
    ) -> ReelResult<ShapedCaption<Self::Glyphs>>;
}

/// One on-screen word, sized to fit the caption box.
#[derive(Clone, Debug)]
pub struct CaptionBlock<G> {
    /// Displayed text; differs from the spoken word only when `truncated`.
    pub text: String,
    pub font_size: u32,
    pub width: f32,
    pub height: f32,
    pub box_width: f32,
    pub box_height: f32,
    pub start: f64,
    pub end: f64,
    pub truncated: bool,
    pub glyphs: G,
}

impl<G> CaptionBlock<G> {
    /// Whether the block is on screen at `t` (half-open window).
    pub fn is_active_at(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// A caption dropped because even the truncation fallback could not be rendered.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedCaption {
    pub word: WordTiming,
    pub reason: String,
}

/// Result of laying out a whole word sequence.
#[derive(Clone, Debug)]
pub struct CaptionBatch<G> {
    pub blocks: Vec<CaptionBlock<G>>,
    pub skipped: Vec<SkippedCaption>,
}

/// Font-size search parameters and the box every caption must fit.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLayout {
    pub max_font_size: u32,
    pub min_font_size: u32,
    pub font_size_step: u32,
    pub max_chars: usize,
    pub ellipsis: String,
    pub box_width: f32,
    pub box_height: f32,
}

impl CaptionLayout {
    pub fn from_config(cfg: &ReelConfig) -> ReelResult<Self> {
        let (box_width, box_height) = cfg.caption_box()?;
        let c = &cfg.captions;
        let layout = Self {
            max_font_size: c.max_font_size,
            min_font_size: c.min_font_size,
            font_size_step: c.font_size_step,
            max_chars: c.max_chars,
            ellipsis: c.ellipsis.clone(),
            box_width,
            box_height,
        };
        layout.validate()?;
        Ok(layout)
    }

    fn validate(&self) -> ReelResult<()> {
        if self.min_font_size == 0 || self.min_font_size > self.max_font_size {
            return Err(ReelError::validation(
                "caption font sizes must satisfy 0 < min <= max",
            ));
        }
        if self.font_size_step == 0 {
            return Err(ReelError::validation("caption font size step must be >= 1"));
        }
        if !(self.box_width > 0.0 && self.box_height > 0.0) {
            return Err(ReelError::validation("caption box must have positive size"));
        }
        Ok(())
    }

    /// Candidate sizes, largest first. The minimum is always the last candidate.
    pub fn font_sizes(&self) -> Vec<u32> {
        let mut sizes = Vec::new();
        let mut size = self.max_font_size;
        while size > self.min_font_size {
            sizes.push(size);
            size = size.saturating_sub(self.font_size_step);
        }
        sizes.push(self.min_font_size);
        sizes
    }

    /// Size one word: the largest fitting font size, else a truncated form at the minimum size.
    ///
    /// Shaping errors during the search are treated as "does not fit". Only a failure of the
    /// fallback is reported, as [`ReelError::CaptionRender`].
    pub fn layout<R: CaptionRenderer>(
        &self,
        renderer: &mut R,
        word: &WordTiming,
    ) -> ReelResult<CaptionBlock<R::Glyphs>> {
        self.validate()?;

        for size in self.font_sizes() {
            match renderer.shape(&word.text, size, self.box_width, self.box_height) {
                Ok(shaped) if shaped.width <= self.box_width => {
                    return Ok(self.block(word, word.text.clone(), size, false, shaped));
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(word = %word.text, size, error = %e, "caption shaping failed");
                }
            }
        }

        self.truncated(renderer, word)
    }

    fn truncated<R: CaptionRenderer>(
        &self,
        renderer: &mut R,
        word: &WordTiming,
    ) -> ReelResult<CaptionBlock<R::Glyphs>> {
        let chars: Vec<char> = word.text.chars().collect();
        let mut keep = chars.len().min(self.max_chars);
        let mut last_err = None;
        loop {
            let text: String = chars[..keep]
                .iter()
                .collect::<String>()
                + &self.ellipsis;
            match renderer.shape(&text, self.min_font_size, self.box_width, self.box_height) {
                Ok(shaped) if shaped.width <= self.box_width => {
                    return Ok(self.block(word, text, self.min_font_size, true, shaped));
                }
                Ok(shaped) => {
                    last_err = Some(format!(
                        "'{text}' is {:.1}px wide at {}px, box is {:.1}px",
                        shaped.width, self.min_font_size, self.box_width
                    ));
                }
                Err(e) => last_err = Some(e.to_string()),
            }
            if keep == 0 {
                break;
            }
            keep -= 1;
        }

        Err(ReelError::caption_render(format!(
            "cannot fit '{}' into the caption box: {}",
            word.text,
            last_err.unwrap_or_default()
        )))
    }

    fn block<G>(
        &self,
        word: &WordTiming,
        text: String,
        font_size: u32,
        truncated: bool,
        shaped: ShapedCaption<G>,
    ) -> CaptionBlock<G> {
        CaptionBlock {
            text,
            font_size,
            width: shaped.width,
            height: shaped.height,
            box_width: self.box_width,
            box_height: self.box_height,
            start: word.start,
            end: word.end,
            truncated,
            glyphs: shaped.glyphs,
        }
    }
}

fn collect_batch<G>(
    words: &[WordTiming],
    results: Vec<ReelResult<CaptionBlock<G>>>,
) -> ReelResult<CaptionBatch<G>> {
    let mut blocks = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (word, res) in words.iter().zip(results) {
        match res {
            Ok(block) => blocks.push(block),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(
                    word = %word.text,
                    start = word.start,
                    end = word.end,
                    error = %e,
                    "skipping caption"
                );
                skipped.push(SkippedCaption {
                    word: word.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(CaptionBatch { blocks, skipped })
}

/// Lay out every word in order on the calling thread.
#[tracing::instrument(skip_all, fields(words = words.len()))]
pub fn layout_all<R: CaptionRenderer>(
    layout: &CaptionLayout,
    renderer: &mut R,
    words: &[WordTiming],
) -> ReelResult<CaptionBatch<R::Glyphs>> {
    let results = words.iter().map(|w| layout.layout(renderer, w)).collect();
    collect_batch(words, results)
}

/// Lay out every word on a rayon pool with one renderer per worker. Output keeps word order.
#[tracing::instrument(skip_all, fields(words = words.len()))]
pub fn layout_parallel<R, F>(
    layout: &CaptionLayout,
    make_renderer: F,
    words: &[WordTiming],
    threads: Option<usize>,
) -> ReelResult<CaptionBatch<R::Glyphs>>
where
    R: CaptionRenderer,
    R::Glyphs: Send,
    F: Fn() -> R + Sync + Send,
{
    let pool = build_thread_pool(threads)?;
    let results = pool.install(|| {
        words
            .par_iter()
            .map_init(&make_renderer, |renderer, word| layout.layout(renderer, word))
            .collect::<Vec<_>>()
    });
    collect_batch(words, results)
}

fn build_thread_pool(threads: Option<usize>) -> ReelResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(ReelError::validation("caption layout threads must be >= 1"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| ReelError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/caption/layout.rs"]
mod tests;
