use std::path::Path;

use crate::align::backend::{AlignmentBackend, RecognitionResult};
use crate::align::canonical;
use crate::config::AlignConfig;
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::scratch::{TempFileGuard, scratch_path};

/// A word and the window in which it is spoken, in seconds from narration start.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WordTiming {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Turns a narration file into ordered [`WordTiming`]s using an [`AlignmentBackend`].
pub struct Aligner<B> {
    backend: B,
    cfg: AlignConfig,
}

impl<B: AlignmentBackend> Aligner<B> {
    pub fn new(backend: B, cfg: AlignConfig) -> Self {
        Self { backend, cfg }
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Canonicalize `narration`, stream it to the backend and flatten the timed words.
    ///
    /// An empty result is not an error; the render simply has no captions.
    #[tracing::instrument(skip(self, transcript), fields(narration = %narration.display()))]
    pub fn align(&mut self, narration: &Path, transcript: &str) -> ReelResult<Vec<WordTiming>> {
        let wav = TempFileGuard::new(scratch_path("align", "wav"));
        let wav_path = wav
            .path()
            .ok_or_else(|| ReelError::media("alignment scratch path missing (unexpected)"))?;

        canonical::canonicalize(narration, wav_path, &self.cfg)?;
        let samples = canonical::read_canonical_wav(wav_path, self.cfg.sample_rate)?;
        self.align_samples(&samples, transcript)
    }

    /// Stream already-canonical mono s16 samples to the backend.
    pub fn align_samples(
        &mut self,
        samples: &[i16],
        transcript: &str,
    ) -> ReelResult<Vec<WordTiming>> {
        if self.cfg.chunk_frames == 0 {
            return Err(ReelError::validation("alignment chunk size must be > 0"));
        }

        self.backend.begin(self.cfg.sample_rate, transcript)?;
        let mut results = Vec::<RecognitionResult>::new();
        for chunk in samples.chunks(self.cfg.chunk_frames) {
            results.extend(self.backend.accept_chunk(chunk)?);
        }
        results.extend(self.backend.finish()?);

        let words = flatten_results(&results);
        tracing::info!(
            chunks = samples.len().div_ceil(self.cfg.chunk_frames),
            results = results.len(),
            words = words.len(),
            "narration aligned"
        );
        Ok(words)
    }
}

/// Flatten every timed word of `results` in emission order.
///
/// Negative starts are clamped to zero; entries with a non-finite time or `end <= start` are
/// dropped. Overlapping windows are kept as-is.
pub fn flatten_results(results: &[RecognitionResult]) -> Vec<WordTiming> {
    let mut out = Vec::new();
    for w in results.iter().flat_map(RecognitionResult::words) {
        if !w.start.is_finite() || !w.end.is_finite() {
            tracing::warn!(word = %w.word, "dropping word with non-finite timing");
            continue;
        }
        let start = w.start.max(0.0);
        if w.end <= start {
            tracing::warn!(word = %w.word, start = w.start, end = w.end, "dropping word with empty window");
            continue;
        }
        out.push(WordTiming {
            text: w.word.clone(),
            start,
            end: w.end,
        });
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/align/adapter.rs"]
mod tests;
