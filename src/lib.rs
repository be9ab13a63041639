//! factreel assembles short vertical fact videos.
//!
//! Given a stock-footage clip, a narration track, a music track and the fact text, it produces one
//! MP4 with the footage looped to the narration, the music ducked underneath, and one caption per
//! spoken word.
//!
//! # Pipeline overview
//!
//! 1. **Probe**: `ffprobe` every input; a missing input fails the render up front.
//! 2. **Normalize**: loop or trim the footage to the narration duration ([`normalize`]).
//! 3. **Mix** and **align**, in parallel: blend narration and ducked music ([`mix`]) while an
//!    [`AlignmentBackend`] turns the narration into [`WordTiming`]s ([`Aligner`]).
//! 4. **Layout**: fit each word into the caption box with a shrinking font-size search and a
//!    truncation fallback ([`CaptionLayout`]).
//! 5. **Composite**: scale and crop the footage, overlay the captions, and stream frames plus the
//!    mixed audio to the system `ffmpeg` ([`Compositor`], [`FfmpegSink`]).
//!
//! [`FactReel`] runs all of it for one [`RenderJob`]. Footage downloads are deduplicated with
//! [`AssetCache`].
#![forbid(unsafe_code)]

mod align;
mod assets;
mod audio;
mod caption;
mod config;
mod encode;
mod foundation;
mod pipeline;
mod render;
mod timeline;

pub use align::adapter::{Aligner, WordTiming, flatten_results};
pub use align::backend::{AlignmentBackend, CommandAligner, RecognitionResult, RecognizedWord};
pub use assets::cache::{AssetCache, CacheLookup, normalize_key};
pub use assets::media::{
    AudioPcm, AudioStreamInfo, MediaClip, VideoStreamInfo, decode_audio_f32_stereo,
    media_tools_available, probe_media,
};
pub use audio::mix::{AudioMixSpec, MixedTrack, mix, write_mix_to_f32le_file};
pub use caption::layout::{
    CaptionBatch, CaptionBlock, CaptionLayout, CaptionRenderer, ShapedCaption, SkippedCaption,
    layout_all, layout_parallel,
};
pub use caption::shape::{
    CaptionBrush, CaptionFont, CaptionPaint, CaptionPlacement, ParleyCaptionRenderer,
    ParleyGlyphs,
};
pub use config::{
    AlignConfig, CacheConfig, CaptionConfig, EncodeSettings, MixConfig, OutputConfig, ReelConfig,
};
pub use encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use encode::sink::{AudioInputConfig, FrameSink, InMemorySink, SinkConfig};
pub use foundation::core::{Canvas, Fps, FrameIndex, Rect, Rgba8};
pub use foundation::error::{ReelError, ReelResult};
pub use pipeline::{FactReel, RenderJob, RenderOutcome, output_path_for, pick_music};
pub use render::compositor::{Compositor, caption_placement};
pub use render::frame::FrameRgba;
pub use render::geometry::FrameGeometry;
pub use render::source::{FrameSource, SegmentFrameSource};
pub use timeline::normalize::{ClipSegment, NormalizedClip, normalize};
pub use timeline::render_timeline::RenderTimeline;
