use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use crate::foundation::error::{ReelError, ReelResult};

/// Probed video stream properties.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoStreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
}

/// Probed audio stream properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioStreamInfo {
    pub sample_rate: u32,
    pub channels: u16,
}

/// A decodable media file and what `ffprobe` reported about it.
///
/// Immutable once probed.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaClip {
    pub source_path: PathBuf,
    pub duration_sec: f64,
    pub video: Option<VideoStreamInfo>,
    pub audio: Option<AudioStreamInfo>,
}

impl MediaClip {
    pub fn require_video(&self) -> ReelResult<&VideoStreamInfo> {
        self.video.as_ref().ok_or_else(|| {
            ReelError::asset_unavailable(format!(
                "'{}' has no video stream",
                self.source_path.display()
            ))
        })
    }

    pub fn require_audio(&self) -> ReelResult<&AudioStreamInfo> {
        self.audio.as_ref().ok_or_else(|| {
            ReelError::asset_unavailable(format!(
                "'{}' has no audio stream",
                self.source_path.display()
            ))
        })
    }
}

/// Interleaved `f32` PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl AudioPcm {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.interleaved_f32.len() / usize::from(self.channels)
        }
    }

    pub fn duration_sec(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.frames() as f64 / f64::from(self.sample_rate)
        }
    }
}

pub fn probe_media(source_path: &Path) -> ReelResult<MediaClip> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        sample_rate: Option<String>,
        channels: Option<u16>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    if !source_path.is_file() {
        return Err(ReelError::asset_unavailable(format!(
            "media file '{}' does not exist",
            source_path.display()
        )));
    }

    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::asset_unavailable(format!(
            "ffprobe could not read '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::serde(format!("ffprobe json parse failed: {e}")))?;

    let video = match parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
    {
        Some(s) => {
            let (fps_num, fps_den) = parse_ff_ratio(s.r_frame_rate.as_deref().unwrap_or("0/1"))
                .ok_or_else(|| ReelError::media("invalid video r_frame_rate"))?;
            Some(VideoStreamInfo {
                width: s.width.unwrap_or(0),
                height: s.height.unwrap_or(0),
                fps_num,
                fps_den,
            })
        }
        None => None,
    };
    let audio = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| AudioStreamInfo {
            sample_rate: s
                .sample_rate
                .as_deref()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(0),
            channels: s.channels.unwrap_or(0),
        });
    if video.is_none() && audio.is_none() {
        return Err(ReelError::asset_unavailable(format!(
            "'{}' has no audio or video streams",
            source_path.display()
        )));
    }

    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(MediaClip {
        source_path: source_path.to_path_buf(),
        duration_sec,
        video,
        audio,
    })
}

/// Decode `path` to interleaved stereo f32 at `sample_rate`.
///
/// With `max_duration_sec`, only the first that many seconds are read.
pub fn decode_audio_f32_stereo(
    path: &Path,
    sample_rate: u32,
    max_duration_sec: Option<f64>,
) -> ReelResult<AudioPcm> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-v", "error"]);
    if let Some(limit) = max_duration_sec {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(ReelError::validation(format!(
                "audio decode limit must be finite and > 0 (got {limit})"
            )));
        }
        cmd.arg("-t").arg(format!("{limit:.6}"));
    }
    let out = cmd
        .arg("-i")
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        // ffmpeg reports a missing audio stream as an error; the caller decides whether silence
        // is acceptable.
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
        {
            return Ok(AudioPcm {
                sample_rate,
                channels: 2,
                interleaved_f32: Vec::new(),
            });
        }
        return Err(ReelError::media(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelError::media(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: pcm,
    })
}

/// Streams fixed-size RGBA8 frames out of one `ffmpeg` decode process.
///
/// Frames are read on demand, so only one frame is buffered at a time regardless of clip length.
pub(crate) struct RawVideoReader {
    source: PathBuf,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    frame_len: usize,
}

impl RawVideoReader {
    /// Decode at most `max_frames` frames of `source` between `start_sec` and
    /// `start_sec + duration_sec`, passed through the ffmpeg filter graph `filter`.
    pub(crate) fn spawn(
        source: &Path,
        start_sec: f64,
        duration_sec: f64,
        filter: &str,
        frame_len: usize,
        max_frames: u64,
    ) -> ReelResult<Self> {
        if frame_len == 0 {
            return Err(ReelError::validation("raw video frame size must be non-zero"));
        }

        let mut child = Command::new("ffmpeg")
            .args([
                "-v",
                "error",
                "-ss",
                &format!("{:.6}", start_sec.max(0.0)),
                "-t",
                &format!("{duration_sec:.6}"),
                "-i",
            ])
            .arg(source)
            .args([
                "-an",
                "-vf",
                filter,
                "-frames:v",
                &max_frames.to_string(),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::media(format!(
                    "failed to spawn ffmpeg for video decode (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::media("failed to open ffmpeg stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::media("failed to open ffmpeg stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Self {
            source: source.to_path_buf(),
            child: Some(child),
            stdout: Some(stdout),
            stderr_drain: Some(stderr_drain),
            frame_len,
        })
    }

    /// Fill `buf` with the next frame. Returns `Ok(false)` once the decoder is exhausted.
    pub(crate) fn next_frame(&mut self, buf: &mut Vec<u8>) -> ReelResult<bool> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(false);
        };
        buf.resize(self.frame_len, 0);
        match stdout.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.stdout = None;
                self.wait()?;
                Ok(false)
            }
            Err(e) => Err(ReelError::media(format!(
                "failed reading decoded frames of '{}': {e}",
                self.source.display()
            ))),
        }
    }

    fn wait(&mut self) -> ReelResult<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| ReelError::media(format!("failed to wait for ffmpeg decode: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::media("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelError::media(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(ReelError::media(format!(
                "ffmpeg video decode failed for '{}': {}",
                self.source.display(),
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }
}

impl Drop for RawVideoReader {
    fn drop(&mut self) {
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Whether `ffmpeg` and `ffprobe` can both be invoked from `PATH`.
pub fn media_tools_available() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|tool| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
