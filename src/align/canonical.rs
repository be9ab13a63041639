use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::AlignConfig;
use crate::foundation::error::{ReelError, ReelResult};

/// Outcome of one completion check while waiting for a converted file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Completion {
    Running,
    Succeeded,
    Failed,
}

/// Block until `path` exists and `check` reports success, polling every `poll`.
///
/// Gives up with [`ReelError::FileNotReady`] once `timeout` has elapsed.
pub(crate) fn poll_until_ready(
    path: &Path,
    timeout: Duration,
    poll: Duration,
    mut check: impl FnMut() -> ReelResult<Completion>,
) -> ReelResult<()> {
    let started = Instant::now();
    loop {
        match check()? {
            Completion::Succeeded if path.is_file() => return Ok(()),
            Completion::Succeeded => {
                return Err(ReelError::media(format!(
                    "conversion finished without producing '{}'",
                    path.display()
                )));
            }
            Completion::Failed => {
                return Err(ReelError::media(format!(
                    "conversion to '{}' failed",
                    path.display()
                )));
            }
            Completion::Running => {}
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(ReelError::FileNotReady {
                path: path.to_path_buf(),
                waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            });
        }
        std::thread::sleep(poll.min(timeout - waited));
    }
}

/// Wait for a conversion process, killing it if it overruns the timeout.
pub(crate) fn wait_for_child_output(
    child: &mut Child,
    path: &Path,
    timeout: Duration,
    poll: Duration,
) -> ReelResult<()> {
    let res = poll_until_ready(path, timeout, poll, || {
        match child
            .try_wait()
            .map_err(|e| ReelError::media(format!("failed to poll conversion process: {e}")))?
        {
            None => Ok(Completion::Running),
            Some(status) if status.success() => Ok(Completion::Succeeded),
            Some(_) => Ok(Completion::Failed),
        }
    });
    if res.is_err() {
        let _ = child.kill();
        let _ = child.wait();
    }
    res
}

/// Convert `src` into a mono 16-bit PCM WAV at the alignment sample rate.
#[tracing::instrument(skip(cfg), fields(rate = cfg.sample_rate))]
pub(crate) fn canonicalize(src: &Path, dest: &Path, cfg: &AlignConfig) -> ReelResult<()> {
    let mut child = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-i"])
        .arg(src)
        .args([
            "-vn",
            "-ac",
            "1",
            "-ar",
            &cfg.sample_rate.to_string(),
            "-acodec",
            "pcm_s16le",
            "-f",
            "wav",
        ])
        .arg(dest)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            ReelError::media(format!(
                "failed to spawn ffmpeg for narration conversion (is it installed and on PATH?): {e}"
            ))
        })?;

    wait_for_child_output(
        &mut child,
        dest,
        Duration::from_millis(cfg.ready_timeout_ms),
        Duration::from_millis(cfg.poll_interval_ms),
    )
}

/// Read a canonical WAV, checking it really is mono s16 at `sample_rate`.
pub(crate) fn read_canonical_wav(path: &Path, sample_rate: u32) -> ReelResult<Vec<i16>> {
    let reader = hound::WavReader::open(path)
        .map_err(|e| ReelError::media(format!("open wav '{}': {e}", path.display())))?;
    let spec = reader.spec();
    if spec.channels != 1
        || spec.sample_rate != sample_rate
        || spec.bits_per_sample != 16
        || spec.sample_format != hound::SampleFormat::Int
    {
        return Err(ReelError::media(format!(
            "'{}' is not mono 16-bit PCM at {sample_rate} Hz ({} ch, {} Hz, {} bit)",
            path.display(),
            spec.channels,
            spec.sample_rate,
            spec.bits_per_sample
        )));
    }
    reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ReelError::media(format!("read wav '{}': {e}", path.display())))
}

#[cfg(test)]
#[path = "../../tests/unit/align/canonical.rs"]
mod tests;
