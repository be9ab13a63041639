use std::io::{BufRead as _, Read as _, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc;

use crate::config::AlignConfig;
use crate::foundation::error::{ReelError, ReelResult};

/// One time-stamped word as emitted by a recognizer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecognizedWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub conf: Option<f64>,
}

/// One recognizer result message.
///
/// Partial messages carry only `partial` text and never words.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RecognitionResult {
    #[serde(default)]
    pub result: Option<Vec<RecognizedWord>>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub partial: Option<String>,
}

impl RecognitionResult {
    pub fn words(&self) -> &[RecognizedWord] {
        self.result.as_deref().unwrap_or(&[])
    }
}

/// A streaming speech-alignment service.
///
/// The adapter calls `begin` once, `accept_chunk` for every fixed-size chunk of mono s16 samples,
/// then `finish` once. Results are collected in the order they are returned.
pub trait AlignmentBackend {
    fn begin(&mut self, sample_rate: u32, transcript: &str) -> ReelResult<()>;

    fn accept_chunk(&mut self, samples: &[i16]) -> ReelResult<Vec<RecognitionResult>>;

    fn finish(&mut self) -> ReelResult<Vec<RecognitionResult>>;
}

/// Runs an external aligner program.
///
/// Raw little-endian s16 PCM is written to its stdin; it answers with one JSON
/// [`RecognitionResult`] per stdout line. `{sample_rate}` and `{transcript}` in the argument list
/// are substituted at [`AlignmentBackend::begin`].
pub struct CommandAligner {
    program: String,
    args: Vec<String>,
    running: Option<RunningAligner>,
}

struct RunningAligner {
    child: Child,
    stdin: Option<ChildStdin>,
    lines: mpsc::Receiver<std::io::Result<String>>,
    stdout_reader: std::thread::JoinHandle<()>,
    stderr_drain: std::thread::JoinHandle<std::io::Result<Vec<u8>>>,
}

impl CommandAligner {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            running: None,
        }
    }

    /// Build from configuration; `None` when no aligner command is configured.
    pub fn from_config(cfg: &AlignConfig) -> Option<Self> {
        cfg.command
            .as_ref()
            .map(|program| Self::new(program.clone(), cfg.args.clone()))
    }

    fn running(&mut self) -> ReelResult<&mut RunningAligner> {
        self.running
            .as_mut()
            .ok_or_else(|| ReelError::validation("aligner used before begin()"))
    }
}

pub(crate) fn substitute_args(args: &[String], sample_rate: u32, transcript: &str) -> Vec<String> {
    args.iter()
        .map(|a| {
            a.replace("{sample_rate}", &sample_rate.to_string())
                .replace("{transcript}", transcript)
        })
        .collect()
}

pub(crate) fn parse_result_lines<I>(lines: I) -> ReelResult<Vec<RecognitionResult>>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: RecognitionResult = serde_json::from_str(line)
            .map_err(|e| ReelError::serde(format!("aligner emitted invalid json ({e}): {line}")))?;
        out.push(parsed);
    }
    Ok(out)
}

impl AlignmentBackend for CommandAligner {
    fn begin(&mut self, sample_rate: u32, transcript: &str) -> ReelResult<()> {
        if self.running.is_some() {
            return Err(ReelError::validation("aligner begin() called twice"));
        }

        let mut child = Command::new(&self.program)
            .args(substitute_args(&self.args, sample_rate, transcript))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ReelError::media(format!("failed to spawn aligner '{}': {e}", self.program))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::media("failed to open aligner stdin (unexpected)"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::media("failed to open aligner stdout (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::media("failed to open aligner stderr (unexpected)"))?;

        let (tx, lines) = mpsc::channel();
        let stdout_reader = std::thread::spawn(move || {
            for line in std::io::BufReader::new(stdout).lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        tracing::debug!(program = %self.program, sample_rate, "aligner started");
        self.running = Some(RunningAligner {
            child,
            stdin: Some(stdin),
            lines,
            stdout_reader,
            stderr_drain,
        });
        Ok(())
    }

    fn accept_chunk(&mut self, samples: &[i16]) -> ReelResult<Vec<RecognitionResult>> {
        let running = self.running()?;
        let stdin = running
            .stdin
            .as_mut()
            .ok_or_else(|| ReelError::validation("aligner stdin already closed"))?;

        let mut bytes = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        stdin
            .write_all(&bytes)
            .map_err(|e| ReelError::media(format!("failed to stream audio to aligner: {e}")))?;

        let mut ready = Vec::new();
        while let Ok(line) = running.lines.try_recv() {
            ready.push(
                line.map_err(|e| ReelError::media(format!("failed to read aligner output: {e}")))?,
            );
        }
        parse_result_lines(ready)
    }

    fn finish(&mut self) -> ReelResult<Vec<RecognitionResult>> {
        let RunningAligner {
            mut child,
            stdin,
            lines,
            stdout_reader,
            stderr_drain,
        } = self
            .running
            .take()
            .ok_or_else(|| ReelError::validation("aligner finish() called before begin()"))?;

        drop(stdin);
        let mut rest = Vec::new();
        for line in lines.iter() {
            rest.push(
                line.map_err(|e| ReelError::media(format!("failed to read aligner output: {e}")))?,
            );
        }
        stdout_reader
            .join()
            .map_err(|_| ReelError::media("aligner stdout reader thread panicked"))?;

        let status = child
            .wait()
            .map_err(|e| ReelError::media(format!("failed to wait for aligner: {e}")))?;
        let stderr_bytes = stderr_drain
            .join()
            .map_err(|_| ReelError::media("aligner stderr drain thread panicked"))?
            .map_err(|e| ReelError::media(format!("aligner stderr read failed: {e}")))?;
        if !status.success() {
            return Err(ReelError::media(format!(
                "aligner '{}' exited with status {status}: {}",
                self.program,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        parse_result_lines(rest)
    }
}

impl Drop for CommandAligner {
    fn drop(&mut self) {
        if let Some(mut running) = self.running.take() {
            drop(running.stdin.take());
            let _ = running.child.kill();
            let _ = running.child.wait();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/align/backend.rs"]
mod tests;
