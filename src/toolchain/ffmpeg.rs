//! `ffmpeg`/`ffprobe` implementation of [`MediaToolchain`].
//!
//! Every invocation runs with stdin closed, `-v error` to keep stderr short,
//! and a wall-clock timeout. A process that outlives the timeout is killed
//! and reported as [`ToolchainError::Timeout`].

use super::{MediaToolchain, ProbeResult, ToolchainError};
use crate::config::{ToolsConfig, VideoConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Toolchain backed by the `ffmpeg` and `ffprobe` binaries.
pub struct FfmpegToolchain {
    ffmpeg: String,
    ffprobe: String,
    timeout: Duration,
}

impl FfmpegToolchain {
    pub fn new(tools: &ToolsConfig) -> Self {
        Self {
            ffmpeg: tools.ffmpeg.clone(),
            ffprobe: tools.ffprobe.clone(),
            timeout: tools.timeout(),
        }
    }

    fn ffmpeg(&self) -> Command {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-hide_banner", "-nostdin", "-y", "-v", "error"]);
        cmd
    }

    /// Run ffmpeg and require that it left a file at `output`.
    fn run_ffmpeg(&self, cmd: Command, output: &Path) -> Result<(), ToolchainError> {
        run_with_timeout(cmd, self.timeout)?;
        if output.exists() {
            Ok(())
        } else {
            Err(ToolchainError::NoOutput(output.to_path_buf()))
        }
    }
}

impl MediaToolchain for FfmpegToolchain {
    fn transcode(
        &self,
        source: &Path,
        output: &Path,
        settings: &VideoConfig,
    ) -> Result<(), ToolchainError> {
        let mut cmd = self.ffmpeg();
        cmd.arg("-i")
            .arg(source)
            .args(["-c:v", &settings.codec])
            .args(["-preset", &settings.preset])
            .args(["-crf", &settings.crf.to_string()])
            .args(["-c:a", &settings.audio_codec])
            .args(["-b:a", &settings.audio_bitrate]);
        if settings.faststart {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.arg(output);
        self.run_ffmpeg(cmd, output)
    }

    fn extract_frame(
        &self,
        source: &Path,
        output: &Path,
        offset_secs: f64,
    ) -> Result<(), ToolchainError> {
        let mut cmd = self.ffmpeg();
        // Input-side seek: fast, and lands on the nearest frame at or after the offset.
        cmd.args(["-ss", &format!("{:.3}", offset_secs)])
            .arg("-i")
            .arg(source)
            .args(["-frames:v", "1", "-q:v", "2"])
            .arg(output);
        self.run_ffmpeg(cmd, output)
    }

    fn decode_still(&self, source: &Path, output: &Path) -> Result<(), ToolchainError> {
        let mut cmd = self.ffmpeg();
        cmd.arg("-i")
            .arg(source)
            .args(["-frames:v", "1"])
            .arg(output);
        self.run_ffmpeg(cmd, output)
    }

    fn probe(&self, source: &Path) -> Result<ProbeResult, ToolchainError> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(source);
        let stdout = run_with_timeout(cmd, self.timeout)?;
        parse_probe_output(&stdout)
    }
}

/// Spawn `cmd`, wait at most `timeout`, return its stdout.
///
/// stdout and stderr are drained on helper threads so a chatty process can
/// never block on a full pipe while we poll for exit.
fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<Vec<u8>, ToolchainError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    log::debug!("running {:?}", cmd);

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolchainError::Spawn {
            program: program.clone(),
            source,
        })?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            // Killing closes the pipes, which lets the drain threads finish.
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout.join();
            let _ = stderr.join();
            return Err(ToolchainError::Timeout { program, timeout });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let out = stdout.join().unwrap_or_default();
    let err = stderr.join().unwrap_or_default();

    if status.success() {
        Ok(out)
    } else {
        Err(ToolchainError::Failed {
            program,
            status,
            stderr: String::from_utf8_lossy(&err).trim().to_string(),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    side_data_list: Vec<ProbeSideData>,
}

#[derive(Debug, Deserialize)]
struct ProbeSideData {
    #[serde(default)]
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    /// ffprobe prints durations as decimal strings.
    #[serde(default)]
    duration: Option<String>,
}

/// Parse `ffprobe -print_format json -show_format -show_streams` output.
///
/// Rotation comes from the legacy `rotate` stream tag when present, else
/// from display-matrix side data (what newer ffmpeg versions emit). A file
/// without a video stream probes as 0×0.
pub fn parse_probe_output(json: &[u8]) -> Result<ProbeResult, ToolchainError> {
    let parsed: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| ToolchainError::Probe(e.to_string()))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    let rotation = video
        .and_then(|s| {
            s.tags
                .get("rotate")
                .and_then(|r| r.trim().parse::<f64>().ok())
                .or_else(|| s.side_data_list.iter().find_map(|d| d.rotation))
        })
        .unwrap_or(0.0);

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .unwrap_or(0.0);

    Ok(ProbeResult {
        width: video.and_then(|s| s.width).unwrap_or(0),
        height: video.and_then(|s| s.height).unwrap_or(0),
        rotation,
        duration,
    })
}
