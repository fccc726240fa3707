//! Scripted collaborators shared by the integration tests.
//!
//! [`ScriptedRunner`] answers invocations from a closure and records every
//! one it receives; [`ScriptedTransfer`] writes fixed bytes instead of
//! downloading. Neither spawns a process or touches the network.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use loudcheck::{
    CommandRunner, Invocation, LoudnessError, SourceLocator, Tool, ToolOutput, Transfer,
};

/// Summary-vocabulary diagnostics as printed at the end of a measurement.
pub const SUMMARY_DIAGNOSTICS: &str = "\
[Parsed_ebur128_0 @ 0x55d0c8a0] Summary:
  Integrated loudness: -23.4 LUFS
  Loudness range:        6.2 LU
  True peak:            -1.8 dBTP
  Momentary max:       -15.1 LUFS
  Short-term max:      -18.9 LUFS
";

/// Normalization-filter diagnostics.
pub const FILTER_DIAGNOSTICS: &str = "\
Input file #0 (programme.wav):
[Parsed_loudnorm_0 @ 0x5581a4c0]
Input Integrated:    -25.2 LUFS
Input True Peak:      -0.5 dBTP
Input LRA:             8.1 LU
Input Threshold:     -35.6 LUFS

Output Integrated:   -23.0 LUFS
Output True Peak:     -2.1 dBTP
Output LRA:            6.9 LU
Output Threshold:    -33.3 LUFS

Normalization Type:   Dynamic
Target Offset:        +0.0 LU
";

/// A stream listing with two audio streams.
pub const TWO_STREAMS_JSON: &str = r#"{
    "streams": [
        {
            "index": 1,
            "codec_name": "pcm_s24le",
            "channels": 2,
            "sample_rate": "48000",
            "duration": "120.000000",
            "tags": { "language": "eng", "title": "Stereo mix" }
        },
        {
            "index": 2,
            "codec_name": "aac",
            "channels": 6,
            "sample_rate": "48000"
        }
    ]
}"#;

type Responder = dyn Fn(&Invocation) -> Result<ToolOutput, LoudnessError> + Send + Sync;

/// A [`CommandRunner`] driven by a closure.
#[derive(Clone)]
pub struct ScriptedRunner {
    responder: Arc<Responder>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl ScriptedRunner {
    pub fn new(
        responder: impl Fn(&Invocation) -> Result<ToolOutput, LoudnessError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every invocation received so far, in order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations of one tool.
    pub fn calls_to(&self, tool: Tool) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|invocation| invocation.tool == tool)
            .collect()
    }
}

impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, LoudnessError> {
        self.calls.lock().unwrap().push(invocation.clone());
        (self.responder)(invocation)
    }
}

/// Capability probes are the only invocations asking for the format section.
pub fn is_capability_probe(invocation: &Invocation) -> bool {
    invocation.has_arg("-show_format")
}

/// Measurement that succeeds everywhere with `diagnostics`; stream listings
/// report [`TWO_STREAMS_JSON`]; probes succeed.
pub fn healthy_runner(diagnostics: &'static str) -> ScriptedRunner {
    ScriptedRunner::new(move |invocation| {
        Ok(match invocation.tool {
            Tool::Ffmpeg => ToolOutput::success(Vec::new(), diagnostics),
            Tool::Ffprobe if is_capability_probe(invocation) => {
                ToolOutput::success(b"{\"format\":{}}".to_vec(), "")
            }
            Tool::Ffprobe => ToolOutput::success(TWO_STREAMS_JSON, ""),
        })
    })
}

/// Same as [`healthy_runner`] but every invocation against a URL fails.
pub fn remote_hostile_runner(diagnostics: &'static str) -> ScriptedRunner {
    let healthy = healthy_runner(diagnostics);
    ScriptedRunner::new(move |invocation| {
        if invocation.is_remote() {
            Ok(ToolOutput::failure(
                1,
                "https://cdn.example.com: Server returned 403 Forbidden (access denied)",
            ))
        } else {
            (healthy.responder)(invocation)
        }
    })
}

/// How [`ScriptedTransfer::fetch`] behaves.
#[derive(Debug, Clone)]
pub enum FetchBehaviour {
    /// Write these bytes and succeed.
    Write(Vec<u8>),
    /// Write these bytes, then fail as if the connection dropped.
    WritePartialThenFail(Vec<u8>),
    /// Fail without writing.
    Fail,
}

/// A [`Transfer`] that never touches the network.
#[derive(Debug, Clone)]
pub struct ScriptedTransfer {
    behaviour: FetchBehaviour,
    stream_url_fails: bool,
    fetched: Arc<Mutex<Vec<PathBuf>>>,
}

impl ScriptedTransfer {
    pub fn new(behaviour: FetchBehaviour) -> Self {
        Self {
            behaviour,
            stream_url_fails: false,
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A transfer whose downloads produce a small placeholder file.
    pub fn writing() -> Self {
        Self::new(FetchBehaviour::Write(b"RIFF....WAVEfmt ".to_vec()))
    }

    pub fn with_failing_stream_url(mut self) -> Self {
        self.stream_url_fails = true;
        self
    }

    /// Destinations passed to `fetch`, in order.
    pub fn fetched(&self) -> Vec<PathBuf> {
        self.fetched.lock().unwrap().clone()
    }
}

impl Transfer for ScriptedTransfer {
    async fn stream_url(&self, locator: &SourceLocator) -> Result<String, LoudnessError> {
        if self.stream_url_fails {
            return Err(LoudnessError::TransferFailed {
                locator: locator.to_string(),
                reason: "presign refused".to_string(),
            });
        }
        Ok(locator.to_string())
    }

    async fn fetch(&self, locator: &SourceLocator, destination: &Path) -> Result<(), LoudnessError> {
        self.fetched.lock().unwrap().push(destination.to_path_buf());
        let failure = || LoudnessError::TransferFailed {
            locator: locator.to_string(),
            reason: "connection reset by peer".to_string(),
        };
        match &self.behaviour {
            FetchBehaviour::Write(bytes) => {
                tokio::fs::write(destination, bytes).await?;
                Ok(())
            }
            FetchBehaviour::WritePartialThenFail(bytes) => {
                tokio::fs::write(destination, bytes).await?;
                Err(failure())
            }
            FetchBehaviour::Fail => Err(failure()),
        }
    }
}

/// Number of entries left in a directory.
pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}
