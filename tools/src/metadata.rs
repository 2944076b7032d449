use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use super::{Extractor, Metadata, Session};

/// Launches one `exiftool -stay_open` process per session.
#[derive(Debug, Clone)]
pub struct ExifToolExtractor {
    program: String,
}

impl ExifToolExtractor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Extractor for ExifToolExtractor {
    type Session = ExifTool;

    async fn open(&self) -> Result<ExifTool> {
        ExifTool::spawn(&self.program)
    }
}

#[derive(Debug)]
struct Running {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// An exiftool process in batch mode, fed one request per `-execute`.
#[derive(Debug)]
pub struct ExifTool {
    program: String,
    running: Option<Running>,
    /// number of the last `-execute`
    seq: u32,
}

impl ExifTool {
    pub fn spawn(program: &str) -> Result<Self> {
        let mut child = Command::new(program)
            .args(["-stay_open", "True", "-@", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to launch {}, is exiftool installed?", program))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("child did not have a handle to stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("child did not have a handle to stdout"))?;
        debug!(program, pid = ?child.id(), "exiftool session opened");

        Ok(Self {
            program: program.to_string(),
            running: Some(Running {
                child,
                stdin,
                stdout: BufReader::new(stdout),
            }),
            seq: 0,
        })
    }

    /// Run one batch request and return everything printed before its
    /// `{ready<N>}` marker.
    async fn execute(&mut self, args: &[&[u8]]) -> Result<String> {
        let running = self
            .running
            .as_mut()
            .ok_or_else(|| anyhow!("exiftool session is closed"))?;

        // a numbered -execute always gets its marker back, also under -q
        self.seq += 1;
        let ready = format!("{{ready{}}}", self.seq);
        let mut request = Vec::new();
        for arg in args {
            request.extend_from_slice(arg);
            request.push(b'\n');
        }
        request.extend_from_slice(format!("-execute{}\n", self.seq).as_bytes());
        debug!(request = %String::from_utf8_lossy(&request), "running exiftool");
        running.stdin.write_all(&request).await?;
        running.stdin.flush().await?;

        let mut output = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            if running.stdout.read_until(b'\n', &mut line).await? == 0 {
                bail!("{} exited before answering", self.program);
            }
            if line.trim_ascii_end() == ready.as_bytes() {
                break;
            }
            output.extend_from_slice(&line);
        }
        // file names need not be utf-8, exiftool echoes them as raw bytes
        Ok(String::from_utf8_lossy(&output).into_owned())
    }
}

#[async_trait]
impl Session for ExifTool {
    async fn metadata(&mut self, path: &Path) -> Result<Metadata> {
        let arg = path.as_os_str().as_encoded_bytes();
        if arg.contains(&b'\n') {
            bail!("unsupported file name {:?}", path);
        }

        let output = self.execute(&[b"-j".as_slice(), b"-G", arg]).await?;
        if output.trim().is_empty() {
            bail!("no metadata reported for {}", path.display());
        }
        let mut reports: Vec<Metadata> = serde_json::from_str(&output)
            .with_context(|| format!("unexpected exiftool output for {}", path.display()))?;
        if reports.is_empty() {
            bail!("no metadata reported for {}", path.display());
        }
        Ok(reports.swap_remove(0))
    }

    async fn close(&mut self) -> Result<()> {
        let Some(mut running) = self.running.take() else {
            return Ok(());
        };
        // the child may already be gone, waiting below reports how it ended
        if let Err(e) = running.stdin.write_all(b"-stay_open\nFalse\n").await {
            warn!(error = ?e, "failed to ask exiftool to stop");
        }
        drop(running.stdin);

        let status = running.child.wait().await?;
        debug!(status = ?status, "exiftool session closed");
        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}

impl Drop for ExifTool {
    fn drop(&mut self) {
        if self.running.is_some() {
            warn!(program = %self.program, "exiftool session dropped without close, killing it");
        }
    }
}
