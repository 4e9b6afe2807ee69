use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::{Command as StdCommand, Stdio};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use crate::config::InvokerConfig;
use crate::error::{Result, FfpipeError};
use super::io::{DiagnosticHandler, InvocationInput, InvocationOutput, InvocationRequest, InvocationResult};
use super::{MediaInvokerTrait, PipeCommand};

const CHUNK_SIZE: usize = 64 * 1024;

type BoxedSink = Box<dyn AsyncWrite + Send + Unpin>;

/// Input after its file (if any) has been opened
enum InputSource {
    File(File),
    Bytes(Vec<u8>),
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

/// Runs ffmpeg with stdin/stdout wired to the request's input and output
pub struct PipeInvoker {
    config: InvokerConfig,
}

impl PipeInvoker {
    pub fn new(config: InvokerConfig) -> Self {
        Self { config }
    }

    /// Spawn the tool and wait until its output is flushed and it has exited.
    ///
    /// Completion does not wait on the input feed: an input stream that stays
    /// open after the tool exits is dropped. There is no timeout: a tool that
    /// never exits keeps this future pending. Dropping the future does not
    /// kill the process.
    pub async fn invoke(&self, request: InvocationRequest) -> Result<InvocationResult> {
        let InvocationRequest {
            input,
            args,
            output,
            verbose,
            diagnostic_handler,
            binary_path,
        } = request;
        let verbose = verbose || self.config.verbose;

        let binary = self.config.resolve_binary_path(binary_path.as_deref());
        let fragmented = !matches!(output, Some(InvocationOutput::FilePath(_)));
        let command = PipeCommand::assemble(binary, args.normalize(), fragmented)?;

        // Open file endpoints first so a bad path never leaves a process behind
        let source = match input {
            InvocationInput::FilePath(path) => InputSource::File(File::open(&path).await?),
            InvocationInput::Bytes(bytes) => InputSource::Bytes(bytes),
            InvocationInput::Stream(reader) => InputSource::Stream(reader),
        };
        let sink: Option<BoxedSink> = match output {
            Some(InvocationOutput::FilePath(path)) => Some(Box::new(File::create(&path).await?)),
            Some(InvocationOutput::Stream(writer)) => Some(writer),
            None => None,
        };

        debug!("Spawning media tool: {}", command.display());

        let mut child = command
            .to_command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(if verbose { Stdio::piped() } else { Stdio::null() })
            .spawn()
            .map_err(FfpipeError::Spawn)?;

        if verbose {
            info!("Verbose setting on. Running command: {}", command.display());
        }

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| FfpipeError::Media("stdin of media tool was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FfpipeError::Media("stdout of media tool was not captured".to_string()))?;
        let stderr = child.stderr.take();

        let feed = tokio::spawn(feed_input(stdin, source));

        let (drained, diagnosed, status) = tokio::join!(
            drain_output(stdout, sink),
            pump_diagnostics(stderr, diagnostic_handler),
            child.wait(),
        );

        // An idle input must not hold the result once the tool is gone
        if feed.is_finished() {
            feed.await
                .map_err(|e| FfpipeError::Media(format!("Input feed task failed: {}", e)))??;
        } else {
            debug!("Media tool exited before its input ended; dropping the input feed");
            feed.abort();
        }

        let status = status?;
        diagnosed?;
        let collected = drained?;

        debug!("Media tool exited with {}", status);

        Ok(match collected {
            Some(bytes) => InvocationResult::Collected(bytes),
            None => InvocationResult::Exited(status),
        })
    }
}

/// Write the whole input into stdin, then close it
async fn feed_input(mut stdin: ChildStdin, source: InputSource) -> Result<()> {
    let fed = match source {
        InputSource::File(mut file) => tokio::io::copy(&mut file, &mut stdin).await.map(|_| ()),
        InputSource::Bytes(bytes) => stdin.write_all(&bytes).await,
        InputSource::Stream(mut reader) => tokio::io::copy(&mut reader, &mut stdin).await.map(|_| ()),
    };
    let closed = match fed {
        Ok(()) => stdin.shutdown().await,
        Err(e) => Err(e),
    };
    drop(stdin);

    match closed {
        // The tool may stop reading early (e.g. `-t`, `-frames`)
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("Media tool closed stdin before all input was written");
            Ok(())
        }
        other => other.map_err(FfpipeError::from),
    }
}

/// Copy stdout into the sink, or collect it when there is none
async fn drain_output(mut stdout: ChildStdout, sink: Option<BoxedSink>) -> Result<Option<Vec<u8>>> {
    match sink {
        Some(mut sink) => {
            tokio::io::copy(&mut stdout, &mut sink).await?;
            sink.flush().await?;
            sink.shutdown().await?;
            Ok(None)
        }
        None => {
            let mut chunks: Vec<Vec<u8>> = Vec::new();
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                let n = stdout.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                chunks.push(buf[..n].to_vec());
            }
            Ok(Some(chunks.concat()))
        }
    }
}

/// Forward stderr chunks to the handler, or to the log when there is none
async fn pump_diagnostics(
    stderr: Option<ChildStderr>,
    mut handler: Option<DiagnosticHandler>,
) -> Result<()> {
    let Some(mut stderr) = stderr else {
        return Ok(());
    };

    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = stderr.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        match handler.as_mut() {
            Some(handler) => handler(&buf[..n]),
            None => info!("{}", String::from_utf8_lossy(&buf[..n])),
        }
    }
}

#[async_trait]
impl MediaInvokerTrait for PipeInvoker {
    async fn invoke(&self, request: InvocationRequest) -> Result<InvocationResult> {
        PipeInvoker::invoke(self, request).await
    }

    /// Check if ffmpeg is available
    fn check_availability(&self) -> Result<()> {
        let binary = self.config.resolve_binary_path(None);
        let output = StdCommand::new(&binary)
            .arg("-version")
            .output()
            .map_err(|e| FfpipeError::Media(format!("Media tool not found at {}: {}", binary, e)))?;

        if output.status.success() {
            info!("Media tool is available: {}", binary);
            Ok(())
        } else {
            Err(FfpipeError::Media("Media tool version check failed".to_string()))
        }
    }

    async fn get_version_info(&self) -> Result<String> {
        let binary = self.config.resolve_binary_path(None);
        debug!("Getting version information from {}", binary);

        let output = Command::new(&binary)
            .arg("-version")
            .output()
            .await
            .map_err(FfpipeError::Spawn)?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            // First line carries the version banner
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(FfpipeError::Media(format!("Media tool version check failed: {}", stderr)))
        }
    }
}
