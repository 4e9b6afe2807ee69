use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::error::{Result, FfpipeError};

/// Receives raw stderr chunks from the tool, undecoded
pub type DiagnosticHandler = Box<dyn FnMut(&[u8]) + Send>;

/// Where the tool reads its input from (`pipe:0`)
pub enum InvocationInput {
    /// File opened and streamed into stdin
    FilePath(PathBuf),
    /// Buffer written to stdin in full, then stdin is closed
    Bytes(Vec<u8>),
    /// Reader copied into stdin until end of stream
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl InvocationInput {
    /// Wrap any async reader as the input
    pub fn stream<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self::Stream(Box::new(reader))
    }
}

impl fmt::Debug for InvocationInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilePath(path) => f.debug_tuple("FilePath").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<PathBuf> for InvocationInput {
    fn from(path: PathBuf) -> Self {
        Self::FilePath(path)
    }
}

impl From<&Path> for InvocationInput {
    fn from(path: &Path) -> Self {
        Self::FilePath(path.to_path_buf())
    }
}

impl From<&str> for InvocationInput {
    fn from(path: &str) -> Self {
        Self::FilePath(PathBuf::from(path))
    }
}

impl From<String> for InvocationInput {
    fn from(path: String) -> Self {
        Self::FilePath(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for InvocationInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for InvocationInput {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Where the tool's output (`pipe:1`) goes. No output means "collect in memory".
pub enum InvocationOutput {
    FilePath(PathBuf),
    Stream(Box<dyn AsyncWrite + Send + Unpin>),
}

impl InvocationOutput {
    /// Wrap any async writer as the output; it is shut down once the tool is done
    pub fn stream<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::Stream(Box::new(writer))
    }
}

impl fmt::Debug for InvocationOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilePath(path) => f.debug_tuple("FilePath").field(path).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

impl From<PathBuf> for InvocationOutput {
    fn from(path: PathBuf) -> Self {
        Self::FilePath(path)
    }
}

impl From<&Path> for InvocationOutput {
    fn from(path: &Path) -> Self {
        Self::FilePath(path.to_path_buf())
    }
}

impl From<&str> for InvocationOutput {
    fn from(path: &str) -> Self {
        Self::FilePath(PathBuf::from(path))
    }
}

impl From<String> for InvocationOutput {
    fn from(path: String) -> Self {
        Self::FilePath(PathBuf::from(path))
    }
}

/// Caller arguments, either as one space-delimited line or as tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments {
    Line(String),
    Tokens(Vec<String>),
}

impl Arguments {
    /// Flatten to tokens by joining on single spaces and splitting again.
    ///
    /// Lossy: tokens containing spaces are split, and runs of spaces yield
    /// empty tokens. Quoting is not interpreted.
    pub fn normalize(&self) -> Vec<String> {
        let line = match self {
            Self::Line(line) => line.clone(),
            Self::Tokens(tokens) => tokens.join(" "),
        };
        line.split(' ').map(str::to_string).collect()
    }

    fn is_missing(&self) -> bool {
        matches!(self, Self::Line(line) if line.is_empty())
    }
}

impl From<&str> for Arguments {
    fn from(line: &str) -> Self {
        Self::Line(line.to_string())
    }
}

impl From<String> for Arguments {
    fn from(line: String) -> Self {
        Self::Line(line)
    }
}

impl From<Vec<String>> for Arguments {
    fn from(tokens: Vec<String>) -> Self {
        Self::Tokens(tokens)
    }
}

impl From<Vec<&str>> for Arguments {
    fn from(tokens: Vec<&str>) -> Self {
        Self::Tokens(tokens.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Arguments {
    fn from(tokens: &[&str]) -> Self {
        Self::Tokens(tokens.iter().map(|s| s.to_string()).collect())
    }
}

/// One subprocess call
pub struct InvocationRequest {
    pub input: InvocationInput,
    pub args: Arguments,
    pub output: Option<InvocationOutput>,
    pub verbose: bool,
    pub diagnostic_handler: Option<DiagnosticHandler>,
    /// Overrides the configured binary path for this call only
    pub binary_path: Option<String>,
}

impl InvocationRequest {
    /// Start building a request
    pub fn builder() -> InvocationRequestBuilder {
        InvocationRequestBuilder::default()
    }
}

impl fmt::Debug for InvocationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationRequest")
            .field("input", &self.input)
            .field("args", &self.args)
            .field("output", &self.output)
            .field("verbose", &self.verbose)
            .field("diagnostic_handler", &self.diagnostic_handler.is_some())
            .field("binary_path", &self.binary_path)
            .finish()
    }
}

#[derive(Default)]
pub struct InvocationRequestBuilder {
    input: Option<InvocationInput>,
    args: Option<Arguments>,
    output: Option<InvocationOutput>,
    verbose: bool,
    diagnostic_handler: Option<DiagnosticHandler>,
    binary_path: Option<String>,
}

impl InvocationRequestBuilder {
    /// Set the input: a path, a byte buffer, or a stream
    pub fn input<I: Into<InvocationInput>>(mut self, input: I) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Set the caller arguments, as a line or as tokens
    pub fn args<A: Into<Arguments>>(mut self, args: A) -> Self {
        self.args = Some(args.into());
        self
    }

    /// Send output to a file or stream instead of collecting it
    pub fn output<O: Into<InvocationOutput>>(mut self, output: O) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Surface the tool's stderr and log the command line
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Only called when verbose is enabled
    pub fn diagnostic_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        self.diagnostic_handler = Some(Box::new(handler));
        self
    }

    /// Route stderr chunks into an unbounded channel instead of a callback.
    ///
    /// Dropping the receiver never stalls the tool; chunks are then discarded.
    pub fn subscribe_diagnostics(self) -> (Self, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let builder = self.diagnostic_handler(move |chunk: &[u8]| {
            tx.send(chunk.to_vec()).ok();
        });
        (builder, rx)
    }

    /// Override the binary path for this call
    pub fn binary_path<S: Into<String>>(mut self, path: S) -> Self {
        self.binary_path = Some(path.into());
        self
    }

    /// Fails when input or arguments are missing
    pub fn build(self) -> Result<InvocationRequest> {
        let input = self.input;
        let args = self.args.filter(|args| !args.is_missing());

        let (input, args) = match (input, args) {
            (Some(input), Some(args)) => (input, args),
            _ => return Err(FfpipeError::Request("Missing input or args.".to_string())),
        };

        Ok(InvocationRequest {
            input,
            args,
            output: self.output,
            verbose: self.verbose,
            diagnostic_handler: self.diagnostic_handler,
            binary_path: self.binary_path,
        })
    }
}

/// What a completed invocation hands back
#[derive(Debug)]
pub enum InvocationResult {
    /// Output went to a file or stream; the tool's exit status, successful or not
    Exited(ExitStatus),
    /// Output collected in memory, chunks concatenated in arrival order
    Collected(Vec<u8>),
}

impl InvocationResult {
    /// Collected output, if the output was kept in memory
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Collected(bytes) => Some(bytes),
            Self::Exited(_) => None,
        }
    }

    /// Exit status, if the output went to a file or stream
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            Self::Exited(status) => Some(*status),
            Self::Collected(_) => None,
        }
    }
}
