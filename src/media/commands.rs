use tokio::process::Command;

use crate::error::{Result, FfpipeError};

/// Input marker: read from stdin
pub const INPUT_PIPE: &str = "pipe:0";
/// Output marker: write to stdout
pub const OUTPUT_PIPE: &str = "pipe:1";
/// Fragmented MP4 without a trailing moov atom, so the output can be read
/// incrementally from a non-seekable pipe
pub const FRAGMENT_FLAGS: [&str; 2] = ["-movflags", "frag_keyframe+empty_moov"];

/// A fully assembled `<binary> -i pipe:0 ... pipe:1` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeCommand {
    pub binary_path: String,
    pub args: Vec<String>,
}

impl PipeCommand {
    /// Create a new command with no arguments
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Wrap the caller's tokens with the pipe markers.
    ///
    /// `fragmented` prepends the fragmentation flags to the caller's tokens;
    /// use it whenever the output is not a seekable file.
    pub fn assemble<S: Into<String>>(
        binary_path: S,
        caller_args: Vec<String>,
        fragmented: bool,
    ) -> Result<Self> {
        if caller_args.iter().any(|arg| arg == "-i") {
            return Err(FfpipeError::Request(
                "The input and output ffmpeg argument is disallowed as the package will \
                 specify those, please use the input option instead."
                    .to_string(),
            ));
        }

        let mut command = Self::new(binary_path).arg("-i").arg(INPUT_PIPE);
        if fragmented {
            command = command.args(FRAGMENT_FLAGS);
        }
        Ok(command.args(caller_args).arg(OUTPUT_PIPE))
    }

    /// Human-readable command line for logging
    pub fn display(&self) -> String {
        let mut line = self.binary_path.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Build the process command; stdio wiring is left to the caller
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(line: &str) -> Vec<String> {
        line.split(' ').map(str::to_string).collect()
    }

    #[test]
    fn test_assemble_file_output() {
        let command = PipeCommand::assemble("ffmpeg", tokens("-c:v libx264 -f mp4"), false).unwrap();
        assert_eq!(
            command.args,
            vec!["-i", "pipe:0", "-c:v", "libx264", "-f", "mp4", "pipe:1"]
        );
    }

    #[test]
    fn test_assemble_stream_output_adds_fragment_flags() {
        let command = PipeCommand::assemble("ffmpeg", tokens("-f mp4"), true).unwrap();
        assert_eq!(
            command.args,
            vec!["-i", "pipe:0", "-movflags", "frag_keyframe+empty_moov", "-f", "mp4", "pipe:1"]
        );
    }

    #[test]
    fn test_assemble_rejects_input_flag() {
        let err = PipeCommand::assemble("ffmpeg", tokens("-i other.mp4 -f mp4"), false).unwrap_err();
        match err {
            FfpipeError::Request(message) => assert!(message.contains("disallowed")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_assemble_allows_flags_containing_i() {
        let command = PipeCommand::assemble("ffmpeg", tokens("-itsoffset 1 -f mp4"), false).unwrap();
        assert!(command.args.contains(&"-itsoffset".to_string()));
    }

    #[test]
    fn test_display() {
        let command = PipeCommand::assemble("/usr/bin/ffmpeg", tokens("-f mp4"), false).unwrap();
        assert_eq!(command.display(), "/usr/bin/ffmpeg -i pipe:0 -f mp4 pipe:1");
    }
}
