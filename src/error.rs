use thiserror::Error;

#[derive(Error, Debug)]
pub enum FfpipeError {
    /// Rejected before any process was spawned
    #[error("Invalid request: {0}")]
    Request(String),

    /// The host could not create the subprocess
    #[error("Failed to spawn media tool: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, FfpipeError>;
