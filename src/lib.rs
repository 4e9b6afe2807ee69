//! ffpipe - Pipe data through ffmpeg
//!
//! A thin wrapper that runs ffmpeg as a subprocess with `-i pipe:0 ... pipe:1`,
//! feeding it a file, a byte buffer, or an async stream, and delivering the
//! output to a file, a stream, or an in-memory buffer.

pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;

pub use config::{default_binary_path, set_default_binary_path, FALLBACK_BINARY};
pub use error::{FfpipeError, Result};
pub use media::{
    Arguments, InvocationInput, InvocationOutput, InvocationRequest, InvocationResult,
    MediaInvokerFactory, MediaInvokerTrait, PipeInvoker,
};
