// Media tool invocation
//
// - io: request/result types (inputs, outputs, arguments)
// - commands: `-i pipe:0 ... pipe:1` argument assembly
// - processor: spawns the tool and wires its stdio

pub mod commands;
pub mod io;
pub mod processor;

use async_trait::async_trait;

pub use commands::*;
pub use io::*;
pub use processor::*;

use crate::config::InvokerConfig;
use crate::error::Result;

/// Main trait for running the media tool over pipes
#[async_trait]
pub trait MediaInvokerTrait: Send + Sync {
    /// Run one invocation to completion
    async fn invoke(&self, request: InvocationRequest) -> Result<InvocationResult>;

    /// Check if the media tool can be executed
    fn check_availability(&self) -> Result<()>;

    /// Get the media tool's version banner
    async fn get_version_info(&self) -> Result<String>;
}

/// Factory for creating media invoker instances
pub struct MediaInvokerFactory;

impl MediaInvokerFactory {
    /// Create the default invoker implementation (ffmpeg over stdio pipes)
    pub fn create_invoker(config: InvokerConfig) -> Box<dyn MediaInvokerTrait> {
        Box::new(processor::PipeInvoker::new(config))
    }
}
