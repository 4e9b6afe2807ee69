//! ffpipe - Pipe data through ffmpeg
//!
//! Command-line entry point: run a single conversion over files or
//! stdin/stdout, convert a directory in batch, or check the ffmpeg install.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ffpipe::batch::BatchRunner;
use ffpipe::cli::{Args, Commands};
use ffpipe::config::Config;
use ffpipe::media::{
    Arguments, InvocationInput, InvocationOutput, InvocationRequest, InvocationResult,
    MediaInvokerFactory, MediaInvokerTrait, PipeInvoker,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("ffpipe.toml").exists() {
                info!("Found ffpipe.toml in current directory, loading...");
                Config::from_file("ffpipe.toml")?
            } else {
                Config::default()
            }
        }
    };
    if let Some(ffmpeg) = args.ffmpeg {
        config.invoker.binary_path = Some(ffmpeg);
    }
    config.invoker.verbose |= args.verbose;

    match args.command {
        Commands::Run { input, args: tool_args, output } => {
            let invoker = PipeInvoker::new(config.invoker.clone());

            let input = if input == "-" {
                InvocationInput::stream(tokio::io::stdin())
            } else {
                InvocationInput::FilePath(PathBuf::from(input))
            };
            let output = if output == "-" {
                InvocationOutput::stream(tokio::io::stdout())
            } else {
                InvocationOutput::FilePath(PathBuf::from(output))
            };

            let request = InvocationRequest::builder()
                .input(input)
                .args(tool_args)
                .output(output)
                .build()?;

            match invoker.invoke(request).await? {
                InvocationResult::Exited(status) if !status.success() => {
                    anyhow::bail!("ffmpeg exited with {}", status);
                }
                InvocationResult::Exited(status) => info!("ffmpeg exited with {}", status),
                InvocationResult::Collected(bytes) => info!("Collected {} bytes", bytes.len()),
            }
        }
        Commands::Batch { input_dir, output_dir, args: tool_args, concurrency } => {
            if let Some(concurrency) = concurrency {
                config.batch.concurrency = concurrency;
            }
            let invoker: Arc<dyn MediaInvokerTrait> =
                Arc::from(MediaInvokerFactory::create_invoker(config.invoker.clone()));
            invoker.check_availability()?;

            let runner = BatchRunner::new(invoker, config.batch.clone());
            let summary = runner
                .run(&input_dir, &output_dir, &Arguments::from(tool_args))
                .await?;

            for (path, reason) in &summary.failed {
                eprintln!("FAILED {}: {}", path.display(), reason);
            }
            println!(
                "Processed {} files: {} succeeded, {} failed",
                summary.succeeded.len() + summary.failed.len(),
                summary.succeeded.len(),
                summary.failed.len()
            );
            if !summary.failed.is_empty() {
                anyhow::bail!("{} files failed", summary.failed.len());
            }
        }
        Commands::Check => {
            let invoker = MediaInvokerFactory::create_invoker(config.invoker.clone());
            invoker.check_availability()?;
            println!("{}", invoker.get_version_info().await?);
        }
        Commands::InitConfig { path } => {
            config.save_to_file(&path)?;
            println!("Wrote configuration to {}", path.display());
        }
    }

    Ok(())
}

/// Setup logging to both console (stderr) and file
fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".ffpipe").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "ffpipe.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // Console goes to stderr; stdout may carry media data
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("ffpipe.log").display());

    Ok(())
}
