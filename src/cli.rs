use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging and surface ffmpeg's stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to the ffmpeg binary (overrides the configuration file)
    #[arg(long)]
    pub ffmpeg: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pipe one input through ffmpeg
    Run {
        /// Input file, or "-" for stdin
        #[arg(short, long)]
        input: String,

        /// ffmpeg arguments, space separated (without -i and output)
        #[arg(short, long, allow_hyphen_values = true)]
        args: String,

        /// Output file, or "-" for stdout
        #[arg(short, long, default_value = "-")]
        output: String,
    },

    /// Run ffmpeg over every matching file in a directory
    Batch {
        /// Input directory containing media files
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory for converted files
        #[arg(short, long)]
        output_dir: PathBuf,

        /// ffmpeg arguments, space separated (without -i and output)
        #[arg(short, long, allow_hyphen_values = true)]
        args: String,

        /// Maximum number of concurrent ffmpeg processes
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,
    },

    /// Check that ffmpeg can be executed and print its version
    Check,

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "ffpipe.toml")]
        path: PathBuf,
    },
}
