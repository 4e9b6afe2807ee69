use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::BatchConfig;
use crate::error::{Result, FfpipeError};
use crate::media::{Arguments, InvocationRequest, InvocationResult, MediaInvokerTrait};

/// Outcome of a directory run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Runs one independent invocation per matching file in a directory
pub struct BatchRunner {
    invoker: Arc<dyn MediaInvokerTrait>,
    config: BatchConfig,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(invoker: Arc<dyn MediaInvokerTrait>, config: BatchConfig) -> Self {
        Self {
            invoker,
            config,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Files under `input_dir` whose extension is in the configured list
    pub fn collect_inputs(&self, input_dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| self.config.extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
                    .unwrap_or(false)
            })
            .map(|entry| entry.path().to_path_buf())
            .collect();
        files.sort();
        files
    }

    /// Output path for one input: `<output_dir>/<stem>.<output_extension>`
    pub fn output_path_for(&self, input: &Path, output_dir: &Path) -> Result<PathBuf> {
        let stem = input
            .file_stem()
            .ok_or_else(|| FfpipeError::Config(format!("Invalid input filename: {}", input.display())))?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(&self.config.output_extension);
        Ok(output_dir.join(name))
    }

    /// Convert every matching file, at most `concurrency` at a time.
    ///
    /// A failing file is recorded in the summary; the rest keep going.
    pub async fn run(&self, input_dir: &Path, output_dir: &Path, args: &Arguments) -> Result<BatchSummary> {
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(FfpipeError::FileNotFound(input_dir.display().to_string()));
        }
        fs::create_dir_all(output_dir).await?;

        let inputs = self.collect_inputs(input_dir);
        info!("Found {} files to process", inputs.len());

        let progress = if self.show_progress {
            let pb = ProgressBar::new(inputs.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}") {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        let mut summary = BatchSummary::default();

        for input in inputs {
            let output = match self.output_path_for(&input, output_dir) {
                Ok(output) if output == input => {
                    summary.failed.push((input, "output would overwrite input".to_string()));
                    continue;
                }
                Ok(output) => output,
                Err(e) => {
                    summary.failed.push((input, e.to_string()));
                    continue;
                }
            };

            let invoker = Arc::clone(&self.invoker);
            let semaphore = Arc::clone(&semaphore);
            let args = args.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = convert_one(invoker.as_ref(), &input, output, args).await;
                (input, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (input, result) = joined.map_err(|e| FfpipeError::Media(format!("Batch task failed: {}", e)))?;
            progress.inc(1);
            match result {
                Ok(()) => {
                    info!("Successfully processed: {}", input.display());
                    summary.succeeded.push(input);
                }
                Err(e) => {
                    warn!("Failed to process {}: {}", input.display(), e);
                    summary.failed.push((input, e.to_string()));
                }
            }
        }
        progress.finish_with_message("done");

        info!(
            "Batch completed: {} succeeded, {} failed",
            summary.succeeded.len(),
            summary.failed.len()
        );
        Ok(summary)
    }
}

async fn convert_one(
    invoker: &dyn MediaInvokerTrait,
    input: &Path,
    output: PathBuf,
    args: Arguments,
) -> Result<()> {
    let request = InvocationRequest::builder()
        .input(input)
        .args(args)
        .output(output)
        .build()?;

    match invoker.invoke(request).await? {
        InvocationResult::Exited(status) if status.success() => Ok(()),
        InvocationResult::Exited(status) => Err(FfpipeError::Media(format!("Media tool exited with {}", status))),
        InvocationResult::Collected(_) => Err(FfpipeError::Media(
            "Unexpected in-memory result for a file output".to_string(),
        )),
    }
}
