#![cfg(unix)]

mod common;

use std::sync::Arc;

use assert_fs::prelude::*;

use ffpipe::batch::BatchRunner;
use ffpipe::config::{BatchConfig, InvokerConfig};
use ffpipe::media::{Arguments, MediaInvokerTrait, PipeInvoker};

fn runner(binary: String) -> BatchRunner {
    let invoker: Arc<dyn MediaInvokerTrait> = Arc::new(PipeInvoker::new(InvokerConfig {
        binary_path: Some(binary),
        verbose: false,
    }));
    let config = BatchConfig {
        concurrency: 2,
        extensions: vec!["mov".to_string()],
        output_extension: "mp4".to_string(),
    };
    BatchRunner::new(invoker, config).with_progress(false)
}

#[tokio::test]
async fn test_batch_converts_each_file() {
    let input_dir = assert_fs::TempDir::new().unwrap();
    input_dir.child("a.mov").write_str("first clip").unwrap();
    input_dir.child("b.mov").write_str("second clip").unwrap();
    input_dir.child("c.mov").write_str("third clip").unwrap();
    input_dir.child("readme.txt").write_str("skip me").unwrap();
    let output_dir = assert_fs::TempDir::new().unwrap();

    let summary = runner(common::tools().echo())
        .run(input_dir.path(), output_dir.path(), &Arguments::from("-c copy"))
        .await
        .unwrap();

    assert_eq!(summary.succeeded.len(), 3);
    assert!(summary.failed.is_empty());
    assert_eq!(std::fs::read_to_string(output_dir.child("a.mp4").path()).unwrap(), "first clip");
    assert_eq!(std::fs::read_to_string(output_dir.child("c.mp4").path()).unwrap(), "third clip");
    assert!(!output_dir.child("readme.mp4").path().exists());
}

#[tokio::test]
async fn test_batch_reports_failures_per_file() {
    let input_dir = assert_fs::TempDir::new().unwrap();
    input_dir.child("a.mov").write_str("clip").unwrap();
    input_dir.child("b.mov").write_str("clip").unwrap();
    let output_dir = assert_fs::TempDir::new().unwrap();

    let summary = runner(common::tools().fail())
        .run(input_dir.path(), output_dir.path(), &Arguments::from("-c copy"))
        .await
        .unwrap();

    assert!(summary.succeeded.is_empty());
    assert_eq!(summary.failed.len(), 2);
    assert!(summary.failed.iter().all(|(_, reason)| reason.contains("exited")));
}
