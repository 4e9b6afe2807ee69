#![cfg(unix)]

// Kept in its own test binary: the default path is process-wide state.

mod common;

use ffpipe::config::InvokerConfig;
use ffpipe::media::{InvocationRequest, PipeInvoker};
use ffpipe::{default_binary_path, set_default_binary_path, FALLBACK_BINARY};

#[tokio::test]
async fn test_process_wide_default_is_used_without_override() {
    assert_eq!(default_binary_path(), FALLBACK_BINARY);

    let echo = common::tools().echo();
    set_default_binary_path(echo.clone());
    assert_eq!(default_binary_path(), echo);

    let invoker = PipeInvoker::new(InvokerConfig::default());
    let request = InvocationRequest::builder()
        .input(b"from default".to_vec())
        .args("-f mp4")
        .build()
        .unwrap();

    let result = invoker.invoke(request).await.unwrap();
    assert_eq!(result.into_bytes().unwrap(), b"from default");

    // Configured path still wins over the process-wide default
    let configured = InvokerConfig {
        binary_path: Some("/nonexistent/ffmpeg".to_string()),
        verbose: false,
    };
    assert_eq!(configured.resolve_binary_path(None), "/nonexistent/ffmpeg");
}
