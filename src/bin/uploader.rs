//! Bulk upload binary
//!
//! Reads configuration from the environment (with an optional `.env`
//! file), uploads every file in the configured directory, and exits
//! non-zero only on fatal startup errors. Per-file failures are reported
//! in the logs and the final summary.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use bucketload::config::UploaderConfig;
use bucketload::storage::S3Store;
use bucketload::{ConcurrencyBudget, UploadDispatcher};

#[tokio::main]
async fn main() -> ExitCode {
    // A .env file is optional; real environment variables win either way.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = match UploaderConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuration error");
            return ExitCode::FAILURE;
        }
    };

    info!(
        bucket = %config.bucket,
        prefix = %config.key_prefix,
        dir = %config.directory.display(),
        concurrency = config.concurrency,
        "starting bucketload"
    );

    let store = Arc::new(S3Store::new(config.s3_config()));
    let budget = ConcurrencyBudget::new(config.concurrency);
    let dispatcher = UploadDispatcher::new(
        store,
        config.bucket.clone(),
        config.key_prefix.clone(),
        budget,
    );

    match dispatcher.run(&config.directory).await {
        Ok(report) => {
            info!(
                uploaded = report.files_uploaded,
                failed = report.files_failed,
                bytes = report.bytes_uploaded,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "done"
            );
            // Per-file failures are not fatal to the run.
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "upload run failed");
            ExitCode::FAILURE
        }
    }
}
