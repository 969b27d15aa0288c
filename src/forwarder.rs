//! Invocation entry point: normalize a batch and deliver it with retries.

use anyhow::Result;
use log::{debug, warn};
use std::path::Path;

use crate::batch::{InputFormat, LogBatch, to_payload};
use crate::config::Config;
use crate::http::{Deliver, HttpClient, RetryPolicy, retry_max};
use crate::runtime::Runtime;
use crate::sink::{ConsoleSink, LogSink};

pub const SUCCESS_MESSAGE: &str = "Logs payload successfully sent to Last9.";
pub const EXHAUSTED_MESSAGE: &str = "Max retries reached: failed to send logs payload to Last9";

/// Reads one batch, resolves configuration, and forwards it.
///
/// Only startup problems (bad configuration values, unreadable input) are
/// returned as errors. Missing credentials and delivery outcomes are reported
/// to the log, and missing credentials stop the run before input is read.
#[tracing::instrument(skip(runtime))]
pub async fn run<R: Runtime>(runtime: &R, input: Option<&Path>, format: InputFormat) -> Result<()> {
    let config = Config::from_runtime(runtime)?;
    if let Err(e) = config.ensure_credentials() {
        ConsoleSink.error(&e.to_string());
        return Ok(());
    }

    let raw = match input {
        Some(path) => runtime.read_file(path)?,
        None => runtime.read_stdin()?,
    };
    let batch = LogBatch::from_input(raw, format);

    let client = HttpClient::from_config(&config)?;
    handle(&config, &client, batch, &ConsoleSink).await;
    Ok(())
}

/// Handles one invocation. Never fails: every outcome ends up in `sink`.
///
/// Returns whether the payload was accepted.
#[tracing::instrument(skip_all)]
pub async fn handle<D: Deliver + ?Sized>(
    config: &Config,
    delivery: &D,
    batch: LogBatch,
    sink: &dyn LogSink,
) -> bool {
    if let Err(e) = config.ensure_credentials() {
        sink.error(&e.to_string());
        return false;
    }
    if let Some(var) = config.credentials.missing_half() {
        warn!("{} is not set, sending credentials with an empty value for it", var);
    }

    let lines = batch.normalize();
    sink.info(&format!("Received {} logs", lines.len()));

    let payload = to_payload(&lines);
    send_logs(delivery, config.retry, &payload, sink).await
}

/// Delivers `payload` under `policy`, logging the final outcome.
pub async fn send_logs<D: Deliver + ?Sized>(
    delivery: &D,
    policy: RetryPolicy,
    payload: &str,
    sink: &dyn LogSink,
) -> bool {
    match retry_max(policy, "Send logs", move || delivery.deliver(payload, sink)).await {
        Ok(_) => {
            sink.log(SUCCESS_MESSAGE);
            true
        }
        Err(failure) => {
            sink.error(EXHAUSTED_MESSAGE);
            let descriptor = serde_json::to_string(&failure.descriptor())
                .unwrap_or_else(|_| failure.to_string());
            sink.error(&format!("Exception: {}", descriptor));
            debug!("Last failure: {}", failure);
            false
        }
    }
}
