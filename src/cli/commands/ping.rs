use clap::Args;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

const DEFAULT_URL: &str = "http://localhost:8000";

#[derive(Args, Debug)]
pub struct PingArgs {
    #[arg(long, help = "Server base URL (defaults to PAWTRACKER_URL or http://localhost:8000)")]
    pub url: Option<String>,

    #[arg(long, default_value_t = 5, help = "Request timeout in seconds")]
    pub timeout: u64,
}

pub async fn handle(args: PingArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let base = args
        .url
        .or_else(|| std::env::var("PAWTRACKER_URL").ok())
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let url = format!("{}/health", base.trim_end_matches('/'));

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let started = Instant::now();
    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(output_format, &format!("{} unreachable: {}", url, e), Some("UNREACHABLE"))?;
            anyhow::bail!("server unreachable");
        }
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(
            output_format,
            &format!("{} is healthy ({} ms)", base, elapsed_ms),
            Some(json!({ "url": url, "status": status.as_u16(), "elapsed_ms": elapsed_ms, "health": body })),
        )
    } else {
        output_error(
            output_format,
            &format!("{} answered {} ({} ms)", base, status, elapsed_ms),
            Some("DEGRADED"),
        )?;
        anyhow::bail!("server degraded");
    }
}
