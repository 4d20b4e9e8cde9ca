//! # xctestlab-cli
//!
//! Binary entry point for running iOS XCTest jobs on Firebase Test Lab.
//!
//! Submits the bundle, waits for the matrix to finish, and exits non-zero
//! unless every device execution completed and every test step passed.
//! `--async` submits and returns without waiting.

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{error, info};
use xctestlab::{IosDevice, RunParams, TestLabConfig, TestLabRunner};

#[derive(Parser, Debug)]
#[command(name = "xctestlab", version, about = "Run iOS XCTest jobs on Firebase Test Lab")]
struct Cli {
    /// Google Cloud Platform project name
    #[arg(long, env = "XCTESTLAB_GCP_PROJECT")]
    gcp_project: String,

    /// Path to the XCTest zip, either on the filesystem or a gs:// address
    #[arg(long)]
    app_path: String,

    /// Device to test on, as `model=<id>,version=<id>[,locale=..][,orientation=..]`.
    /// Repeat for multiple devices. Defaults to an iPhone X on iOS 11.2.
    #[arg(long = "device", value_parser = parse_device)]
    devices: Vec<IosDevice>,

    /// Do not wait for test results
    #[arg(long = "async", default_value_t = false)]
    async_submit: bool,

    /// After how long, in seconds, tests should be terminated
    #[arg(long, default_value_t = 180)]
    timeout_sec: u64,

    /// gs:// path to store test results (defaults to the project's default bucket)
    #[arg(long)]
    result_storage: Option<String>,

    /// OAuth bearer token; when absent, gcloud application credentials are used
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    oauth_token: Option<String>,
}

/// Parse `model=iphonex,version=11.2,locale=en_US,orientation=portrait`.
/// `model` and `version` are required; the rest take the service defaults.
fn parse_device(spec: &str) -> Result<IosDevice, String> {
    let mut model = None;
    let mut version = None;
    let mut locale = None;
    let mut orientation = None;

    for part in spec.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            return Err(format!("expected key=value, got '{part}'"));
        };
        let value = value.trim();
        match key.trim() {
            "model" => model = Some(value),
            "version" => version = Some(value),
            "locale" => locale = Some(value),
            "orientation" => orientation = Some(value),
            other => return Err(format!("unknown device property '{other}'")),
        }
    }

    let model = model.ok_or("each device must have a model property")?;
    let version = version.ok_or("each device must have a version property")?;

    let mut device = IosDevice::new(model, version);
    if let Some(locale) = locale {
        device.locale = locale.to_string();
    }
    if let Some(orientation) = orientation {
        device.orientation = orientation.to_string();
    }
    Ok(device)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("xctestlab=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut devices = cli.devices;
    if devices.is_empty() {
        devices.push(IosDevice::new("iphonex", "11.2"));
    }

    let params = RunParams {
        app_path: cli.app_path,
        devices,
        timeout_sec: cli.timeout_sec,
        result_storage: cli.result_storage,
        async_submit: cli.async_submit,
    };
    params
        .validate()
        .context("invalid command line arguments")?;

    let config = TestLabConfig::new(cli.gcp_project, cli.oauth_token);
    let runner = TestLabRunner::from_config(&config)
        .await
        .context("could not set up the Test Lab client")?;

    // Logs go to stdout, the spinner to stderr
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid template"),
    );
    spinner.set_message(if cli.async_submit {
        "Submitting to Firebase Test Lab..."
    } else {
        "Running tests on Firebase Test Lab..."
    });
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = runner.run(params).await;
    spinner.finish_and_clear();

    let verdict = result.context("Test Lab run failed")?;
    if !verdict.success {
        error!(
            "Tests failed: {} execution(s) incomplete, {} step failure(s), {} inconclusive",
            verdict.execution_failures, verdict.step_failures, verdict.inconclusive_steps
        );
        bail!("Tests failed");
    }

    info!("Firebase Test Lab run succeeded");
    Ok(())
}
