//! Firebase Test Lab client for iOS XCTest jobs.
//!
//! This crate submits an XCTest bundle to Firebase Test Lab, polls the
//! resulting test matrix until it reaches a terminal state, and aggregates
//! per-device and per-step outcomes into a single pass/fail verdict. It is
//! meant to run as one step of a build pipeline: fatal conditions (the job
//! could not run) are errors, while tests that ran and failed come back as
//! a clean `Verdict { success: false, .. }`.
//!
//! # Examples
//!
//! ```no_run
//! use xctestlab::{IosDevice, RunParams, TestLabConfig, TestLabRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TestLabConfig::new("my-gcp-project".to_string(), None);
//!     let runner = TestLabRunner::from_config(&config).await?;
//!
//!     let verdict = runner
//!         .run(RunParams {
//!             app_path: "./build/MyApp.zip".to_string(),
//!             devices: vec![IosDevice::new("iphonex", "11.2")],
//!             timeout_sec: 180,
//!             result_storage: None,
//!             async_submit: false,
//!         })
//!         .await?;
//!
//!     if !verdict.success {
//!         eprintln!(
//!             "{} step failure(s), {} inconclusive",
//!             verdict.step_failures, verdict.inconclusive_steps
//!         );
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod poller;
pub mod report;
pub mod storage;
pub mod taxonomy;
pub mod types;
pub mod validator;

mod runner;

// Re-export main types
pub use api::TestLabApi;
pub use config::TestLabConfig;
pub use error::{Error, Result};
pub use poller::{MatrixService, ResultPoller};
pub use report::Verdict;
pub use runner::{RunParams, TestLabRunner};
pub use storage::GcsClient;
pub use types::{IosDevice, MatrixState, MatrixStatus, StepOutcome};
