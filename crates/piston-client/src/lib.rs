//! Client SDK for the Piston remote code execution API
//!
//! This crate wraps the execution service's HTTP interface: it lists the language
//! runtimes the service offers and submits staged source files for remote
//! compilation and execution, returning typed results (stdout, stderr, exit code,
//! timing and memory usage). Rate-limited requests are retried with exponential
//! backoff; every other failure surfaces to the caller as a [`PistonError`].
//!
//! ```no_run
//! use piston_client::{ClientConfig, PistonClient};
//!
//! # async fn run() -> Result<(), piston_client::PistonError> {
//! let mut client = PistonClient::new(ClientConfig::default())?;
//! client.add_file("puts 42", Some("main.rb".to_string()), None);
//!
//! let results = client.execute("ruby", "3.0.1", None, None).await?;
//! assert_eq!(results.run.stdout, "42\n");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod decode;
pub mod errors;
mod executor;
pub mod types;

pub use client::PistonClient;
pub use config::{ClientConfig, ExecutionLimits, DEFAULT_BASE_URL};
pub use errors::PistonError;
pub use types::*;
