//! High-level client for the execution service
//!
//! A [`PistonClient`] owns its configuration and an ordered list of staged files.
//! Staged files are submitted with every `execute` call and are NOT cleared
//! afterwards: callers running independent programs must call
//! [`PistonClient::clear_files`] in between or the files accumulate.
//!
//! A client is not meant to be shared between concurrent callers. Staging files
//! takes `&mut self`; wrap the client in external synchronization if several
//! tasks need the same instance. No client-side timeout is applied unless one is
//! configured; the compile/run limits are enforced by the service itself.

use reqwest::Client;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::decode::{decode_execution_results, decode_runtimes};
use crate::errors::PistonError;
use crate::executor::{HttpMethod, RequestExecutor};
use crate::types::{ExecutionResults, Runtime, StagedFile};

#[derive(Debug, Clone)]
pub struct PistonClient {
    config: ClientConfig,
    executor: RequestExecutor,
    files: Vec<StagedFile>,
}

impl PistonClient {
    /// Create a client, validating the configuration
    pub fn new(config: ClientConfig) -> Result<Self, PistonError> {
        config.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| PistonError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let executor = RequestExecutor::new(http, &config);
        Ok(Self {
            config,
            executor,
            files: Vec::new(),
        })
    }

    /// Client for the public service with default settings
    pub fn default_client() -> Result<Self, PistonError> {
        Self::new(ClientConfig::default())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Files that will be submitted with the next execution
    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    /// Queue a source file. Content and encoding are passed through unchecked.
    pub fn add_file(
        &mut self,
        content: impl Into<String>,
        name: Option<String>,
        encoding: Option<String>,
    ) {
        self.files.push(StagedFile {
            name,
            content: content.into(),
            encoding,
        });
    }

    /// Queue an already-built file
    pub fn stage(&mut self, file: StagedFile) {
        self.files.push(file);
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    /// List the runtimes the service offers, in service order
    pub async fn runtimes(&self) -> Result<Vec<Runtime>, PistonError> {
        let value = self.executor.request(HttpMethod::Get, "/runtimes", None).await?;
        decode_runtimes(value)
    }

    /// First runtime whose language or alias equals `language`
    pub async fn find_runtime(&self, language: &str) -> Result<Option<Runtime>, PistonError> {
        let runtimes = self.runtimes().await?;
        Ok(runtimes.into_iter().find(|runtime| runtime.matches(language)))
    }

    /// Submit the staged files for compilation and execution
    ///
    /// The staged files are kept after the call.
    pub async fn execute(
        &self,
        language: &str,
        version: &str,
        stdin: Option<&str>,
        args: Option<&[String]>,
    ) -> Result<ExecutionResults, PistonError> {
        let body = self.build_execute_body(language, version, stdin, args);
        log::debug!(
            "Executing {} file(s) on {}-{}",
            self.files.len(),
            language,
            version
        );

        let value = self
            .executor
            .request(HttpMethod::Post, "/execute", Some(&body))
            .await?;
        decode_execution_results(value)
    }

    fn build_execute_body(
        &self,
        language: &str,
        version: &str,
        stdin: Option<&str>,
        args: Option<&[String]>,
    ) -> Value {
        let mut body = json!({
            "language": language,
            "version": version,
            "files": self.files,
        });

        if let Some(stdin) = stdin {
            body["stdin"] = stdin.into();
        }

        if let Some(args) = args {
            body["args"] = json!(args);
        }

        self.config.limits.apply_to(&mut body);
        body
    }
}
