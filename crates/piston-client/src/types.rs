//! Value types exchanged with the execution service
//!
//! Results decode from the service's JSON; staged files serialize into the
//! execute request with absent optional fields left out.

use serde::{Deserialize, Serialize};

/// File encodings understood by the execution service
pub struct FileEncoding;

impl FileEncoding {
    pub const UTF8: &'static str = "utf8";
    pub const BASE64: &'static str = "base64";
    pub const HEX: &'static str = "hex";
}

/// A language/version pair the execution service can run code in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    pub language: String,
    pub version: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

impl Runtime {
    /// True if `name` is this runtime's language or one of its aliases
    pub fn matches(&self, name: &str) -> bool {
        self.language == name || self.aliases.iter().any(|alias| alias == name)
    }
}

/// Outcome of one compile or run phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStepDetails {
    pub stdout: String,
    pub stderr: String,
    pub output: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// CPU time in milliseconds
    #[serde(default)]
    pub cpu_time: Option<i64>,
    /// Wall-clock time in milliseconds
    #[serde(default)]
    pub wall_time: Option<i64>,
    /// Peak memory in bytes
    #[serde(default)]
    pub memory: Option<i64>,
}

impl ExecutionStepDetails {
    /// Exited with code 0 and was not killed by a signal
    pub fn succeeded(&self) -> bool {
        self.code == Some(0) && self.signal.is_none()
    }
}

/// Both phases of one execution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResults {
    pub language: String,
    pub version: String,
    pub run: ExecutionStepDetails,
    #[serde(default)]
    pub compile: Option<ExecutionStepDetails>,
}

impl ExecutionResults {
    /// A compile phase ran and did not succeed
    pub fn compile_failed(&self) -> bool {
        self.compile
            .as_ref()
            .map(|compile| !compile.succeeded())
            .unwrap_or(false)
    }
}

/// Source file queued client-side for the next execution request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl StagedFile {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            name: None,
            content: content.into(),
            encoding: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(code: Option<i64>, signal: Option<&str>) -> ExecutionStepDetails {
        ExecutionStepDetails {
            stdout: String::new(),
            stderr: String::new(),
            output: String::new(),
            code,
            signal: signal.map(str::to_string),
            message: None,
            status: None,
            cpu_time: None,
            wall_time: None,
            memory: None,
        }
    }

    #[test]
    fn test_runtime_matches_language_and_aliases() {
        let runtime = Runtime {
            language: "python".to_string(),
            version: "3.10.0".to_string(),
            aliases: vec!["py".to_string(), "python3".to_string()],
            runtime: None,
        };

        assert!(runtime.matches("python"));
        assert!(runtime.matches("py"));
        assert!(runtime.matches("python3"));
        assert!(!runtime.matches("ruby"));
    }

    #[test]
    fn test_step_success() {
        assert!(step(Some(0), None).succeeded());
        assert!(!step(Some(1), None).succeeded());
        assert!(!step(None, Some("SIGKILL")).succeeded());
        assert!(!step(None, None).succeeded());
    }

    #[test]
    fn test_compile_failed() {
        let mut results = ExecutionResults {
            language: "rust".to_string(),
            version: "1.68.2".to_string(),
            run: step(Some(0), None),
            compile: None,
        };
        assert!(!results.compile_failed());

        results.compile = Some(step(Some(0), None));
        assert!(!results.compile_failed());

        results.compile = Some(step(Some(1), None));
        assert!(results.compile_failed());
    }

    #[test]
    fn test_staged_file_omits_absent_fields() {
        let bare = serde_json::to_value(StagedFile::new("puts 42")).unwrap();
        assert_eq!(bare, json!({"content": "puts 42"}));

        let full = StagedFile::new("cHV0cyA0Mg==")
            .with_name("main.rb")
            .with_encoding(FileEncoding::BASE64);
        assert_eq!(
            serde_json::to_value(full).unwrap(),
            json!({"name": "main.rb", "content": "cHV0cyA0Mg==", "encoding": "base64"})
        );
    }
}
