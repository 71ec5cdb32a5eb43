use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeFixture {
    pub language: String,
    pub version: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    /// Compiled runtimes report a compile step alongside the run step
    #[serde(default)]
    pub compiled: bool,
}

impl RuntimeFixture {
    pub fn new(language: &str, version: &str, aliases: &[&str]) -> Self {
        Self {
            language: language.to_string(),
            version: version.to_string(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
            runtime: None,
            compiled: false,
        }
    }

    pub fn compiled(mut self) -> Self {
        self.compiled = true;
        self
    }

    pub fn with_runtime(mut self, runtime: &str) -> Self {
        self.runtime = Some(runtime.to_string());
        self
    }

    fn matches(&self, language: &str, version: &str) -> bool {
        let language_matches =
            self.language == language || self.aliases.iter().any(|alias| alias == language);
        language_matches && (version == "*" || self.version == version)
    }

    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "language": self.language,
            "version": self.version,
            "aliases": self.aliases,
        });
        if let Some(runtime) = &self.runtime {
            value["runtime"] = json!(runtime);
        }
        value
    }
}

/// Canned result of running a program
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramOutcome {
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub signal: Option<String>,
    /// Compiler diagnostics; only honoured on compiled runtimes
    #[serde(default)]
    pub compile_error: Option<String>,
}

impl ProgramOutcome {
    pub fn stdout(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            ..Self::default()
        }
    }
}

/// Runtimes offered by the mock and the outcomes of known programs, keyed by source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionFixture {
    #[serde(default)]
    pub runtimes: Vec<RuntimeFixture>,
    #[serde(default)]
    pub programs: HashMap<String, ProgramOutcome>,
}

impl ExecutionFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_runtime(&mut self, runtime: RuntimeFixture) {
        self.runtimes.push(runtime);
    }

    pub fn add_program(&mut self, source: &str, outcome: ProgramOutcome) {
        self.programs.insert(source.to_string(), outcome);
    }

    pub fn find_runtime(&self, language: &str, version: &str) -> Option<&RuntimeFixture> {
        self.runtimes
            .iter()
            .find(|runtime| runtime.matches(language, version))
    }

    /// Outcome for `source`; unknown programs behave like `cat` on stdin
    pub fn outcome_for(&self, source: &str, stdin: &str) -> ProgramOutcome {
        self.programs
            .get(source)
            .cloned()
            .unwrap_or_else(|| ProgramOutcome::stdout(stdin))
    }

    pub fn from_yaml(yaml_content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(yaml_content)?)
    }

    pub fn create_test_fixture() -> Self {
        let mut fixture = Self::new();

        fixture.add_runtime(RuntimeFixture::new("ruby", "3.0.1", &["ruby3", "rb"]));
        fixture.add_runtime(RuntimeFixture::new("python", "3.10.0", &["py", "py3", "python3"]));
        fixture.add_runtime(
            RuntimeFixture::new("javascript", "16.3.0", &["node-javascript", "js", "node"])
                .with_runtime("node"),
        );
        fixture.add_runtime(RuntimeFixture::new("rust", "1.68.2", &["rs"]).compiled());

        fixture.add_program("puts 42", ProgramOutcome::stdout("42\n"));
        fixture.add_program("print(42)", ProgramOutcome::stdout("42\n"));
        fixture.add_program(
            "fn main() { println!(\"42\"); }",
            ProgramOutcome::stdout("42\n"),
        );
        fixture.add_program(
            "fn main() { let x: u8 = \"nope\"; }",
            ProgramOutcome {
                compile_error: Some("error[E0308]: mismatched types\n".to_string()),
                ..ProgramOutcome::default()
            },
        );
        fixture.add_program(
            "raise 'boom'",
            ProgramOutcome {
                stderr: "main.rb:1:in `<main>': boom (RuntimeError)\n".to_string(),
                code: 1,
                ..ProgramOutcome::default()
            },
        );
        fixture.add_program(
            "loop {}",
            ProgramOutcome {
                signal: Some("SIGKILL".to_string()),
                ..ProgramOutcome::default()
            },
        );

        fixture
    }
}
