//! Conversion of raw service payloads into typed results
//!
//! Optional fields may be missing or `null` and decode to `None`. Required fields
//! (`language`, `version`, and `stdout`/`stderr`/`output` on each step) are
//! enforced: a payload without them is rejected with [`PistonError::Decode`]
//! naming the field, instead of yielding a half-populated value.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::PistonError;
use crate::types::{ExecutionResults, Runtime};

pub fn decode_runtimes(value: Value) -> Result<Vec<Runtime>, PistonError> {
    let runtimes: Vec<Runtime> = decode(value, "runtime list")?;
    log::debug!("Decoded {} runtimes", runtimes.len());
    Ok(runtimes)
}

pub fn decode_execution_results(value: Value) -> Result<ExecutionResults, PistonError> {
    decode(value, "execution results")
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, PistonError> {
    serde_json::from_value(value)
        .map_err(|e| PistonError::Decode(format!("invalid {}: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_runtimes() {
        let runtimes = decode_runtimes(json!([
            {"language": "ruby", "version": "3.0.1", "aliases": ["rb"]},
            {"language": "javascript", "version": "16.3.0", "aliases": ["js", "node"], "runtime": "node"},
            {"language": "bash", "version": "5.1.0"}
        ]))
        .unwrap();

        assert_eq!(runtimes.len(), 3);
        assert_eq!(runtimes[0].language, "ruby");
        assert_eq!(runtimes[0].aliases, vec!["rb"]);
        assert_eq!(runtimes[0].runtime, None);
        assert_eq!(runtimes[1].runtime.as_deref(), Some("node"));
        assert!(runtimes[2].aliases.is_empty());
    }

    #[test]
    fn test_decode_execution_results_without_optional_fields() {
        let results = decode_execution_results(json!({
            "language": "ruby",
            "version": "3.0.1",
            "run": {"stdout": "42\n", "stderr": "", "output": "42\n", "code": 0}
        }))
        .unwrap();

        assert_eq!(results.run.stdout, "42\n");
        assert_eq!(results.run.code, Some(0));
        assert_eq!(results.run.signal, None);
        assert_eq!(results.run.message, None);
        assert_eq!(results.run.status, None);
        assert_eq!(results.run.cpu_time, None);
        assert_eq!(results.run.wall_time, None);
        assert_eq!(results.run.memory, None);
        assert!(results.compile.is_none());
    }

    #[test]
    fn test_decode_null_optionals() {
        let results = decode_execution_results(json!({
            "language": "c",
            "version": "10.2.0",
            "compile": {
                "stdout": "", "stderr": "", "output": "",
                "code": 0, "signal": null, "cpu_time": 120, "wall_time": 180, "memory": 2048000
            },
            "run": {
                "stdout": "", "stderr": "", "output": "",
                "code": null, "signal": "SIGKILL", "message": "Killed", "status": "SG"
            }
        }))
        .unwrap();

        let compile = results.compile.unwrap();
        assert!(compile.succeeded());
        assert_eq!(compile.cpu_time, Some(120));
        assert_eq!(compile.memory, Some(2048000));

        assert_eq!(results.run.code, None);
        assert_eq!(results.run.signal.as_deref(), Some("SIGKILL"));
        assert_eq!(results.run.status.as_deref(), Some("SG"));
    }

    #[test]
    fn test_missing_required_field_fails() {
        let err = decode_execution_results(json!({
            "language": "ruby",
            "version": "3.0.1",
            "run": {"stderr": "", "output": ""}
        }))
        .unwrap_err();

        match err {
            PistonError::Decode(msg) => {
                assert!(msg.contains("execution results"));
                assert!(msg.contains("stdout"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let err = decode_runtimes(json!([{"version": "3.0.1"}])).unwrap_err();
        assert!(matches!(err, PistonError::Decode(ref msg) if msg.contains("language")));
    }

    #[test]
    fn test_wrong_shape_fails() {
        assert!(matches!(
            decode_runtimes(json!({"message": "not a list"})),
            Err(PistonError::Decode(_))
        ));
        assert!(matches!(
            decode_execution_results(json!([])),
            Err(PistonError::Decode(_))
        ));
    }
}
