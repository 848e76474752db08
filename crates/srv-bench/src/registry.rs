//! Candidate registry loading
//!
//! The registry is a JSON array of candidate descriptors. Order is
//! preserved: the final report lists candidates in registration order.
//! Registry faults are the one class of error that aborts the whole run.

use std::collections::HashSet;
use std::path::Path;

use garde::Validate;
use srv_bench_common::CandidateDescriptor;
use thiserror::Error;
use tracing::info;

/// Registry loading and validation errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to read the registry file
    #[error("failed to read registry file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the registry JSON
    #[error("failed to parse registry: {0}")]
    Parse(#[from] serde_json::Error),

    /// Registry contains no candidates
    #[error("registry is empty")]
    Empty,

    /// A candidate failed validation
    #[error("invalid candidate '{name}': {report}")]
    Invalid { name: String, report: String },

    /// Two candidates share a name
    #[error("duplicate candidate name '{0}'")]
    DuplicateName(String),
}

/// Load and validate the registry file.
pub fn load_registry(path: &Path) -> Result<Vec<CandidateDescriptor>, RegistryError> {
    let raw = std::fs::read_to_string(path).map_err(|e| RegistryError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let candidates = parse_registry(&raw)?;
    info!(
        path = %path.display(),
        candidates = candidates.len(),
        "candidate registry loaded"
    );
    Ok(candidates)
}

/// Parse and validate registry JSON.
pub fn parse_registry(raw: &str) -> Result<Vec<CandidateDescriptor>, RegistryError> {
    let candidates: Vec<CandidateDescriptor> = serde_json::from_str(raw)?;
    if candidates.is_empty() {
        return Err(RegistryError::Empty);
    }

    let mut seen = HashSet::new();
    for candidate in &candidates {
        candidate
            .validate()
            .map_err(|report| RegistryError::Invalid {
                name: candidate.name.clone(),
                report: report.to_string(),
            })?;
        if !seen.insert(candidate.name.as_str()) {
            return Err(RegistryError::DuplicateName(candidate.name.clone()));
        }
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"[
        {"name": "echo", "endpoint": {"port": 4000}, "command": "node", "args": ["echo.js"]},
        {"name": "static", "endpoint": {"host": "0.0.0.0", "port": 4001}, "command": "./static-server", "external": true}
    ]"#;

    #[test]
    fn test_parse_valid_registry_preserves_order() {
        let candidates = parse_registry(VALID).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "echo");
        assert_eq!(candidates[1].name, "static");
        assert!(candidates[1].external);
        assert_eq!(candidates[1].endpoint.host, "0.0.0.0");
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert!(matches!(parse_registry("[]"), Err(RegistryError::Empty)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            parse_registry("{not json"),
            Err(RegistryError::Parse(_))
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let raw = r#"[
            {"name": "echo", "endpoint": {"port": 4000}, "command": "a"},
            {"name": "echo", "endpoint": {"port": 4001}, "command": "b"}
        ]"#;
        match parse_registry(raw) {
            Err(RegistryError::DuplicateName(name)) => assert_eq!(name, "echo"),
            other => panic!("expected duplicate name error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_candidate_rejected() {
        let raw = r#"[{"name": "echo", "endpoint": {"port": 0}, "command": "a"}]"#;
        assert!(matches!(
            parse_registry(raw),
            Err(RegistryError::Invalid { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = load_registry(Path::new("/definitely/not/a/registry.json"));
        assert!(matches!(result, Err(RegistryError::Io { .. })));
    }
}
