//! Project configuration: an optional `zapc.toml` next to the source file.
//!
//! Grounded on the teacher's `lint::LintConfig::from_toml` (`serde` +
//! `toml`, a `Result<Self, String>` parse function) generalized from a
//! lint-rule list to the pipeline-wide knobs spec.md's CLI section needs.
//! Optimization level is deliberately absent: optimization passes are a
//! spec.md Non-goal and this config does not resurrect them.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Promote every reported warning to an error for the purposes of the
    /// CLI's exit code (the diagnostics themselves are unaffected).
    pub warnings_as_errors: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig { warnings_as_errors: false }
    }
}

impl CompilerConfig {
    /// Parse a `zapc.toml` document.
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("failed to parse zapc.toml: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_warnings_as_errors_off() {
        let config = CompilerConfig::default();
        assert!(!config.warnings_as_errors);
    }

    #[test]
    fn parses_warnings_as_errors() {
        let config = CompilerConfig::from_toml("warnings_as_errors = true").unwrap();
        assert!(config.warnings_as_errors);
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = CompilerConfig::from_toml("").unwrap();
        assert!(!config.warnings_as_errors);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(CompilerConfig::from_toml("warnings_as_errors = not-a-bool").is_err());
    }
}
