//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::WorkspaceConfig;
use std::path::Path;

/// Name of the configuration file within the workspace directory.
pub const CONFIG_FILE: &str = "texforge.toml";

/// Loads and validates `texforge.toml` from a workspace directory.
///
/// Fails with [`ConfigError::IoError`] if the file does not exist.
pub fn load_config(workspace_dir: &Path) -> Result<WorkspaceConfig, ConfigError> {
    let content = std::fs::read_to_string(workspace_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Loads `texforge.toml` from a workspace directory, falling back to defaults
/// when the file is absent.
///
/// A file that exists but cannot be read, parsed, or validated is still an error.
pub fn load_config_or_default(workspace_dir: &Path) -> Result<WorkspaceConfig, ConfigError> {
    match std::fs::read_to_string(workspace_dir.join(CONFIG_FILE)) {
        Ok(content) => load_config_from_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(WorkspaceConfig::default()),
        Err(e) => Err(e.into()),
    }
}

/// Parses and validates a `texforge.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<WorkspaceConfig, ConfigError> {
    let config: WorkspaceConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are consistent.
fn validate_config(config: &WorkspaceConfig) -> Result<(), ConfigError> {
    if config.build.change_threshold == 0 {
        return Err(ConfigError::ValidationError(
            "build.change_threshold must be at least 1".to_string(),
        ));
    }
    if config.build.cache_dir.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "build.cache_dir must not be empty".to_string(),
        ));
    }
    validate_extension("scan.source_extension", &config.scan.source_extension)?;
    validate_extension(
        "scan.bibliography_extension",
        &config.scan.bibliography_extension,
    )?;
    for ext in &config.scan.image_extensions {
        validate_extension("scan.image_extensions", ext)?;
    }
    if config.compiler.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "compiler.program must not be empty".to_string(),
        ));
    }
    if let Some(root) = &config.project.root {
        if root.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "project.root must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_extension(field: &str, ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{field} must not contain empty extensions"
        )));
    }
    if ext.starts_with('.') {
        return Err(ConfigError::ValidationError(format!(
            "{field}: write '{}' without the leading dot",
            ext.trim_start_matches('.')
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AncestorOrder;

    #[test]
    fn empty_config_is_all_defaults() {
        let config = load_config_from_str("").unwrap();
        assert!(config.project.root.is_none());
        assert!(config.build.incremental);
        assert_eq!(config.build.change_threshold, 3);
        assert_eq!(config.scan.source_extension, "tex");
        assert_eq!(config.scan.bibliography_extension, "bib");
        assert!(config.scan.magic_comments);
        assert_eq!(config.root.ancestor_order, AncestorOrder::Nearest);
        assert_eq!(config.compiler.program, "latexmk");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[project]
root = "thesis/main.tex"

[build]
incremental = false
change_threshold = 4
skip_unchanged = false
cache_dir = "build/cache"

[scan]
source_extension = "ltx"
bibliography_extension = "bib"
image_extensions = ["png", "pdf"]
magic_comments = false

[root]
ancestor_order = "furthest"

[compiler]
program = "pdflatex"
args = ["-interaction=nonstopmode"]
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.project.root.as_deref(), Some("thesis/main.tex"));
        assert!(!config.build.incremental);
        assert_eq!(config.build.change_threshold, 4);
        assert!(!config.build.skip_unchanged);
        assert_eq!(config.build.cache_dir, "build/cache");
        assert_eq!(config.scan.source_extension, "ltx");
        assert_eq!(config.scan.image_extensions, vec!["png", "pdf"]);
        assert!(!config.scan.magic_comments);
        assert_eq!(config.root.ancestor_order, AncestorOrder::Furthest);
        assert_eq!(config.compiler.program, "pdflatex");
    }

    #[test]
    fn zero_threshold_rejected() {
        let err = load_config_from_str("[build]\nchange_threshold = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn dotted_extension_rejected() {
        let err = load_config_from_str("[scan]\nsource_extension = \".tex\"\n").unwrap_err();
        match err {
            ConfigError::ValidationError(msg) => assert!(msg.contains("'tex'")),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn empty_program_rejected() {
        let err = load_config_from_str("[compiler]\nprogram = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_root_rejected() {
        let err = load_config_from_str("[project]\nroot = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_key_rejected() {
        let err = load_config_from_str("[build]\nincremental_threshold = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_errors_with_strict_loader() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn missing_file_defaults_with_lenient_loader() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_or_default(dir.path()).unwrap();
        assert_eq!(config.build.change_threshold, 3);
    }

    #[test]
    fn lenient_loader_still_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[build\n").unwrap();
        let err = load_config_or_default(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[project]\nroot = \"main.tex\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.project.root.as_deref(), Some("main.tex"));
    }
}
