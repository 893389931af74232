//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::BuildConfig;
use std::path::Path;

/// Name of the configuration file within a project directory.
pub const CONFIG_FILE: &str = "anvil.toml";

/// Loads and validates an `anvil.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<BuildConfig, ConfigError> {
    let path = project_dir.join(CONFIG_FILE);
    let content =
        std::fs::read_to_string(&path).map_err(|source| ConfigError::Io { path, source })?;
    load_config_from_str(&content)
}

/// Parses and validates an `anvil.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<BuildConfig, ConfigError> {
    let config: BuildConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &BuildConfig) -> Result<(), ConfigError> {
    let compile = &config.compile;
    if compile.destination.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("compile.destination"));
    }
    if compile.artifact_extension.is_empty() || compile.artifact_extension.contains('.') {
        return Err(ConfigError::Invalid {
            field: "compile.artifact_extension",
            reason: format!("expected a bare extension, got '{}'", compile.artifact_extension),
        });
    }
    if compile.source_roots.is_empty() {
        return Err(ConfigError::Invalid {
            field: "compile.source_roots",
            reason: "must name at least one directory".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IsolationMode;
    use std::path::PathBuf;

    #[test]
    fn parse_minimal_config() {
        let config = load_config_from_str(
            r#"
[compile]
destination = "build/classes"
"#,
        )
        .unwrap();
        assert!(config.compile.incremental);
        assert_eq!(config.compile.destination, PathBuf::from("build/classes"));
        assert_eq!(config.compile.artifact_extension, "class");
        assert_eq!(config.compile.source_roots, vec![PathBuf::from("src")]);
        assert_eq!(config.compile.scratch_dir, PathBuf::from("build/tmp"));
        assert_eq!(config.workers.isolation, IsolationMode::None);
    }

    #[test]
    fn parse_full_config() {
        let config = load_config_from_str(
            r#"
[compile]
incremental = false
destination = "out"
artifact_extension = "o"
source_roots = ["src/main/java", "src/gen"]
scratch_dir = "tmp"

[workers]
isolation = "process"
"#,
        )
        .unwrap();
        assert!(!config.compile.incremental);
        assert_eq!(config.compile.artifact_extension, "o");
        assert_eq!(config.compile.source_roots.len(), 2);
        assert_eq!(config.workers.isolation, IsolationMode::Process);
    }

    #[test]
    fn empty_destination_errors() {
        let err = load_config_from_str("[compile]\ndestination = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(_)));
    }

    #[test]
    fn dotted_extension_errors() {
        let err = load_config_from_str(
            "[compile]\ndestination = \"out\"\nartifact_extension = \".class\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn empty_source_roots_errors() {
        let err =
            load_config_from_str("[compile]\ndestination = \"out\"\nsource_roots = []\n")
                .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn unknown_isolation_errors() {
        let err = load_config_from_str(
            "[compile]\ndestination = \"out\"\n[workers]\nisolation = \"vm\"\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("not valid toml {{{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[compile]\ndestination = \"classes\"\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.compile.destination, PathBuf::from("classes"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
