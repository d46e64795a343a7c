//! Config file loading

use crate::domain::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const SECTION: &str = "drop-ingest";

pub fn load_config(search_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(search_root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    match parse_config(&content, &config_file) {
        Ok(cfg) => Ok(cfg),
        Err(e) if config_path_provided => Err(e),
        Err(e) => {
            tracing::warn!("Ignoring auto-discovered config {}: {:#}", config_file.display(), e);
            Ok(Config::default())
        }
    }
}

fn parse_config(content: &str, config_file: &Path) -> Result<Config> {
    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "toml" => parse_toml_config(content, config_file),
        "yaml" | "yml" => parse_yaml_config(content, config_file),
        other => anyhow::bail!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        ),
    }
}

/// Parse TOML config, supporting a nested [drop-ingest] section.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = if let Some(nested) = raw.get(SECTION) { nested.clone() } else { raw };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, supporting a nested drop-ingest section.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = if let Some(nested) = raw.get(SECTION) { nested.clone() } else { raw };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(search_root: &Path) -> Option<std::path::PathBuf> {
    let candidates = [
        "drop-ingest.toml",
        ".drop-ingest.toml",
        "drop-ingest.yml",
        ".drop-ingest.yml",
        "drop-ingest.yaml",
        ".drop-ingest.yaml",
    ];

    for candidate in candidates {
        let path = search_root.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UploadMode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_defaults_when_missing() {
        let tmp = TempDir::new().expect("tmp");
        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.mode, UploadMode::Folder);
        assert_eq!(cfg.page_size, 64);
        assert!(cfg.artifact_names.is_empty());
    }

    #[test]
    fn test_load_toml_config() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("drop-ingest.toml");
        fs::write(&path, "mode = 'file'\npage_size = 8\ncompletion_linger_ms = 10\n").expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.mode, UploadMode::File);
        assert_eq!(cfg.page_size, 8);
        assert_eq!(cfg.completion_linger_ms, 10);
    }

    #[test]
    fn test_nested_toml_section() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join(".drop-ingest.toml");
        fs::write(&path, "[drop-ingest]\nmax_in_flight = 4\n").expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.max_in_flight, Some(4));
    }

    #[test]
    fn test_yaml_config_with_list_normalization() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("drop-ingest.yml");
        fs::write(&path, "artifact_names:\n  - ' lock.tmp '\n  - ''\nartifact_globs: '~$*, *.part'\n")
            .expect("write");

        let cfg = load_config(tmp.path(), None).expect("config");
        assert_eq!(cfg.artifact_names, vec!["lock.tmp"]);
        assert_eq!(cfg.artifact_globs, vec!["~$*", "*.part"]);

        let policy = cfg.artifact_policy();
        assert!(policy.is_artifact_name("lock.tmp"));
        assert!(policy.is_artifact_name("movie.part"));
        assert!(policy.is_artifact_name(".DS_Store"));
    }

    #[test]
    fn test_replace_default_artifacts() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("drop-ingest.toml");
        fs::write(&path, "replace_default_artifacts = true\nartifact_names = 'only.me'\n")
            .expect("write");

        let policy = load_config(tmp.path(), Some(&path)).expect("config").artifact_policy();
        assert!(policy.is_artifact_name("only.me"));
        assert!(!policy.is_artifact_name(".DS_Store"));
    }

    #[test]
    fn test_explicit_config_invalid_mode_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "mode = 'sideways'\n").expect("write");

        let result = load_config(tmp.path(), Some(&path));
        assert!(result.is_err(), "explicit config with invalid mode should return Err");
    }

    #[test]
    fn test_explicit_config_invalid_list_type_returns_err() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "artifact_names = 123\n").expect("write");

        assert!(load_config(tmp.path(), Some(&path)).is_err());
    }

    #[test]
    fn test_auto_discovered_invalid_config_returns_default() {
        let tmp = TempDir::new().expect("tmp");
        fs::write(tmp.path().join("drop-ingest.toml"), "page_size = 'lots'\n").expect("write");

        let cfg = load_config(tmp.path(), None).expect("should not error on auto-discovery");
        assert_eq!(cfg.page_size, crate::domain::Config::default().page_size);
    }

    #[test]
    fn test_unsupported_extension_explicit_errors() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.ini");
        fs::write(&path, "mode=file\n").expect("write");
        assert!(load_config(tmp.path(), Some(&path)).is_err());
    }
}
