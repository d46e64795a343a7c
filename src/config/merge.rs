//! CLI overrides on top of file config

use crate::domain::{Config, UploadMode};

/// Values given on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub mode: Option<UploadMode>,
    pub page_size: Option<usize>,
    pub max_in_flight: Option<usize>,
    pub artifact_names: Option<Vec<String>>,
    pub artifact_globs: Option<Vec<String>>,
    pub follow_symlinks: bool,
}

/// CLI > config file > defaults. Extra artifact names and globs are appended,
/// not substituted, so a config's additions survive a one-off CLI addition.
pub fn merge_cli_with_config(mut config: Config, cli: &CliOverrides) -> Config {
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size.max(1);
    }
    if let Some(limit) = cli.max_in_flight {
        config.max_in_flight = Some(limit.max(1));
    }
    if let Some(names) = &cli.artifact_names {
        config.artifact_names.extend(names.iter().cloned());
    }
    if let Some(globs) = &cli.artifact_globs {
        config.artifact_globs.extend(globs.iter().cloned());
    }
    if cli.follow_symlinks {
        config.follow_symlinks = true;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_values_take_precedence() {
        let config = Config { mode: UploadMode::Folder, page_size: 64, ..Config::default() };
        let cli = CliOverrides {
            mode: Some(UploadMode::File),
            page_size: Some(0),
            ..CliOverrides::default()
        };
        let merged = merge_cli_with_config(config, &cli);
        assert_eq!(merged.mode, UploadMode::File);
        assert_eq!(merged.page_size, 1);
    }

    #[test]
    fn artifact_lists_are_appended() {
        let config = Config { artifact_names: vec!["a".into()], ..Config::default() };
        let cli = CliOverrides { artifact_names: Some(vec!["b".into()]), ..CliOverrides::default() };
        let merged = merge_cli_with_config(config, &cli);
        assert_eq!(merged.artifact_names, vec!["a", "b"]);
    }

    #[test]
    fn absent_overrides_leave_config_alone() {
        let config = Config { follow_symlinks: false, max_in_flight: Some(3), ..Config::default() };
        let merged = merge_cli_with_config(config, &CliOverrides::default());
        assert!(!merged.follow_symlinks);
        assert_eq!(merged.max_in_flight, Some(3));
    }
}
