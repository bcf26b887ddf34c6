//! Rules file path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG config → defaults.

use std::path::{Path, PathBuf};

/// Where the rules came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--rules` on the command line.
    CliArgument,

    /// `ES_SCRUB_RULES` names the file.
    Environment,

    /// Found in `ES_SCRUB_CONFIG_DIR`.
    ConfigDir,

    /// Found in the XDG config directory.
    XdgConfig,

    /// Using the built-in rules.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => f.write_str("CLI argument"),
            ConfigSource::Environment => f.write_str("environment variable"),
            ConfigSource::ConfigDir => f.write_str("config directory"),
            ConfigSource::XdgConfig => f.write_str("XDG config"),
            ConfigSource::BuiltinDefault => f.write_str("builtin default"),
        }
    }
}

/// Environment variable naming a rules file.
pub const ENV_RULES_PATH: &str = "ES_SCRUB_RULES";

/// Environment variable naming a directory holding `rules.toml` or `rules.json`.
pub const ENV_CONFIG_DIR: &str = "ES_SCRUB_CONFIG_DIR";

/// File names looked up in config directories, in order.
pub const RULES_FILENAMES: [&str; 2] = ["rules.toml", "rules.json"];

const APP_NAME: &str = "event-scrub";

/// A resolved rules location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// `None` when the built-in rules apply.
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Resolve the rules file path.
///
/// Resolution order:
/// 1. Explicit CLI path
/// 2. `ES_SCRUB_RULES`
/// 3. `ES_SCRUB_CONFIG_DIR` + `rules.toml` / `rules.json`
/// 4. XDG config directory (`~/.config/event-scrub/`)
/// 5. Built-in defaults
///
/// Paths given explicitly (CLI or `ES_SCRUB_RULES`) are returned even when
/// missing so loading can report them; directories are only searched.
pub fn resolve_rules_path(cli_path: Option<&Path>) -> ResolvedPath {
    let found = cli_path
        .map(|path| (path.to_path_buf(), ConfigSource::CliArgument))
        .or_else(|| {
            non_empty_env(ENV_RULES_PATH).map(|path| (PathBuf::from(path), ConfigSource::Environment))
        })
        .or_else(|| {
            non_empty_env(ENV_CONFIG_DIR)
                .and_then(|dir| find_in_dir(Path::new(&dir)))
                .map(|path| (path, ConfigSource::ConfigDir))
        })
        .or_else(|| {
            xdg_config_dir()
                .and_then(|dir| find_in_dir(&dir))
                .map(|path| (path, ConfigSource::XdgConfig))
        });

    match found {
        Some((path, source)) => ResolvedPath {
            path: Some(path),
            source,
        },
        None => ResolvedPath {
            path: None,
            source: ConfigSource::BuiltinDefault,
        },
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// First rules file present in `dir`.
pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    RULES_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// `$XDG_CONFIG_HOME/event-scrub` or the platform equivalent.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        let cases = [
            (ConfigSource::CliArgument, "CLI argument"),
            (ConfigSource::Environment, "environment variable"),
            (ConfigSource::ConfigDir, "config directory"),
            (ConfigSource::XdgConfig, "XDG config"),
            (ConfigSource::BuiltinDefault, "builtin default"),
        ];
        for (source, text) in cases {
            assert_eq!(source.to_string(), text);
        }
    }

    #[test]
    fn test_cli_path_wins_even_if_missing() {
        let resolved = resolve_rules_path(Some(Path::new("/nonexistent/rules.json")));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(
            resolved.path.as_deref(),
            Some(Path::new("/nonexistent/rules.json"))
        );
    }

    #[test]
    fn test_find_in_dir_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_in_dir(dir.path()), None);

        std::fs::write(dir.path().join("rules.json"), "{}").unwrap();
        assert_eq!(find_in_dir(dir.path()), Some(dir.path().join("rules.json")));

        std::fs::write(dir.path().join("rules.toml"), "").unwrap();
        assert_eq!(find_in_dir(dir.path()), Some(dir.path().join("rules.toml")));
    }

    #[test]
    fn test_xdg_dir_name() {
        if let Some(dir) = xdg_config_dir() {
            assert!(dir.ends_with("event-scrub"));
        }
    }
}
