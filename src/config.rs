use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::executor::ExecSettings;

pub const CONFIG_ENV_VAR: &str = "FORKSH_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = ".forkshrc";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub prompt: String,
    pub log_level: String,
    /// Status a child reports when its program cannot be loaded.
    pub load_failure_status: i32,
    /// Let a failing first pipe branch decide the pipe's status.
    pub pipefail: bool,
    pub env_vars: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigLoader::default_config()
    }
}

impl Config {
    pub fn exec_settings(&self) -> ExecSettings {
        ExecSettings {
            load_failure_status: self.load_failure_status,
            pipefail: self.pipefail,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn default_config() -> Config {
        Config {
            prompt: "$ ".to_string(),
            log_level: "warn".to_string(),
            load_failure_status: 127,
            pipefail: false,
            env_vars: HashMap::new(),
        }
    }

    /// Explicit path, then `$FORKSH_CONFIG`, then `~/.forkshrc` when present.
    pub fn discover(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load_from_file(Path::new(&path));
        }
        if let Some(home) = std::env::var_os("HOME") {
            let path = Path::new(&home).join(DEFAULT_CONFIG_FILE);
            if path.is_file() {
                return Self::load_from_file(&path);
            }
        }
        Ok(Self::default_config())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        debug!("loading config from {}", path.display());
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load_from_str(&src)
    }

    pub fn load_from_str(src: &str) -> Result<Config, ConfigError> {
        let mut config = Self::default_config();

        for (idx, raw) in src.lines().enumerate() {
            let line = idx + 1;
            if raw.trim().is_empty() || raw.trim_start().starts_with('#') {
                continue;
            }
            let Some((key, value)) = raw.split_once('=') else {
                return Err(ConfigError::Parse { line, msg: format!("No '=' found: {}", raw) });
            };
            let key = key.trim();
            let value = unquote(value);

            match key {
                "prompt" => config.prompt = value.to_string(),
                "log_level" => config.log_level = value.to_string(),
                "load_failure_status" => {
                    config.load_failure_status = match value.parse::<u8>() {
                        Ok(n) => i32::from(n),
                        Err(_) => {
                            return Err(ConfigError::Parse {
                                line,
                                msg: format!("Invalid exit status (0-255): {}", value),
                            })
                        }
                    }
                }
                "pipefail" => {
                    config.pipefail = match value {
                        "true" | "on" | "1" => true,
                        "false" | "off" | "0" => false,
                        _ => {
                            return Err(ConfigError::Parse {
                                line,
                                msg: format!("Invalid boolean: {}", value),
                            })
                        }
                    }
                }
                k if k.starts_with("env.") => {
                    let var = k.trim_start_matches("env.").to_string();
                    config.env_vars.insert(var, value.to_string());
                }
                _ => return Err(ConfigError::Parse { line, msg: format!("Unknown key: {}", key) }),
            }
        }

        Ok(config)
    }
}

// `"..."` keeps surrounding spaces, anything else is trimmed.
fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_source_gives_defaults() {
        let config = ConfigLoader::load_from_str("").unwrap();
        assert_eq!(config, ConfigLoader::default_config());
        assert_eq!(config.load_failure_status, 127);
        assert!(!config.pipefail);
    }

    #[test]
    fn test_all_keys() {
        let src = "\
# comment
prompt = \"forksh> \"
log_level = debug
load_failure_status = 1
pipefail = on
env.GREETING = hello world
";
        let config = ConfigLoader::load_from_str(src).unwrap();
        assert_eq!(config.prompt, "forksh> ");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.load_failure_status, 1);
        assert!(config.pipefail);
        assert_eq!(config.env_vars.get("GREETING").map(String::as_str), Some("hello world"));
        assert_eq!(config.exec_settings().load_failure_status, 1);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        match ConfigLoader::load_from_str("prompt=x\nbogus") {
            Err(ConfigError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(ConfigLoader::load_from_str("colour = red").is_err());
        assert!(ConfigLoader::load_from_str("load_failure_status = 300").is_err());
        assert!(ConfigLoader::load_from_str("pipefail = maybe").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pipefail = true").unwrap();
        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert!(config.pipefail);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            ConfigLoader::discover(Some(&missing)),
            Err(ConfigError::Io { .. })
        ));
    }
}
