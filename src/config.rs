use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::layout::Spacing;

pub const CONFIG_ENV: &str = "TINY_CONFIG";
pub const X_SPACING_ENV: &str = "TINY_X_SPACING";
pub const Y_SPACING_ENV: &str = "TINY_Y_SPACING";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spacing: Spacing,
    /// Where `scan` writes the token dump when no output path is given.
    #[serde(default = "default_token_output")]
    pub token_output: PathBuf,
}

fn default_token_output() -> PathBuf {
    PathBuf::from("output.txt")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            spacing: Spacing::default(),
            token_output: default_token_output(),
        }
    }
}

impl Config {
    /// Loads the config file, then applies `TINY_X_SPACING` / `TINY_Y_SPACING`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::get_config_path())?;
        config.apply_overrides(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let config: Config =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Malformed {
                path: path.display().to_string(),
                source,
            })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn save(&self) -> io::Result<()> {
        self.save_to(&Self::get_config_path())
    }

    pub fn save_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(X_SPACING_ENV) {
            self.spacing.x = parse_number(X_SPACING_ENV, &value)?;
        }
        if let Some(value) = lookup(Y_SPACING_ENV) {
            self.spacing.y = parse_number(Y_SPACING_ENV, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_spacing("x_spacing", self.spacing.x)?;
        check_spacing("y_spacing", self.spacing.y)
    }

    pub fn get_config_path() -> PathBuf {
        if let Ok(custom) = env::var(CONFIG_ENV) {
            return PathBuf::from(custom);
        }

        let home = if cfg!(windows) {
            env::var("USERPROFILE")
        } else {
            env::var("HOME")
        };
        PathBuf::from(home.unwrap_or_else(|_| String::from(".")))
            .join(".tiny")
            .join("config.json")
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

pub fn check_spacing(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidSpacing { name, value })
    }
}
