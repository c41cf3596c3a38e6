//! User configuration: icon overrides and file type labels.
//!
//! The file is TOML with four string tables. Keys in `[extensions]`,
//! `[filetypes]` and `[shebangs]` may list several comma-separated names:
//!
//! ```toml
//! [icons]
//! dir = "D"
//!
//! [extensions]
//! "jpg,jpeg" = "I"
//!
//! [filetypes]
//! "h,hpp" = "C++"
//!
//! [shebangs]
//! "python,python3" = "Python"
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::filetype::FileTypes;
use crate::icons::Icons;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "L_CONFIG";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    icons: HashMap<String, String>,
    extensions: HashMap<String, String>,
    filetypes: HashMap<String, String>,
    shebangs: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub icons: Icons,
    pub filetypes: FileTypes,
}

impl Config {
    /// Load the first config file found, or defaults.
    ///
    /// A malformed file is logged and ignored rather than aborting the run.
    pub fn load() -> Self {
        for path in search_paths() {
            match Self::load_from(&path) {
                Ok(Some(config)) => {
                    log::debug!("loaded config from {}", path.display());
                    return config;
                }
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("{}", e);
                    return Self::default();
                }
            }
        }
        Self::default()
    }

    /// Parse the file at `path`; `Ok(None)` if it does not exist.
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Config {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };
        Self::parse(&text)
            .map(Some)
            .map_err(|message| Error::Config {
                path: path.to_path_buf(),
                message,
            })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| e.message().to_string())?;
        Ok(Self::from(raw))
    }
}

impl From<RawConfig> for Config {
    fn from(raw: RawConfig) -> Self {
        let mut config = Config::default();
        for (key, glyph) in &raw.icons {
            if !config.icons.set(key.trim(), glyph) {
                log::debug!("unknown icon slot '{}'", key);
            }
        }
        for (keys, glyph) in &raw.extensions {
            for ext in split_keys(keys) {
                config.icons.set_extension(ext, glyph);
            }
        }
        for (keys, label) in &raw.filetypes {
            for ext in split_keys(keys) {
                config.filetypes.set_extension(ext, label);
            }
        }
        for (keys, label) in &raw.shebangs {
            for interpreter in split_keys(keys) {
                config.filetypes.set_interpreter(interpreter, label);
            }
        }
        config
    }
}

fn split_keys(keys: &str) -> impl Iterator<Item = &str> {
    keys.split(',')
        .map(|k| k.trim().trim_start_matches('.'))
        .filter(|k| !k.is_empty())
}

/// `$L_CONFIG`, then `<config_dir>/l/config.toml`, then `l.toml` beside the binary.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        paths.push(PathBuf::from(explicit));
    }
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("l").join("config.toml"));
    }
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        paths.push(dir.join("l.toml"));
    }
    paths
}
