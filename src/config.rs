// RustPixel
// copyright zipxing@hotmail.com 2022～2025

//! Core configuration.
//!
//! Read once at `init` from `pixel_retro.toml` in the host's system directory:
//!
//! ```toml
//! stack_bytes = 1048576
//! log_level = "debug"
//! log_file = "/tmp/pixel_retro.log"
//! ```
//!
//! Every key is optional. Frame rate, sample rate and audio block size are
//! constants of the integration and can't be configured.

use crate::error::{CoreError, Result};
use log::{warn, LevelFilter};
use serde::Deserialize;
use std::{fs, io::ErrorKind, path::Path, str::FromStr};

pub const CONFIG_FILE: &str = "pixel_retro.toml";

/// Default script stack, 512KiB.
pub const DEFAULT_STACK_BYTES: usize = 65536 * 8;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// size of the script context's stack
    pub stack_bytes: usize,
    pub log_level: String,
    /// extra log file next to the host log
    pub log_file: Option<String>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            stack_bytes: DEFAULT_STACK_BYTES,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl CoreConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Read `CONFIG_FILE` from `dir`. A missing file gives the defaults.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(CoreError::Config(format!("{}: {}", path.display(), e))),
        }
    }

    /// Like `from_dir`, but never fails: problems are logged and defaults used.
    pub fn load(dir: Option<&Path>) -> Self {
        let Some(dir) = dir else {
            return Self::default();
        };
        Self::from_dir(dir).unwrap_or_else(|e| {
            warn!("{}, using defaults", e);
            Self::default()
        })
    }

    pub fn level(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
    }
}
