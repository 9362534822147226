// src/config.rs
//! Settings from `a11ytrend.toml`.

use crate::aggregate::DEFAULT_SUMMARY_TOP;
use crate::engine::RunOptions;
use crate::error::{A11yError, Result};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::priority::DEFAULT_PRIORITY_TOP;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "a11ytrend.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding persisted snapshots.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_summary_top")]
    pub summary_top: usize,
    #[serde(default = "default_priority_top")]
    pub priority_top: usize,
    /// The terminal report lists fix-first rules only from this many active rules.
    #[serde(default = "default_priority_min_rules")]
    pub priority_min_rules: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            history_limit: default_history_limit(),
            summary_top: default_summary_top(),
            priority_top: default_priority_top(),
            priority_min_rules: default_priority_min_rules(),
        }
    }
}

fn default_results_dir() -> PathBuf { PathBuf::from("results") }
fn default_history_limit() -> usize { DEFAULT_HISTORY_LIMIT }
fn default_summary_top() -> usize { DEFAULT_SUMMARY_TOP }
fn default_priority_top() -> usize { DEFAULT_PRIORITY_TOP }
fn default_priority_min_rules() -> usize { 5 }

impl Config {
    /// Loads `path`, or `a11ytrend.toml` in the working directory.
    ///
    /// The default file may be absent; an explicitly named one may not.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is not valid TOML.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p, true),
            None => (Path::new(CONFIG_FILE), false),
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| A11yError::io(e, path))?;
        Self::parse(&content).map_err(|message| A11yError::Config {
            path: path.to_path_buf(),
            message,
        })
    }

    /// # Errors
    /// Returns the TOML error message if `content` does not parse.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    #[must_use]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            summary_top: self.summary_top,
            priority_top: self.priority_top,
        }
    }
}
