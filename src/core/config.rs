//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::plan::SurgicalApproach;

/// Catalog file name used when nothing else is configured
pub const DEFAULT_CATALOG_FILE: &str = "Primus Implant List - Primus Implant List.csv";

/// Implant line offered when the catalog does not say otherwise
pub const DEFAULT_IMPLANT_LINE: &str = "Primus";

/// Project-local config file, looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "implant-plan.yaml";

/// Tool configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Path to the implant catalog CSV
    pub catalog: Option<PathBuf>,

    /// Implant line recorded on entries when none is chosen
    pub implant_line: Option<String>,

    /// Surgical approach recorded on entries when none is chosen
    pub default_approach: Option<SurgicalApproach>,

    /// Doctor name pre-filled on reports
    pub doctor: Option<String>,

    /// Directory reports are written to when no output path is given
    pub report_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (resolved lazily by the accessors)

        // 2. Global user config (~/.config/implant-plan/config.yaml)
        if let Some(global) = Self::global_config_path().and_then(|p| Self::read_file(&p)) {
            config.merge(global);
        }

        // 3. Working-directory config (./implant-plan.yaml)
        if let Some(local) = Self::read_file(Path::new(LOCAL_CONFIG_FILE)) {
            config.merge(local);
        }

        // 4. Environment variables
        config.merge(Self::from_env(|key| std::env::var(key).ok()));

        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "implant-plan")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Read one config file; unreadable or malformed files are skipped
    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config file");
                None
            }
        }
    }

    /// Build the environment layer using `lookup` to read variables
    fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Config {
        Config {
            catalog: lookup("IMPLANT_PLAN_CATALOG").map(PathBuf::from),
            implant_line: None,
            default_approach: lookup("IMPLANT_PLAN_APPROACH").and_then(|a| a.parse().ok()),
            doctor: lookup("IMPLANT_PLAN_DOCTOR"),
            report_dir: None,
        }
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.catalog.is_some() {
            self.catalog = other.catalog;
        }
        if other.implant_line.is_some() {
            self.implant_line = other.implant_line;
        }
        if other.default_approach.is_some() {
            self.default_approach = other.default_approach;
        }
        if other.doctor.is_some() {
            self.doctor = other.doctor;
        }
        if other.report_dir.is_some() {
            self.report_dir = other.report_dir;
        }
    }

    /// Apply a `--catalog` flag, the highest priority layer
    pub fn with_catalog_override(mut self, catalog: Option<PathBuf>) -> Self {
        if catalog.is_some() {
            self.catalog = catalog;
        }
        self
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_FILE))
    }

    pub fn implant_line(&self) -> String {
        self.implant_line
            .clone()
            .unwrap_or_else(|| DEFAULT_IMPLANT_LINE.to_string())
    }

    pub fn default_approach(&self) -> SurgicalApproach {
        self.default_approach.unwrap_or_default()
    }

    pub fn report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
