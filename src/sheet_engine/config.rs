//! Engine configuration loaded from TOML.
//!
//! ```toml
//! backing = "sqlite"
//! database_path = "pools.sqlite3"
//! shuffle = true
//! preset = "mental_calculation"
//! numbering = "alphabetic"
//! ```
//!
//! Every key is optional. The per-exercise defaults (`shuffle`, `preset`,
//! `numbering`) only apply to exercises built with [`EngineConfig::exercise`].

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::sheet_engine::{
    error::{Result, SheetError},
    models::{ExerciseSpec, NumberingPolicy, Preset},
};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "MATHSHEET_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackingKind {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub backing: BackingKind,
    /// SQLite file; without one a sqlite backing lives in memory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
    #[serde(default)]
    pub preset: Preset,
    #[serde(default)]
    pub numbering: NumberingPolicy,
}

fn default_shuffle() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backing: BackingKind::Memory,
            database_path: None,
            shuffle: true,
            preset: Preset::Default,
            numbering: NumberingPolicy::Numeric,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: EngineConfig = toml::from_str(text)?;
        if cfg.backing == BackingKind::Memory && cfg.database_path.is_some() {
            return Err(SheetError::Config(
                "`database_path` is only meaningful with `backing = \"sqlite\"`".into(),
            ));
        }
        Ok(cfg)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg = Self::from_toml_str(&text)?;
        info!(path = %path.display(), backing = ?cfg.backing, "loaded engine config");
        Ok(cfg)
    }

    /// Load from the file named by `MATHSHEET_CONFIG`, or defaults when the
    /// variable is unset. A set but unreadable file is an error.
    pub fn load_from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load_from_path(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    /// An exercise over `questions` carrying this config's defaults.
    pub fn exercise(&self, questions: impl Into<String>) -> ExerciseSpec {
        ExerciseSpec {
            questions: Some(questions.into()),
            mix: Vec::new(),
            shuffle: self.shuffle,
            preset: self.preset,
            numbering: self.numbering,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn full_document_parses() {
        let cfg = EngineConfig::from_toml_str(
            r#"
            backing = "sqlite"
            database_path = "/tmp/pools.sqlite3"
            shuffle = false
            preset = "mental_calculation"
            numbering = "alphabetic"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.backing, BackingKind::Sqlite);
        assert_eq!(cfg.database_path.as_deref(), Some(Path::new("/tmp/pools.sqlite3")));
        let ex = cfg.exercise("multi direct -> table_2");
        assert!(!ex.shuffle);
        assert_eq!(ex.preset, Preset::MentalCalculation);
        assert_eq!(ex.numbering, NumberingPolicy::Alphabetic);
    }

    #[test]
    fn invalid_documents_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("backing = \"redis\""),
            Err(SheetError::ConfigParse(_))
        ));
        assert!(EngineConfig::from_toml_str("colour = 3").is_err());
        assert!(matches!(
            EngineConfig::from_toml_str("database_path = \"x.db\""),
            Err(SheetError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EngineConfig::load_from_path(Path::new("/nonexistent/mathsheet.toml")).unwrap_err();
        assert!(matches!(err, SheetError::Io(_)));
    }
}
