//! Run configuration
//!
//! Read from the environment (a `.env` file is honoured), with command-line
//! values taking precedence, then validated before anything is opened.

use crate::db::DbConfig;
use crate::resolver::normalize_jnumber;
use crate::sink::OutputPaths;
use alleleload_common::{LoadError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Whether the run touches the database after writing its files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Bulk load the files and advance the accession maximum
    #[default]
    Load,
    /// Write the files only
    Preview,
}

impl LoadMode {
    pub fn is_preview(self) -> bool {
        self == LoadMode::Preview
    }
}

impl FromStr for LoadMode {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "load" => Ok(LoadMode::Load),
            "preview" => Ok(LoadMode::Preview),
            _ => Err(LoadError::config(format!(
                "Invalid ALLELELOADMODE: {} (expected load or preview)",
                s
            ))),
        }
    }
}

impl std::fmt::Display for LoadMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadMode::Load => write!(f, "load"),
            LoadMode::Preview => write!(f, "preview"),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub jnumber: Option<String>,
    pub mode: Option<LoadMode>,
}

/// Everything a run needs to know
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub input_file: PathBuf,
    pub output_dir: PathBuf,
    /// Reference cited by every marker association, as `J:nnnn`
    pub jnumber: String,
    pub mode: LoadMode,
    pub database: DbConfig,
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .or_else(|| std::env::var(name).ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| LoadError::missing_var(name))
}

impl LoadConfig {
    /// Load `.env`, then the environment, then apply `overrides`
    pub fn load(overrides: ConfigOverrides) -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env(overrides)
    }

    /// Build from the process environment and `overrides`
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self> {
        let input_file = required(
            overrides.input_file.map(|p| p.to_string_lossy().into_owned()),
            "INPUTFILE",
        )?;
        let output_dir = required(
            overrides.output_dir.map(|p| p.to_string_lossy().into_owned()),
            "OUTPUTDIR",
        )?;
        let jnumber = required(overrides.jnumber, "JNUMBER")?;

        let mode = match overrides.mode {
            Some(mode) => mode,
            None => match std::env::var("ALLELELOADMODE") {
                Ok(value) => value.parse()?,
                Err(_) => LoadMode::default(),
            },
        };

        let config = Self {
            input_file: PathBuf::from(input_file),
            output_dir: PathBuf::from(output_dir),
            jnumber: normalize_jnumber(&jnumber)
                .ok_or_else(|| LoadError::config(format!("Invalid JNUMBER: {}", jnumber)))?,
            mode,
            database: DbConfig::from_env()?,
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input_file.is_file() {
            return Err(LoadError::config(format!(
                "Input file {} does not exist",
                self.input_file.display()
            )));
        }

        if self.output_dir.exists() && !self.output_dir.is_dir() {
            return Err(LoadError::config(format!(
                "Output directory {} is not a directory",
                self.output_dir.display()
            )));
        }

        self.database.validate()
    }

    pub fn paths(&self) -> OutputPaths {
        OutputPaths::for_input(&self.output_dir, &self.input_file)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const VARS: [&str; 5] = ["INPUTFILE", "OUTPUTDIR", "JNUMBER", "ALLELELOADMODE", "DATABASE_URL"];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn set_env(dir: &TempDir) -> PathBuf {
        let input = dir.path().join("alleles.txt");
        std::fs::write(&input, "").unwrap();
        std::env::set_var("INPUTFILE", &input);
        std::env::set_var("OUTPUTDIR", dir.path().join("out"));
        std::env::set_var("JNUMBER", "J:136110");
        std::env::set_var("DATABASE_URL", "postgresql://localhost/mgd");
        input
    }

    #[test]
    fn test_load_mode_parse() {
        assert_eq!("load".parse::<LoadMode>().unwrap(), LoadMode::Load);
        assert_eq!("Preview".parse::<LoadMode>().unwrap(), LoadMode::Preview);
        assert!("debug".parse::<LoadMode>().is_err());
        assert!(LoadMode::Preview.is_preview());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let input = set_env(&dir);

        let config = LoadConfig::from_env(ConfigOverrides::default()).unwrap();
        assert_eq!(config.input_file, input);
        assert_eq!(config.jnumber, "J:136110");
        assert_eq!(config.mode, LoadMode::Load);
        assert_eq!(config.paths().error(), dir.path().join("out/alleles.txt.error"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides_take_precedence() {
        clear_env();
        let dir = TempDir::new().unwrap();
        set_env(&dir);
        std::env::set_var("ALLELELOADMODE", "load");

        let config = LoadConfig::from_env(ConfigOverrides {
            jnumber: Some("4000".to_string()),
            mode: Some(LoadMode::Preview),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(config.jnumber, "J:4000");
        assert_eq!(config.mode, LoadMode::Preview);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_required_var() {
        clear_env();
        let dir = TempDir::new().unwrap();
        set_env(&dir);
        std::env::remove_var("JNUMBER");

        let err = LoadConfig::from_env(ConfigOverrides::default()).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: JNUMBER is not set");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_mode_rejected() {
        clear_env();
        let dir = TempDir::new().unwrap();
        set_env(&dir);
        std::env::set_var("ALLELELOADMODE", "dryrun");

        assert!(LoadConfig::from_env(ConfigOverrides::default()).is_err());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_input_file_rejected() {
        clear_env();
        let dir = TempDir::new().unwrap();
        set_env(&dir);
        std::env::set_var("INPUTFILE", dir.path().join("absent.txt"));

        let err = LoadConfig::from_env(ConfigOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        clear_env();
    }
}
