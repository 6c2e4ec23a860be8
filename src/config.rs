use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::AggFunc;
use crate::error::{ReportError, Result};
use crate::pipeline::DEFAULT_TOP_N;

pub const DEFAULT_CONFIG_FILE: &str = "occupancy-report.yaml";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub aggregation: AggFunc,
    #[serde(default = "default_true")]
    pub exclude_canceled: bool,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            aggregation: AggFunc::default(),
            exclude_canceled: true,
            top_n: default_top_n(),
            preview_rows: default_preview_rows(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/HOTEL_OKUPANSI_FIX.csv")
}

fn default_true() -> bool {
    true
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_preview_rows() -> usize {
    5
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(".")
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ReportError::Config(format!(
            "failed to read config file {}: {e}",
            path.display()
        ))
    })?;
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    let config: Config = serde_yml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn load_config_missing_file_returns_defaults() {
        let config =
            load_config(Path::new("/tmp/nonexistent_occupancy_config_12345.yaml")).unwrap();
        assert_eq!(config.data.path, PathBuf::from("data/HOTEL_OKUPANSI_FIX.csv"));
        assert_eq!(config.report.aggregation, AggFunc::Mean);
        assert!(config.report.exclude_canceled);
        assert_eq!(config.report.top_n, 10);
    }

    #[test]
    fn load_config_valid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            "data:\n  path: bookings.csv\nreport:\n  aggregation: median\n  exclude_canceled: false\n  top_n: 5\nexport:\n  dir: out"
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.data.path, PathBuf::from("bookings.csv"));
        assert_eq!(config.report.aggregation, AggFunc::Median);
        assert!(!config.report.exclude_canceled);
        assert_eq!(config.report.top_n, 5);
        assert_eq!(config.export.dir, PathBuf::from("out"));
    }

    #[test]
    fn load_config_partial_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "report:\n  aggregation: sum").unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.report.aggregation, AggFunc::Sum);
        assert!(config.report.exclude_canceled);
        assert_eq!(config.report.preview_rows, 5);
        assert_eq!(config.export.dir, PathBuf::from("."));
    }

    #[test]
    fn load_config_empty_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp).unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.report.top_n, 10);
    }

    #[test]
    fn load_config_invalid_yaml() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "{{{{invalid yaml: [[[").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn load_config_unknown_aggregation() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "report:\n  aggregation: mode").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }
}
