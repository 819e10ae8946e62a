use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_REPORT_NAME: &str = "品种同环比分析";

/// Run settings. Every key is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub report_name: String,
    /// 1-based row holding the column labels in every period export.
    pub header_row: usize,
    pub output_dir: PathBuf,
    pub preview_rows: usize,
    pub parallel: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            report_name: DEFAULT_REPORT_NAME.to_string(),
            header_row: 1,
            output_dir: PathBuf::from("."),
            preview_rows: 5,
            parallel: false,
        }
    }
}

impl ReportConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let cfg = ReportConfig::from_json_str(r#"{ "header_row": 3 }"#).unwrap();
        assert_eq!(cfg.header_row, 3);
        assert_eq!(cfg.report_name, DEFAULT_REPORT_NAME);
        assert_eq!(cfg.preview_rows, 5);
        assert!(!cfg.parallel);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(ReportConfig::from_json_str("{ header_row: }").is_err());
    }
}
