// Configuration for ranked log reports
//
// Loaded from TOML; every field has a default so a config file only needs
// the settings it changes.

use crate::v8::IcState;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Ordering of function entries in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionOrder {
    /// Mixed state first, then optimized tiers, then deopt and update counts
    #[default]
    Severity,
    /// Update count, descending
    Updates,
    /// Function name, ascending
    Name,
}

/// Ordering of IC entries in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IcOrder {
    /// Worst state descending, then hit count descending
    #[default]
    Severity,
    /// Hit count descending
    Hits,
}

/// Report configuration
///
/// # Example
/// ```
/// use deoptscope::config::ReportConfig;
///
/// let config = ReportConfig::default();
/// assert_eq!(config.top, 50);
/// assert!(config.validate().is_ok());
/// ```
///
/// # Example TOML
/// ```toml
/// top = 20
/// min_ic_state = "polymorphic"
/// include_unknown_locations = false
/// function_order = "updates"
/// ic_order = "hits"
/// label_width = 60
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Maximum entries per section (0 = unlimited)
    pub top: usize,

    /// Hide IC entries whose worst state is healthier than this
    pub min_ic_state: IcState,

    /// Keep entries without a reference location
    pub include_unknown_locations: bool,

    pub function_order: FunctionOrder,

    pub ic_order: IcOrder,

    /// Width of the label column in text reports
    pub label_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top: 50,
            min_ic_state: IcState::NoFeedback,
            include_unknown_locations: true,
            function_order: FunctionOrder::Severity,
            ic_order: IcOrder::Severity,
            label_width: 48,
        }
    }
}

impl ReportConfig {
    /// Only degraded caches with known locations
    pub fn strict() -> Self {
        Self {
            top: 20,
            min_ic_state: IcState::Polymorphic,
            include_unknown_locations: false,
            ..Self::default()
        }
    }

    /// Every entry, no limit
    pub fn all() -> Self {
        Self {
            top: 0,
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file can't be read, has invalid TOML syntax, or
    /// fails [`ReportConfig::validate`].
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read report config: {}", path.as_ref().display())
        })?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid report config: {}", path.as_ref().display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML report config")?;
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.label_width < 8 {
            return Err(format!(
                "label_width must be >= 8, got {}",
                self.label_width
            ));
        }
        Ok(())
    }

    /// Apply the `top` limit to a ranked list
    pub(crate) fn limit<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.top > 0 {
            items.truncate(self.top);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ReportConfig::default();
        assert_eq!(config.top, 50);
        assert_eq!(config.min_ic_state, IcState::NoFeedback);
        assert!(config.include_unknown_locations);
        assert_eq!(config.function_order, FunctionOrder::Severity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_strict_config() {
        let config = ReportConfig::strict();
        assert_eq!(config.top, 20);
        assert_eq!(config.min_ic_state, IcState::Polymorphic);
        assert!(!config.include_unknown_locations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_limit() {
        let config = ReportConfig {
            top: 2,
            ..ReportConfig::default()
        };
        assert_eq!(config.limit(vec![1, 2, 3]), vec![1, 2]);
        assert_eq!(ReportConfig::all().limit(vec![1, 2, 3]), vec![1, 2, 3]);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ReportConfig::from_toml_str("min_ic_state = \"megamorphic\"\nic_order = \"hits\"").unwrap();
        assert_eq!(config.min_ic_state, IcState::Megamorphic);
        assert_eq!(config.ic_order, IcOrder::Hits);
        assert_eq!(config.top, 50);
    }

    #[test]
    fn test_invalid_label_width() {
        let err = ReportConfig::from_toml_str("label_width = 3").unwrap_err();
        assert!(err.to_string().contains("label_width"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(ReportConfig::from_toml_str("top = \"many\"").is_err());
        assert!(ReportConfig::from_toml_str("function_order = \"random\"").is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "top = 5\nfunction_order = \"name\"").unwrap();
        let config = ReportConfig::from_toml(file.path()).unwrap();
        assert_eq!(config.top, 5);
        assert_eq!(config.function_order, FunctionOrder::Name);
    }

    #[test]
    fn test_missing_file() {
        let err = ReportConfig::from_toml("/no/such/report.toml").unwrap_err();
        assert!(err.to_string().contains("/no/such/report.toml"));
    }
}
