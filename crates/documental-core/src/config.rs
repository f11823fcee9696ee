//! Configuration for storage, import, export and search.
//!
//! Load order: `.documental/config.toml` → environment variables → defaults.

use crate::kind::EntityKind;
use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentalConfig {
    pub storage: StorageConfig,
    pub import: ImportConfig,
    pub export: ExportConfig,
    pub search: SearchConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file name inside `.documental/`.
    pub database_file: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Sheet read by single-table imports. First sheet when unset.
    pub default_sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Sheet name for single-table exports.
    pub sheet_name: String,
    pub autofit: bool,
    /// chrono format for the timestamp in generated file names.
    pub timestamp_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of search results, 0 for no limit.
    pub result_limit: usize,
    /// Highest level searched, by kind name.
    pub top_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Choices offered for the FormatoDigital field.
    pub formatos_digitales: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: "documental.db3".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Datos".to_string(),
            autofit: true,
            timestamp_format: "%Y%m%d%H%M%S".to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: 0,
            top_level: EntityKind::Serie.name().to_string(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            formatos_digitales: ["PDF", "XLS", "JPG", "PNG", "DOC", "MP4", "MP3", "TXT"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl SearchConfig {
    /// The configured top level as a kind.
    pub fn top_level_kind(&self) -> Result<EntityKind> {
        self.top_level
            .parse()
            .with_context(|| format!("invalid search.top_level '{}'", self.top_level))
    }
}

impl DocumentalConfig {
    /// Load config from `.documental/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".documental").join("config.toml");

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", config_path.display()))?
        } else {
            Self::default()
        };

        config.with_env_overrides().validated()
    }

    fn with_env_overrides(mut self) -> Self {
        env_override(
            "DOCUMENTAL_DATABASE_FILE",
            &mut self.storage.database_file,
        );
        if let Ok(sheet) = std::env::var("DOCUMENTAL_IMPORT_SHEET")
            && !sheet.trim().is_empty()
        {
            self.import.default_sheet = Some(sheet);
        }
        env_override("DOCUMENTAL_EXPORT_SHEET", &mut self.export.sheet_name);
        env_override("DOCUMENTAL_SEARCH_LIMIT", &mut self.search.result_limit);
        self
    }

    fn validated(self) -> Result<Self> {
        if self.export.sheet_name.trim().is_empty() {
            anyhow::bail!("export.sheet_name must not be empty");
        }
        if self.storage.database_file.trim().is_empty() {
            anyhow::bail!("storage.database_file must not be empty");
        }
        if !is_valid_timestamp_format(&self.export.timestamp_format) {
            anyhow::bail!(
                "invalid export.timestamp_format '{}'",
                self.export.timestamp_format
            );
        }
        self.search.top_level_kind()?;
        Ok(self)
    }
}

/// True when chrono can render `format` (no unknown or dangling specifiers).
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !format.trim().is_empty()
        && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
