use crate::error::{DashboardError, Result};
use crate::reports::TableOptions;
use crate::types::CategoryScheme;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DATA_PATH_VAR: &str = "ACV_MIX_DATA_PATH";
pub const OUTPUT_DIR_VAR: &str = "ACV_MIX_OUTPUT_DIR";
pub const CATEGORIES_VAR: &str = "ACV_MIX_CATEGORIES";
pub const PREVIEW_ROWS_VAR: &str = "ACV_MIX_PREVIEW_ROWS";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub output_dir: PathBuf,
    pub categories: CategoryScheme,
    pub table: TableOptions,
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_path: PathBuf::from("data/customer-type.json"),
            output_dir: PathBuf::from("."),
            categories: CategoryScheme::default(),
            table: TableOptions::default(),
            preview_rows: 5,
        }
    }
}

impl Config {
    /// Settings from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Settings from an arbitrary variable lookup; unset variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(path) = var(DATA_PATH_VAR) {
            config.data_path = PathBuf::from(path);
        }
        if let Some(dir) = var(OUTPUT_DIR_VAR) {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(rows) = var(PREVIEW_ROWS_VAR) {
            config.preview_rows = rows.parse().map_err(|_| {
                DashboardError::Config(format!("{} must be a whole number, got {:?}", PREVIEW_ROWS_VAR, rows))
            })?;
        }
        if let Some(path) = var(CATEGORIES_VAR) {
            config.categories = load_category_scheme(&path)?;
            info!(path = %path, count = config.categories.categories.len(), "loaded category scheme");
        }
        Ok(config)
    }
}

/// Read a category scheme such as
/// `{"categories": [{"label": "New Customer", "color": "#FB8C00"}], "fallback": {"label": "Other", "color": "#ccc"}}`.
pub fn load_category_scheme(path: impl AsRef<Path>) -> Result<CategoryScheme> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        DashboardError::Config(format!("cannot read category scheme {}: {}", path.display(), e))
    })?;
    parse_category_scheme(&text)
}

pub fn parse_category_scheme(text: &str) -> Result<CategoryScheme> {
    let scheme: CategoryScheme = serde_json::from_str(text)
        .map_err(|e| DashboardError::Config(format!("invalid category scheme: {}", e)))?;

    let mut seen = std::collections::HashSet::new();
    for c in &scheme.categories {
        if c.label.trim().is_empty() {
            return Err(DashboardError::Config("category label must not be blank".to_string()));
        }
        if !seen.insert(c.label.as_str()) {
            return Err(DashboardError::Config(format!("duplicate category {:?}", c.label)));
        }
    }
    Ok(scheme)
}
