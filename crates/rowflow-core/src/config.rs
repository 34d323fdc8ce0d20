//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Records an external sort buffers before it spills a sorted run.
    /// This is the per-sort memory bound `C`.
    pub sort_chunk_rows: usize,

    /// Directory for spill files (local-path configuration).
    pub spill_dir: String,

    /// Optional spill URI (`file:///path` or `memory://`). Overrides `spill_dir`.
    pub spill_uri: Option<String>,

    /// Spill frame compression: "none", "zstd", or "lz4".
    pub spill_codec: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sort_chunk_rows: 100_000,
            spill_dir: std::env::temp_dir()
                .join("rowflow-spill")
                .to_string_lossy()
                .into_owned(),
            spill_uri: None,
            spill_codec: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub uri: Option<String>,
    pub root: String,
}

impl StorageConfig {
    pub fn scheme(&self) -> Option<&str> {
        self.uri
            .as_deref()
            .and_then(|uri| uri.split_once("://"))
            .map(|(scheme, _)| scheme.trim())
            .filter(|s| !s.is_empty())
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `ROWFLOW_SORT_CHUNK_ROWS`: records per sort run
    /// - `ROWFLOW_SPILL_DIR`: spill directory
    /// - `ROWFLOW_SPILL_URI`: spill URI (`file://...` or `memory://`)
    /// - `ROWFLOW_SPILL_CODEC`: spill codec name
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("ROWFLOW_SORT_CHUNK_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.sort_chunk_rows = v;
            }
        }

        if let Ok(s) = std::env::var("ROWFLOW_SPILL_DIR") {
            cfg.spill_dir = s;
        }

        if let Ok(s) = std::env::var("ROWFLOW_SPILL_URI") {
            cfg.spill_uri = Some(s);
        }

        if let Ok(s) = std::env::var("ROWFLOW_SPILL_CODEC") {
            cfg.spill_codec = s;
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.sort_chunk_rows == 0 {
            return Err(Error::Config("sort_chunk_rows must be at least 1".into()));
        }
        if self.spill_uri.is_none() && self.spill_dir.is_empty() {
            return Err(Error::Config("either spill_dir or spill_uri must be set".into()));
        }
        Ok(())
    }

    /// Produce a storage configuration snapshot used by the IO layer.
    pub fn storage_config(&self) -> StorageConfig {
        let scheme = self
            .spill_uri
            .as_deref()
            .and_then(|uri| uri.split_once("://"))
            .map(|(scheme, _)| scheme.trim().to_string());

        let root = match (scheme.as_deref(), self.spill_uri.as_ref()) {
            (Some("file"), Some(uri)) => {
                file_uri_to_path(uri).unwrap_or_else(|| self.spill_dir.clone())
            }
            (Some(_), Some(uri)) => uri.trim_end_matches('/').to_string(),
            _ => self.spill_dir.clone(),
        };

        StorageConfig {
            uri: self.spill_uri.clone(),
            root,
        }
    }
}

fn file_uri_to_path(uri: &str) -> Option<String> {
    let stripped = uri.strip_prefix("file://")?;
    if stripped.starts_with('/') {
        Some(stripped.to_string())
    } else {
        Some(format!("/{}", stripped))
    }
}
