//! Slice engine configuration

use crate::error::{Result, SliceError};
use serde::{Deserialize, Serialize};

/// How the fetches of one call are issued against its session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// One fetch at a time, in request order
    #[default]
    Sequential,
    /// All fetches in flight at once; results keep request order
    Concurrent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fetch_mode: FetchMode,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fetch_mode(mut self, fetch_mode: FetchMode) -> Self {
        self.fetch_mode = fetch_mode;
        self
    }

    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SliceError::Configuration(e.to_string()))
    }
}
