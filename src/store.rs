//! Backing-store contract consumed by the index and the slice engine
//!
//! A store hands out the static index facts of a volume and opens read
//! sessions. Sessions are owned values; dropping one releases whatever the
//! store acquired for it.

use crate::error::Result;
use async_trait::async_trait;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Static facts a store reports about its volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHeader {
    pub ilines: Vec<i32>,
    pub xlines: Vec<i32>,
    pub samples_per_trace: usize,
}

/// A volume container that can be opened for reading
#[async_trait]
pub trait VolumeStore: Send + Sync {
    /// Stable identifier of the underlying volume (path, URL, name)
    fn identifier(&self) -> &str;

    /// Read the index facts in a session of its own
    async fn open_index(&self) -> Result<IndexHeader>;

    /// Open a read session for one request
    async fn open_session(&self) -> Result<Box<dyn ReadSession>>;
}

/// Per-request reader handed out by a [`VolumeStore`].
///
/// Coordinates passed in have already been validated against the volume
/// index.
#[async_trait]
pub trait ReadSession: Send + Sync {
    /// Section at one inline: crossline x sample
    async fn inline_section(&self, inline: i32) -> Result<Array2<f32>>;

    /// Section at one crossline: inline x sample
    async fn crossline_section(&self, crossline: i32) -> Result<Array2<f32>>;

    /// Amplitude map at one sample index: inline x crossline
    async fn depth_section(&self, depth: usize) -> Result<Array2<f32>>;

    /// Single trace at an (inline, crossline) intersection
    async fn trace_at(&self, inline: i32, crossline: i32) -> Result<Array1<f32>>;
}
