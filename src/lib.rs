//! Seisslice - indexed slicing of seismic trace volumes
//!
//! Random access to inline, crossline and depth sections, or to single
//! traces, of a 3D seismic volume without loading the volume into memory.
//!
//! # Features
//!
//! - Volume index read once per volume: inline set, crossline set, trace length
//! - Coordinate validation before any I/O; failures are typed and recoverable
//! - One scoped read session per call, released on every path
//! - Single vs. batch results as explicit enum variants
//! - Directory container with Deflate, Zstd and RLE chunk encodings
//! - Per-call timing through a pluggable metrics sink and `tracing`
//!
//! # Other storage
//!
//! Implement the `VolumeStore` and `ReadSession` traits to slice volumes kept
//! anywhere else (a SEG-Y reader, object storage, a database).
//!
//! # Example
//!
//! ```rust,ignore
//! use seisslice::{DataRequest, SliceEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SliceEngine::open("file:///data/f3-volume").await?;
//!
//! let sections = engine.get_inline_slices(&[100, 150, 200]).await?;
//! let trace = engine.get_trace(120, 340).await?;
//! let map = engine.get_data(&DataRequest::new().depths([250])).await?;
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod compression;
pub mod config;
pub mod error;
pub mod file_store;
pub mod index;
pub mod io;
pub mod layout;
pub mod memory_store;
pub mod metadata;
pub mod metrics;
pub mod store;
pub mod types;
pub mod utils;

// Re-exports
pub use access::{DataRequest, SliceEngine, VolumeStats};
pub use compression::{ChunkCodec, CompressionLevel, CompressionMethod};
pub use config::{EngineConfig, FetchMode};
pub use error::{Result, SliceError};
pub use file_store::FileVolumeStore;
pub use index::VolumeIndex;
pub use io::{IOManager, StorageBackend};
pub use layout::TraceLayout;
pub use memory_store::InMemoryVolumeStore;
pub use metadata::{SurveyMetadata, VolumeMetadata};
pub use metrics::{
    FetchReport, MetricsSink, NoopMetrics, QueryKind, RecordingMetrics, TracingMetrics,
};
pub use store::{IndexHeader, ReadSession, VolumeStore};
pub use types::{Dimension, SliceData, TraceData, ValueRange, VolumeData};

/// Version of this crate
pub const SEISSLICE_VERSION: &str = env!("CARGO_PKG_VERSION");
