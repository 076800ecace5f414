//! Directory-backed volume store
//!
//! A volume is a directory holding `metadata.json` and one encoded chunk per
//! inline under `traces/`. Chunks store the inline's traces in crossline
//! order as little-endian `f32` samples before encoding.

use crate::compression::{get_codec, ChunkCodec, CompressionLevel};
use crate::error::{Result, SliceError};
use crate::io::{create_io_manager, IOManager};
use crate::layout::TraceLayout;
use crate::metadata::{ChunkMetadata, VolumeMetadata};
use crate::store::{IndexHeader, ReadSession, VolumeStore};
use crate::types::{Dimension, ValueRange};
use crate::utils::{bytes_to_samples, calculate_checksum, chunk_path, verify_checksum};
use async_trait::async_trait;
use ndarray::{Array1, Array2, ArrayView3, Axis};
use std::sync::Arc;
use uuid::Uuid;

const METADATA_PATH: &str = "metadata.json";

/// Volume store over an [`IOManager`]
pub struct FileVolumeStore {
    identifier: String,
    io_manager: Arc<dyn IOManager>,
}

impl FileVolumeStore {
    /// Open an existing volume directory. Nothing is read until a session or
    /// the index is requested.
    pub fn open(url: impl Into<String>) -> Result<Self> {
        let identifier = url.into();
        let io_manager: Arc<dyn IOManager> = Arc::from(create_io_manager(&identifier)?);
        Ok(Self {
            identifier,
            io_manager,
        })
    }

    /// Write a new volume from an inline x crossline x sample array.
    ///
    /// Refuses to touch a directory that already holds a volume.
    pub async fn create(
        url: impl Into<String>,
        metadata: VolumeMetadata,
        samples: ArrayView3<'_, f32>,
    ) -> Result<Self> {
        Self::create_with_level(url, metadata, samples, CompressionLevel::default()).await
    }

    pub async fn create_with_level(
        url: impl Into<String>,
        mut metadata: VolumeMetadata,
        samples: ArrayView3<'_, f32>,
        level: CompressionLevel,
    ) -> Result<Self> {
        let store = Self::open(url)?;
        if store.io_manager.exists(METADATA_PATH).await? {
            return Err(SliceError::Configuration(format!(
                "a volume already exists at '{}'",
                store.identifier
            )));
        }

        let layout = metadata.layout()?;
        let expected = (
            layout.inline_count(),
            layout.crossline_count(),
            layout.samples_per_trace(),
        );
        if samples.dim() != expected {
            return Err(SliceError::InvalidFormat(format!(
                "sample array has shape {:?}, metadata describes {:?}",
                samples.dim(),
                expected
            )));
        }

        let codec = get_codec(metadata.compression);
        let trace_bytes = layout.trace_byte_range(0).len();
        let mut chunks = Vec::with_capacity(layout.inline_count());
        let mut value_range: Option<ValueRange> = None;

        for (position, inline) in samples.axis_iter(Axis(0)).enumerate() {
            let chunk: Vec<f32> = inline.iter().copied().collect();
            if let Some(range) = ValueRange::of_samples(&chunk) {
                value_range = Some(match value_range {
                    Some(acc) => ValueRange::new(acc.min.min(range.min), acc.max.max(range.max)),
                    None => range,
                });
            }

            let encoded = codec.encode(&chunk, level)?;
            store
                .io_manager
                .write(&chunk_path(position), &encoded)
                .await?;
            let mut entry = ChunkMetadata::new(
                position,
                encoded.len(),
                layout.chunk_size_bytes(),
                calculate_checksum(&encoded),
            );
            if metadata.compression.is_random_access() {
                let trace_checksums = encoded
                    .chunks(trace_bytes)
                    .map(calculate_checksum)
                    .collect();
                entry = entry.with_trace_checksums(trace_checksums);
            }
            chunks.push(entry);
        }

        metadata.chunks = chunks;
        metadata.value_range = value_range;
        let metadata_json = serde_json::to_vec_pretty(&metadata)?;
        store.io_manager.write(METADATA_PATH, &metadata_json).await?;

        tracing::debug!(
            identifier = %store.identifier,
            layout = %layout.summary(),
            compression = ?metadata.compression,
            "volume written"
        );
        Ok(store)
    }

    /// Read and validate the container metadata
    pub async fn metadata(&self) -> Result<VolumeMetadata> {
        let bytes = self.io_manager.read(METADATA_PATH).await?;
        let metadata: VolumeMetadata = serde_json::from_slice(&bytes)?;
        metadata.validate()?;
        Ok(metadata)
    }
}

#[async_trait]
impl VolumeStore for FileVolumeStore {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn open_index(&self) -> Result<IndexHeader> {
        let metadata = self.metadata().await?;
        Ok(IndexHeader {
            ilines: metadata.ilines,
            xlines: metadata.xlines,
            samples_per_trace: metadata.samples_per_trace,
        })
    }

    async fn open_session(&self) -> Result<Box<dyn ReadSession>> {
        let metadata = self.metadata().await?;
        let layout = metadata.layout()?;
        let session = FileReadSession {
            id: Uuid::new_v4(),
            io_manager: Arc::clone(&self.io_manager),
            codec: get_codec(metadata.compression),
            metadata,
            layout,
        };
        tracing::debug!(
            session = %session.id,
            identifier = %self.identifier,
            "read session opened"
        );
        Ok(Box::new(session))
    }
}

/// Read session over one snapshot of the container metadata
pub struct FileReadSession {
    id: Uuid,
    io_manager: Arc<dyn IOManager>,
    codec: Box<dyn ChunkCodec>,
    metadata: VolumeMetadata,
    layout: TraceLayout,
}

fn missing(axis: Dimension, value: impl Into<i64>) -> SliceError {
    SliceError::BackingStore(format!("{} {} is not stored in this volume", axis, value.into()))
}

fn check(path: String, bytes: &[u8], expected: u32) -> Result<()> {
    if verify_checksum(bytes, expected) {
        return Ok(());
    }
    Err(SliceError::ChecksumMismatch {
        path,
        expected,
        actual: calculate_checksum(bytes),
    })
}

impl FileReadSession {
    fn inline_position(&self, inline: i32) -> Result<usize> {
        self.layout
            .inline_position(inline)
            .ok_or_else(|| missing(Dimension::Inline, inline))
    }

    fn crossline_position(&self, crossline: i32) -> Result<usize> {
        self.layout
            .crossline_position(crossline)
            .ok_or_else(|| missing(Dimension::Crossline, crossline))
    }

    /// Read, verify and decode one inline chunk
    async fn read_chunk(&self, position: usize) -> Result<Vec<f32>> {
        let path = chunk_path(position);
        let entry = self.metadata.chunk(position)?;
        let bytes = self.io_manager.read(&path).await?;
        check(path, &bytes, entry.checksum)?;
        self.codec.decode(&bytes, self.layout.chunk_samples())
    }

    /// One trace from the inline chunk at `inline_pos`. Uncompressed chunks
    /// with per-trace checksums are addressed by byte range instead of being
    /// read whole.
    async fn read_trace(&self, inline_pos: usize, crossline_pos: usize) -> Result<Vec<f32>> {
        let entry = self.metadata.chunk(inline_pos)?;

        let trace_checksum = entry
            .trace_checksum(crossline_pos)
            .filter(|_| self.metadata.compression.is_random_access());

        if let Some(expected) = trace_checksum {
            let path = chunk_path(inline_pos);
            let range = self.layout.trace_byte_range(crossline_pos);
            let bytes = self
                .io_manager
                .read_range(&path, range.start as u64, range.len())
                .await?;
            check(path, &bytes, expected)?;
            return bytes_to_samples(&bytes);
        }

        let chunk = self.read_chunk(inline_pos).await?;
        let ns = self.layout.samples_per_trace();
        let start = crossline_pos * ns;
        Ok(chunk[start..start + ns].to_vec())
    }
}

#[async_trait]
impl ReadSession for FileReadSession {
    async fn inline_section(&self, inline: i32) -> Result<Array2<f32>> {
        let position = self.inline_position(inline)?;
        let chunk = self.read_chunk(position).await?;
        Ok(Array2::from_shape_vec(
            self.layout.section_shape(Dimension::Inline),
            chunk,
        )?)
    }

    async fn crossline_section(&self, crossline: i32) -> Result<Array2<f32>> {
        let crossline_pos = self.crossline_position(crossline)?;
        let mut section = Array2::zeros(self.layout.section_shape(Dimension::Crossline));

        for inline_pos in 0..self.layout.inline_count() {
            let trace = self.read_trace(inline_pos, crossline_pos).await?;
            section.row_mut(inline_pos).assign(&Array1::from(trace));
        }
        Ok(section)
    }

    /// Reads and decodes every inline chunk, so each depth costs a full pass
    /// over the volume.
    async fn depth_section(&self, depth: usize) -> Result<Array2<f32>> {
        if !self.layout.depth_range().contains(&depth) {
            return Err(missing(Dimension::Depth, depth as i64));
        }

        let ns = self.layout.samples_per_trace();
        let mut section = Array2::zeros(self.layout.section_shape(Dimension::Depth));

        for inline_pos in 0..self.layout.inline_count() {
            let chunk = self.read_chunk(inline_pos).await?;
            let mut row = section.row_mut(inline_pos);
            for (crossline_pos, value) in row.iter_mut().enumerate() {
                *value = chunk[crossline_pos * ns + depth];
            }
        }
        Ok(section)
    }

    async fn trace_at(&self, inline: i32, crossline: i32) -> Result<Array1<f32>> {
        let inline_pos = self.inline_position(inline)?;
        let crossline_pos = self.crossline_position(crossline)?;
        Ok(Array1::from(self.read_trace(inline_pos, crossline_pos).await?))
    }
}

impl Drop for FileReadSession {
    fn drop(&mut self) {
        tracing::trace!(session = %self.id, "read session closed");
    }
}
