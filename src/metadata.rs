//! Container metadata stored as `metadata.json` next to the trace chunks

use crate::compression::CompressionMethod;
use crate::error::{Result, SliceError};
use crate::layout::TraceLayout;
use crate::types::ValueRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Container format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatVersion {
    pub major: u16,
    pub minor: u16,
}

impl FormatVersion {
    pub const CURRENT: Self = Self { major: 1, minor: 0 };

    pub fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub fn is_compatible(&self, other: &Self) -> bool {
        self.major == other.major
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Complete metadata for a trace volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeMetadata {
    pub version: FormatVersion,

    /// Inline coordinates in storage order
    pub ilines: Vec<i32>,

    /// Crossline coordinates in storage order
    pub xlines: Vec<i32>,

    pub samples_per_trace: usize,

    /// Compression method used for chunks
    pub compression: CompressionMethod,

    /// One entry per inline chunk, filled in when the volume is written
    #[serde(default)]
    pub chunks: Vec<ChunkMetadata>,

    pub value_range: Option<ValueRange>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub custom_metadata: HashMap<String, String>,

    pub survey_metadata: Option<SurveyMetadata>,
}

impl VolumeMetadata {
    pub fn new(ilines: Vec<i32>, xlines: Vec<i32>, samples_per_trace: usize) -> Self {
        Self {
            version: FormatVersion::default(),
            ilines,
            xlines,
            samples_per_trace,
            compression: CompressionMethod::Zstd,
            chunks: Vec::new(),
            value_range: None,
            created_at: Utc::now(),
            custom_metadata: HashMap::new(),
            survey_metadata: None,
        }
    }

    /// Set compression method
    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = method;
        self
    }

    /// Set survey metadata
    pub fn with_survey_metadata(mut self, survey: SurveyMetadata) -> Self {
        self.survey_metadata = Some(survey);
        self
    }

    /// Add custom metadata
    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom_metadata.insert(key.into(), value.into());
    }

    /// Get custom metadata
    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.custom_metadata.get(key).map(|s| s.as_str())
    }

    /// Build the coordinate layout described by this metadata
    pub fn layout(&self) -> Result<TraceLayout> {
        TraceLayout::new(
            self.ilines.clone(),
            self.xlines.clone(),
            self.samples_per_trace,
        )
    }

    /// Check version and chunk table against the layout
    pub fn validate(&self) -> Result<TraceLayout> {
        if !self.version.is_compatible(&FormatVersion::CURRENT) {
            return Err(SliceError::UnsupportedVersion(self.version.major));
        }

        let layout = self.layout()?;
        if self.chunks.len() != layout.inline_count() {
            return Err(SliceError::InvalidFormat(format!(
                "chunk table has {} entries for {} inlines",
                self.chunks.len(),
                layout.inline_count()
            )));
        }
        Ok(layout)
    }

    /// Chunk entry for the inline at `position`
    pub fn chunk(&self, position: usize) -> Result<&ChunkMetadata> {
        self.chunks.get(position).ok_or_else(|| {
            SliceError::InvalidFormat(format!("no chunk entry for inline position {}", position))
        })
    }
}

/// Survey/acquisition metadata for seismic data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyMetadata {
    pub survey_name: String,

    /// Survey type (e.g., "3D Seismic")
    pub survey_type: String,

    pub acquisition_date: Option<DateTime<Utc>>,

    pub company: Option<String>,

    /// Geographic coordinate system
    pub coordinate_system: Option<String>,

    /// Sample interval in microseconds, as in the SEG-Y binary header
    pub sample_interval_us: Option<u32>,
}

/// Stored size and checksum of one inline chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub position: usize,

    pub compressed_size: usize,

    pub uncompressed_size: usize,

    /// CRC32 of the stored bytes
    pub checksum: u32,

    /// CRC32 of each trace's bytes, in crossline order. Only written for
    /// uncompressed chunks, where single traces are read by byte range.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace_checksums: Vec<u32>,
}

impl ChunkMetadata {
    pub fn new(
        position: usize,
        compressed_size: usize,
        uncompressed_size: usize,
        checksum: u32,
    ) -> Self {
        Self {
            position,
            compressed_size,
            uncompressed_size,
            checksum,
            trace_checksums: Vec::new(),
        }
    }

    pub fn with_trace_checksums(mut self, trace_checksums: Vec<u32>) -> Self {
        self.trace_checksums = trace_checksums;
        self
    }

    /// Checksum of the trace at `crossline_position`, when one was recorded
    pub fn trace_checksum(&self, crossline_position: usize) -> Option<u32> {
        self.trace_checksums.get(crossline_position).copied()
    }
}
