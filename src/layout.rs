//! Trace layout - maps survey coordinates onto physical trace records
//!
//! Traces are stored inline-major: all traces of the first inline, in
//! crossline order, then the next inline. Each inline forms one chunk of
//! `crossline_count * samples_per_trace` samples.

use crate::error::{Result, SliceError};
use crate::types::Dimension;
use crate::utils::{format_bytes, SAMPLE_SIZE};
use std::collections::HashMap;
use std::ops::Range;

/// Coordinate-to-position mapping of a 3D trace volume
#[derive(Debug, Clone)]
pub struct TraceLayout {
    ilines: Vec<i32>,
    xlines: Vec<i32>,
    samples_per_trace: usize,
    inline_positions: HashMap<i32, usize>,
    crossline_positions: HashMap<i32, usize>,
}

fn positions(axis: Dimension, values: &[i32]) -> Result<HashMap<i32, usize>> {
    if values.is_empty() {
        return Err(SliceError::InvalidFormat(format!("no {} coordinates", axis)));
    }

    let mut map = HashMap::with_capacity(values.len());
    for (position, &value) in values.iter().enumerate() {
        if map.insert(value, position).is_some() {
            return Err(SliceError::InvalidFormat(format!(
                "duplicate {} coordinate {}",
                axis, value
            )));
        }
    }
    Ok(map)
}

impl TraceLayout {
    /// Create a layout from the coordinate sets reported by a store
    pub fn new(ilines: Vec<i32>, xlines: Vec<i32>, samples_per_trace: usize) -> Result<Self> {
        if samples_per_trace == 0 {
            return Err(SliceError::InvalidFormat(
                "samples per trace must be positive".to_string(),
            ));
        }

        let inline_positions = positions(Dimension::Inline, &ilines)?;
        let crossline_positions = positions(Dimension::Crossline, &xlines)?;

        Ok(Self {
            ilines,
            xlines,
            samples_per_trace,
            inline_positions,
            crossline_positions,
        })
    }

    pub fn ilines(&self) -> &[i32] {
        &self.ilines
    }

    pub fn xlines(&self) -> &[i32] {
        &self.xlines
    }

    pub fn samples_per_trace(&self) -> usize {
        self.samples_per_trace
    }

    pub fn inline_count(&self) -> usize {
        self.ilines.len()
    }

    pub fn crossline_count(&self) -> usize {
        self.xlines.len()
    }

    /// Ordinal position of an inline coordinate
    pub fn inline_position(&self, inline: i32) -> Option<usize> {
        self.inline_positions.get(&inline).copied()
    }

    /// Ordinal position of a crossline coordinate
    pub fn crossline_position(&self, crossline: i32) -> Option<usize> {
        self.crossline_positions.get(&crossline).copied()
    }

    pub fn depth_range(&self) -> Range<usize> {
        0..self.samples_per_trace
    }

    /// Shape of one section taken at a fixed coordinate along `axis`
    pub fn section_shape(&self, axis: Dimension) -> (usize, usize) {
        match axis {
            Dimension::Inline => (self.crossline_count(), self.samples_per_trace),
            Dimension::Crossline => (self.inline_count(), self.samples_per_trace),
            Dimension::Depth => (self.inline_count(), self.crossline_count()),
        }
    }

    /// Samples in one inline chunk
    pub fn chunk_samples(&self) -> usize {
        self.crossline_count() * self.samples_per_trace
    }

    /// Size in bytes of one uncompressed chunk
    pub fn chunk_size_bytes(&self) -> usize {
        self.chunk_samples() * SAMPLE_SIZE
    }

    /// Byte range of a trace inside its uncompressed inline chunk
    pub fn trace_byte_range(&self, crossline_position: usize) -> Range<usize> {
        let trace_bytes = self.samples_per_trace * SAMPLE_SIZE;
        let start = crossline_position * trace_bytes;
        start..start + trace_bytes
    }

    pub fn total_traces(&self) -> usize {
        self.inline_count() * self.crossline_count()
    }

    /// Calculate the total volume size in bytes (uncompressed)
    pub fn total_size_bytes(&self) -> usize {
        self.total_traces() * self.samples_per_trace * SAMPLE_SIZE
    }

    /// Get a summary string of the layout
    pub fn summary(&self) -> String {
        format!(
            "{} inlines x {} crosslines x {} samples, {} traces, {} uncompressed",
            self.inline_count(),
            self.crossline_count(),
            self.samples_per_trace,
            self.total_traces(),
            format_bytes(self.total_size_bytes())
        )
    }
}
