//! Core data types: survey axes and the shapes returned by the slice engine

use ndarray::{Array1, Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Axis of a 3D seismic survey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Inline axis (slowest varying in the container)
    Inline,
    /// Crossline axis
    Crossline,
    /// Depth/time sample axis
    Depth,
}

impl Dimension {
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Inline => "inline",
            Dimension::Crossline => "crossline",
            Dimension::Depth => "depth",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value range for a volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Range spanning all finite samples, `None` if there are none
    pub fn of_samples(samples: &[f32]) -> Option<Self> {
        samples
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some(Self::new(v, v)),
                Some(r) => Some(Self::new(r.min.min(v), r.max.max(v))),
            })
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Result of a slice query.
///
/// A request for exactly one coordinate yields the bare section; any other
/// count yields a batch whose leading axis follows the request order.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceData {
    SingleSlice(Array2<f32>),
    SliceBatch(Array3<f32>),
}

impl SliceData {
    /// Number of sections held
    pub fn count(&self) -> usize {
        match self {
            SliceData::SingleSlice(_) => 1,
            SliceData::SliceBatch(batch) => batch.len_of(Axis(0)),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            SliceData::SingleSlice(slice) => slice.shape(),
            SliceData::SliceBatch(batch) => batch.shape(),
        }
    }

    /// Always return a 3D array, adding a leading axis of length one to a
    /// single slice.
    pub fn into_batch(self) -> Array3<f32> {
        match self {
            SliceData::SingleSlice(slice) => slice.insert_axis(Axis(0)),
            SliceData::SliceBatch(batch) => batch,
        }
    }

    /// The bare section, if exactly one was requested
    pub fn into_single(self) -> Option<Array2<f32>> {
        match self {
            SliceData::SingleSlice(slice) => Some(slice),
            SliceData::SliceBatch(_) => None,
        }
    }
}

/// Result of a trace query, same single/batch split as [`SliceData`]
#[derive(Debug, Clone, PartialEq)]
pub enum TraceData {
    SingleTrace(Array1<f32>),
    TraceBatch(Array2<f32>),
}

impl TraceData {
    pub fn count(&self) -> usize {
        match self {
            TraceData::SingleTrace(_) => 1,
            TraceData::TraceBatch(batch) => batch.len_of(Axis(0)),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            TraceData::SingleTrace(trace) => trace.shape(),
            TraceData::TraceBatch(batch) => batch.shape(),
        }
    }

    pub fn into_batch(self) -> Array2<f32> {
        match self {
            TraceData::SingleTrace(trace) => trace.insert_axis(Axis(0)),
            TraceData::TraceBatch(batch) => batch,
        }
    }

    pub fn into_single(self) -> Option<Array1<f32>> {
        match self {
            TraceData::SingleTrace(trace) => Some(trace),
            TraceData::TraceBatch(_) => None,
        }
    }
}

/// Output of the `get_data` dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum VolumeData {
    Slices(SliceData),
    Traces(TraceData),
}

impl VolumeData {
    pub fn count(&self) -> usize {
        match self {
            VolumeData::Slices(slices) => slices.count(),
            VolumeData::Traces(traces) => traces.count(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            VolumeData::Slices(slices) => slices.shape(),
            VolumeData::Traces(traces) => traces.shape(),
        }
    }
}
