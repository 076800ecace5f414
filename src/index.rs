//! Volume index - the static coordinate sets of one volume

use crate::error::{Result, SliceError};
use crate::file_store::FileVolumeStore;
use crate::layout::TraceLayout;
use crate::store::VolumeStore;
use crate::types::Dimension;
use std::ops::Range;

/// Inline set, crossline set and trace length of a volume.
///
/// Read once from the store and never refreshed; no handle to the store is
/// kept.
#[derive(Debug, Clone)]
pub struct VolumeIndex {
    identifier: String,
    layout: TraceLayout,
}

impl VolumeIndex {
    /// Open the directory volume at `identifier` and read its index
    pub async fn open(identifier: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        let store = FileVolumeStore::open(identifier.as_str()).map_err(|e| {
            SliceError::NotFoundOrFormat {
                identifier: identifier.clone(),
                reason: e.to_string(),
            }
        })?;
        Self::from_store(&store).await
    }

    /// Read the index of any store
    pub async fn from_store(store: &dyn VolumeStore) -> Result<Self> {
        let identifier = store.identifier().to_string();
        let not_found = |e: SliceError| SliceError::NotFoundOrFormat {
            identifier: identifier.clone(),
            reason: e.to_string(),
        };

        let header = store.open_index().await.map_err(not_found)?;
        let layout = TraceLayout::new(header.ilines, header.xlines, header.samples_per_trace)
            .map_err(not_found)?;

        tracing::debug!(
            identifier = %identifier,
            layout = %layout.summary(),
            "volume index loaded"
        );
        Ok(Self { identifier, layout })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn ilines(&self) -> &[i32] {
        self.layout.ilines()
    }

    pub fn xlines(&self) -> &[i32] {
        self.layout.xlines()
    }

    /// Samples per trace
    pub fn trace_length(&self) -> usize {
        self.layout.samples_per_trace()
    }

    pub fn inline_count(&self) -> usize {
        self.layout.inline_count()
    }

    pub fn crossline_count(&self) -> usize {
        self.layout.crossline_count()
    }

    pub fn contains_inline(&self, inline: i32) -> bool {
        self.layout.inline_position(inline).is_some()
    }

    pub fn contains_crossline(&self, crossline: i32) -> bool {
        self.layout.crossline_position(crossline).is_some()
    }

    pub fn contains_depth(&self, depth: usize) -> bool {
        depth < self.trace_length()
    }

    /// Valid depth indices, `0..trace_length`
    pub fn valid_depth_range(&self) -> Range<usize> {
        self.layout.depth_range()
    }

    /// Shape of a single section at a fixed coordinate along `axis`
    pub fn slice_shape(&self, axis: Dimension) -> (usize, usize) {
        self.layout.section_shape(axis)
    }

    pub fn layout(&self) -> &TraceLayout {
        &self.layout
    }
}
