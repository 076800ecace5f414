//! In-memory volume store
//!
//! Holds an inline x crossline x sample array. Counts index reads and
//! session open/close so callers can observe how the engine uses a store,
//! and can be told to fail reads of one inline to simulate I/O errors.

use crate::error::{Result, SliceError};
use crate::layout::TraceLayout;
use crate::store::{IndexHeader, ReadSession, VolumeStore};
use crate::types::Dimension;
use async_trait::async_trait;
use ndarray::{s, Array1, Array2, Array3, Axis};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct SessionCounters {
    index_reads: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

pub struct InMemoryVolumeStore {
    identifier: String,
    layout: Arc<TraceLayout>,
    data: Arc<Array3<f32>>,
    counters: Arc<SessionCounters>,
    failing_inline: Option<i32>,
}

impl InMemoryVolumeStore {
    pub fn new(
        identifier: impl Into<String>,
        ilines: Vec<i32>,
        xlines: Vec<i32>,
        data: Array3<f32>,
    ) -> Result<Self> {
        let (_, _, samples) = data.dim();
        let layout = TraceLayout::new(ilines, xlines, samples)?;
        let expected = (layout.inline_count(), layout.crossline_count(), samples);
        if data.dim() != expected {
            return Err(SliceError::InvalidFormat(format!(
                "sample array has shape {:?}, coordinates describe {:?}",
                data.dim(),
                expected
            )));
        }

        Ok(Self {
            identifier: identifier.into(),
            layout: Arc::new(layout),
            data: Arc::new(data),
            counters: Arc::default(),
            failing_inline: None,
        })
    }

    /// Make every read touching `inline` fail with an I/O error
    pub fn fail_on_inline(mut self, inline: i32) -> Self {
        self.failing_inline = Some(inline);
        self
    }

    pub fn index_reads(&self) -> usize {
        self.counters.index_reads.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VolumeStore for InMemoryVolumeStore {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn open_index(&self) -> Result<IndexHeader> {
        self.counters.index_reads.fetch_add(1, Ordering::SeqCst);
        Ok(IndexHeader {
            ilines: self.layout.ilines().to_vec(),
            xlines: self.layout.xlines().to_vec(),
            samples_per_trace: self.layout.samples_per_trace(),
        })
    }

    async fn open_session(&self) -> Result<Box<dyn ReadSession>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            layout: Arc::clone(&self.layout),
            data: Arc::clone(&self.data),
            counters: Arc::clone(&self.counters),
            failing_inline: self.failing_inline,
        }))
    }
}

struct MemorySession {
    layout: Arc<TraceLayout>,
    data: Arc<Array3<f32>>,
    counters: Arc<SessionCounters>,
    failing_inline: Option<i32>,
}

impl MemorySession {
    fn check_readable(&self, inline: i32) -> Result<()> {
        if self.failing_inline == Some(inline) {
            return Err(SliceError::Io(std::io::Error::other(format!(
                "simulated read failure at inline {}",
                inline
            ))));
        }
        Ok(())
    }

    fn inline_position(&self, inline: i32) -> Result<usize> {
        self.check_readable(inline)?;
        self.layout.inline_position(inline).ok_or_else(|| {
            SliceError::BackingStore(format!("{} {} not stored", Dimension::Inline, inline))
        })
    }

    fn crossline_position(&self, crossline: i32) -> Result<usize> {
        self.layout.crossline_position(crossline).ok_or_else(|| {
            SliceError::BackingStore(format!("{} {} not stored", Dimension::Crossline, crossline))
        })
    }

    /// Whole-volume reads touch every inline
    fn check_all_readable(&self) -> Result<()> {
        match self.failing_inline {
            Some(inline) => self.check_readable(inline),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReadSession for MemorySession {
    async fn inline_section(&self, inline: i32) -> Result<Array2<f32>> {
        let position = self.inline_position(inline)?;
        Ok(self.data.index_axis(Axis(0), position).to_owned())
    }

    async fn crossline_section(&self, crossline: i32) -> Result<Array2<f32>> {
        self.check_all_readable()?;
        let position = self.crossline_position(crossline)?;
        Ok(self.data.index_axis(Axis(1), position).to_owned())
    }

    async fn depth_section(&self, depth: usize) -> Result<Array2<f32>> {
        self.check_all_readable()?;
        if !self.layout.depth_range().contains(&depth) {
            return Err(SliceError::BackingStore(format!("depth {} not stored", depth)));
        }
        Ok(self.data.index_axis(Axis(2), depth).to_owned())
    }

    async fn trace_at(&self, inline: i32, crossline: i32) -> Result<Array1<f32>> {
        let il = self.inline_position(inline)?;
        let xl = self.crossline_position(crossline)?;
        Ok(self.data.slice(s![il, xl, ..]).to_owned())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}
