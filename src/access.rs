//! Slice engine - validated, slice-oriented reads of a trace volume

use crate::config::{EngineConfig, FetchMode};
use crate::error::{Result, SliceError};
use crate::file_store::FileVolumeStore;
use crate::index::VolumeIndex;
use crate::metrics::{FetchReport, MetricsSink, QueryKind, TracingMetrics};
use crate::store::{ReadSession, VolumeStore};
use crate::types::{Dimension, SliceData, TraceData, VolumeData};
use crate::utils::format_bytes;
use futures::future::try_join_all;
use ndarray::{Array1, Array2, Array3, Axis};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Coordinate sets for [`SliceEngine::get_data`].
///
/// An axis counts as given when its field is `Some`, even if the list is
/// empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRequest {
    pub inlines: Option<Vec<i32>>,
    pub crosslines: Option<Vec<i32>>,
    pub depths: Option<Vec<usize>>,
}

impl DataRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inlines(mut self, inlines: impl IntoIterator<Item = i32>) -> Self {
        self.inlines = Some(inlines.into_iter().collect());
        self
    }

    pub fn crosslines(mut self, crosslines: impl IntoIterator<Item = i32>) -> Self {
        self.crosslines = Some(crosslines.into_iter().collect());
        self
    }

    pub fn depths(mut self, depths: impl IntoIterator<Item = usize>) -> Self {
        self.depths = Some(depths.into_iter().collect());
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum SectionRequest {
    Inline(i32),
    Crossline(i32),
    Depth(usize),
}

async fn read_section(session: &dyn ReadSession, request: SectionRequest) -> Result<Array2<f32>> {
    match request {
        SectionRequest::Inline(inline) => session.inline_section(inline).await,
        SectionRequest::Crossline(crossline) => session.crossline_section(crossline).await,
        SectionRequest::Depth(depth) => session.depth_section(depth).await,
    }
}

/// Main interface for reading slices and traces of a volume
pub struct SliceEngine {
    index: VolumeIndex,
    store: Arc<dyn VolumeStore>,
    config: EngineConfig,
    metrics: Arc<dyn MetricsSink>,
}

impl SliceEngine {
    /// Open the directory volume at `url`
    pub async fn open(url: impl Into<String>) -> Result<Self> {
        let identifier = url.into();
        let store =
            FileVolumeStore::open(identifier.as_str()).map_err(|e| SliceError::NotFoundOrFormat {
                identifier: identifier.clone(),
                reason: e.to_string(),
            })?;
        Self::from_store(Arc::new(store)).await
    }

    /// Build an engine over any store; reads the volume index once
    pub async fn from_store(store: Arc<dyn VolumeStore>) -> Result<Self> {
        let index = VolumeIndex::from_store(store.as_ref()).await?;
        Ok(Self {
            index,
            store,
            config: EngineConfig::default(),
            metrics: Arc::new(TracingMetrics),
        })
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn index(&self) -> &VolumeIndex {
        &self.index
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Inline sections, shaped `(n, crossline_count, trace_length)`
    pub async fn get_inline_slices(&self, inlines: &[i32]) -> Result<SliceData> {
        self.validate_inlines(inlines)?;
        let requests: Vec<_> = inlines.iter().map(|&i| SectionRequest::Inline(i)).collect();
        self.fetch_slices(QueryKind::InlineSlices, Dimension::Inline, &requests)
            .await
    }

    pub async fn get_inline_slice(&self, inline: i32) -> Result<Array2<f32>> {
        let data = self.get_inline_slices(&[inline]).await?;
        Ok(data.into_batch().index_axis_move(Axis(0), 0))
    }

    /// Crossline sections, shaped `(n, inline_count, trace_length)`
    pub async fn get_crossline_slices(&self, crosslines: &[i32]) -> Result<SliceData> {
        self.validate_crosslines(crosslines)?;
        let requests: Vec<_> = crosslines
            .iter()
            .map(|&x| SectionRequest::Crossline(x))
            .collect();
        self.fetch_slices(QueryKind::CrosslineSlices, Dimension::Crossline, &requests)
            .await
    }

    pub async fn get_crossline_slice(&self, crossline: i32) -> Result<Array2<f32>> {
        let data = self.get_crossline_slices(&[crossline]).await?;
        Ok(data.into_batch().index_axis_move(Axis(0), 0))
    }

    /// Depth sections, shaped `(n, inline_count, crossline_count)`.
    ///
    /// Traces are stored along depth, so each requested depth touches every
    /// trace in the volume; asking for N depths reads the volume N times.
    pub async fn get_depth_slices(&self, depths: &[usize]) -> Result<SliceData> {
        for &depth in depths {
            if !self.index.contains_depth(depth) {
                let value = i64::try_from(depth).unwrap_or(i64::MAX);
                return Err(SliceError::invalid(Dimension::Depth, value));
            }
        }
        let requests: Vec<_> = depths.iter().map(|&d| SectionRequest::Depth(d)).collect();
        self.fetch_slices(QueryKind::DepthSlices, Dimension::Depth, &requests)
            .await
    }

    pub async fn get_depth_slice(&self, depth: usize) -> Result<Array2<f32>> {
        let data = self.get_depth_slices(&[depth]).await?;
        Ok(data.into_batch().index_axis_move(Axis(0), 0))
    }

    /// Traces at paired (inline, crossline) positions, shaped
    /// `(n, trace_length)`
    pub async fn get_traces(&self, inlines: &[i32], crosslines: &[i32]) -> Result<TraceData> {
        if inlines.len() != crosslines.len() {
            return Err(SliceError::ArityMismatch {
                inlines: inlines.len(),
                crosslines: crosslines.len(),
            });
        }
        for (&inline, &crossline) in inlines.iter().zip(crosslines) {
            if !self.index.contains_inline(inline) {
                return Err(SliceError::invalid(Dimension::Inline, inline));
            }
            if !self.index.contains_crossline(crossline) {
                return Err(SliceError::invalid(Dimension::Crossline, crossline));
            }
        }

        let started = Instant::now();
        let count = inlines.len();
        let trace_length = self.index.trace_length();
        if count == 0 {
            return Ok(TraceData::TraceBatch(Array2::zeros((0, trace_length))));
        }

        let traces = {
            let session = self.store.open_session().await?;
            let pairs = inlines.iter().copied().zip(crosslines.iter().copied());
            match self.config.fetch_mode {
                FetchMode::Sequential => {
                    let mut traces = Vec::with_capacity(count);
                    for (inline, crossline) in pairs {
                        traces.push(session.trace_at(inline, crossline).await?);
                    }
                    traces
                }
                FetchMode::Concurrent => {
                    let session = &*session;
                    try_join_all(pairs.map(|(il, xl)| session.trace_at(il, xl))).await?
                }
            }
        };

        let data = assemble_traces(trace_length, traces)?;
        self.report(QueryKind::Traces, count, started.elapsed());
        Ok(data)
    }

    pub async fn get_trace(&self, inline: i32, crossline: i32) -> Result<Array1<f32>> {
        let data = self.get_traces(&[inline], &[crossline]).await?;
        Ok(data.into_batch().index_axis_move(Axis(0), 0))
    }

    /// Dispatch on which axes a request names.
    ///
    /// Depths exclude the other two axes; inlines together with crosslines
    /// select paired traces; a single horizontal axis selects sections.
    pub async fn get_data(&self, request: &DataRequest) -> Result<VolumeData> {
        match (&request.inlines, &request.crosslines, &request.depths) {
            (None, None, Some(depths)) => {
                Ok(VolumeData::Slices(self.get_depth_slices(depths).await?))
            }
            (_, _, Some(_)) => Err(SliceError::ConflictingArguments),
            (Some(inlines), Some(crosslines), None) => Ok(VolumeData::Traces(
                self.get_traces(inlines, crosslines).await?,
            )),
            (Some(inlines), None, None) => {
                Ok(VolumeData::Slices(self.get_inline_slices(inlines).await?))
            }
            (None, Some(crosslines), None) => Ok(VolumeData::Slices(
                self.get_crossline_slices(crosslines).await?,
            )),
            (None, None, None) => Err(SliceError::MissingArguments),
        }
    }

    /// Get statistics about the volume
    pub fn stats(&self) -> VolumeStats {
        let layout = self.index.layout();
        VolumeStats {
            identifier: self.index.identifier().to_string(),
            inline_count: layout.inline_count(),
            crossline_count: layout.crossline_count(),
            trace_length: layout.samples_per_trace(),
            total_traces: layout.total_traces(),
            uncompressed_size: layout.total_size_bytes(),
        }
    }

    fn validate_inlines(&self, inlines: &[i32]) -> Result<()> {
        match inlines.iter().find(|&&i| !self.index.contains_inline(i)) {
            Some(&inline) => Err(SliceError::invalid(Dimension::Inline, inline)),
            None => Ok(()),
        }
    }

    fn validate_crosslines(&self, crosslines: &[i32]) -> Result<()> {
        match crosslines.iter().find(|&&x| !self.index.contains_crossline(x)) {
            Some(&crossline) => Err(SliceError::invalid(Dimension::Crossline, crossline)),
            None => Ok(()),
        }
    }

    /// Open one session, fetch every section and stack them. Coordinates
    /// must already be validated.
    async fn fetch_slices(
        &self,
        kind: QueryKind,
        axis: Dimension,
        requests: &[SectionRequest],
    ) -> Result<SliceData> {
        let started = Instant::now();
        let shape = self.index.slice_shape(axis);
        if requests.is_empty() {
            return Ok(SliceData::SliceBatch(Array3::zeros((0, shape.0, shape.1))));
        }

        let sections = {
            let session = self.store.open_session().await?;
            match self.config.fetch_mode {
                FetchMode::Sequential => {
                    let mut sections = Vec::with_capacity(requests.len());
                    for &request in requests {
                        sections.push(read_section(&*session, request).await?);
                    }
                    sections
                }
                FetchMode::Concurrent => {
                    let session = &*session;
                    try_join_all(requests.iter().map(|&r| read_section(session, r))).await?
                }
            }
        };

        let data = assemble_slices(shape, sections)?;
        self.report(kind, requests.len(), started.elapsed());
        Ok(data)
    }

    fn report(&self, kind: QueryKind, count: usize, elapsed: Duration) {
        self.metrics.record(&FetchReport {
            kind,
            count,
            identifier: self.index.identifier().to_string(),
            elapsed,
        });
    }
}

/// Stack sections into a batch, or pass a lone section through
fn assemble_slices(shape: (usize, usize), mut sections: Vec<Array2<f32>>) -> Result<SliceData> {
    if let Some(bad) = sections.iter().find(|s| s.dim() != shape) {
        return Err(SliceError::BackingStore(format!(
            "section has shape {:?}, expected {:?}",
            bad.dim(),
            shape
        )));
    }

    if sections.len() == 1 {
        if let Some(section) = sections.pop() {
            return Ok(SliceData::SingleSlice(section));
        }
    }

    let mut batch = Array3::zeros((sections.len(), shape.0, shape.1));
    for (mut slot, section) in batch.axis_iter_mut(Axis(0)).zip(&sections) {
        slot.assign(section);
    }
    Ok(SliceData::SliceBatch(batch))
}

fn assemble_traces(trace_length: usize, mut traces: Vec<Array1<f32>>) -> Result<TraceData> {
    if let Some(bad) = traces.iter().find(|t| t.len() != trace_length) {
        return Err(SliceError::BackingStore(format!(
            "trace has {} samples, expected {}",
            bad.len(),
            trace_length
        )));
    }

    if traces.len() == 1 {
        if let Some(trace) = traces.pop() {
            return Ok(TraceData::SingleTrace(trace));
        }
    }

    let mut batch = Array2::zeros((traces.len(), trace_length));
    for (mut row, trace) in batch.rows_mut().into_iter().zip(&traces) {
        row.assign(trace);
    }
    Ok(TraceData::TraceBatch(batch))
}

/// Volume statistics
#[derive(Debug, Clone)]
pub struct VolumeStats {
    pub identifier: String,
    pub inline_count: usize,
    pub crossline_count: usize,
    pub trace_length: usize,
    pub total_traces: usize,
    pub uncompressed_size: usize,
}

impl VolumeStats {
    pub fn summary(&self) -> String {
        format!(
            "{}: {} inlines x {} crosslines x {} samples, {} traces, {} uncompressed",
            self.identifier,
            self.inline_count,
            self.crossline_count,
            self.trace_length,
            self.total_traces,
            format_bytes(self.uncompressed_size),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::InMemoryVolumeStore;
    use crate::metrics::RecordingMetrics;
    use ndarray::s;

    const ILINES: [i32; 4] = [100, 101, 102, 103];
    const XLINES: [i32; 3] = [200, 202, 204];
    const SAMPLES: usize = 6;

    fn volume() -> Array3<f32> {
        Array3::from_shape_fn((4, 3, SAMPLES), |(i, x, s)| (i * 100 + x * 10 + s) as f32)
    }

    fn store() -> Arc<InMemoryVolumeStore> {
        Arc::new(
            InMemoryVolumeStore::new("mem://test", ILINES.to_vec(), XLINES.to_vec(), volume())
                .unwrap(),
        )
    }

    async fn engine(store: &Arc<InMemoryVolumeStore>) -> SliceEngine {
        SliceEngine::from_store(store.clone()).await.unwrap()
    }

    #[tokio::test]
    async fn test_leading_axis_follows_count() {
        let store = store();
        let engine = engine(&store).await;

        let many = engine.get_inline_slices(&[100, 103, 101]).await.unwrap();
        assert_eq!(many.shape(), &[3, 3, SAMPLES]);

        let one = engine.get_inline_slices(&[102]).await.unwrap();
        assert!(matches!(one, SliceData::SingleSlice(_)));
        assert_eq!(one.shape(), &[3, SAMPLES]);

        let crosslines = engine.get_crossline_slices(&[200, 204]).await.unwrap();
        assert_eq!(crosslines.shape(), &[2, 4, SAMPLES]);
        assert_eq!(
            engine.get_crossline_slices(&[202]).await.unwrap().shape(),
            &[4, SAMPLES]
        );

        let depths = engine.get_depth_slices(&[0, 5]).await.unwrap();
        assert_eq!(depths.shape(), &[2, 4, 3]);
        assert_eq!(engine.get_depth_slices(&[3]).await.unwrap().shape(), &[4, 3]);

        let traces = engine.get_traces(&[100, 101], &[204, 200]).await.unwrap();
        assert_eq!(traces.shape(), &[2, SAMPLES]);
        assert_eq!(
            engine.get_traces(&[103], &[202]).await.unwrap().shape(),
            &[SAMPLES]
        );
    }

    #[tokio::test]
    async fn test_section_contents() {
        let store = store();
        let engine = engine(&store).await;
        let data = volume();

        assert_eq!(
            engine.get_inline_slice(101).await.unwrap(),
            data.index_axis(Axis(0), 1)
        );
        assert_eq!(
            engine.get_crossline_slice(204).await.unwrap(),
            data.index_axis(Axis(1), 2)
        );
        assert_eq!(
            engine.get_depth_slice(4).await.unwrap(),
            data.index_axis(Axis(2), 4)
        );
        assert_eq!(
            engine.get_trace(102, 202).await.unwrap(),
            data.slice(s![2, 1, ..])
        );
    }

    #[tokio::test]
    async fn test_order_preserved() {
        let store = store();
        let engine = engine(&store).await;

        let pair = engine.get_inline_slices(&[103, 100]).await.unwrap().into_batch();
        let first = engine.get_inline_slice(103).await.unwrap();
        let second = engine.get_inline_slice(100).await.unwrap();
        assert_eq!(pair.index_axis(Axis(0), 0), first);
        assert_eq!(pair.index_axis(Axis(0), 1), second);
    }

    #[tokio::test]
    async fn test_duplicates_fetched_redundantly() {
        let store = store();
        let engine = engine(&store).await;

        let twice = engine.get_inline_slices(&[101, 101]).await.unwrap().into_batch();
        let once = engine.get_inline_slice(101).await.unwrap();
        assert_eq!(twice.len_of(Axis(0)), 2);
        assert_eq!(twice.index_axis(Axis(0), 0), once);
        assert_eq!(twice.index_axis(Axis(0), 1), once);
    }

    #[tokio::test]
    async fn test_idempotent_reads() {
        let store = store();
        let engine = engine(&store).await;

        let a = engine.get_depth_slices(&[1, 2, 3]).await.unwrap();
        let b = engine.get_depth_slices(&[1, 2, 3]).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.sessions_opened(), 2);
    }

    #[tokio::test]
    async fn test_invalid_coordinate_opens_no_session() {
        let store = store();
        let engine = engine(&store).await;

        let err = engine.get_inline_slices(&[100, 99, 101]).await.unwrap_err();
        assert!(matches!(
            err,
            SliceError::InvalidCoordinate {
                axis: Dimension::Inline,
                value: 99
            }
        ));

        let err = engine.get_crossline_slices(&[201]).await.unwrap_err();
        assert!(matches!(
            err,
            SliceError::InvalidCoordinate {
                axis: Dimension::Crossline,
                value: 201
            }
        ));

        let err = engine.get_depth_slices(&[SAMPLES]).await.unwrap_err();
        assert!(matches!(
            err,
            SliceError::InvalidCoordinate {
                axis: Dimension::Depth,
                ..
            }
        ));

        let err = engine.get_traces(&[100, 101], &[200, 203]).await.unwrap_err();
        assert!(matches!(
            err,
            SliceError::InvalidCoordinate {
                axis: Dimension::Crossline,
                value: 203
            }
        ));

        assert_eq!(store.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_trace_pairs_check_inline_first() {
        let store = store();
        let engine = engine(&store).await;

        // Both coordinates of the first pair are invalid; the inline wins
        let err = engine.get_traces(&[99, 100], &[201, 200]).await.unwrap_err();
        assert!(matches!(
            err,
            SliceError::InvalidCoordinate {
                axis: Dimension::Inline,
                value: 99
            }
        ));

        // Pairs are checked in request order, so an earlier bad crossline
        // wins over a later bad inline
        let err = engine
            .get_traces(&[100, 104], &[201, 200])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SliceError::InvalidCoordinate {
                axis: Dimension::Crossline,
                value: 201
            }
        ));

        let err = engine.get_trace(104, 200).await.unwrap_err();
        assert!(matches!(
            err,
            SliceError::InvalidCoordinate {
                axis: Dimension::Inline,
                value: 104
            }
        ));

        assert_eq!(store.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_arity_mismatch() {
        let store = store();
        let engine = engine(&store).await;

        let err = engine.get_traces(&[1, 2, 3], &[5, 6]).await.unwrap_err();
        assert!(matches!(
            err,
            SliceError::ArityMismatch {
                inlines: 3,
                crosslines: 2
            }
        ));
        assert!(err.is_request_error());
        assert_eq!(store.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_precedence() {
        let store = store();
        let engine = engine(&store).await;

        let conflicting = DataRequest::new().inlines([100]).crosslines([200]).depths([3]);
        assert!(matches!(
            engine.get_data(&conflicting).await,
            Err(SliceError::ConflictingArguments)
        ));
        assert!(matches!(
            engine.get_data(&DataRequest::new()).await,
            Err(SliceError::MissingArguments)
        ));

        let paired = DataRequest::new().inlines([100]).crosslines([200]);
        let data = engine.get_data(&paired).await.unwrap();
        assert!(matches!(data, VolumeData::Traces(TraceData::SingleTrace(_))));

        let inline = DataRequest::new().inlines([100, 101]);
        assert_eq!(engine.get_data(&inline).await.unwrap().shape(), &[2, 3, SAMPLES]);

        let crossline = DataRequest::new().crosslines([202]);
        assert_eq!(engine.get_data(&crossline).await.unwrap().shape(), &[4, SAMPLES]);

        let depth = DataRequest::new().depths([0, 1]);
        assert_eq!(engine.get_data(&depth).await.unwrap().shape(), &[2, 4, 3]);
    }

    #[tokio::test]
    async fn test_empty_list_counts_as_given() {
        let store = store();
        let engine = engine(&store).await;

        let request = DataRequest::new().inlines(Vec::new()).depths([1]);
        assert!(matches!(
            engine.get_data(&request).await,
            Err(SliceError::ConflictingArguments)
        ));

        let empty = engine.get_data(&DataRequest::new().crosslines(Vec::new())).await.unwrap();
        assert_eq!(empty.shape(), &[0, 4, SAMPLES]);
        assert_eq!(store.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn test_session_released_after_read_failure() {
        let store = Arc::new(
            InMemoryVolumeStore::new("mem://bad", ILINES.to_vec(), XLINES.to_vec(), volume())
                .unwrap()
                .fail_on_inline(102),
        );
        let engine = SliceEngine::from_store(store.clone()).await.unwrap();

        let err = engine.get_inline_slices(&[100, 102, 103]).await.unwrap_err();
        assert!(matches!(err, SliceError::Io(_)));
        assert!(!err.is_request_error());
        assert_eq!(store.sessions_opened(), 1);
        assert_eq!(store.sessions_closed(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_mode_matches_sequential() {
        let store = store();
        let sequential = engine(&store).await;
        let concurrent = engine(&store)
            .await
            .with_config(EngineConfig::new().with_fetch_mode(FetchMode::Concurrent));

        let coords = [103, 100, 102, 100];
        assert_eq!(
            sequential.get_inline_slices(&coords).await.unwrap(),
            concurrent.get_inline_slices(&coords).await.unwrap()
        );
        assert_eq!(
            sequential.get_traces(&coords, &[200, 202, 204, 200]).await.unwrap(),
            concurrent.get_traces(&coords, &[200, 202, 204, 200]).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_metrics_reported_per_call() {
        let store = store();
        let metrics = Arc::new(RecordingMetrics::new());
        let engine = engine(&store).await.with_metrics(metrics.clone());

        engine.get_inline_slices(&[100, 101]).await.unwrap();
        engine.get_trace(100, 200).await.unwrap();
        let _ = engine.get_inline_slices(&[42]).await;

        let reports = metrics.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].kind, QueryKind::InlineSlices);
        assert_eq!(reports[0].count, 2);
        assert_eq!(reports[0].identifier, "mem://test");
        assert_eq!(reports[1].kind, QueryKind::Traces);
    }

    #[tokio::test]
    async fn test_stats() {
        let store = store();
        let stats = engine(&store).await.stats();
        assert_eq!(stats.total_traces, 12);
        assert_eq!(stats.uncompressed_size, 12 * SAMPLES * 4);
        assert_eq!(
            stats.summary(),
            "mem://test: 4 inlines x 3 crosslines x 6 samples, 12 traces, 288 B uncompressed"
        );
    }
}
