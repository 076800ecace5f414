//! Integration tests against volumes written to a temporary directory
//!
//! Each test writes a small synthetic survey with a known amplitude pattern,
//! opens it through the public API and checks what comes back.

use ndarray::{s, Array3, Axis};
use seisslice::{
    CompressionMethod, DataRequest, Dimension, EngineConfig, FetchMode, FileVolumeStore,
    SliceData, SliceEngine, SliceError, TraceData, VolumeData, VolumeIndex, VolumeMetadata,
};
use std::fs;
use tempfile::TempDir;

const ILINES: [i32; 5] = [1000, 1001, 1002, 1003, 1004];
const XLINES: [i32; 4] = [2000, 2005, 2010, 2015];
const SAMPLES: usize = 32;

/// Amplitude with a muted top so RLE has runs to work with
fn amplitude(il: usize, xl: usize, s: usize) -> f32 {
    if s < 8 {
        0.0
    } else {
        (il as f32 * 1.5 - xl as f32) * ((s as f32) * 0.2).sin()
    }
}

fn survey() -> Array3<f32> {
    Array3::from_shape_fn((ILINES.len(), XLINES.len(), SAMPLES), |(i, x, s)| {
        amplitude(i, x, s)
    })
}

async fn write_volume(dir: &TempDir, compression: CompressionMethod) -> String {
    let path = dir.path().join("volume");
    let url = format!("file://{}", path.display());
    let metadata = VolumeMetadata::new(ILINES.to_vec(), XLINES.to_vec(), SAMPLES)
        .with_compression(compression);
    FileVolumeStore::create(url.as_str(), metadata, survey().view())
        .await
        .expect("Failed to write test volume");
    url
}

#[tokio::test]
async fn test_index_matches_written_volume() {
    let dir = TempDir::new().unwrap();
    let url = write_volume(&dir, CompressionMethod::Zstd).await;

    let index = VolumeIndex::open(url.as_str()).await.unwrap();
    assert_eq!(index.ilines(), &ILINES);
    assert_eq!(index.xlines(), &XLINES);
    assert_eq!(index.trace_length(), SAMPLES);
    assert_eq!(index.valid_depth_range(), 0..SAMPLES);
    assert_eq!(index.slice_shape(Dimension::Inline), (4, SAMPLES));
}

#[tokio::test]
async fn test_every_codec_reads_back_the_survey() {
    let data = survey();

    for compression in [
        CompressionMethod::None,
        CompressionMethod::Deflate,
        CompressionMethod::Rle,
        CompressionMethod::Zstd,
    ] {
        let dir = TempDir::new().unwrap();
        let url = write_volume(&dir, compression).await;
        let engine = SliceEngine::open(url.as_str()).await.unwrap();

        let inlines = engine.get_inline_slices(&ILINES).await.unwrap().into_batch();
        assert_eq!(inlines, data, "inline sections differ for {:?}", compression);

        let crossline = engine.get_crossline_slice(2010).await.unwrap();
        assert_eq!(crossline, data.index_axis(Axis(1), 2));

        let depth = engine.get_depth_slice(20).await.unwrap();
        assert_eq!(depth, data.index_axis(Axis(2), 20));

        let trace = engine.get_trace(1003, 2005).await.unwrap();
        assert_eq!(trace, data.slice(s![3, 1, ..]), "trace differs for {:?}", compression);
    }
}

#[tokio::test]
async fn test_batch_shapes_and_order() {
    let dir = TempDir::new().unwrap();
    let url = write_volume(&dir, CompressionMethod::Deflate).await;
    let engine = SliceEngine::open(url.as_str()).await.unwrap();

    let depths = engine.get_depth_slices(&[31, 0, 31]).await.unwrap();
    let SliceData::SliceBatch(batch) = depths else {
        panic!("three depths should give a batch");
    };
    assert_eq!(batch.dim(), (3, ILINES.len(), XLINES.len()));
    assert_eq!(batch.index_axis(Axis(0), 0), batch.index_axis(Axis(0), 2));
    assert_eq!(
        batch.index_axis(Axis(0), 1),
        engine.get_depth_slice(0).await.unwrap()
    );

    let traces = engine
        .get_traces(&[1004, 1000, 1002], &[2015, 2000, 2000])
        .await
        .unwrap();
    let TraceData::TraceBatch(rows) = traces else {
        panic!("three pairs should give a batch");
    };
    assert_eq!(rows.dim(), (3, SAMPLES));
    assert_eq!(rows.row(1), engine.get_trace(1000, 2000).await.unwrap());
}

#[tokio::test]
async fn test_dispatcher_against_file_volume() {
    let dir = TempDir::new().unwrap();
    let url = write_volume(&dir, CompressionMethod::Zstd).await;
    let engine = SliceEngine::open(url.as_str())
        .await
        .unwrap()
        .with_config(EngineConfig::new().with_fetch_mode(FetchMode::Concurrent));

    let data = engine
        .get_data(&DataRequest::new().inlines([1001, 1002]).crosslines([2000, 2015]))
        .await
        .unwrap();
    assert!(matches!(data, VolumeData::Traces(TraceData::TraceBatch(_))));
    assert_eq!(data.shape(), &[2, SAMPLES]);

    let err = engine
        .get_data(&DataRequest::new().crosslines([2000]).depths([1]))
        .await
        .unwrap_err();
    assert!(matches!(err, SliceError::ConflictingArguments));
}

#[tokio::test]
async fn test_invalid_coordinates_are_reported() {
    let dir = TempDir::new().unwrap();
    let url = write_volume(&dir, CompressionMethod::None).await;
    let engine = SliceEngine::open(url.as_str()).await.unwrap();

    let err = engine.get_inline_slices(&[1000, 1005]).await.unwrap_err();
    assert_eq!(err.to_string(), "inline 1005 is not valid");

    let err = engine.get_depth_slice(SAMPLES).await.unwrap_err();
    assert_eq!(err.to_string(), format!("depth {} is not valid", SAMPLES));

    let err = engine.get_traces(&[1000], &[2000, 2005]).await.unwrap_err();
    assert!(matches!(err, SliceError::ArityMismatch { .. }));
}

#[tokio::test]
async fn test_corrupted_chunk_is_detected() {
    let dir = TempDir::new().unwrap();
    let url = write_volume(&dir, CompressionMethod::Deflate).await;
    let engine = SliceEngine::open(url.as_str()).await.unwrap();

    let chunk = dir.path().join("volume").join("traces").join("00000002.chunk");
    let mut bytes = fs::read(&chunk).unwrap();
    bytes[0] ^= 0xFF;
    fs::write(&chunk, bytes).unwrap();

    assert!(engine.get_inline_slice(1001).await.is_ok());
    let err = engine.get_inline_slices(&[1001, 1002]).await.unwrap_err();
    assert!(matches!(err, SliceError::ChecksumMismatch { .. }));
    assert!(!err.is_request_error());
}

#[tokio::test]
async fn test_corrupted_raw_chunk_fails_trace_reads() {
    let dir = TempDir::new().unwrap();
    let url = write_volume(&dir, CompressionMethod::None).await;
    let engine = SliceEngine::open(url.as_str()).await.unwrap();

    let chunk = dir.path().join("volume").join("traces").join("00000000.chunk");
    let mut bytes = fs::read(&chunk).unwrap();
    bytes[..4].copy_from_slice(&999.0f32.to_le_bytes());
    fs::write(&chunk, bytes).unwrap();

    for result in [
        engine.get_inline_slice(1000).await.map(|_| ()),
        engine.get_trace(1000, 2000).await.map(|_| ()),
        engine.get_crossline_slice(2000).await.map(|_| ()),
    ] {
        assert!(matches!(result, Err(SliceError::ChecksumMismatch { .. })));
    }

    // Traces outside the damaged one still read back
    let trace = engine.get_trace(1000, 2005).await.unwrap();
    assert_eq!(trace[SAMPLES - 1], amplitude(0, 1, SAMPLES - 1));
}

#[tokio::test]
async fn test_missing_volume() {
    let dir = TempDir::new().unwrap();
    let url = dir.path().join("nothing-here");

    let err = SliceEngine::open(url.to_str().unwrap()).await.err().unwrap();
    assert!(matches!(err, SliceError::NotFoundOrFormat { .. }));
}

#[tokio::test]
async fn test_malformed_metadata() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("metadata.json"), b"{\"ilines\": [1, 2]").unwrap();

    let err = VolumeIndex::open(dir.path().to_str().unwrap()).await.unwrap_err();
    assert!(matches!(err, SliceError::NotFoundOrFormat { .. }));
}
