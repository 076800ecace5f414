//! Example: write a synthetic survey, then slice it every way the engine can
//!
//! Run with: RUST_LOG=info cargo run --example slice_volume

use ndarray::Array3;
use seisslice::{
    CompressionMethod, DataRequest, FileVolumeStore, SliceEngine, SurveyMetadata, VolumeMetadata,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let ilines: Vec<i32> = (100..300).collect();
    let xlines: Vec<i32> = (1000..1400).step_by(2).collect();
    let samples = 500;

    // A dipping reflector every 50 samples
    let data = Array3::from_shape_fn((ilines.len(), xlines.len(), samples), |(i, x, s)| {
        let phase = (s as f32 + i as f32 * 0.1 + x as f32 * 0.05) / 50.0;
        (phase * std::f32::consts::TAU).sin()
    });

    let mut metadata = VolumeMetadata::new(ilines, xlines, samples)
        .with_compression(CompressionMethod::Zstd)
        .with_survey_metadata(SurveyMetadata {
            survey_name: "Synthetic 3D".into(),
            survey_type: "3D Seismic".into(),
            sample_interval_us: Some(4000),
            ..Default::default()
        });
    metadata.add_metadata("generator", "slice_volume example");

    let temp_dir = tempfile::tempdir()?;
    let url = temp_dir.path().join("synthetic").display().to_string();
    FileVolumeStore::create(url.as_str(), metadata, data.view()).await?;

    let engine = SliceEngine::open(url.as_str()).await?;
    println!("{}", engine.stats().summary());

    let inlines = engine.get_inline_slices(&[120, 180, 240]).await?;
    println!("inline batch shape: {:?}", inlines.shape());

    let crossline = engine.get_crossline_slice(1200).await?;
    println!("crossline section shape: {:?}", crossline.dim());

    let depth = engine.get_data(&DataRequest::new().depths([250])).await?;
    println!("depth slice shape: {:?}", depth.shape());

    let traces = engine.get_traces(&[100, 150, 299], &[1000, 1100, 1398]).await?;
    println!("trace batch shape: {:?}", traces.shape());

    match engine.get_inline_slice(99).await {
        Ok(_) => println!("inline 99 unexpectedly present"),
        Err(e) => println!("rejected: {}", e),
    }

    Ok(())
}
