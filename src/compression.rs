//! Chunk codecs: encode and decode blocks of `f32` trace samples

use crate::error::{Result, SliceError};
use crate::utils::{bytes_to_samples, samples_to_bytes, SAMPLE_SIZE};
use flate2::read::{DeflateDecoder, DeflateEncoder};
use flate2::Compression as FlateCompression;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Compression methods for stored chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CompressionMethod {
    /// Raw little-endian samples
    None = 0,
    /// Deflate/ZIP compression
    Deflate = 1,
    /// Run-length encoding over sample values
    Rle = 2,
    /// Zstandard compression
    Zstd = 3,
}

impl CompressionMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CompressionMethod::None),
            1 => Some(CompressionMethod::Deflate),
            2 => Some(CompressionMethod::Rle),
            3 => Some(CompressionMethod::Zstd),
            _ => None,
        }
    }

    /// Whether a stored chunk can be addressed by byte offset
    pub fn is_random_access(&self) -> bool {
        matches!(self, CompressionMethod::None)
    }
}

/// Compression level (0-9, where 0 is no compression and 9 is maximum)
#[derive(Debug, Clone, Copy)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    pub fn fast() -> Self {
        Self(1)
    }

    pub fn best() -> Self {
        Self(9)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(6)
    }
}

/// Encodes a chunk of samples to bytes and back
pub trait ChunkCodec: Send + Sync {
    fn encode(&self, samples: &[f32], level: CompressionLevel) -> Result<Vec<u8>>;

    /// Decode `data`, failing unless it yields exactly `expected_samples`
    fn decode(&self, data: &[u8], expected_samples: usize) -> Result<Vec<f32>>;

    fn method(&self) -> CompressionMethod;
}

/// Read at most one sample past `expected_samples`, so an oversized stream
/// fails the count check without being inflated in full
fn read_bounded(reader: impl Read, expected_samples: usize) -> Result<Vec<f32>> {
    let limit = (expected_samples + 1) * SAMPLE_SIZE;
    let mut raw = Vec::with_capacity(expected_samples * SAMPLE_SIZE);
    reader
        .take(limit as u64)
        .read_to_end(&mut raw)
        .map_err(|e| SliceError::Decompression(e.to_string()))?;
    check_count(bytes_to_samples(&raw)?, expected_samples)
}

fn check_count(samples: Vec<f32>, expected: usize) -> Result<Vec<f32>> {
    if samples.len() != expected {
        return Err(SliceError::Decompression(format!(
            "expected {} samples, decoded {}",
            expected,
            samples.len()
        )));
    }
    Ok(samples)
}

#[derive(Debug, Default)]
pub struct RawCodec;

impl ChunkCodec for RawCodec {
    fn encode(&self, samples: &[f32], _level: CompressionLevel) -> Result<Vec<u8>> {
        Ok(samples_to_bytes(samples))
    }

    fn decode(&self, data: &[u8], expected_samples: usize) -> Result<Vec<f32>> {
        check_count(bytes_to_samples(data)?, expected_samples)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::None
    }
}

#[derive(Debug, Default)]
pub struct DeflateCodec;

impl ChunkCodec for DeflateCodec {
    fn encode(&self, samples: &[f32], level: CompressionLevel) -> Result<Vec<u8>> {
        let raw = samples_to_bytes(samples);
        let mut encoder =
            DeflateEncoder::new(raw.as_slice(), FlateCompression::new(level.value() as u32));
        let mut compressed = Vec::new();
        encoder
            .read_to_end(&mut compressed)
            .map_err(|e| SliceError::Compression(e.to_string()))?;
        Ok(compressed)
    }

    fn decode(&self, data: &[u8], expected_samples: usize) -> Result<Vec<f32>> {
        read_bounded(DeflateDecoder::new(data), expected_samples)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::Deflate
    }
}

#[derive(Debug, Default)]
pub struct ZstdCodec;

impl ChunkCodec for ZstdCodec {
    fn encode(&self, samples: &[f32], level: CompressionLevel) -> Result<Vec<u8>> {
        zstd::encode_all(samples_to_bytes(samples).as_slice(), level.value() as i32)
            .map_err(|e| SliceError::Compression(e.to_string()))
    }

    fn decode(&self, data: &[u8], expected_samples: usize) -> Result<Vec<f32>> {
        let decoder = zstd::stream::read::Decoder::new(data)
            .map_err(|e| SliceError::Decompression(e.to_string()))?;
        read_bounded(decoder, expected_samples)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::Zstd
    }
}

/// Run-length codec over sample bit patterns.
///
/// Each run is a little-endian `u16` count followed by the `f32` value, so
/// muted zones and dead traces collapse to a few bytes.
#[derive(Debug, Default)]
pub struct RleCodec;

const RLE_RECORD: usize = 6;

impl ChunkCodec for RleCodec {
    fn encode(&self, samples: &[f32], _level: CompressionLevel) -> Result<Vec<u8>> {
        let mut encoded = Vec::new();
        let mut i = 0;

        while i < samples.len() {
            let bits = samples[i].to_bits();
            let mut count = 1usize;
            while i + count < samples.len()
                && samples[i + count].to_bits() == bits
                && count < u16::MAX as usize
            {
                count += 1;
            }

            encoded.extend_from_slice(&(count as u16).to_le_bytes());
            encoded.extend_from_slice(&bits.to_le_bytes());
            i += count;
        }

        Ok(encoded)
    }

    fn decode(&self, data: &[u8], expected_samples: usize) -> Result<Vec<f32>> {
        if data.len() % RLE_RECORD != 0 {
            return Err(SliceError::Decompression(format!(
                "RLE data length {} is not a multiple of {}",
                data.len(),
                RLE_RECORD
            )));
        }

        let mut samples = Vec::with_capacity(expected_samples);
        for record in data.chunks_exact(RLE_RECORD) {
            let count = u16::from_le_bytes([record[0], record[1]]) as usize;
            let value = f32::from_bits(u32::from_le_bytes([
                record[2], record[3], record[4], record[5],
            ]));
            if samples.len() + count > expected_samples {
                return Err(SliceError::Decompression(format!(
                    "RLE runs exceed {} samples",
                    expected_samples
                )));
            }
            samples.extend(std::iter::repeat(value).take(count));
        }

        check_count(samples, expected_samples)
    }

    fn method(&self) -> CompressionMethod {
        CompressionMethod::Rle
    }
}

/// Get a codec for a given method
pub fn get_codec(method: CompressionMethod) -> Box<dyn ChunkCodec> {
    match method {
        CompressionMethod::None => Box::new(RawCodec),
        CompressionMethod::Deflate => Box::new(DeflateCodec),
        CompressionMethod::Rle => Box::new(RleCodec),
        CompressionMethod::Zstd => Box::new(ZstdCodec),
    }
}
