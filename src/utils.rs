//! Utility functions

use crate::error::{Result, SliceError};

/// Bytes per stored sample (IEEE 32-bit float)
pub const SAMPLE_SIZE: usize = std::mem::size_of::<f32>();

/// Decode little-endian `f32` samples
pub fn bytes_to_samples(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % SAMPLE_SIZE != 0 {
        return Err(SliceError::InvalidFormat(format!(
            "Byte length {} not aligned with {}-byte samples",
            bytes.len(),
            SAMPLE_SIZE
        )));
    }

    Ok(bytes
        .chunks_exact(SAMPLE_SIZE)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Encode samples as little-endian bytes
pub fn samples_to_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * SAMPLE_SIZE);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Calculate checksum (CRC32) for data
pub fn calculate_checksum(data: &[u8]) -> u32 {
    let mut crc = 0xFFFFFFFFu32;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
        }
    }

    !crc
}

/// Whether `data` hashes to `expected`
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    calculate_checksum(data) == expected
}

/// Format byte size in human-readable form
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Path of the chunk holding the inline at `position`
pub fn chunk_path(position: usize) -> String {
    format!("traces/{:08}.chunk", position)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_conversion() {
        let samples = vec![1.0f32, -2.5, 0.0, 1e-7];
        let bytes = samples_to_bytes(&samples);
        assert_eq!(bytes.len(), samples.len() * SAMPLE_SIZE);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(bytes_to_samples(&bytes).unwrap(), samples);
    }

    #[test]
    fn test_misaligned_bytes() {
        assert!(matches!(
            bytes_to_samples(&[0u8; 7]),
            Err(SliceError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_checksum() {
        let data = b"Hello, world!";
        let checksum = calculate_checksum(data);
        assert!(verify_checksum(data, checksum));
        assert!(!verify_checksum(data, checksum + 1));
        assert_eq!(calculate_checksum(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1048576), "1.00 MB");
    }

    #[test]
    fn test_chunk_path() {
        assert_eq!(chunk_path(0), "traces/00000000.chunk");
        assert_eq!(chunk_path(42), "traces/00000042.chunk");
    }
}
