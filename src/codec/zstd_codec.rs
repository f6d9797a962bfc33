//! Zstandard at the maximum standard level.
//!
//! Every frame carries the content size and a checksum. The window log is
//! sized from the input length so small assets don't pay for a 128 MiB window
//! on the decoding side.

use super::Codec;
use crate::error::{PrecompressError, Result};

/// Highest standard (non-ultra-negative) zstd level
pub const MAX_LEVEL: i32 = 22;

const MIN_WINDOW_LOG: u32 = 10;
const MAX_WINDOW_LOG: u32 = 27;

/// Zstandard codec
#[derive(Debug, Clone)]
pub struct ZstdCodec {
    level: i32,
    workers: u32,
}

impl ZstdCodec {
    /// One zstdmt worker per encoder: files already run in parallel on the
    /// pipeline's worker pool
    pub fn new() -> Self {
        Self {
            level: MAX_LEVEL,
            workers: 1,
        }
    }

    /// Encoder with its own zstdmt worker threads, for standalone use
    pub fn with_workers(workers: u32) -> Self {
        Self {
            level: MAX_LEVEL,
            workers: workers.max(1),
        }
    }

    #[cfg(feature = "zstd")]
    fn compress_frame(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        use std::io::Write;

        let mut encoder =
            zstd::stream::write::Encoder::new(Vec::with_capacity(data.len() / 2 + 32), self.level)?;
        encoder.include_checksum(true)?;
        encoder.include_contentsize(true)?;
        encoder.set_pledged_src_size(Some(data.len() as u64))?;
        encoder.window_log(window_log_for(data.len()))?;
        // Output is identical for any worker count >= 1
        encoder.multithread(self.workers)?;
        encoder.write_all(data)?;
        encoder.finish()
    }

    #[cfg(not(feature = "zstd"))]
    fn compress_frame(&self, _data: &[u8]) -> std::io::Result<Vec<u8>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "zstd support not compiled in",
        ))
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest window that covers the whole input, clamped to zstd's limits
pub fn window_log_for(len: usize) -> u32 {
    let bits = usize::BITS - len.saturating_sub(1).leading_zeros();
    bits.clamp(MIN_WINDOW_LOG, MAX_WINDOW_LOG)
}

impl Codec for ZstdCodec {
    fn extension(&self) -> &'static str {
        "zst"
    }

    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if !self.is_available() {
            return Err(PrecompressError::MissingDependency("zstd".to_string()));
        }
        self.compress_frame(data).map_err(|e| PrecompressError::Codec {
            codec: self.name(),
            message: e.to_string(),
        })
    }

    fn missing_dependencies(&self) -> Vec<&'static str> {
        if cfg!(feature = "zstd") {
            Vec::new()
        } else {
            vec!["zstd"]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_log_for() {
        assert_eq!(window_log_for(0), MIN_WINDOW_LOG);
        assert_eq!(window_log_for(500), MIN_WINDOW_LOG);
        assert_eq!(window_log_for(1024), 10);
        assert_eq!(window_log_for(1025), 11);
        assert_eq!(window_log_for(1 << 20), 20);
        assert_eq!(window_log_for(usize::MAX), MAX_WINDOW_LOG);
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn test_frame_roundtrips_and_is_deterministic() {
        let codec = ZstdCodec::new();
        let data = b"function main() { return 42; }\n".repeat(200);

        let first = codec.compress(&data).unwrap();
        let second = codec.compress(&data).unwrap();
        assert_eq!(first, second);
        assert!(first.len() < data.len());
        assert_eq!(zstd::decode_all(&first[..]).unwrap(), data);
    }

    #[test]
    fn test_default_encoder_uses_single_worker() {
        assert_eq!(ZstdCodec::new().workers, 1);
        assert_eq!(ZstdCodec::with_workers(0).workers, 1);
        assert_eq!(ZstdCodec::with_workers(4).workers, 4);
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn test_worker_count_does_not_change_output() {
        let data = b".btn { padding: 4px 8px; border: 0; }\n".repeat(300);
        assert_eq!(
            ZstdCodec::new().compress(&data).unwrap(),
            ZstdCodec::with_workers(4).compress(&data).unwrap()
        );
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn test_frame_has_checksum_flag() {
        let compressed = ZstdCodec::new().compress(b"hello hello hello hello").unwrap();
        assert_eq!(&compressed[..4], &[0x28, 0xb5, 0x2f, 0xfd]);
        // Frame header descriptor, bit 2 = content checksum flag
        assert_ne!(compressed[4] & 0b100, 0);
    }
}
