//! Exhaustive DEFLATE in a gzip container.
//!
//! Uses zopfli's iterative block splitting and optimal parsing instead of the
//! greedy encoder, trading a lot of CPU time for smaller `.gz` files. The gzip
//! header written by zopfli has a zero mtime and no file name, so the output
//! depends only on the input bytes.

use super::Codec;
use crate::error::{PrecompressError, Result};

/// Default zopfli iteration count, same as the reference zopfli tool
pub const DEFAULT_ITERATIONS: u64 = 15;

/// gzip-family codec backed by zopfli
#[derive(Debug, Clone)]
pub struct ZopfliCodec {
    iterations: u64,
}

impl ZopfliCodec {
    pub fn new() -> Self {
        Self::with_iterations(DEFAULT_ITERATIONS)
    }

    pub fn with_iterations(iterations: u64) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    #[cfg(feature = "zopfli")]
    fn compress_gzip(&self, data: &[u8]) -> Result<Vec<u8>> {
        use std::num::NonZeroU64;

        let mut options = zopfli::Options::default();
        if let Some(iterations) = NonZeroU64::new(self.iterations) {
            options.iteration_count = iterations;
        }

        let mut out = Vec::with_capacity(data.len() / 2 + 32);
        zopfli::compress(options, zopfli::Format::Gzip, data, &mut out).map_err(|e| {
            PrecompressError::Codec {
                codec: self.name(),
                message: e.to_string(),
            }
        })?;
        Ok(out)
    }

    #[cfg(not(feature = "zopfli"))]
    fn compress_gzip(&self, _data: &[u8]) -> Result<Vec<u8>> {
        Err(PrecompressError::MissingDependency("zopfli".to_string()))
    }
}

impl Default for ZopfliCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for ZopfliCodec {
    fn extension(&self) -> &'static str {
        "gz"
    }

    fn name(&self) -> &'static str {
        "zopfli"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.compress_gzip(data)
    }

    fn missing_dependencies(&self) -> Vec<&'static str> {
        if cfg!(feature = "zopfli") {
            Vec::new()
        } else {
            vec!["zopfli"]
        }
    }
}
