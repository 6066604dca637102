//! Codec execution contexts and their pool.
//!
//! A [`CodecContext`] binds one [`CodecConfig`] to a codec engine and a
//! bounded rayon worker pool. Contexts are expensive to build, so the
//! [`CodecContextManager`] keeps one per distinct config and hands out shared
//! handles guarded by a mutex (one writer at a time).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rayon::prelude::*;
use tracing::{debug, info};

use super::{encoder_for, pad_layer, BlockCodec, RgbaBand};
use crate::config::CodecConfig;
use crate::error::{CodecError, CodecResult};
use crate::grid::BlockGrid;
use crate::volume::{BitDepth, PixelVolume, CHANNELS};

/// Bands per worker thread, for load balancing across uneven rows.
const BANDS_PER_THREAD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvironmentFault {
    Cpu,
    FloatMode,
}

/// Run the process-wide environment check (computed once).
///
/// # Errors
///
/// - `UnsupportedCpu` if the CPU lacks the SIMD baseline the encoders need
/// - `UnsafeFloatMode` if float arithmetic does not round to nearest
pub fn check_environment() -> CodecResult<()> {
    static CHECK: OnceLock<Option<EnvironmentFault>> = OnceLock::new();

    match CHECK.get_or_init(probe_environment) {
        None => Ok(()),
        Some(EnvironmentFault::Cpu) => Err(CodecError::UnsupportedCpu),
        Some(EnvironmentFault::FloatMode) => Err(CodecError::UnsafeFloatMode),
    }
}

fn probe_environment() -> Option<EnvironmentFault> {
    if !cpu_supported() {
        return Some(EnvironmentFault::Cpu);
    }
    if !float_rounds_to_nearest() {
        return Some(EnvironmentFault::FloatMode);
    }
    debug!("Codec environment check passed");
    None
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn cpu_supported() -> bool {
    is_x86_feature_detected!("sse2")
}

#[cfg(target_arch = "aarch64")]
fn cpu_supported() -> bool {
    // NEON is part of the aarch64 baseline
    true
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
fn cpu_supported() -> bool {
    false
}

/// 2.51 + 1.5 * 2^23 loses its fraction; round-to-nearest yields 3.0.
#[allow(clippy::float_cmp)]
fn float_rounds_to_nearest() -> bool {
    let p = std::hint::black_box(2.51f32);
    let magic = std::hint::black_box(12_582_912.0f32);
    (p + magic) - magic == 3.0
}

/// Codec engine plus worker pool bound to one config.
pub struct CodecContext {
    config: CodecConfig,
    codec: Box<dyn BlockCodec>,
    pool: rayon::ThreadPool,
}

impl CodecContext {
    /// Create a context for `config`.
    ///
    /// # Errors
    ///
    /// - `UnsupportedCpu` / `UnsafeFloatMode` from the environment check
    /// - `BadBlockSize` / `InvalidConfig` from validation
    /// - `ContextCreation` if the worker pool cannot be started
    pub fn create(config: CodecConfig) -> CodecResult<Self> {
        check_environment()?;
        config.validate()?;
        let codec = encoder_for(&config)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.thread_count())
            .thread_name(|i| format!("texture-encode-{}", i))
            .build()
            .map_err(|e| CodecError::ContextCreation(e.to_string()))?;

        debug!(
            format = %config.format(),
            footprint = %config.footprint(),
            effort = config.effort(),
            threads = config.thread_count(),
            "Created codec context"
        );
        Ok(Self {
            config,
            codec,
            pool,
        })
    }

    /// Get the config this context was built for.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode an 8-bit RGBA volume into `out`.
    ///
    /// `out` must be exactly the grid's output size. Layers are written
    /// z-major, then block rows, then block columns.
    ///
    /// # Errors
    ///
    /// `EncodeFailed` if the volume is not 8-bit, `out` has the wrong size,
    /// or any band fails.
    pub fn encode(&self, volume: &PixelVolume, out: &mut [u8]) -> CodecResult<()> {
        if volume.bit_depth() != BitDepth::U8 {
            return Err(CodecError::EncodeFailed {
                reason: "codec engines take 8-bit RGBA input".to_string(),
            });
        }

        let footprint = self.config.footprint();
        let (width, height) = (volume.width(), volume.height());
        let grid = BlockGrid::for_format(
            width,
            height,
            volume.depth(),
            self.config.format(),
            footprint,
        );
        if out.len() != grid.output_byte_size() {
            return Err(CodecError::EncodeFailed {
                reason: format!(
                    "output buffer holds {} bytes, grid needs {}",
                    out.len(),
                    grid.output_byte_size()
                ),
            });
        }

        let padded_width = grid.blocks_x as u32 * footprint.x;
        let padded_height = grid.blocks_y as u32 * footprint.y;
        let texel_rows_per_block = footprint.y as usize;
        let band_rows = grid
            .blocks_y
            .div_ceil(self.config.thread_count() * BANDS_PER_THREAD)
            .max(1);
        let band_out_bytes = band_rows * grid.row_byte_size();
        let block_row_texel_bytes = texel_rows_per_block * padded_width as usize * CHANNELS;
        let swizzle = self.config.swizzle();

        for (z, layer_out) in out.chunks_mut(grid.layer_byte_size()).enumerate() {
            let mut padded = pad_layer(
                volume.layer(z as u32),
                width,
                height,
                padded_width,
                padded_height,
            );
            if !swizzle.is_identity() {
                swizzle.apply(&mut padded);
            }

            self.pool.install(|| {
                layer_out
                    .par_chunks_mut(band_out_bytes)
                    .enumerate()
                    .try_for_each(|(band, chunk)| {
                        let first_row = band * band_rows;
                        let rows = chunk.len() / grid.row_byte_size();
                        let start = first_row * block_row_texel_bytes;
                        let end = start + rows * block_row_texel_bytes;
                        let rgba = RgbaBand {
                            data: &padded[start..end],
                            width: padded_width,
                            height: (rows * texel_rows_per_block) as u32,
                        };
                        self.codec.encode_band(&rgba, chunk)
                    })
            })?;
        }
        Ok(())
    }

    /// Release the context and its worker pool.
    pub fn destroy(self) {
        debug!(format = %self.config.format(), "Destroyed codec context");
    }
}

impl fmt::Debug for CodecContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecContext")
            .field("config", &self.config)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

/// Shared handle to a pooled context.
pub type SharedContext = Arc<Mutex<CodecContext>>;

/// Pool of codec contexts keyed by config.
///
/// # Example
///
/// ```
/// use texture2dstudio::{CodecConfig, CodecContextManager, TextureFormat};
///
/// let manager = CodecContextManager::new();
/// let config = CodecConfig::new(TextureFormat::Etc1);
///
/// let first = manager.acquire(&config).unwrap();
/// let second = manager.acquire(&config).unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// assert_eq!(manager.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CodecContextManager {
    contexts: Mutex<HashMap<CodecConfig, SharedContext>>,
}

impl CodecContextManager {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the context for `config`, creating it on first use.
    pub fn acquire(&self, config: &CodecConfig) -> CodecResult<SharedContext> {
        let mut contexts = self.contexts.lock();
        if let Some(context) = contexts.get(config) {
            return Ok(Arc::clone(context));
        }

        let context = Arc::new(Mutex::new(CodecContext::create(*config)?));
        contexts.insert(*config, Arc::clone(&context));
        info!(
            format = %config.format(),
            pooled = contexts.len(),
            "Codec context added to pool"
        );
        Ok(context)
    }

    /// Drop the pooled context for `config`. Returns true if one existed.
    ///
    /// Handles still held by callers keep the context alive until dropped.
    pub fn release(&self, config: &CodecConfig) -> bool {
        self.contexts.lock().remove(config).is_some()
    }

    /// Drop every pooled context.
    pub fn clear(&self) {
        self.contexts.lock().clear();
    }

    /// Number of pooled contexts.
    pub fn len(&self) -> usize {
        self.contexts.lock().len()
    }

    /// Returns true if no context is pooled.
    pub fn is_empty(&self) -> bool {
        self.contexts.lock().is_empty()
    }
}
