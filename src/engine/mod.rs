// Purpose: the synthesis-engine boundary - named control writes, block ticks
// Everything below this trait (oscillators, amplitude shaping, summing,
// file/device output) is the engine's business, not ours.

pub mod controls;
pub mod offline;

pub use offline::{ControlWrite, OfflineEngine};

use std::fmt;

/// The external synthesis engine, reduced to the three calls this crate needs.
///
/// The crate never sees audio samples; it pushes named scalar controls into
/// the engine and asks it to render one block at a time. Writes are
/// last-write-wins with no acknowledgment: a control written twice between
/// ticks keeps the second value.
pub trait Engine {
    /// Set a named control. Last write wins.
    fn write(&mut self, control: &str, value: f32) -> Result<(), EngineError>;

    /// Read a named control back (startup timing queries).
    fn read(&self, control: &str) -> Result<f32, EngineError>;

    /// Advance one audio block, consuming the currently-set controls.
    fn tick(&mut self) -> Result<(), EngineError>;
}

/// Block timing constants, read once from the engine at startup.
///
/// `block_duration` is the crate's time step: every clock in the driver and
/// every envelope rate derivation is calibrated against it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockTiming {
    /// Samples per block.
    pub buffer_size: usize,
    /// Samples per second.
    pub sample_rate: f32,
    /// Seconds per block: `buffer_size / sample_rate`.
    pub block_duration: f32,
}

impl BlockTiming {
    /// Query the engine for its buffer size and sample rate.
    pub fn from_engine<E: Engine + ?Sized>(engine: &E) -> Result<Self, EngineError> {
        let buffer_size = engine.read(controls::BUFFER_SIZE)?;
        let sample_rate = engine.read(controls::SAMPLE_RATE)?;

        if buffer_size < 1.0 || sample_rate <= 0.0 {
            return Err(EngineError::Backend(format!(
                "engine reported invalid timing: {} samples at {} Hz",
                buffer_size, sample_rate
            )));
        }

        Ok(Self {
            buffer_size: buffer_size as usize,
            sample_rate,
            block_duration: buffer_size / sample_rate,
        })
    }
}

/// Errors crossing the engine boundary.
///
/// There is no retry layer: every variant is fatal to the current run and
/// propagates straight up to the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The engine does not know the named control.
    UnknownControl(String),
    /// The engine failed internally while writing or ticking.
    Backend(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::UnknownControl(control) => {
                write!(f, "unknown engine control: {}", control)
            }
            EngineError::Backend(reason) => {
                write!(f, "engine failure: {}", reason)
            }
        }
    }
}

impl std::error::Error for EngineError {}
