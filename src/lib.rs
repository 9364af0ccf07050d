pub mod automation; // Block-rate envelope generators
pub mod engine; // Synthesis-engine boundary
pub mod sequencing; // Note timing and the driver loop
pub mod voice; // FM voice parameter control

/// Buffer size assumed by the demo runner and tests.
pub const DEFAULT_BUFFER_SIZE: usize = 128;
/// Sample rate assumed by the demo runner and tests.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;
