//! In-memory engine for tests, benchmarks, and offline runs.
//!
//! `OfflineEngine` keeps the control table, counts blocks, and records every
//! write tagged with the number of blocks rendered when it landed. The trace
//! is what lets tests assert the write-then-consume ordering: a write
//! recorded at block `n` is consumed by tick `n + 1`.

use std::collections::HashMap;

use super::{controls, Engine, EngineError};

/// One recorded control write.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlWrite {
    /// Blocks rendered when the write landed. The next tick consumes it.
    pub block: u64,
    /// Control name.
    pub control: String,
    /// Value written.
    pub value: f32,
}

/// A stand-in synthesis engine that renders nothing but remembers everything.
pub struct OfflineEngine {
    table: HashMap<String, f32>,
    blocks: u64,
    trace: Vec<ControlWrite>,
    trace_enabled: bool,
}

impl OfflineEngine {
    /// Create an engine advertising the given block timing.
    pub fn new(buffer_size: usize, sample_rate: f32) -> Self {
        let mut table = HashMap::new();
        table.insert(controls::BUFFER_SIZE.to_string(), buffer_size as f32);
        table.insert(controls::SAMPLE_RATE.to_string(), sample_rate);

        Self {
            table,
            blocks: 0,
            trace: Vec::new(),
            trace_enabled: true,
        }
    }

    /// Disable the write trace (long offline runs, benchmarks).
    pub fn set_trace(&mut self, enabled: bool) {
        self.trace_enabled = enabled;
    }

    /// Number of blocks rendered so far.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Current value of a control, if it has ever been written.
    pub fn get(&self, control: &str) -> Option<f32> {
        self.table.get(control).copied()
    }

    /// The full write trace, in arrival order.
    pub fn trace(&self) -> &[ControlWrite] {
        &self.trace
    }

    /// Writes recorded for a single control, in arrival order.
    pub fn writes_to<'a>(&'a self, control: &'a str) -> impl Iterator<Item = &'a ControlWrite> {
        self.trace.iter().filter(move |w| w.control == control)
    }
}

impl Engine for OfflineEngine {
    fn write(&mut self, control: &str, value: f32) -> Result<(), EngineError> {
        self.table.insert(control.to_string(), value);
        if self.trace_enabled {
            self.trace.push(ControlWrite {
                block: self.blocks,
                control: control.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn read(&self, control: &str) -> Result<f32, EngineError> {
        self.table
            .get(control)
            .copied()
            .ok_or_else(|| EngineError::UnknownControl(control.to_string()))
    }

    fn tick(&mut self) -> Result<(), EngineError> {
        self.blocks += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_of_unknown_control_fails() {
        let engine = OfflineEngine::new(128, 44_100.0);
        assert!(matches!(
            engine.read("osc3/does_not_exist"),
            Err(EngineError::UnknownControl(_))
        ));
    }

    #[test]
    fn last_write_wins() {
        let mut engine = OfflineEngine::new(128, 44_100.0);
        engine.write(controls::OSC1_GAIN, 0.5).unwrap();
        engine.write(controls::OSC1_GAIN, 0.9).unwrap();

        assert_eq!(engine.read(controls::OSC1_GAIN).unwrap(), 0.9);
        assert_eq!(engine.writes_to(controls::OSC1_GAIN).count(), 2);
    }

    #[test]
    fn trace_records_block_indices() {
        let mut engine = OfflineEngine::new(128, 44_100.0);
        engine.write(controls::OSC1_MOD_DEPTH, 1.0).unwrap();
        engine.tick().unwrap();
        engine.write(controls::OSC1_MOD_DEPTH, 2.0).unwrap();

        let blocks: Vec<u64> = engine
            .writes_to(controls::OSC1_MOD_DEPTH)
            .map(|w| w.block)
            .collect();
        assert_eq!(blocks, vec![0, 1]);
    }

    #[test]
    fn disabled_trace_still_updates_table() {
        let mut engine = OfflineEngine::new(128, 44_100.0);
        engine.set_trace(false);
        engine.write(controls::OSC2_GAIN, 0.2).unwrap();

        assert!(engine.trace().is_empty());
        assert_eq!(engine.read(controls::OSC2_GAIN).unwrap(), 0.2);
    }
}
