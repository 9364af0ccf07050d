#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::{controls, BlockTiming, Engine, EngineError};

/*
FM Voice Control
================

Two oscillator chains, each a classic two-operator FM pair: a carrier at
frequency f, frequency-modulated by a sine running at a fixed multiple of f.
The engine does the oscillating; this type decides the numbers.

The parameterization (Chowning's):

    carrier_freq = f
    mod_speed    = f * ratio     modulator frequency tracks the carrier
    mod_depth    = f * index     peak deviation scales with the carrier

Rational ratios put the sidebands on harmonics of f (bell, brass, organ
territory); irrational ratios scatter them inharmonically. The index sets
how far the sidebands spread. Because all three values are functions of the
same f, they are only ever written together, by `update_oscillators` - a
voice whose center frequency disagreed with its modulation speed would be a
different instrument entirely.

Write timing is deliberately asymmetric:

  gain             writes through immediately (`set_gains`)
  ratio / index    stored on the voice, applied at the next
                   `update_oscillators` - i.e. at the next trigger

so changing a ratio mid-note does nothing audible until the note is
retriggered. Callers rely on that.

The voice holds no engine reference. Every side-effecting method borrows the
engine for its duration, which keeps the control space single-writer by
construction rather than by convention.
*/

/// Per-instance oscillator settings.
///
/// Each voice owns its own copy - two voices never share ratio or index
/// state, even when built from the same params value.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmVoiceParams {
    /// Modulation-speed multiplier for oscillator 1.
    pub ratio1: f32,
    /// Modulation-speed multiplier for oscillator 2.
    pub ratio2: f32,
    /// Modulation index for oscillator 1.
    pub index1: f32,
    /// Modulation index for oscillator 2.
    pub index2: f32,
    /// Output gain of oscillator 1.
    pub gain1: f32,
    /// Output gain of oscillator 2.
    pub gain2: f32,
}

impl Default for FmVoiceParams {
    fn default() -> Self {
        Self {
            ratio1: 1.0,
            ratio2: 1.0,
            index1: 1.0,
            index2: 1.0,
            gain1: 1.0,
            gain2: 1.0,
        }
    }
}

/// Attack/decay/release times for the engine-internal amplitude envelopes.
///
/// These shape the audio signal inside the engine; they are not the
/// modulation envelopes this crate ticks itself.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmpEnvTimes {
    pub attack1: f32,
    pub decay1: f32,
    pub release1: f32,
    pub attack2: f32,
    pub decay2: f32,
    pub release2: f32,
}

/// Controller for the two-oscillator FM voice.
pub struct FmVoice {
    params: FmVoiceParams,
    timing: BlockTiming,
}

impl FmVoice {
    /// Read block timing from the engine and push the initial gains.
    pub fn new<E: Engine + ?Sized>(
        engine: &mut E,
        params: FmVoiceParams,
    ) -> Result<Self, EngineError> {
        let timing = BlockTiming::from_engine(engine)?;
        let voice = Self { params, timing };
        voice.write_gains(engine)?;
        Ok(voice)
    }

    /// Block timing constants read at construction.
    pub fn timing(&self) -> BlockTiming {
        self.timing
    }

    /// Current parameter snapshot.
    pub fn params(&self) -> &FmVoiceParams {
        &self.params
    }

    /// Set both modulation-speed ratios.
    ///
    /// Deferred: takes effect at the next `update_oscillators`.
    pub fn set_ratios(&mut self, ratio1: f32, ratio2: f32) {
        self.params.ratio1 = ratio1;
        self.params.ratio2 = ratio2;
    }

    /// Set both modulation indices.
    ///
    /// Deferred: takes effect at the next `update_oscillators`.
    pub fn set_mod_indices(&mut self, index1: f32, index2: f32) {
        self.params.index1 = index1;
        self.params.index2 = index2;
    }

    /// Set both oscillator gains. Writes through immediately.
    pub fn set_gains<E: Engine + ?Sized>(
        &mut self,
        engine: &mut E,
        gain1: f32,
        gain2: f32,
    ) -> Result<(), EngineError> {
        self.params.gain1 = gain1;
        self.params.gain2 = gain2;
        self.write_gains(engine)
    }

    /// Recompute and write all frequency-derived controls for both
    /// oscillators from their fundamental pitches.
    ///
    /// Carrier frequency, modulation depth, and modulation speed always move
    /// together; this is the only place they are written.
    pub fn update_oscillators<E: Engine + ?Sized>(
        &self,
        engine: &mut E,
        f1: f32,
        f2: f32,
    ) -> Result<(), EngineError> {
        engine.write(controls::OSC1_CARRIER_FREQ, f1)?;
        engine.write(controls::OSC1_MOD_DEPTH, f1 * self.params.index1)?;
        engine.write(controls::OSC1_MOD_SPEED, f1 * self.params.ratio1)?;

        engine.write(controls::OSC2_CARRIER_FREQ, f2)?;
        engine.write(controls::OSC2_MOD_DEPTH, f2 * self.params.index2)?;
        engine.write(controls::OSC2_MOD_SPEED, f2 * self.params.ratio2)?;
        Ok(())
    }

    /// Shape the engine-internal amplitude envelopes for both oscillators.
    pub fn set_amp_envelopes<E: Engine + ?Sized>(
        &self,
        engine: &mut E,
        times: AmpEnvTimes,
    ) -> Result<(), EngineError> {
        engine.write(controls::OSC1_AMP_ATTACK, times.attack1)?;
        engine.write(controls::OSC1_AMP_DECAY, times.decay1)?;
        engine.write(controls::OSC1_AMP_RELEASE, times.release1)?;

        engine.write(controls::OSC2_AMP_ATTACK, times.attack2)?;
        engine.write(controls::OSC2_AMP_DECAY, times.decay2)?;
        engine.write(controls::OSC2_AMP_RELEASE, times.release2)?;
        Ok(())
    }

    /// Fire the shared note-on trigger read by both amplitude envelopes.
    pub fn note_on<E: Engine + ?Sized>(&self, engine: &mut E) -> Result<(), EngineError> {
        engine.write(controls::NOTE_ON, 1.0)
    }

    /// Fire the shared note-off trigger.
    pub fn note_off<E: Engine + ?Sized>(&self, engine: &mut E) -> Result<(), EngineError> {
        engine.write(controls::NOTE_OFF, 1.0)
    }

    /// Advance the engine by exactly one audio block.
    pub fn tick<E: Engine + ?Sized>(&self, engine: &mut E) -> Result<(), EngineError> {
        engine.tick()
    }

    fn write_gains<E: Engine + ?Sized>(&self, engine: &mut E) -> Result<(), EngineError> {
        engine.write(controls::OSC1_GAIN, self.params.gain1)?;
        engine.write(controls::OSC2_GAIN, self.params.gain2)
    }
}
