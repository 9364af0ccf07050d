use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::{Engine, EngineError};

/*
Block-Rate ADSR Generator
=========================

This is the envelope that automates engine parameters (modulation depth,
mostly). It does not touch audio: once per block it advances a scalar and
writes `value * scale` into its bound control.

Vocabulary
----------

  value       Current output, 0.0 to 1.0 before scaling.

  target      Where the current ramp is headed. 1.0 during attack, the
              sustain level during decay, effectively 0.0 during release.

  time_step   Seconds per block (buffer_size / sample_rate). The envelope
              only ever moves once per block, so every rate is a per-block
              increment.

  scale       Output multiplier. A modulation-depth envelope for a 250 Hz
              carrier with index 2.66 uses scale = 665, so a full-swing
              envelope sweeps the depth control from 0 to 665 Hz.


The Math: Durations to Per-Block Rates
--------------------------------------

Rates are derived once, at construction or reset, not per tick:

    arate = 1 / (attack_time / time_step)
    drate = (1 - sustain_level) / (decay_time / time_step)
    rrate = sustain_level / (release_time / time_step)

Each phase covers its full excursion in exactly the requested wall-clock
time, quantized to blocks. Example at 128 samples / 44.1 kHz
(time_step ≈ 2.9 ms): attack_time = 0.03 s gives arate ≈ 0.0968, so the
attack tops out after ceil(0.03 / 0.0029) = 11 blocks.

A phase duration of zero would divide by zero here, which is why
construction rejects non-positive durations outright. The sustain level is
bounded away from zero for the same reason in disguise: sustain_level = 0
gives rrate = 0, and a release entered from any positive value (a note_off
interrupting attack or decay) would then never reach 0.


The State Machine
-----------------

    Off ──note_on()──> Attack ──value≥1──> Decay ──value≤sustain──> Sustain
                          │                  │                         │
                          └────── note_off() from any state ──────────┘
                                             │
                                          Release ──value≤0──> End

note_off() is unconditional: it moves to Release from whatever state the
envelope is in, and the release ramp always runs at rrate from the current
value. rrate is derived from the sustain level, so a release that interrupts
the attack takes longer (or shorter) than release_time in proportion to
value / sustain_level. That glide is inherited behavior, kept as-is.

note_on() is a hard retrigger: value snaps back to 0 no matter where the
envelope was. No legato blending.

End differs from Off only in history; both hold at 0 and wait for note_on().
Reaching End resets target to 1 so the instance is immediately reusable.

Every tick writes through to the bound control, holds included. Sustain
re-writes the same value each block, which is idempotent by the engine's
last-write-wins rule and keeps the control space consistent even if some
other writer scribbled over it between blocks.
*/

/// The current phase of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Off,     // Never triggered (or reset); holds at 0
    Attack,  // Ramping 0 -> 1
    Decay,   // Ramping 1 -> sustain level
    Sustain, // Holding until note_off()
    Release, // Ramping current value -> 0
    End,     // Release finished; holds at 0 until retriggered
}

/// Timing and scaling parameters for one envelope.
///
/// Defaults give a snappy 30 ms attack into an 85% sustain, matching the
/// stock modulation-depth shape used by the demo runner.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeParams {
    /// Seconds to ramp 0 -> 1. Must be > 0.
    pub attack_time: f32,
    /// Seconds to ramp 1 -> sustain level. Must be > 0.
    pub decay_time: f32,
    /// Seconds to ramp the sustain level -> 0. Must be > 0.
    pub release_time: f32,
    /// Level held after decay. Must be within (0.0, 1.0]; the release rate
    /// derives from it, so zero would stall the release ramp.
    pub sustain_level: f32,
    /// Output multiplier applied on every write.
    pub scale: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            attack_time: 0.03,
            decay_time: 0.25,
            release_time: 0.1,
            sustain_level: 0.85,
            scale: 1.0,
        }
    }
}

impl EnvelopeParams {
    pub fn with_attack(mut self, seconds: f32) -> Self {
        self.attack_time = seconds;
        self
    }

    pub fn with_decay(mut self, seconds: f32) -> Self {
        self.decay_time = seconds;
        self
    }

    pub fn with_release(mut self, seconds: f32) -> Self {
        self.release_time = seconds;
        self
    }

    pub fn with_sustain(mut self, level: f32) -> Self {
        self.sustain_level = level;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// A re-triggerable ADSR generator bound to one engine control.
pub struct EnvelopeGenerator {
    // Shape (validated; rates below stay in sync with these)
    params: EnvelopeParams,
    time_step: f32,

    // Derived per-block rates (fixed until the next reset)
    arate: f32,
    drate: f32,
    rrate: f32,

    // Runtime state (changes once per block while active)
    state: EnvelopeState,
    value: f32,
    target: f32,

    // Where the output goes
    control: String,
}

impl EnvelopeGenerator {
    /// Build an envelope writing to `control`, with rates derived from
    /// `time_step` (seconds per block).
    pub fn new(
        params: EnvelopeParams,
        time_step: f32,
        control: impl Into<String>,
    ) -> Result<Self, EnvelopeError> {
        let (arate, drate, rrate) = derive_rates(&params, time_step)?;

        Ok(Self {
            params,
            time_step,
            arate,
            drate,
            rrate,
            state: EnvelopeState::Off,
            value: 0.0,
            target: 1.0,
            control: control.into(),
        })
    }

    /// Re-shape the envelope in place: new rates, back to `Off` at zero.
    ///
    /// This is the retrigger path the driver uses between notes - the
    /// instance and its control binding stay stable, only the shape changes.
    pub fn reset(&mut self, params: EnvelopeParams) -> Result<(), EnvelopeError> {
        let (arate, drate, rrate) = derive_rates(&params, self.time_step)?;

        self.params = params;
        self.arate = arate;
        self.drate = drate;
        self.rrate = rrate;
        self.state = EnvelopeState::Off;
        self.value = 0.0;
        self.target = 1.0;
        Ok(())
    }

    /// Gate high: restart the attack from zero, whatever was in flight.
    pub fn note_on(&mut self) {
        self.state = EnvelopeState::Attack;
        self.value = 0.0;
        self.target = 1.0;
    }

    /// Gate low: start releasing from the current value.
    ///
    /// Valid in every state. From `Off` or `End` the value is already 0, so
    /// the very next tick lands in `End` - well-formed, not an error.
    pub fn note_off(&mut self) {
        self.state = EnvelopeState::Release;
    }

    /// Advance one block and write `value * scale` to the bound control.
    ///
    /// The write happens on every tick, holds included.
    pub fn tick<E: Engine + ?Sized>(&mut self, engine: &mut E) -> Result<(), EngineError> {
        match self.state {
            EnvelopeState::Attack => {
                self.value += self.arate;
                if self.value >= self.target {
                    self.value = self.target;
                    self.target = self.params.sustain_level;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                self.value -= self.drate;
                if self.value <= self.target {
                    self.value = self.target;
                    self.state = EnvelopeState::Sustain;
                }
            }
            EnvelopeState::Release => {
                self.value -= self.rrate;
                if self.value <= 0.0 {
                    self.value = 0.0;
                    self.state = EnvelopeState::End;
                    self.target = 1.0; // ready for the next note_on()
                }
            }
            // Holds: Off and End sit at 0, Sustain at the sustain level
            EnvelopeState::Off | EnvelopeState::Sustain | EnvelopeState::End => {}
        }

        engine.write(&self.control, self.value * self.params.scale)
    }

    /// Current pre-scale value (0.0 - 1.0).
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Current phase.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// The control this envelope writes to.
    pub fn control(&self) -> &str {
        &self.control
    }

    /// The parameters currently in effect.
    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }
}

/// Turn phase durations into per-block increments, rejecting shapes that
/// would divide by zero, overshoot, or stall.
fn derive_rates(params: &EnvelopeParams, time_step: f32) -> Result<(f32, f32, f32), EnvelopeError> {
    if time_step <= 0.0 {
        return Err(EnvelopeError::NonPositiveTimeStep(time_step));
    }
    for (phase, seconds) in [
        ("attack", params.attack_time),
        ("decay", params.decay_time),
        ("release", params.release_time),
    ] {
        if seconds <= 0.0 {
            return Err(EnvelopeError::NonPositivePhase { phase, seconds });
        }
    }
    if params.sustain_level <= 0.0 || params.sustain_level > 1.0 {
        return Err(EnvelopeError::SustainOutOfRange(params.sustain_level));
    }

    let arate = 1.0 / (params.attack_time / time_step);
    let drate = (1.0 - params.sustain_level) / (params.decay_time / time_step);
    let rrate = params.sustain_level / (params.release_time / time_step);
    Ok((arate, drate, rrate))
}

/// Configuration errors caught at construction or reset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnvelopeError {
    /// A phase duration was zero or negative; rates would divide by zero.
    NonPositivePhase { phase: &'static str, seconds: f32 },
    /// The block duration was zero or negative.
    NonPositiveTimeStep(f32),
    /// Sustain level outside (0.0, 1.0]. Zero is out: the release rate is
    /// proportional to the sustain level, and a zero rate never finishes.
    SustainOutOfRange(f32),
}

impl fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvelopeError::NonPositivePhase { phase, seconds } => {
                write!(f, "{} time must be positive, got {} s", phase, seconds)
            }
            EnvelopeError::NonPositiveTimeStep(step) => {
                write!(f, "time step must be positive, got {} s", step)
            }
            EnvelopeError::SustainOutOfRange(level) => {
                write!(f, "sustain level must be within (0.0, 1.0], got {}", level)
            }
        }
    }
}

impl std::error::Error for EnvelopeError {}
