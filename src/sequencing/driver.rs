//! Driver - the block-stepped loop that keeps the voice and its
//! modulation envelopes in lock-step.
//!
//! One driver owns the engine, the voice, and one envelope per modulation
//! lane. It is the sole scheduler: per block it ticks the voice (the engine
//! consumes the control space and renders), then ticks every envelope (each
//! one writes its next value). Envelope writes for block N therefore land
//! strictly between the voice ticks for N and N+1 - write-then-consume, in
//! that order, always.

use std::fmt;

use crate::automation::{EnvelopeError, EnvelopeGenerator, EnvelopeParams};
use crate::engine::{Engine, EngineError};
use crate::sequencing::Score;
use crate::voice::{AmpEnvTimes, FmVoice, FmVoiceParams};

/// Which oscillator's pitch scales a lane's envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchSource {
    /// The note's fundamental (oscillator 1).
    Primary,
    /// The derived pitch (oscillator 2, fundamental x secondary ratio).
    Secondary,
}

/// Recipe for one modulation-depth envelope binding.
///
/// Per note, the lane's envelope is reset with
/// `scale = source pitch * depth`, so the depth sweep stays proportional
/// to the frequency it modulates - the same relation `update_oscillators`
/// applies to the static depth controls.
#[derive(Debug, Clone, PartialEq)]
pub struct ModLane {
    control: String,
    params: EnvelopeParams,
    depth: f32,
    source: PitchSource,
}

impl ModLane {
    pub fn new(
        control: impl Into<String>,
        params: EnvelopeParams,
        depth: f32,
        source: PitchSource,
    ) -> Self {
        Self {
            control: control.into(),
            params,
            depth,
            source,
        }
    }
}

struct Lane {
    spec: ModLane,
    env: EnvelopeGenerator,
}

/// Sequencer for a [`Score`] over one FM voice.
pub struct Driver<E: Engine> {
    engine: E,
    voice: FmVoice,
    /// Oscillator 2 pitch = fundamental x this ratio, recomputed per note.
    secondary_ratio: f32,
    lanes: Vec<Lane>,
}

impl<E: Engine> Driver<E> {
    /// Build the voice and one envelope per lane against the engine's
    /// block timing.
    pub fn new(
        mut engine: E,
        voice_params: FmVoiceParams,
        secondary_ratio: f32,
        lanes: Vec<ModLane>,
    ) -> Result<Self, DriverError> {
        let voice = FmVoice::new(&mut engine, voice_params)?;
        let time_step = voice.timing().block_duration;

        let lanes = lanes
            .into_iter()
            .map(|spec| {
                let env = EnvelopeGenerator::new(spec.params, time_step, spec.control.clone())?;
                Ok(Lane { spec, env })
            })
            .collect::<Result<Vec<_>, EnvelopeError>>()?;

        Ok(Self {
            engine,
            voice,
            secondary_ratio,
            lanes,
        })
    }

    /// Play the whole score, one note after another, no overlap.
    ///
    /// Any engine failure aborts the remaining sequence.
    pub fn play(&mut self, score: &Score) -> Result<(), DriverError> {
        let hold = score.hold() as f64;
        let release_at = score.release_at() as f64;
        let step = self.voice.timing().block_duration as f64;

        for &pitch in score.pitches() {
            self.trigger(pitch)?;

            let mut clock = 0.0_f64;
            let mut released = false;

            while clock < hold {
                // Voice first: the engine consumes last block's control
                // writes. Then the envelopes write the values the *next*
                // tick will consume.
                self.voice.tick(&mut self.engine)?;
                for lane in &mut self.lanes {
                    lane.env.tick(&mut self.engine)?;
                }

                // Edge-triggered note-off, once per note
                if !released && clock > release_at {
                    self.voice.note_off(&mut self.engine)?;
                    for lane in &mut self.lanes {
                        lane.env.note_off();
                    }
                    released = true;
                }

                clock += step;
            }
        }
        Ok(())
    }

    /// Point the voice and every lane at a new fundamental and fire the
    /// dual trigger: engine-internal amplitude envelopes and crate-owned
    /// modulation envelopes start together.
    pub fn trigger(&mut self, pitch: f32) -> Result<(), DriverError> {
        let f1 = pitch;
        let f2 = pitch * self.secondary_ratio;

        self.voice.update_oscillators(&mut self.engine, f1, f2)?;

        for lane in &mut self.lanes {
            let base = match lane.spec.source {
                PitchSource::Primary => f1,
                PitchSource::Secondary => f2,
            };
            lane.env
                .reset(lane.spec.params.with_scale(base * lane.spec.depth))?;
        }

        self.voice.note_on(&mut self.engine)?;
        for lane in &mut self.lanes {
            lane.env.note_on();
        }
        Ok(())
    }

    /// Change the voice's modulation-speed ratios (applied at next trigger).
    pub fn set_ratios(&mut self, ratio1: f32, ratio2: f32) {
        self.voice.set_ratios(ratio1, ratio2);
    }

    /// Change the voice's modulation indices (applied at next trigger).
    pub fn set_mod_indices(&mut self, index1: f32, index2: f32) {
        self.voice.set_mod_indices(index1, index2);
    }

    /// Change the oscillator gains (writes through immediately).
    pub fn set_gains(&mut self, gain1: f32, gain2: f32) -> Result<(), DriverError> {
        self.voice.set_gains(&mut self.engine, gain1, gain2)?;
        Ok(())
    }

    /// Shape the engine-internal amplitude envelopes.
    pub fn set_amp_envelopes(&mut self, times: AmpEnvTimes) -> Result<(), DriverError> {
        self.voice.set_amp_envelopes(&mut self.engine, times)?;
        Ok(())
    }

    /// The voice under control.
    pub fn voice(&self) -> &FmVoice {
        &self.voice
    }

    /// The lane envelopes, in lane order (inspection, tests).
    pub fn envelopes(&self) -> impl Iterator<Item = &EnvelopeGenerator> {
        self.lanes.iter().map(|lane| &lane.env)
    }

    /// Borrow the engine (inspection).
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Give the engine back, dropping the driver.
    pub fn into_engine(self) -> E {
        self.engine
    }
}

/// Anything that can stop a run: bad envelope shapes at configuration time,
/// engine failures at any time.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverError {
    Engine(EngineError),
    Envelope(EnvelopeError),
}

impl From<EngineError> for DriverError {
    fn from(err: EngineError) -> Self {
        DriverError::Engine(err)
    }
}

impl From<EnvelopeError> for DriverError {
    fn from(err: EnvelopeError) -> Self {
        DriverError::Envelope(err)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Engine(err) => write!(f, "engine error: {}", err),
            DriverError::Envelope(err) => write!(f, "envelope error: {}", err),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Engine(err) => Some(err),
            DriverError::Envelope(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::EnvelopeState;
    use crate::engine::{controls, OfflineEngine};

    const BLOCK: f64 = 128.0 / 44_100.0;

    fn blocks_per_note(hold: f64) -> u64 {
        (hold / BLOCK).ceil() as u64
    }

    fn demo_driver() -> Driver<OfflineEngine> {
        let engine = OfflineEngine::new(128, 44_100.0);
        let params = FmVoiceParams {
            ratio2: 1.0 / 6.0,
            index1: 2.66,
            index2: 1.8,
            gain2: 0.2,
            ..FmVoiceParams::default()
        };
        let lanes = vec![
            ModLane::new(
                controls::OSC1_MOD_DEPTH,
                EnvelopeParams::default().with_decay(0.15),
                2.66,
                PitchSource::Primary,
            ),
            ModLane::new(
                controls::OSC2_MOD_DEPTH,
                EnvelopeParams::default().with_decay(0.3),
                1.8,
                PitchSource::Secondary,
            ),
        ];
        Driver::new(engine, params, 6.0, lanes).unwrap()
    }

    #[test]
    fn one_note_ticks_the_expected_block_count() {
        let mut driver = demo_driver();
        let score = Score::new().pitch(250.0).build().unwrap();

        driver.play(&score).unwrap();
        assert_eq!(driver.engine().blocks(), blocks_per_note(0.4));
    }

    #[test]
    fn note_off_fires_exactly_once_per_note() {
        let mut driver = demo_driver();
        let score = Score::new().pitches([250.0, 500.0, 375.0]).build().unwrap();

        driver.play(&score).unwrap();

        let engine = driver.engine();
        assert_eq!(engine.writes_to(controls::NOTE_ON).count(), 3);
        assert_eq!(engine.writes_to(controls::NOTE_OFF).count(), 3);
    }

    #[test]
    fn note_off_lands_after_the_release_point() {
        let mut driver = demo_driver();
        let score = Score::new().pitch(250.0).build().unwrap();
        driver.play(&score).unwrap();

        // The release must fire on the first block whose start time exceeds
        // 0.3 s, never before
        let engine = driver.engine();
        let off = engine.writes_to(controls::NOTE_OFF).next().unwrap();
        let start_secs = (off.block - 1) as f64 * BLOCK;
        assert!(start_secs > 0.3);
        assert!(start_secs < 0.3 + 2.0 * BLOCK);
    }

    #[test]
    fn release_point_inside_the_final_block_never_fires_note_off() {
        // Block starts run 0, BLOCK, ..., 137 * BLOCK (~0.3976 s) for a
        // 0.4 s hold; a release point past the last start is never crossed,
        // so the note plays out unreleased. Documented on
        // `ScoreBuilder::release_at`.
        let mut driver = demo_driver();
        let score = Score::new()
            .hold(0.4)
            .release_at(0.399)
            .pitch(250.0)
            .build()
            .unwrap();
        driver.play(&score).unwrap();

        let engine = driver.engine();
        assert_eq!(engine.writes_to(controls::NOTE_ON).count(), 1);
        assert_eq!(engine.writes_to(controls::NOTE_OFF).count(), 0);
    }

    #[test]
    fn trigger_scales_lanes_from_their_pitch_source() {
        let mut driver = demo_driver();
        driver.trigger(250.0).unwrap();

        let scales: Vec<f32> = driver.envelopes().map(|env| env.params().scale).collect();
        assert!((scales[0] - 250.0 * 2.66).abs() < 1e-2);
        assert!((scales[1] - 1500.0 * 1.8).abs() < 1e-2);
    }

    #[test]
    fn envelope_writes_interleave_with_voice_ticks() {
        let mut driver = demo_driver();
        let score = Score::new().pitch(250.0).build().unwrap();
        driver.play(&score).unwrap();

        let engine = driver.engine();
        let total = engine.blocks();

        // Per note: one write from update_oscillators at block 0, then one
        // write per block from the envelope, each landing after the voice
        // tick of its own block and before the next
        let writes: Vec<u64> = engine
            .writes_to(controls::OSC1_MOD_DEPTH)
            .map(|w| w.block)
            .collect();
        let expected: Vec<u64> = std::iter::once(0).chain(1..=total).collect();
        assert_eq!(writes, expected);
    }

    #[test]
    fn next_trigger_hard_resets_every_lane() {
        let mut driver = demo_driver();
        let score = Score::new().pitch(250.0).build().unwrap();
        driver.play(&score).unwrap();

        driver.trigger(500.0).unwrap();
        for env in driver.envelopes() {
            assert_eq!(env.state(), EnvelopeState::Attack);
            assert_eq!(env.value(), 0.0);
        }
    }

    #[test]
    fn engine_failure_aborts_the_sequence() {
        // An engine that dies on the fourth tick
        struct FailingEngine {
            inner: OfflineEngine,
            ticks_left: u32,
        }

        impl Engine for FailingEngine {
            fn write(&mut self, control: &str, value: f32) -> Result<(), EngineError> {
                self.inner.write(control, value)
            }
            fn read(&self, control: &str) -> Result<f32, EngineError> {
                self.inner.read(control)
            }
            fn tick(&mut self) -> Result<(), EngineError> {
                if self.ticks_left == 0 {
                    return Err(EngineError::Backend("sink went away".into()));
                }
                self.ticks_left -= 1;
                self.inner.tick()
            }
        }

        let engine = FailingEngine {
            inner: OfflineEngine::new(128, 44_100.0),
            ticks_left: 3,
        };
        let mut driver =
            Driver::new(engine, FmVoiceParams::default(), 6.0, Vec::new()).unwrap();
        let score = Score::new().pitches([250.0, 500.0]).build().unwrap();

        let err = driver.play(&score).unwrap_err();
        assert!(matches!(err, DriverError::Engine(EngineError::Backend(_))));
        assert_eq!(driver.engine().inner.blocks(), 3);
    }

    #[test]
    fn bad_lane_shape_fails_construction() {
        let engine = OfflineEngine::new(128, 44_100.0);
        let lanes = vec![ModLane::new(
            controls::OSC1_MOD_DEPTH,
            EnvelopeParams::default().with_attack(0.0),
            1.0,
            PitchSource::Primary,
        )];

        let result = Driver::new(engine, FmVoiceParams::default(), 6.0, lanes);
        assert!(matches!(result, Err(DriverError::Envelope(_))));
    }
}
