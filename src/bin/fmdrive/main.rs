//! fmdrive - demo melody runner
//!
//! Drives the two-oscillator FM voice through a short just-intonation walk
//! over an offline engine, then prints what the control layer did.
//!
//! Run with: cargo run

use color_eyre::Result;

use fmdrive::{
    automation::EnvelopeParams,
    engine::{controls, OfflineEngine},
    sequencing::{Driver, ModLane, PitchSource, Score},
    voice::{AmpEnvTimes, FmVoiceParams},
    DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE,
};

fn main() -> Result<()> {
    color_eyre::install()?;

    let pitch = 250.0;

    // Root, octave, fifth, major sixth, root
    let score = Score::new()
        .hold(0.4)
        .release_at(0.3)
        .pitch(pitch)
        .pitch(pitch * 2.0)
        .pitch(pitch * 3.0 / 2.0)
        .pitch(pitch * 5.0 / 3.0)
        .pitch(pitch)
        .build()?;

    // Oscillator 2 sits an octave-and-a-fifth stack above the fundamental
    // (x6), with its modulation speed folded back down by the 1/6 ratio
    let voice_params = FmVoiceParams {
        ratio1: 1.0,
        ratio2: 1.0 / 6.0,
        index1: 2.66,
        index2: 1.8,
        gain1: 1.0,
        gain2: 0.2,
    };

    // One modulation-depth sweep per oscillator, re-scaled to each note
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

    let engine = OfflineEngine::new(DEFAULT_BUFFER_SIZE, DEFAULT_SAMPLE_RATE);
    let mut driver = Driver::new(engine, voice_params, 6.0, lanes)?;

    driver.set_amp_envelopes(AmpEnvTimes {
        attack1: 0.03,
        decay1: 0.15,
        release1: 0.1,
        attack2: 0.03,
        decay2: 0.3,
        release2: 0.1,
    })?;

    println!("=== fmdrive ===");
    println!("Notes: {:?}", score.pitches());
    println!(
        "Hold: {:.2} s per note, release at {:.2} s",
        score.hold(),
        score.release_at()
    );
    println!();

    driver.play(&score)?;

    let block_duration = driver.voice().timing().block_duration;
    let engine = driver.into_engine();

    println!(
        "Rendered {} blocks ({:.2} s of control data)",
        engine.blocks(),
        engine.blocks() as f32 * block_duration
    );
    println!(
        "Note-ons: {}, note-offs: {}",
        engine.writes_to(controls::NOTE_ON).count(),
        engine.writes_to(controls::NOTE_OFF).count()
    );
    println!(
        "Depth-control writes: {} (osc1), {} (osc2)",
        engine.writes_to(controls::OSC1_MOD_DEPTH).count(),
        engine.writes_to(controls::OSC2_MOD_DEPTH).count()
    );
    println!(
        "Final carrier frequencies: {:.1} Hz / {:.1} Hz",
        engine.get(controls::OSC1_CARRIER_FREQ).unwrap_or(0.0),
        engine.get(controls::OSC2_CARRIER_FREQ).unwrap_or(0.0)
    );
    println!(
        "Final modulation speeds: {:.1} Hz / {:.1} Hz",
        engine.get(controls::OSC1_MOD_SPEED).unwrap_or(0.0),
        engine.get(controls::OSC2_MOD_SPEED).unwrap_or(0.0)
    );

    Ok(())
}
