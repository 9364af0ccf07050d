/*
Control Names
=============

Every parameter this crate drives is a named scalar in the engine's control
space. The names below are the crate-side vocabulary; an engine adapter maps
them onto whatever its internal parameter tree looks like.

Convention: `<unit>/<parameter>`, with `osc1`/`osc2` for the per-oscillator
chains and `voice`/`engine` for shared controls.

Two families matter here:

  Oscillator controls   carrier frequency, modulation depth, modulation
                        speed, gain. Written by `FmVoice`, and (for the
                        depth controls) re-written every block by the
                        modulation envelopes.

  Trigger controls      `voice/note_on` and `voice/note_off` are edge-style:
                        writing 1.0 fires the event at the next engine tick.
                        They drive the engine-internal amplitude envelopes,
                        which are separate from the envelope generators this
                        crate owns. Both oscillators listen to the same
                        trigger, so one write starts or releases the whole
                        voice.
*/

/// Samples per block (read at startup).
pub const BUFFER_SIZE: &str = "engine/buffer_size";
/// Samples per second (read at startup).
pub const SAMPLE_RATE: &str = "engine/sample_rate";

/// Shared note-on trigger for both oscillators' amplitude envelopes.
pub const NOTE_ON: &str = "voice/note_on";
/// Shared note-off trigger for both oscillators' amplitude envelopes.
pub const NOTE_OFF: &str = "voice/note_off";

// Oscillator 1
pub const OSC1_CARRIER_FREQ: &str = "osc1/carrier_freq";
pub const OSC1_MOD_DEPTH: &str = "osc1/mod_depth";
pub const OSC1_MOD_SPEED: &str = "osc1/mod_speed";
pub const OSC1_GAIN: &str = "osc1/gain";
pub const OSC1_AMP_ATTACK: &str = "osc1/amp_attack";
pub const OSC1_AMP_DECAY: &str = "osc1/amp_decay";
pub const OSC1_AMP_RELEASE: &str = "osc1/amp_release";

// Oscillator 2
pub const OSC2_CARRIER_FREQ: &str = "osc2/carrier_freq";
pub const OSC2_MOD_DEPTH: &str = "osc2/mod_depth";
pub const OSC2_MOD_SPEED: &str = "osc2/mod_speed";
pub const OSC2_GAIN: &str = "osc2/gain";
pub const OSC2_AMP_ATTACK: &str = "osc2/amp_attack";
pub const OSC2_AMP_DECAY: &str = "osc2/amp_decay";
pub const OSC2_AMP_RELEASE: &str = "osc2/amp_release";
