// Purpose: voice-level parameter control - maps musical intent (pitch,
// ratio, index, gain) onto the engine's oscillator controls

pub mod fm;

pub use fm::{AmpEnvTimes, FmVoice, FmVoiceParams};
