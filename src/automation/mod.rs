//! Block-rate parameter automation.
//!
//! Envelope generators here run at control rate: one value per audio block,
//! written straight into the engine's control space. They are a separate
//! species from the engine-internal amplitude envelopes, which shape the
//! signal at sample rate. Both get triggered from the same sequencer event,
//! but this crate only ever owns the control-rate kind.

pub mod envelope;

pub use envelope::{EnvelopeError, EnvelopeGenerator, EnvelopeParams, EnvelopeState};
