use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered run of target pitches with shared note timing.
///
/// Every note gets the same treatment: held for `hold` seconds of block
/// time, with the release triggered once the per-note clock passes
/// `release_at`. The gap between the two is where the release tails ring
/// out; `build()` refuses a release point at or past the hold boundary.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pitches: Vec<f32>,
    hold: f32,
    release_at: f32,
}

impl Score {
    /// Start building a score (default timing: 0.4 s hold, release at 0.3 s).
    pub fn new() -> ScoreBuilder {
        ScoreBuilder {
            pitches: Vec::new(),
            hold: 0.4,
            release_at: 0.3,
        }
    }

    /// Fundamental pitches, in playback order (Hz).
    pub fn pitches(&self) -> &[f32] {
        &self.pitches
    }

    /// Seconds each note occupies before the next one starts.
    pub fn hold(&self) -> f32 {
        self.hold
    }

    /// Seconds into the note at which note-off fires.
    pub fn release_at(&self) -> f32 {
        self.release_at
    }
}

/// Builder for [`Score`] with validation at `build()`.
pub struct ScoreBuilder {
    pitches: Vec<f32>,
    hold: f32,
    release_at: f32,
}

impl ScoreBuilder {
    /// Set the per-note hold duration in seconds.
    pub fn hold(mut self, seconds: f32) -> Self {
        self.hold = seconds;
        self
    }

    /// Set the note-off point in seconds from the start of each note.
    ///
    /// The driver fires note-off on the first block whose start time exceeds
    /// this point. A release point inside a note's final block is therefore
    /// never crossed and that note plays out with no note-off at all; keep
    /// `release_at` at least one block duration short of `hold`.
    pub fn release_at(mut self, seconds: f32) -> Self {
        self.release_at = seconds;
        self
    }

    /// Append one pitch in Hz.
    pub fn pitch(mut self, hz: f32) -> Self {
        self.pitches.push(hz);
        self
    }

    /// Append several pitches in Hz.
    pub fn pitches(mut self, hz: impl IntoIterator<Item = f32>) -> Self {
        self.pitches.extend(hz);
        self
    }

    /// Validate and build the score.
    pub fn build(self) -> Result<Score, ScoreError> {
        if self.pitches.is_empty() {
            return Err(ScoreError::Empty);
        }
        if self.hold <= 0.0 {
            return Err(ScoreError::NonPositiveHold(self.hold));
        }
        if self.release_at <= 0.0 || self.release_at >= self.hold {
            return Err(ScoreError::ReleaseOutsideHold {
                hold: self.hold,
                release_at: self.release_at,
            });
        }
        if let Some(&hz) = self.pitches.iter().find(|&&hz| hz <= 0.0) {
            return Err(ScoreError::NonPositivePitch(hz));
        }

        Ok(Score {
            pitches: self.pitches,
            hold: self.hold,
            release_at: self.release_at,
        })
    }
}

/// Errors that can occur when building a score.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// No pitches were added.
    Empty,
    /// The hold duration was zero or negative.
    NonPositiveHold(f32),
    /// The release point falls outside the open interval (0, hold).
    ReleaseOutsideHold { hold: f32, release_at: f32 },
    /// A pitch was zero or negative.
    NonPositivePitch(f32),
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::Empty => write!(f, "score has no pitches"),
            ScoreError::NonPositiveHold(hold) => {
                write!(f, "hold duration must be positive, got {} s", hold)
            }
            ScoreError::ReleaseOutsideHold { hold, release_at } => {
                write!(
                    f,
                    "release point must lie strictly inside the note: got {} s within a {} s hold",
                    release_at, hold
                )
            }
            ScoreError::NonPositivePitch(hz) => {
                write!(f, "pitches must be positive, got {} Hz", hz)
            }
        }
    }
}

impl std::error::Error for ScoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_valid_score() {
        let score = Score::new()
            .hold(0.4)
            .release_at(0.3)
            .pitch(250.0)
            .pitch(500.0)
            .build()
            .unwrap();

        assert_eq!(score.pitches(), &[250.0, 500.0]);
        assert_eq!(score.hold(), 0.4);
        assert_eq!(score.release_at(), 0.3);
    }

    #[test]
    fn rejects_empty_pitch_list() {
        assert_eq!(Score::new().build(), Err(ScoreError::Empty));
    }

    #[test]
    fn rejects_release_at_or_past_hold() {
        let at_boundary = Score::new().hold(0.4).release_at(0.4).pitch(250.0).build();
        assert!(matches!(
            at_boundary,
            Err(ScoreError::ReleaseOutsideHold { .. })
        ));

        let past = Score::new().hold(0.4).release_at(0.5).pitch(250.0).build();
        assert!(matches!(past, Err(ScoreError::ReleaseOutsideHold { .. })));

        let negative = Score::new().hold(0.4).release_at(-0.1).pitch(250.0).build();
        assert!(matches!(negative, Err(ScoreError::ReleaseOutsideHold { .. })));
    }

    #[test]
    fn rejects_non_positive_timing_and_pitches() {
        let no_hold = Score::new().hold(0.0).pitch(250.0).build();
        assert!(matches!(no_hold, Err(ScoreError::NonPositiveHold(_))));

        let bad_pitch = Score::new().pitches([250.0, 0.0]).build();
        assert!(matches!(bad_pitch, Err(ScoreError::NonPositivePitch(_))));
    }
}
