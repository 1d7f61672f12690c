//! Boundary, span and verdict types produced by phrase segmentation.

use serde::{Deserialize, Serialize};

use crate::event::NoteEvent;

/// Bar counts a span may have and still be called a phrase.
pub const PHRASE_BAR_LENGTHS: [u32; 5] = [4, 6, 8, 12, 16];

/// A span is a phrase only when its confidence is strictly above this.
pub const PHRASE_CONFIDENCE_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundarySource {
    Silence,
    Pedal,
    Dynamics,
}

/// A point where new material probably begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateBoundary {
    /// Onset (seconds) of the first event after the boundary
    pub position: f64,
    pub source: BoundarySource,
    pub strength: f64,
}

/// A contiguous slice of a session between two boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span<'a> {
    pub start: f64,
    /// Sounding end of the last note
    pub end: f64,
    pub events: &'a [NoteEvent],
}

impl<'a> Span<'a> {
    pub fn note_count(&self) -> usize {
        self.events.len()
    }

    pub fn length_seconds(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }

    /// Gaps between consecutive onsets, chord tones collapsed.
    pub fn inter_onset_intervals(&self) -> Vec<f64> {
        self.events
            .windows(2)
            .map(|w| w[1].onset - w[0].onset)
            .filter(|gap| *gap > 1e-6)
            .collect()
    }
}

/// How steadily a phrase moves against the beat grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmicCharacter {
    Steady,
    Flowing,
    Rubato,
}

impl RhythmicCharacter {
    pub fn from_coherence(coherence: f64) -> Self {
        if coherence >= 0.85 {
            RhythmicCharacter::Steady
        } else if coherence >= 0.6 {
            RhythmicCharacter::Flowing
        } else {
            RhythmicCharacter::Rubato
        }
    }
}

/// Why a span was left as indeterminate material
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentReason {
    /// Too few notes to carry a phrase
    InsufficientDensity,
    /// Shorter than half a bar
    TooShort,
    /// Bar count outside the phrase lengths
    IrregularLength { bars: u32 },
    /// Onsets do not settle on a beat grid
    Arrhythmic,
    /// Notes too far apart for the tempo
    Sparse,
    LowConfidence { confidence: f64 },
}

impl SegmentReason {
    pub fn describe(&self) -> String {
        match self {
            SegmentReason::InsufficientDensity => "too few notes to form a phrase".to_string(),
            SegmentReason::TooShort => "shorter than half a bar".to_string(),
            SegmentReason::IrregularLength { bars } => {
                format!("{} bars is not a phrase length", bars)
            }
            SegmentReason::Arrhythmic => "no steady pulse".to_string(),
            SegmentReason::Sparse => "notes too sparse for the tempo".to_string(),
            SegmentReason::LowConfidence { confidence } => {
                format!("phrase confidence {:.2} too low", confidence)
            }
        }
    }
}

/// Terminal classification of one span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Phrase {
        duration_bars: u32,
        confidence: f64,
        rhythmic_character: RhythmicCharacter,
    },
    Segment {
        note_count: usize,
        reason: SegmentReason,
    },
}

impl Verdict {
    pub fn is_phrase(&self) -> bool {
        matches!(self, Verdict::Phrase { .. })
    }
}

/// The signals a verdict was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SectionMetrics {
    pub duration_bars: u32,
    pub rhythmic_coherence: f64,
    /// Phrase-length prior, normalized so the likeliest length scores 1
    pub length_prior: f64,
    pub density: f64,
    pub confidence: f64,
}

/// Owned record of one classified span, as handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanVerdict {
    pub start: f64,
    pub end: f64,
    pub note_count: usize,
    pub metrics: SectionMetrics,
    pub verdict: Verdict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inter_onset_intervals_skip_chord_tones() {
        let events = [
            NoteEvent::new(60, 80, 0.0),
            NoteEvent::new(64, 80, 0.0),
            NoteEvent::new(67, 80, 0.5),
            NoteEvent::new(72, 80, 1.5),
        ];
        let span = Span {
            start: 0.0,
            end: 2.0,
            events: &events,
        };
        assert_eq!(span.inter_onset_intervals(), vec![0.5, 1.0]);
    }

    #[test]
    fn rhythmic_character_bands() {
        assert_eq!(RhythmicCharacter::from_coherence(1.0), RhythmicCharacter::Steady);
        assert_eq!(RhythmicCharacter::from_coherence(0.7), RhythmicCharacter::Flowing);
        assert_eq!(RhythmicCharacter::from_coherence(0.2), RhythmicCharacter::Rubato);
    }

    #[test]
    fn segment_reason_is_human_readable() {
        let reason = SegmentReason::IrregularLength { bars: 5 };
        assert_eq!(reason.describe(), "5 bars is not a phrase length");
    }
}
