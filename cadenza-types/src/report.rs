use serde::{Deserialize, Serialize};

use crate::analysis::{KeyEstimate, TieredAnalysis};
use crate::chord::HarmonyOutcome;
use crate::event::Meter;
use crate::phrase::SpanVerdict;
use crate::SessionId;

/// Harmonic reading of one group of simultaneous notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentReport {
    pub onset: f64,
    pub pitches: Vec<u8>,
    pub outcome: HarmonyOutcome,
    /// Present only when the outcome is an identified chord
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<TieredAnalysis>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonyReport {
    pub key: KeyEstimate,
    pub moments: Vec<MomentReport>,
    /// Session-wide facets: key suggestion, progression, voice-leading, ...
    pub progression: TieredAnalysis,
}

/// Everything one analysis request produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session: SessionId,
    pub meter: Meter,
    pub verdicts: Vec<SpanVerdict>,
    pub harmony: HarmonyReport,
}

impl SessionReport {
    pub fn phrase_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.verdict.is_phrase()).count()
    }

    pub fn identified_chords(&self) -> impl Iterator<Item = &MomentReport> {
        self.harmony.moments.iter().filter(|m| m.outcome.is_chord())
    }
}
