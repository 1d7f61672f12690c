//! Analysis settings. Built from configuration by `cadenza-core`; every
//! struct has defaults matching the embedded config file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::Facet;

/// Thresholds for the three boundary detectors and the merge step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    pub minimum_gap_seconds: f64,
    /// Gaps longer than this are treated as a restart of playing
    pub maximum_gap_seconds: f64,
    pub silence_strength: f64,
    pub restart_strength: f64,
    pub pedal_release_weight: f64,
    pub velocity_drop_threshold: u8,
    pub crescendo_threshold: u8,
    pub dynamics_weight: f64,
    pub merge_tolerance_seconds: f64,
    /// Merged boundaries weaker than this do not split the session
    pub boundary_strength_floor: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            minimum_gap_seconds: 1.0,
            maximum_gap_seconds: 10.0,
            silence_strength: 1.0,
            restart_strength: 2.0,
            pedal_release_weight: 0.6,
            velocity_drop_threshold: 30,
            crescendo_threshold: 25,
            dynamics_weight: 0.4,
            merge_tolerance_seconds: 0.15,
            boundary_strength_floor: 0.5,
        }
    }
}

/// Prior probability of a phrase lasting a given number of bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthPrior {
    pub table: BTreeMap<u32, f64>,
    /// Used for bar counts missing from the table
    pub unlisted: f64,
}

impl LengthPrior {
    pub fn probability(&self, bars: u32) -> f64 {
        self.table.get(&bars).copied().unwrap_or(self.unlisted)
    }

    /// Prior scaled so the likeliest length scores 1.
    pub fn normalized(&self, bars: u32) -> f64 {
        let max = self
            .table
            .values()
            .copied()
            .fold(self.unlisted, f64::max);
        if max <= 0.0 {
            return 0.0;
        }
        (self.probability(bars) / max).clamp(0.0, 1.0)
    }
}

impl Default for LengthPrior {
    fn default() -> Self {
        let table = BTreeMap::from([(4, 0.30), (6, 0.10), (8, 0.30), (12, 0.10), (16, 0.15)]);
        Self {
            table,
            unlisted: 0.05,
        }
    }
}

/// Weights of the three classifier signals. Normalized before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub rhythm: f64,
    pub prior: f64,
    pub density: f64,
}

impl ConfidenceWeights {
    pub fn normalized(&self) -> ConfidenceWeights {
        let rhythm = self.rhythm.max(0.0);
        let prior = self.prior.max(0.0);
        let density = self.density.max(0.0);
        let total = rhythm + prior + density;
        if total <= 0.0 {
            return ConfidenceWeights::default().normalized();
        }
        ConfidenceWeights {
            rhythm: rhythm / total,
            prior: prior / total,
            density: density / total,
        }
    }
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            rhythm: 0.4,
            prior: 0.3,
            density: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Spans with this many notes or fewer are never phrases
    pub segment_maximum_notes: usize,
    pub length_prior: LengthPrior,
    pub weights: ConfidenceWeights,
    /// Notes per beat at which the fill signal saturates
    pub full_density_notes_per_beat: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            segment_maximum_notes: 3,
            length_prior: LengthPrior::default(),
            weights: ConfidenceWeights::default(),
            full_density_notes_per_beat: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatcherSettings {
    /// Results below this confidence become "no analysis"
    pub confidence_threshold: f64,
    /// Onsets within this window of a moment's first onset join the moment
    pub simultaneity_tolerance_seconds: f64,
    pub max_alternatives: usize,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            simultaneity_tolerance_seconds: 0.05,
            max_alternatives: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicFacets {
    pub chord_symbols: bool,
    pub key_suggestion: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionalFacets {
    pub key_center: bool,
    pub roman_numerals: bool,
    pub harmonic_function: bool,
    pub progression: bool,
    pub voice_leading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComprehensiveFacets {
    pub modal_analysis: bool,
    pub emotional_archetype: bool,
    pub post_functional: bool,
    pub registral_distribution: bool,
}

/// Which facets the composer emits, per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetConfig {
    pub basic: BasicFacets,
    pub functional: FunctionalFacets,
    pub comprehensive: ComprehensiveFacets,
}

impl FacetConfig {
    pub fn all() -> Self {
        Self::for_level(AnalysisLevel::Advanced)
    }

    /// Preset: each level enables its own tier and every tier below it.
    pub fn for_level(level: AnalysisLevel) -> Self {
        let functional = level != AnalysisLevel::Beginner;
        let comprehensive = level == AnalysisLevel::Advanced;
        Self {
            basic: BasicFacets {
                chord_symbols: true,
                key_suggestion: true,
            },
            functional: FunctionalFacets {
                key_center: functional,
                roman_numerals: functional,
                harmonic_function: functional,
                progression: functional,
                voice_leading: functional,
            },
            comprehensive: ComprehensiveFacets {
                modal_analysis: comprehensive,
                emotional_archetype: comprehensive,
                post_functional: comprehensive,
                registral_distribution: comprehensive,
            },
        }
    }

    pub fn is_enabled(&self, facet: Facet) -> bool {
        match facet {
            Facet::ChordSymbol => self.basic.chord_symbols,
            Facet::KeySuggestion => self.basic.key_suggestion,
            Facet::KeyCenter => self.functional.key_center,
            Facet::RomanNumeral => self.functional.roman_numerals,
            Facet::HarmonicFunction => self.functional.harmonic_function,
            Facet::Progression => self.functional.progression,
            Facet::VoiceLeading => self.functional.voice_leading,
            Facet::ModalCharacter => self.comprehensive.modal_analysis,
            Facet::EmotionalArchetype => self.comprehensive.emotional_archetype,
            Facet::PostFunctional => self.comprehensive.post_functional,
            Facet::RegistralDistribution => self.comprehensive.registral_distribution,
        }
    }
}

impl Default for FacetConfig {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_lengths_get_low_prior() {
        let prior = LengthPrior::default();
        assert_eq!(prior.probability(5), 0.05);
        assert_eq!(prior.probability(8), 0.30);
    }

    #[test]
    fn normalized_prior_peaks_at_one() {
        let prior = LengthPrior::default();
        assert!((prior.normalized(4) - 1.0).abs() < 1e-12);
        assert!(prior.normalized(16) < 1.0);
        assert!(prior.normalized(3) < prior.normalized(16));
    }

    #[test]
    fn weights_normalize_to_one() {
        let w = ConfidenceWeights {
            rhythm: 2.0,
            prior: 1.0,
            density: 1.0,
        }
        .normalized();
        assert!((w.rhythm + w.prior + w.density - 1.0).abs() < 1e-12);
        assert!((w.rhythm - 0.5).abs() < 1e-12);
    }

    #[test]
    fn beginner_preset_is_basic_only() {
        let facets = FacetConfig::for_level(AnalysisLevel::Beginner);
        assert!(facets.is_enabled(Facet::ChordSymbol));
        assert!(!facets.is_enabled(Facet::RomanNumeral));
        assert!(!facets.is_enabled(Facet::ModalCharacter));
    }

    #[test]
    fn intermediate_preset_adds_functional() {
        let facets = FacetConfig::for_level(AnalysisLevel::Intermediate);
        assert!(facets.is_enabled(Facet::VoiceLeading));
        assert!(!facets.is_enabled(Facet::PostFunctional));
    }
}
