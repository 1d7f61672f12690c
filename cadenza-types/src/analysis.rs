//! Tiered analysis values.
//!
//! A [`TieredAnalysis`] holds three facet maps (basic, functional,
//! comprehensive). A facet that is switched off in the [`FacetConfig`] is
//! simply absent from its map; it is never present as an empty value.
//!
//! [`FacetConfig`]: crate::settings::FacetConfig

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chord::ChordQuality;
use crate::music::{Key, Mode, PitchClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Basic,
    Functional,
    Comprehensive,
}

/// One named analysis output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    ChordSymbol,
    KeySuggestion,
    KeyCenter,
    RomanNumeral,
    HarmonicFunction,
    Progression,
    VoiceLeading,
    ModalCharacter,
    EmotionalArchetype,
    PostFunctional,
    RegistralDistribution,
}

impl Facet {
    pub fn tier(&self) -> Tier {
        match self {
            Facet::ChordSymbol | Facet::KeySuggestion => Tier::Basic,
            Facet::KeyCenter
            | Facet::RomanNumeral
            | Facet::HarmonicFunction
            | Facet::Progression
            | Facet::VoiceLeading => Tier::Functional,
            Facet::ModalCharacter
            | Facet::EmotionalArchetype
            | Facet::PostFunctional
            | Facet::RegistralDistribution => Tier::Comprehensive,
        }
    }
}

/// Chord symbol facet for a single moment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordReading {
    pub symbol: String,
    pub quality: ChordQuality,
    pub confidence: f64,
    pub alternatives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyCandidate {
    pub key: Key,
    /// Profile correlation (-1 to 1)
    pub score: f64,
}

/// Key detection result for a session or a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    pub key: Key,
    /// Margin of the winning key over the runner-up, scaled to 0-1
    pub confidence: f64,
    /// Best candidates, strongest first
    pub candidates: Vec<KeyCandidate>,
}

/// A span whose local key differs from the session key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modulation {
    pub span_index: usize,
    pub start: f64,
    pub key: Key,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyCenter {
    pub key: Key,
    pub confidence: f64,
    pub modulations: Vec<Modulation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarmonicFunction {
    Tonic,
    Predominant,
    Dominant,
    /// Outside the key's functional vocabulary
    Chromatic,
}

impl HarmonicFunction {
    pub fn name(&self) -> &'static str {
        match self {
            HarmonicFunction::Tonic => "tonic",
            HarmonicFunction::Predominant => "predominant",
            HarmonicFunction::Dominant => "dominant",
            HarmonicFunction::Chromatic => "chromatic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tonic" => Some(HarmonicFunction::Tonic),
            "predominant" => Some(HarmonicFunction::Predominant),
            "dominant" => Some(HarmonicFunction::Dominant),
            "chromatic" => Some(HarmonicFunction::Chromatic),
            _ => None,
        }
    }
}

/// Roman-numeral label of a chord against a key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomanNumeral {
    /// e.g. "V7", "bVII", "V/V"
    pub label: String,
    /// Root distance above the tonic in semitones
    pub degree: u8,
    pub diatonic: bool,
    /// Where a non-diatonic chord was borrowed from, e.g. "parallel minor"
    pub borrowed_from: Option<String>,
}

/// A cadence found between two consecutive chords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceMark {
    /// Index of the resolving chord in the identified sequence
    pub index: usize,
    pub name: String,
    pub emotion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSummary {
    /// Named pattern such as "ii-V-I", if one was recognized
    pub pattern: Option<String>,
    pub numerals: Vec<String>,
    pub cadences: Vec<CadenceMark>,
    /// Share of chords that are diatonic to the key (0-1)
    pub diatonic_ratio: f64,
}

/// Voice-leading between two consecutive chords (pitch-set based)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceLeading {
    pub from: String,
    pub to: String,
    pub common_tones: usize,
    /// Every new tone lies a step (1-2 semitones) from a previous tone
    pub stepwise: bool,
    /// Sum of the smallest semitone moves to reach each new tone
    pub total_motion: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalReading {
    pub tonic: PitchClass,
    pub mode: Mode,
    /// Share of sounding weight inside the mode (0-1)
    pub fit: f64,
    /// Degree that distinguishes the mode, e.g. "raised 4th"
    pub characteristic: String,
    pub characteristic_present: bool,
    /// -3 (darkest) to 3 (brightest)
    pub brightness: i8,
    pub description: String,
}

/// Non-functional or post-tonal harmonic techniques
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    /// Built from stacked perfect fourths
    Quartal,
    /// Three or more adjacent semitones
    Cluster,
    /// Drawn entirely from one whole-tone scale
    WholeTone,
    /// Ninths and beyond
    Extended,
    /// Roots a third apart sharing quality, outside the key
    ChromaticMediant,
    /// Same quality moved in parallel
    Planing,
    /// Dominant replaced by the one a tritone away
    TritoneSubstitution,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegisterProfile {
    pub lowest: u8,
    pub highest: u8,
    pub mean_pitch: f64,
    pub lowest_hz: f64,
    pub highest_hz: f64,
    /// Shares of notes below C3, C3 to below C5, C5 and above
    pub low_share: f64,
    pub middle_share: f64,
    pub high_share: f64,
}

impl RegisterProfile {
    pub fn range_semitones(&self) -> u8 {
        self.highest.saturating_sub(self.lowest)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetValue {
    Chord(ChordReading),
    ChordSequence(Vec<String>),
    KeySuggestion(Vec<KeyCandidate>),
    KeyCenter(KeyCenter),
    RomanNumeral(RomanNumeral),
    Function(HarmonicFunction),
    Progression(ProgressionSummary),
    VoiceLeading(Vec<VoiceLeading>),
    Modal(ModalReading),
    Emotion(Vec<String>),
    Techniques(Vec<Technique>),
    Register(RegisterProfile),
}

/// Beginner / intermediate / advanced views of one analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TieredAnalysis {
    pub basic: BTreeMap<Facet, FacetValue>,
    pub functional: BTreeMap<Facet, FacetValue>,
    pub comprehensive: BTreeMap<Facet, FacetValue>,
}

impl TieredAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a facet value under its tier.
    pub fn insert(&mut self, facet: Facet, value: FacetValue) {
        self.tier_mut(facet.tier()).insert(facet, value);
    }

    pub fn get(&self, facet: Facet) -> Option<&FacetValue> {
        self.tier(facet.tier()).get(&facet)
    }

    pub fn contains(&self, facet: Facet) -> bool {
        self.get(facet).is_some()
    }

    pub fn tier(&self, tier: Tier) -> &BTreeMap<Facet, FacetValue> {
        match tier {
            Tier::Basic => &self.basic,
            Tier::Functional => &self.functional,
            Tier::Comprehensive => &self.comprehensive,
        }
    }

    fn tier_mut(&mut self, tier: Tier) -> &mut BTreeMap<Facet, FacetValue> {
        match tier {
            Tier::Basic => &mut self.basic,
            Tier::Functional => &mut self.functional,
            Tier::Comprehensive => &mut self.comprehensive,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.basic.is_empty() && self.functional.is_empty() && self.comprehensive.is_empty()
    }
}
