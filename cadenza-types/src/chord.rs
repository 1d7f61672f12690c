//! Pitch-set and chord vocabulary shared by the matcher and its callers.

use serde::{Deserialize, Serialize};

use crate::music::PitchClass;

/// Set of pitch classes packed into the low 12 bits.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ToneSet(u16);

impl ToneSet {
    pub const EMPTY: ToneSet = ToneSet(0);
    const MASK: u16 = 0x0FFF;

    pub fn from_bits(bits: u16) -> Self {
        Self(bits & Self::MASK)
    }

    pub fn bits(self) -> u16 {
        self.0
    }

    /// Build from semitone offsets or MIDI pitches; values are octave-folded.
    pub fn from_semitones<I: IntoIterator<Item = u8>>(semitones: I) -> Self {
        let mut set = Self::EMPTY;
        for s in semitones {
            set.insert(s);
        }
        set
    }

    pub fn insert(&mut self, semitone: u8) {
        self.0 |= 1 << (semitone % 12);
    }

    pub fn contains(self, semitone: u8) -> bool {
        self.0 & (1 << (semitone % 12)) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_subset(self, other: ToneSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn intersection(self, other: ToneSet) -> ToneSet {
        ToneSet(self.0 & other.0)
    }

    pub fn difference(self, other: ToneSet) -> ToneSet {
        ToneSet(self.0 & !other.0)
    }

    /// Move every tone up by `semitones`.
    pub fn transpose(self, semitones: u8) -> ToneSet {
        let s = (semitones % 12) as u32;
        let bits = self.0 as u32;
        ToneSet::from_bits(((bits << s) | (bits >> (12 - s))) as u16)
    }

    /// Re-express the set relative to `root`, so that `root` becomes 0.
    pub fn relative_to(self, root: u8) -> ToneSet {
        self.transpose(12 - root % 12)
    }

    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..12u8).filter(move |&s| self.contains(s))
    }
}

impl std::fmt::Display for ToneSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.iter().map(|s| s.to_string()).collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}

/// Order- and duplicate-independent key for a sounding pitch set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(ToneSet);

impl Fingerprint {
    pub fn of(pitches: &[u8]) -> Self {
        Self(ToneSet::from_semitones(pitches.iter().copied()))
    }

    pub fn tones(self) -> ToneSet {
        self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Semitone offsets above the lowest sounding note, octave-folded,
/// deduplicated and sorted. The lowest note is always 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalPattern(Vec<u8>);

impl IntervalPattern {
    pub fn from_pitches(pitches: &[u8]) -> Self {
        let Some(&lowest) = pitches.iter().min() else {
            return Self(Vec::new());
        };
        let tones = ToneSet::from_semitones(pitches.iter().map(|&p| (p - lowest) % 12));
        Self(tones.iter().collect())
    }

    pub fn offsets(&self) -> &[u8] {
        &self.0
    }

    pub fn tones(&self) -> ToneSet {
        ToneSet::from_semitones(self.0.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Chord quality as stored in the knowledge base `chords.quality` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Sus2,
    Sus4,
    Major6,
    Minor6,
    Dominant7,
    Major7,
    Minor7,
    HalfDiminished7,
    Diminished7,
    MinorMajor7,
    Dominant7Sus4,
    Add9,
    MinorAdd9,
    Dominant9,
    Major9,
    Minor9,
    Dominant13,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 21] = [
        ChordQuality::Major,
        ChordQuality::Minor,
        ChordQuality::Diminished,
        ChordQuality::Augmented,
        ChordQuality::Sus2,
        ChordQuality::Sus4,
        ChordQuality::Major6,
        ChordQuality::Minor6,
        ChordQuality::Dominant7,
        ChordQuality::Major7,
        ChordQuality::Minor7,
        ChordQuality::HalfDiminished7,
        ChordQuality::Diminished7,
        ChordQuality::MinorMajor7,
        ChordQuality::Dominant7Sus4,
        ChordQuality::Add9,
        ChordQuality::MinorAdd9,
        ChordQuality::Dominant9,
        ChordQuality::Major9,
        ChordQuality::Minor9,
        ChordQuality::Dominant13,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChordQuality::Major => "major",
            ChordQuality::Minor => "minor",
            ChordQuality::Diminished => "diminished",
            ChordQuality::Augmented => "augmented",
            ChordQuality::Sus2 => "suspended second",
            ChordQuality::Sus4 => "suspended fourth",
            ChordQuality::Major6 => "major sixth",
            ChordQuality::Minor6 => "minor sixth",
            ChordQuality::Dominant7 => "dominant seventh",
            ChordQuality::Major7 => "major seventh",
            ChordQuality::Minor7 => "minor seventh",
            ChordQuality::HalfDiminished7 => "half-diminished seventh",
            ChordQuality::Diminished7 => "diminished seventh",
            ChordQuality::MinorMajor7 => "minor-major seventh",
            ChordQuality::Dominant7Sus4 => "dominant seventh suspended fourth",
            ChordQuality::Add9 => "added ninth",
            ChordQuality::MinorAdd9 => "minor added ninth",
            ChordQuality::Dominant9 => "dominant ninth",
            ChordQuality::Major9 => "major ninth",
            ChordQuality::Minor9 => "minor ninth",
            ChordQuality::Dominant13 => "dominant thirteenth",
        }
    }

    pub fn from_name(name: &str) -> Option<ChordQuality> {
        Self::ALL.iter().copied().find(|q| q.name() == name)
    }

    /// Symbol suffix appended to the root name ("" for a major triad)
    pub fn suffix(&self) -> &'static str {
        match self {
            ChordQuality::Major => "",
            ChordQuality::Minor => "m",
            ChordQuality::Diminished => "dim",
            ChordQuality::Augmented => "aug",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Major6 => "6",
            ChordQuality::Minor6 => "m6",
            ChordQuality::Dominant7 => "7",
            ChordQuality::Major7 => "maj7",
            ChordQuality::Minor7 => "m7",
            ChordQuality::HalfDiminished7 => "m7b5",
            ChordQuality::Diminished7 => "dim7",
            ChordQuality::MinorMajor7 => "mMaj7",
            ChordQuality::Dominant7Sus4 => "7sus4",
            ChordQuality::Add9 => "add9",
            ChordQuality::MinorAdd9 => "madd9",
            ChordQuality::Dominant9 => "9",
            ChordQuality::Major9 => "maj9",
            ChordQuality::Minor9 => "m9",
            ChordQuality::Dominant13 => "13",
        }
    }

    /// Minor-third family: spelled with a lower-case Roman numeral.
    pub fn is_minor_family(&self) -> bool {
        matches!(
            self,
            ChordQuality::Minor
                | ChordQuality::Minor6
                | ChordQuality::Minor7
                | ChordQuality::MinorMajor7
                | ChordQuality::MinorAdd9
                | ChordQuality::Minor9
                | ChordQuality::Diminished
                | ChordQuality::HalfDiminished7
                | ChordQuality::Diminished7
        )
    }

    /// Major triad with a minor seventh on top (can act as a secondary dominant)
    pub fn is_dominant_family(&self) -> bool {
        matches!(
            self,
            ChordQuality::Dominant7
                | ChordQuality::Dominant9
                | ChordQuality::Dominant13
                | ChordQuality::Dominant7Sus4
        )
    }

    /// Roman-numeral decoration: degree sign, plus sign or seventh marker.
    pub fn numeral_suffix(&self) -> &'static str {
        match self {
            ChordQuality::Diminished => "°",
            ChordQuality::Diminished7 => "°7",
            ChordQuality::HalfDiminished7 => "ø7",
            ChordQuality::Augmented => "+",
            ChordQuality::Dominant7 | ChordQuality::Minor7 => "7",
            ChordQuality::Major7 | ChordQuality::MinorMajor7 => "maj7",
            ChordQuality::Major6 | ChordQuality::Minor6 => "6",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Dominant7Sus4 => "7sus4",
            ChordQuality::Add9 | ChordQuality::MinorAdd9 => "add9",
            ChordQuality::Dominant9 | ChordQuality::Major9 | ChordQuality::Minor9 => "9",
            ChordQuality::Dominant13 => "13",
            ChordQuality::Major | ChordQuality::Minor => "",
        }
    }
}

impl std::fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One ranked chord interpretation of a moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordMatch {
    /// Root name plus quality suffix, e.g. "C", "F#m7"
    pub symbol: String,
    pub root: PitchClass,
    pub quality: ChordQuality,
    /// Parent scale the chord is drawn from, as recorded in the knowledge base
    pub scale_relationship: String,
    /// Fraction of the sounding and template tones accounted for (0-1)
    pub coverage: f64,
    /// Ranking score (0-1): coverage blended with template preference
    pub score: f64,
}

/// Best match plus up to four alternatives, already ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordMatches {
    pub best: ChordMatch,
    pub alternatives: Vec<ChordMatch>,
}

/// What the harmonic matcher made of one moment.
///
/// Only `Identified` carries chord symbols. `Ambiguous` and `Unrecognized`
/// are the defined "no analysis" outcomes and never carry a guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HarmonyOutcome {
    /// Nothing sounding
    Rest,
    /// One sounding pitch, passed through unmatched
    SingleNote { pitch: u8 },
    /// Two pitch classes (or octaves of one), passed through unmatched
    Interval {
        low: u8,
        high: u8,
        semitones: u8,
        name: String,
    },
    Identified {
        matches: ChordMatches,
        confidence: f64,
        pattern: IntervalPattern,
    },
    /// Compatible chords exist but none clears the confidence threshold
    Ambiguous {
        confidence: f64,
        candidates: usize,
        pattern: IntervalPattern,
    },
    /// No chord in the knowledge base is compatible with the pattern
    Unrecognized { pattern: IntervalPattern },
}

impl HarmonyOutcome {
    pub fn is_chord(&self) -> bool {
        matches!(self, HarmonyOutcome::Identified { .. })
    }

    pub fn best(&self) -> Option<&ChordMatch> {
        match self {
            HarmonyOutcome::Identified { matches, .. } => Some(&matches.best),
            _ => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            HarmonyOutcome::Identified { confidence, .. }
            | HarmonyOutcome::Ambiguous { confidence, .. } => Some(*confidence),
            _ => None,
        }
    }
}
