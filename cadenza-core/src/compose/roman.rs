//! Roman-numeral labels and harmonic function against a key.
//!
//! Diatonic chords are spelled from the key's degree table. Anything else is
//! named by the first reading that fits, in order: secondary dominant,
//! Neapolitan, mixture from the parallel mode, plain chromatic degree.

use cadenza_types::{ChordQuality, HarmonicFunction, Key, KeyMode, PitchClass, RomanNumeral, ToneSet};

use crate::error::KnowledgeError;
use crate::knowledge::KnowledgeReader;

// (accidental, numeral) per semitone above the tonic
const MAJOR_DEGREES: [(&str, &str); 12] = [
    ("", "I"),
    ("b", "II"),
    ("", "II"),
    ("b", "III"),
    ("", "III"),
    ("", "IV"),
    ("#", "IV"),
    ("", "V"),
    ("b", "VI"),
    ("", "VI"),
    ("b", "VII"),
    ("", "VII"),
];

const MINOR_DEGREES: [(&str, &str); 12] = [
    ("", "I"),
    ("b", "II"),
    ("", "II"),
    ("", "III"),
    ("#", "III"),
    ("", "IV"),
    ("b", "V"),
    ("", "V"),
    ("", "VI"),
    ("#", "VI"),
    ("", "VII"),
    ("", "VII"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumeralKind {
    Diatonic,
    SecondaryDominant,
    Neapolitan,
    Mixture,
    Chromatic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Numeral {
    pub roman: RomanNumeral,
    /// Accidental and case-adjusted numeral without quality decoration ("bVII", "ii")
    pub core: String,
    pub kind: NumeralKind,
}

/// Tones a key treats as its own. Minor keys include the leading tone so
/// that V and vii° of harmonic minor read as diatonic.
pub fn diatonic_tones(key: Key) -> ToneSet {
    let mut tones = ToneSet::from_semitones(key.mode.intervals().iter().copied());
    if key.mode == KeyMode::Minor {
        tones.insert(11);
    }
    tones.transpose(key.tonic.semitone())
}

fn spell(degree: u8, mode: KeyMode, quality: ChordQuality) -> String {
    let (accidental, numeral) = match mode {
        KeyMode::Major => MAJOR_DEGREES[degree as usize % 12],
        KeyMode::Minor => MINOR_DEGREES[degree as usize % 12],
    };
    if quality.is_minor_family() {
        format!("{}{}", accidental, numeral.to_lowercase())
    } else {
        format!("{}{}", accidental, numeral)
    }
}

/// Label a chord (`tones` are its absolute pitch classes) against `key`.
pub fn roman_numeral(
    root: PitchClass,
    quality: ChordQuality,
    tones: ToneSet,
    key: Key,
    knowledge: &dyn KnowledgeReader,
) -> Result<Numeral, KnowledgeError> {
    let degree = key.degree_of(root);
    let core = spell(degree, key.mode, quality);
    let numeral = |label: String, core: String, diatonic: bool, borrowed_from: Option<String>, kind| Numeral {
        roman: RomanNumeral {
            label,
            degree,
            diatonic,
            borrowed_from,
        },
        core,
        kind,
    };

    if tones.is_subset(diatonic_tones(key)) {
        let label = format!("{}{}", core, quality.numeral_suffix());
        return Ok(numeral(label, core, true, None, NumeralKind::Diatonic));
    }

    if quality == ChordQuality::Major || quality.is_dominant_family() {
        // Root a fifth above some diatonic, tonicizable degree
        let target = (degree + 5) % 12;
        if target != 0 {
            if let Some(record) = knowledge.function(key.mode, target)? {
                if !record.numeral.contains('°') {
                    let head = match quality {
                        ChordQuality::Major => "V",
                        ChordQuality::Dominant7 => "V7",
                        ChordQuality::Dominant9 => "V9",
                        ChordQuality::Dominant13 => "V13",
                        _ => "V7sus4",
                    };
                    let label = format!("{}/{}", head, record.numeral);
                    let borrowed = format!("secondary dominant of {}", record.numeral);
                    return Ok(numeral(label, core, false, Some(borrowed), NumeralKind::SecondaryDominant));
                }
            }
        }
    }

    if degree == 1 && matches!(quality, ChordQuality::Major | ChordQuality::Major7) {
        let label = format!("bII{}", quality.numeral_suffix());
        return Ok(numeral(label, "bII".to_string(), false, Some("neapolitan".into()), NumeralKind::Neapolitan));
    }

    let parallel = key.parallel();
    if tones.is_subset(diatonic_tones(parallel)) {
        let label = format!("{}{}", core, quality.numeral_suffix());
        let borrowed = format!("parallel {}", parallel.mode.name());
        return Ok(numeral(label, core, false, Some(borrowed), NumeralKind::Mixture));
    }

    let label = format!("{}{}", core, quality.numeral_suffix());
    Ok(numeral(label, core, false, None, NumeralKind::Chromatic))
}

/// Function of a labelled chord. Diatonic and borrowed chords take the
/// function recorded for their degree; tonicizing chords act as dominants.
pub fn harmonic_function(
    numeral: &Numeral,
    key: Key,
    knowledge: &dyn KnowledgeReader,
) -> Result<HarmonicFunction, KnowledgeError> {
    let degree = numeral.roman.degree;
    let function = match numeral.kind {
        NumeralKind::Diatonic => knowledge.function(key.mode, degree)?.map(|r| r.function),
        NumeralKind::SecondaryDominant => Some(HarmonicFunction::Dominant),
        NumeralKind::Neapolitan => Some(HarmonicFunction::Predominant),
        NumeralKind::Mixture => knowledge.function(key.mode.parallel(), degree)?.map(|r| r.function),
        NumeralKind::Chromatic => None,
    };
    Ok(function.unwrap_or(HarmonicFunction::Chromatic))
}
