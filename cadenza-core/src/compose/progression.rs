//! Session-level readings over the sequence of identified chords.

use cadenza_types::{CadenceMark, ChordMatch, Key, ProgressionSummary, Technique, ToneSet, VoiceLeading};

use super::roman::Numeral;
use crate::error::KnowledgeError;
use crate::knowledge::KnowledgeReader;

// (name, numeral cores), longest first so the most specific pattern wins
const PATTERNS: [(&str, &[&str]); 10] = [
    ("I-V-vi-IV", &["I", "V", "vi", "IV"]),
    ("vi-IV-I-V", &["vi", "IV", "I", "V"]),
    ("I-vi-IV-V", &["I", "vi", "IV", "V"]),
    ("andalusian", &["i", "VII", "VI", "V"]),
    ("i-VI-III-VII", &["i", "VI", "III", "VII"]),
    ("ii-V-I", &["ii", "V", "I"]),
    ("ii°-V-i", &["ii", "V", "i"]),
    ("I-IV-V", &["I", "IV", "V"]),
    ("i-iv-v", &["i", "iv", "v"]),
    ("i-iv-V", &["i", "iv", "V"]),
];

/// One identified chord after consecutive repeats were folded away.
#[derive(Debug, Clone)]
pub struct ProgressionStep<'a> {
    pub chord: &'a ChordMatch,
    /// Sounding pitch classes of the first moment of the step
    pub tones: ToneSet,
    pub numeral: Numeral,
}

pub fn named_pattern(steps: &[ProgressionStep<'_>]) -> Option<&'static str> {
    let cores: Vec<&str> = steps.iter().map(|s| s.numeral.core.as_str()).collect();
    PATTERNS
        .iter()
        .find(|(_, pattern)| cores.windows(pattern.len()).any(|w| w == *pattern))
        .map(|(name, _)| *name)
}

pub fn cadences(
    steps: &[ProgressionStep<'_>],
    key: Key,
    knowledge: &dyn KnowledgeReader,
) -> Result<Vec<CadenceMark>, KnowledgeError> {
    let mut marks = Vec::new();
    for (i, pair) in steps.windows(2).enumerate() {
        let from = pair[0].numeral.roman.degree;
        let to = pair[1].numeral.roman.degree;
        if let Some(record) = knowledge.cadence(key.mode, from, to)? {
            marks.push(CadenceMark {
                index: i + 1,
                name: record.name.clone(),
                emotion: record.emotion.clone(),
            });
        }
    }
    Ok(marks)
}

pub fn summary(
    steps: &[ProgressionStep<'_>],
    key: Key,
    knowledge: &dyn KnowledgeReader,
) -> Result<ProgressionSummary, KnowledgeError> {
    let diatonic = steps.iter().filter(|s| s.numeral.roman.diatonic).count();
    Ok(ProgressionSummary {
        pattern: named_pattern(steps).map(str::to_string),
        numerals: steps.iter().map(|s| s.numeral.roman.label.clone()).collect(),
        cadences: cadences(steps, key, knowledge)?,
        diatonic_ratio: if steps.is_empty() {
            0.0
        } else {
            diatonic as f64 / steps.len() as f64
        },
    })
}

/// Shortest distance between two pitch classes, either direction (0-6).
fn circular_distance(a: u8, b: u8) -> u8 {
    let up = (b + 12 - a) % 12;
    up.min(12 - up) % 12
}

pub fn voice_leading(steps: &[ProgressionStep<'_>]) -> Vec<VoiceLeading> {
    steps
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0].tones, pair[1].tones);
            let moves: Vec<u8> = b
                .difference(a)
                .iter()
                .map(|to| a.iter().map(|from| circular_distance(from, to)).min().unwrap_or(0))
                .collect();
            VoiceLeading {
                from: pair[0].chord.symbol.clone(),
                to: pair[1].chord.symbol.clone(),
                common_tones: a.intersection(b).len(),
                stepwise: moves.iter().all(|&m| (1..=2).contains(&m)),
                total_motion: moves.iter().map(|&m| m as u32).sum(),
            }
        })
        .collect()
}

/// Techniques that show up between chords rather than inside one.
pub fn progression_techniques(steps: &[ProgressionStep<'_>]) -> Vec<Technique> {
    let mut found = Vec::new();

    let mediant = steps.windows(2).any(|pair| {
        let (a, b) = (pair[0].chord, pair[1].chord);
        let motion = a.root.interval_to(b.root);
        matches!(motion, 3 | 4 | 8 | 9)
            && a.quality.is_minor_family() == b.quality.is_minor_family()
            && !(pair[0].numeral.roman.diatonic && pair[1].numeral.roman.diatonic)
    });
    if mediant {
        found.push(Technique::ChromaticMediant);
    }

    let planing = steps.windows(3).any(|w| {
        let step = w[0].chord.root.interval_to(w[1].chord.root);
        step != 0
            && w.iter().all(|s| s.chord.quality == w[0].chord.quality)
            && w[1].chord.root.interval_to(w[2].chord.root) == step
    });
    if planing {
        found.push(Technique::Planing);
    }

    let substitution = steps.windows(2).any(|pair| {
        let (a, b) = (pair[0].chord, pair[1].chord);
        a.quality.is_dominant_family() && b.root.interval_to(a.root) == 1 && !pair[0].numeral.roman.diatonic
    });
    if substitution {
        found.push(Technique::TritoneSubstitution);
    }

    found
}
