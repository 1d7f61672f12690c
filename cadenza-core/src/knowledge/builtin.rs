//! Built-in knowledge tables. `cadenza --export-knowledge` writes these to
//! SQLite; a file loaded at startup replaces them wholesale.

use cadenza_types::{ChordQuality, HarmonicFunction, KeyMode, Mode, PitchClass, ToneSet};

use super::{
    CadenceRecord, ChordTemplate, EmotionRecord, FunctionRecord, IntervalRecord, KnowledgeTables,
    ModalRecord, NoteRecord, ScaleRecord,
};

const A4_HZ: f64 = 440.0;

// (semitones, name, short name, consonance)
const INTERVALS: [(u8, &str, &str, &str); 13] = [
    (0, "unison", "P1", "perfect"),
    (1, "minor second", "m2", "dissonant"),
    (2, "major second", "M2", "dissonant"),
    (3, "minor third", "m3", "imperfect"),
    (4, "major third", "M3", "imperfect"),
    (5, "perfect fourth", "P4", "perfect"),
    (6, "tritone", "TT", "dissonant"),
    (7, "perfect fifth", "P5", "perfect"),
    (8, "minor sixth", "m6", "imperfect"),
    (9, "major sixth", "M6", "imperfect"),
    (10, "minor seventh", "m7", "dissonant"),
    (11, "major seventh", "M7", "dissonant"),
    (12, "octave", "P8", "perfect"),
];

// (name, tones, family)
const SCALES: [(&str, &[u8], &str); 16] = [
    ("major", &[0, 2, 4, 5, 7, 9, 11], "diatonic"),
    ("natural minor", &[0, 2, 3, 5, 7, 8, 10], "diatonic"),
    ("harmonic minor", &[0, 2, 3, 5, 7, 8, 11], "minor"),
    ("melodic minor", &[0, 2, 3, 5, 7, 9, 11], "minor"),
    ("ionian", &[0, 2, 4, 5, 7, 9, 11], "mode"),
    ("dorian", &[0, 2, 3, 5, 7, 9, 10], "mode"),
    ("phrygian", &[0, 1, 3, 5, 7, 8, 10], "mode"),
    ("lydian", &[0, 2, 4, 6, 7, 9, 11], "mode"),
    ("mixolydian", &[0, 2, 4, 5, 7, 9, 10], "mode"),
    ("aeolian", &[0, 2, 3, 5, 7, 8, 10], "mode"),
    ("locrian", &[0, 1, 3, 5, 6, 8, 10], "mode"),
    ("major pentatonic", &[0, 2, 4, 7, 9], "pentatonic"),
    ("minor pentatonic", &[0, 3, 5, 7, 10], "pentatonic"),
    ("blues", &[0, 3, 5, 6, 7, 10], "pentatonic"),
    ("whole tone", &[0, 2, 4, 6, 8, 10], "symmetric"),
    ("diminished", &[0, 2, 3, 5, 6, 8, 9, 11], "symmetric"),
];

// (quality, tones, preference, parent scale)
// Preference only breaks ties between shapes that cover a moment equally.
const CHORDS: [(ChordQuality, &[u8], f64, &str); 21] = [
    // Triads
    (ChordQuality::Major, &[0, 4, 7], 1.0, "ionian (I, IV, V)"),
    (ChordQuality::Minor, &[0, 3, 7], 1.0, "aeolian (i, iv, v)"),
    (ChordQuality::Diminished, &[0, 3, 6], 0.8, "locrian (vii° of major)"),
    (ChordQuality::Augmented, &[0, 4, 8], 0.7, "whole tone (III+ of harmonic minor)"),
    (ChordQuality::Sus2, &[0, 2, 7], 0.75, "mixolydian"),
    (ChordQuality::Sus4, &[0, 5, 7], 0.75, "mixolydian"),
    // Sixths
    (ChordQuality::Major6, &[0, 4, 7, 9], 0.8, "ionian"),
    (ChordQuality::Minor6, &[0, 3, 7, 9], 0.75, "dorian"),
    // Sevenths
    (ChordQuality::Dominant7, &[0, 4, 7, 10], 0.95, "mixolydian (V7 of major)"),
    (ChordQuality::Major7, &[0, 4, 7, 11], 0.9, "ionian / lydian"),
    (ChordQuality::Minor7, &[0, 3, 7, 10], 0.9, "dorian"),
    (ChordQuality::HalfDiminished7, &[0, 3, 6, 10], 0.85, "locrian"),
    (ChordQuality::Diminished7, &[0, 3, 6, 9], 0.8, "diminished (vii°7 of harmonic minor)"),
    (ChordQuality::MinorMajor7, &[0, 3, 7, 11], 0.65, "melodic minor"),
    (ChordQuality::Dominant7Sus4, &[0, 5, 7, 10], 0.7, "mixolydian"),
    // Added tones and extensions
    (ChordQuality::Add9, &[0, 2, 4, 7], 0.75, "ionian"),
    (ChordQuality::MinorAdd9, &[0, 2, 3, 7], 0.7, "aeolian"),
    (ChordQuality::Dominant9, &[0, 2, 4, 7, 10], 0.8, "mixolydian"),
    (ChordQuality::Major9, &[0, 2, 4, 7, 11], 0.8, "ionian / lydian"),
    (ChordQuality::Minor9, &[0, 2, 3, 7, 10], 0.8, "dorian"),
    (ChordQuality::Dominant13, &[0, 4, 7, 9, 10], 0.7, "mixolydian"),
];

// (mode, degree, numeral, function)
const FUNCTIONS: [(KeyMode, u8, &str, HarmonicFunction); 15] = [
    (KeyMode::Major, 0, "I", HarmonicFunction::Tonic),
    (KeyMode::Major, 2, "ii", HarmonicFunction::Predominant),
    (KeyMode::Major, 4, "iii", HarmonicFunction::Tonic),
    (KeyMode::Major, 5, "IV", HarmonicFunction::Predominant),
    (KeyMode::Major, 7, "V", HarmonicFunction::Dominant),
    (KeyMode::Major, 9, "vi", HarmonicFunction::Tonic),
    (KeyMode::Major, 11, "vii°", HarmonicFunction::Dominant),
    (KeyMode::Minor, 0, "i", HarmonicFunction::Tonic),
    (KeyMode::Minor, 2, "ii°", HarmonicFunction::Predominant),
    (KeyMode::Minor, 3, "III", HarmonicFunction::Tonic),
    (KeyMode::Minor, 5, "iv", HarmonicFunction::Predominant),
    (KeyMode::Minor, 7, "v", HarmonicFunction::Dominant),
    (KeyMode::Minor, 8, "VI", HarmonicFunction::Predominant),
    (KeyMode::Minor, 10, "VII", HarmonicFunction::Dominant),
    // Leading-tone chord of harmonic minor
    (KeyMode::Minor, 11, "vii°", HarmonicFunction::Dominant),
];

// (mode, characteristic degree, characteristic, brightness, description)
const MODES: [(Mode, u8, &str, i8, &str); 7] = [
    (Mode::Lydian, 6, "raised 4th", 3, "floating, luminous"),
    (Mode::Ionian, 11, "major 7th", 2, "bright, settled"),
    (Mode::Mixolydian, 10, "flat 7th", 1, "earthy, bluesy major"),
    (Mode::Dorian, 9, "major 6th", 0, "minor with a lift, soulful"),
    (Mode::Aeolian, 8, "flat 6th", -1, "plaintive, sad"),
    (Mode::Phrygian, 1, "flat 2nd", -2, "dark, Spanish-tinged"),
    (Mode::Locrian, 6, "flat 5th", -3, "unstable, unresolved"),
];

const EMOTIONS: [(ChordQuality, &str); 21] = [
    (ChordQuality::Major, "bright, stable"),
    (ChordQuality::Minor, "melancholy, introspective"),
    (ChordQuality::Diminished, "tense, unstable"),
    (ChordQuality::Augmented, "dreamlike, unresolved"),
    (ChordQuality::Sus2, "open, airy"),
    (ChordQuality::Sus4, "expectant"),
    (ChordQuality::Major6, "sweet, nostalgic"),
    (ChordQuality::Minor6, "bittersweet"),
    (ChordQuality::Dominant7, "restless, bluesy"),
    (ChordQuality::Major7, "lush, reflective"),
    (ChordQuality::Minor7, "mellow, soulful"),
    (ChordQuality::HalfDiminished7, "yearning"),
    (ChordQuality::Diminished7, "dramatic, suspenseful"),
    (ChordQuality::MinorMajor7, "mysterious"),
    (ChordQuality::Dominant7Sus4, "floating"),
    (ChordQuality::Add9, "shimmering"),
    (ChordQuality::MinorAdd9, "wistful"),
    (ChordQuality::Dominant9, "funky"),
    (ChordQuality::Major9, "serene"),
    (ChordQuality::Minor9, "smooth, late-night"),
    (ChordQuality::Dominant13, "sophisticated"),
];

// (mode, from degree, to degree, name, emotion)
const CADENCES: [(KeyMode, u8, u8, &str, &str); 14] = [
    (KeyMode::Major, 7, 0, "authentic", "resolution"),
    (KeyMode::Major, 11, 0, "leading-tone", "resolution"),
    (KeyMode::Major, 5, 0, "plagal", "warmth, affirmation"),
    (KeyMode::Major, 7, 9, "deceptive", "surprise"),
    (KeyMode::Major, 10, 0, "backdoor", "nostalgic release"),
    (KeyMode::Major, 8, 0, "aeolian", "heroic"),
    (KeyMode::Major, 2, 7, "half", "suspense"),
    (KeyMode::Major, 5, 7, "half", "suspense"),
    (KeyMode::Minor, 7, 0, "authentic", "resolution"),
    (KeyMode::Minor, 5, 0, "plagal", "solemn acceptance"),
    (KeyMode::Minor, 7, 8, "deceptive", "surprise"),
    (KeyMode::Minor, 10, 0, "aeolian", "defiant"),
    (KeyMode::Minor, 1, 0, "phrygian", "dark resolution"),
    (KeyMode::Minor, 5, 7, "half", "suspense"),
];

/// All built-in tables, in their canonical order.
pub fn builtin_tables() -> KnowledgeTables {
    KnowledgeTables {
        notes: PitchClass::ALL
            .iter()
            .map(|&pc| NoteRecord {
                pitch_class: pc,
                name: pc.name().to_string(),
                // Octave 4, equal temperament around A4
                frequency_hz: A4_HZ * 2f64.powf((pc.semitone() as f64 - 9.0) / 12.0),
            })
            .collect(),
        intervals: INTERVALS
            .iter()
            .map(|&(semitones, name, short_name, consonance)| IntervalRecord {
                semitones,
                name: name.to_string(),
                short_name: short_name.to_string(),
                consonance: consonance.to_string(),
            })
            .collect(),
        scales: SCALES
            .iter()
            .map(|&(name, tones, family)| ScaleRecord {
                name: name.to_string(),
                tones: ToneSet::from_semitones(tones.iter().copied()),
                family: family.to_string(),
            })
            .collect(),
        chords: CHORDS
            .iter()
            .map(|&(quality, tones, preference, scale)| ChordTemplate {
                quality,
                tones: ToneSet::from_semitones(tones.iter().copied()),
                preference,
                scale_relationship: scale.to_string(),
            })
            .collect(),
        functions: FUNCTIONS
            .iter()
            .map(|&(mode, degree, numeral, function)| FunctionRecord {
                mode,
                degree,
                numeral: numeral.to_string(),
                function,
            })
            .collect(),
        modes: MODES
            .iter()
            .map(|&(mode, degree, characteristic, brightness, description)| ModalRecord {
                mode,
                characteristic_degree: degree,
                characteristic: characteristic.to_string(),
                brightness,
                description: description.to_string(),
            })
            .collect(),
        emotions: EMOTIONS
            .iter()
            .map(|&(quality, archetype)| EmotionRecord {
                quality,
                archetype: archetype.to_string(),
            })
            .collect(),
        cadences: CADENCES
            .iter()
            .map(|&(mode, from_degree, to_degree, name, emotion)| CadenceRecord {
                mode,
                from_degree,
                to_degree,
                name: name.to_string(),
                emotion: emotion.to_string(),
            })
            .collect(),
    }
}
