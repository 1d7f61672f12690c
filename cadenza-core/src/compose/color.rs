//! Comprehensive-tier readings that do not depend on functional harmony:
//! chord color techniques, modal character and register.

use cadenza_types::{
    ChordQuality, Key, KeyMode, ModalReading, Mode, NoteEvent, PitchClass, RegisterProfile, Technique, ToneSet,
};

use crate::error::KnowledgeError;
use crate::knowledge::KnowledgeReader;

/// MIDI C3 and C5: the register split points.
const LOW_REGISTER_END: u8 = 48;
const HIGH_REGISTER_START: u8 = 72;
const FIT_EPSILON: f64 = 1e-9;

/// Techniques visible in a single sounding pitch-class set.
pub fn chord_techniques(
    tones: ToneSet,
    quality: ChordQuality,
    knowledge: &dyn KnowledgeReader,
) -> Result<Vec<Technique>, KnowledgeError> {
    let mut found = Vec::new();
    if is_quartal(tones) {
        found.push(Technique::Quartal);
    }
    if has_cluster(tones) {
        found.push(Technique::Cluster);
    }
    let whole_tone = match knowledge.scale("whole tone")? {
        Some(scale) => scale.tones,
        None => ToneSet::from_semitones([0, 2, 4, 6, 8, 10]),
    };
    if tones.len() >= 3 && (tones.is_subset(whole_tone) || tones.is_subset(whole_tone.transpose(1))) {
        found.push(Technique::WholeTone);
    }
    if matches!(
        quality,
        ChordQuality::Add9
            | ChordQuality::MinorAdd9
            | ChordQuality::Dominant9
            | ChordQuality::Major9
            | ChordQuality::Minor9
            | ChordQuality::Dominant13
    ) {
        found.push(Technique::Extended);
    }
    Ok(found)
}

/// Three or more tones that stack in perfect fourths from one of them.
fn is_quartal(tones: ToneSet) -> bool {
    let n = tones.len();
    n >= 3
        && tones.iter().any(|root| {
            let stack = ToneSet::from_semitones((0..n as u8).map(|i| root + 5 * i));
            stack == tones
        })
}

fn has_cluster(tones: ToneSet) -> bool {
    (0..12u8).any(|s| tones.contains(s) && tones.contains(s + 1) && tones.contains(s + 2))
}

/// Best-fitting church mode on the key's tonic. Ties prefer the mode the key
/// itself implies (Ionian for major, Aeolian for minor).
pub fn modal_reading(
    histogram: &[f64; 12],
    key: Key,
    knowledge: &dyn KnowledgeReader,
) -> Result<ModalReading, KnowledgeError> {
    let total: f64 = histogram.iter().sum();
    let tonic = key.tonic.semitone();
    let home = match key.mode {
        KeyMode::Major => Mode::Ionian,
        KeyMode::Minor => Mode::Aeolian,
    };

    let mut best: Option<(Mode, f64)> = None;
    // Home mode first so that it wins ties
    let order = std::iter::once(home).chain(Mode::ALL.into_iter().filter(|m| *m != home));
    for mode in order {
        let relative = match knowledge.scale(&mode.name().to_lowercase())? {
            Some(scale) => scale.tones,
            None => ToneSet::from_semitones(mode.intervals().iter().copied()),
        };
        let inside: f64 = relative
            .transpose(tonic)
            .iter()
            .map(|pc| histogram[pc as usize])
            .sum();
        let fit = if total > 0.0 { inside / total } else { 0.0 };
        match best {
            Some((_, best_fit)) if fit <= best_fit + FIT_EPSILON => {}
            _ => best = Some((mode, fit)),
        }
    }
    let (mode, fit) = best.unwrap_or((home, 0.0));

    let reading = match knowledge.modal_character(mode)? {
        Some(record) => ModalReading {
            tonic: key.tonic,
            mode,
            fit,
            characteristic: record.characteristic.clone(),
            characteristic_present: histogram[((tonic + record.characteristic_degree) % 12) as usize] > 0.0,
            brightness: record.brightness,
            description: record.description.clone(),
        },
        None => ModalReading {
            tonic: key.tonic,
            mode,
            fit,
            characteristic: String::new(),
            characteristic_present: false,
            brightness: 0,
            description: String::new(),
        },
    };
    Ok(reading)
}

/// Pitch range, mean and register shares of the played notes. `None` for
/// an empty slice.
pub fn register_profile(
    events: &[NoteEvent],
    knowledge: &dyn KnowledgeReader,
) -> Result<Option<RegisterProfile>, KnowledgeError> {
    let (Some(lowest), Some(highest)) = (
        events.iter().map(|e| e.pitch).min(),
        events.iter().map(|e| e.pitch).max(),
    ) else {
        return Ok(None);
    };
    let n = events.len() as f64;
    let share = |pred: &dyn Fn(u8) -> bool| events.iter().filter(|e| pred(e.pitch)).count() as f64 / n;

    Ok(Some(RegisterProfile {
        lowest,
        highest,
        mean_pitch: events.iter().map(|e| e.pitch as f64).sum::<f64>() / n,
        lowest_hz: frequency(lowest, knowledge)?,
        highest_hz: frequency(highest, knowledge)?,
        low_share: share(&|p| p < LOW_REGISTER_END),
        middle_share: share(&|p| (LOW_REGISTER_END..HIGH_REGISTER_START).contains(&p)),
        high_share: share(&|p| p >= HIGH_REGISTER_START),
    }))
}

fn frequency(pitch: u8, knowledge: &dyn KnowledgeReader) -> Result<f64, KnowledgeError> {
    let pc = PitchClass::from_semitone(pitch as i32);
    Ok(match knowledge.note(pc)? {
        Some(note) => note.frequency_of(pitch),
        None => 440.0 * 2f64.powf((pitch as f64 - 69.0) / 12.0),
    })
}
