//! Read-only music-theory lookup tables.
//!
//! The [`KnowledgeBase`] is built once (from the built-in tables or a SQLite
//! file written by [`save_knowledge`]) and then shared behind an `Arc`. All
//! lookups go through the [`KnowledgeReader`] trait so the analyzer can be
//! handed any reader, including ones that fail.

mod builtin;
pub mod load;
pub mod save;
pub mod schema;
#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::Path;

use rusqlite::Connection as SqlConnection;

use cadenza_types::{ChordQuality, HarmonicFunction, KeyMode, Mode, PitchClass, ToneSet};

use crate::error::KnowledgeError;

pub use builtin::builtin_tables;

/// Pitch-class name and the frequency of its octave-4 note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    pub pitch_class: PitchClass,
    pub name: String,
    pub frequency_hz: f64,
}

impl NoteRecord {
    /// Equal-tempered frequency of a MIDI pitch, scaled from this record.
    pub fn frequency_of(&self, pitch: u8) -> f64 {
        let octave = (pitch / 12) as i32 - 5;
        self.frequency_hz * 2f64.powi(octave)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRecord {
    /// 0-12; 12 is the octave
    pub semitones: u8,
    pub name: String,
    pub short_name: String,
    /// "perfect", "imperfect" or "dissonant"
    pub consonance: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleRecord {
    pub name: String,
    pub tones: ToneSet,
    pub family: String,
}

/// Chord shape with root at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordTemplate {
    pub quality: ChordQuality,
    pub tones: ToneSet,
    /// Tie-break weight between equally covering shapes (0-1)
    pub preference: f64,
    pub scale_relationship: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    pub mode: KeyMode,
    /// Root distance above the tonic in semitones
    pub degree: u8,
    pub numeral: String,
    pub function: HarmonicFunction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalRecord {
    pub mode: Mode,
    pub characteristic_degree: u8,
    pub characteristic: String,
    pub brightness: i8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmotionRecord {
    pub quality: ChordQuality,
    pub archetype: String,
}

/// Named motion between two scale degrees with its emotional reading.
#[derive(Debug, Clone, PartialEq)]
pub struct CadenceRecord {
    pub mode: KeyMode,
    pub from_degree: u8,
    pub to_degree: u8,
    pub name: String,
    pub emotion: String,
}

/// Raw table contents, as stored and as loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeTables {
    pub notes: Vec<NoteRecord>,
    pub intervals: Vec<IntervalRecord>,
    pub scales: Vec<ScaleRecord>,
    pub chords: Vec<ChordTemplate>,
    pub functions: Vec<FunctionRecord>,
    pub modes: Vec<ModalRecord>,
    pub emotions: Vec<EmotionRecord>,
    pub cadences: Vec<CadenceRecord>,
}

/// Lookup interface the matcher and composer read through.
///
/// `Ok(None)` means the table has no such row; `Err` means the store itself
/// failed and analysis cannot go on.
pub trait KnowledgeReader: Send + Sync {
    /// Every chord shape, in table order.
    fn chord_templates(&self) -> Result<&[ChordTemplate], KnowledgeError>;
    /// Chord shapes whose root-relative tones equal `tones` exactly.
    fn chords_with_tones(&self, tones: ToneSet) -> Result<Vec<&ChordTemplate>, KnowledgeError>;
    /// Chord shapes whose symbol suffix starts with `prefix` ("m7" finds m7 and m7b5).
    fn chords_by_prefix(&self, prefix: &str) -> Result<Vec<&ChordTemplate>, KnowledgeError>;
    fn scale(&self, name: &str) -> Result<Option<&ScaleRecord>, KnowledgeError>;
    /// Scales whose lower-cased name starts with `prefix`.
    fn scales(&self, prefix: &str) -> Result<Vec<&ScaleRecord>, KnowledgeError>;
    fn interval(&self, semitones: u8) -> Result<Option<&IntervalRecord>, KnowledgeError>;
    fn note(&self, pitch_class: PitchClass) -> Result<Option<&NoteRecord>, KnowledgeError>;
    fn function(&self, mode: KeyMode, degree: u8) -> Result<Option<&FunctionRecord>, KnowledgeError>;
    fn modal_character(&self, mode: Mode) -> Result<Option<&ModalRecord>, KnowledgeError>;
    fn emotion_for_quality(&self, quality: ChordQuality) -> Result<Option<&EmotionRecord>, KnowledgeError>;
    fn cadence(&self, mode: KeyMode, from: u8, to: u8) -> Result<Option<&CadenceRecord>, KnowledgeError>;
}

/// Indexed, immutable knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    tables: KnowledgeTables,
    notes: HashMap<PitchClass, usize>,
    intervals: HashMap<u8, usize>,
    scales: BTreeMap<String, usize>,
    chords_by_tones: HashMap<ToneSet, Vec<usize>>,
    chords_by_suffix: BTreeMap<&'static str, usize>,
    functions: HashMap<(KeyMode, u8), usize>,
    modes: HashMap<Mode, usize>,
    emotions: HashMap<ChordQuality, usize>,
    cadences: HashMap<(KeyMode, u8, u8), usize>,
}

impl KnowledgeBase {
    /// The built-in tables compiled into the binary.
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::from_tables(builtin_tables())
    }

    /// Load from a SQLite file written by [`save_knowledge`].
    pub fn open(path: &Path) -> Result<Self, KnowledgeError> {
        if !path.exists() {
            return Err(KnowledgeError::NotFound(path.to_path_buf()));
        }
        let conn = SqlConnection::open(path)?;
        let tables = load::load_tables(&conn)?;
        let kb = Self::from_tables(tables)?;
        log::info!(
            target: "knowledge",
            "loaded {} chords, {} scales from {}",
            kb.tables.chords.len(),
            kb.tables.scales.len(),
            path.display()
        );
        Ok(kb)
    }

    /// Index the tables. Every table must have at least one row.
    pub fn from_tables(tables: KnowledgeTables) -> Result<Self, KnowledgeError> {
        require_rows(schema::NOTES, tables.notes.len())?;
        require_rows(schema::INTERVALS, tables.intervals.len())?;
        require_rows(schema::SCALES, tables.scales.len())?;
        require_rows(schema::CHORDS, tables.chords.len())?;
        require_rows(schema::FUNCTIONAL_HARMONY, tables.functions.len())?;
        require_rows(schema::MODAL_CHARACTERISTICS, tables.modes.len())?;
        require_rows(schema::CHORD_EMOTIONS, tables.emotions.len())?;
        require_rows(schema::CADENCES, tables.cadences.len())?;

        let mut chords_by_tones: HashMap<ToneSet, Vec<usize>> = HashMap::new();
        for (i, chord) in tables.chords.iter().enumerate() {
            chords_by_tones.entry(chord.tones).or_default().push(i);
        }

        let kb = KnowledgeBase {
            notes: index(&tables.notes, |n| n.pitch_class),
            intervals: index(&tables.intervals, |i| i.semitones),
            scales: tables
                .scales
                .iter()
                .enumerate()
                .map(|(i, s)| (s.name.to_lowercase(), i))
                .collect(),
            chords_by_tones,
            chords_by_suffix: tables
                .chords
                .iter()
                .enumerate()
                .map(|(i, c)| (c.quality.suffix(), i))
                .collect(),
            functions: index(&tables.functions, |f| (f.mode, f.degree)),
            modes: index(&tables.modes, |m| m.mode),
            emotions: index(&tables.emotions, |e| e.quality),
            cadences: index(&tables.cadences, |c| (c.mode, c.from_degree, c.to_degree)),
            tables,
        };
        Ok(kb)
    }

    pub fn tables(&self) -> &KnowledgeTables {
        &self.tables
    }
}

fn require_rows(table: &'static str, rows: usize) -> Result<(), KnowledgeError> {
    if rows == 0 {
        Err(KnowledgeError::EmptyTable(table))
    } else {
        Ok(())
    }
}

fn index<T, K: std::hash::Hash + Eq>(rows: &[T], key: impl Fn(&T) -> K) -> HashMap<K, usize> {
    rows.iter().enumerate().map(|(i, row)| (key(row), i)).collect()
}

impl KnowledgeReader for KnowledgeBase {
    fn chord_templates(&self) -> Result<&[ChordTemplate], KnowledgeError> {
        Ok(&self.tables.chords)
    }

    fn chords_with_tones(&self, tones: ToneSet) -> Result<Vec<&ChordTemplate>, KnowledgeError> {
        Ok(self
            .chords_by_tones
            .get(&tones)
            .map(|ids| ids.iter().map(|&i| &self.tables.chords[i]).collect())
            .unwrap_or_default())
    }

    fn chords_by_prefix(&self, prefix: &str) -> Result<Vec<&ChordTemplate>, KnowledgeError> {
        Ok(self
            .chords_by_suffix
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(suffix, _)| suffix.starts_with(prefix))
            .map(|(_, &i)| &self.tables.chords[i])
            .collect())
    }

    fn scale(&self, name: &str) -> Result<Option<&ScaleRecord>, KnowledgeError> {
        Ok(self
            .scales
            .get(&name.to_lowercase())
            .map(|&i| &self.tables.scales[i]))
    }

    fn scales(&self, prefix: &str) -> Result<Vec<&ScaleRecord>, KnowledgeError> {
        let prefix = prefix.to_lowercase();
        Ok(self
            .scales
            .range(prefix.clone()..)
            .take_while(|(name, _)| name.starts_with(&prefix))
            .map(|(_, &i)| &self.tables.scales[i])
            .collect())
    }

    fn interval(&self, semitones: u8) -> Result<Option<&IntervalRecord>, KnowledgeError> {
        Ok(self.intervals.get(&semitones).map(|&i| &self.tables.intervals[i]))
    }

    fn note(&self, pitch_class: PitchClass) -> Result<Option<&NoteRecord>, KnowledgeError> {
        Ok(self.notes.get(&pitch_class).map(|&i| &self.tables.notes[i]))
    }

    fn function(&self, mode: KeyMode, degree: u8) -> Result<Option<&FunctionRecord>, KnowledgeError> {
        Ok(self
            .functions
            .get(&(mode, degree % 12))
            .map(|&i| &self.tables.functions[i]))
    }

    fn modal_character(&self, mode: Mode) -> Result<Option<&ModalRecord>, KnowledgeError> {
        Ok(self.modes.get(&mode).map(|&i| &self.tables.modes[i]))
    }

    fn emotion_for_quality(&self, quality: ChordQuality) -> Result<Option<&EmotionRecord>, KnowledgeError> {
        Ok(self.emotions.get(&quality).map(|&i| &self.tables.emotions[i]))
    }

    fn cadence(&self, mode: KeyMode, from: u8, to: u8) -> Result<Option<&CadenceRecord>, KnowledgeError> {
        Ok(self
            .cadences
            .get(&(mode, from % 12, to % 12))
            .map(|&i| &self.tables.cadences[i]))
    }
}

/// Write a knowledge base to a SQLite file, replacing its previous contents.
///
/// Uses WAL mode and one transaction, so a crash mid-write keeps the old data.
pub fn save_knowledge(path: &Path, kb: &KnowledgeBase) -> Result<(), KnowledgeError> {
    let conn = SqlConnection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;

    let tx = conn.unchecked_transaction()?;
    schema::create_tables(&tx)?;
    save::save_tables(&tx, kb.tables())?;
    tx.commit()?;

    log::info!(target: "knowledge", "wrote knowledge base to {}", path.display());
    Ok(())
}
