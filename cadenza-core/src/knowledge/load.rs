use rusqlite::{params, Connection, Result as SqlResult, Row};

use cadenza_types::{ChordQuality, HarmonicFunction, KeyMode, Mode, PitchClass, ToneSet};

use super::schema::{self, REQUIRED_TABLES, SCHEMA_VERSION, SCHEMA_VERSION_TABLE};
use super::{
    CadenceRecord, ChordTemplate, EmotionRecord, FunctionRecord, IntervalRecord, KnowledgeTables,
    ModalRecord, NoteRecord, ScaleRecord,
};
use crate::error::KnowledgeError;

/// Read every lookup table. Fails on the first missing table, a file written
/// in another format version, or an undecodable row.
pub fn load_tables(conn: &Connection) -> Result<KnowledgeTables, KnowledgeError> {
    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(KnowledgeError::MissingSchema(table));
        }
    }
    check_version(conn)?;

    Ok(KnowledgeTables {
        notes: load_notes(conn)?,
        intervals: load_intervals(conn)?,
        scales: load_scales(conn)?,
        chords: load_chords(conn)?,
        functions: load_functions(conn)?,
        modes: load_modes(conn)?,
        emotions: load_emotions(conn)?,
        cadences: load_cadences(conn)?,
    })
}

fn check_version(conn: &Connection) -> Result<(), KnowledgeError> {
    if !table_exists(conn, SCHEMA_VERSION_TABLE)? {
        return Err(KnowledgeError::MissingSchema(SCHEMA_VERSION_TABLE));
    }
    let stored: Option<i32> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    match stored {
        None => Err(KnowledgeError::MissingSchema(SCHEMA_VERSION_TABLE)),
        Some(found) if found != SCHEMA_VERSION => Err(KnowledgeError::VersionMismatch {
            found,
            expected: SCHEMA_VERSION,
        }),
        Some(_) => Ok(()),
    }
}

pub(super) fn table_exists(conn: &Connection, name: &str) -> SqlResult<bool> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn decode_error(table: &'static str, detail: impl Into<String>) -> KnowledgeError {
    KnowledgeError::Decode {
        table,
        detail: detail.into(),
    }
}

fn decode_tones(table: &'static str, json: &str) -> Result<ToneSet, KnowledgeError> {
    let offsets: Vec<u8> =
        serde_json::from_str(json).map_err(|e| decode_error(table, format!("tones {:?}: {}", json, e)))?;
    if let Some(bad) = offsets.iter().find(|&&s| s > 11) {
        return Err(decode_error(table, format!("tone {} outside the octave", bad)));
    }
    Ok(ToneSet::from_semitones(offsets))
}

fn decode_quality(table: &'static str, s: &str) -> Result<ChordQuality, KnowledgeError> {
    ChordQuality::from_name(s).ok_or_else(|| decode_error(table, format!("unknown chord quality {:?}", s)))
}

fn decode_key_mode(table: &'static str, s: &str) -> Result<KeyMode, KnowledgeError> {
    match s {
        "major" => Ok(KeyMode::Major),
        "minor" => Ok(KeyMode::Minor),
        other => Err(decode_error(table, format!("unknown key mode {:?}", other))),
    }
}

fn decode_degree(table: &'static str, degree: i64) -> Result<u8, KnowledgeError> {
    if (0..12).contains(&degree) {
        Ok(degree as u8)
    } else {
        Err(decode_error(table, format!("degree {} outside 0-11", degree)))
    }
}

/// Collect raw rows; decoding happens afterwards so errors can name the table.
fn rows<T>(conn: &Connection, sql: &str, f: impl FnMut(&Row<'_>) -> SqlResult<T>) -> SqlResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], f)?.collect::<SqlResult<Vec<_>>>()?;
    Ok(rows)
}

fn load_notes(conn: &Connection) -> Result<Vec<NoteRecord>, KnowledgeError> {
    let raw: Vec<(i64, String, f64)> = rows(
        conn,
        "SELECT pitch_class, name, frequency_hz FROM notes ORDER BY pitch_class",
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    raw.into_iter()
        .map(|(pc, name, frequency_hz)| {
            let pc = decode_degree(schema::NOTES, pc)?;
            Ok(NoteRecord {
                pitch_class: PitchClass::from_semitone(pc as i32),
                name,
                frequency_hz,
            })
        })
        .collect()
}

fn load_intervals(conn: &Connection) -> Result<Vec<IntervalRecord>, KnowledgeError> {
    let raw: Vec<(i64, String, String, String)> = rows(
        conn,
        "SELECT semitones, name, short_name, consonance FROM intervals ORDER BY semitones",
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;
    raw.into_iter()
        .map(|(semitones, name, short_name, consonance)| {
            if !(0..=12).contains(&semitones) {
                return Err(decode_error(schema::INTERVALS, format!("{} semitones", semitones)));
            }
            Ok(IntervalRecord {
                semitones: semitones as u8,
                name,
                short_name,
                consonance,
            })
        })
        .collect()
}

fn load_scales(conn: &Connection) -> Result<Vec<ScaleRecord>, KnowledgeError> {
    let raw: Vec<(String, String, String)> = rows(
        conn,
        "SELECT name, tones, family FROM scales ORDER BY position",
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    raw.into_iter()
        .map(|(name, tones, family)| {
            Ok(ScaleRecord {
                tones: decode_tones(schema::SCALES, &tones)?,
                name,
                family,
            })
        })
        .collect()
}

fn load_chords(conn: &Connection) -> Result<Vec<ChordTemplate>, KnowledgeError> {
    let raw: Vec<(String, String, f64, String)> = rows(
        conn,
        "SELECT quality, tones, preference, scale_relationship FROM chords ORDER BY position",
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;
    raw.into_iter()
        .map(|(quality, tones, preference, scale_relationship)| {
            let tones = decode_tones(schema::CHORDS, &tones)?;
            if !tones.contains(0) {
                return Err(decode_error(schema::CHORDS, format!("{} has no root", quality)));
            }
            Ok(ChordTemplate {
                quality: decode_quality(schema::CHORDS, &quality)?,
                tones,
                preference: preference.clamp(0.0, 1.0),
                scale_relationship,
            })
        })
        .collect()
}

fn load_functions(conn: &Connection) -> Result<Vec<FunctionRecord>, KnowledgeError> {
    let raw: Vec<(String, i64, String, String)> = rows(
        conn,
        "SELECT mode, degree, numeral, function FROM functional_harmony ORDER BY mode, degree",
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
    )?;
    raw.into_iter()
        .map(|(mode, degree, numeral, function)| {
            let function = HarmonicFunction::from_name(&function).ok_or_else(|| {
                decode_error(schema::FUNCTIONAL_HARMONY, format!("unknown function {:?}", function))
            })?;
            Ok(FunctionRecord {
                mode: decode_key_mode(schema::FUNCTIONAL_HARMONY, &mode)?,
                degree: decode_degree(schema::FUNCTIONAL_HARMONY, degree)?,
                numeral,
                function,
            })
        })
        .collect()
}

fn load_modes(conn: &Connection) -> Result<Vec<ModalRecord>, KnowledgeError> {
    let raw: Vec<(String, i64, String, i64, String)> = rows(
        conn,
        "SELECT mode, characteristic_degree, characteristic, brightness, description
         FROM modal_characteristics ORDER BY rowid",
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
    )?;
    raw.into_iter()
        .map(|(mode, degree, characteristic, brightness, description)| {
            let mode = Mode::from_name(&mode)
                .ok_or_else(|| decode_error(schema::MODAL_CHARACTERISTICS, format!("unknown mode {:?}", mode)))?;
            Ok(ModalRecord {
                mode,
                characteristic_degree: decode_degree(schema::MODAL_CHARACTERISTICS, degree)?,
                characteristic,
                brightness: brightness.clamp(-3, 3) as i8,
                description,
            })
        })
        .collect()
}

fn load_emotions(conn: &Connection) -> Result<Vec<EmotionRecord>, KnowledgeError> {
    let raw: Vec<(String, String)> = rows(
        conn,
        "SELECT quality, archetype FROM chord_emotions ORDER BY rowid",
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    raw.into_iter()
        .map(|(quality, archetype)| {
            Ok(EmotionRecord {
                quality: decode_quality(schema::CHORD_EMOTIONS, &quality)?,
                archetype,
            })
        })
        .collect()
}

fn load_cadences(conn: &Connection) -> Result<Vec<CadenceRecord>, KnowledgeError> {
    let raw: Vec<(String, i64, i64, String, String)> = rows(
        conn,
        "SELECT mode, from_degree, to_degree, name, emotion FROM cadences ORDER BY rowid",
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
    )?;
    raw.into_iter()
        .map(|(mode, from, to, name, emotion)| {
            Ok(CadenceRecord {
                mode: decode_key_mode(schema::CADENCES, &mode)?,
                from_degree: decode_degree(schema::CADENCES, from)?,
                to_degree: decode_degree(schema::CADENCES, to)?,
                name,
                emotion,
            })
        })
        .collect()
}
