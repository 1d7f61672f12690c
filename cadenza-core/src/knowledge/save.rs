use rusqlite::{params, Connection, Result as SqlResult};

use cadenza_types::ToneSet;

use super::schema::{self, SCHEMA_VERSION};
use super::KnowledgeTables;

/// Replace every table's rows with `tables`. DELETE-all + INSERT-current.
pub fn save_tables(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    schema::delete_all_data(conn)?;

    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        params![SCHEMA_VERSION],
    )?;

    save_notes(conn, tables)?;
    save_intervals(conn, tables)?;
    save_scales(conn, tables)?;
    save_chords(conn, tables)?;
    save_functions(conn, tables)?;
    save_modes(conn, tables)?;
    save_emotions(conn, tables)?;
    save_cadences(conn, tables)?;

    Ok(())
}

pub(super) fn encode_tones(tones: ToneSet) -> SqlResult<String> {
    let offsets: Vec<u8> = tones.iter().collect();
    serde_json::to_string(&offsets).map_err(|e| rusqlite::Error::ToSqlConversionFailure(e.into()))
}

fn save_notes(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    let mut stmt =
        conn.prepare("INSERT INTO notes (pitch_class, name, frequency_hz) VALUES (?1, ?2, ?3)")?;
    for note in &tables.notes {
        stmt.execute(params![note.pitch_class.semitone(), note.name, note.frequency_hz])?;
    }
    Ok(())
}

fn save_intervals(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO intervals (semitones, name, short_name, consonance) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for interval in &tables.intervals {
        stmt.execute(params![
            interval.semitones,
            interval.name,
            interval.short_name,
            interval.consonance
        ])?;
    }
    Ok(())
}

fn save_scales(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    let mut stmt =
        conn.prepare("INSERT INTO scales (name, tones, family, position) VALUES (?1, ?2, ?3, ?4)")?;
    for (pos, scale) in tables.scales.iter().enumerate() {
        stmt.execute(params![scale.name, encode_tones(scale.tones)?, scale.family, pos as i64])?;
    }
    Ok(())
}

fn save_chords(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO chords (quality, tones, preference, scale_relationship, position)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (pos, chord) in tables.chords.iter().enumerate() {
        stmt.execute(params![
            chord.quality.name(),
            encode_tones(chord.tones)?,
            chord.preference,
            chord.scale_relationship,
            pos as i64
        ])?;
    }
    Ok(())
}

fn save_functions(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO functional_harmony (mode, degree, numeral, function) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for f in &tables.functions {
        stmt.execute(params![f.mode.name(), f.degree, f.numeral, f.function.name()])?;
    }
    Ok(())
}

fn save_modes(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO modal_characteristics (mode, characteristic_degree, characteristic, brightness, description)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for m in &tables.modes {
        stmt.execute(params![
            m.mode.name(),
            m.characteristic_degree,
            m.characteristic,
            m.brightness,
            m.description
        ])?;
    }
    Ok(())
}

fn save_emotions(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    let mut stmt = conn.prepare("INSERT INTO chord_emotions (quality, archetype) VALUES (?1, ?2)")?;
    for e in &tables.emotions {
        stmt.execute(params![e.quality.name(), e.archetype])?;
    }
    Ok(())
}

fn save_cadences(conn: &Connection, tables: &KnowledgeTables) -> SqlResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO cadences (mode, from_degree, to_degree, name, emotion) VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for c in &tables.cadences {
        stmt.execute(params![c.mode.name(), c.from_degree, c.to_degree, c.name, c.emotion])?;
    }
    Ok(())
}
