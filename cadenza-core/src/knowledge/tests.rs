use std::path::PathBuf;

use rusqlite::Connection;

use cadenza_types::{ChordQuality, HarmonicFunction, KeyMode, Mode, PitchClass, ToneSet};

use super::*;

fn temp_db_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("knowledge.sqlite")
}

#[test]
fn builtin_tables_are_complete() {
    let kb = KnowledgeBase::builtin().unwrap();
    let tables = kb.tables();
    assert_eq!(tables.notes.len(), 12);
    assert_eq!(tables.intervals.len(), 13);
    assert_eq!(tables.chords.len(), ChordQuality::ALL.len());
    assert_eq!(tables.emotions.len(), ChordQuality::ALL.len());
    assert_eq!(tables.modes.len(), Mode::ALL.len());
    for chord in &tables.chords {
        assert!(chord.tones.contains(0), "{} has no root", chord.quality);
    }
}

#[test]
fn a4_frequency() {
    let kb = KnowledgeBase::builtin().unwrap();
    let a = kb.note(PitchClass::A).unwrap().unwrap();
    assert!((a.frequency_hz - 440.0).abs() < 1e-9);
    assert!((a.frequency_of(57) - 220.0).abs() < 1e-9);
    let c = kb.note(PitchClass::C).unwrap().unwrap();
    assert!((c.frequency_hz - 261.6256).abs() < 1e-3);
}

#[test]
fn exact_tone_lookup() {
    let kb = KnowledgeBase::builtin().unwrap();
    let found = kb.chords_with_tones(ToneSet::from_semitones([0, 4, 7])).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].quality, ChordQuality::Major);

    let none = kb.chords_with_tones(ToneSet::from_semitones([0, 1, 2])).unwrap();
    assert!(none.is_empty());
}

#[test]
fn prefix_lookups() {
    let kb = KnowledgeBase::builtin().unwrap();
    let m7: Vec<ChordQuality> = kb
        .chords_by_prefix("m7")
        .unwrap()
        .iter()
        .map(|c| c.quality)
        .collect();
    assert_eq!(m7, vec![ChordQuality::Minor7, ChordQuality::HalfDiminished7]);

    let m_scales: Vec<&str> = kb
        .scales("m")
        .unwrap()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(
        m_scales,
        vec!["major", "major pentatonic", "melodic minor", "minor pentatonic", "mixolydian"]
    );
}

#[test]
fn scale_lookup_ignores_case() {
    let kb = KnowledgeBase::builtin().unwrap();
    let dorian = kb.scale("Dorian").unwrap().unwrap();
    assert_eq!(dorian.tones, ToneSet::from_semitones([0, 2, 3, 5, 7, 9, 10]));
    assert!(kb.scale("bebop").unwrap().is_none());
}

#[test]
fn functional_and_cadence_lookup() {
    let kb = KnowledgeBase::builtin().unwrap();
    let v = kb.function(KeyMode::Major, 7).unwrap().unwrap();
    assert_eq!(v.numeral, "V");
    assert_eq!(v.function, HarmonicFunction::Dominant);
    assert!(kb.function(KeyMode::Major, 1).unwrap().is_none());

    let authentic = kb.cadence(KeyMode::Major, 7, 0).unwrap().unwrap();
    assert_eq!(authentic.name, "authentic");
    assert_eq!(kb.interval(7).unwrap().unwrap().name, "perfect fifth");
}

#[test]
fn save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);
    let kb = KnowledgeBase::builtin().unwrap();

    save_knowledge(&path, &kb).unwrap();
    let loaded = KnowledgeBase::open(&path).unwrap();
    assert_eq!(loaded.tables(), kb.tables());
}

#[test]
fn save_twice_replaces_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);
    let kb = KnowledgeBase::builtin().unwrap();

    save_knowledge(&path, &kb).unwrap();
    save_knowledge(&path, &kb).unwrap();
    let loaded = KnowledgeBase::open(&path).unwrap();
    assert_eq!(loaded.tables().chords.len(), kb.tables().chords.len());
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = KnowledgeBase::open(&dir.path().join("absent.sqlite")).unwrap_err();
    assert!(matches!(err, KnowledgeError::NotFound(_)));
}

#[test]
fn missing_table_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE notes (pitch_class INTEGER, name TEXT, frequency_hz REAL);")
        .unwrap();
    drop(conn);

    let err = KnowledgeBase::open(&path).unwrap_err();
    assert!(matches!(err, KnowledgeError::MissingSchema("intervals")));
}

#[test]
fn other_format_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);
    save_knowledge(&path, &KnowledgeBase::builtin().unwrap()).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE schema_version SET version = 99", []).unwrap();
    drop(conn);

    let err = KnowledgeBase::open(&path).unwrap_err();
    assert!(matches!(err, KnowledgeError::VersionMismatch { found: 99, expected: 1 }));
}

#[test]
fn missing_version_row_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);
    save_knowledge(&path, &KnowledgeBase::builtin().unwrap()).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute("DELETE FROM schema_version", []).unwrap();
    drop(conn);

    let err = KnowledgeBase::open(&path).unwrap_err();
    assert!(matches!(err, KnowledgeError::MissingSchema("schema_version")));
}

#[test]
fn empty_table_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);
    let kb = KnowledgeBase::builtin().unwrap();
    save_knowledge(&path, &kb).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute("DELETE FROM chords", []).unwrap();
    drop(conn);

    let err = KnowledgeBase::open(&path).unwrap_err();
    assert!(matches!(err, KnowledgeError::EmptyTable("chords")));
}

#[test]
fn undecodable_row_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_db_path(&dir);
    let kb = KnowledgeBase::builtin().unwrap();
    save_knowledge(&path, &kb).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE chords SET tones = '[0, 4, 19]' WHERE quality = 'major'",
        [],
    )
    .unwrap();
    drop(conn);

    let err = KnowledgeBase::open(&path).unwrap_err();
    assert!(matches!(err, KnowledgeError::Decode { table: "chords", .. }));
}

#[test]
fn empty_tables_are_rejected_in_memory() {
    let err = KnowledgeBase::from_tables(KnowledgeTables::default()).unwrap_err();
    assert!(matches!(err, KnowledgeError::EmptyTable("notes")));
}
