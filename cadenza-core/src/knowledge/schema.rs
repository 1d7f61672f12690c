use rusqlite::{Connection, Result as SqlResult};

/// Schema version of the knowledge-base file format.
pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_VERSION_TABLE: &str = "schema_version";
pub const NOTES: &str = "notes";
pub const INTERVALS: &str = "intervals";
pub const SCALES: &str = "scales";
pub const CHORDS: &str = "chords";
pub const FUNCTIONAL_HARMONY: &str = "functional_harmony";
pub const MODAL_CHARACTERISTICS: &str = "modal_characteristics";
pub const CHORD_EMOTIONS: &str = "chord_emotions";
pub const CADENCES: &str = "cadences";

/// Every lookup table a loadable file must have.
pub const REQUIRED_TABLES: [&str; 8] = [
    NOTES,
    INTERVALS,
    SCALES,
    CHORDS,
    FUNCTIONAL_HARMONY,
    MODAL_CHARACTERISTICS,
    CHORD_EMOTIONS,
    CADENCES,
];

/// Create all tables and indexes.
pub fn create_tables(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(SCHEMA_SQL)
}

/// Delete all rows from all tables (preserving schema).
pub fn delete_all_data(conn: &Connection) -> SqlResult<()> {
    conn.execute_batch(DELETE_ALL_SQL)
}

// Tone sets are stored as JSON arrays of root-relative semitones ("[0,4,7]").
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notes (
    pitch_class INTEGER PRIMARY KEY CHECK (pitch_class BETWEEN 0 AND 11),
    name TEXT NOT NULL,
    frequency_hz REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS intervals (
    semitones INTEGER PRIMARY KEY CHECK (semitones BETWEEN 0 AND 12),
    name TEXT NOT NULL,
    short_name TEXT NOT NULL,
    consonance TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scales (
    name TEXT PRIMARY KEY,
    tones TEXT NOT NULL,
    family TEXT NOT NULL,
    position INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS chords (
    quality TEXT PRIMARY KEY,
    tones TEXT NOT NULL,
    preference REAL NOT NULL,
    scale_relationship TEXT NOT NULL,
    position INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_chords_tones ON chords(tones);

CREATE TABLE IF NOT EXISTS functional_harmony (
    mode TEXT NOT NULL,
    degree INTEGER NOT NULL,
    numeral TEXT NOT NULL,
    function TEXT NOT NULL,
    PRIMARY KEY (mode, degree)
);

CREATE TABLE IF NOT EXISTS modal_characteristics (
    mode TEXT PRIMARY KEY,
    characteristic_degree INTEGER NOT NULL,
    characteristic TEXT NOT NULL,
    brightness INTEGER NOT NULL,
    description TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chord_emotions (
    quality TEXT PRIMARY KEY,
    archetype TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cadences (
    mode TEXT NOT NULL,
    from_degree INTEGER NOT NULL,
    to_degree INTEGER NOT NULL,
    name TEXT NOT NULL,
    emotion TEXT NOT NULL,
    PRIMARY KEY (mode, from_degree, to_degree)
);
";

const DELETE_ALL_SQL: &str = "
DELETE FROM cadences;
DELETE FROM chord_emotions;
DELETE FROM modal_characteristics;
DELETE FROM functional_harmony;
DELETE FROM chords;
DELETE FROM scales;
DELETE FROM intervals;
DELETE FROM notes;
DELETE FROM schema_version;
";
