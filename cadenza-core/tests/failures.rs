mod common;

use std::sync::Arc;

use cadenza_core::config::Config;
use cadenza_core::knowledge::{
    save_knowledge, ChordTemplate, CadenceRecord, EmotionRecord, FunctionRecord, IntervalRecord, ModalRecord,
    NoteRecord, ScaleRecord,
};
use cadenza_core::{AnalysisError, Analyzer, AnalyzerSettings, KnowledgeBase, KnowledgeError, KnowledgeReader, Stage};
use cadenza_types::{ChordQuality, KeyMode, Meter, Mode, NoteEvent, PitchClass, ToneSet};

use common::{chord, chords, line, session};

/// Reader whose backing store is gone.
struct FailingReader;

fn gone<T>() -> Result<T, KnowledgeError> {
    Err(KnowledgeError::Reader("store offline".into()))
}

impl KnowledgeReader for FailingReader {
    fn chord_templates(&self) -> Result<&[ChordTemplate], KnowledgeError> {
        gone()
    }
    fn chords_with_tones(&self, _: ToneSet) -> Result<Vec<&ChordTemplate>, KnowledgeError> {
        gone()
    }
    fn chords_by_prefix(&self, _: &str) -> Result<Vec<&ChordTemplate>, KnowledgeError> {
        gone()
    }
    fn scale(&self, _: &str) -> Result<Option<&ScaleRecord>, KnowledgeError> {
        gone()
    }
    fn scales(&self, _: &str) -> Result<Vec<&ScaleRecord>, KnowledgeError> {
        gone()
    }
    fn interval(&self, _: u8) -> Result<Option<&IntervalRecord>, KnowledgeError> {
        gone()
    }
    fn note(&self, _: PitchClass) -> Result<Option<&NoteRecord>, KnowledgeError> {
        gone()
    }
    fn function(&self, _: KeyMode, _: u8) -> Result<Option<&FunctionRecord>, KnowledgeError> {
        gone()
    }
    fn modal_character(&self, _: Mode) -> Result<Option<&ModalRecord>, KnowledgeError> {
        gone()
    }
    fn emotion_for_quality(&self, _: ChordQuality) -> Result<Option<&EmotionRecord>, KnowledgeError> {
        gone()
    }
    fn cadence(&self, _: KeyMode, _: u8, _: u8) -> Result<Option<&CadenceRecord>, KnowledgeError> {
        gone()
    }
}

fn failing() -> Analyzer {
    Analyzer::new(Arc::new(FailingReader), AnalyzerSettings::default())
}

#[test]
fn unreachable_knowledge_fails_matching() {
    let err = failing().analyze(&session(1, chord(&[60, 64, 67], 0.0))).unwrap_err();
    match err {
        AnalysisError::KnowledgeBaseUnavailable { stage, source } => {
            assert_eq!(stage, Stage::Matching);
            assert!(matches!(source, KnowledgeError::Reader(_)));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn unreachable_knowledge_fails_composition_without_chords() {
    let err = failing().analyze(&session(2, line(&[60, 62, 64, 65], 0.0, 0.5))).unwrap_err();
    assert_eq!(err.stage(), Stage::Composition);
    assert!(err.to_string().contains("store offline"));
}

#[test]
fn failure_leaves_nothing_cached() {
    let analyzer = failing();
    assert!(analyzer.analyze(&session(3, chord(&[60, 64, 67], 0.0))).is_err());
    assert!(analyzer.cache().is_empty());
}

#[test]
fn malformed_sessions_are_rejected_before_analysis() {
    let analyzer = common::analyzer();

    let err = analyzer.analyze(&session(4, Vec::new())).unwrap_err();
    assert!(matches!(err, AnalysisError::MalformedInput { stage: Stage::Validation, .. }));

    let out_of_order = vec![NoteEvent::new(60, 80, 1.0), NoteEvent::new(64, 80, 0.5)];
    let err = analyzer.analyze(&session(5, out_of_order)).unwrap_err();
    assert!(err.to_string().contains("event 1"));

    let bad_meter = session(6, chord(&[60, 64, 67], 0.0)).with_meter(Meter::new(f32::NAN, (4, 4)));
    assert_eq!(analyzer.analyze(&bad_meter).unwrap_err().stage(), Stage::Validation);
    assert!(analyzer.cache().is_empty());
}

#[test]
fn missing_database_fails_knowledge_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.db");
    let config = Config::from_toml_str(&format!("[knowledge]\ndatabase = {:?}\n", path.display().to_string())).unwrap();

    match Analyzer::from_config(&config) {
        Err(AnalysisError::KnowledgeBaseUnavailable { stage, source }) => {
            assert_eq!(stage, Stage::KnowledgeLoad);
            assert!(matches!(source, KnowledgeError::NotFound(_)));
        }
        Err(other) => panic!("unexpected {:?}", other),
        Ok(_) => panic!("expected a load failure"),
    }
}

#[test]
fn exported_database_analyzes_like_the_builtin_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge.db");
    save_knowledge(&path, &KnowledgeBase::builtin().unwrap()).unwrap();

    let config = Config::from_toml_str(&format!("[knowledge]\ndatabase = {:?}\n", path.display().to_string())).unwrap();
    let from_file = Analyzer::from_config(&config).unwrap();
    let builtin = Analyzer::from_config(&Config::embedded()).unwrap();

    let s = session(
        7,
        chords(&[&[50, 53, 57, 60][..], &[55, 59, 62, 65][..], &[48, 52, 55, 59][..]], 0.0, 1.0),
    );
    assert_eq!(from_file.analyze(&s).unwrap(), builtin.analyze(&s).unwrap());
}
