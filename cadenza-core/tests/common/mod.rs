#![allow(dead_code)]
//! Session builders shared by the cadenza-core integration tests.

use std::sync::Arc;

use cadenza_core::{Analyzer, AnalyzerSettings, KnowledgeBase};
use cadenza_types::{NoteEvent, Session, SessionId};

pub fn analyzer() -> Analyzer {
    analyzer_with(AnalyzerSettings::default())
}

pub fn analyzer_with(settings: AnalyzerSettings) -> Analyzer {
    let kb = KnowledgeBase::builtin().expect("built-in knowledge base");
    Analyzer::new(Arc::new(kb), settings)
}

pub fn session(id: u64, events: Vec<NoteEvent>) -> Session {
    Session::new(SessionId::new(id), events)
}

/// All pitches struck together at `onset`.
pub fn chord(pitches: &[u8], onset: f64) -> Vec<NoteEvent> {
    pitches.iter().map(|&p| NoteEvent::new(p, 80, onset)).collect()
}

/// A chord per entry, `spacing` seconds apart, starting at `start`.
pub fn chords(voicings: &[&[u8]], start: f64, spacing: f64) -> Vec<NoteEvent> {
    voicings
        .iter()
        .enumerate()
        .flat_map(|(i, pitches)| chord(pitches, start + i as f64 * spacing))
        .collect()
}

/// Single notes at even spacing, one pitch per onset.
pub fn line(pitches: &[u8], start: f64, spacing: f64) -> Vec<NoteEvent> {
    pitches
        .iter()
        .enumerate()
        .map(|(i, &p)| NoteEvent::new(p, 80, start + i as f64 * spacing))
        .collect()
}
