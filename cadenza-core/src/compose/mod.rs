//! Tiered analysis composer.
//!
//! Turns matcher output into beginner, intermediate and advanced views. Two
//! entry points: [`compose_moment`] for one identified chord (the result is
//! cached by the analyzer) and [`compose_session`] for the session as a
//! whole. Facets switched off in the [`FacetConfig`] are never computed.

pub mod color;
pub mod progression;
pub mod roman;

use cadenza_types::{
    ChordMatch, ChordQuality, ChordReading, Facet, FacetConfig, FacetValue, Key, KeyCenter, KeyEstimate,
    Modulation, NoteEvent, TieredAnalysis, ToneSet,
};

use crate::error::KnowledgeError;
use crate::harmony::{pitch_class_histogram, MatchResult};
use crate::knowledge::KnowledgeReader;

use progression::ProgressionStep;
use roman::{harmonic_function, roman_numeral};

/// Root-relative template tones moved onto the chord's root. Falls back to
/// the sounding tones if the quality has no template.
pub fn chord_tones(
    chord: &ChordMatch,
    sounding: ToneSet,
    knowledge: &dyn KnowledgeReader,
) -> Result<ToneSet, KnowledgeError> {
    Ok(knowledge
        .chord_templates()?
        .iter()
        .find(|t| t.quality == chord.quality)
        .map(|t| t.tones.transpose(chord.root.semitone()))
        .unwrap_or(sounding))
}

/// Per-moment facets for an identified chord. `None` for every other
/// matcher result: only identified chords get an analysis.
pub fn compose_moment(
    result: &MatchResult,
    sounding: ToneSet,
    key: &KeyEstimate,
    facets: &FacetConfig,
    knowledge: &dyn KnowledgeReader,
) -> Result<Option<TieredAnalysis>, KnowledgeError> {
    let MatchResult::Identified { matches, confidence } = result else {
        return Ok(None);
    };
    let best = &matches.best;
    let mut analysis = TieredAnalysis::new();

    if facets.is_enabled(Facet::ChordSymbol) {
        analysis.insert(
            Facet::ChordSymbol,
            FacetValue::Chord(ChordReading {
                symbol: best.symbol.clone(),
                quality: best.quality,
                confidence: *confidence,
                alternatives: matches.alternatives.iter().map(|m| m.symbol.clone()).collect(),
            }),
        );
    }

    if facets.is_enabled(Facet::RomanNumeral) || facets.is_enabled(Facet::HarmonicFunction) {
        let tones = chord_tones(best, sounding, knowledge)?;
        let numeral = roman_numeral(best.root, best.quality, tones, key.key, knowledge)?;
        if facets.is_enabled(Facet::HarmonicFunction) {
            let function = harmonic_function(&numeral, key.key, knowledge)?;
            analysis.insert(Facet::HarmonicFunction, FacetValue::Function(function));
        }
        if facets.is_enabled(Facet::RomanNumeral) {
            analysis.insert(Facet::RomanNumeral, FacetValue::RomanNumeral(numeral.roman));
        }
    }

    if facets.is_enabled(Facet::EmotionalArchetype) {
        let archetypes = knowledge
            .emotion_for_quality(best.quality)?
            .map(|r| vec![r.archetype.clone()])
            .unwrap_or_default();
        analysis.insert(Facet::EmotionalArchetype, FacetValue::Emotion(archetypes));
    }

    if facets.is_enabled(Facet::PostFunctional) {
        let techniques = color::chord_techniques(sounding, best.quality, knowledge)?;
        analysis.insert(Facet::PostFunctional, FacetValue::Techniques(techniques));
    }

    Ok(Some(analysis))
}

/// An identified chord in session order, with what was actually sounding.
#[derive(Debug, Clone)]
pub struct SessionChord<'a> {
    pub chord: &'a ChordMatch,
    pub sounding: ToneSet,
}

/// Everything the session-level facets read.
#[derive(Debug, Clone, Copy)]
pub struct SessionInput<'a> {
    pub events: &'a [NoteEvent],
    /// Length assumed for notes without a measured duration
    pub beat_seconds: f64,
    pub key: &'a KeyEstimate,
    pub modulations: &'a [Modulation],
    pub chords: &'a [SessionChord<'a>],
}

pub fn compose_session(
    input: SessionInput<'_>,
    facets: &FacetConfig,
    knowledge: &dyn KnowledgeReader,
) -> Result<TieredAnalysis, KnowledgeError> {
    let key = input.key.key;
    let mut analysis = TieredAnalysis::new();

    // Consecutive moments holding the same chord are one step
    let mut steps: Vec<ProgressionStep<'_>> = Vec::new();
    for sc in input.chords {
        if steps.last().is_some_and(|s| s.chord.symbol == sc.chord.symbol) {
            continue;
        }
        let tones = chord_tones(sc.chord, sc.sounding, knowledge)?;
        steps.push(ProgressionStep {
            chord: sc.chord,
            tones: sc.sounding,
            numeral: roman_numeral(sc.chord.root, sc.chord.quality, tones, key, knowledge)?,
        });
    }

    if facets.is_enabled(Facet::ChordSymbol) {
        let symbols = steps.iter().map(|s| s.chord.symbol.clone()).collect();
        analysis.insert(Facet::ChordSymbol, FacetValue::ChordSequence(symbols));
    }
    if facets.is_enabled(Facet::KeySuggestion) {
        analysis.insert(Facet::KeySuggestion, FacetValue::KeySuggestion(input.key.candidates.clone()));
    }

    if facets.is_enabled(Facet::KeyCenter) {
        analysis.insert(
            Facet::KeyCenter,
            FacetValue::KeyCenter(KeyCenter {
                key,
                confidence: input.key.confidence,
                modulations: input.modulations.to_vec(),
            }),
        );
    }
    if facets.is_enabled(Facet::Progression) {
        let summary = progression::summary(&steps, key, knowledge)?;
        analysis.insert(Facet::Progression, FacetValue::Progression(summary));
    }
    if facets.is_enabled(Facet::VoiceLeading) {
        analysis.insert(Facet::VoiceLeading, FacetValue::VoiceLeading(progression::voice_leading(&steps)));
    }

    if facets.is_enabled(Facet::ModalCharacter) {
        let histogram = pitch_class_histogram(input.events, input.beat_seconds);
        let reading = color::modal_reading(&histogram, key, knowledge)?;
        analysis.insert(Facet::ModalCharacter, FacetValue::Modal(reading));
    }
    if facets.is_enabled(Facet::EmotionalArchetype) {
        let arc = emotional_arc(&steps, key, knowledge)?;
        analysis.insert(Facet::EmotionalArchetype, FacetValue::Emotion(arc));
    }
    if facets.is_enabled(Facet::PostFunctional) {
        let mut techniques = Vec::new();
        for step in &steps {
            for t in color::chord_techniques(step.tones, step.chord.quality, knowledge)? {
                if !techniques.contains(&t) {
                    techniques.push(t);
                }
            }
        }
        for t in progression::progression_techniques(&steps) {
            if !techniques.contains(&t) {
                techniques.push(t);
            }
        }
        analysis.insert(Facet::PostFunctional, FacetValue::Techniques(techniques));
    }
    if facets.is_enabled(Facet::RegistralDistribution) {
        if let Some(profile) = color::register_profile(input.events, knowledge)? {
            analysis.insert(Facet::RegistralDistribution, FacetValue::Register(profile));
        }
    }

    Ok(analysis)
}

/// Emotions of the cadences in order; without cadences, the archetypes of
/// the chord qualities as they change.
fn emotional_arc(
    steps: &[ProgressionStep<'_>],
    key: Key,
    knowledge: &dyn KnowledgeReader,
) -> Result<Vec<String>, KnowledgeError> {
    let cadences = progression::cadences(steps, key, knowledge)?;
    if !cadences.is_empty() {
        return Ok(cadences.into_iter().map(|c| c.emotion).collect());
    }

    let mut arc: Vec<String> = Vec::new();
    let mut last: Option<ChordQuality> = None;
    for step in steps {
        if last == Some(step.chord.quality) {
            continue;
        }
        last = Some(step.chord.quality);
        if let Some(record) = knowledge.emotion_for_quality(step.chord.quality)? {
            arc.push(record.archetype.clone());
        }
    }
    Ok(arc)
}
