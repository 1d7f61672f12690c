mod common;

use cadenza_core::config::Config;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use cadenza_core::AnalyzerSettings;
use cadenza_types::{Facet, FacetValue, HarmonyOutcome, Key, MatcherSettings, PitchClass};

use common::{analyzer, analyzer_with, chord, chords, session};

const DM7: &[u8] = &[50, 53, 57, 60];
const G7: &[u8] = &[55, 59, 62, 65];
const CMAJ7: &[u8] = &[48, 52, 55, 59];

#[test]
fn c_major_triad_is_identified() {
    let report = analyzer().analyze(&session(1, chord(&[60, 64, 67], 0.0))).unwrap();

    assert_eq!(report.harmony.moments.len(), 1);
    let moment = &report.harmony.moments[0];
    assert_eq!(moment.pitches, vec![60, 64, 67]);
    let best = moment.outcome.best().expect("identified chord");
    assert_eq!(best.symbol, "C");
    assert!(moment.outcome.confidence().unwrap() >= 0.9);

    let analysis = moment.analysis.as_ref().expect("tiered analysis");
    match analysis.get(Facet::ChordSymbol) {
        Some(FacetValue::Chord(reading)) => assert_eq!(reading.symbol, "C"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(report.identified_chords().count(), 1);
}

#[test]
fn semitone_cluster_is_unrecognized() {
    let report = analyzer().analyze(&session(2, chord(&[60, 61, 62, 63], 0.0))).unwrap();

    let moment = &report.harmony.moments[0];
    assert!(matches!(moment.outcome, HarmonyOutcome::Unrecognized { .. }));
    assert!(moment.outcome.best().is_none());
    assert!(moment.analysis.is_none());
    assert_eq!(report.identified_chords().count(), 0);
}

#[test]
fn single_notes_and_dyads_pass_through() {
    let mut events = chord(&[60], 0.0);
    events.extend(chord(&[60, 67], 1.0));
    let report = analyzer().analyze(&session(3, events)).unwrap();

    assert_eq!(report.harmony.moments[0].outcome, HarmonyOutcome::SingleNote { pitch: 60 });
    match &report.harmony.moments[1].outcome {
        HarmonyOutcome::Interval { semitones, .. } => assert_eq!(*semitones, 7),
        other => panic!("unexpected {:?}", other),
    }
    assert!(report.harmony.moments.iter().all(|m| m.analysis.is_none()));
}

#[test]
fn two_five_one_in_c() {
    let report = analyzer().analyze(&session(4, chords(&[DM7, G7, CMAJ7], 0.0, 1.0))).unwrap();

    assert_eq!(report.harmony.key.key, Key::major(PitchClass::C));
    let symbols: Vec<&str> = report.identified_chords().filter_map(|m| m.outcome.best()).map(|c| c.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["Dm7", "G7", "Cmaj7"]);

    let progression = &report.harmony.progression;
    match progression.get(Facet::Progression) {
        Some(FacetValue::Progression(summary)) => {
            assert_eq!(summary.pattern.as_deref(), Some("ii-V-I"));
            assert_eq!(summary.numerals.len(), 3);
            assert!(summary.cadences.iter().any(|c| c.index == 2));
        }
        other => panic!("unexpected {:?}", other),
    }
    match progression.get(Facet::VoiceLeading) {
        Some(FacetValue::VoiceLeading(moves)) => {
            assert_eq!(moves.len(), 2);
            assert_eq!(moves[0].from, "Dm7");
            assert_eq!(moves[0].to, "G7");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(progression.contains(Facet::KeySuggestion));
    assert!(progression.contains(Facet::KeyCenter));
}

#[test]
fn every_moment_carries_the_roman_numeral() {
    let report = analyzer().analyze(&session(5, chords(&[DM7, G7, CMAJ7], 0.0, 1.0))).unwrap();

    let numerals: Vec<String> = report
        .harmony
        .moments
        .iter()
        .filter_map(|m| match m.analysis.as_ref()?.get(Facet::RomanNumeral) {
            Some(FacetValue::RomanNumeral(numeral)) => Some(numeral.label.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(numerals.len(), 3);
    assert!(numerals[1].starts_with('V'));
}

#[test]
fn configured_threshold_turns_a_match_ambiguous() {
    let config = Config::from_toml_str("[matching]\nconfidence_threshold = 0.95\n").unwrap();
    let strict = analyzer_with(AnalyzerSettings::from_config(&config));
    let am7 = session(6, chord(&[57, 60, 64, 67], 0.0));

    let report = strict.analyze(&am7).unwrap();
    match &report.harmony.moments[0].outcome {
        HarmonyOutcome::Ambiguous { confidence, candidates, .. } => {
            assert!((confidence - 0.9).abs() < 1e-9);
            assert!(*candidates >= 2);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(report.harmony.moments[0].analysis.is_none());

    let report = analyzer().analyze(&am7).unwrap();
    assert_eq!(report.harmony.moments[0].outcome.best().unwrap().symbol, "Am7");
}

#[test]
fn nan_threshold_from_config_keeps_the_cutoff() {
    let config = Config::from_toml_str("[matching]\nconfidence_threshold = nan\n").unwrap();
    let analyzer = analyzer_with(AnalyzerSettings::from_config(&config));

    let report = analyzer.analyze(&session(10, chord(&[60, 63, 66, 69], 0.0))).unwrap();
    assert!(matches!(report.harmony.moments[0].outcome, HarmonyOutcome::Ambiguous { .. }));
}

#[test]
fn negative_tolerance_still_finishes() {
    let settings = AnalyzerSettings {
        matcher: MatcherSettings {
            simultaneity_tolerance_seconds: -0.01,
            ..MatcherSettings::default()
        },
        ..AnalyzerSettings::default()
    };
    let analyzer = analyzer_with(settings);
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(analyzer.analyze(&session(11, chord(&[60, 64, 67], 0.0))));
    });

    let report = rx.recv_timeout(Duration::from_secs(5)).expect("analysis finished").unwrap();
    // Every note becomes its own moment
    assert_eq!(report.harmony.moments.len(), 3);
    assert!(report.harmony.moments.iter().all(|m| m.pitches.len() == 1));
}

#[test]
fn beginner_level_keeps_only_the_basic_tier() {
    let config = Config::from_toml_str("[facets]\nlevel = \"beginner\"\n").unwrap();
    let beginner = analyzer_with(AnalyzerSettings::from_config(&config));

    let report = beginner.analyze(&session(7, chords(&[DM7, G7, CMAJ7], 0.0, 1.0))).unwrap();

    for moment in &report.harmony.moments {
        let analysis = moment.analysis.as_ref().unwrap();
        assert!(analysis.contains(Facet::ChordSymbol));
        assert!(!analysis.contains(Facet::RomanNumeral));
        assert!(!analysis.contains(Facet::EmotionalArchetype));
    }
    let progression = &report.harmony.progression;
    assert!(progression.contains(Facet::ChordSymbol));
    assert!(progression.contains(Facet::KeySuggestion));
    assert!(!progression.contains(Facet::Progression));
    assert!(!progression.contains(Facet::ModalCharacter));
}

#[test]
fn switch_overrides_level() {
    let config = Config::from_toml_str("[facets]\nlevel = \"beginner\"\n[facets.functional]\nroman_numerals = true\n").unwrap();
    let settings = AnalyzerSettings::from_config(&config);
    assert!(settings.facets.is_enabled(Facet::RomanNumeral));
    assert!(!settings.facets.is_enabled(Facet::Progression));

    let report = analyzer_with(settings).analyze(&session(8, chord(&[55, 59, 62, 65], 0.0))).unwrap();
    let analysis = report.harmony.moments[0].analysis.as_ref().unwrap();
    assert!(analysis.contains(Facet::RomanNumeral));
    assert!(!analysis.contains(Facet::HarmonicFunction));
}
