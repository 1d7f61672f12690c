//! Chord matching against the knowledge-base templates.
//!
//! Every template is tried at every sounding pitch class as root. A template
//! relates to the sounding set in one of three ways:
//!
//! - exact: same tones, coverage 1
//! - contained: the template is a subset of the sounding tones, coverage |T|/|P|
//! - incomplete: the sounding tones are the template minus one non-root tone,
//!   coverage |P|/|T|
//!
//! Candidates rank by coverage, then template preference, then fewer tones,
//! then lower root.

use std::cmp::Ordering;

use cadenza_types::{
    ChordMatch, ChordMatches, HarmonyOutcome, IntervalPattern, MatcherSettings, PitchClass, ToneSet,
};

use crate::error::KnowledgeError;
use crate::knowledge::{ChordTemplate, KnowledgeReader};

const EPSILON: f64 = 1e-9;
/// Confidence factor applied when the runner-up covers as much as the best.
const RUNNER_UP_PENALTY: f64 = 0.9;
const COVERAGE_WEIGHT: f64 = 0.8;
const PREFERENCE_WEIGHT: f64 = 0.2;

/// What chord matching made of a pitch-class set, independent of voicing.
/// This is the part of an outcome that can be memoized by fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Identified { matches: ChordMatches, confidence: f64 },
    Ambiguous { confidence: f64, candidates: usize },
    Unrecognized,
}

impl MatchResult {
    /// Attach the voiced pattern of the moment it was computed for.
    pub fn into_outcome(self, pattern: IntervalPattern) -> HarmonyOutcome {
        match self {
            MatchResult::Identified { matches, confidence } => HarmonyOutcome::Identified {
                matches,
                confidence,
                pattern,
            },
            MatchResult::Ambiguous { confidence, candidates } => HarmonyOutcome::Ambiguous {
                confidence,
                candidates,
                pattern,
            },
            MatchResult::Unrecognized => HarmonyOutcome::Unrecognized { pattern },
        }
    }

    pub fn best(&self) -> Option<&ChordMatch> {
        match self {
            MatchResult::Identified { matches, .. } => Some(&matches.best),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate<'k> {
    root: u8,
    template: &'k ChordTemplate,
    coverage: f64,
}

impl Candidate<'_> {
    fn rank(&self, other: &Self) -> Ordering {
        other
            .coverage
            .total_cmp(&self.coverage)
            .then_with(|| other.template.preference.total_cmp(&self.template.preference))
            .then_with(|| self.template.tones.len().cmp(&other.template.tones.len()))
            .then_with(|| self.root.cmp(&other.root))
    }

    fn ties_with(&self, other: &Self) -> bool {
        (self.coverage - other.coverage).abs() < EPSILON
            && (self.template.preference - other.template.preference).abs() < EPSILON
    }
}

/// Outcomes that never reach chord matching: rests, single pitches and
/// two-pitch-class sets. `None` when the moment has three or more pitch
/// classes and needs [`match_tones`].
pub fn pass_through(
    pitches: &[u8],
    knowledge: &dyn KnowledgeReader,
) -> Result<Option<HarmonyOutcome>, KnowledgeError> {
    let mut pitches = pitches.to_vec();
    pitches.sort_unstable();
    pitches.dedup();

    let (low, highest) = match (pitches.first(), pitches.last()) {
        (Some(&low), Some(&high)) => (low, high),
        _ => return Ok(Some(HarmonyOutcome::Rest)),
    };
    if pitches.len() == 1 {
        return Ok(Some(HarmonyOutcome::SingleNote { pitch: low }));
    }

    let tones = ToneSet::from_semitones(pitches.iter().copied());
    if tones.len() > 2 {
        return Ok(None);
    }

    // Lowest pitch of the other class, or the top octave when there is only one class
    let high = pitches
        .iter()
        .copied()
        .find(|p| p % 12 != low % 12)
        .unwrap_or(highest);
    let semitones = if high % 12 == low % 12 { 12 } else { (high - low) % 12 };
    let name = match knowledge.interval(semitones)? {
        Some(record) => record.name.clone(),
        None => format!("{} semitones", semitones),
    };

    Ok(Some(HarmonyOutcome::Interval {
        low,
        high,
        semitones,
        name,
    }))
}

/// Match a set of three or more pitch classes against every chord template.
pub fn match_tones(
    tones: ToneSet,
    knowledge: &dyn KnowledgeReader,
    settings: &MatcherSettings,
) -> Result<MatchResult, KnowledgeError> {
    let templates = knowledge.chord_templates()?;
    let mut candidates: Vec<Candidate<'_>> = Vec::new();

    for root in tones.iter() {
        let relative = tones.relative_to(root);

        for template in knowledge.chords_with_tones(relative)? {
            candidates.push(Candidate {
                root,
                template,
                coverage: 1.0,
            });
        }

        for template in templates {
            if template.tones == relative {
                continue;
            }
            let coverage = if template.tones.is_subset(relative) {
                template.tones.len() as f64 / relative.len() as f64
            } else if relative.is_subset(template.tones) && template.tones.difference(relative).len() == 1 {
                relative.len() as f64 / template.tones.len() as f64
            } else {
                continue;
            };
            candidates.push(Candidate {
                root,
                template,
                coverage,
            });
        }
    }

    if candidates.is_empty() {
        log::debug!(target: "harmony", "{}: no compatible template", tones);
        return Ok(MatchResult::Unrecognized);
    }

    candidates.sort_by(|a, b| a.rank(b));
    let best = candidates[0];
    let ties = candidates.iter().filter(|c| c.ties_with(&best)).count();
    let mut confidence = best.coverage / ties as f64;
    if let Some(runner_up) = candidates.get(1) {
        if (runner_up.coverage - best.coverage).abs() < EPSILON {
            confidence *= RUNNER_UP_PENALTY;
        }
    }

    log::debug!(
        target: "harmony",
        "{}: {} candidates, best root {} {:?} coverage {:.2}, confidence {:.2}",
        tones,
        candidates.len(),
        best.root,
        best.template.quality,
        best.coverage,
        confidence
    );

    // Written so a NaN threshold rejects
    if !(confidence >= settings.confidence_threshold) {
        return Ok(MatchResult::Ambiguous {
            confidence,
            candidates: candidates.len(),
        });
    }

    let best_match = chord_match(&best, knowledge)?;
    let alternatives = candidates[1..]
        .iter()
        .take(settings.max_alternatives)
        .map(|c| chord_match(c, knowledge))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MatchResult::Identified {
        matches: ChordMatches {
            best: best_match,
            alternatives,
        },
        confidence,
    })
}

/// Full outcome for one moment's distinct pitches.
pub fn match_pitches(
    pitches: &[u8],
    knowledge: &dyn KnowledgeReader,
    settings: &MatcherSettings,
) -> Result<HarmonyOutcome, KnowledgeError> {
    if let Some(outcome) = pass_through(pitches, knowledge)? {
        return Ok(outcome);
    }
    let tones = ToneSet::from_semitones(pitches.iter().copied());
    let result = match_tones(tones, knowledge, settings)?;
    Ok(result.into_outcome(IntervalPattern::from_pitches(pitches)))
}

fn chord_match(candidate: &Candidate<'_>, knowledge: &dyn KnowledgeReader) -> Result<ChordMatch, KnowledgeError> {
    let root = PitchClass::from_semitone(candidate.root as i32);
    let root_name = match knowledge.note(root)? {
        Some(note) => note.name.clone(),
        None => root.name().to_string(),
    };
    let template = candidate.template;
    Ok(ChordMatch {
        symbol: format!("{}{}", root_name, template.quality.suffix()),
        root,
        quality: template.quality,
        scale_relationship: template.scale_relationship.clone(),
        coverage: candidate.coverage,
        score: COVERAGE_WEIGHT * candidate.coverage + PREFERENCE_WEIGHT * template.preference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;
    use cadenza_types::ChordQuality;

    fn kb() -> KnowledgeBase {
        KnowledgeBase::builtin().unwrap()
    }

    fn outcome(pitches: &[u8]) -> HarmonyOutcome {
        match_pitches(pitches, &kb(), &MatcherSettings::default()).unwrap()
    }

    #[test]
    fn c_major_triad() {
        let result = outcome(&[60, 64, 67]);
        let HarmonyOutcome::Identified {
            matches, confidence, ..
        } = result
        else {
            panic!("expected a chord, got {:?}", result);
        };
        assert_eq!(matches.best.symbol, "C");
        assert_eq!(matches.best.quality, ChordQuality::Major);
        assert!(confidence >= 0.9);
        assert!(matches.alternatives.len() <= 4);
    }

    #[test]
    fn inversion_matches_same_chord() {
        let root = outcome(&[60, 64, 67]);
        let first_inversion = outcome(&[64, 67, 72]);
        assert_eq!(root.best().map(|m| &m.symbol), first_inversion.best().map(|m| &m.symbol));
        assert_ne!(root, first_inversion);
    }

    #[test]
    fn minor_seventh_beats_major_sixth_reading() {
        let result = outcome(&[57, 60, 64, 67]);
        let HarmonyOutcome::Identified {
            matches, confidence, ..
        } = result
        else {
            panic!("expected a chord, got {:?}", result);
        };
        assert_eq!(matches.best.symbol, "Am7");
        assert!((confidence - 0.9).abs() < 1e-9);
        assert!(matches.alternatives.iter().any(|m| m.symbol == "C6"));
    }

    #[test]
    fn dominant_seventh_without_fifth() {
        let result = outcome(&[55, 59, 65]);
        assert_eq!(result.best().map(|m| m.symbol.as_str()), Some("G7"));
        assert!((result.confidence().unwrap() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn chromatic_cluster_has_no_analysis() {
        let result = outcome(&[60, 61, 62, 63]);
        assert!(!result.is_chord());
        assert!(matches!(result, HarmonyOutcome::Unrecognized { .. }));
    }

    #[test]
    fn symmetric_chords_are_ambiguous() {
        let dim7 = outcome(&[60, 63, 66, 69]);
        match dim7 {
            HarmonyOutcome::Ambiguous { confidence, candidates, .. } => {
                assert!((confidence - 0.225).abs() < 1e-9);
                assert!(candidates >= 4);
            }
            other => panic!("expected ambiguous, got {:?}", other),
        }
        assert!(matches!(outcome(&[60, 64, 68]), HarmonyOutcome::Ambiguous { .. }));
    }

    #[test]
    fn threshold_is_a_hard_cutoff() {
        let strict = MatcherSettings {
            confidence_threshold: 0.95,
            ..MatcherSettings::default()
        };
        let result = match_pitches(&[57, 60, 64, 67], &kb(), &strict).unwrap();
        assert!(matches!(result, HarmonyOutcome::Ambiguous { .. }));
        assert!(result.best().is_none());
    }

    #[test]
    fn nan_threshold_identifies_nothing() {
        let broken = MatcherSettings {
            confidence_threshold: f64::NAN,
            ..MatcherSettings::default()
        };
        let dim7 = match_pitches(&[60, 63, 66, 69], &kb(), &broken).unwrap();
        assert!(matches!(dim7, HarmonyOutcome::Ambiguous { .. }));
        let triad = match_pitches(&[60, 64, 67], &kb(), &broken).unwrap();
        assert!(triad.best().is_none());
    }

    #[test]
    fn single_pitch_and_rest() {
        assert_eq!(outcome(&[]), HarmonyOutcome::Rest);
        assert_eq!(outcome(&[60, 60]), HarmonyOutcome::SingleNote { pitch: 60 });
    }

    #[test]
    fn dyads_are_named_intervals() {
        match outcome(&[60, 67]) {
            HarmonyOutcome::Interval { low, high, semitones, name } => {
                assert_eq!((low, high, semitones), (60, 67, 7));
                assert_eq!(name, "perfect fifth");
            }
            other => panic!("expected interval, got {:?}", other),
        }
        // Doubled C over E: still two classes, measured from the bass
        match outcome(&[52, 60, 72]) {
            HarmonyOutcome::Interval { semitones, .. } => assert_eq!(semitones, 8),
            other => panic!("expected interval, got {:?}", other),
        }
    }

    #[test]
    fn octaves_are_an_interval_not_a_note() {
        match outcome(&[48, 60, 72]) {
            HarmonyOutcome::Interval { low, high, semitones, name } => {
                assert_eq!((low, high, semitones), (48, 72, 12));
                assert_eq!(name, "octave");
            }
            other => panic!("expected interval, got {:?}", other),
        }
    }

    #[test]
    fn alternatives_are_capped() {
        let settings = MatcherSettings {
            max_alternatives: 1,
            ..MatcherSettings::default()
        };
        let result = match_tones(ToneSet::from_semitones([0, 4, 7]), &kb(), &settings).unwrap();
        let MatchResult::Identified { matches, .. } = result else {
            panic!("expected a chord");
        };
        assert_eq!(matches.alternatives.len(), 1);
    }
}
