//! Single entry point: validate a session, run the phrase and harmony
//! pipelines, return a [`SessionReport`].

use std::sync::{Arc, Mutex};

use cadenza_types::{
    ClassifierSettings, DetectorSettings, FacetConfig, Fingerprint, HarmonyReport, Key, KeyEstimate, MatcherSettings,
    Meter, MomentReport, Session, SessionId, SessionReport,
};

use crate::cache::{AnalysisCache, CachedHarmony};
use crate::compose::{self, SessionChord, SessionInput};
use crate::config::{Config, DEFAULT_CACHE_CAPACITY};
use crate::error::{AnalysisError, KnowledgeContext, Result, Stage};
use crate::harmony::{self, matcher};
use crate::knowledge::{KnowledgeBase, KnowledgeReader};
use crate::phrase;

/// Everything the analyzer needs besides the knowledge base.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerSettings {
    /// Meter for sessions that carry none and whose tempo cannot be estimated
    pub default_meter: Meter,
    pub estimate_tempo: bool,
    pub detector: DetectorSettings,
    pub classifier: ClassifierSettings,
    pub matcher: MatcherSettings,
    pub facets: FacetConfig,
    pub cache_capacity: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            default_meter: Meter::default(),
            estimate_tempo: true,
            detector: DetectorSettings::default(),
            classifier: ClassifierSettings::default(),
            matcher: MatcherSettings::default(),
            facets: FacetConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl AnalyzerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_meter: config.default_meter(),
            estimate_tempo: config.estimate_tempo(),
            detector: config.detector_settings(),
            classifier: config.classifier_settings(),
            matcher: config.matcher_settings(),
            facets: config.facets(),
            cache_capacity: config.cache_capacity(),
        }
    }
}

pub struct Analyzer {
    knowledge: Arc<dyn KnowledgeReader>,
    settings: AnalyzerSettings,
    cache: AnalysisCache,
    /// Session and key the cached entries were composed for
    context: Mutex<Option<(SessionId, Key)>>,
}

impl Analyzer {
    pub fn new(knowledge: Arc<dyn KnowledgeReader>, settings: AnalyzerSettings) -> Self {
        let cache = AnalysisCache::new(settings.cache_capacity);
        Self {
            knowledge,
            settings,
            cache,
            context: Mutex::new(None),
        }
    }

    /// Build from configuration: the configured SQLite knowledge base if one
    /// is set, otherwise the built-in tables.
    pub fn from_config(config: &Config) -> Result<Self> {
        let knowledge = match config.knowledge_path() {
            Some(path) => KnowledgeBase::open(&path),
            None => KnowledgeBase::builtin(),
        }
        .at(Stage::KnowledgeLoad)?;
        Ok(Self::new(Arc::new(knowledge), AnalyzerSettings::from_config(config)))
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    pub fn knowledge(&self) -> &dyn KnowledgeReader {
        self.knowledge.as_ref()
    }

    pub fn analyze(&self, session: &Session) -> Result<SessionReport> {
        validate(session)?;
        let events = &session.events[..];
        let meter = self.choose_meter(session);
        let beat = meter.beat_seconds();

        let spans = phrase::segment(events, &meter, &self.settings.detector);
        let verdicts = phrase::phrase_verdicts(&spans, &meter, &self.settings.classifier);

        let key = harmony::estimate_key(events, beat);
        let modulations = harmony::modulations(key.key, &spans, beat);
        self.enter_context(session.id, key.key);

        let knowledge = self.knowledge.as_ref();
        let moments = harmony::group_moments(events, self.settings.matcher.simultaneity_tolerance_seconds);
        let mut reports = Vec::with_capacity(moments.len());
        let mut resolved: Vec<(Fingerprint, Arc<CachedHarmony>)> = Vec::new();

        for moment in &moments {
            let pitches = moment.pitches();
            if let Some(outcome) = matcher::pass_through(&pitches, knowledge).at(Stage::Matching)? {
                reports.push(MomentReport {
                    onset: moment.onset,
                    pitches,
                    outcome,
                    analysis: None,
                });
                continue;
            }

            let fingerprint = moment.fingerprint();
            let entry = self.resolve(fingerprint, &key)?;
            reports.push(MomentReport {
                onset: moment.onset,
                pitches,
                outcome: entry.result.clone().into_outcome(moment.pattern()),
                analysis: entry.analysis.clone(),
            });
            resolved.push((fingerprint, entry));
        }

        let chords: Vec<SessionChord<'_>> = resolved
            .iter()
            .filter_map(|(fingerprint, entry)| {
                entry.result.best().map(|chord| SessionChord {
                    chord,
                    sounding: fingerprint.tones(),
                })
            })
            .collect();
        let input = SessionInput {
            events,
            beat_seconds: beat,
            key: &key,
            modulations: &modulations,
            chords: &chords,
        };
        let progression = compose::compose_session(input, &self.settings.facets, knowledge).at(Stage::Composition)?;

        let report = SessionReport {
            session: session.id,
            meter,
            verdicts,
            harmony: HarmonyReport {
                key,
                moments: reports,
                progression,
            },
        };
        log::info!(
            target: "analyzer",
            "session {}: {} events, {} of {} spans are phrases, {} of {} moments identified, key {}",
            session.id,
            events.len(),
            report.phrase_count(),
            report.verdicts.len(),
            report.identified_chords().count(),
            report.harmony.moments.len(),
            report.harmony.key.key
        );
        Ok(report)
    }

    /// Session meter, else an estimate from the onsets, else the default.
    fn choose_meter(&self, session: &Session) -> Meter {
        if let Some(meter) = session.meter {
            return meter;
        }
        let time_signature = self.settings.default_meter.time_signature;
        if self.settings.estimate_tempo {
            if let Some(meter) = phrase::estimate_meter(&session.events, time_signature) {
                return meter;
            }
        }
        log::debug!(target: "analyzer", "session {}: using default meter", session.id);
        self.settings.default_meter
    }

    /// Cached entries are only valid for the session and key they were
    /// composed under.
    fn enter_context(&self, session: SessionId, key: Key) {
        let mut context = self.context.lock().unwrap_or_else(|e| e.into_inner());
        if *context != Some((session, key)) {
            if context.is_some() {
                self.cache.reset();
            }
            *context = Some((session, key));
        }
    }

    fn resolve(&self, fingerprint: Fingerprint, key: &KeyEstimate) -> Result<Arc<CachedHarmony>> {
        if let Some(hit) = self.cache.lookup(fingerprint) {
            if hit.key == key.key {
                return Ok(hit);
            }
        }

        let knowledge = self.knowledge.as_ref();
        let tones = fingerprint.tones();
        let result = matcher::match_tones(tones, knowledge, &self.settings.matcher).at(Stage::Matching)?;
        let analysis =
            compose::compose_moment(&result, tones, key, &self.settings.facets, knowledge).at(Stage::Composition)?;
        let entry = Arc::new(CachedHarmony {
            key: key.key,
            result,
            analysis,
        });
        self.cache.store(fingerprint, Arc::clone(&entry));
        Ok(entry)
    }
}

/// Reject sessions the pipelines cannot interpret, naming the first
/// offending event.
pub fn validate(session: &Session) -> Result<()> {
    let malformed = |detail: String| Err(AnalysisError::malformed(Stage::Validation, detail));

    if session.events.is_empty() {
        return malformed("session has no events".into());
    }
    if let Some(meter) = session.meter {
        if !meter.bpm.is_finite() || meter.bpm <= 0.0 {
            return malformed(format!("meter tempo {} is not a positive number", meter.bpm));
        }
        if meter.time_signature.0 == 0 || meter.time_signature.1 == 0 {
            return malformed(format!(
                "time signature {}/{} is invalid",
                meter.time_signature.0, meter.time_signature.1
            ));
        }
    }

    let mut previous = 0.0;
    for (i, e) in session.events.iter().enumerate() {
        if e.pitch > 127 {
            return malformed(format!("event {}: pitch {} out of range 0-127", i, e.pitch));
        }
        if e.velocity > 127 {
            return malformed(format!("event {}: velocity {} out of range 0-127", i, e.velocity));
        }
        if !e.onset.is_finite() || e.onset < 0.0 {
            return malformed(format!("event {}: onset {} is not a finite, non-negative time", i, e.onset));
        }
        if let Some(d) = e.duration {
            if !d.is_finite() || d < 0.0 {
                return malformed(format!("event {}: duration {} is not a finite, non-negative length", i, d));
            }
        }
        if e.onset < previous {
            return malformed(format!("event {}: onset {} is earlier than the previous {}", i, e.onset, previous));
        }
        previous = e.onset;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_types::NoteEvent;

    fn session(events: Vec<NoteEvent>) -> Session {
        Session::new(SessionId::new(1), events)
    }

    fn detail(result: Result<()>) -> String {
        match result {
            Err(AnalysisError::MalformedInput { stage, detail }) => {
                assert_eq!(stage, Stage::Validation);
                detail
            }
            other => panic!("expected malformed input, got {:?}", other),
        }
    }

    #[test]
    fn empty_session_is_rejected() {
        assert!(detail(validate(&session(Vec::new()))).contains("no events"));
    }

    #[test]
    fn offending_event_is_named() {
        let events = vec![NoteEvent::new(60, 80, 0.0), NoteEvent::new(200, 80, 0.5)];
        assert!(detail(validate(&session(events))).starts_with("event 1:"));

        let events = vec![NoteEvent::new(60, 80, 0.0), NoteEvent::new(62, 130, 0.5)];
        assert!(detail(validate(&session(events))).contains("velocity"));
    }

    #[test]
    fn times_must_be_finite_and_ordered() {
        let nan = vec![NoteEvent::new(60, 80, f64::NAN)];
        assert!(detail(validate(&session(nan))).starts_with("event 0:"));

        let negative = vec![NoteEvent::new(60, 80, -1.0)];
        assert!(detail(validate(&session(negative))).contains("onset"));

        let backwards = vec![
            NoteEvent::new(60, 80, 0.0),
            NoteEvent::new(62, 80, 1.0),
            NoteEvent::new(64, 80, 0.5),
        ];
        assert!(detail(validate(&session(backwards))).starts_with("event 2:"));

        let bad_length = vec![NoteEvent::new(60, 80, 0.0).with_duration(f64::INFINITY)];
        assert!(detail(validate(&session(bad_length))).contains("duration"));
    }

    #[test]
    fn simultaneous_onsets_are_fine() {
        let chord = vec![
            NoteEvent::new(60, 80, 0.0),
            NoteEvent::new(64, 80, 0.0),
            NoteEvent::new(67, 80, 0.0),
        ];
        assert!(validate(&session(chord)).is_ok());
    }

    #[test]
    fn bad_meter_is_rejected() {
        let s = session(vec![NoteEvent::new(60, 80, 0.0)]).with_meter(Meter::new(0.0, (4, 4)));
        assert!(detail(validate(&s)).contains("tempo"));
    }

    #[test]
    fn session_meter_wins_over_estimate() {
        let analyzer = Analyzer::new(Arc::new(KnowledgeBase::builtin().unwrap()), AnalyzerSettings::default());
        let events: Vec<NoteEvent> = (0..8).map(|i| NoteEvent::new(60, 80, i as f64 * 0.2)).collect();
        let fixed = session(events.clone()).with_meter(Meter::new(90.0, (3, 4)));
        assert_eq!(analyzer.choose_meter(&fixed), Meter::new(90.0, (3, 4)));
        let estimated = analyzer.choose_meter(&session(events));
        assert!((estimated.bpm - 150.0).abs() < 1e-3);
    }

    #[test]
    fn default_meter_without_estimate() {
        let settings = AnalyzerSettings {
            estimate_tempo: false,
            default_meter: Meter::new(100.0, (4, 4)),
            ..AnalyzerSettings::default()
        };
        let analyzer = Analyzer::new(Arc::new(KnowledgeBase::builtin().unwrap()), settings);
        let s = session(vec![NoteEvent::new(60, 80, 0.0), NoteEvent::new(62, 80, 0.5)]);
        assert_eq!(analyzer.choose_meter(&s).bpm, 100.0);
    }
}
