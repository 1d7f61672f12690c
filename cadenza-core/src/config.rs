use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use cadenza_types::{
    AnalysisLevel, ClassifierSettings, ConfidenceWeights, DetectorSettings, FacetConfig,
    MatcherSettings, Meter,
};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    session: SessionConfig,
    #[serde(default)]
    phrasing: PhrasingConfig,
    #[serde(default)]
    matching: MatchingConfig,
    #[serde(default)]
    facets: FacetsConfig,
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    knowledge: KnowledgeConfig,
}

#[derive(Deserialize, Default)]
struct SessionConfig {
    bpm: Option<f32>,
    time_signature: Option<[u8; 2]>,
    estimate_tempo: Option<bool>,
}

#[derive(Deserialize, Default)]
struct PhrasingConfig {
    minimum_gap_seconds: Option<f64>,
    maximum_gap_seconds: Option<f64>,
    silence_strength: Option<f64>,
    restart_strength: Option<f64>,
    pedal_release_weight: Option<f64>,
    velocity_drop_threshold: Option<u8>,
    crescendo_threshold: Option<u8>,
    dynamics_weight: Option<f64>,
    merge_tolerance_seconds: Option<f64>,
    boundary_strength_floor: Option<f64>,
    segment_maximum_notes: Option<usize>,
    full_density_notes_per_beat: Option<f64>,
    rhythm_weight: Option<f64>,
    prior_weight: Option<f64>,
    density_weight: Option<f64>,
    unlisted_length_prior: Option<f64>,
    /// Keyed by bar count; TOML keys are strings
    length_prior: Option<BTreeMap<String, f64>>,
}

#[derive(Deserialize, Default)]
struct MatchingConfig {
    confidence_threshold: Option<f64>,
    simultaneity_tolerance_seconds: Option<f64>,
    max_alternatives: Option<usize>,
}

#[derive(Deserialize, Default)]
struct FacetsConfig {
    level: Option<String>,
    #[serde(default)]
    basic: BasicSwitches,
    #[serde(default)]
    functional: FunctionalSwitches,
    #[serde(default)]
    comprehensive: ComprehensiveSwitches,
}

#[derive(Deserialize, Default)]
struct BasicSwitches {
    chord_symbols: Option<bool>,
    key_suggestion: Option<bool>,
}

#[derive(Deserialize, Default)]
struct FunctionalSwitches {
    key_center: Option<bool>,
    roman_numerals: Option<bool>,
    harmonic_function: Option<bool>,
    progression: Option<bool>,
    voice_leading: Option<bool>,
}

#[derive(Deserialize, Default)]
struct ComprehensiveSwitches {
    modal_analysis: Option<bool>,
    emotional_archetype: Option<bool>,
    post_functional: Option<bool>,
    registral_distribution: Option<bool>,
}

#[derive(Deserialize, Default)]
struct CacheConfig {
    capacity: Option<usize>,
}

#[derive(Deserialize, Default)]
struct KnowledgeConfig {
    database: Option<PathBuf>,
}

/// Embedded defaults with the user's config file layered on top.
pub struct Config {
    session: SessionConfig,
    phrasing: PhrasingConfig,
    matching: MatchingConfig,
    facets: FacetsConfig,
    cache: CacheConfig,
    knowledge: KnowledgeConfig,
}

impl Config {
    pub fn load() -> Self {
        let mut user = None;
        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(parsed) => user = Some(parsed),
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }
        Self::layered(user)
    }

    /// Embedded defaults only.
    pub fn embedded() -> Self {
        Self::layered(None)
    }

    /// Layer a user config given as TOML text over the embedded defaults.
    pub fn from_toml_str(user: &str) -> Result<Self, toml::de::Error> {
        let parsed = toml::from_str::<ConfigFile>(user)?;
        Ok(Self::layered(Some(parsed)))
    }

    fn layered(user: Option<ConfigFile>) -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(user) = user {
            merge_session(&mut base.session, user.session);
            merge_phrasing(&mut base.phrasing, user.phrasing);
            merge_matching(&mut base.matching, user.matching);
            merge_facets(&mut base.facets, user.facets);
            if user.cache.capacity.is_some() {
                base.cache.capacity = user.cache.capacity;
            }
            if user.knowledge.database.is_some() {
                base.knowledge.database = user.knowledge.database;
            }
        }

        Config {
            session: base.session,
            phrasing: base.phrasing,
            matching: base.matching,
            facets: base.facets,
            cache: base.cache,
            knowledge: base.knowledge,
        }
    }

    /// Meter for sessions that carry none (tempo clamped to 20..400 bpm).
    pub fn default_meter(&self) -> Meter {
        let fallback = Meter::default();
        let bpm = bounded(self.session.bpm.map(f64::from), fallback.bpm as f64, 20.0, 400.0) as f32;
        let time_signature = self
            .session
            .time_signature
            .and_then(parse_time_signature)
            .unwrap_or(fallback.time_signature);
        Meter::new(bpm, time_signature)
    }

    pub fn estimate_tempo(&self) -> bool {
        self.session.estimate_tempo.unwrap_or(true)
    }

    pub fn detector_settings(&self) -> DetectorSettings {
        let d = DetectorSettings::default();
        let p = &self.phrasing;
        let minimum_gap_seconds = bounded(p.minimum_gap_seconds, d.minimum_gap_seconds, 0.05, 60.0);
        DetectorSettings {
            minimum_gap_seconds,
            maximum_gap_seconds: bounded(p.maximum_gap_seconds, d.maximum_gap_seconds, 0.0, f64::MAX).max(minimum_gap_seconds),
            silence_strength: non_negative(p.silence_strength, d.silence_strength),
            restart_strength: non_negative(p.restart_strength, d.restart_strength),
            pedal_release_weight: non_negative(p.pedal_release_weight, d.pedal_release_weight),
            velocity_drop_threshold: p
                .velocity_drop_threshold
                .unwrap_or(d.velocity_drop_threshold)
                .clamp(1, 127),
            crescendo_threshold: p
                .crescendo_threshold
                .unwrap_or(d.crescendo_threshold)
                .clamp(1, 127),
            dynamics_weight: non_negative(p.dynamics_weight, d.dynamics_weight),
            merge_tolerance_seconds: bounded(p.merge_tolerance_seconds, d.merge_tolerance_seconds, 0.0, 5.0),
            boundary_strength_floor: non_negative(p.boundary_strength_floor, d.boundary_strength_floor),
        }
    }

    pub fn classifier_settings(&self) -> ClassifierSettings {
        let d = ClassifierSettings::default();
        let p = &self.phrasing;

        let mut length_prior = d.length_prior.clone();
        if let Some(table) = &p.length_prior {
            length_prior.table = table
                .iter()
                .filter_map(|(bars, prob)| match bars.parse::<u32>() {
                    Ok(bars) if prob.is_finite() => Some((bars, prob.clamp(0.0, 1.0))),
                    Ok(_) => None,
                    Err(_) => {
                        log::warn!(target: "config", "ignoring length prior for non-numeric bar count {:?}", bars);
                        None
                    }
                })
                .collect();
        }
        length_prior.unlisted = bounded(p.unlisted_length_prior, length_prior.unlisted, 0.0, 1.0);

        ClassifierSettings {
            segment_maximum_notes: p.segment_maximum_notes.unwrap_or(d.segment_maximum_notes),
            length_prior,
            weights: ConfidenceWeights {
                rhythm: non_negative(p.rhythm_weight, d.weights.rhythm),
                prior: non_negative(p.prior_weight, d.weights.prior),
                density: non_negative(p.density_weight, d.weights.density),
            },
            full_density_notes_per_beat: bounded(
                p.full_density_notes_per_beat,
                d.full_density_notes_per_beat,
                0.1,
                16.0,
            ),
        }
    }

    pub fn matcher_settings(&self) -> MatcherSettings {
        let d = MatcherSettings::default();
        MatcherSettings {
            confidence_threshold: bounded(self.matching.confidence_threshold, d.confidence_threshold, 0.0, 1.0),
            simultaneity_tolerance_seconds: bounded(
                self.matching.simultaneity_tolerance_seconds,
                d.simultaneity_tolerance_seconds,
                0.0,
                1.0,
            ),
            max_alternatives: self
                .matching
                .max_alternatives
                .unwrap_or(d.max_alternatives)
                .min(4),
        }
    }

    /// Level preset with the individual switches applied on top.
    pub fn facets(&self) -> FacetConfig {
        let level = self
            .facets
            .level
            .as_deref()
            .and_then(parse_level)
            .unwrap_or(AnalysisLevel::Advanced);
        let mut facets = FacetConfig::for_level(level);

        let b = &self.facets.basic;
        apply(&mut facets.basic.chord_symbols, b.chord_symbols);
        apply(&mut facets.basic.key_suggestion, b.key_suggestion);

        let f = &self.facets.functional;
        apply(&mut facets.functional.key_center, f.key_center);
        apply(&mut facets.functional.roman_numerals, f.roman_numerals);
        apply(&mut facets.functional.harmonic_function, f.harmonic_function);
        apply(&mut facets.functional.progression, f.progression);
        apply(&mut facets.functional.voice_leading, f.voice_leading);

        let c = &self.facets.comprehensive;
        apply(&mut facets.comprehensive.modal_analysis, c.modal_analysis);
        apply(&mut facets.comprehensive.emotional_archetype, c.emotional_archetype);
        apply(&mut facets.comprehensive.post_functional, c.post_functional);
        apply(&mut facets.comprehensive.registral_distribution, c.registral_distribution);

        facets
    }

    /// Cache capacity (clamped to 1..1_000_000).
    pub fn cache_capacity(&self) -> usize {
        self.cache
            .capacity
            .unwrap_or(DEFAULT_CACHE_CAPACITY)
            .clamp(1, 1_000_000)
    }

    /// SQLite knowledge base to load instead of the built-in tables.
    pub fn knowledge_path(&self) -> Option<PathBuf> {
        self.knowledge
            .database
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cadenza").join("config.toml"))
}

/// Non-finite values fall back; finite ones are clamped to `min..=max`.
fn bounded(value: Option<f64>, fallback: f64, min: f64, max: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(min, max),
        _ => fallback,
    }
}

fn non_negative(value: Option<f64>, fallback: f64) -> f64 {
    let v = value.unwrap_or(fallback);
    if v.is_finite() {
        v.max(0.0)
    } else {
        fallback
    }
}

fn apply(switch: &mut bool, value: Option<bool>) {
    if let Some(v) = value {
        *switch = v;
    }
}

fn merge_session(base: &mut SessionConfig, user: SessionConfig) {
    if user.bpm.is_some() {
        base.bpm = user.bpm;
    }
    if user.time_signature.is_some() {
        base.time_signature = user.time_signature;
    }
    if user.estimate_tempo.is_some() {
        base.estimate_tempo = user.estimate_tempo;
    }
}

fn merge_phrasing(base: &mut PhrasingConfig, user: PhrasingConfig) {
    macro_rules! take {
        ($($field:ident),*) => {
            $(if user.$field.is_some() {
                base.$field = user.$field;
            })*
        };
    }
    take!(
        minimum_gap_seconds,
        maximum_gap_seconds,
        silence_strength,
        restart_strength,
        pedal_release_weight,
        velocity_drop_threshold,
        crescendo_threshold,
        dynamics_weight,
        merge_tolerance_seconds,
        boundary_strength_floor,
        segment_maximum_notes,
        full_density_notes_per_beat,
        rhythm_weight,
        prior_weight,
        density_weight,
        unlisted_length_prior,
        length_prior
    );
}

fn merge_matching(base: &mut MatchingConfig, user: MatchingConfig) {
    if user.confidence_threshold.is_some() {
        base.confidence_threshold = user.confidence_threshold;
    }
    if user.simultaneity_tolerance_seconds.is_some() {
        base.simultaneity_tolerance_seconds = user.simultaneity_tolerance_seconds;
    }
    if user.max_alternatives.is_some() {
        base.max_alternatives = user.max_alternatives;
    }
}

fn merge_facets(base: &mut FacetsConfig, user: FacetsConfig) {
    // A new level resets the switches the embedded file set
    if user.level.is_some() {
        base.level = user.level;
        base.basic = BasicSwitches::default();
        base.functional = FunctionalSwitches::default();
        base.comprehensive = ComprehensiveSwitches::default();
    }

    let (b, u) = (&mut base.basic, user.basic);
    if u.chord_symbols.is_some() {
        b.chord_symbols = u.chord_symbols;
    }
    if u.key_suggestion.is_some() {
        b.key_suggestion = u.key_suggestion;
    }

    let (f, u) = (&mut base.functional, user.functional);
    if u.key_center.is_some() {
        f.key_center = u.key_center;
    }
    if u.roman_numerals.is_some() {
        f.roman_numerals = u.roman_numerals;
    }
    if u.harmonic_function.is_some() {
        f.harmonic_function = u.harmonic_function;
    }
    if u.progression.is_some() {
        f.progression = u.progression;
    }
    if u.voice_leading.is_some() {
        f.voice_leading = u.voice_leading;
    }

    let (c, u) = (&mut base.comprehensive, user.comprehensive);
    if u.modal_analysis.is_some() {
        c.modal_analysis = u.modal_analysis;
    }
    if u.emotional_archetype.is_some() {
        c.emotional_archetype = u.emotional_archetype;
    }
    if u.post_functional.is_some() {
        c.post_functional = u.post_functional;
    }
    if u.registral_distribution.is_some() {
        c.registral_distribution = u.registral_distribution;
    }
}

fn parse_level(s: &str) -> Option<AnalysisLevel> {
    match s.to_lowercase().as_str() {
        "beginner" | "basic" => Some(AnalysisLevel::Beginner),
        "intermediate" | "functional" => Some(AnalysisLevel::Intermediate),
        "advanced" | "comprehensive" => Some(AnalysisLevel::Advanced),
        _ => None,
    }
}

fn parse_time_signature(ts: [u8; 2]) -> Option<(u8, u8)> {
    let [num, denom] = ts;
    if (1..=32).contains(&num) && matches!(denom, 1 | 2 | 4 | 8 | 16 | 32) {
        Some((num, denom))
    } else {
        None
    }
}
