//! Candidate phrase boundaries from three independent signals.
//!
//! Each detector walks the same onset-ordered events and places a boundary
//! at the onset of the event that starts new material. The merged set then
//! partitions the session into spans.

use cadenza_types::{BoundarySource, CandidateBoundary, DetectorSettings, NoteEvent, Span};

/// Onsets closer than this belong to the same attack (a chord).
const SIMULTANEOUS: f64 = 1e-6;

/// Gaps between consecutive onsets longer than `minimum_gap_seconds`.
/// Gaps beyond `maximum_gap_seconds` mark a restart and weigh more.
pub fn detect_silence(events: &[NoteEvent], settings: &DetectorSettings) -> Vec<CandidateBoundary> {
    events
        .windows(2)
        .filter_map(|pair| {
            let gap = pair[1].onset - pair[0].onset;
            let strength = if gap > settings.maximum_gap_seconds {
                settings.restart_strength
            } else if gap > settings.minimum_gap_seconds {
                settings.silence_strength
            } else {
                return None;
            };
            Some(CandidateBoundary {
                position: pair[1].onset,
                source: BoundarySource::Silence,
                strength,
            })
        })
        .collect()
}

/// Sustain-pedal releases: a pedal-up event right after a pedal-down one.
pub fn detect_pedal(events: &[NoteEvent], settings: &DetectorSettings) -> Vec<CandidateBoundary> {
    events
        .windows(2)
        .filter(|pair| pair[0].sustain && !pair[1].sustain)
        .map(|pair| CandidateBoundary {
            position: pair[1].onset,
            source: BoundarySource::Pedal,
            strength: settings.pedal_release_weight,
        })
        .collect()
}

/// Sudden drops or rises in velocity between successive attacks.
///
/// Strength grows with the size of the change relative to its threshold, so
/// a change exactly at threshold weighs `dynamics_weight`.
pub fn detect_dynamics(events: &[NoteEvent], settings: &DetectorSettings) -> Vec<CandidateBoundary> {
    let drop_threshold = settings.velocity_drop_threshold.max(1) as f64;
    let rise_threshold = settings.crescendo_threshold.max(1) as f64;

    events
        .windows(2)
        .filter(|pair| pair[1].onset - pair[0].onset > SIMULTANEOUS)
        .filter_map(|pair| {
            let change = pair[1].velocity as f64 - pair[0].velocity as f64;
            let ratio = if -change >= drop_threshold {
                -change / drop_threshold
            } else if change >= rise_threshold {
                change / rise_threshold
            } else {
                return None;
            };
            Some(CandidateBoundary {
                position: pair[1].onset,
                source: BoundarySource::Dynamics,
                strength: settings.dynamics_weight * ratio,
            })
        })
        .collect()
}

/// Coalesce boundaries lying within `merge_tolerance_seconds` of the first
/// boundary of their cluster. A merged boundary sums its contributors'
/// strengths and takes the position and source of the strongest one.
pub fn merge(mut candidates: Vec<CandidateBoundary>, tolerance: f64) -> Vec<CandidateBoundary> {
    candidates.sort_by(|a, b| a.position.total_cmp(&b.position));

    let mut merged: Vec<CandidateBoundary> = Vec::new();
    let mut cluster_start = f64::NEG_INFINITY;
    let mut strongest = 0.0;

    for candidate in candidates {
        if candidate.position - cluster_start <= tolerance {
            if let Some(current) = merged.last_mut() {
                current.strength += candidate.strength;
                if candidate.strength > strongest {
                    strongest = candidate.strength;
                    current.position = candidate.position;
                    current.source = candidate.source;
                }
                continue;
            }
        }
        cluster_start = candidate.position;
        strongest = candidate.strength;
        merged.push(candidate);
    }
    merged
}

/// Run all three detectors, merge, and drop boundaries below the strength floor.
pub fn detect(events: &[NoteEvent], settings: &DetectorSettings) -> Vec<CandidateBoundary> {
    let silence = detect_silence(events, settings);
    let pedal = detect_pedal(events, settings);
    let dynamics = detect_dynamics(events, settings);
    log::debug!(
        target: "phrase",
        "candidates: {} silence, {} pedal, {} dynamics",
        silence.len(),
        pedal.len(),
        dynamics.len()
    );

    let mut all = silence;
    all.extend(pedal);
    all.extend(dynamics);

    let merged = merge(all, settings.merge_tolerance_seconds);
    let before = merged.len();
    let kept: Vec<CandidateBoundary> = merged
        .into_iter()
        .filter(|b| b.strength >= settings.boundary_strength_floor)
        .collect();
    if kept.len() < before {
        log::debug!(target: "phrase", "dropped {} weak boundaries", before - kept.len());
    }
    kept
}

/// Split the onset-ordered events at each boundary position. Never yields an
/// empty span; no boundaries give one span covering everything.
///
/// `fallback_note_length` stands in for a duration when a span has a single
/// attack and no duration data.
pub fn partition<'a>(
    events: &'a [NoteEvent],
    boundaries: &[CandidateBoundary],
    fallback_note_length: f64,
) -> Vec<Span<'a>> {
    let mut cuts: Vec<usize> = boundaries
        .iter()
        .map(|b| events.partition_point(|e| e.onset < b.position))
        .filter(|&i| i > 0 && i < events.len())
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut spans = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(events.len())) {
        if cut > start {
            spans.push(span_of(&events[start..cut], fallback_note_length));
            start = cut;
        }
    }
    spans
}

/// Span over `events`; it ends where its latest note stops sounding.
fn span_of(events: &[NoteEvent], fallback_note_length: f64) -> Span<'_> {
    let start = events.first().map(|e| e.onset).unwrap_or(0.0);
    let mut span = Span {
        start,
        end: start,
        events,
    };
    let note_length = median(&span.inter_onset_intervals()).unwrap_or(fallback_note_length);
    span.end = events
        .iter()
        .map(|e| e.onset + e.duration.unwrap_or(note_length))
        .fold(start, f64::max);
    span
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
