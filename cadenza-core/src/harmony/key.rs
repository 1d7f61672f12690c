//! Key detection by Krumhansl-Kessler profile correlation.

use cadenza_types::{Key, KeyCandidate, KeyEstimate, KeyMode, Modulation, NoteEvent, PitchClass, Span};

const MAJOR_PROFILE: [f64; 12] = [6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88];
const MINOR_PROFILE: [f64; 12] = [6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17];

/// Key candidates reported as the key suggestion.
pub const KEY_SUGGESTIONS: usize = 3;
/// A span needs at least this many notes before its local key counts.
pub const MODULATION_MIN_NOTES: usize = 8;
pub const MODULATION_MIN_CONFIDENCE: f64 = 0.1;

/// Pitch-class weights: sounding length (or `default_length` when unknown)
/// scaled by velocity. Falls back to plain note counts when every note is
/// silent.
pub fn pitch_class_histogram(events: &[NoteEvent], default_length: f64) -> [f64; 12] {
    let mut histogram = [0.0; 12];
    for e in events {
        let length = e.duration.unwrap_or(default_length).max(0.0);
        histogram[(e.pitch % 12) as usize] += length * e.velocity as f64 / 127.0;
    }
    if histogram.iter().sum::<f64>() <= 0.0 {
        histogram = [0.0; 12];
        for e in events {
            histogram[(e.pitch % 12) as usize] += 1.0;
        }
    }
    histogram
}

/// Correlate the histogram with all 24 rotated profiles.
pub fn detect_key(histogram: &[f64; 12]) -> KeyEstimate {
    let mut scores: Vec<KeyCandidate> = Vec::with_capacity(24);
    for tonic in PitchClass::ALL {
        for (mode, profile) in [(KeyMode::Major, &MAJOR_PROFILE), (KeyMode::Minor, &MINOR_PROFILE)] {
            scores.push(KeyCandidate {
                key: Key::new(tonic, mode),
                score: correlate(histogram, profile, tonic.semitone() as usize),
            });
        }
    }
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));

    let best = scores[0];
    let second = scores[1].score;
    let separation = (best.score - second) / best.score.max(0.001);
    let confidence = (separation * 0.7 + best.score.max(0.0) * 0.3).clamp(0.0, 1.0);

    scores.truncate(KEY_SUGGESTIONS);
    KeyEstimate {
        key: best.key,
        confidence,
        candidates: scores,
    }
}

pub fn estimate_key(events: &[NoteEvent], default_length: f64) -> KeyEstimate {
    let estimate = detect_key(&pitch_class_histogram(events, default_length));
    log::debug!(
        target: "harmony",
        "key {} (confidence {:.2}) from {} notes",
        estimate.key,
        estimate.confidence,
        events.len()
    );
    estimate
}

/// Spans whose own key differs from the session key. Consecutive spans in
/// the same foreign key report only the first.
pub fn modulations(session_key: Key, spans: &[Span<'_>], default_length: f64) -> Vec<Modulation> {
    let mut found: Vec<Modulation> = Vec::new();
    let mut current = session_key;
    for (span_index, span) in spans.iter().enumerate() {
        if span.note_count() < MODULATION_MIN_NOTES {
            continue;
        }
        let local = estimate_key(span.events, default_length);
        let key = if local.confidence >= MODULATION_MIN_CONFIDENCE {
            local.key
        } else {
            current
        };
        if key != current && key != session_key {
            found.push(Modulation {
                span_index,
                start: span.start,
                key,
            });
        }
        current = key;
    }
    found
}

/// Pearson correlation between the histogram and a profile rotated to `shift`.
fn correlate(histogram: &[f64; 12], profile: &[f64; 12], shift: usize) -> f64 {
    let rotated: Vec<f64> = (0..12).map(|pc| profile[(pc + 12 - shift) % 12]).collect();
    let mean_x = histogram.iter().sum::<f64>() / 12.0;
    let mean_y = rotated.iter().sum::<f64>() / 12.0;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in histogram.iter().zip(&rotated) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}
