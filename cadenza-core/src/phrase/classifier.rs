//! Phrase/segment verdicts for candidate spans.
//!
//! Three signals feed the confidence: rhythmic coherence against the beat
//! grid, a prior over phrase lengths in bars, and note density. Each signal
//! lies in 0..1 and the confidence is their weighted average, so raising any
//! one signal never lowers the confidence.

use cadenza_types::{
    ClassifierSettings, Meter, RhythmicCharacter, SectionMetrics, SegmentReason, Span, SpanVerdict,
    Verdict, PHRASE_BAR_LENGTHS, PHRASE_CONFIDENCE_THRESHOLD,
};

/// Scales IOI variance (in beats squared) inside the coherence curve.
const COHERENCE_SHARPNESS: f64 = 4.0;

/// `1 / (1 + k * variance)` of the inter-onset intervals measured in beats.
/// A span with a single attack has no pulse and scores 0.
pub fn rhythmic_coherence(span: &Span<'_>, meter: &Meter) -> f64 {
    let beat = meter.beat_seconds();
    let iois: Vec<f64> = span.inter_onset_intervals().iter().map(|i| i / beat).collect();
    if iois.is_empty() {
        return 0.0;
    }
    1.0 / (1.0 + COHERENCE_SHARPNESS * variance(&iois))
}

/// Attacks per beat against the saturation level, capped at 1. Timing
/// regularity is left to `rhythmic_coherence` so that IOI variance moves
/// exactly one signal.
pub fn density(span: &Span<'_>, meter: &Meter, settings: &ClassifierSettings) -> f64 {
    let length_beats = span.length_seconds() / meter.beat_seconds();
    if length_beats <= 0.0 {
        return 0.0;
    }
    let attacks = span.note_count() as f64;
    (attacks / length_beats / settings.full_density_notes_per_beat).min(1.0)
}

pub fn metrics(span: &Span<'_>, meter: &Meter, settings: &ClassifierSettings) -> SectionMetrics {
    let duration_bars = (span.length_seconds() / meter.bar_seconds()).round() as u32;
    let rhythmic_coherence = rhythmic_coherence(span, meter);
    let length_prior = settings.length_prior.normalized(duration_bars);
    let density = density(span, meter, settings);

    let w = settings.weights.normalized();
    let confidence =
        (w.rhythm * rhythmic_coherence + w.prior * length_prior + w.density * density).clamp(0.0, 1.0);

    SectionMetrics {
        duration_bars,
        rhythmic_coherence,
        length_prior,
        density,
        confidence,
    }
}

/// Classify one span. Gates run in order: note count, zero length, allowed
/// bar count, confidence.
pub fn classify(span: &Span<'_>, meter: &Meter, settings: &ClassifierSettings) -> SpanVerdict {
    let metrics = metrics(span, meter, settings);
    let note_count = span.note_count();

    let segment = |reason| Verdict::Segment { note_count, reason };
    let verdict = if note_count <= settings.segment_maximum_notes {
        segment(SegmentReason::InsufficientDensity)
    } else if metrics.duration_bars == 0 {
        segment(SegmentReason::TooShort)
    } else if !PHRASE_BAR_LENGTHS.contains(&metrics.duration_bars) {
        segment(SegmentReason::IrregularLength {
            bars: metrics.duration_bars,
        })
    } else if metrics.confidence <= PHRASE_CONFIDENCE_THRESHOLD {
        segment(weakest_signal(&metrics))
    } else {
        Verdict::Phrase {
            duration_bars: metrics.duration_bars,
            confidence: metrics.confidence,
            rhythmic_character: RhythmicCharacter::from_coherence(metrics.rhythmic_coherence),
        }
    };

    log::debug!(
        target: "phrase",
        "span {:.2}-{:.2}s: {} notes, {} bars, confidence {:.2} => {:?}",
        span.start,
        span.end,
        note_count,
        metrics.duration_bars,
        metrics.confidence,
        verdict
    );

    SpanVerdict {
        start: span.start,
        end: span.end,
        note_count,
        metrics,
        verdict,
    }
}

fn weakest_signal(metrics: &SectionMetrics) -> SegmentReason {
    if metrics.rhythmic_coherence <= metrics.density && metrics.rhythmic_coherence <= metrics.length_prior {
        SegmentReason::Arrhythmic
    } else if metrics.density <= metrics.length_prior {
        SegmentReason::Sparse
    } else {
        SegmentReason::LowConfidence {
            confidence: metrics.confidence,
        }
    }
}

fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_types::NoteEvent;

    fn notes(onsets: &[f64]) -> Vec<NoteEvent> {
        onsets.iter().map(|&t| NoteEvent::new(60, 80, t)).collect()
    }

    fn span(events: &[NoteEvent], end: f64) -> Span<'_> {
        Span {
            start: events[0].onset,
            end,
            events,
        }
    }

    fn meter() -> Meter {
        Meter::new(120.0, (4, 4))
    }

    #[test]
    fn steady_four_bar_line_is_a_phrase() {
        let onsets: Vec<f64> = (0..16).map(|i| i as f64 * 0.5).collect();
        let events = notes(&onsets);
        let result = classify(&span(&events, 8.0), &meter(), &ClassifierSettings::default());
        match result.verdict {
            Verdict::Phrase {
                duration_bars,
                confidence,
                rhythmic_character,
            } => {
                assert_eq!(duration_bars, 4);
                assert!(confidence > 0.99);
                assert_eq!(rhythmic_character, RhythmicCharacter::Steady);
            }
            other => panic!("expected phrase, got {:?}", other),
        }
    }

    #[test]
    fn few_notes_are_insufficient_regardless_of_rhythm() {
        let events = notes(&[0.0, 0.5]);
        let result = classify(&span(&events, 8.0), &meter(), &ClassifierSettings::default());
        assert_eq!(
            result.verdict,
            Verdict::Segment {
                note_count: 2,
                reason: SegmentReason::InsufficientDensity
            }
        );
    }

    #[test]
    fn confident_but_irregular_length_is_a_segment() {
        // Perfectly steady, but 5 bars long
        let onsets: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let events = notes(&onsets);
        let result = classify(&span(&events, 10.0), &meter(), &ClassifierSettings::default());
        assert_eq!(result.metrics.duration_bars, 5);
        assert!(result.metrics.confidence > 0.6);
        assert!(matches!(
            result.verdict,
            Verdict::Segment {
                reason: SegmentReason::IrregularLength { bars: 5 },
                ..
            }
        ));
    }

    #[test]
    fn short_span_is_too_short() {
        let events = notes(&[0.0, 0.1, 0.2, 0.3]);
        let result = classify(&span(&events, 0.4), &meter(), &ClassifierSettings::default());
        assert_eq!(result.metrics.duration_bars, 0);
        assert!(matches!(
            result.verdict,
            Verdict::Segment {
                reason: SegmentReason::TooShort,
                ..
            }
        ));
    }

    #[test]
    fn erratic_four_bars_is_arrhythmic() {
        let events = notes(&[0.0, 0.1, 3.0, 3.2, 6.5, 7.9]);
        let result = classify(&span(&events, 8.0), &meter(), &ClassifierSettings::default());
        assert_eq!(result.metrics.duration_bars, 4);
        assert!(result.metrics.confidence <= 0.6);
        assert!(matches!(
            result.verdict,
            Verdict::Segment {
                reason: SegmentReason::Arrhythmic,
                ..
            }
        ));
    }

    #[test]
    fn lower_ioi_variance_never_lowers_confidence() {
        let settings = ClassifierSettings::default();
        let even = notes(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        let uneven = notes(&[0.0, 0.6, 2.0, 3.4, 4.0, 4.7, 6.0, 7.0]);
        let very_uneven = notes(&[0.0, 0.1, 2.5, 2.6, 4.0, 6.8, 6.9, 7.0]);

        let a = metrics(&span(&even, 8.0), &meter(), &settings).confidence;
        let b = metrics(&span(&uneven, 8.0), &meter(), &settings).confidence;
        let c = metrics(&span(&very_uneven, 8.0), &meter(), &settings).confidence;
        assert!(a >= b);
        assert!(b >= c);
    }

    #[test]
    fn tighter_timing_wins_even_with_a_shorter_pulse() {
        let settings = ClassifierSettings::default();
        // Nearly a single attack: tiny IOIs and tiny variance
        let clustered = notes(&[0.0, 0.001, 0.002, 0.005]);
        let spread = notes(&[0.0, 1.0, 2.0, 3.01]);

        let a = metrics(&span(&clustered, 8.0), &meter(), &settings);
        let b = metrics(&span(&spread, 8.0), &meter(), &settings);
        assert!(a.rhythmic_coherence > b.rhythmic_coherence);
        assert_eq!(a.density, b.density);
        assert!(a.confidence >= b.confidence);
    }

    #[test]
    fn weights_are_normalized() {
        let mut settings = ClassifierSettings::default();
        settings.weights.rhythm *= 10.0;
        settings.weights.prior *= 10.0;
        settings.weights.density *= 10.0;
        let onsets: Vec<f64> = (0..16).map(|i| i as f64 * 0.5).collect();
        let events = notes(&onsets);
        let scaled = metrics(&span(&events, 8.0), &meter(), &settings).confidence;
        let plain = metrics(&span(&events, 8.0), &meter(), &ClassifierSettings::default()).confidence;
        assert!((scaled - plain).abs() < 1e-12);
    }
}
