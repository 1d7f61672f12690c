//! Phrase segmentation: boundary detection, span partitioning and
//! phrase/segment classification.

pub mod classifier;
pub mod detector;
pub mod tempo;

use cadenza_types::{ClassifierSettings, DetectorSettings, Meter, NoteEvent, Span, SpanVerdict};

pub use classifier::classify;
pub use detector::{detect, partition};
pub use tempo::estimate_meter;

/// Spans of an onset-ordered event slice, cut at the merged boundaries.
pub fn segment<'a>(events: &'a [NoteEvent], meter: &Meter, settings: &DetectorSettings) -> Vec<Span<'a>> {
    let boundaries = detect(events, settings);
    partition(events, &boundaries, meter.beat_seconds())
}

/// Classify every span, in order.
pub fn phrase_verdicts(
    spans: &[Span<'_>],
    meter: &Meter,
    settings: &ClassifierSettings,
) -> Vec<SpanVerdict> {
    spans.iter().map(|span| classify(span, meter, settings)).collect()
}
