use cadenza_types::{Meter, NoteEvent};

use super::detector::median;

pub const MIN_ESTIMATED_BPM: f64 = 60.0;
pub const MAX_ESTIMATED_BPM: f64 = 180.0;

/// Estimate a meter from the median gap between distinct onsets, taken as
/// one beat and folded by octaves into 60..180 bpm. `None` when the events
/// have fewer than two distinct onsets.
pub fn estimate_meter(events: &[NoteEvent], time_signature: (u8, u8)) -> Option<Meter> {
    let gaps: Vec<f64> = events
        .windows(2)
        .map(|w| w[1].onset - w[0].onset)
        .filter(|gap| *gap > 1e-6)
        .collect();
    let beat = median(&gaps)?;

    let mut bpm = 60.0 / beat;
    while bpm > MAX_ESTIMATED_BPM {
        bpm /= 2.0;
    }
    while bpm < MIN_ESTIMATED_BPM {
        bpm *= 2.0;
    }
    log::debug!(target: "phrase", "estimated tempo {:.1} bpm from {} gaps", bpm, gaps.len());
    Some(Meter::new(bpm as f32, time_signature))
}
