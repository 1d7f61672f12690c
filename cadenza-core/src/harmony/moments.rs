use cadenza_types::{Fingerprint, IntervalPattern, NoteEvent, ToneSet};

/// Notes whose onsets fall within the simultaneity window of the first one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moment<'a> {
    pub onset: f64,
    pub events: &'a [NoteEvent],
}

impl<'a> Moment<'a> {
    /// Distinct sounding pitches, lowest first.
    pub fn pitches(&self) -> Vec<u8> {
        let mut pitches: Vec<u8> = self.events.iter().map(|e| e.pitch).collect();
        pitches.sort_unstable();
        pitches.dedup();
        pitches
    }

    pub fn tones(&self) -> ToneSet {
        ToneSet::from_semitones(self.events.iter().map(|e| e.pitch))
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.pitches())
    }

    pub fn pattern(&self) -> IntervalPattern {
        IntervalPattern::from_pitches(&self.pitches())
    }
}

/// Group onset-ordered events into moments. A moment starts at the first
/// ungrouped event and takes every later event within `tolerance` seconds of
/// that first onset. The first event always belongs to its own moment, so a
/// negative or NaN tolerance degrades to one event per moment.
pub fn group_moments(events: &[NoteEvent], tolerance: f64) -> Vec<Moment<'_>> {
    let mut moments = Vec::new();
    let mut start = 0;
    while start < events.len() {
        let onset = events[start].onset;
        let len = events[start..]
            .iter()
            .take_while(|e| e.onset - onset <= tolerance)
            .count()
            .max(1);
        moments.push(Moment {
            onset,
            events: &events[start..start + len],
        });
        start += len;
    }
    moments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_simultaneous_notes_share_a_moment() {
        let events = vec![
            NoteEvent::new(60, 80, 0.0),
            NoteEvent::new(64, 80, 0.02),
            NoteEvent::new(67, 80, 0.04),
            NoteEvent::new(72, 80, 0.5),
        ];
        let moments = group_moments(&events, 0.05);
        assert_eq!(moments.len(), 2);
        assert_eq!(moments[0].pitches(), vec![60, 64, 67]);
        assert_eq!(moments[1].onset, 0.5);
    }

    #[test]
    fn window_is_anchored_on_first_onset() {
        // 0.04 after 0.03 would chain, but 0.08 is past the window of 0.0
        let events = vec![
            NoteEvent::new(60, 80, 0.0),
            NoteEvent::new(64, 80, 0.04),
            NoteEvent::new(67, 80, 0.08),
        ];
        let moments = group_moments(&events, 0.05);
        assert_eq!(moments.len(), 2);
        assert_eq!(moments[1].pitches(), vec![67]);
    }

    #[test]
    fn unusable_tolerance_still_advances() {
        let events = vec![
            NoteEvent::new(60, 80, 0.0),
            NoteEvent::new(64, 80, 0.0),
            NoteEvent::new(67, 80, 0.5),
        ];
        assert_eq!(group_moments(&events, -0.01).len(), 3);
        assert_eq!(group_moments(&events, f64::NAN).len(), 3);
    }

    #[test]
    fn fingerprint_ignores_order_and_doubling() {
        let a = [NoteEvent::new(67, 80, 0.0), NoteEvent::new(60, 80, 0.0), NoteEvent::new(64, 80, 0.0)];
        let b = [
            NoteEvent::new(48, 80, 0.0),
            NoteEvent::new(64, 80, 0.0),
            NoteEvent::new(67, 80, 0.0),
            NoteEvent::new(72, 80, 0.0),
        ];
        let ma = group_moments(&a, 0.05)[0];
        let mb = group_moments(&b, 0.05)[0];
        assert_eq!(ma.fingerprint(), mb.fingerprint());
    }
}
