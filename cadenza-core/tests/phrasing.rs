mod common;

use cadenza_types::{Meter, NoteEvent, RhythmicCharacter, SegmentReason, Verdict};

use common::{analyzer, line, session};

const SCALE: [u8; 8] = [60, 62, 64, 65, 67, 69, 71, 72];

#[test]
fn steady_four_bar_line_is_a_phrase() {
    let pitches: Vec<u8> = SCALE.iter().chain(SCALE.iter().rev()).copied().collect();
    let s = session(1, line(&pitches, 0.0, 0.5)).with_meter(Meter::new(120.0, (4, 4)));

    let report = analyzer().analyze(&s).unwrap();

    assert_eq!(report.verdicts.len(), 1);
    match report.verdicts[0].verdict {
        Verdict::Phrase {
            duration_bars,
            confidence,
            rhythmic_character,
        } => {
            assert_eq!(duration_bars, 4);
            assert!(confidence > 0.6);
            assert_eq!(rhythmic_character, RhythmicCharacter::Steady);
        }
        other => panic!("expected a phrase, got {:?}", other),
    }
    assert_eq!(report.phrase_count(), 1);
}

#[test]
fn silence_splits_and_short_tail_is_a_segment() {
    // Eight quick notes, a two-second pause, one more note
    let mut events = line(&SCALE, 0.0, 0.2);
    events.push(NoteEvent::new(72, 80, 3.4));
    let report = analyzer().analyze(&session(2, events)).unwrap();

    assert!((report.meter.bpm - 150.0).abs() < 1e-3);
    assert_eq!(report.verdicts.len(), 2);

    let first = &report.verdicts[0];
    assert_eq!(first.note_count, 8);
    let bars = ((first.end - first.start) / report.meter.bar_seconds()).round() as u32;
    assert_eq!(first.metrics.duration_bars, bars);
    assert_eq!(
        first.verdict,
        Verdict::Segment {
            note_count: 8,
            reason: SegmentReason::IrregularLength { bars: 1 },
        }
    );

    let tail = &report.verdicts[1];
    assert_eq!(tail.start, 3.4);
    assert_eq!(
        tail.verdict,
        Verdict::Segment {
            note_count: 1,
            reason: SegmentReason::InsufficientDensity,
        }
    );
    assert_eq!(report.phrase_count(), 0);
}

#[test]
fn two_notes_never_make_a_phrase() {
    let report = analyzer().analyze(&session(3, line(&[60, 67], 0.0, 0.5))).unwrap();
    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(
        report.verdicts[0].verdict,
        Verdict::Segment {
            note_count: 2,
            reason: SegmentReason::InsufficientDensity,
        }
    );
}

#[test]
fn pedal_release_starts_a_new_span() {
    let mut events: Vec<NoteEvent> = line(&SCALE, 0.0, 0.5).into_iter().map(|e| e.with_sustain(true)).collect();
    events.extend(line(&SCALE, 4.0, 0.5));
    let s = session(4, events).with_meter(Meter::new(120.0, (4, 4)));

    let report = analyzer().analyze(&s).unwrap();

    assert_eq!(report.verdicts.len(), 2);
    assert_eq!(report.verdicts[1].start, 4.0);
    assert_eq!(report.verdicts[0].note_count, 8);
    assert_eq!(report.verdicts[1].note_count, 8);
}

#[test]
fn moderate_dynamics_change_alone_does_not_split() {
    // A 30-velocity drop weighs 0.4, below the 0.5 floor
    let mut events = line(&SCALE, 0.0, 0.5);
    events.extend(line(&SCALE, 4.0, 0.5).into_iter().map(|mut e| {
        e.velocity = 50;
        e
    }));
    let s = session(5, events).with_meter(Meter::new(120.0, (4, 4)));

    let report = analyzer().analyze(&s).unwrap();

    assert_eq!(report.verdicts.len(), 1);
    assert_eq!(report.verdicts[0].note_count, 16);
}

#[test]
fn verdicts_cover_the_session_in_order() {
    let mut events = line(&SCALE, 0.0, 0.5);
    events.extend(line(&SCALE, 6.0, 0.5));
    events.extend(line(&[60, 64], 12.0, 0.5));
    let report = analyzer().analyze(&session(6, events)).unwrap();

    assert_eq!(report.verdicts.len(), 3);
    let notes: usize = report.verdicts.iter().map(|v| v.note_count).sum();
    assert_eq!(notes, 18);
    assert!(report.verdicts.windows(2).all(|w| w[0].start < w[1].start));
}
