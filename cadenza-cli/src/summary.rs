//! Plain-text rendering of a session report.

use std::fmt::Write;

use cadenza_types::{
    Facet, FacetValue, HarmonyOutcome, MomentReport, PitchClass, RhythmicCharacter, SessionReport, SpanVerdict, Verdict,
};

pub fn render(report: &SessionReport) -> String {
    let mut out = String::new();
    let meter = report.meter;
    let key = &report.harmony.key;

    let _ = writeln!(out, "session {}", report.session);
    let _ = writeln!(
        out,
        "meter   {:.0} bpm {}/{}",
        meter.bpm, meter.time_signature.0, meter.time_signature.1
    );
    let _ = writeln!(out, "key     {} (confidence {:.2})", key.key, key.confidence);

    let _ = writeln!(out, "\nphrases ({} of {} spans)", report.phrase_count(), report.verdicts.len());
    for verdict in &report.verdicts {
        let _ = writeln!(out, "  {}", span_line(verdict));
    }

    let _ = writeln!(out, "\nharmony");
    for moment in &report.harmony.moments {
        let _ = writeln!(out, "  {}", moment_line(moment));
    }

    let progression = &report.harmony.progression;
    if let Some(FacetValue::Progression(summary)) = progression.get(Facet::Progression) {
        if !summary.numerals.is_empty() {
            let _ = writeln!(out, "\nprogression {}", summary.numerals.join(" - "));
        }
        if let Some(pattern) = &summary.pattern {
            let _ = writeln!(out, "  pattern  {}", pattern);
        }
        for cadence in &summary.cadences {
            let _ = writeln!(out, "  cadence  {} at chord {} ({})", cadence.name, cadence.index + 1, cadence.emotion);
        }
    }
    if let Some(FacetValue::Modal(modal)) = progression.get(Facet::ModalCharacter) {
        let _ = writeln!(out, "\nmode    {} {}: {}", modal.tonic, modal.mode, modal.description);
    }
    if let Some(FacetValue::Techniques(techniques)) = progression.get(Facet::PostFunctional) {
        if !techniques.is_empty() {
            let names: Vec<String> = techniques.iter().map(|t| format!("{:?}", t).to_lowercase()).collect();
            let _ = writeln!(out, "colour  {}", names.join(", "));
        }
    }
    out
}

fn span_line(span: &SpanVerdict) -> String {
    let range = format!("{:>6.2}-{:<6.2}s", span.start, span.end);
    match span.verdict {
        Verdict::Phrase {
            duration_bars,
            confidence,
            rhythmic_character,
        } => format!(
            "{} phrase, {} bars, {} ({:.2})",
            range,
            duration_bars,
            character(rhythmic_character),
            confidence
        ),
        Verdict::Segment { note_count, reason } => {
            format!("{} segment, {} notes: {}", range, note_count, reason.describe())
        }
    }
}

fn character(c: RhythmicCharacter) -> &'static str {
    match c {
        RhythmicCharacter::Steady => "steady",
        RhythmicCharacter::Flowing => "flowing",
        RhythmicCharacter::Rubato => "rubato",
    }
}

fn note_name(pitch: u8) -> String {
    format!("{}{}", PitchClass::from_semitone(pitch as i32).name(), (pitch / 12) as i32 - 1)
}

fn moment_line(moment: &MomentReport) -> String {
    let at = format!("{:>7.2}s", moment.onset);
    let numeral = moment.analysis.as_ref().and_then(|a| match a.get(Facet::RomanNumeral) {
        Some(FacetValue::RomanNumeral(n)) => Some(n.label.as_str()),
        _ => None,
    });
    match &moment.outcome {
        HarmonyOutcome::Rest => format!("{} rest", at),
        HarmonyOutcome::SingleNote { pitch } => format!("{} {}", at, note_name(*pitch)),
        HarmonyOutcome::Interval { low, high, name, .. } => {
            format!("{} {}-{} ({})", at, note_name(*low), note_name(*high), name)
        }
        HarmonyOutcome::Identified { matches, confidence, .. } => {
            let mut line = format!("{} {:<8}", at, matches.best.symbol);
            if let Some(numeral) = numeral {
                let _ = write!(line, " {:<8}", numeral);
            }
            let _ = write!(line, " ({:.2})", confidence);
            line
        }
        HarmonyOutcome::Ambiguous { confidence, candidates, .. } => {
            format!("{} ambiguous, {} candidates (best {:.2})", at, candidates, confidence)
        }
        HarmonyOutcome::Unrecognized { pattern } => format!("{} unrecognized {:?}", at, pattern.offsets()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cadenza_core::{Analyzer, AnalyzerSettings, KnowledgeBase};
    use cadenza_types::{NoteEvent, Session, SessionId};

    fn analyze(events: Vec<NoteEvent>) -> SessionReport {
        let analyzer = Analyzer::new(Arc::new(KnowledgeBase::builtin().unwrap()), AnalyzerSettings::default());
        analyzer.analyze(&Session::new(SessionId::new(3), events)).unwrap()
    }

    fn chord(pitches: &[u8], onset: f64) -> impl Iterator<Item = NoteEvent> + '_ {
        pitches.iter().map(move |&p| NoteEvent::new(p, 80, onset))
    }

    #[test]
    fn note_names_carry_octaves() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(69), "A4");
        assert_eq!(note_name(21), "A0");
    }

    #[test]
    fn chords_render_with_numerals() {
        let events: Vec<NoteEvent> = chord(&[50, 53, 57, 60], 0.0)
            .chain(chord(&[55, 59, 62, 65], 1.0))
            .chain(chord(&[48, 52, 55, 59], 2.0))
            .collect();
        let text = render(&analyze(events));

        assert!(text.starts_with("session 3\n"));
        assert!(text.contains("key     C major"));
        assert!(text.contains("Dm7"));
        assert!(text.contains("pattern  ii-V-I"));
    }

    #[test]
    fn pass_through_moments_render_plainly() {
        let events: Vec<NoteEvent> = chord(&[60], 0.0).chain(chord(&[60, 67], 0.5)).collect();
        let text = render(&analyze(events));
        assert!(text.contains("C4\n"));
        assert!(text.contains("C4-G4"));
        assert!(text.contains("segment, 3 notes"));
    }
}
