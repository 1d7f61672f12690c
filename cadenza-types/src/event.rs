//! Captured note events and the session that owns them.

use serde::{Deserialize, Serialize};

use crate::music::PitchClass;
use crate::SessionId;

/// One played note as delivered by the capture side.
///
/// Times are seconds from the start of the session. Immutable once captured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch (0-127)
    pub pitch: u8,
    /// MIDI velocity (0-127)
    pub velocity: u8,
    pub onset: f64,
    /// Sounding length in seconds, when the capture side measured it
    #[serde(default)]
    pub duration: Option<f64>,
    /// Sustain pedal held while this note started
    #[serde(default)]
    pub sustain: bool,
}

impl NoteEvent {
    pub fn new(pitch: u8, velocity: u8, onset: f64) -> Self {
        Self {
            pitch,
            velocity,
            onset,
            duration: None,
            sustain: false,
        }
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_sustain(mut self, sustain: bool) -> Self {
        self.sustain = sustain;
        self
    }

    pub fn pitch_class(&self) -> PitchClass {
        PitchClass::from_semitone(self.pitch as i32)
    }

    /// Onset plus duration, if the duration is known.
    pub fn end(&self) -> Option<f64> {
        self.duration.map(|d| self.onset + d)
    }
}

/// Tempo and time signature used to convert seconds into beats and bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Meter {
    pub bpm: f32,
    pub time_signature: (u8, u8),
}

impl Meter {
    pub fn new(bpm: f32, time_signature: (u8, u8)) -> Self {
        Self { bpm, time_signature }
    }

    pub fn beat_seconds(&self) -> f64 {
        60.0 / self.bpm.max(1.0) as f64
    }

    pub fn beats_per_bar(&self) -> u8 {
        self.time_signature.0.max(1)
    }

    pub fn bar_seconds(&self) -> f64 {
        self.beat_seconds() * self.beats_per_bar() as f64
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            time_signature: (4, 4),
        }
    }
}

/// An improvisation session: the ordered event stream plus an optional
/// detected meter. Analysis always works on an owned copy of this value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub id: SessionId,
    pub events: Vec<NoteEvent>,
    #[serde(default)]
    pub meter: Option<Meter>,
}

impl Session {
    pub fn new(id: SessionId, events: Vec<NoteEvent>) -> Self {
        Self {
            id,
            events,
            meter: None,
        }
    }

    pub fn with_meter(mut self, meter: Meter) -> Self {
        self.meter = Some(meter);
        self
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
