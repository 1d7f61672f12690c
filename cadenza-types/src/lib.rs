//! # cadenza-types
//!
//! Shared type definitions for the Cadenza post-performance analysis pipeline.
//! This crate contains plain data only: captured note events, sessions, the
//! pitch and chord vocabulary, phrase verdicts and tiered analysis values.
//! Every value here is safe to hand to a display or persistence layer as-is.

pub mod analysis;
pub mod chord;
pub mod event;
pub mod music;
pub mod phrase;
pub mod report;
pub mod settings;

pub use analysis::*;
pub use chord::*;
pub use event::{Meter, NoteEvent, Session};
pub use music::{Key, KeyMode, Mode, PitchClass};
pub use phrase::*;
pub use report::*;
pub use settings::*;

/// Identifier of one improvisation session, assigned by the capture side.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
