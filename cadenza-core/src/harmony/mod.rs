//! Harmonic reading of a session: key detection, grouping of simultaneous
//! notes into moments, and chord matching against the knowledge base.

pub mod key;
pub mod matcher;
pub mod moments;

pub use key::{detect_key, estimate_key, modulations, pitch_class_histogram};
pub use matcher::{match_pitches, match_tones, pass_through, MatchResult};
pub use moments::{group_moments, Moment};
