//! # cadenza-core
//!
//! Post-performance analysis for captured improvisation sessions: phrase
//! segmentation and harmonic reading against a music-theory knowledge base,
//! with beginner, intermediate and advanced views of the result.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadenza_core::analyzer::Analyzer;
//! use cadenza_core::config::Config;
//!
//! // 1. Embedded defaults plus ~/.config/cadenza/config.toml
//! let config = Config::load();
//!
//! // 2. Knowledge base (built-in or the configured SQLite file) and cache
//! let analyzer = Analyzer::from_config(&config)?;
//!
//! // 3. Hand over an owned copy of the captured session
//! let report = analyzer.analyze(&session)?;
//! for verdict in &report.verdicts {
//!     println!("{:.1}-{:.1}s {:?}", verdict.start, verdict.end, verdict.verdict);
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`analyzer`]: `Analyzer::analyze()`, the single synchronous entry point;
//!   input validation and meter choice
//! - [`phrase`]: boundary detectors (silence, pedal, dynamics), merge and
//!   partition into spans, tempo estimate, phrase/segment classifier
//! - [`harmony`]: moment grouping, key detection, chord matcher
//! - [`compose`]: tiered facets: chord symbols, Roman numerals, progression,
//!   voice-leading, modal and post-functional readings
//! - [`cache`]: bounded fingerprint-keyed memo of matcher + composer results
//! - [`knowledge`]: `KnowledgeReader` trait, indexed `KnowledgeBase`, SQLite
//!   save/load
//! - [`config`]: TOML configuration (embedded defaults + user override)
//! - [`error`]: `AnalysisError`, `KnowledgeError`, pipeline `Stage`

pub mod analyzer;
pub mod cache;
pub mod compose;
pub mod config;
pub mod error;
pub mod harmony;
pub mod knowledge;
pub mod phrase;

pub use analyzer::{Analyzer, AnalyzerSettings};
pub use error::{AnalysisError, KnowledgeError, Result, Stage};
pub use knowledge::{KnowledgeBase, KnowledgeReader};
