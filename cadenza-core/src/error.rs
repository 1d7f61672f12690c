use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline step an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validation,
    Matching,
    Composition,
    KnowledgeLoad,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::Matching => "harmonic matching",
            Stage::Composition => "analysis composition",
            Stage::KnowledgeLoad => "knowledge base load",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures of the knowledge base store or of a reader in front of it.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("knowledge base file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("knowledge base has no `{0}` table")]
    MissingSchema(&'static str),

    #[error("knowledge base format version {found} is not the supported version {expected}")]
    VersionMismatch { found: i32, expected: i32 },

    #[error("knowledge base table `{0}` is empty")]
    EmptyTable(&'static str),

    #[error("cannot decode `{table}` row: {detail}")]
    Decode { table: &'static str, detail: String },

    #[error("knowledge reader failed: {0}")]
    Reader(String),
}

/// Errors reported by [`Analyzer`](crate::analyzer::Analyzer).
///
/// Ambiguous harmony and unphrased material are outcomes, not errors; they
/// never show up here.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("malformed input during {stage}: {detail}")]
    MalformedInput { stage: Stage, detail: String },

    #[error("knowledge base unavailable during {stage}: {source}")]
    KnowledgeBaseUnavailable {
        stage: Stage,
        #[source]
        source: KnowledgeError,
    },
}

impl AnalysisError {
    pub fn malformed(stage: Stage, detail: impl Into<String>) -> Self {
        AnalysisError::MalformedInput {
            stage,
            detail: detail.into(),
        }
    }

    pub fn knowledge(stage: Stage, source: KnowledgeError) -> Self {
        AnalysisError::KnowledgeBaseUnavailable { stage, source }
    }

    pub fn stage(&self) -> Stage {
        match self {
            AnalysisError::MalformedInput { stage, .. }
            | AnalysisError::KnowledgeBaseUnavailable { stage, .. } => *stage,
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Attach a stage to knowledge-base failures.
pub(crate) trait KnowledgeContext<T> {
    fn at(self, stage: Stage) -> Result<T>;
}

impl<T> KnowledgeContext<T> for std::result::Result<T, KnowledgeError> {
    fn at(self, stage: Stage) -> Result<T> {
        self.map_err(|e| AnalysisError::knowledge(stage, e))
    }
}
