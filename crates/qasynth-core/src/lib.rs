//! qasynth Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout qasynth:
//! - Annotated sentence model with dependency-tree navigation
//! - The `Annotator` contract and in-process implementations
//! - CoNLL-U reader for pre-annotated input
//! - Question/answer candidate records
//! - Common error types
//! - Configuration management

pub mod annotation;
pub mod annotator;
pub mod config;
pub mod conllu;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use annotation::{AnnotatedSentence, EntitySpan, GramNumber, Morph, Tense, Token};
pub use annotator::{Annotator, CachedAnnotator, StaticAnnotator};
pub use config::{
    AnnotationConfig, ConfigError, DetectorConfig, LexiconConfig, LimitsConfig, LoggingConfig,
    PipelineConfig, RankingConfig, RealizerConfig, TopicConfig, VerifyConfig, WordRange,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for qasynth operations
#[derive(Error, Debug)]
pub enum QaError {
    #[error("Annotation unavailable: {0}")]
    AnnotationUnavailable(String),

    #[error("Token {token:?} could not be aligned to sentence text at byte {offset}")]
    Alignment { token: String, offset: usize },

    #[error("CoNLL-U parse error at line {line}: {message}")]
    Conllu { line: usize, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, QaError>;

// ============================================================================
// Question / Answer Candidates
// ============================================================================

/// Interrogative form of a generated question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    What,
    Who,
    When,
    HowMany,
}

impl QuestionType {
    /// Get the string representation (also the key into answer limits)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::What => "what",
            Self::Who => "who",
            Self::When => "when",
            Self::HowMany => "how_many",
        }
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expected semantic type of a short answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectType {
    Date,
    Number,
}

impl ExpectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Number => "number",
        }
    }
}

/// A realized question/answer pair grounded in one source sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaCandidate {
    /// Natural-language question
    pub question: String,

    /// Short answer text
    pub answer_short: String,

    /// Full declarative answer sentence
    pub answer_sentence: String,

    /// Verbatim text of the source sentence
    pub evidence_span: String,

    /// Interrogative form
    pub question_type: QuestionType,

    /// Template family that produced this pair (e.g. "founding", "definition")
    pub fact_type: String,

    /// Expected answer type, used by numeric/date verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect_type: Option<ExpectType>,

    /// Surface text of the question's subject
    pub subject_surface: String,

    /// Topic aliases occurring in the evidence sentence
    #[serde(default)]
    pub topic_aliases: Vec<String>,

    /// Name of the quality check that rejected this pair, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_by: Option<String>,
}

impl QaCandidate {
    /// True if question, short answer and answer sentence are all non-blank
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty()
            && !self.answer_short.trim().is_empty()
            && !self.answer_sentence.trim().is_empty()
    }
}
