//! qasynth Extractor - Rule-based question/answer synthesis
//!
//! Turns annotated sentences into verified question/answer pairs:
//! - Topic matching over configured topics and generated aliases
//! - Dependency-pattern fact detection (definitions, SVO, passives, dates, quantities)
//! - Template realization into questions, short answers and answer sentences
//! - An ordered, fail-fast quality filter with rejection statistics
//! - Deduplication and evidence-quality ranking

use qasynth_core::AnnotatedSentence;
use serde::{Deserialize, Serialize};

pub mod patterns;
pub mod pipeline;
pub mod quality;
pub mod rank;
pub mod realize;
pub mod text;
pub mod topic;

#[cfg(test)]
mod test_support;

pub use patterns::{Detector, Extraction, PatternExtractor};
pub use pipeline::{PipelineOutput, PipelineStats, QaPipeline};
pub use quality::{QualityFilter, QualityStats, Verdict};
pub use rank::{deduplicate_and_rank, evidence_quality};
pub use realize::{RealizeFailure, TemplateRealizer};
pub use topic::{build_topic_aliases, TopicMatcher};

// ============================================================================
// Fact Candidates
// ============================================================================

/// Kinds of facts the detectors produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactKind {
    Definition,
    Svo,
    PassiveCreation,
    Ownership,
    Apposition,
    DateRelease,
    QuantitySimple,
    QuantityExistential,
}

impl FactKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Svo => "svo",
            Self::PassiveCreation => "passive_creation",
            Self::Ownership => "ownership",
            Self::Apposition => "apposition",
            Self::DateRelease => "date_release",
            Self::QuantitySimple => "quantity_simple",
            Self::QuantityExistential => "quantity_existential",
        }
    }
}

impl std::fmt::Display for FactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind-specific payload of a fact. Token fields index into the owning
/// sentence; text fields are verbatim document spans.
#[derive(Debug, Clone, PartialEq)]
pub enum Fact {
    /// "X is Y" with a copular root
    Definition {
        subject: usize,
        subject_text: String,
        verb: usize,
        attribute_text: String,
    },

    /// Active subject-verb-object with a curated root verb
    Svo {
        subject_text: String,
        verb: usize,
        object_text: String,
    },

    /// "X was created by Y"
    PassiveCreation {
        subject_text: String,
        verb: usize,
        agent_text: String,
    },

    /// "X is owned by Y and Z"; coordinated entities joined with ", "
    Ownership {
        subject_text: String,
        verb: usize,
        owner_text: String,
    },

    /// "X, a Y," with a named-entity head
    Apposition {
        subject_text: String,
        description_text: String,
    },

    /// Release/creation date; `verb` is absent for parenthesized years
    DateRelease {
        subject_text: String,
        verb: Option<usize>,
        date_text: Option<String>,
    },

    /// "nine sequels"
    QuantitySimple {
        number: usize,
        noun: usize,
        noun_phrase: String,
    },

    /// "there are nine sequels"
    QuantityExistential { number: usize, noun: usize },
}

impl Fact {
    pub fn kind(&self) -> FactKind {
        match self {
            Self::Definition { .. } => FactKind::Definition,
            Self::Svo { .. } => FactKind::Svo,
            Self::PassiveCreation { .. } => FactKind::PassiveCreation,
            Self::Ownership { .. } => FactKind::Ownership,
            Self::Apposition { .. } => FactKind::Apposition,
            Self::DateRelease { .. } => FactKind::DateRelease,
            Self::QuantitySimple { .. } => FactKind::QuantitySimple,
            Self::QuantityExistential { .. } => FactKind::QuantityExistential,
        }
    }
}

/// A fact detected in one sentence, consumed once by the realizer
#[derive(Debug, Clone)]
pub struct FactCandidate<'s> {
    pub sentence: &'s AnnotatedSentence,
    pub fact: Fact,
}

impl<'s> FactCandidate<'s> {
    pub fn new(sentence: &'s AnnotatedSentence, fact: Fact) -> Self {
        Self { sentence, fact }
    }

    pub fn kind(&self) -> FactKind {
        self.fact.kind()
    }

    /// Verbatim source sentence
    pub fn evidence(&self) -> &'s str {
        self.sentence.text()
    }
}

/// Readable message from a caught panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
