//! Topic Matcher
//!
//! Sentence relevance against configured topics and their generated
//! aliases. Phrases are matched as lower-cased token sequences so "Creatures"
//! matches the token, not the substring inside "creatures'".

use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::debug;

use qasynth_core::{AnnotatedSentence, Annotator, Result, TopicConfig};

/// Build the alias set for a topic list.
///
/// Adds the surname and first+last forms of multi-word PERSON entities, a
/// colon-suffixed variant, and "the x"/"the x franchise" lower-cased forms
/// for topics with capitals. Sorted longest first, then case-insensitively.
pub fn build_topic_aliases(topics: &[String], annotator: &dyn Annotator) -> Result<Vec<String>> {
    let mut aliases = BTreeSet::new();

    for topic in topics {
        let topic = topic.trim();
        if topic.is_empty() {
            continue;
        }
        aliases.insert(topic.to_string());

        let parsed = annotator.annotate(topic)?;
        for entity in parsed.entities().iter().filter(|e| e.label == "PERSON") {
            let parts: Vec<&str> = entity.text.split_whitespace().collect();
            if let (Some(first), Some(last)) = (parts.first(), parts.last()) {
                if parts.len() >= 2 {
                    aliases.insert(last.to_string());
                }
                if parts.len() >= 3 {
                    aliases.insert(format!("{} {}", first, last));
                }
            }
        }

        if !topic.contains(':') {
            aliases.insert(format!("{}:", topic));
        }

        let lower = topic.to_lowercase();
        if lower != topic {
            aliases.insert(format!("the {}", lower));
            aliases.insert(format!("the {} franchise", lower));
        }
    }

    let mut aliases: Vec<String> = aliases.into_iter().collect();
    aliases.sort_by(|a, b| {
        b.chars()
            .count()
            .cmp(&a.chars().count())
            .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
    });
    Ok(aliases)
}

/// A phrase as its lower-cased token sequence
#[derive(Debug, Clone)]
struct Phrase {
    text: String,
    tokens: Vec<String>,
}

impl Phrase {
    fn occurs_in(&self, sentence_tokens: &[String]) -> bool {
        !self.tokens.is_empty()
            && sentence_tokens
                .windows(self.tokens.len())
                .any(|window| window == self.tokens.as_slice())
    }
}

fn phrases(texts: &[String], annotator: &dyn Annotator) -> Result<Vec<Phrase>> {
    let parsed = annotator.annotate_many(texts)?;
    Ok(texts
        .iter()
        .zip(parsed)
        .map(|(text, sentence)| Phrase {
            text: text.clone(),
            tokens: sentence.lower_tokens(),
        })
        .collect())
}

/// Exact matcher over literal topics plus a soft matcher over aliases.
/// Built once per run and read-only afterwards.
pub struct TopicMatcher {
    exact: Vec<Phrase>,
    soft: Vec<Phrase>,
    config: TopicConfig,
}

impl TopicMatcher {
    pub fn new(topics: &[String], annotator: &dyn Annotator, config: &TopicConfig) -> Result<Self> {
        let literal: Vec<String> = topics
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let aliases = build_topic_aliases(&literal, annotator)?;

        debug!(topics = literal.len(), aliases = aliases.len(), "Built topic matcher");

        Ok(Self {
            exact: phrases(&literal, annotator)?,
            soft: phrases(&aliases, annotator)?,
            config: config.clone(),
        })
    }

    /// Aliases in matching priority order
    pub fn aliases(&self) -> Vec<&str> {
        self.soft.iter().map(|p| p.text.as_str()).collect()
    }

    /// Relevance score: exact weight if any literal topic occurs, plus the
    /// alias weight if any alias occurs
    pub fn score(&self, sentence: &AnnotatedSentence) -> f64 {
        let tokens = sentence.lower_tokens();
        let mut score = 0.0;
        if self.exact.iter().any(|p| p.occurs_in(&tokens)) {
            score += self.config.exact_weight;
        }
        if self.soft.iter().any(|p| p.occurs_in(&tokens)) {
            score += self.config.alias_weight;
        }
        score
    }

    pub fn is_relevant(&self, sentence: &AnnotatedSentence) -> bool {
        self.score(sentence) >= self.config.relevance_threshold
    }

    /// Relevance flag per sentence, in input order
    pub fn relevant(&self, sentences: &[AnnotatedSentence]) -> Vec<bool> {
        sentences.par_iter().map(|s| self.is_relevant(s)).collect()
    }

    /// Aliases occurring in the sentence, in priority order
    pub fn aliases_in(&self, sentence: &AnnotatedSentence) -> Vec<String> {
        let tokens = sentence.lower_tokens();
        self.soft
            .iter()
            .filter(|p| p.occurs_in(&tokens))
            .map(|p| p.text.clone())
            .collect()
    }
}
