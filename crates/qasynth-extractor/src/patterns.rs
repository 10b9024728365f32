//! Pattern Extractor
//!
//! Dependency-pattern detectors over one annotated sentence. Each detector is
//! independent and may fire several times per sentence. Sentences flagged as
//! dirty (citation markers, URLs, page counters) are skipped before any
//! detector runs, and a panicking detector only loses its own facts.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use qasynth_core::{AnnotatedSentence, LexiconConfig, PipelineConfig, Token};

use crate::text::{self, is_year_like, word_count};
use crate::{panic_message, Fact, FactCandidate};

static PAREN_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d{4})\)").expect("valid regex"));

// "12. (1998)" style reference-list entries
static CITATION_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.").expect("valid regex"));

/// Trait for fact detectors
pub trait Detector: Send + Sync {
    /// Name used in logs and statistics
    fn name(&self) -> &'static str;

    /// Detect facts in a clean sentence
    fn detect(&self, sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact>;
}

fn is_pronoun(lexicon: &LexiconConfig, token: &Token) -> bool {
    lexicon.is_bare_pronoun(&token.text)
}

fn lemma_in(token: &Token, set: &std::collections::BTreeSet<String>) -> bool {
    set.contains(&token.lemma.to_lowercase())
}

// ============================================================================
// Detectors
// ============================================================================

/// "X is Y": copular root with a subject and an attribute
pub struct CopularDefinition;

impl Detector for CopularDefinition {
    fn name(&self) -> &'static str {
        "definition"
    }

    fn detect(&self, sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact> {
        let lexicon = &config.lexicon;
        let mut facts = Vec::new();

        for root in sentence.roots() {
            if root.lemma.to_lowercase() != lexicon.copula_lemma {
                continue;
            }
            let Some(subject) = sentence.child_with_dep(root.index, &["nsubj", "nsubjpass"]) else {
                continue;
            };
            let Some(attribute) = sentence.child_with_dep(root.index, &["attr", "acomp"]) else {
                continue;
            };
            if is_pronoun(lexicon, subject) {
                continue;
            }

            facts.push(Fact::Definition {
                subject: subject.index,
                subject_text: sentence.phrase_text(subject.index),
                verb: root.index,
                attribute_text: sentence.phrase_text(attribute.index),
            });
        }

        facts
    }
}

/// Active subject-verb-object with a curated creation/founding/transaction verb
pub struct SubjectVerbObject;

impl Detector for SubjectVerbObject {
    fn name(&self) -> &'static str {
        "svo"
    }

    fn detect(&self, sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact> {
        let lexicon = &config.lexicon;
        let mut facts = Vec::new();

        for root in sentence.roots() {
            if root.pos != "VERB" || !lemma_in(root, &lexicon.svo_verbs) {
                continue;
            }
            let Some(subject) = sentence.child_with_dep(root.index, &["nsubj"]) else {
                continue;
            };

            // Direct object, else the object of a preposition on the verb
            let object = sentence
                .child_with_dep(root.index, &["dobj", "obj", "attr", "oprd"])
                .or_else(|| {
                    sentence
                        .children(root.index)
                        .filter(|c| c.dep == "prep")
                        .find_map(|prep| sentence.child_with_dep(prep.index, &["pobj"]))
                });
            let Some(object) = object else {
                continue;
            };

            if is_pronoun(lexicon, subject) || is_pronoun(lexicon, object) {
                continue;
            }

            facts.push(Fact::Svo {
                subject_text: sentence.phrase_text(subject.index),
                verb: root.index,
                object_text: sentence.phrase_text(object.index),
            });
        }

        facts
    }
}

/// Passive auxiliary, passive subject and a "by" agent with an object
fn passive_parts<'a>(sentence: &'a AnnotatedSentence, verb: &Token) -> Option<(&'a Token, &'a Token)> {
    sentence.child_with_dep(verb.index, &["auxpass"])?;
    let subject = sentence.child_with_dep(verb.index, &["nsubjpass"])?;
    let agent = sentence
        .children(verb.index)
        .find(|c| c.dep == "agent" && c.text.eq_ignore_ascii_case("by"))?;
    let agent_object = sentence.child_with_dep(agent.index, &["pobj"])?;
    Some((subject, agent_object))
}

/// "X was created by Y"
pub struct PassiveCreation;

impl Detector for PassiveCreation {
    fn name(&self) -> &'static str {
        "passive_creation"
    }

    fn detect(&self, sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact> {
        sentence
            .tokens()
            .iter()
            .filter(|t| t.pos == "VERB")
            .filter_map(|verb| {
                let (subject, agent) = passive_parts(sentence, verb)?;
                if is_pronoun(&config.lexicon, subject) {
                    return None;
                }
                Some(Fact::PassiveCreation {
                    subject_text: sentence.phrase_text(subject.index),
                    verb: verb.index,
                    agent_text: sentence.phrase_text(agent.index),
                })
            })
            .collect()
    }
}

/// "X is owned by Y and Z", listing coordinated subjects and owners
pub struct PassiveOwnership;

impl PassiveOwnership {
    fn coordinated(sentence: &AnnotatedSentence, head: usize) -> String {
        let mut members = vec![head];
        members.extend(sentence.conjuncts(head));
        members.sort_unstable();
        members
            .into_iter()
            .map(|i| sentence.phrase_text_single(i))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Detector for PassiveOwnership {
    fn name(&self) -> &'static str {
        "ownership"
    }

    fn detect(&self, sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact> {
        let lexicon = &config.lexicon;

        sentence
            .tokens()
            .iter()
            .filter(|t| t.pos == "VERB" && lemma_in(t, &lexicon.ownership_verbs))
            .filter_map(|verb| {
                let (subject, owner) = passive_parts(sentence, verb)?;
                if is_pronoun(lexicon, subject) {
                    return None;
                }
                Some(Fact::Ownership {
                    subject_text: Self::coordinated(sentence, subject.index),
                    verb: verb.index,
                    owner_text: Self::coordinated(sentence, owner.index),
                })
            })
            .collect()
    }
}

/// "X, a Y," restricted to named-entity heads with a short description.
/// Only registered when `detectors.enable_appositive` is set.
pub struct Appositive;

impl Detector for Appositive {
    fn name(&self) -> &'static str {
        "apposition"
    }

    fn detect(&self, sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact> {
        let max_tokens = config.detectors.appositive_max_tokens;
        let mut facts = Vec::new();

        for description in sentence.tokens().iter().filter(|t| t.dep == "appos") {
            let Some(head) = sentence.token(description.head) else {
                continue;
            };
            if head.index == description.index || !matches!(head.pos.as_str(), "NOUN" | "PROPN") {
                continue;
            }
            let Some(entity) = sentence.entity_at(head.index) else {
                continue;
            };
            // Tokens inside the same entity ("Creatures, Inc.") are not a description
            if entity.contains(description.index) {
                continue;
            }
            if sentence.subtree(description.index).len() > max_tokens {
                continue;
            }

            facts.push(Fact::Apposition {
                subject_text: entity.text.clone(),
                description_text: sentence.phrase_text_single(description.index),
            });
        }

        facts
    }
}

/// Release/creation dates: parenthesized years after a noun, unioned with
/// date-bearing verbs that have a nearby DATE entity.
pub struct ReleaseDate;

impl ReleaseDate {
    fn parenthesized_years(sentence: &AnnotatedSentence) -> Vec<Fact> {
        let text = sentence.text();
        let mut facts = Vec::new();

        for caps in PAREN_YEAR.captures_iter(text) {
            let (Some(whole), Some(year)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let at = whole.start();

            let before = text[..at].trim();
            let tail_start = before
                .char_indices()
                .rev()
                .nth(9)
                .map_or(0, |(i, _)| i);
            if CITATION_TAIL.is_match(&before[tail_start..]) {
                continue;
            }

            let noun = sentence.tokens().iter().find(|t| {
                t.start < at && t.end + 2 >= at && matches!(t.pos.as_str(), "NOUN" | "PROPN")
            });
            let Some(noun) = noun else {
                continue;
            };

            // The noun's phrase up to, not including, the parenthesis
            let span: Vec<usize> = sentence
                .subtree(noun.index)
                .into_iter()
                .filter(|&i| sentence.tokens()[i].end <= at)
                .collect();
            let first = span.first().copied().unwrap_or(noun.index);
            let last = span.last().copied().unwrap_or(noun.index);

            facts.push(Fact::DateRelease {
                subject_text: sentence.span_text(first, last).to_string(),
                verb: None,
                date_text: Some(year.as_str().to_string()),
            });
        }

        facts
    }

    fn verb_anchored(sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact> {
        let lexicon = &config.lexicon;
        let window = &config.detectors;
        let mut facts = Vec::new();

        for verb in sentence.tokens().iter().filter(|t| t.pos == "VERB") {
            if !lemma_in(verb, &lexicon.date_verbs) {
                continue;
            }
            let Some(subject) = sentence.children(verb.index).find(|c| c.dep.starts_with("nsubj")) else {
                continue;
            };
            if is_pronoun(lexicon, subject) {
                continue;
            }

            // Active clauses date their object: "X founded Y in 1995"
            let topic = sentence
                .child_with_dep(verb.index, &["dobj", "obj"])
                .unwrap_or(subject);
            if is_pronoun(lexicon, topic) {
                continue;
            }

            let v = verb.index;
            let near = sentence.entities_with_label("DATE").find(|e| {
                e.contains(v)
                    || (e.start > v && e.start - v <= window.date_window_after)
                    || (e.end <= v && v - (e.end - 1) <= window.date_window_before)
            });
            let has_time_modifier = sentence.child_with_dep(v, &["npadvmod", "tmod"]).is_some();

            let date_text = match near {
                Some(entity) => Some(entity.text.clone()),
                None if has_time_modifier => None,
                None => continue,
            };

            facts.push(Fact::DateRelease {
                subject_text: sentence.phrase_text(topic.index),
                verb: Some(v),
                date_text,
            });
        }

        facts
    }
}

impl Detector for ReleaseDate {
    fn name(&self) -> &'static str {
        "date_release"
    }

    fn detect(&self, sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact> {
        let mut facts = Self::parenthesized_years(sentence);
        facts.extend(Self::verb_anchored(sentence, config));
        facts
    }
}

/// Counted nouns: "nine sequels" and "there are nine sequels"
pub struct Quantity;

impl Quantity {
    fn simple(sentence: &AnnotatedSentence, lexicon: &LexiconConfig) -> Vec<Fact> {
        let mut facts = Vec::new();

        for number in sentence.tokens().iter().filter(|t| t.pos == "NUM") {
            let Some(noun) = sentence.token(number.index + 1) else {
                continue;
            };
            if noun.pos != "NOUN" || lexicon.generic_nouns.contains(&noun.lower()) {
                continue;
            }
            if number.head != noun.index || is_year_like(&number.text) {
                continue;
            }

            let noun_phrase = sentence.phrase_text(noun.index);
            if word_count(&noun_phrase) < 2 {
                continue;
            }

            facts.push(Fact::QuantitySimple {
                number: number.index,
                noun: noun.index,
                noun_phrase,
            });
        }

        facts
    }

    fn existential(sentence: &AnnotatedSentence, lexicon: &LexiconConfig) -> Vec<Fact> {
        let mut facts = Vec::new();

        for root in sentence.roots() {
            if root.lemma.to_lowercase() != lexicon.copula_lemma {
                continue;
            }
            let expletive = sentence
                .children(root.index)
                .any(|c| c.dep == "expl" && c.lower() == "there");
            if !expletive {
                continue;
            }

            let Some(subject) = sentence.child_with_dep(root.index, &["nsubj"]) else {
                continue;
            };
            if !matches!(subject.tag.as_str(), "NNS" | "NNPS")
                || lexicon.generic_nouns.contains(&subject.lower())
            {
                continue;
            }
            let Some(number) = sentence.child_with_dep(subject.index, &["nummod"]) else {
                continue;
            };
            if is_year_like(&number.text) {
                continue;
            }

            facts.push(Fact::QuantityExistential {
                number: number.index,
                noun: subject.index,
            });
        }

        facts
    }
}

impl Detector for Quantity {
    fn name(&self) -> &'static str {
        "quantity"
    }

    fn detect(&self, sentence: &AnnotatedSentence, config: &PipelineConfig) -> Vec<Fact> {
        let mut facts = Self::simple(sentence, &config.lexicon);
        facts.extend(Self::existential(sentence, &config.lexicon));
        facts
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Facts found in one sentence plus per-sentence diagnostics
#[derive(Debug, Default)]
pub struct Extraction<'s> {
    pub facts: Vec<FactCandidate<'s>>,

    /// Sentence failed the cleanliness check
    pub skipped_dirty: bool,

    /// Detectors that panicked on this sentence
    pub detector_errors: Vec<&'static str>,

    /// Date facts collapsed by (subject, date)
    pub duplicates_collapsed: usize,
}

/// Runs every registered detector over a sentence
pub struct PatternExtractor<'c> {
    config: &'c PipelineConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl<'c> PatternExtractor<'c> {
    /// Register the default detectors; the appositive detector only when enabled
    pub fn new(config: &'c PipelineConfig) -> Self {
        let mut detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(CopularDefinition),
            Box::new(SubjectVerbObject),
            Box::new(PassiveCreation),
            Box::new(PassiveOwnership),
            Box::new(ReleaseDate),
            Box::new(Quantity),
        ];
        if config.detectors.enable_appositive {
            detectors.push(Box::new(Appositive));
        }
        Self { config, detectors }
    }

    /// Add a custom detector
    pub fn with_detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detectors.push(detector);
        self
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Extract all facts from one sentence
    pub fn extract<'s>(&self, sentence: &'s AnnotatedSentence) -> Extraction<'s> {
        let mut extraction = Extraction::default();

        if text::is_dirty(sentence.text()) {
            debug!(sentence = sentence.text(), "Skipping dirty sentence");
            extraction.skipped_dirty = true;
            return extraction;
        }

        for detector in &self.detectors {
            match panic::catch_unwind(AssertUnwindSafe(|| detector.detect(sentence, self.config))) {
                Ok(facts) => extraction
                    .facts
                    .extend(facts.into_iter().map(|f| FactCandidate::new(sentence, f))),
                Err(payload) => {
                    warn!(
                        detector = detector.name(),
                        sentence = sentence.text(),
                        error = %panic_message(payload.as_ref()),
                        "Detector failed; continuing with remaining detectors"
                    );
                    extraction.detector_errors.push(detector.name());
                }
            }
        }

        extraction.duplicates_collapsed = Self::collapse_date_duplicates(&mut extraction.facts);
        extraction
    }

    /// The parenthesized-year and verb-anchored scans can report the same
    /// fact; keep the first per (subject, date).
    fn collapse_date_duplicates(facts: &mut Vec<FactCandidate<'_>>) -> usize {
        let before = facts.len();
        let mut seen = HashSet::new();

        facts.retain(|candidate| match &candidate.fact {
            Fact::DateRelease {
                subject_text,
                date_text: Some(date),
                ..
            } => seen.insert((text::normalize(subject_text), text::normalize(date))),
            _ => true,
        });

        before - facts.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
