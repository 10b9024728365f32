//! Quality Filter
//!
//! An ordered list of independent predicate checks, cheapest first. The
//! first failing check names the rejection. A check that errors or panics
//! rejects the candidate under `<check>_error` (fail closed).

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use qasynth_core::{Annotator, ExpectType, PipelineConfig, QaCandidate, QuestionType, Result};

use crate::panic_message;
use crate::text::{contains_word, normalize, word_count};

static BRACKETED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[\d+\]\s*$").expect("valid regex"));

static URL_CHUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://|www\.|\b\S+/wiki/\S+").expect("valid regex"));

static PAGE_COUNTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,3}/\d{1,3}\b").expect("valid regex"));

static DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,2}/\d{1,2}/\d{2,4}\b|\b\d{1,2}:\d{2}\b").expect("valid regex")
});

/// Outcome of filtering one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(String),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Rejection counters plus a bounded sample of rejected candidates.
///
/// Not shared across threads; parallel filtering keeps one per worker and
/// combines them with [`QualityStats::merge`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityStats {
    rejections: BTreeMap<String, usize>,
    samples: Vec<QaCandidate>,
    sample_limit: usize,
}

impl QualityStats {
    pub fn new(sample_limit: usize) -> Self {
        Self {
            rejections: BTreeMap::new(),
            samples: Vec::new(),
            sample_limit,
        }
    }

    /// Count a rejection and keep a sample while under the limit
    pub fn record_rejection(&mut self, qa: &QaCandidate, reason: &str) {
        *self.rejections.entry(reason.to_string()).or_default() += 1;
        if self.samples.len() < self.sample_limit {
            let mut sample = qa.clone();
            sample.rejected_by = Some(reason.to_string());
            self.samples.push(sample);
        }
    }

    /// Count a check that failed to evaluate
    pub fn record_error(&mut self, check: &str) {
        *self.rejections.entry(format!("{}_error", check)).or_default() += 1;
    }

    pub fn rejections(&self) -> &BTreeMap<String, usize> {
        &self.rejections
    }

    pub fn samples(&self) -> &[QaCandidate] {
        &self.samples
    }

    pub fn total_rejected(&self) -> usize {
        self.rejections.values().sum()
    }

    /// Fold another accumulator into this one
    pub fn merge(&mut self, other: QualityStats) {
        for (reason, count) in other.rejections {
            *self.rejections.entry(reason).or_default() += count;
        }
        let room = self.sample_limit.saturating_sub(self.samples.len());
        self.samples.extend(other.samples.into_iter().take(room));
    }
}

// ============================================================================
// Checks
// ============================================================================

/// Quality checks, cheapest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    NotEmpty,
    Length,
    YesNo,
    NotCitation,
    NotMetadata,
    NotGenericNoun,
    AnswerNotNumberOnly,
    SvoVerbQuality,
    VagueReferent,
    MultiFact,
    Verifiable,
}

/// Checks in evaluation order
const CHECKS: [Check; 11] = [
    Check::NotEmpty,
    Check::Length,
    Check::YesNo,
    Check::NotCitation,
    Check::NotMetadata,
    Check::NotGenericNoun,
    Check::AnswerNotNumberOnly,
    Check::SvoVerbQuality,
    Check::VagueReferent,
    Check::MultiFact,
    Check::Verifiable,
];

impl Check {
    fn name(self) -> &'static str {
        match self {
            Self::NotEmpty => "not_empty",
            Self::Length => "length",
            Self::YesNo => "yes_no",
            Self::NotCitation => "not_citation",
            Self::NotMetadata => "not_metadata",
            Self::NotGenericNoun => "not_generic_noun",
            Self::AnswerNotNumberOnly => "answer_not_number_only",
            Self::SvoVerbQuality => "svo_verb_quality",
            Self::VagueReferent => "vague_referent",
            Self::MultiFact => "multi_fact",
            Self::Verifiable => "verifiable",
        }
    }
}

/// Fact types derived from subject-verb-object facts
const SVO_FACT_TYPES: &[&str] = &["svo", "creation", "founding", "sale"];

fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

/// Ordered quality checks over realized candidates
pub struct QualityFilter<'a> {
    config: &'a PipelineConfig,
    annotator: &'a dyn Annotator,
}

impl<'a> QualityFilter<'a> {
    pub fn new(config: &'a PipelineConfig, annotator: &'a dyn Annotator) -> Self {
        Self { config, annotator }
    }

    /// Names of the checks, in evaluation order
    pub fn check_names() -> Vec<&'static str> {
        CHECKS.iter().map(|c| c.name()).collect()
    }

    /// Run a single named check in isolation
    pub fn run_check(&self, name: &str, qa: &QaCandidate) -> Option<Result<bool>> {
        CHECKS
            .iter()
            .find(|c| c.name() == name)
            .map(|c| self.run(*c, qa))
    }

    /// Evaluate all checks, stopping at the first failure. Rejected
    /// candidates are tagged with the reason.
    pub fn evaluate(&self, qa: &mut QaCandidate, stats: &mut QualityStats) -> Verdict {
        for check in CHECKS {
            let name = check.name();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(check, qa)));
            let failure = match outcome {
                Ok(Ok(true)) => continue,
                Ok(Ok(false)) => {
                    stats.record_rejection(qa, name);
                    qa.rejected_by = Some(name.to_string());
                    return Verdict::Rejected(name.to_string());
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };

            warn!(check = name, question = %qa.question, error = %failure, "Quality check failed to evaluate");
            let reason = format!("{}_error", name);
            stats.record_error(name);
            qa.rejected_by = Some(reason.clone());
            return Verdict::Rejected(reason);
        }

        Verdict::Accepted
    }

    fn run(&self, check: Check, qa: &QaCandidate) -> Result<bool> {
        match check {
            Check::NotEmpty => self.not_empty(qa),
            Check::Length => self.length(qa),
            Check::YesNo => self.not_yes_no(qa),
            Check::NotCitation => self.not_citation(qa),
            Check::NotMetadata => self.not_metadata(qa),
            Check::NotGenericNoun => self.not_generic_noun(qa),
            Check::AnswerNotNumberOnly => self.answer_not_number_only(qa),
            Check::SvoVerbQuality => self.svo_verb_quality(qa),
            Check::VagueReferent => self.vague_referent(qa),
            Check::MultiFact => self.multi_fact(qa),
            Check::Verifiable => self.verifiable(qa),
        }
    }

    fn not_empty(&self, qa: &QaCandidate) -> Result<bool> {
        Ok(qa.is_complete())
    }

    fn length(&self, qa: &QaCandidate) -> Result<bool> {
        let limits = &self.config.limits;
        let question_ok = limits.question_words.contains(word_count(&qa.question));
        let answer_ok = limits
            .answer_range(qa.question_type.as_str())
            .contains(word_count(&qa.answer_short));
        Ok(question_ok && answer_ok)
    }

    fn not_yes_no(&self, qa: &QaCandidate) -> Result<bool> {
        let first = qa
            .question
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase();
        Ok(!self.config.lexicon.yes_no_openers.contains(&first))
    }

    fn not_citation(&self, qa: &QaCandidate) -> Result<bool> {
        let answer = qa.answer_short.trim();
        let question = qa.question.trim();

        if BRACKETED_NUMBER.is_match(answer) || question.starts_with('[') || answer.starts_with('[') {
            return Ok(false);
        }

        if is_all_digits(answer) {
            if qa.expect_type.is_some() || qa.question_type == QuestionType::HowMany {
                return Ok(true);
            }
            // Overflowing values are large, not citation markers
            let small = answer
                .parse::<u64>()
                .map(|n| n < self.config.limits.small_number_ceiling)
                .unwrap_or(false);
            return Ok(!small);
        }

        Ok(true)
    }

    fn not_metadata(&self, qa: &QaCandidate) -> Result<bool> {
        let text = format!("{} {}", qa.evidence_span, qa.answer_short);
        if URL_CHUNK.is_match(&text) || PAGE_COUNTER.is_match(&text) {
            return Ok(false);
        }
        if qa.expect_type != Some(ExpectType::Date) && DATE_TIME.is_match(&text) {
            return Ok(false);
        }
        Ok(true)
    }

    fn not_generic_noun(&self, qa: &QaCandidate) -> Result<bool> {
        let question = qa.question.to_lowercase();
        Ok(!self
            .config
            .lexicon
            .question_generic_nouns
            .iter()
            .any(|noun| contains_word(&question, noun)))
    }

    fn answer_not_number_only(&self, qa: &QaCandidate) -> Result<bool> {
        if qa.expect_type.is_some() {
            return Ok(true);
        }
        Ok(!is_all_digits(qa.answer_short.trim()))
    }

    fn svo_verb_quality(&self, qa: &QaCandidate) -> Result<bool> {
        if !SVO_FACT_TYPES.contains(&qa.fact_type.as_str()) {
            return Ok(true);
        }
        let question = qa.question.to_lowercase();
        let low_info = &self.config.lexicon.low_info_verbs;
        let found = question
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| low_info.contains(word));
        Ok(!found)
    }

    fn vague_referent(&self, qa: &QaCandidate) -> Result<bool> {
        let pronouns = &self.config.lexicon.vague_pronouns;
        let question = qa.question.trim().to_lowercase();

        let first = question
            .split_whitespace()
            .next()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .unwrap_or_default();
        if pronouns.contains(first) {
            return Ok(false);
        }

        if !pronouns.iter().any(|p| contains_word(&question, p)) {
            return Ok(true);
        }

        // A pronoun is fine next to an anchoring mention of the subject
        let subject = qa.subject_surface.trim().to_lowercase();
        if !subject.is_empty() && question.contains(&subject) {
            return Ok(true);
        }
        Ok(qa
            .topic_aliases
            .iter()
            .map(|alias| alias.to_lowercase())
            .any(|alias| !alias.is_empty() && question.contains(&alias)))
    }

    fn multi_fact(&self, qa: &QaCandidate) -> Result<bool> {
        let parsed = self.annotator.annotate(&qa.question)?;
        Ok(parsed.root_count() <= 1)
    }

    fn verifiable(&self, qa: &QaCandidate) -> Result<bool> {
        let answer = normalize(&qa.answer_short);
        let evidence = normalize(&qa.evidence_span);
        if answer.is_empty() || evidence.is_empty() {
            return Ok(false);
        }
        if evidence.contains(&answer) {
            return Ok(true);
        }

        let answer_lemmas = self.content_lemmas(&qa.answer_short)?;
        if !answer_lemmas.is_empty() {
            let evidence_lemmas = self.content_lemmas(&qa.evidence_span)?;
            let shared = answer_lemmas.intersection(&evidence_lemmas).count();
            let overlap = shared as f64 / answer_lemmas.len() as f64;
            if overlap >= self.config.verify.threshold(answer_lemmas.len()) {
                return Ok(true);
            }
        }

        Ok(match qa.expect_type {
            Some(ExpectType::Date) => evidence.replace(',', "").contains(&answer.replace(',', "")),
            Some(ExpectType::Number) => {
                let strip = |s: &str| {
                    s.chars()
                        .filter(|c| *c != ',' && !c.is_whitespace())
                        .collect::<String>()
                };
                strip(&evidence).contains(&strip(&answer))
            }
            None => false,
        })
    }

    /// Lowercased lemmas of non-punctuation, non-stop-word tokens
    fn content_lemmas(&self, text: &str) -> Result<BTreeSet<String>> {
        let stop_words = &self.config.lexicon.stop_words;
        let parsed = self.annotator.annotate(text)?;
        Ok(parsed
            .tokens()
            .iter()
            .filter(|t| !t.is_punct() && !stop_words.contains(&t.lower()))
            .map(|t| t.lemma.to_lowercase())
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qasynth_core::conllu::parse_sentence;
    use qasynth_core::fixtures::FlatAnnotator;
    use qasynth_core::StaticAnnotator;

    const EVIDENCE: &str = "Ishihara founded Creatures, Inc. on 8 November 1995.";

    fn qa(question: &str, answer: &str) -> QaCandidate {
        QaCandidate {
            question: question.to_string(),
            answer_short: answer.to_string(),
            answer_sentence: format!("{} {}", answer, question),
            evidence_span: EVIDENCE.to_string(),
            question_type: QuestionType::Who,
            fact_type: "founding".to_string(),
            expect_type: None,
            subject_surface: "Creatures, Inc.".to_string(),
            topic_aliases: Vec::new(),
            rejected_by: None,
        }
    }

    fn verdict(candidate: &mut QaCandidate) -> Verdict {
        let config = PipelineConfig::default();
        let mut stats = QualityStats::new(10);
        QualityFilter::new(&config, &FlatAnnotator).evaluate(candidate, &mut stats)
    }

    fn rejected(reason: &str) -> Verdict {
        Verdict::Rejected(reason.to_string())
    }

    #[test]
    fn test_accepts_grounded_pair() {
        let mut candidate = qa("Who founded Creatures, Inc.?", "Ishihara");
        assert_eq!(verdict(&mut candidate), Verdict::Accepted);
        assert!(candidate.rejected_by.is_none());
    }

    #[test]
    fn test_pronoun_opener_rejected() {
        let mut candidate = qa("It was founded by whom?", "Ishihara");
        assert_eq!(verdict(&mut candidate), rejected("vague_referent"));
        assert_eq!(candidate.rejected_by.as_deref(), Some("vague_referent"));
    }

    #[test]
    fn test_pronoun_with_anchor_accepted() {
        let mut anchored = qa("Who founded its parent Creatures, Inc.?", "Ishihara");
        assert_eq!(verdict(&mut anchored), Verdict::Accepted);

        let mut unanchored = qa("Who founded its parent?", "Ishihara");
        assert_eq!(verdict(&mut unanchored), rejected("vague_referent"));
    }

    #[test]
    fn test_ordered_rejections() {
        assert_eq!(verdict(&mut qa("Who?", "Ishihara")), rejected("length"));
        assert_eq!(
            verdict(&mut qa("Is Ishihara a founder?", "Ishihara")),
            rejected("yes_no")
        );
        assert_eq!(
            verdict(&mut qa("Who founded Creatures, Inc.?", "[12]")),
            rejected("not_citation")
        );
        assert_eq!(
            verdict(&mut qa("Who founded Creatures, Inc.?", "42")),
            rejected("not_citation")
        );
        assert_eq!(
            verdict(&mut qa("Who founded Creatures, Inc.?", "1995")),
            rejected("answer_not_number_only")
        );
        assert_eq!(
            verdict(&mut qa("Who included Creatures, Inc.?", "Ishihara")),
            rejected("svo_verb_quality")
        );
    }

    #[test]
    fn test_low_info_verbs_match_whole_words() {
        let config = PipelineConfig::default();
        let filter = QualityFilter::new(&config, &FlatAnnotator);

        let mut named = qa("Who founded Containers Ltd?", "Ishihara");
        named.evidence_span = "Ishihara founded Containers Ltd in 1995.".to_string();
        assert!(filter.run_check("svo_verb_quality", &named).unwrap().unwrap());

        let game = qa("Who created Returnal?", "Housemarque");
        assert!(filter.run_check("svo_verb_quality", &game).unwrap().unwrap());

        let struck = qa("Who struck Creatures, Inc.?", "Ishihara");
        assert!(!filter.run_check("svo_verb_quality", &struck).unwrap().unwrap());
        let contains = qa("Who contains Creatures, Inc.?", "Ishihara");
        assert!(!filter.run_check("svo_verb_quality", &contains).unwrap().unwrap());
    }

    #[test]
    fn test_metadata_and_generic_nouns() {
        let mut page = qa("Who founded Creatures, Inc.?", "Ishihara");
        page.evidence_span = "Ishihara founded Creatures, Inc. page 12/340".to_string();
        assert_eq!(verdict(&mut page), rejected("not_metadata"));

        let mut url = qa("Who founded Creatures, Inc.?", "Ishihara");
        url.evidence_span = "Ishihara founded Creatures, Inc. en.wikipedia.org/wiki/Creatures".to_string();
        assert_eq!(verdict(&mut url), rejected("not_metadata"));

        let mut stamped = qa("Who founded Creatures, Inc.?", "Ishihara");
        stamped.evidence_span = "Ishihara founded Creatures, Inc. on 8 November 1995 at 10:30.".to_string();
        assert_eq!(verdict(&mut stamped), rejected("not_metadata"));

        // Date answers may sit next to a timestamp
        let mut dated = qa("When was Creatures, Inc. founded?", "8 November 1995");
        dated.evidence_span = stamped.evidence_span.clone();
        dated.question_type = QuestionType::When;
        dated.expect_type = Some(ExpectType::Date);
        dated.fact_type = "date_release".to_string();
        let config = PipelineConfig::default();
        let filter = QualityFilter::new(&config, &FlatAnnotator);
        assert!(filter.run_check("not_metadata", &dated).unwrap().unwrap());

        let mut generic = qa("How many items are there?", "3");
        generic.question_type = QuestionType::HowMany;
        generic.expect_type = Some(ExpectType::Number);
        assert_eq!(verdict(&mut generic), rejected("not_generic_noun"));
    }

    #[test]
    fn test_lemma_overlap_verification() {
        // "creatures inc" is not a substring of "creatures, inc." but every
        // content lemma is present
        let mut candidate = qa("Who was founded by Ishihara?", "Creatures Inc");
        assert_eq!(verdict(&mut candidate), Verdict::Accepted);

        let mut unsupported = qa("Who founded Creatures, Inc.?", "Satoshi Tajiri");
        assert_eq!(verdict(&mut unsupported), rejected("verifiable"));
    }

    #[test]
    fn test_number_verification_ignores_separators() {
        let mut candidate = qa("How many copies sold?", "8,000");
        candidate.evidence_span = "The game sold 8000 copies.".to_string();
        candidate.question_type = QuestionType::HowMany;
        candidate.expect_type = Some(ExpectType::Number);
        candidate.fact_type = "quantity_simple".to_string();
        assert_eq!(verdict(&mut candidate), Verdict::Accepted);
    }

    #[test]
    fn test_multi_clause_question_rejected() {
        let question = parse_sentence(
            "\
# text = Who founded Creatures and who sold Nintendo?
1  Who        who        PRON   WP   _  2  nsubj  _  _
2  founded    found      VERB   VBD  _  0  root   _  _
3  Creatures  Creatures  PROPN  NNP  _  2  obj    _  _
4  and        and        CCONJ  CC   _  2  cc     _  _
5  who        who        PRON   WP   _  6  nsubj  _  _
6  sold       sell       VERB   VBD  _  0  root   _  _
7  Nintendo   Nintendo   PROPN  NNP  _  6  obj    _  _
8  ?          ?          PUNCT  .    _  6  punct  _  _
",
        )
        .unwrap();
        let annotator = StaticAnnotator::from_sentences(vec![question])
            .with_fallback(std::sync::Arc::new(FlatAnnotator));

        let config = PipelineConfig::default();
        let mut stats = QualityStats::new(10);
        let mut candidate = qa("Who founded Creatures and who sold Nintendo?", "Ishihara");
        let verdict = QualityFilter::new(&config, &annotator).evaluate(&mut candidate, &mut stats);

        assert_eq!(verdict, rejected("multi_fact"));
    }

    #[test]
    fn test_check_error_fails_closed() {
        let config = PipelineConfig::default();
        let annotator = StaticAnnotator::new();
        let mut stats = QualityStats::new(10);
        let mut candidate = qa("Who founded Creatures, Inc.?", "Ishihara");

        let verdict = QualityFilter::new(&config, &annotator).evaluate(&mut candidate, &mut stats);

        assert_eq!(verdict, rejected("multi_fact_error"));
        assert_eq!(stats.rejections().get("multi_fact_error"), Some(&1));
    }

    #[test]
    fn test_stats_samples_are_bounded() {
        let config = PipelineConfig::default();
        let filter = QualityFilter::new(&config, &FlatAnnotator);
        let mut stats = QualityStats::new(1);

        filter.evaluate(&mut qa("Who?", "Ishihara"), &mut stats);
        filter.evaluate(&mut qa("Is it?", "Ishihara"), &mut stats);

        assert_eq!(stats.total_rejected(), 2);
        assert_eq!(stats.samples().len(), 1);
        assert_eq!(stats.samples()[0].rejected_by.as_deref(), Some("length"));

        let mut merged = QualityStats::new(5);
        merged.merge(stats);
        assert_eq!(merged.rejections().get("length"), Some(&2));
    }

    #[test]
    fn test_checks_are_order_independent() {
        let config = PipelineConfig::default();
        let filter = QualityFilter::new(&config, &FlatAnnotator);
        let candidate = qa("Who founded Creatures, Inc.?", "Ishihara");

        for name in QualityFilter::check_names().into_iter().rev() {
            assert!(
                filter.run_check(name, &candidate).unwrap().unwrap(),
                "check {} rejected an accepted candidate",
                name
            );
        }
    }
}
