//! qasynth Configuration Management
//!
//! Every tunable of the pipeline (verb sets, blacklists, thresholds, limits,
//! ranking weights) lives here as data. Configuration loads from a TOML file,
//! environment variables, or both, and is passed explicitly to each component.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

fn words(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PipelineConfig {
    /// Word lists driving detection, realization and filtering
    pub lexicon: LexiconConfig,

    /// Question and answer length limits
    pub limits: LimitsConfig,

    /// Answer verification thresholds
    pub verify: VerifyConfig,

    /// Topic relevance scoring
    pub topics: TopicConfig,

    /// Pattern detector switches
    pub detectors: DetectorConfig,

    /// Template realizer settings
    pub realizer: RealizerConfig,

    /// Deduplication and ranking
    pub ranking: RankingConfig,

    /// Annotation cache sizing
    pub annotation: AnnotationConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables over defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file; missing sections fall back to defaults
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        if let Ok(value) = std::env::var("QASYNTH_TARGET_COUNT") {
            self.ranking.default_target = parse_env("QASYNTH_TARGET_COUNT", &value)?;
        }
        if let Ok(value) = std::env::var("QASYNTH_ENABLE_APPOSITIVE") {
            self.detectors.enable_appositive = parse_bool("QASYNTH_ENABLE_APPOSITIVE", &value)?;
        }
        if let Ok(level) = std::env::var("QASYNTH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(value) = std::env::var("QASYNTH_LOG_JSON") {
            self.logging.json_format = parse_bool("QASYNTH_LOG_JSON", &value)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Check ranges and thresholds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranking.default_target == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ranking.default_target".to_string(),
                value: "0".to_string(),
            });
        }

        let mut ranges = vec![
            ("limits.question_words".to_string(), self.limits.question_words),
            (
                "limits.default_answer_words".to_string(),
                self.limits.default_answer_words,
            ),
        ];
        for (key, range) in &self.limits.answer_words {
            ranges.push((format!("limits.answer_words.{}", key), *range));
        }
        for (key, range) in ranges {
            if range.min > range.max {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: format!("{}..={}", range.min, range.max),
                });
            }
        }

        let thresholds = [
            ("verify.single_word_overlap", self.verify.single_word_overlap),
            ("verify.short_answer_overlap", self.verify.short_answer_overlap),
            ("verify.long_answer_overlap", self.verify.long_answer_overlap),
        ];
        for (key, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Word lists used across the pipeline. All entries are lowercase.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    /// Lemma of the copular verb
    pub copula_lemma: String,

    /// Pronouns that cannot stand as a fact's subject or object
    pub bare_pronouns: BTreeSet<String>,

    /// Root verbs accepted by the subject-verb-object detector
    pub svo_verbs: BTreeSet<String>,

    /// SVO verbs realized with the "creation" template
    pub creation_verbs: BTreeSet<String>,

    /// SVO verbs realized with the "founding" template
    pub founding_verbs: BTreeSet<String>,

    /// SVO verbs realized with the "sale" template
    pub sale_verbs: BTreeSet<String>,

    /// Passive verb lemma -> past-tense verb used in "Who {verb} X?"
    pub passive_question_verbs: BTreeMap<String, String>,

    /// Passive verb lemma -> participle used in "X was {participle} by Y."
    pub passive_participles: BTreeMap<String, String>,

    /// Verbs accepted by the passive ownership detector
    pub ownership_verbs: BTreeSet<String>,

    /// Verbs that anchor a release/creation date
    pub date_verbs: BTreeSet<String>,

    /// Date verbs realized as "When was X created?"
    pub date_creation_verbs: BTreeSet<String>,

    /// Date verbs realized as "When was X founded?"
    pub date_founding_verbs: BTreeSet<String>,

    /// Nouns too generic to count
    pub generic_nouns: BTreeSet<String>,

    /// Nouns that disqualify a question
    pub question_generic_nouns: BTreeSet<String>,

    /// Low-information verbs that disqualify SVO-derived questions
    pub low_info_verbs: BTreeSet<String>,

    /// Pronouns that make a question referent vague
    pub vague_pronouns: BTreeSet<String>,

    /// Question openers that invite a yes/no answer
    pub yes_no_openers: BTreeSet<String>,

    /// Articles stripped from counted noun phrases
    pub articles: BTreeSet<String>,

    /// Cardinal and ordinal words stripped from counted noun phrases
    pub number_words: BTreeSet<String>,

    /// Function words ignored by lemma-overlap verification
    pub stop_words: BTreeSet<String>,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            copula_lemma: "be".to_string(),
            bare_pronouns: words(&["it", "they", "this", "that", "these", "those", "he", "she"]),
            svo_verbs: words(&[
                "create", "make", "develop", "design", "invent", "conceive", "originate", "write",
                "direct", "produce", "found", "establish", "start", "form", "institute", "begin",
                "launch", "sell", "buy", "acquire",
            ]),
            creation_verbs: words(&[
                "create", "make", "develop", "design", "invent", "conceive", "originate",
            ]),
            founding_verbs: words(&["found", "establish", "start", "form", "institute"]),
            sale_verbs: words(&["sell"]),
            passive_question_verbs: [
                ("create", "created"),
                ("make", "created"),
                ("develop", "created"),
                ("write", "wrote"),
                ("direct", "directed"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            passive_participles: [
                ("create", "created"),
                ("make", "created"),
                ("develop", "created"),
                ("write", "written"),
                ("direct", "directed"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            ownership_verbs: words(&[
                "own", "control", "manage", "publish", "distribute", "sell", "buy", "acquire",
            ]),
            date_verbs: words(&[
                "release", "launch", "publish", "found", "create", "debut", "start", "begin",
                "premiere", "open", "air", "broadcast", "introduce", "come", "appear", "issue",
                "present", "screen", "roll", "reissue", "relaunch", "drop", "announce", "unveil",
                "establish", "inaugurate", "commission", "originate", "follow", "precede",
                "succeed",
            ]),
            date_creation_verbs: words(&["create", "make", "write"]),
            date_founding_verbs: words(&["found", "establish", "institute", "inaugurate"]),
            generic_nouns: words(&[
                "item", "items", "thing", "things", "object", "objects", "entity", "entities",
                "element", "elements", "piece", "pieces", "part", "parts", "unit", "units",
                "section", "sections", "component", "components", "entry", "entries",
            ]),
            question_generic_nouns: words(&[
                "item", "items", "thing", "things", "object", "objects", "publication",
                "publications", "entry", "entries", "element", "elements", "entity", "entities",
                "piece", "pieces", "part", "parts", "unit", "units", "section", "sections",
                "component", "components",
            ]),
            low_info_verbs: words(&[
                "strike", "strikes", "struck", "striking", "return", "returns", "returned",
                "returning", "include", "includes", "included", "including", "contain",
                "contains", "contained", "containing",
            ]),
            vague_pronouns: words(&[
                "it", "its", "they", "them", "their", "this", "that", "these", "those", "he",
                "him", "his", "she", "her", "hers",
            ]),
            yes_no_openers: words(&[
                "is", "are", "was", "were", "do", "does", "did", "can", "could", "will", "would",
            ]),
            articles: words(&["the", "a", "an"]),
            number_words: words(&[
                "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
                "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen",
                "eighteen", "nineteen", "twenty", "thirty", "forty", "fifty", "sixty", "seventy",
                "eighty", "ninety", "hundred", "thousand", "million", "billion", "dozen", "first",
                "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
                "tenth",
            ]),
            stop_words: words(&[
                "a", "about", "above", "after", "again", "against", "all", "also", "am", "an",
                "and", "any", "are", "as", "at", "be", "because", "been", "before", "being",
                "below", "between", "both", "but", "by", "can", "could", "did", "do", "does",
                "doing", "down", "during", "each", "either", "few", "for", "from", "further",
                "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
                "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself",
                "just", "me", "might", "more", "most", "must", "my", "myself", "neither", "no",
                "nor", "not", "now", "of", "off", "on", "once", "only", "or", "other", "our",
                "ours", "ourselves", "out", "over", "own", "same", "she", "should", "so", "some",
                "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
                "there", "these", "they", "this", "those", "through", "to", "too", "under",
                "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
                "while", "who", "whom", "whose", "why", "will", "with", "would", "yet", "you",
                "your", "yours", "yourself", "yourselves",
            ]),
        }
    }
}

impl LexiconConfig {
    /// True if the word (any case) is a bare pronoun
    pub fn is_bare_pronoun(&self, word: &str) -> bool {
        self.bare_pronouns.contains(&word.to_lowercase())
    }
}

/// Inclusive word-count range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRange {
    pub min: usize,
    pub max: usize,
}

impl WordRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        self.min <= count && count <= self.max
    }
}

/// Question and answer length limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Question word count bounds
    pub question_words: WordRange,

    /// Answer word count bounds for question types without an entry
    pub default_answer_words: WordRange,

    /// Answer word count bounds keyed by question type
    pub answer_words: BTreeMap<String, WordRange>,

    /// Bare integer answers below this value are treated as citation noise
    pub small_number_ceiling: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let answer_words = [
            ("what", WordRange::new(2, 40)),
            ("who", WordRange::new(1, 12)),
            ("when", WordRange::new(1, 8)),
            ("where", WordRange::new(2, 14)),
            ("how_many", WordRange::new(1, 3)),
            ("ownership", WordRange::new(1, 8)),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect();

        Self {
            question_words: WordRange::new(3, 24),
            default_answer_words: WordRange::new(1, 25),
            answer_words,
            small_number_ceiling: 100,
        }
    }
}

impl LimitsConfig {
    /// Answer bounds for a question type
    pub fn answer_range(&self, question_type: &str) -> WordRange {
        self.answer_words
            .get(question_type)
            .copied()
            .unwrap_or(self.default_answer_words)
    }
}

/// Lemma-overlap thresholds, scaled by answer length
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Answers with a single content lemma
    pub single_word_overlap: f64,

    /// Answers with at most `short_answer_max_lemmas` content lemmas
    pub short_answer_overlap: f64,

    pub short_answer_max_lemmas: usize,

    /// Longer answers
    pub long_answer_overlap: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            single_word_overlap: 0.95,
            short_answer_overlap: 0.85,
            short_answer_max_lemmas: 3,
            long_answer_overlap: 0.75,
        }
    }
}

impl VerifyConfig {
    /// Required overlap for an answer with `lemma_count` content lemmas
    pub fn threshold(&self, lemma_count: usize) -> f64 {
        if lemma_count <= 1 {
            self.single_word_overlap
        } else if lemma_count <= self.short_answer_max_lemmas {
            self.short_answer_overlap
        } else {
            self.long_answer_overlap
        }
    }
}

/// Topic relevance scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Score contributed by a literal topic match
    pub exact_weight: f64,

    /// Score contributed by a generated alias match
    pub alias_weight: f64,

    /// Minimum score for a sentence to be relevant
    pub relevance_threshold: f64,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            exact_weight: 1.0,
            alias_weight: 0.5,
            relevance_threshold: 0.5,
        }
    }
}

/// Pattern detector switches
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Appositive detection is off by default: too many false positives
    pub enable_appositive: bool,

    /// Maximum tokens in an appositive description when enabled
    pub appositive_max_tokens: usize,

    /// Tokens a DATE entity may start after its verb
    pub date_window_after: usize,

    /// Tokens a DATE entity may end before its verb
    pub date_window_before: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            enable_appositive: false,
            appositive_max_tokens: 6,
            date_window_after: 6,
            date_window_before: 3,
        }
    }
}

/// Template realizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealizerConfig {
    /// Answers longer than this many words get relative clauses stripped
    pub clause_strip_min_words: usize,

    /// Upper bound on clause stripping passes
    pub max_strip_passes: usize,

    /// Minimum characters in a cleaned counted noun
    pub min_noun_chars: usize,
}

impl Default for RealizerConfig {
    fn default() -> Self {
        Self {
            clause_strip_min_words: 15,
            max_strip_passes: 5,
            min_noun_chars: 3,
        }
    }
}

/// Deduplication and ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Output size when the caller does not give one
    pub default_target: usize,

    /// Score per literal answer occurrence in the evidence
    pub presence_weight: f64,

    /// Evidence characters per point of length penalty
    pub length_divisor: f64,

    /// Rejected candidates kept for diagnostics
    pub rejected_sample_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            default_target: 25,
            presence_weight: 10.0,
            length_divisor: 100.0,
            rejected_sample_limit: 50,
        }
    }
}

/// Annotation cache sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Maximum cached annotations
    pub cache_capacity: u64,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 2048,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
