//! Text helpers shared by detectors, realizer, filter and ranker

use once_cell::sync::Lazy;
use regex::Regex;

use qasynth_core::{LexiconConfig, RealizerConfig};

// Bracketed citation markers, raw URLs, page counters like "12/340"
static DIRTY_SENTENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*\[|https?://|www\.|\b\d{1,3}/\d{1,3}\b").expect("valid regex")
});

static RELATIVE_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ["which", "that", "who", "where", "when"]
        .iter()
        .map(|marker| Regex::new(&format!(r"(?i),?\s+{}\s+", marker)).expect("valid regex"))
        .collect()
});

static PAREN_YEAR_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\((\d{4})\)$").expect("valid regex"));

/// Lowercase and collapse runs of whitespace
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// True for sentences carrying citation markers, URLs or page-number artifacts
pub fn is_dirty(text: &str) -> bool {
    if DIRTY_SENTENCE.is_match(text) {
        return true;
    }
    text.chars().filter(|c| *c == '[' || *c == ']').count() >= 2
}

/// Four-digit number in 1900..=2099
pub fn is_year_like(text: &str) -> bool {
    text.len() == 4
        && text.chars().all(|c| c.is_ascii_digit())
        && text
            .parse::<u32>()
            .map(|year| (1900..=2099).contains(&year))
            .unwrap_or(false)
}

/// Non-overlapping occurrences of `needle` in `haystack`
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        0
    } else {
        haystack.matches(needle).count()
    }
}

/// True if `word` appears as a whole alphanumeric word in `text`
pub fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|w| w.eq_ignore_ascii_case(word))
}

// ============================================================================
// Answer Cleaning
// ============================================================================

/// Remove relative clauses (", which ...", " that ...") up to the next comma
/// or period. Bounded by `max_passes` so malformed input cannot loop.
pub fn strip_relative_clauses(text: &str, max_passes: usize) -> String {
    let mut current = text.trim().to_string();

    for _ in 0..max_passes {
        let Some(found) = RELATIVE_MARKERS.iter().find_map(|re| re.find(&current)) else {
            break;
        };
        let rest = &current[found.end()..];
        let clause_end = found.end() + rest.find(|c: char| c == ',' || c == '.').unwrap_or(rest.len());
        current = format!("{}{}", &current[..found.start()], &current[clause_end..]);
    }

    current.trim().to_string()
}

/// Clean a short answer: strip relative clauses from long answers, trim
/// trailing commas/semicolons and unwrap a bare "(1998)" to "1998".
pub fn clean_answer(text: &str, config: &RealizerConfig) -> String {
    let mut cleaned = text.trim().to_string();
    if word_count(&cleaned) > config.clause_strip_min_words {
        cleaned = strip_relative_clauses(&cleaned, config.max_strip_passes);
    }

    let trimmed = cleaned.trim_end_matches(|c: char| c == ',' || c == ';' || c.is_whitespace());
    match PAREN_YEAR_ONLY.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.trim().to_string(),
    }
}

// ============================================================================
// Counted Nouns
// ============================================================================

/// Simple English pluralization; nouns already ending in "s" and anything
/// containing "series" are left alone.
pub fn pluralize(noun: &str) -> String {
    if noun.ends_with('s') || noun.contains("series") {
        return noun.to_string();
    }

    if let Some(stem) = noun.strip_suffix('y') {
        let after_vowel = stem
            .chars()
            .last()
            .map_or(true, |c| "aeiouAEIOU".contains(c));
        if !after_vowel {
            return format!("{}ies", stem);
        }
    }

    if noun.ends_with('x') || noun.ends_with('z') || noun.ends_with("ch") || noun.ends_with("sh") {
        format!("{}es", noun)
    } else {
        format!("{}s", noun)
    }
}

/// Normalize a counted noun phrase for "How many ...?" questions.
///
/// Strips trailing punctuation, embedded years, the counted number itself,
/// and leading articles and number/ordinal words, then pluralizes. Returns
/// `None` when fewer than `min_chars` characters survive.
pub fn clean_count_noun(
    phrase: &str,
    number_text: &str,
    lexicon: &LexiconConfig,
    min_chars: usize,
) -> Option<String> {
    let stripped = phrase.trim_end_matches(|c: char| ",;:.!?".contains(c) || c.is_whitespace());

    let mut words: Vec<&str> = stripped
        .split_whitespace()
        .filter(|w| !(w.len() == 4 && w.chars().all(|c| c.is_ascii_digit())))
        .filter(|w| !w.eq_ignore_ascii_case(number_text))
        .collect();

    let leading = words
        .iter()
        .take_while(|w| {
            let lower = w.to_lowercase();
            lexicon.articles.contains(&lower)
                || lexicon.number_words.contains(&lower)
                || lower.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.')
        })
        .count();
    words.drain(..leading);

    let noun = words.join(" ");
    if noun.chars().count() < min_chars {
        return None;
    }
    Some(pluralize(&noun))
}

// ============================================================================
// Tests
// ============================================================================
