//! Deterministic annotator for tests
//!
//! `FlatAnnotator` splits on whitespace and peels trailing punctuation into
//! its own token. The first word is the single root and every other token
//! attaches to it, lemmas are lowercased surfaces. Good enough for clause
//! counting and lemma-overlap checks on generated questions and answers.

use crate::annotation::{Morph, SentenceInput, TokenInput};
use crate::{AnnotatedSentence, Annotator, Result};

/// Whitespace-splitting annotator with a flat dependency tree
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatAnnotator;

const TRAILING_PUNCT: &[char] = &['.', ',', '?', '!', ';', ':'];

impl Annotator for FlatAnnotator {
    fn annotate(&self, text: &str) -> Result<AnnotatedSentence> {
        let mut surfaces: Vec<String> = Vec::new();
        for word in text.split_whitespace() {
            let core = word.trim_end_matches(TRAILING_PUNCT);
            if core.is_empty() {
                surfaces.push(word.to_string());
                continue;
            }
            surfaces.push(core.to_string());
            for c in word[core.len()..].chars() {
                surfaces.push(c.to_string());
            }
        }

        let tokens = surfaces
            .into_iter()
            .enumerate()
            .map(|(i, surface)| {
                let is_punct = surface.chars().all(|c| TRAILING_PUNCT.contains(&c));
                TokenInput {
                    lemma: surface.to_lowercase(),
                    pos: if is_punct { "PUNCT" } else { "X" }.to_string(),
                    tag: String::new(),
                    dep: if i == 0 { "ROOT" } else if is_punct { "punct" } else { "dep" }.to_string(),
                    head: 0,
                    morph: Morph::default(),
                    start: None,
                    text: surface,
                }
            })
            .collect();

        AnnotatedSentence::from_input(SentenceInput {
            text: text.to_string(),
            tokens,
            entities: Vec::new(),
        })
    }
}
