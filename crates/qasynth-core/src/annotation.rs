//! Annotated sentence model
//!
//! An `AnnotatedSentence` is the immutable output of an external annotator:
//! raw text, tokens (lemma, POS, dependency label and head) and named-entity
//! spans. Tokens carry byte offsets into the raw text, so any token range can
//! be rendered as the verbatim document span instead of re-joining token texts.

use serde::{Deserialize, Serialize};

use crate::{QaError, Result};

// ============================================================================
// Tokens and Entities
// ============================================================================

/// Grammatical tense reported by the annotator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tense {
    Past,
    Pres,
    Fut,
}

/// Grammatical number reported by the annotator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GramNumber {
    Sing,
    Plur,
}

/// Optional morphological features
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Morph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tense: Option<Tense>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<GramNumber>,
}

/// A single annotated token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Position in the sentence (0-based, contiguous)
    pub index: usize,
    /// Surface text
    pub text: String,
    /// Base form
    pub lemma: String,
    /// Coarse part-of-speech tag (NOUN, VERB, PROPN, NUM, ...)
    pub pos: String,
    /// Fine-grained tag (NNS, VBD, ...)
    #[serde(default)]
    pub tag: String,
    /// Dependency label
    pub dep: String,
    /// Index of the syntactic head; equal to `index` for the root
    pub head: usize,
    #[serde(default)]
    pub morph: Morph,
    /// Byte offset of the first character in the sentence text
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Token {
    /// Root tokens are labelled ROOT or head themselves
    pub fn is_root(&self) -> bool {
        self.head == self.index || self.dep.eq_ignore_ascii_case("root")
    }

    /// Lowercased surface text
    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }

    pub fn has_dep(&self, labels: &[&str]) -> bool {
        labels.iter().any(|l| self.dep == *l)
    }

    pub fn is_punct(&self) -> bool {
        self.pos == "PUNCT"
    }
}

/// A named-entity span over a token range `[start, end)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
    pub start: usize,
    pub end: usize,
}

impl EntitySpan {
    pub fn contains(&self, token: usize) -> bool {
        self.start <= token && token < self.end
    }
}

// ============================================================================
// Wire Format
// ============================================================================

/// Token as delivered by an annotator; offsets are optional and computed by
/// alignment when absent.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInput {
    pub text: String,
    pub lemma: String,
    pub pos: String,
    #[serde(default)]
    pub tag: String,
    pub dep: String,
    pub head: usize,
    #[serde(default)]
    pub morph: Morph,
    #[serde(default)]
    pub start: Option<usize>,
}

/// Entity span as delivered by an annotator
#[derive(Debug, Clone, Deserialize)]
pub struct EntityInput {
    pub label: String,
    pub start: usize,
    pub end: usize,
}

/// Unvalidated annotated sentence
#[derive(Debug, Clone, Deserialize)]
pub struct SentenceInput {
    pub text: String,
    pub tokens: Vec<TokenInput>,
    #[serde(default)]
    pub entities: Vec<EntityInput>,
}

// ============================================================================
// Annotated Sentence
// ============================================================================

/// Sentence text plus token-level linguistic annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SentenceInput")]
pub struct AnnotatedSentence {
    text: String,
    tokens: Vec<Token>,
    entities: Vec<EntitySpan>,
}

impl TryFrom<SentenceInput> for AnnotatedSentence {
    type Error = QaError;

    fn try_from(input: SentenceInput) -> Result<Self> {
        Self::from_input(input)
    }
}

impl AnnotatedSentence {
    /// Build a sentence from annotator output, aligning token offsets and
    /// validating heads and entity ranges.
    pub fn from_input(input: SentenceInput) -> Result<Self> {
        let SentenceInput {
            text,
            tokens: raw_tokens,
            entities: raw_entities,
        } = input;

        let count = raw_tokens.len();
        let mut tokens = Vec::with_capacity(count);
        let mut cursor = 0;

        for (index, raw) in raw_tokens.into_iter().enumerate() {
            if raw.head >= count {
                return Err(QaError::InvalidInput(format!(
                    "token {} ({:?}) has head {} outside sentence of {} tokens",
                    index, raw.text, raw.head, count
                )));
            }

            let start = match raw.start {
                // Explicit offsets must match the text and follow the previous token
                Some(start) => {
                    let aligned = start >= cursor
                        && start
                            .checked_add(raw.text.len())
                            .and_then(|end| text.get(start..end))
                            == Some(raw.text.as_str());
                    if !aligned {
                        return Err(QaError::Alignment {
                            token: raw.text,
                            offset: start,
                        });
                    }
                    start
                }
                None => {
                    let rest = text.get(cursor..).unwrap_or_default();
                    match rest.find(raw.text.as_str()) {
                        Some(pos) => cursor + pos,
                        None => {
                            return Err(QaError::Alignment {
                                token: raw.text,
                                offset: cursor,
                            })
                        }
                    }
                }
            };
            let end = start.checked_add(raw.text.len()).ok_or_else(|| QaError::Alignment {
                token: raw.text.clone(),
                offset: start,
            })?;
            cursor = end;

            tokens.push(Token {
                index,
                text: raw.text,
                lemma: raw.lemma,
                pos: raw.pos,
                tag: raw.tag,
                dep: raw.dep,
                head: raw.head,
                morph: raw.morph,
                start,
                end,
            });
        }

        let mut entities = Vec::with_capacity(raw_entities.len());
        for ent in raw_entities {
            if ent.start >= ent.end || ent.end > count {
                return Err(QaError::InvalidInput(format!(
                    "entity {} has invalid token range {}..{}",
                    ent.label, ent.start, ent.end
                )));
            }
            let span = text.get(tokens[ent.start].start..tokens[ent.end - 1].end);
            let Some(span) = span else {
                return Err(QaError::InvalidInput(format!(
                    "entity {} token range {}..{} does not map to sentence text",
                    ent.label, ent.start, ent.end
                )));
            };
            entities.push(EntitySpan {
                text: span.to_string(),
                label: ent.label,
                start: ent.start,
                end: ent.end,
            });
        }

        Ok(Self {
            text,
            tokens,
            entities,
        })
    }

    /// Raw sentence text
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn entities(&self) -> &[EntitySpan] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Lowercased token texts, used for phrase matching
    pub fn lower_tokens(&self) -> Vec<String> {
        self.tokens.iter().map(Token::lower).collect()
    }

    // ------------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------------

    /// All tokens whose head is `index` (excluding the token itself)
    pub fn children(&self, index: usize) -> impl Iterator<Item = &Token> + '_ {
        self.tokens
            .iter()
            .filter(move |t| t.head == index && t.index != index)
    }

    /// First child carrying one of the given dependency labels
    pub fn child_with_dep(&self, index: usize, labels: &[&str]) -> Option<&Token> {
        self.children(index).find(|c| c.has_dep(labels))
    }

    /// Root tokens of the sentence
    pub fn roots(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(|t| t.is_root())
    }

    /// Number of independent clauses, approximated by ROOT-level predicates
    pub fn root_count(&self) -> usize {
        self.roots().count()
    }

    /// True if walking up the head chain from `token` reaches `ancestor`
    pub fn is_descendant(&self, token: usize, ancestor: usize) -> bool {
        let mut current = token;
        // Bounded walk guards against malformed cyclic heads
        for _ in 0..=self.tokens.len() {
            if current == ancestor {
                return true;
            }
            let head = self.tokens[current].head;
            if head == current {
                return false;
            }
            current = head;
        }
        false
    }

    /// Indices of the subtree rooted at `index`, in sentence order
    pub fn subtree(&self, index: usize) -> Vec<usize> {
        (0..self.tokens.len())
            .filter(|&i| self.is_descendant(i, index))
            .collect()
    }

    /// Tokens coordinated with `index` through `conj` links (excluding itself)
    pub fn conjuncts(&self, index: usize) -> Vec<usize> {
        let mut first = index;
        for _ in 0..self.tokens.len() {
            let tok = &self.tokens[first];
            if tok.dep == "conj" && tok.head != first {
                first = tok.head;
            } else {
                break;
            }
        }

        let mut found = vec![first];
        let mut frontier = vec![first];
        while let Some(current) = frontier.pop() {
            for child in self.children(current).filter(|c| c.dep == "conj") {
                if !found.contains(&child.index) {
                    found.push(child.index);
                    frontier.push(child.index);
                }
            }
        }

        found.retain(|&i| i != index);
        found.sort_unstable();
        found
    }

    /// Verbatim text from the first to the last token (inclusive)
    pub fn span_text(&self, first: usize, last: usize) -> &str {
        let start = self.tokens[first].start;
        let end = self.tokens[last].end;
        &self.text[start..end]
    }

    /// Full phrase headed by `index`: its subtree plus the subtrees of any
    /// coordinated conjuncts, rendered as one contiguous document span.
    pub fn phrase_text(&self, index: usize) -> String {
        let mut indices = self.subtree(index);
        for conj in self.conjuncts(index) {
            indices.extend(self.subtree(conj));
        }
        self.render(indices).unwrap_or_else(|| self.tokens[index].text.clone())
    }

    /// Phrase headed by `index` without its coordinated conjuncts, used when
    /// conjoined entities are listed individually.
    pub fn phrase_text_single(&self, index: usize) -> String {
        let excluded: Vec<usize> = self
            .children(index)
            .filter(|c| c.has_dep(&["conj", "cc"]))
            .flat_map(|c| self.subtree(c.index))
            .collect();

        let mut indices: Vec<usize> = self
            .subtree(index)
            .into_iter()
            .filter(|i| !excluded.contains(i))
            .collect();

        while indices.len() > 1 {
            match indices.last() {
                Some(&last) if last != index && self.tokens[last].dep == "punct" => {
                    indices.pop();
                }
                _ => break,
            }
        }

        self.render(indices).unwrap_or_else(|| self.tokens[index].text.clone())
    }

    fn render(&self, mut indices: Vec<usize>) -> Option<String> {
        indices.sort_unstable();
        indices.dedup();
        let first = *indices.first()?;
        let last = *indices.last()?;
        Some(self.span_text(first, last).to_string())
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    /// Entity covering the given token, if any
    pub fn entity_at(&self, token: usize) -> Option<&EntitySpan> {
        self.entities.iter().find(|e| e.contains(token))
    }

    pub fn entities_with_label<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a EntitySpan> + 'a {
        self.entities.iter().filter(move |e| e.label == label)
    }

    /// Text of the first DATE entity
    pub fn first_date_text(&self) -> Option<&str> {
        self.entities_with_label("DATE")
            .next()
            .map(|e| e.text.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
