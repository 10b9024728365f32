//! CoNLL-U reader
//!
//! Reads pre-annotated sentences in CoNLL-U format. Each block must carry a
//! `# text = ...` comment. Columns are ID, FORM, LEMMA, UPOS, XPOS, FEATS,
//! HEAD, DEPREL, DEPS and MISC; named entities come from `NER=B-X` / `I-X`
//! BIO tags in MISC. Multi-word token ranges (`1-2`) and empty nodes (`1.1`)
//! are skipped.
//!
//! Columns may be separated by tabs or runs of spaces, which keeps fixtures
//! readable.

use crate::annotation::{EntityInput, GramNumber, Morph, SentenceInput, Tense, TokenInput};
use crate::{AnnotatedSentence, QaError, Result};

const COLUMNS: usize = 10;

/// Parse every sentence block in a CoNLL-U document
pub fn parse_document(input: &str) -> Result<Vec<AnnotatedSentence>> {
    let mut sentences = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::new();

    for (number, line) in input.lines().enumerate() {
        if line.trim().is_empty() {
            if !block.is_empty() {
                sentences.push(parse_block(&block)?);
                block.clear();
            }
        } else {
            block.push((number + 1, line));
        }
    }
    if !block.is_empty() {
        sentences.push(parse_block(&block)?);
    }

    Ok(sentences)
}

/// Parse a single sentence block
pub fn parse_sentence(input: &str) -> Result<AnnotatedSentence> {
    let mut sentences = parse_document(input)?;
    match sentences.len() {
        1 => Ok(sentences.remove(0)),
        n => Err(QaError::Conllu {
            line: 1,
            message: format!("expected exactly one sentence, found {}", n),
        }),
    }
}

fn parse_block(lines: &[(usize, &str)]) -> Result<AnnotatedSentence> {
    let first_line = lines.first().map(|(n, _)| *n).unwrap_or(1);
    let mut text: Option<String> = None;
    let mut tokens = Vec::new();
    let mut ner_tags: Vec<Option<(bool, String)>> = Vec::new();

    for &(number, line) in lines {
        if let Some(comment) = line.strip_prefix('#') {
            if let Some(value) = comment.trim_start().strip_prefix("text =") {
                text = Some(value.trim().to_string());
            }
            continue;
        }

        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() != COLUMNS {
            return Err(QaError::Conllu {
                line: number,
                message: format!("expected {} columns, found {}", COLUMNS, columns.len()),
            });
        }

        let id = columns[0];
        if id.contains('-') || id.contains('.') {
            continue;
        }
        let id: usize = id.parse().map_err(|_| QaError::Conllu {
            line: number,
            message: format!("invalid token id {:?}", id),
        })?;
        if id != tokens.len() + 1 {
            return Err(QaError::Conllu {
                line: number,
                message: format!("token id {} is not contiguous", id),
            });
        }

        let head: usize = columns[6].parse().map_err(|_| QaError::Conllu {
            line: number,
            message: format!("invalid head {:?}", columns[6]),
        })?;
        let dep = normalize_deprel(columns[7]);
        // HEAD 0 marks the root, which heads itself in the sentence model
        let head = if head == 0 { id - 1 } else { head - 1 };

        tokens.push(TokenInput {
            text: columns[1].to_string(),
            lemma: columns[2].to_string(),
            pos: columns[3].to_string(),
            tag: placeholder(columns[4]),
            dep,
            head,
            morph: parse_feats(columns[5]),
            start: None,
        });
        ner_tags.push(parse_ner(columns[9]));
    }

    let text = text.ok_or_else(|| QaError::Conllu {
        line: first_line,
        message: "missing `# text =` comment".to_string(),
    })?;

    AnnotatedSentence::from_input(SentenceInput {
        text,
        tokens,
        entities: collect_entities(&ner_tags),
    })
}

fn placeholder(column: &str) -> String {
    if column == "_" {
        String::new()
    } else {
        column.to_string()
    }
}

/// Map Universal Dependencies relations onto the labels the detectors use
fn normalize_deprel(deprel: &str) -> String {
    match deprel {
        "root" => "ROOT".to_string(),
        "nsubj:pass" => "nsubjpass".to_string(),
        "aux:pass" => "auxpass".to_string(),
        "obj" => "dobj".to_string(),
        other => other.to_string(),
    }
}

fn parse_feats(feats: &str) -> Morph {
    let mut morph = Morph::default();
    for feature in feats.split('|') {
        match feature.split_once('=') {
            Some(("Tense", "Past")) => morph.tense = Some(Tense::Past),
            Some(("Tense", "Pres")) => morph.tense = Some(Tense::Pres),
            Some(("Tense", "Fut")) => morph.tense = Some(Tense::Fut),
            Some(("Number", "Sing")) => morph.number = Some(GramNumber::Sing),
            Some(("Number", "Plur")) => morph.number = Some(GramNumber::Plur),
            _ => {}
        }
    }
    morph
}

/// Returns (begins_entity, label) for a BIO tag in MISC
fn parse_ner(misc: &str) -> Option<(bool, String)> {
    misc.split('|')
        .find_map(|item| item.strip_prefix("NER="))
        .and_then(|tag| {
            if let Some(label) = tag.strip_prefix("B-") {
                Some((true, label.to_string()))
            } else {
                tag.strip_prefix("I-").map(|label| (false, label.to_string()))
            }
        })
}

fn collect_entities(tags: &[Option<(bool, String)>]) -> Vec<EntityInput> {
    let mut entities: Vec<EntityInput> = Vec::new();
    let mut open: Option<EntityInput> = None;

    for (index, tag) in tags.iter().enumerate() {
        match tag {
            Some((false, label)) if open.as_ref().is_some_and(|e| &e.label == label) => {
                if let Some(entity) = open.as_mut() {
                    entity.end = index + 1;
                }
            }
            Some((_, label)) => {
                entities.extend(open.take());
                open = Some(EntityInput {
                    label: label.clone(),
                    start: index,
                    end: index + 1,
                });
            }
            None => entities.extend(open.take()),
        }
    }
    entities.extend(open);
    entities
}

// ============================================================================
// Tests
// ============================================================================
