//! Template Realizer
//!
//! Renders a fact candidate as a question, a short answer and a declarative
//! answer sentence. Facts that cannot be rendered cleanly come back as a
//! typed `RealizeFailure`; they are dropped by the pipeline and counted per
//! fact kind.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::error;

use qasynth_core::{
    AnnotatedSentence, ExpectType, GramNumber, PipelineConfig, QaCandidate, QuestionType, Tense,
    Token,
};

use crate::text::{clean_answer, clean_count_noun};
use crate::{panic_message, Fact, FactCandidate};

/// Why a fact could not be realized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RealizeFailure {
    #[error("no date text available")]
    MissingDate,

    #[error("noun phrase {0:?} is empty after cleaning")]
    EmptyNounPhrase(String),

    #[error("verb {0:?} has no question template")]
    UnsupportedVerb(String),

    #[error("realized {0} is empty")]
    EmptyField(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RealizeFailure {
    /// Stable reason key for statistics
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingDate => "missing_date",
            Self::EmptyNounPhrase(_) => "empty_noun_phrase",
            Self::UnsupportedVerb(_) => "unsupported_verb",
            Self::EmptyField(_) => "empty_field",
            Self::Internal(_) => "internal",
        }
    }
}

type Realized = std::result::Result<QaCandidate, RealizeFailure>;

/// Question/answer templates over fact candidates
pub struct TemplateRealizer<'c> {
    config: &'c PipelineConfig,
}

impl<'c> TemplateRealizer<'c> {
    pub fn new(config: &'c PipelineConfig) -> Self {
        Self { config }
    }

    /// Realize one fact. Never panics: unexpected failures become
    /// `RealizeFailure::Internal`.
    pub fn realize(&self, candidate: &FactCandidate<'_>) -> Realized {
        let qa = match panic::catch_unwind(AssertUnwindSafe(|| self.render(candidate))) {
            Ok(result) => result?,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    fact_kind = candidate.kind().as_str(),
                    error = %message,
                    "Realization failed unexpectedly"
                );
                return Err(RealizeFailure::Internal(message));
            }
        };

        if qa.question.trim().is_empty() {
            return Err(RealizeFailure::EmptyField("question"));
        }
        if qa.answer_short.trim().is_empty() {
            return Err(RealizeFailure::EmptyField("answer_short"));
        }
        if qa.answer_sentence.trim().is_empty() {
            return Err(RealizeFailure::EmptyField("answer_sentence"));
        }
        Ok(qa)
    }

    fn render(&self, candidate: &FactCandidate<'_>) -> Realized {
        let sentence = candidate.sentence;
        let realizer = &self.config.realizer;
        let lexicon = &self.config.lexicon;
        let evidence = candidate.evidence();

        match &candidate.fact {
            Fact::Definition {
                subject,
                subject_text,
                verb,
                attribute_text,
            } => {
                let be = be_form(token(sentence, *subject)?, token(sentence, *verb)?);
                let answer = clean_answer(attribute_text, realizer);
                Ok(QaDraft {
                    question: format!("What {} {}?", be, subject_text),
                    answer_sentence: format!("{} {} {}.", subject_text, be, answer),
                    answer_short: answer,
                    question_type: QuestionType::What,
                    fact_type: "definition",
                    expect_type: None,
                    subject_surface: subject_text.clone(),
                }
                .finish(evidence))
            }

            Fact::PassiveCreation {
                subject_text,
                verb,
                agent_text,
            } => {
                let verb = token(sentence, *verb)?;
                let lemma = verb.lemma.to_lowercase();
                let agent = clean_answer(agent_text, realizer);

                let question_verb = lexicon.passive_question_verbs.get(&lemma);
                let participle = lexicon.passive_participles.get(&lemma);
                let (question, answer_sentence) = match (question_verb, participle) {
                    (Some(q), Some(p)) => (
                        format!("Who {} {}?", q, subject_text),
                        format!("{} was {} by {}.", subject_text, p, agent),
                    ),
                    _ => (
                        format!("Who {} {}?", verb.text, subject_text),
                        format!("{} was {} by {}.", subject_text, verb.text, agent),
                    ),
                };

                Ok(QaDraft {
                    question,
                    answer_short: agent,
                    answer_sentence,
                    question_type: QuestionType::Who,
                    fact_type: "passive_creation",
                    expect_type: None,
                    subject_surface: subject_text.clone(),
                }
                .finish(evidence))
            }

            Fact::Svo {
                subject_text,
                verb,
                object_text,
            } => {
                let lemma = token(sentence, *verb)?.lemma.to_lowercase();
                let agent = clean_answer(subject_text, realizer);

                let (fact_type, question, answer_sentence) =
                    if lexicon.creation_verbs.contains(&lemma) {
                        (
                            "creation",
                            format!("Who created {}?", object_text),
                            format!("{} was created by {}.", object_text, agent),
                        )
                    } else if lexicon.founding_verbs.contains(&lemma) {
                        (
                            "founding",
                            format!("Who founded {}?", object_text),
                            format!("{} was founded by {}.", object_text, agent),
                        )
                    } else if lexicon.sale_verbs.contains(&lemma) {
                        (
                            "sale",
                            format!("Who sold {}?", object_text),
                            format!("{} sold {}.", agent, object_text),
                        )
                    } else {
                        return Err(RealizeFailure::UnsupportedVerb(lemma));
                    };

                Ok(QaDraft {
                    question,
                    answer_short: agent,
                    answer_sentence,
                    question_type: QuestionType::Who,
                    fact_type,
                    expect_type: None,
                    subject_surface: object_text.clone(),
                }
                .finish(evidence))
            }

            Fact::Ownership {
                subject_text,
                owner_text,
                ..
            } => {
                let owner = clean_answer(owner_text, realizer);
                Ok(QaDraft {
                    question: format!("Who owns {}?", subject_text),
                    answer_sentence: format!("{} is owned by {}.", subject_text, owner),
                    answer_short: owner,
                    question_type: QuestionType::Who,
                    fact_type: "ownership",
                    expect_type: None,
                    subject_surface: subject_text.clone(),
                }
                .finish(evidence))
            }

            Fact::Apposition {
                subject_text,
                description_text,
            } => {
                let description = clean_answer(description_text, realizer);
                Ok(QaDraft {
                    question: format!("Who is {}?", subject_text),
                    answer_sentence: format!("{} is {}.", subject_text, description),
                    answer_short: description,
                    question_type: QuestionType::Who,
                    fact_type: "apposition",
                    expect_type: None,
                    subject_surface: subject_text.clone(),
                }
                .finish(evidence))
            }

            Fact::DateRelease {
                subject_text,
                verb,
                date_text,
            } => {
                let verb = verb.map(|v| token(sentence, v)).transpose()?;
                let date = resolve_date(sentence, verb, date_text.as_deref())
                    .ok_or(RealizeFailure::MissingDate)?;

                let lemma = verb.map(|v| v.lemma.to_lowercase()).unwrap_or_default();
                let participle = if lexicon.date_creation_verbs.contains(&lemma) {
                    "created"
                } else if lexicon.date_founding_verbs.contains(&lemma) {
                    "founded"
                } else {
                    "released"
                };

                let answer = clean_answer(&date, realizer);
                Ok(QaDraft {
                    question: format!("When was {} {}?", subject_text, participle),
                    answer_sentence: format!("{} was {} in {}.", subject_text, participle, answer),
                    answer_short: answer,
                    question_type: QuestionType::When,
                    fact_type: "date_release",
                    expect_type: Some(ExpectType::Date),
                    subject_surface: subject_text.clone(),
                }
                .finish(evidence))
            }

            Fact::QuantitySimple {
                number,
                noun_phrase,
                ..
            } => {
                let number = token(sentence, *number)?.text.clone();
                let noun = clean_count_noun(noun_phrase, &number, lexicon, realizer.min_noun_chars)
                    .ok_or_else(|| RealizeFailure::EmptyNounPhrase(noun_phrase.clone()))?;

                Ok(QaDraft {
                    question: format!("How many {}?", noun),
                    answer_sentence: format!("{} {}.", number, noun),
                    answer_short: number,
                    question_type: QuestionType::HowMany,
                    fact_type: "quantity_simple",
                    expect_type: Some(ExpectType::Number),
                    subject_surface: noun,
                }
                .finish(evidence))
            }

            Fact::QuantityExistential { number, noun } => {
                let number = token(sentence, *number)?.text.clone();
                let phrase = sentence.phrase_text(token(sentence, *noun)?.index);
                let noun = clean_count_noun(&phrase, &number, lexicon, realizer.min_noun_chars)
                    .ok_or(RealizeFailure::EmptyNounPhrase(phrase))?;

                Ok(QaDraft {
                    question: format!("How many {} are there?", noun),
                    answer_sentence: format!("There are {} {}.", number, noun),
                    answer_short: number,
                    question_type: QuestionType::HowMany,
                    fact_type: "quantity_existential",
                    expect_type: Some(ExpectType::Number),
                    subject_surface: noun,
                }
                .finish(evidence))
            }
        }
    }
}

/// Fields that vary per template
struct QaDraft {
    question: String,
    answer_short: String,
    answer_sentence: String,
    question_type: QuestionType,
    fact_type: &'static str,
    expect_type: Option<ExpectType>,
    subject_surface: String,
}

impl QaDraft {
    fn finish(self, evidence: &str) -> QaCandidate {
        QaCandidate {
            question: self.question,
            answer_short: self.answer_short,
            answer_sentence: self.answer_sentence,
            evidence_span: evidence.to_string(),
            question_type: self.question_type,
            fact_type: self.fact_type.to_string(),
            expect_type: self.expect_type,
            subject_surface: self.subject_surface,
            topic_aliases: Vec::new(),
            rejected_by: None,
        }
    }
}

fn token(sentence: &AnnotatedSentence, index: usize) -> std::result::Result<&Token, RealizeFailure> {
    sentence.token(index).ok_or_else(|| {
        RealizeFailure::Internal(format!(
            "token {} outside sentence of {} tokens",
            index,
            sentence.len()
        ))
    })
}

/// Date text by priority: the fact's own date, the sentence's first DATE
/// entity, then a time-modifier on the verb.
fn resolve_date(
    sentence: &AnnotatedSentence,
    verb: Option<&Token>,
    date_text: Option<&str>,
) -> Option<String> {
    date_text
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .or_else(|| sentence.first_date_text().map(str::to_string))
        .or_else(|| {
            verb.and_then(|v| sentence.child_with_dep(v.index, &["npadvmod", "tmod"]))
                .map(|t| t.text.clone())
        })
}

/// Copula for "What {be} X?": the verb's own surface when it is already a
/// form of "be", otherwise from tense and number. Missing tense falls back
/// to the fine-grained tag, then to present.
fn be_form(subject: &Token, verb: &Token) -> &'static str {
    match verb.lower().as_str() {
        "is" => return "is",
        "are" => return "are",
        "was" => return "was",
        "were" => return "were",
        _ => {}
    }

    let past = match verb.morph.tense {
        Some(tense) => tense == Tense::Past,
        None => matches!(verb.tag.as_str(), "VBD" | "VBN"),
    };
    let plural = match subject.morph.number.or(verb.morph.number) {
        Some(number) => number == GramNumber::Plur,
        None => matches!(subject.tag.as_str(), "NNS" | "NNPS"),
    };

    match (past, plural) {
        (true, true) => "were",
        (true, false) => "was",
        (false, true) => "are",
        (false, false) => "is",
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::PatternExtractor;

    fn realize_all(config: &PipelineConfig, conllu: &str) -> Vec<QaCandidate> {
        let sentence = sentence(conllu);
        let realizer = TemplateRealizer::new(config);
        PatternExtractor::new(config)
            .extract(&sentence)
            .facts
            .iter()
            .filter_map(|f| realizer.realize(f).ok())
            .collect()
    }

    fn find<'a>(pairs: &'a [QaCandidate], question: &str) -> &'a QaCandidate {
        pairs
            .iter()
            .find(|qa| qa.question == question)
            .unwrap_or_else(|| panic!("no question {:?} in {:#?}", question, pairs))
    }

    #[test]
    fn test_founding_templates() {
        let config = PipelineConfig::default();
        let pairs = realize_all(&config, FOUNDING);

        let founding = find(&pairs, "Who founded Creatures, Inc.?");
        assert_eq!(founding.answer_short, "Ishihara");
        assert_eq!(founding.answer_sentence, "Creatures, Inc. was founded by Ishihara.");
        assert_eq!(founding.fact_type, "founding");
        assert_eq!(founding.subject_surface, "Creatures, Inc.");
        assert_eq!(
            founding.evidence_span,
            "Ishihara founded Creatures, Inc. on 8 November 1995."
        );

        let date = find(&pairs, "When was Creatures, Inc. founded?");
        assert_eq!(date.answer_short, "8 November 1995");
        assert_eq!(date.expect_type, Some(ExpectType::Date));
        assert_eq!(date.question_type, QuestionType::When);
    }

    #[test]
    fn test_definition_uses_copula_surface() {
        let config = PipelineConfig::default();
        let pairs = realize_all(&config, DEFINITION);

        let def = find(&pairs, "What is Pikachu?");
        assert_eq!(def.answer_short, "an electric-type Pokémon");
        assert_eq!(def.answer_sentence, "Pikachu is an electric-type Pokémon.");
    }

    #[test]
    fn test_passive_creation_template() {
        let config = PipelineConfig::default();
        let pairs = realize_all(&config, PASSIVE);

        let qa = find(&pairs, "Who created Pokémon Red?");
        assert_eq!(qa.answer_short, "Game Freak");
        assert_eq!(qa.answer_sentence, "Pokémon Red was created by Game Freak.");
    }

    #[test]
    fn test_passive_verb_variants() {
        let config = PipelineConfig::default();

        let written = realize_all(&config, WRITTEN);
        let qa = find(&written, "Who wrote The Hobbit?");
        assert_eq!(qa.answer_short, "Tolkien");
        assert_eq!(qa.answer_sentence, "The Hobbit was written by Tolkien.");

        let directed = realize_all(&config, DIRECTED);
        let qa = find(&directed, "Who directed Jaws?");
        assert_eq!(qa.answer_short, "Spielberg");
        assert_eq!(qa.answer_sentence, "Jaws was directed by Spielberg.");
    }

    #[test]
    fn test_verb_anchored_creation_date() {
        let config = PipelineConfig::default();
        let pairs = realize_all(&config, CREATED_IN_YEAR);

        let date = find(&pairs, "When was Pokémon created?");
        assert_eq!(date.answer_short, "1996");
        assert_eq!(date.answer_sentence, "Pokémon was created in 1996.");
        assert_eq!(date.expect_type, Some(ExpectType::Date));

        let creation = find(&pairs, "Who created Pokémon?");
        assert_eq!(creation.answer_short, "Tajiri");
        assert_eq!(creation.fact_type, "creation");
    }

    #[test]
    fn test_launch_is_not_a_founding() {
        let config = PipelineConfig::default();
        let sentence = sentence(LAUNCH);
        let realizer = TemplateRealizer::new(&config);

        let facts = PatternExtractor::new(&config).extract(&sentence).facts;
        let svo = facts
            .iter()
            .find(|f| matches!(f.fact, Fact::Svo { .. }))
            .expect("svo fact detected");
        assert_eq!(
            realizer.realize(svo),
            Err(RealizeFailure::UnsupportedVerb("launch".to_string()))
        );
        assert!(realize_all(&config, LAUNCH).is_empty());
    }

    #[test]
    fn test_detector_only_verbs_have_no_template() {
        let config = PipelineConfig::default();
        let sentence = sentence(WRITTEN);
        let candidate = FactCandidate::new(
            &sentence,
            Fact::Svo {
                subject_text: "Tolkien".to_string(),
                verb: 3,
                object_text: "The Hobbit".to_string(),
            },
        );
        assert_eq!(
            TemplateRealizer::new(&config).realize(&candidate),
            Err(RealizeFailure::UnsupportedVerb("write".to_string()))
        );
    }

    #[test]
    fn test_answer_cleaned_to_nothing_is_empty_field() {
        let config = PipelineConfig::default();
        let sentence = sentence(DEFINITION);
        let realizer = TemplateRealizer::new(&config);

        for attribute in [",", " ; ", ""] {
            let candidate = FactCandidate::new(
                &sentence,
                Fact::Definition {
                    subject: 0,
                    subject_text: "Pikachu".to_string(),
                    verb: 1,
                    attribute_text: attribute.to_string(),
                },
            );
            let failure = realizer.realize(&candidate).unwrap_err();
            assert_eq!(failure, RealizeFailure::EmptyField("answer_short"));
            assert_eq!(failure.reason(), "empty_field");
        }
    }

    #[test]
    fn test_long_definition_drops_relative_clause() {
        let config = PipelineConfig::default();
        let sentence = sentence(DEFINITION);
        let candidate = FactCandidate::new(
            &sentence,
            Fact::Definition {
                subject: 0,
                subject_text: "Pikachu".to_string(),
                verb: 1,
                attribute_text: "an electric-type Pokémon species, which was designed by Atsuko Nishida and Koji Nishino, and the mascot of the franchise".to_string(),
            },
        );
        let qa = TemplateRealizer::new(&config).realize(&candidate).unwrap();
        assert_eq!(
            qa.answer_short,
            "an electric-type Pokémon species, and the mascot of the franchise"
        );
        assert_eq!(qa.question, "What is Pikachu?");
    }

    #[test]
    fn test_ownership_and_generic_passive() {
        let config = PipelineConfig::default();
        let pairs = realize_all(&config, OWNERSHIP);

        let owns = find(&pairs, "Who owns The brand?");
        assert_eq!(owns.answer_short, "Nintendo, Creatures, Game Freak");
        let generic = find(&pairs, "Who owned The brand?");
        assert_eq!(generic.answer_short, "Nintendo, Creatures and Game Freak");
    }

    #[test]
    fn test_quantity_templates() {
        let config = PipelineConfig::default();

        let simple = realize_all(&config, YEAR_AND_COUNT);
        let qa = find(&simple, "How many sequels?");
        assert_eq!(qa.answer_short, "nine");
        assert_eq!(qa.answer_sentence, "nine sequels.");
        assert_eq!(qa.expect_type, Some(ExpectType::Number));

        let existential = realize_all(&config, EXISTENTIAL);
        let qa = find(&existential, "How many sequels are there?");
        assert_eq!(qa.answer_sentence, "There are nine sequels.");
        assert_eq!(qa.fact_type, "quantity_existential");
    }

    #[test]
    fn test_unsupported_svo_verb() {
        let sentence = sentence(FOUNDING);
        let candidate = FactCandidate::new(
            &sentence,
            Fact::Svo {
                subject_text: "Ishihara".to_string(),
                verb: 1,
                object_text: "Creatures, Inc.".to_string(),
            },
        );

        let mut config = PipelineConfig::default();
        assert!(TemplateRealizer::new(&config).realize(&candidate).is_ok());

        config.lexicon.founding_verbs.remove("found");
        assert_eq!(
            TemplateRealizer::new(&config).realize(&candidate),
            Err(RealizeFailure::UnsupportedVerb("found".to_string()))
        );
    }

    #[test]
    fn test_date_requires_text() {
        let config = PipelineConfig::default();
        let sentence = sentence(DEFINITION);
        let realizer = TemplateRealizer::new(&config);

        let candidate = FactCandidate::new(
            &sentence,
            Fact::DateRelease {
                subject_text: "Pikachu".to_string(),
                verb: Some(1),
                date_text: None,
            },
        );
        assert_eq!(realizer.realize(&candidate), Err(RealizeFailure::MissingDate));
    }

    #[test]
    fn test_date_falls_back_to_first_date_entity() {
        let config = PipelineConfig::default();
        let sentence = sentence(FOUNDING);
        let realizer = TemplateRealizer::new(&config);

        let candidate = FactCandidate::new(
            &sentence,
            Fact::DateRelease {
                subject_text: "Creatures, Inc.".to_string(),
                verb: None,
                date_text: None,
            },
        );
        let qa = realizer.realize(&candidate).unwrap();
        assert_eq!(qa.question, "When was Creatures, Inc. released?");
        assert_eq!(qa.answer_short, "8 November 1995");
    }

    #[test]
    fn test_empty_noun_phrase() {
        let config = PipelineConfig::default();
        let sentence = sentence(YEAR_AND_COUNT);
        let realizer = TemplateRealizer::new(&config);

        let candidate = FactCandidate::new(
            &sentence,
            Fact::QuantitySimple {
                number: 5,
                noun: 6,
                noun_phrase: "the nine".to_string(),
            },
        );
        assert!(matches!(
            realizer.realize(&candidate),
            Err(RealizeFailure::EmptyNounPhrase(_))
        ));
    }

    #[test]
    fn test_bad_token_reference_is_internal_failure() {
        let config = PipelineConfig::default();
        let sentence = sentence(DEFINITION);
        let realizer = TemplateRealizer::new(&config);

        let candidate = FactCandidate::new(
            &sentence,
            Fact::Definition {
                subject: 0,
                subject_text: "Pikachu".to_string(),
                verb: 99,
                attribute_text: "a mouse".to_string(),
            },
        );
        let failure = realizer.realize(&candidate).unwrap_err();
        assert_eq!(failure.reason(), "internal");
    }

    #[test]
    fn test_be_form_from_morphology() {
        let mut verb = sentence(DEFINITION).token(1).unwrap().clone();
        let mut subject = sentence(DEFINITION).token(0).unwrap().clone();
        verb.text = "became".to_string();
        verb.morph.tense = Some(Tense::Past);
        assert_eq!(be_form(&subject, &verb), "was");

        subject.morph.number = Some(GramNumber::Plur);
        assert_eq!(be_form(&subject, &verb), "were");

        verb.morph.tense = None;
        verb.tag = "VBZ".to_string();
        assert_eq!(be_form(&subject, &verb), "are");
    }
}
