//! QA synthesis pipeline
//!
//! sentences -> topic matcher -> pattern extractor -> template realizer
//! -> quality filter -> deduplicator/ranker
//!
//! Annotation failures abort the run. Everything past annotation is
//! per-sentence or per-candidate and never aborts the batch.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use qasynth_core::{AnnotatedSentence, Annotator, PipelineConfig, QaCandidate, QaError, Result};

use crate::patterns::{Extraction, PatternExtractor};
use crate::quality::{QualityFilter, QualityStats};
use crate::rank::deduplicate_and_rank;
use crate::realize::TemplateRealizer;
use crate::topic::TopicMatcher;

/// Counters for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub total_sentences: usize,
    pub relevant_sentences: usize,
    pub dirty_sentences: usize,
    pub facts_found: usize,
    pub facts_by_kind: BTreeMap<String, usize>,
    pub duplicates_collapsed: usize,
    pub detector_errors: BTreeMap<String, usize>,
    pub realized: usize,
    /// fact kind -> failure reason -> count
    pub realization_failures: BTreeMap<String, BTreeMap<String, usize>>,
    pub quality_rejections: BTreeMap<String, usize>,
    pub accepted: usize,
    pub final_count: usize,
    pub rejected_samples: Vec<QaCandidate>,
}

impl PipelineStats {
    pub fn realization_failure_count(&self) -> usize {
        self.realization_failures
            .values()
            .flat_map(|reasons| reasons.values())
            .sum()
    }
}

/// Ranked QA pairs plus run statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub qa_pairs: Vec<QaCandidate>,
    pub stats: PipelineStats,
}

/// The QA synthesis pipeline. Owns its annotator and configuration.
pub struct QaPipeline<A> {
    annotator: A,
    config: PipelineConfig,
}

impl<A: Annotator> QaPipeline<A> {
    pub fn new(annotator: A, config: PipelineConfig) -> Self {
        Self { annotator, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn annotator(&self) -> &A {
        &self.annotator
    }

    /// Run the pipeline. `target` defaults to the configured count.
    ///
    /// An empty topic list treats every sentence as relevant.
    pub fn run(
        &self,
        sentences: &[String],
        topics: &[String],
        target: Option<usize>,
    ) -> Result<PipelineOutput> {
        let target = target.unwrap_or(self.config.ranking.default_target);
        if target == 0 {
            return Err(QaError::InvalidInput(
                "target count must be positive".to_string(),
            ));
        }

        let mut stats = PipelineStats {
            total_sentences: sentences.len(),
            ..Default::default()
        };

        let annotated = self.annotator.annotate_many(sentences)?;
        if annotated.len() != sentences.len() {
            return Err(QaError::AnnotationUnavailable(format!(
                "annotator returned {} sentences for {} inputs",
                annotated.len(),
                sentences.len()
            )));
        }

        let matcher = TopicMatcher::new(topics, &self.annotator, &self.config.topics)?;
        let relevant: Vec<&AnnotatedSentence> = if topics.iter().all(|t| t.trim().is_empty()) {
            annotated.iter().collect()
        } else {
            annotated
                .iter()
                .zip(matcher.relevant(&annotated))
                .filter_map(|(sentence, keep)| keep.then_some(sentence))
                .collect()
        };
        stats.relevant_sentences = relevant.len();
        debug!(
            total = stats.total_sentences,
            relevant = stats.relevant_sentences,
            "Topic matching complete"
        );

        // Extraction
        let extractor = PatternExtractor::new(&self.config);
        let extractions: Vec<Extraction<'_>> = relevant
            .par_iter()
            .map(|sentence| extractor.extract(*sentence))
            .collect();

        // Realization
        let realizer = TemplateRealizer::new(&self.config);
        let mut realized = Vec::new();
        for extraction in &extractions {
            stats.dirty_sentences += usize::from(extraction.skipped_dirty);
            stats.duplicates_collapsed += extraction.duplicates_collapsed;
            for detector in &extraction.detector_errors {
                *stats.detector_errors.entry(detector.to_string()).or_default() += 1;
            }

            let Some(sentence) = extraction.facts.first().map(|f| f.sentence) else {
                continue;
            };
            let aliases = matcher.aliases_in(sentence);

            for candidate in &extraction.facts {
                let kind = candidate.kind().as_str();
                stats.facts_found += 1;
                *stats.facts_by_kind.entry(kind.to_string()).or_default() += 1;

                match realizer.realize(candidate) {
                    Ok(mut qa) => {
                        qa.topic_aliases = aliases.clone();
                        realized.push(qa);
                    }
                    Err(failure) => {
                        debug!(fact_kind = kind, reason = failure.reason(), error = %failure, "Fact not realizable");
                        *stats
                            .realization_failures
                            .entry(kind.to_string())
                            .or_default()
                            .entry(failure.reason().to_string())
                            .or_default() += 1;
                    }
                }
            }
        }
        stats.realized = realized.len();
        debug!(
            facts = stats.facts_found,
            realized = stats.realized,
            "Realization complete"
        );

        // Quality filtering with per-worker statistics
        let filter = QualityFilter::new(&self.config, &self.annotator);
        let sample_limit = self.config.ranking.rejected_sample_limit;
        let (accepted, quality) = realized
            .into_par_iter()
            .fold(
                || (Vec::new(), QualityStats::new(sample_limit)),
                |(mut accepted, mut quality), mut qa| {
                    if filter.evaluate(&mut qa, &mut quality).is_accepted() {
                        accepted.push(qa);
                    }
                    (accepted, quality)
                },
            )
            .reduce(
                || (Vec::new(), QualityStats::new(sample_limit)),
                |(mut accepted, mut quality), (more, other)| {
                    accepted.extend(more);
                    quality.merge(other);
                    (accepted, quality)
                },
            );
        stats.accepted = accepted.len();
        stats.quality_rejections = quality.rejections().clone();
        stats.rejected_samples = quality.samples().to_vec();

        let qa_pairs = deduplicate_and_rank(accepted, target, &self.config.ranking);
        stats.final_count = qa_pairs.len();

        info!(
            sentences = stats.total_sentences,
            relevant = stats.relevant_sentences,
            facts = stats.facts_found,
            realized = stats.realized,
            accepted = stats.accepted,
            rejected = quality.total_rejected(),
            final_count = stats.final_count,
            "QA synthesis complete"
        );

        Ok(PipelineOutput { qa_pairs, stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use qasynth_core::fixtures::FlatAnnotator;
    use qasynth_core::StaticAnnotator;
    use std::sync::Arc;

    fn pipeline(fixtures: &[&str]) -> QaPipeline<StaticAnnotator> {
        let annotator = StaticAnnotator::from_sentences(fixtures.iter().map(|c| sentence(c)))
            .with_fallback(Arc::new(FlatAnnotator));
        QaPipeline::new(annotator, PipelineConfig::default())
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_zero_target_is_invalid() {
        let result = pipeline(&[]).run(&[], &strings(&["Pokémon"]), Some(0));
        assert!(matches!(result, Err(QaError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_input_returns_empty_output() {
        let output = pipeline(&[]).run(&[], &strings(&["Pokémon"]), None).unwrap();
        assert!(output.qa_pairs.is_empty());
        assert_eq!(output.stats, PipelineStats::default());
    }

    #[test]
    fn test_annotation_failure_is_fatal() {
        let pipeline = QaPipeline::new(StaticAnnotator::new(), PipelineConfig::default());
        let result = pipeline.run(&strings(&["Unknown sentence."]), &strings(&["x"]), None);
        assert!(matches!(result, Err(QaError::AnnotationUnavailable(_))));
    }

    #[test]
    fn test_irrelevant_sentences_are_skipped() {
        let output = pipeline(&[FOUNDING])
            .run(
                &strings(&["Ishihara founded Creatures, Inc. on 8 November 1995."]),
                &strings(&["Digimon"]),
                None,
            )
            .unwrap();
        assert_eq!(output.stats.relevant_sentences, 0);
        assert!(output.qa_pairs.is_empty());
    }

    #[test]
    fn test_launch_counts_as_unsupported_verb() {
        let output = pipeline(&[LAUNCH])
            .run(&strings(&["Sony launched the PlayStation."]), &[], None)
            .unwrap();

        assert!(output.qa_pairs.is_empty());
        assert_eq!(output.stats.facts_by_kind.get("svo"), Some(&1));
        assert_eq!(
            output.stats.realization_failures["svo"].get("unsupported_verb"),
            Some(&1)
        );
    }

    #[test]
    fn test_stats_account_for_every_fact() {
        let output = pipeline(&[FOUNDING, YEAR_AND_COUNT])
            .run(
                &strings(&[
                    "Ishihara founded Creatures, Inc. on 8 November 1995.",
                    "The original 1977 film had nine sequels.",
                ]),
                &[],
                None,
            )
            .unwrap();
        let stats = &output.stats;

        assert_eq!(stats.relevant_sentences, 2);
        assert_eq!(stats.facts_by_kind.values().sum::<usize>(), stats.facts_found);
        assert_eq!(
            stats.realized + stats.realization_failure_count(),
            stats.facts_found
        );
        assert_eq!(
            stats.accepted + stats.quality_rejections.values().sum::<usize>(),
            stats.realized
        );
        assert!(stats.final_count <= stats.accepted);
        assert!(output
            .qa_pairs
            .iter()
            .any(|qa| qa.question == "Who founded Creatures, Inc.?"));
    }
}
