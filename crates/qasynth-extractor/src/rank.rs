//! Deduplication and ranking of accepted candidates

use std::collections::HashMap;

use qasynth_core::{QaCandidate, RankingConfig};

use crate::text::{count_occurrences, normalize};

/// Evidence quality: literal answer occurrences in the evidence, weighted,
/// minus a length penalty on the evidence.
pub fn evidence_quality(qa: &QaCandidate, config: &RankingConfig) -> f64 {
    let evidence = qa.evidence_span.to_lowercase();
    let answer = qa.answer_short.to_lowercase();
    let presence = count_occurrences(&evidence, &answer) as f64 * config.presence_weight;
    presence - qa.evidence_span.chars().count() as f64 / config.length_divisor
}

fn dedup_key(qa: &QaCandidate) -> (String, String) {
    (normalize(&qa.question), normalize(&qa.answer_short))
}

/// Keep the best-scoring candidate per (question, answer) key, sort by
/// score descending and truncate to `target`.
///
/// Within a group the first candidate reaching the maximum score wins, and
/// the sort is stable, so ties keep first-seen order.
pub fn deduplicate_and_rank(
    items: Vec<QaCandidate>,
    target: usize,
    config: &RankingConfig,
) -> Vec<QaCandidate> {
    let mut slots: HashMap<(String, String), usize> = HashMap::new();
    let mut kept: Vec<(f64, QaCandidate)> = Vec::new();

    for qa in items {
        let score = evidence_quality(&qa, config);
        match slots.get(&dedup_key(&qa)) {
            Some(&slot) => {
                if score > kept[slot].0 {
                    kept[slot] = (score, qa);
                }
            }
            None => {
                slots.insert(dedup_key(&qa), kept.len());
                kept.push((score, qa));
            }
        }
    }

    kept.sort_by(|a, b| b.0.total_cmp(&a.0));
    kept.into_iter().take(target).map(|(_, qa)| qa).collect()
}
