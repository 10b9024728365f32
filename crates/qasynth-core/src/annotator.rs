//! Annotator contract
//!
//! Linguistic annotation (tokenization, tagging, parsing, lemmatization,
//! NER) is supplied from outside the core. The pipeline owns an explicitly
//! constructed `Annotator` instance and calls it for sentences, topics,
//! generated questions and answers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use crate::{AnnotatedSentence, QaError, Result};

/// Trait for sentence annotators
pub trait Annotator: Send + Sync {
    /// Annotate a single piece of text
    fn annotate(&self, text: &str) -> Result<AnnotatedSentence>;

    /// Annotate many texts; implementations backed by a batching service
    /// should override this for throughput.
    fn annotate_many(&self, texts: &[String]) -> Result<Vec<AnnotatedSentence>> {
        texts.iter().map(|t| self.annotate(t)).collect()
    }
}

impl<A: Annotator + ?Sized> Annotator for Arc<A> {
    fn annotate(&self, text: &str) -> Result<AnnotatedSentence> {
        (**self).annotate(text)
    }

    fn annotate_many(&self, texts: &[String]) -> Result<Vec<AnnotatedSentence>> {
        (**self).annotate_many(texts)
    }
}

impl<A: Annotator + ?Sized> Annotator for Box<A> {
    fn annotate(&self, text: &str) -> Result<AnnotatedSentence> {
        (**self).annotate(text)
    }

    fn annotate_many(&self, texts: &[String]) -> Result<Vec<AnnotatedSentence>> {
        (**self).annotate_many(texts)
    }
}

// ============================================================================
// Static Annotator
// ============================================================================

/// Annotator backed by pre-annotated sentences keyed by their text
#[derive(Default)]
pub struct StaticAnnotator {
    sentences: HashMap<String, AnnotatedSentence>,
    fallback: Option<Arc<dyn Annotator>>,
}

impl StaticAnnotator {
    /// Create an empty static annotator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a list of annotated sentences
    pub fn from_sentences(sentences: impl IntoIterator<Item = AnnotatedSentence>) -> Self {
        let mut annotator = Self::new();
        for sentence in sentences {
            annotator.insert(sentence);
        }
        annotator
    }

    /// Delegate unknown text to another annotator
    pub fn with_fallback(mut self, fallback: Arc<dyn Annotator>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Add or replace an annotated sentence
    pub fn insert(&mut self, sentence: AnnotatedSentence) {
        self.sentences.insert(sentence.text().to_string(), sentence);
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

impl Annotator for StaticAnnotator {
    fn annotate(&self, text: &str) -> Result<AnnotatedSentence> {
        if let Some(sentence) = self.sentences.get(text) {
            return Ok(sentence.clone());
        }
        match &self.fallback {
            Some(fallback) => fallback.annotate(text),
            None => Err(QaError::AnnotationUnavailable(format!(
                "no annotation for {:?}",
                text
            ))),
        }
    }
}

// ============================================================================
// Cached Annotator
// ============================================================================

/// Hit/miss counters for the annotation cache
#[derive(Debug, Default)]
pub struct AnnotationCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AnnotationCacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Hit rate in [0, 1]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Memoizing wrapper around another annotator.
///
/// The quality filter re-annotates evidence sentences and answers, many of
/// which repeat across candidates from the same sentence.
pub struct CachedAnnotator<A> {
    inner: A,
    cache: Cache<String, Arc<AnnotatedSentence>>,
    stats: Arc<AnnotationCacheStats>,
}

impl<A: Annotator> CachedAnnotator<A> {
    /// Wrap an annotator with a bounded cache
    pub fn new(inner: A, capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::builder().max_capacity(capacity).build(),
            stats: Arc::new(AnnotationCacheStats::default()),
        }
    }

    /// Cache statistics
    pub fn stats(&self) -> Arc<AnnotationCacheStats> {
        Arc::clone(&self.stats)
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Annotator> Annotator for CachedAnnotator<A> {
    fn annotate(&self, text: &str) -> Result<AnnotatedSentence> {
        if let Some(hit) = self.cache.get(text) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((*hit).clone());
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let sentence = self.inner.annotate(text)?;
        self.cache
            .insert(text.to_string(), Arc::new(sentence.clone()));
        Ok(sentence)
    }

    fn annotate_many(&self, texts: &[String]) -> Result<Vec<AnnotatedSentence>> {
        let mut results: Vec<Option<AnnotatedSentence>> = Vec::with_capacity(texts.len());
        let mut missing = Vec::new();

        for text in texts {
            match self.cache.get(text.as_str()) {
                Some(hit) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    results.push(Some((*hit).clone()));
                }
                None => {
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                    missing.push(text.clone());
                    results.push(None);
                }
            }
        }

        if !missing.is_empty() {
            let fresh = self.inner.annotate_many(&missing)?;
            if fresh.len() != missing.len() {
                return Err(QaError::AnnotationUnavailable(format!(
                    "annotator returned {} sentences for {} texts",
                    fresh.len(),
                    missing.len()
                )));
            }

            let slots = results.iter_mut().filter(|r| r.is_none());
            for ((slot, text), sentence) in slots.zip(missing).zip(fresh) {
                self.cache.insert(text, Arc::new(sentence.clone()));
                *slot = Some(sentence);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
