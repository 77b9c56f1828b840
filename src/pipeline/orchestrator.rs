/*!
 * Pipeline orchestrator for turning a transcript into a sermon document.
 *
 * Phases:
 * 1. Normalize: canonicalize spoken references, remap or scan candidates
 * 2. Locate: fetch verse text and detect quote boundaries
 * 3. Isolate: Pass A, passages into their own paragraphs
 * 4. Segment: Pass B, topic breaks in plain paragraphs
 * 5. Extract: Pass C, references summary
 *
 * Per-candidate problems are collected in the report; only a broken tree
 * aborts the document.
 */

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detection::{QuoteBoundary, QuoteBoundaryDetector};
use crate::document::{
    AdjacencyScores, Comparison, DocumentTree, ExtractedReference, NodeRecord, apply_passages_to_ast,
    extract_references, plan_segmentation, segment_ast_paragraphs,
};
use crate::errors::{AppError, CandidateError, ProviderError};
use crate::providers::{SimilarityScorer, VerseLookup, VerseQuery};
use crate::scripture::{NormalizedText, ReferenceNormalizer};

use super::candidates::{DroppedCandidate, ReferenceCandidate, ResolvedCandidate, resolve_candidates, scan_candidates};
use super::config::PipelineConfig;

/// Phases of the sermon pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Normalize,
    Locate,
    Isolate,
    Segment,
    Extract,
}

impl PipelinePhase {
    /// (start, width) of the phase on the overall progress scale
    fn share(self) -> (f32, f32) {
        match self {
            PipelinePhase::Normalize => (0.0, 0.05),
            PipelinePhase::Locate => (0.05, 0.45),
            PipelinePhase::Isolate => (0.5, 0.05),
            PipelinePhase::Segment => (0.55, 0.4),
            PipelinePhase::Extract => (0.95, 0.05),
        }
    }
}

/// Progress information during pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProgress {
    pub phase: PipelinePhase,

    /// Progress within current phase (0.0 - 1.0)
    pub phase_progress: f32,

    /// Overall progress (0.0 - 1.0)
    pub overall_progress: f32,

    pub status: String,
}

impl PipelineProgress {
    pub fn new(phase: PipelinePhase) -> Self {
        Self {
            phase,
            phase_progress: 0.0,
            overall_progress: phase.share().0,
            status: String::new(),
        }
    }

    pub fn update(&mut self, phase_progress: f32, status: &str) {
        let (start, width) = self.phase.share();
        self.phase_progress = phase_progress.clamp(0.0, 1.0);
        self.overall_progress = start + self.phase_progress * width;
        self.status = status.to_string();
    }

    pub fn next_phase(&mut self, phase: PipelinePhase) {
        self.phase = phase;
        self.phase_progress = 0.0;
        self.overall_progress = phase.share().0;
        self.status = format!("Starting {:?} phase", phase);
    }
}

/// Progress callback accepted by the pipeline.
pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send + Sync>;

/// What happened to one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingReport {
    /// Candidates considered, dropped ones included
    pub candidates: usize,
    pub passages: usize,
    pub paragraphs: usize,
    pub topic_breaks: usize,
    /// References rewritten by the normalizer
    pub normalized_references: usize,
    /// Similarity requests that failed or timed out
    pub failed_scores: usize,
    pub dropped: Vec<DroppedCandidate>,
    pub duration_ms: u64,
}

impl ProcessingReport {
    pub fn summary(&self) -> String {
        format!(
            "{} passage(s) from {} candidate(s), {} dropped | {} paragraph(s), {} topic break(s) | {:.2}s",
            self.passages,
            self.candidates,
            self.dropped.len(),
            self.paragraphs,
            self.topic_breaks,
            self.duration_ms as f64 / 1000.0
        )
    }
}

/// Output of the pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedSermon {
    pub tree: DocumentTree,
    pub references: Vec<ExtractedReference>,
    pub report: ProcessingReport,
}

/// Serializable form of a processed sermon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SermonRecord {
    pub document: NodeRecord,
    pub references: Vec<ExtractedReference>,
    pub report: ProcessingReport,
}

impl ProcessedSermon {
    pub fn to_record(&self) -> SermonRecord {
        SermonRecord {
            document: self.tree.to_record(),
            references: self.references.clone(),
            report: self.report.clone(),
        }
    }
}

/// The sermon pipeline orchestrator.
#[derive(Debug)]
pub struct SermonPipeline {
    config: PipelineConfig,
    normalizer: ReferenceNormalizer,
    detector: QuoteBoundaryDetector,
    lookup: Arc<dyn VerseLookup>,
    scorer: Arc<dyn SimilarityScorer>,
}

impl SermonPipeline {
    pub fn new(config: PipelineConfig, lookup: Arc<dyn VerseLookup>, scorer: Arc<dyn SimilarityScorer>) -> Self {
        let normalizer = ReferenceNormalizer::new(config.normalizer.clone());
        let detector = QuoteBoundaryDetector::new(config.detector.clone());
        Self {
            config,
            normalizer,
            detector,
            lookup,
            scorer,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Normalize references in `text` without building a document.
    pub fn normalize(&self, text: &str) -> NormalizedText {
        self.normalizer.normalize(text)
    }

    pub async fn process(
        &self,
        transcript: &str,
        candidates: Option<&[ReferenceCandidate]>,
    ) -> Result<ProcessedSermon, AppError> {
        self.process_with_progress(transcript, candidates, None).await
    }

    /// Run every phase over one transcript.
    pub async fn process_with_progress(
        &self,
        transcript: &str,
        candidates: Option<&[ReferenceCandidate]>,
        progress_callback: Option<&ProgressCallback>,
    ) -> Result<ProcessedSermon, AppError> {
        let start_time = Instant::now();
        let report_progress = |progress: &PipelineProgress| {
            if let Some(callback) = progress_callback {
                callback(progress.clone());
            }
        };
        let mut report = ProcessingReport::default();

        // Phase 1: Normalize
        let mut progress = PipelineProgress::new(PipelinePhase::Normalize);
        progress.update(0.0, "Normalizing references...");
        report_progress(&progress);

        let normalized = self.normalizer.normalize(transcript);
        report.normalized_references = normalized.deltas.len();
        let (resolved, dropped) = match candidates {
            Some(candidates) => resolve_candidates(candidates, transcript, &normalized),
            None => scan_candidates(&normalized),
        };
        report.candidates = resolved.len() + dropped.len();
        self.record_dropped(&mut report, dropped);

        progress.update(
            1.0,
            &format!("{} reference(s) normalized, {} candidate(s)", report.normalized_references, resolved.len()),
        );
        report_progress(&progress);

        let mut tree = DocumentTree::from_text(normalized.text);

        // Phase 2: Locate
        progress.next_phase(PipelinePhase::Locate);
        report_progress(&progress);

        let boundaries = self.locate_all(tree.source(), &resolved, &mut report).await;

        progress.update(1.0, &format!("{} quote(s) located", boundaries.len()));
        report_progress(&progress);

        // Phase 3: Isolate
        progress.next_phase(PipelinePhase::Isolate);
        report_progress(&progress);

        let outcome = apply_passages_to_ast(&mut tree, boundaries).inspect_err(|e| error!("Pass A failed: {}", e))?;
        let rejected = outcome
            .rejected
            .into_iter()
            .map(|r| DroppedCandidate::new(r.boundary.reference.canonical(), r.boundary.span(), &r.error))
            .collect();
        self.record_dropped(&mut report, rejected);

        progress.update(1.0, &format!("{} passage(s) isolated", outcome.applied.len()));
        report_progress(&progress);

        // Phase 4: Segment
        progress.next_phase(PipelinePhase::Segment);
        report_progress(&progress);

        if self.config.segmentation.enabled {
            let plan = plan_segmentation(&tree, &self.config.segmentation);
            let comparisons = plan.comparisons(tree.source(), self.config.segmentation.window_sentences);
            let scores = self.collect_scores(comparisons, &mut report).await;
            let segmented = segment_ast_paragraphs(&mut tree, &plan, &scores, &self.config.segmentation)
                .inspect_err(|e| error!("Pass B failed: {}", e))?;
            report.topic_breaks = segmented.breaks;
            progress.update(1.0, &format!("{} topic break(s)", segmented.breaks));
        } else {
            progress.update(1.0, "Segmentation disabled");
        }
        report_progress(&progress);

        // Phase 5: Extract
        progress.next_phase(PipelinePhase::Extract);
        report_progress(&progress);

        let references = extract_references(&tree);
        report.passages = references.len();
        report.paragraphs = tree.paragraphs().len();
        report.duration_ms = start_time.elapsed().as_millis() as u64;

        progress.update(1.0, &report.summary());
        report_progress(&progress);
        info!("{}", report.summary());

        Ok(ProcessedSermon {
            tree,
            references,
            report,
        })
    }

    fn record_dropped(&self, report: &mut ProcessingReport, dropped: Vec<DroppedCandidate>) {
        for candidate in &dropped {
            warn!("Dropped {} at {}..{}: {}", candidate.reference, candidate.start, candidate.end, candidate.reason);
        }
        report.dropped.extend(dropped);
    }

    async fn lookup_verse(&self, query: &VerseQuery) -> Result<String, ProviderError> {
        let timeout_ms = self.config.lookup_timeout_ms;
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.lookup.lookup(query)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout_ms)),
        }
    }

    /// Fetch verse text for every candidate concurrently, then detect each
    /// quote boundary.
    async fn locate_all(
        &self,
        source: &str,
        resolved: &[ResolvedCandidate],
        report: &mut ProcessingReport,
    ) -> Vec<QuoteBoundary> {
        let queries: Vec<VerseQuery> = resolved
            .iter()
            .map(|candidate| {
                let translation = candidate.translation.as_deref().or(self.config.translation.as_deref());
                VerseQuery::new(&candidate.reference, translation)
            })
            .collect();
        let verses = join_all(queries.iter().map(|query| self.lookup_verse(query))).await;

        let mut boundaries = Vec::with_capacity(resolved.len());
        let mut dropped = Vec::new();
        for ((candidate, query), verse) in resolved.iter().zip(&queries).zip(verses) {
            let detected = verse.map_err(CandidateError::from).and_then(|verse_text| {
                self.detector.detect(
                    source,
                    &candidate.reference,
                    candidate.span,
                    &verse_text,
                    query.translation.as_deref(),
                )
            });
            match detected {
                Ok(boundary) => boundaries.push(boundary),
                Err(error) => dropped.push(DroppedCandidate::new(candidate.reference.canonical(), candidate.span, &error)),
            }
        }
        debug!("Located {} of {} quote(s)", boundaries.len(), resolved.len());
        self.record_dropped(report, dropped);
        boundaries
    }

    /// Score every comparison; failures and timeouts leave gaps.
    async fn collect_scores(&self, comparisons: Vec<Comparison>, report: &mut ProcessingReport) -> AdjacencyScores {
        let timeout = Duration::from_millis(self.config.scorer_timeout_ms);
        let results: Vec<_> = stream::iter(comparisons)
            .map(|comparison| async move {
                let result = tokio::time::timeout(timeout, self.scorer.similarity(&comparison.before, &comparison.after)).await;
                (comparison, result)
            })
            .buffer_unordered(self.config.max_concurrent_requests)
            .collect()
            .await;

        let mut scores = AdjacencyScores::default();
        for (comparison, result) in results {
            match result {
                Ok(Ok(score)) => scores.insert(comparison.paragraph, comparison.index, score),
                Ok(Err(e)) => {
                    report.failed_scores += 1;
                    debug!("Similarity failed before sentence {} of {}: {}", comparison.index, comparison.paragraph, e);
                }
                Err(_) => {
                    report.failed_scores += 1;
                    debug!("Similarity timed out before sentence {} of {}", comparison.index, comparison.paragraph);
                }
            }
        }
        if report.failed_scores > 0 {
            warn!("{} similarity request(s) failed; no breaks placed there", report.failed_scores);
        }
        scores
    }
}
