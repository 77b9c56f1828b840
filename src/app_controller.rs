use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::app_config::{Config, LookupConfig, LookupProvider};
use crate::pipeline::{PipelineConfig, ProgressCallback, ReferenceCandidate, SermonPipeline};
use crate::providers::{BibleApiLookup, CachedVerseLookup, JsonVerseLookup, LexicalSimilarity, VerseLookup};

/// Extension of transcript files picked up in folder mode
const TRANSCRIPT_EXTENSION: &str = "txt";

/// Suffix of generated documents
const OUTPUT_SUFFIX: &str = "sermon.json";

/// Suffix of optional per-transcript candidate files
const CANDIDATES_SUFFIX: &str = "candidates.json";

/// Counts from a folder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Main application controller for sermon processing
pub struct Controller {
    config: Config,
    pipeline: SermonPipeline,
}

impl Controller {
    /// Create a controller whose collaborators come from the configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let lookup = Self::build_lookup(&config.lookup)?;
        let pipeline = SermonPipeline::new(config.pipeline_config(), lookup, Arc::new(LexicalSimilarity::new()));
        Ok(Self { config, pipeline })
    }

    /// Create a controller around an existing pipeline
    pub fn with_pipeline(config: Config, pipeline: SermonPipeline) -> Self {
        Self { config, pipeline }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pipeline(&self) -> &SermonPipeline {
        &self.pipeline
    }

    pub fn pipeline_config(&self) -> &PipelineConfig {
        self.pipeline.config()
    }

    /// Build the verse lookup chain for the configured provider
    pub fn build_lookup(config: &LookupConfig) -> Result<Arc<dyn VerseLookup>> {
        let lookup: Arc<dyn VerseLookup> = match config.provider {
            LookupProvider::BibleApi => {
                let mut api = BibleApiLookup::new_with_config(
                    &config.endpoint,
                    config.timeout_secs,
                    config.max_retries,
                    config.backoff_base_ms,
                    config.rate_limit,
                )?;
                if let Some(translation) = &config.translation {
                    api = api.with_translation(translation.clone());
                }
                Arc::new(api)
            }
            LookupProvider::JsonFile => {
                let path = config
                    .verses_file
                    .as_ref()
                    .ok_or_else(|| anyhow!("lookup.verses_file is required for the json_file provider"))?;
                Arc::new(JsonVerseLookup::from_file(path)?)
            }
        };
        debug!("Verse lookup: {}", config.provider.display_name());

        if config.cache {
            Ok(Arc::new(CachedVerseLookup::new(lookup)))
        } else {
            Ok(lookup)
        }
    }

    /// Output file name for a transcript: `<stem>.sermon.json`
    pub fn output_filename(input_file: &Path) -> String {
        let stem = input_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "sermon".to_string());
        format!("{}.{}", stem, OUTPUT_SUFFIX)
    }

    /// Candidate file looked for next to a transcript: `<stem>.candidates.json`
    pub fn sibling_candidates_file(input_file: &Path) -> Option<PathBuf> {
        let stem = input_file.file_stem()?.to_string_lossy().to_string();
        let path = input_file.with_file_name(format!("{}.{}", stem, CANDIDATES_SUFFIX));
        path.is_file().then_some(path)
    }

    /// Read a JSON array of reference candidates
    pub fn load_candidates(path: &Path) -> Result<Vec<ReferenceCandidate>> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read candidates file: {}", path.display()))?;
        serde_json::from_str(&content).context(format!("Failed to parse candidates file: {}", path.display()))
    }

    /// Process one transcript into `output_dir`.
    ///
    /// Returns the written path, or `None` when the output already exists and
    /// `force_overwrite` is off.
    pub async fn run(
        &self,
        input_file: PathBuf,
        output_dir: PathBuf,
        candidates_file: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(&input_file, &output_dir, candidates_file.as_deref(), &multi_progress, force_overwrite)
            .await
    }

    async fn run_with_progress(
        &self,
        input_file: &Path,
        output_dir: &Path,
        candidates_file: Option<&Path>,
        multi_progress: &MultiProgress,
        force_overwrite: bool,
    ) -> Result<Option<PathBuf>> {
        let start_time = std::time::Instant::now();

        if !input_file.is_file() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_dir.join(Self::output_filename(input_file));
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {}, output already exists (use -f to force overwrite)", input_file.display());
            return Ok(None);
        }
        std::fs::create_dir_all(output_dir)
            .context(format!("Failed to create output directory: {}", output_dir.display()))?;

        let transcript = std::fs::read_to_string(input_file)
            .context(format!("Failed to read transcript: {}", input_file.display()))?;
        let candidates_file = candidates_file
            .map(Path::to_path_buf)
            .or_else(|| Self::sibling_candidates_file(input_file));
        let candidates = match &candidates_file {
            Some(path) => {
                debug!("Using candidates from {}", path.display());
                Some(Self::load_candidates(path)?)
            }
            None => None,
        };

        let progress_bar = multi_progress.add(ProgressBar::new(100));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let pb = progress_bar.clone();
        let callback: ProgressCallback = Box::new(move |progress| {
            pb.set_position((progress.overall_progress * 100.0).round() as u64);
            pb.set_message(format!("{:?}", progress.phase));
        });

        let sermon = self
            .pipeline
            .process_with_progress(&transcript, candidates.as_deref(), Some(&callback))
            .await
            .context(format!("Failed to process {}", input_file.display()))?;
        progress_bar.finish_and_clear();

        let json = serde_json::to_string_pretty(&sermon.to_record()).context("Failed to serialize sermon document")?;
        std::fs::write(&output_path, json).context(format!("Failed to write {}", output_path.display()))?;

        info!(
            "Success: {} ({} passage(s), {} dropped) in {}",
            output_path.display(),
            sermon.report.passages,
            sermon.report.dropped.len(),
            Self::format_duration(start_time.elapsed())
        );
        Ok(Some(output_path))
    }

    /// Transcript files under `input_dir`, sorted
    pub fn find_transcripts(input_dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(TRANSCRIPT_EXTENSION))
            })
            .collect();
        files.sort();
        files
    }

    /// Process every transcript under `input_dir`. Outputs go next to each
    /// transcript unless `output_dir` is given.
    pub async fn run_folder(
        &self,
        input_dir: PathBuf,
        output_dir: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let transcripts = Self::find_transcripts(&input_dir);
        if transcripts.is_empty() {
            return Err(anyhow!("No .{} transcripts found in directory: {:?}", TRANSCRIPT_EXTENSION, input_dir));
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = multi_progress.add(ProgressBar::new(transcripts.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));

        let mut summary = FolderSummary::default();
        for transcript in &transcripts {
            let file_name = transcript
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let target_dir = match (&output_dir, transcript.parent()) {
                (Some(dir), _) => dir.clone(),
                (None, Some(parent)) => parent.to_path_buf(),
                (None, None) => input_dir.clone(),
            };

            match self
                .run_with_progress(transcript, &target_dir, None, &multi_progress, force_overwrite)
                .await
            {
                Ok(Some(_)) => summary.processed += 1,
                Ok(None) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.errors += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");
        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors in {}",
            summary.processed,
            summary.skipped,
            summary.errors,
            Self::format_duration(start_time.elapsed())
        );
        Ok(summary)
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
