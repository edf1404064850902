use crate::chunking::{Chunker, TextNormalizer};
use crate::dedup::DedupChecker;
use crate::error::IndexError;
use crate::extractor::TextExtractor;
use crate::filters::FilterSet;
use crate::models::{IndexPlan, IndexerOptions, SourceFile};
use crate::publisher::{BackoffPolicy, IndexPublisher};
use crate::traits::DocumentStore;
use crate::walker::{WalkEvent, Walker};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub directories_visited: usize,
    pub directories_pruned: usize,
    pub files_visited: usize,
    pub files_filtered: usize,
    pub special_entries: usize,
    pub files_already_indexed: usize,
    pub files_indexed: usize,
    pub files_failed: usize,
    pub placeholders: usize,
    pub chunks_published: usize,
    pub chunks_failed: usize,
    pub walk_errors: usize,
}

impl IndexReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::AlreadyIndexed => self.files_already_indexed += 1,
            FileOutcome::Indexed {
                placeholder,
                published,
                failed,
            } => {
                self.files_indexed += 1;
                self.placeholders += usize::from(placeholder);
                self.chunks_published += published;
                self.chunks_failed += failed;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    AlreadyIndexed,
    Indexed {
        placeholder: bool,
        published: usize,
        failed: usize,
    },
}

/// Walks the source tree and indexes every admitted file into the store.
pub struct FsIndexer<S> {
    options: IndexerOptions,
    filters: FilterSet,
    extractor: Arc<TextExtractor>,
    normalizer: TextNormalizer,
    chunker: Chunker,
    store: Arc<S>,
    dedup: DedupChecker<S>,
    publisher: IndexPublisher<S>,
}

impl<S> FsIndexer<S>
where
    S: DocumentStore + Send + Sync,
{
    pub fn new(
        options: IndexerOptions,
        store: Arc<S>,
        extractor: TextExtractor,
    ) -> Result<Self, IndexError> {
        let filters = FilterSet::compile(&options.filters)?;
        let backoff = Arc::new(BackoffPolicy::new(options.initial_backoff));

        Ok(Self {
            filters,
            extractor: Arc::new(extractor),
            normalizer: TextNormalizer::new()?,
            chunker: Chunker::new(options.chunk_size),
            dedup: DedupChecker::new(Arc::clone(&store), options.probe_ordinal()),
            publisher: IndexPublisher::new(Arc::clone(&store), backoff),
            store,
            options,
        })
    }

    pub fn with_native_extraction(
        options: IndexerOptions,
        store: Arc<S>,
    ) -> Result<Self, IndexError> {
        let extractor = TextExtractor::native(&options.html_extension_pattern)?;
        Self::new(options, store, extractor)
    }

    pub fn options(&self) -> &IndexerOptions {
        &self.options
    }

    pub fn publisher(&self) -> &IndexPublisher<S> {
        &self.publisher
    }

    /// Runs the whole walk. Only an unreadable source root fails the run. Every
    /// other fault is logged, counted and contained to its entry.
    pub async fn run(&self) -> Result<IndexReport, IndexError> {
        let root = resolve_root(&self.options.source)?;
        let dry_run = self.options.dry_run;

        if !dry_run {
            if let Err(error) = self.store.ensure_index().await {
                warn!(%error, "cannot create index");
            }
        }

        let mut report = IndexReport::default();
        for event in Walker::new(&root, &self.filters) {
            match event {
                WalkEvent::Directory(path) => {
                    report.directories_visited += 1;
                    info!(path = %path.display(), dry_run, "index folder");
                }
                WalkEvent::Pruned(path) => {
                    report.directories_pruned += 1;
                    info!(path = %path.display(), "skip folder");
                }
                WalkEvent::Filtered(path) => {
                    report.files_filtered += 1;
                    debug!(path = %path.display(), "skip file");
                }
                WalkEvent::Special(path) => {
                    report.special_entries += 1;
                    info!(path = %path.display(), "skip special entry");
                }
                WalkEvent::Error(error) if error.depth() == 0 => {
                    return Err(root_failure(&root, &error));
                }
                WalkEvent::Error(error) => {
                    report.walk_errors += 1;
                    warn!(%error, "walk error");
                }
                WalkEvent::File(path) => {
                    report.files_visited += 1;
                    if dry_run {
                        info!(path = %path.display(), dry_run, "index file");
                        continue;
                    }

                    match self.index_file(&path).await {
                        Ok(outcome) => report.record(outcome),
                        Err(error) => {
                            report.files_failed += 1;
                            warn!(path = %path.display(), %error, "file not indexed");
                        }
                    }
                }
            }
        }

        self.publisher.in_flight().wait_idle().await;
        Ok(report)
    }

    /// Dedup probe, extraction, normalization, chunking and publishing for one file.
    pub async fn index_file(&self, path: &Path) -> Result<FileOutcome, IndexError> {
        let source = SourceFile::new(path)
            .ok_or_else(|| IndexError::MissingFileName(path.display().to_string()))?;

        if self.dedup.already_indexed(&source.id).await {
            info!(name = %source.file_name, "exists already, skip");
            return Ok(FileOutcome::AlreadyIndexed);
        }

        info!(name = %source.file_name, "parse");
        let extractor = Arc::clone(&self.extractor);
        let job = source.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&job))
            .await
            .map_err(|error| {
                IndexError::Extraction(format!("{}: converter aborted: {error}", path.display()))
            })?;

        let plan = match extracted {
            Some(text) => self.chunker.plan(self.normalizer.normalize(&text)),
            None => {
                info!(name = %source.file_name, path = %path.display(), "no content");
                IndexPlan::Placeholder
            }
        };
        let placeholder = plan == IndexPlan::Placeholder;

        let mut published = 0;
        let mut failed = 0;
        for document in plan.into_documents(&source) {
            let chunk_id = source.id.chunk_id(document.ordinal);
            info!(
                name = %source.file_name,
                ordinal = document.ordinal,
                size = document.content.len(),
                "chunk"
            );
            match self.publisher.publish(&chunk_id, &document).await {
                Ok(()) => published += 1,
                Err(_) => failed += 1,
            }
        }

        Ok(FileOutcome::Indexed {
            placeholder,
            published,
            failed,
        })
    }
}

fn root_failure(root: &Path, error: &walkdir::Error) -> IndexError {
    IndexError::SourceUnavailable {
        path: root.display().to_string(),
        reason: error.to_string(),
    }
}

fn resolve_root(source: &Path) -> Result<PathBuf, IndexError> {
    std::fs::canonicalize(source).map_err(|error| IndexError::SourceUnavailable {
        path: source.display().to_string(),
        reason: error.to_string(),
    })
}
