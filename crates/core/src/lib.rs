pub mod chunking;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod filters;
pub mod indexer;
pub mod models;
pub mod publisher;
pub mod stores;
pub mod traits;
pub mod walker;

pub use chunking::{chunk_by_words, Chunker, TextNormalizer};
pub use dedup::DedupChecker;
pub use error::{IndexError, StoreError};
pub use extractor::{
    DocumentConverter, HtmlConverter, NativeConverter, ScraperHtmlConverter, TextExtractor,
};
pub use filters::{EntryKind, FilterSet};
pub use indexer::{FileOutcome, FsIndexer, IndexReport};
pub use models::{
    ChunkDocument, DocumentId, FilterPatterns, IndexPlan, IndexerOptions, SourceFile,
    DEFAULT_CHUNK_SIZE, DEFAULT_EXCLUDE_DIR, DEFAULT_HTML_EXTENSION, DEFAULT_INCLUDE_FILE,
};
pub use publisher::{BackoffPolicy, InFlight, InFlightGuard, IndexPublisher};
pub use stores::{ElasticsearchStore, StoreConfig};
pub use traits::DocumentStore;
pub use walker::{WalkEvent, Walker};
