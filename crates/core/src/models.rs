use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Stable identifier of an indexed file, derived only from its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn from_path(path: &Path) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(path.as_os_str().as_encoded_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ordinal 0 addresses the document itself; chunks get a `_<ordinal>` suffix.
    pub fn chunk_id(&self, ordinal: u32) -> String {
        if ordinal > 0 {
            format!("{}_{}", self.0, ordinal)
        } else {
            self.0.clone()
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One published unit. Field names follow the index mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkDocument {
    pub content: String,
    #[serde(rename = "num")]
    pub ordinal: u32,
    #[serde(rename = "path")]
    pub source_path: String,
    #[serde(rename = "name")]
    pub file_name: String,
    #[serde(rename = "type")]
    pub file_type: String,
}

/// Identity and metadata shared by every chunk of one file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: DocumentId,
    pub path: PathBuf,
    pub file_name: String,
    pub file_type: String,
}

impl SourceFile {
    pub fn new(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy().to_string();
        let file_type = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Some(Self {
            id: DocumentId::from_path(path),
            path: path.to_path_buf(),
            file_name,
            file_type,
        })
    }

    pub fn document(&self, ordinal: u32, content: String) -> ChunkDocument {
        ChunkDocument {
            content,
            ordinal,
            source_path: self.path.to_string_lossy().to_string(),
            file_name: self.file_name.clone(),
            file_type: self.file_type.clone(),
        }
    }
}

/// What gets written for one file after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexPlan {
    /// Nothing could be extracted. A single empty document at ordinal 0 marks the
    /// file as visited so later runs skip it.
    Placeholder,
    /// Chunking disabled: the whole text at ordinal 0.
    Whole(String),
    /// Chunks numbered from 1.
    Chunks(Vec<String>),
}

impl IndexPlan {
    pub fn into_documents(self, source: &SourceFile) -> Vec<ChunkDocument> {
        match self {
            IndexPlan::Placeholder => vec![source.document(0, String::new())],
            IndexPlan::Whole(text) => vec![source.document(0, text)],
            IndexPlan::Chunks(chunks) => chunks
                .into_iter()
                .zip(1u32..)
                .map(|(chunk, ordinal)| source.document(ordinal, chunk))
                .collect(),
        }
    }
}

/// Include/exclude regular expressions. `None` or an empty string permits everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatterns {
    pub include_file: Option<String>,
    pub exclude_file: Option<String>,
    pub include_dir: Option<String>,
    pub exclude_dir: Option<String>,
    pub include_path: Option<String>,
    pub exclude_path: Option<String>,
}

pub const DEFAULT_INCLUDE_FILE: &str = r".*\.(doc|docx|pdf|htm|html)$";
pub const DEFAULT_EXCLUDE_DIR: &str = r"^(\.|~|sdk)";
pub const DEFAULT_HTML_EXTENSION: &str = "htm?";
pub const DEFAULT_CHUNK_SIZE: usize = 3_000;

#[derive(Debug, Clone)]
pub struct IndexerOptions {
    pub source: PathBuf,
    pub filters: FilterPatterns,
    /// Values of 0 and 1 disable chunking.
    pub chunk_size: usize,
    /// Walk and classify only; no extraction and no backend writes.
    pub dry_run: bool,
    /// Matched against the lowercase extension to enable the HTML fallback.
    pub html_extension_pattern: String,
    pub initial_backoff: Duration,
}

impl IndexerOptions {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    pub fn chunking_enabled(&self) -> bool {
        self.chunk_size > 1
    }

    /// The ordinal whose presence means the file was already indexed.
    pub fn probe_ordinal(&self) -> u32 {
        if self.chunking_enabled() {
            1
        } else {
            0
        }
    }
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            source: PathBuf::from("."),
            filters: FilterPatterns {
                include_file: Some(DEFAULT_INCLUDE_FILE.to_string()),
                exclude_dir: Some(DEFAULT_EXCLUDE_DIR.to_string()),
                ..FilterPatterns::default()
            },
            chunk_size: DEFAULT_CHUNK_SIZE,
            dry_run: false,
            html_extension_pattern: DEFAULT_HTML_EXTENSION.to_string(),
            initial_backoff: Duration::from_secs(1),
        }
    }
}
