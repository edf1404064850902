use chrono::Utc;
use clap::{Parser, Subcommand};
use fs_indexer_core::{
    ElasticsearchStore, FilterPatterns, FsIndexer, IndexerOptions, StoreConfig,
    DEFAULT_CHUNK_SIZE, DEFAULT_EXCLUDE_DIR, DEFAULT_HTML_EXTENSION, DEFAULT_INCLUDE_FILE,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fs-indexer", version, about = "File System Indexer")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Folder or file to index recursively
    #[arg(short, long, env = "FS_INDEXER_SOURCE")]
    source: PathBuf,

    /// Include file regular expression (matched against the file name)
    #[arg(
        long,
        alias = "includeFile",
        env = "FS_INDEXER_INCLUDE_FILE",
        default_value = DEFAULT_INCLUDE_FILE
    )]
    include_file: Option<String>,

    /// Exclude file regular expression (matched against the file name)
    #[arg(long, alias = "excludeFile", env = "FS_INDEXER_EXCLUDE_FILE")]
    exclude_file: Option<String>,

    /// Include dir regular expression (matched against the directory name)
    #[arg(long, alias = "includeDir", env = "FS_INDEXER_INCLUDE_DIR")]
    include_dir: Option<String>,

    /// Exclude dir regular expression (matched against the directory name)
    #[arg(
        long,
        alias = "excludeDir",
        env = "FS_INDEXER_EXCLUDE_DIR",
        default_value = DEFAULT_EXCLUDE_DIR
    )]
    exclude_dir: Option<String>,

    /// Include path regular expression (matched against the full path)
    #[arg(long, alias = "includePath", env = "FS_INDEXER_INCLUDE_PATH")]
    include_path: Option<String>,

    /// Exclude path regular expression (matched against the full path)
    #[arg(long, alias = "excludePath", env = "FS_INDEXER_EXCLUDE_PATH")]
    exclude_path: Option<String>,

    /// Elasticsearch URL
    #[arg(
        long,
        alias = "esURL",
        env = "FS_INDEXER_ELASTICSEARCH_URL",
        default_value = "http://localhost:9200"
    )]
    elasticsearch_url: String,

    /// Elasticsearch user
    #[arg(long, alias = "esUser", env = "FS_INDEXER_ELASTICSEARCH_USER", default_value = "elastic")]
    elasticsearch_user: String,

    /// Elasticsearch password
    #[arg(
        long,
        alias = "esPassword",
        env = "FS_INDEXER_ELASTICSEARCH_PASSWORD",
        default_value = "changeme"
    )]
    elasticsearch_password: String,

    /// Elasticsearch index name
    #[arg(long, alias = "esI", env = "FS_INDEXER_ELASTICSEARCH_INDEX", default_value = "fs")]
    elasticsearch_index: String,

    /// Chunk size for an indexed document; 0 or 1 indexes whole documents
    #[arg(short, long, env = "FS_INDEXER_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Extensions that get the HTML fallback when conversion yields nothing
    #[arg(long, env = "FS_INDEXER_HTML_EXTENSIONS", default_value = DEFAULT_HTML_EXTENSION)]
    html_extensions: String,

    /// First wait in milliseconds after the backend reports overload
    #[arg(long, env = "FS_INDEXER_BACKOFF_MS", default_value_t = 1_000)]
    backoff_ms: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Start indexing.
    Index {
        /// Only traverse and classify, without extracting or indexing.
        #[arg(long, visible_alias = "nop", alias = "noOperation", default_value_t = false)]
        no_operation: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "fs-indexer boot"
    );

    match cli.command {
        Command::Index { no_operation } => {
            info!(
                source = %cli.source.display(),
                include_file = ?cli.include_file,
                exclude_file = ?cli.exclude_file,
                include_dir = ?cli.include_dir,
                exclude_dir = ?cli.exclude_dir,
                include_path = ?cli.include_path,
                exclude_path = ?cli.exclude_path,
                es_url = %cli.elasticsearch_url,
                es_index = %cli.elasticsearch_index,
                "index"
            );

            let options = IndexerOptions {
                source: cli.source,
                filters: FilterPatterns {
                    include_file: cli.include_file,
                    exclude_file: cli.exclude_file,
                    include_dir: cli.include_dir,
                    exclude_dir: cli.exclude_dir,
                    include_path: cli.include_path,
                    exclude_path: cli.exclude_path,
                },
                chunk_size: cli.chunk_size,
                dry_run: no_operation,
                html_extension_pattern: cli.html_extensions,
                initial_backoff: Duration::from_millis(cli.backoff_ms),
            };

            let store = ElasticsearchStore::new(StoreConfig {
                url: cli.elasticsearch_url,
                username: Some(cli.elasticsearch_user),
                password: Some(cli.elasticsearch_password),
                index_name: cli.elasticsearch_index,
            })
            .map_err(|error| anyhow::anyhow!("cannot build elasticsearch client: {error}"))?;

            let indexer = FsIndexer::with_native_extraction(options, Arc::new(store))
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let report = indexer
                .run()
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            if report.walk_errors > 0 || report.files_failed > 0 || report.chunks_failed > 0 {
                warn!(
                    walk_errors = report.walk_errors,
                    files_failed = report.files_failed,
                    chunks_failed = report.chunks_failed,
                    "index completed with errors"
                );
            }

            info!(
                directories = report.directories_visited,
                directories_pruned = report.directories_pruned,
                files = report.files_visited,
                files_filtered = report.files_filtered,
                special_entries = report.special_entries,
                already_indexed = report.files_already_indexed,
                indexed = report.files_indexed,
                placeholders = report.placeholders,
                chunks = report.chunks_published,
                dry_run = no_operation,
                "index completed"
            );

            println!(
                "{} files indexed ({} chunks, {} skipped as already indexed) at {}",
                report.files_indexed,
                report.chunks_published,
                report.files_already_indexed,
                Utc::now().to_rfc3339()
            );
        }
    }

    Ok(())
}
