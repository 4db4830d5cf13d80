use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while validating a [`LayoutConfig`](crate::layout::LayoutConfig).
///
/// These are surfaced before any assignment or I/O is attempted.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "max filename length {actual} is too small: at least {required} characters are needed \
         for the index prefix, separator, minimum slug and extension"
    )]
    BudgetTooSmall { required: usize, actual: usize },

    #[error("shard capacity must be at least 1")]
    InvalidShardCapacity,

    #[error("podcast root name is empty after sanitization")]
    EmptyRootName,
}

/// Errors raised by the naming engine while computing assignments
#[derive(Error, Debug)]
pub enum NamingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("collision disambiguation space exhausted in folder '{folder}' for episode '{title}'")]
    CollisionExhausted { folder: String, title: String },
}

/// Errors that can occur when fetching or parsing RSS feeds
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch feed from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read feed file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse RSS feed: {0}")]
    ParseFailed(#[from] rss::Error),

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Episode '{title}' has no enclosure (audio file)")]
    MissingEnclosure { title: String },
}

/// Errors that can occur during episode downloads
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} into place at {to}: {source}")]
    FinalizeFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors that can occur while loading or saving the inventory
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Failed to read inventory file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write inventory file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse inventory JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize inventory: {0}")]
    JsonSerializeFailed(#[from] serde_json::Error),

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to scan directory {path}: {source}")]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level errors for sync operations
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Naming error: {0}")]
    Naming(#[from] NamingError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),
}
