pub mod episode;
pub mod error;
pub mod feed;
pub mod http;
pub mod inventory;
pub mod layout;
pub mod progress;
pub mod sync;

// Re-export main types for convenience
pub use episode::{DownloadResult, download_episode};
pub use error::{ConfigError, DownloadError, FeedError, InventoryError, NamingError, SyncError};
pub use feed::{Enclosure, Episode, Podcast, fetch_feed, is_url, parse_feed, parse_feed_file};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use inventory::{InventoryEntry, InventorySnapshot};
pub use layout::{
    Assignment, LayoutConfig, ShorteningRules, plan_assignments, shorten_title,
};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use sync::{SyncOptions, SyncResult, sync_podcast};
