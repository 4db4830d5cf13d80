mod download;

pub use download::{DownloadResult, download_episode};
