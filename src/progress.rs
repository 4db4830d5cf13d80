use std::sync::Arc;

/// Events emitted during a sync run for progress reporting.
///
/// Downloads run one at a time, so events carry the episode's position in the
/// download queue rather than a slot id.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Feed is being fetched from URL
    FetchingFeed { url: String },

    /// Feed parsed and the naming plan computed
    PlanReady {
        podcast_title: String,
        total_episodes: usize,
        new_episodes: usize,
    },

    /// Stray partial files were removed during the output scan
    PartialFilesCleanedUp { count: usize },

    /// A download is starting
    DownloadStarting {
        episode_title: String,
        /// Destination relative to the output directory
        relative_path: String,
        episode_index: usize,
        total_to_download: usize,
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// A download completed and was moved into place
    DownloadCompleted {
        episode_title: String,
        bytes_downloaded: u64,
    },

    /// A download failed; the partial file has been removed
    DownloadFailed { episode_title: String, error: String },

    /// Sync operation completed
    SyncCompleted {
        downloaded_count: usize,
        skipped_count: usize,
        failed_count: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_handles_all_events() {
        let reporter = NoopReporter;

        reporter.report(ProgressEvent::FetchingFeed {
            url: "https://example.com/feed.xml".to_string(),
        });

        reporter.report(ProgressEvent::PlanReady {
            podcast_title: "Test Podcast".to_string(),
            total_episodes: 10,
            new_episodes: 5,
        });

        reporter.report(ProgressEvent::PartialFilesCleanedUp { count: 2 });

        reporter.report(ProgressEvent::DownloadStarting {
            episode_title: "Episode 1".to_string(),
            relative_path: "Pod/00_Episode_1.mp3".to_string(),
            episode_index: 0,
            total_to_download: 5,
            content_length: Some(1024),
        });

        reporter.report(ProgressEvent::DownloadProgress {
            bytes_downloaded: 512,
            total_bytes: Some(1024),
        });

        reporter.report(ProgressEvent::DownloadCompleted {
            episode_title: "Episode 1".to_string(),
            bytes_downloaded: 1024,
        });

        reporter.report(ProgressEvent::DownloadFailed {
            episode_title: "Episode 2".to_string(),
            error: "Connection timeout".to_string(),
        });

        reporter.report(ProgressEvent::SyncCompleted {
            downloaded_count: 4,
            skipped_count: 5,
            failed_count: 1,
        });
    }
}
