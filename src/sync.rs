// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use url::Url;

use crate::episode::download_episode;
use crate::error::SyncError;
use crate::feed::{Episode, Podcast, fetch_feed, is_url, parse_feed_file};
use crate::http::HttpClient;
use crate::inventory::{InventoryEntry, InventorySnapshot, clean_partial_files};
use crate::layout::{DEFAULT_SHARD_CAPACITY, LayoutConfig, ShorteningRules, plan_assignments, shorten_title};
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Podcast names are capped independently of any filename budget
const ROOT_NAME_MAX_LEN: usize = 100;

/// Options for a podcast sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Number of newest episodes considered from the feed
    pub max_episodes: usize,
    /// Hard bound on generated filenames, extension included
    pub max_filename_length: Option<usize>,
    /// Maximum episodes per folder
    pub shard_capacity: usize,
    /// Stop-word and abbreviation table for slug shortening
    pub rules: ShorteningRules,
}

impl SyncOptions {
    fn layout_config(&self, root_name: String) -> LayoutConfig {
        LayoutConfig {
            max_episodes: self.max_episodes,
            max_filename_length: self.max_filename_length,
            shard_capacity: self.shard_capacity,
            root_name,
            rules: self.rules.clone(),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_episodes: 30,
            max_filename_length: None,
            shard_capacity: DEFAULT_SHARD_CAPACITY,
            rules: ShorteningRules::default(),
        }
    }
}

/// Result of a sync operation
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub podcast_title: String,
    /// Episodes successfully downloaded this run
    pub downloaded: usize,
    /// Episodes skipped because they were already on disk
    pub skipped: usize,
    /// Episodes that failed to download
    pub failed: usize,
    /// Details of failed episodes (title, error message)
    pub failed_episodes: Vec<(String, String)>,
}

struct DownloadTask {
    identity: String,
    title: String,
    relative_path: PathBuf,
    url: Url,
    content_length: Option<u64>,
}

/// Synchronize a podcast feed into `output_dir`.
///
/// This is the main entry point for the library. It:
/// 1. Fetches and parses the feed, keeping the newest `max_episodes`
/// 2. Loads the inventory and cleans up stray partial files
/// 3. Runs the naming engine: prior assignments are reused, new episodes
///    get folder/filename pairs
/// 4. Downloads missing episodes one at a time, persisting the inventory
///    after each confirmed download
/// 5. Renders the README listing
pub async fn sync_podcast<C: HttpClient>(
    client: &C,
    feed_source: &str,
    output_dir: &Path,
    options: &SyncOptions,
    reporter: SharedProgressReporter,
) -> Result<SyncResult, SyncError> {
    // Configuration errors are fatal before any network or filesystem work.
    // The real root name comes from the feed title later and is never empty
    // (the shortening unit has a fallback), so a placeholder stands in for
    // the non-empty check here.
    options.layout_config("podcast".to_string()).validate()?;

    let podcast = if is_url(feed_source) {
        reporter.report(ProgressEvent::FetchingFeed {
            url: feed_source.to_string(),
        });
        fetch_feed(client, feed_source).await?
    } else {
        parse_feed_file(Path::new(feed_source))?
    };

    let episodes = newest_entries(&podcast, options.max_episodes);

    let config = options.layout_config(shorten_title(
        &podcast.title,
        Some(ROOT_NAME_MAX_LEN),
        &options.rules,
    ));

    let mut snapshot = InventorySnapshot::load(output_dir)?;

    let cleaned = clean_partial_files(output_dir)?;
    if cleaned > 0 {
        reporter.report(ProgressEvent::PartialFilesCleanedUp { count: cleaned });
    }

    let enclosures: HashMap<String, (Url, Option<u64>)> = episodes
        .iter()
        .map(|e| {
            (
                e.identity.clone(),
                (e.enclosure.url.clone(), e.enclosure.length),
            )
        })
        .collect();

    // Compute and record assignments for everything new. Recording happens
    // before downloading so that a failed attempt keeps its final name for
    // the next run; the downloaded flag stays false until bytes are on disk.
    let planned = plan_assignments(episodes, &snapshot.assignments(), &config)?;
    for p in &planned {
        snapshot.push(InventoryEntry::planned(p));
    }
    snapshot.save(output_dir)?;

    // Entries absent from the current feed fall back to their stored URL; a
    // stored URL that no longer parses is a per-episode failure, not a skip.
    let mut failed_episodes: Vec<(String, String)> = Vec::new();
    let mut tasks: Vec<DownloadTask> = Vec::new();
    for entry in snapshot.iter().filter(|entry| !entry.downloaded) {
        let (url, content_length) = match enclosures.get(&entry.assignment.identity) {
            Some((url, length)) => (url.clone(), *length),
            None => match Url::parse(&entry.source_url) {
                Ok(url) => (url, None),
                Err(e) => {
                    failed_episodes
                        .push((entry.title.clone(), format!("invalid stored URL: {e}")));
                    continue;
                }
            },
        };
        tasks.push(DownloadTask {
            identity: entry.assignment.identity.clone(),
            title: entry.title.clone(),
            relative_path: entry.relative_path(),
            url,
            content_length,
        });
    }

    let skipped = snapshot.len() - tasks.len() - failed_episodes.len();
    reporter.report(ProgressEvent::PlanReady {
        podcast_title: podcast.title.clone(),
        total_episodes: snapshot.len(),
        new_episodes: tasks.len(),
    });

    let mut downloaded = 0;
    let total_to_download = tasks.len();

    for (index, task) in tasks.into_iter().enumerate() {
        let target = output_dir.join(&task.relative_path);

        // A file already in place means a prior run crashed between the
        // rename and the inventory save; trust the bytes.
        if target.exists() {
            snapshot.mark_downloaded(&task.identity, None);
            snapshot.save(output_dir)?;
            downloaded += 1;
            continue;
        }

        if let Some(folder) = target.parent() {
            std::fs::create_dir_all(folder).map_err(|e| {
                crate::error::InventoryError::CreateDirectoryFailed {
                    path: folder.to_path_buf(),
                    source: e,
                }
            })?;
        }

        reporter.report(ProgressEvent::DownloadStarting {
            episode_title: task.title.clone(),
            relative_path: task.relative_path.display().to_string(),
            episode_index: index,
            total_to_download,
            content_length: task.content_length,
        });

        match download_episode(client, &task.url, &target, |event| reporter.report(event)).await {
            Ok(result) => {
                snapshot.mark_downloaded(&task.identity, Some(result.content_hash));
                snapshot.save(output_dir)?;
                downloaded += 1;
                reporter.report(ProgressEvent::DownloadCompleted {
                    episode_title: task.title.clone(),
                    bytes_downloaded: result.bytes_downloaded,
                });
            }
            Err(e) => {
                reporter.report(ProgressEvent::DownloadFailed {
                    episode_title: task.title.clone(),
                    error: e.to_string(),
                });
                failed_episodes.push((task.title, e.to_string()));
            }
        }
    }

    snapshot.write_readme(
        output_dir,
        &podcast.title,
        podcast.feed_url.as_str(),
        podcast.description.as_deref(),
    )?;

    let failed = failed_episodes.len();
    reporter.report(ProgressEvent::SyncCompleted {
        downloaded_count: downloaded,
        skipped_count: skipped,
        failed_count: failed,
    });

    Ok(SyncResult {
        podcast_title: podcast.title,
        downloaded,
        skipped,
        failed,
        failed_episodes,
    })
}

/// Keep the newest `limit` feed entries, taken in feed order before any
/// chronological normalization (feeds list newest first); the naming engine
/// normalizes the survivors exactly once
fn newest_entries(podcast: &Podcast, limit: usize) -> Vec<Episode> {
    podcast.episodes.iter().take(limit).cloned().collect()
}
