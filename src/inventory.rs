use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::layout::{Assignment, PlannedEpisode};

const INVENTORY_FILENAME: &str = "inventory.json";
const README_FILENAME: &str = "README.md";

/// One inventoried episode: its Assignment plus download bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pub_date: Option<String>,
    pub source_url: String,
    #[serde(flatten)]
    pub assignment: Assignment,
    pub downloaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl InventoryEntry {
    /// A freshly assigned, not-yet-downloaded entry
    pub fn planned(planned: &PlannedEpisode) -> Self {
        Self {
            title: planned.episode.title.clone(),
            pub_date: planned.episode.pub_date.map(|dt| dt.to_rfc3339()),
            source_url: planned.episode.enclosure.url.to_string(),
            assignment: planned.assignment.clone(),
            downloaded: false,
            downloaded_at: None,
            content_hash: None,
        }
    }

    /// Path of the audio file relative to the output directory
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.assignment.folder_name).join(&self.assignment.file_name)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct InventoryFile {
    version: u32,
    entries: Vec<InventoryEntry>,
}

/// The persisted state of a podcast directory: every Assignment ever made,
/// in ascending publish order, with per-episode download flags.
///
/// Entries are append-only; removal of an episode from the feed does not
/// retract its entry.
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    entries: Vec<InventoryEntry>,
    by_identity: HashMap<String, usize>,
}

impl InventorySnapshot {
    /// Load the snapshot from `output_dir`, empty if no inventory exists yet
    pub fn load(output_dir: &Path) -> Result<Self, InventoryError> {
        let path = output_dir.join(INVENTORY_FILENAME);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&path).map_err(|e| InventoryError::ReadFailed {
                path: path.clone(),
                source: e,
            })?;

        let file: InventoryFile = serde_json::from_str(&content)
            .map_err(|e| InventoryError::JsonParseFailed { path, source: e })?;

        let mut snapshot = Self::default();
        for entry in file.entries {
            snapshot.push(entry);
        }
        Ok(snapshot)
    }

    /// Persist the snapshot into `output_dir`, creating it if needed
    pub fn save(&self, output_dir: &Path) -> Result<(), InventoryError> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            InventoryError::CreateDirectoryFailed {
                path: output_dir.to_path_buf(),
                source: e,
            }
        })?;

        let file = InventoryFile {
            version: 1,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        let path = output_dir.join(INVENTORY_FILENAME);
        std::fs::write(&path, json).map_err(|e| InventoryError::WriteFailed { path, source: e })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&InventoryEntry> {
        self.by_identity.get(identity).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.entries.iter()
    }

    /// All prior Assignments, in publish order, as naming-engine input
    pub fn assignments(&self) -> Vec<Assignment> {
        self.entries.iter().map(|e| e.assignment.clone()).collect()
    }

    /// Append an entry; later duplicates of an identity are ignored
    pub fn push(&mut self, entry: InventoryEntry) {
        if self.by_identity.contains_key(&entry.assignment.identity) {
            return;
        }
        self.by_identity
            .insert(entry.assignment.identity.clone(), self.entries.len());
        self.entries.push(entry);
    }

    /// Record a confirmed download for `identity`
    pub fn mark_downloaded(&mut self, identity: &str, content_hash: Option<String>) {
        if let Some(&i) = self.by_identity.get(identity) {
            let entry = &mut self.entries[i];
            entry.downloaded = true;
            entry.downloaded_at = Some(Utc::now().to_rfc3339());
            entry.content_hash = content_hash;
        }
    }

    /// Render the human-readable README listing, in the style of a checklist:
    /// checked entries are on disk, unchecked ones are known but not fetched.
    pub fn render_readme(
        &self,
        podcast_title: &str,
        feed_url: &str,
        description: Option<&str>,
    ) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {podcast_title}\n\n"));
        out.push_str(&format!("**Feed URL:** {feed_url}\n\n"));
        out.push_str(&format!(
            "**Last updated:** {}\n\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        ));
        if let Some(description) = description {
            out.push_str(&format!("**Description:**\n{description}\n\n"));
        }
        out.push_str("---\n\n## Episodes\n\n");

        for entry in &self.entries {
            let mark = if entry.downloaded { 'x' } else { ' ' };
            out.push_str(&format!("- [{mark}] {}", entry.title));
            if let Some(ref date) = entry.pub_date {
                out.push_str(&format!(" ({date})"));
            }
            out.push_str(&format!(" — `{}`\n", entry.relative_path().display()));
        }

        out
    }

    /// Write the rendered README into `output_dir`
    pub fn write_readme(
        &self,
        output_dir: &Path,
        podcast_title: &str,
        feed_url: &str,
        description: Option<&str>,
    ) -> Result<(), InventoryError> {
        let path = output_dir.join(README_FILENAME);
        let content = self.render_readme(podcast_title, feed_url, description);
        std::fs::write(&path, content)
            .map_err(|e| InventoryError::WriteFailed { path, source: e })
    }
}

/// Remove stray `.partial` files left by interrupted downloads.
///
/// Walks the output directory and its immediate shard folders; returns how
/// many files were removed.
pub fn clean_partial_files(output_dir: &Path) -> Result<usize, InventoryError> {
    if !output_dir.exists() {
        return Ok(0);
    }

    let mut cleaned = 0;
    let mut dirs = vec![output_dir.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| InventoryError::ScanFailed {
            path: dir.clone(),
            source: e,
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| InventoryError::ScanFailed {
                path: dir.clone(),
                source: e,
            })?;
            let path = entry.path();

            if path.is_dir() {
                // Shard folders are direct children; the layout never nests
                if dir == output_dir {
                    dirs.push(path);
                }
            } else if path
                .extension()
                .is_some_and(|ext| ext == "partial")
                && std::fs::remove_file(&path).is_ok()
            {
                cleaned += 1;
            }
        }
    }

    Ok(cleaned)
}
