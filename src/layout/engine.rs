use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::NamingError;
use crate::feed::{Episode, normalize_chronological};
use crate::layout::shard::ShardLayout;
use crate::layout::slug::shorten_title;
use crate::layout::LayoutConfig;

/// Length of the longest supported audio extension (`opus`, `flac`)
pub(crate) const MAX_EXTENSION_LEN: usize = 4;

/// The persisted, idempotent mapping of one episode to one (folder, filename)
/// pair. Created once and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub identity: String,
    pub shard_index: usize,
    pub local_index: usize,
    pub folder_name: String,
    pub file_name: String,
    /// Base slug (before any collision suffix), kept so re-runs can rebuild
    /// the per-folder collision sets without parsing filenames
    pub slug: String,
}

/// A newly assigned episode, ready for the download step
#[derive(Debug, Clone)]
pub struct PlannedEpisode {
    pub episode: Episode,
    pub assignment: Assignment,
}

/// Compute assignments for episodes not present in `prior`.
///
/// Pure function: no state is held across calls beyond what `prior` carries.
/// Episodes already assigned keep their Assignment untouched regardless of
/// where the feed now lists them; new episodes are appended after all known
/// ones, in ascending publish order. The returned list contains only the new
/// episodes, oldest first.
pub fn plan_assignments(
    episodes: Vec<Episode>,
    prior: &[Assignment],
    config: &LayoutConfig,
) -> Result<Vec<PlannedEpisode>, NamingError> {
    config.validate()?;

    let episodes = normalize_chronological(episodes);

    let known: HashSet<&str> = prior.iter().map(|a| a.identity.as_str()).collect();

    let mut seen: HashSet<String> = HashSet::new();
    let new_episodes: Vec<Episode> = episodes
        .into_iter()
        .filter(|e| !known.contains(e.identity.as_str()) && seen.insert(e.identity.clone()))
        .collect();

    let total = prior.len() + new_episodes.len();
    let layout = ShardLayout::new(config.shard_capacity, config.max_episodes.max(total));

    // Folder names recorded in prior runs win over recomputed ones; in
    // particular an unprefixed folder created while under capacity stays as
    // shard 0 forever.
    let mut folders: HashMap<usize, String> = HashMap::new();
    for assignment in prior {
        folders
            .entry(assignment.shard_index)
            .or_insert_with(|| assignment.folder_name.clone());
    }
    let sharded = total > config.shard_capacity || folders.keys().any(|&s| s > 0);

    let mut used_slugs: HashMap<String, HashSet<String>> = HashMap::new();
    for assignment in prior {
        used_slugs
            .entry(assignment.folder_name.clone())
            .or_default()
            .insert(assignment.slug.clone());
    }

    let mut planned = Vec::with_capacity(new_episodes.len());

    for (offset, episode) in new_episodes.into_iter().enumerate() {
        let position = prior.len() + offset;
        let slot = layout.slot_for(position);

        let folder_name = folders
            .entry(slot.shard)
            .or_insert_with(|| {
                if sharded {
                    layout.sharded_folder_name(slot.shard, &config.root_name)
                } else {
                    config.root_name.clone()
                }
            })
            .clone();

        let extension = audio_extension(&episode);
        let budget = config.max_filename_length.map(|max| {
            // local index + '_' + slug + '.' + extension
            max - layout.local_width() - 1 - extension.len() - 1
        });

        let base = shorten_title(&episode.title, budget, &config.rules);
        let folder_slugs = used_slugs.entry(folder_name.clone()).or_default();
        let slug = disambiguate(&base, budget, folder_slugs).ok_or_else(|| {
            NamingError::CollisionExhausted {
                folder: folder_name.clone(),
                title: episode.title.clone(),
            }
        })?;
        folder_slugs.insert(slug.clone());

        let file_name = format!("{}_{}.{}", layout.format_local(slot.local), slug, extension);

        planned.push(PlannedEpisode {
            assignment: Assignment {
                identity: episode.identity.clone(),
                shard_index: slot.shard,
                local_index: slot.local,
                folder_name,
                file_name,
                slug,
            },
            episode,
        });
    }

    Ok(planned)
}

/// Resolve a slug against the set already used in its folder.
///
/// The first free candidate wins: the base itself, then `base-2`, `base-3`,
/// and so on. Under a budget, the suffix takes priority and the base is
/// truncated further to make room; once no room is left for even one base
/// character the space is exhausted.
fn disambiguate(base: &str, budget: Option<usize>, used: &HashSet<String>) -> Option<String> {
    if !used.contains(base) {
        return Some(base.to_string());
    }

    for n in 2usize.. {
        let suffix = format!("-{n}");
        let candidate = match budget {
            Some(budget) => {
                if budget <= suffix.len() {
                    return None;
                }
                let room = budget - suffix.len();
                let mut head = base.to_string();
                if head.len() > room {
                    head.truncate(room);
                    head = head
                        .trim_end_matches(|c| c == '_' || c == '-' || c == '.')
                        .to_string();
                }
                if head.is_empty() {
                    return None;
                }
                format!("{head}{suffix}")
            }
            None => format!("{base}{suffix}"),
        };
        if !used.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Audio extension for an episode, from its enclosure URL path or MIME type,
/// defaulting to `mp3`
fn audio_extension(episode: &Episode) -> String {
    if let Some(ext) = episode
        .enclosure
        .url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|filename| filename.rsplit('.').next())
        .filter(|ext| is_valid_audio_extension(ext))
    {
        return ext.to_lowercase();
    }

    if let Some(ref mime) = episode.enclosure.mime_type
        && let Some(ext) = mime_to_extension(mime)
    {
        return ext.to_string();
    }

    "mp3".to_string()
}

fn is_valid_audio_extension(ext: &str) -> bool {
    matches!(
        ext.to_lowercase().as_str(),
        "mp3" | "m4a" | "mp4" | "aac" | "ogg" | "opus" | "wav" | "flac"
    )
}

fn mime_to_extension(mime: &str) -> Option<&'static str> {
    match mime.to_lowercase().as_str() {
        "audio/mpeg" | "audio/mp3" => Some("mp3"),
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => Some("m4a"),
        "audio/aac" => Some("aac"),
        "audio/ogg" => Some("ogg"),
        "audio/opus" => Some("opus"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/flac" | "audio/x-flac" => Some("flac"),
        _ => None,
    }
}
