mod engine;
mod shard;
mod slug;

pub use engine::{Assignment, PlannedEpisode, plan_assignments};
pub use shard::{ShardLayout, Slot};
pub use slug::{ShorteningRules, sanitize, shorten_title, transliterate};

use crate::error::ConfigError;

/// Episodes per shard folder unless overridden
pub const DEFAULT_SHARD_CAPACITY: usize = 100;

/// Layout constraints for one run, supplied once and immutable.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Feed-fetch limit: number of newest episodes considered this run
    pub max_episodes: usize,
    /// Hard bound on a folder-relative filename, extension included
    pub max_filename_length: Option<usize>,
    /// Maximum number of episodes per folder
    pub shard_capacity: usize,
    /// Sanitized podcast name used for folder naming
    pub root_name: String,
    /// Stop-word and abbreviation table for slug shortening
    pub rules: ShorteningRules,
}

impl LayoutConfig {
    pub fn new(max_episodes: usize, root_name: impl Into<String>) -> Self {
        Self {
            max_episodes,
            max_filename_length: None,
            shard_capacity: DEFAULT_SHARD_CAPACITY,
            root_name: root_name.into(),
            rules: ShorteningRules::default(),
        }
    }

    /// Check the configuration before any assignment is attempted.
    ///
    /// A filename budget must leave room for the local index prefix, the
    /// separator, a floor-length slug, and the longest supported audio
    /// extension; anything smaller would fail mid-run on some episode.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_capacity == 0 {
            return Err(ConfigError::InvalidShardCapacity);
        }
        if self.root_name.is_empty() {
            return Err(ConfigError::EmptyRootName);
        }
        if let Some(max) = self.max_filename_length {
            let layout = ShardLayout::new(self.shard_capacity, self.max_episodes);
            let required = layout.local_width()
                + 1
                + self.rules.abbreviation_floor
                + 1
                + engine::MAX_EXTENSION_LEN;
            if max < required {
                return Err(ConfigError::BudgetTooSmall {
                    required,
                    actual: max,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        LayoutConfig::new(30, "My_Podcast").validate().unwrap();
    }

    #[test]
    fn zero_shard_capacity_is_rejected() {
        let mut config = LayoutConfig::new(30, "Pod");
        config.shard_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidShardCapacity)
        ));
    }

    #[test]
    fn empty_root_name_is_rejected() {
        let config = LayoutConfig::new(30, "");
        assert!(matches!(config.validate(), Err(ConfigError::EmptyRootName)));
    }

    #[test]
    fn too_small_filename_budget_is_rejected_up_front() {
        let mut config = LayoutConfig::new(30, "Pod");
        // capacity 100: "NN_" + 3-char slug + ".flac"-sized extension = 11
        config.max_filename_length = Some(10);
        match config.validate() {
            Err(ConfigError::BudgetTooSmall { required, actual }) => {
                assert_eq!(required, 11);
                assert_eq!(actual, 10);
            }
            other => panic!("expected BudgetTooSmall, got {other:?}"),
        }
    }

    #[test]
    fn minimum_viable_budget_passes() {
        let mut config = LayoutConfig::new(30, "Pod");
        config.max_filename_length = Some(11);
        config.validate().unwrap();
    }
}
