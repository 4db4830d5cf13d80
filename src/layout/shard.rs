/// Index and folder arithmetic for the sharded layout.
///
/// Positions are 0-based over *all episodes ever seen*, in ascending publish
/// order. Each shard folder holds at most `capacity` episodes; local indices
/// are zero-padded so byte-lexicographic filename order equals publish order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardLayout {
    capacity: usize,
    /// Digits of a local index, sized for a full shard so the still-growing
    /// current shard never needs its files renamed
    local_width: usize,
    /// Digits of a shard folder prefix, sized from the planned episode total
    prefix_width: usize,
}

/// A single episode slot: which shard folder and which position inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub shard: usize,
    pub local: usize,
}

impl ShardLayout {
    pub fn new(capacity: usize, max_episodes: usize) -> Self {
        let shards = max_episodes.div_ceil(capacity).max(1);
        Self {
            capacity,
            local_width: decimal_width(capacity.saturating_sub(1)),
            prefix_width: decimal_width(shards - 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn slot_for(&self, position: usize) -> Slot {
        Slot {
            shard: position / self.capacity,
            local: position % self.capacity,
        }
    }

    /// Zero-padded local index, e.g. `07` for capacity 100
    pub fn format_local(&self, local: usize) -> String {
        format!("{:0width$}", local, width = self.local_width)
    }

    /// Width of a formatted local index in characters
    pub fn local_width(&self) -> usize {
        self.local_width
    }

    /// Shard-prefixed sibling folder name, e.g. `1_My_Podcast`
    pub fn sharded_folder_name(&self, shard: usize, root_name: &str) -> String {
        format!(
            "{:0width$}_{root_name}",
            shard,
            width = self.prefix_width
        )
    }
}

fn decimal_width(n: usize) -> usize {
    let mut width = 1;
    let mut n = n / 10;
    while n > 0 {
        width += 1;
        n /= 10;
    }
    width
}
