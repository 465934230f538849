//! Read-only allocator statistics.
//!
//! [`AllocStats`] and [`ItemPoolStats`] are plain snapshots of allocator
//! state. Their `Display` impls are the human-readable reports written by
//! `print_stats`; the text is for people, not parsers.

use std::fmt;

/// Free-list occupancy for one size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeClassStats {
    /// Block size in words.
    pub words: usize,
    /// Number of blocks waiting on the free list.
    pub free_blocks: usize,
}

/// Snapshot of a [`SizeClassAllocator`](crate::SizeClassAllocator).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllocStats {
    /// Number of chunks held.
    pub chunk_count: usize,
    /// Configured chunk size in words.
    pub chunk_words: usize,
    /// Total capacity across all chunks in words.
    pub capacity_words: usize,
    /// Sum of carved block sizes in words.
    pub carved_words: usize,
    /// Outstanding allocations.
    pub live_allocations: usize,
    /// Current epoch (number of resets so far, wrapping).
    pub epoch: u32,
    /// Per-size free lists, ascending by size. Empty lists are omitted.
    pub free_lists: Vec<SizeClassStats>,
}

impl AllocStats {
    /// Total number of free blocks across all size classes.
    pub fn free_blocks(&self) -> usize {
        self.free_lists.iter().map(|s| s.free_blocks).sum()
    }

    /// Total number of free words across all size classes.
    pub fn free_words(&self) -> usize {
        self.free_lists.iter().map(|s| s.words * s.free_blocks).sum()
    }

    /// Memory held in chunks, in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.capacity_words * std::mem::size_of::<zonal_core::Word>()
    }
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "size-class allocator (epoch {})", self.epoch)?;
        writeln!(
            f,
            "  chunks: {} x {} words ({} words, {} bytes)",
            self.chunk_count,
            self.chunk_words,
            self.capacity_words,
            self.memory_bytes()
        )?;
        writeln!(f, "  carved: {} words", self.carved_words)?;
        writeln!(f, "  live allocations: {}", self.live_allocations)?;
        if self.free_lists.is_empty() {
            writeln!(f, "  free lists: empty")
        } else {
            writeln!(
                f,
                "  free lists: {} blocks, {} words",
                self.free_blocks(),
                self.free_words()
            )?;
            for class in &self.free_lists {
                writeln!(f, "    [{:>8} words] {}", class.words, class.free_blocks)?;
            }
            Ok(())
        }
    }
}

/// Snapshot of a [`FixedItemPool`](crate::FixedItemPool).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ItemPoolStats {
    /// Number of pools held.
    pub pool_count: usize,
    /// Cells per pool.
    pub items_per_pool: usize,
    /// Occupied cells.
    pub live_items: usize,
    /// Vacant cells.
    pub free_items: usize,
    /// Size of one cell in bytes.
    pub cell_bytes: usize,
}

impl ItemPoolStats {
    /// Memory held in pools, in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.pool_count * self.items_per_pool * self.cell_bytes
    }
}

impl fmt::Display for ItemPoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "item pool")?;
        writeln!(
            f,
            "  pools: {} x {} cells ({} bytes)",
            self.pool_count,
            self.items_per_pool,
            self.memory_bytes()
        )?;
        writeln!(f, "  live items: {}", self.live_items)?;
        writeln!(f, "  free items: {}", self.free_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_totals_sum_classes() {
        let stats = AllocStats {
            free_lists: vec![
                SizeClassStats {
                    words: 3,
                    free_blocks: 2,
                },
                SizeClassStats {
                    words: 10,
                    free_blocks: 1,
                },
            ],
            ..AllocStats::default()
        };
        assert_eq!(stats.free_blocks(), 3);
        assert_eq!(stats.free_words(), 16);
    }

    #[test]
    fn report_lists_each_size_class() {
        let stats = AllocStats {
            chunk_count: 2,
            chunk_words: 8,
            capacity_words: 16,
            carved_words: 12,
            live_allocations: 3,
            epoch: 0,
            free_lists: vec![SizeClassStats {
                words: 3,
                free_blocks: 1,
            }],
        };
        let report = stats.to_string();
        assert!(report.contains("chunks: 2 x 8 words"));
        assert!(report.contains("live allocations: 3"));
        assert!(report.contains("[       3 words] 1"));
    }

    #[test]
    fn empty_report_says_so() {
        let report = AllocStats::default().to_string();
        assert!(report.contains("free lists: empty"));
    }

    #[test]
    fn item_pool_memory_accounts_for_cells() {
        let stats = ItemPoolStats {
            pool_count: 2,
            items_per_pool: 4,
            live_items: 5,
            free_items: 3,
            cell_bytes: 16,
        };
        assert_eq!(stats.memory_bytes(), 128);
        assert!(stats.to_string().contains("live items: 5"));
    }
}
