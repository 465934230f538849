//! Record types and sizes used across allocator tests.

/// Chunk size small enough that a handful of requests exhausts it.
pub const TINY_CHUNK_WORDS: usize = 8;

/// Pool size small enough that a handful of items spills into a second pool.
pub const TINY_ITEMS_PER_POOL: usize = 4;

/// A search-frontier node: roughly what a waiting-queue entry carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchNode {
    pub state_hash: u64,
    pub depth: u32,
    pub parent: Option<u32>,
}

impl SearchNode {
    pub fn new(state_hash: u64, depth: u32) -> Self {
        Self {
            state_hash,
            depth,
            parent: None,
        }
    }
}

/// An explored-state record holding a few zone bounds inline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneRecord {
    pub location: u32,
    pub bounds: [i32; 9],
}

impl ZoneRecord {
    /// A record whose bounds are `seed, seed + 1, ...`.
    pub fn seeded(location: u32, seed: i32) -> Self {
        let mut bounds = [0; 9];
        for (i, b) in bounds.iter_mut().enumerate() {
            *b = seed + i as i32;
        }
        Self { location, bounds }
    }
}

/// An item too small to hold a free-list link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TinyItem(pub u16);
