//! Benchmark workloads for the Zonal allocators.
//!
//! Provides seeded allocate/free traces shaped like a zone-graph search:
//!
//! - [`search_profile`]: matrix sizes for 2..=6 clocks, frees slightly
//!   rarer than allocations so the explored set keeps growing
//! - [`steady_profile`]: balanced churn around a fixed working set
//! - [`generate_trace`]: expand a profile into a concrete op list
//! - [`replay_words`] / [`replay_items`]: drive an allocator with a trace

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use zonal_alloc::FixedItemPool;
use zonal_core::WordAllocator;

/// Shape of a synthetic allocation trace.
#[derive(Clone, Debug, PartialEq)]
pub struct ChurnProfile {
    /// Number of operations in the trace.
    pub ops: usize,
    /// Probability that a step frees a live block instead of allocating.
    pub free_ratio: f64,
    /// Block sizes in words, drawn uniformly.
    pub sizes: Vec<usize>,
}

/// One step of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceOp {
    /// Allocate a block of this many words.
    Alloc(usize),
    /// Free the live block at this index of the replayer's live list.
    Free(usize),
}

/// Zone-graph search: DBM sizes `(d + 1)^2` for `d` in `2..=6`.
pub fn search_profile(ops: usize) -> ChurnProfile {
    ChurnProfile {
        ops,
        free_ratio: 0.4,
        sizes: (2..=6).map(|d: usize| (d + 1) * (d + 1)).collect(),
    }
}

/// Balanced churn: the live set hovers around a constant size.
pub fn steady_profile(ops: usize) -> ChurnProfile {
    ChurnProfile {
        ops,
        free_ratio: 0.5,
        sizes: vec![16, 25],
    }
}

/// Expand `profile` into a deterministic trace.
///
/// Every `Free` index is valid for the live list a replayer maintains
/// with `swap_remove`.
pub fn generate_trace(profile: &ChurnProfile, seed: u64) -> Vec<TraceOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut live = 0usize;
    let mut trace = Vec::with_capacity(profile.ops);
    for _ in 0..profile.ops {
        if live > 0 && rng.gen_bool(profile.free_ratio) {
            trace.push(TraceOp::Free(rng.gen_range(0..live)));
            live -= 1;
        } else {
            let words = profile.sizes[rng.gen_range(0..profile.sizes.len())];
            trace.push(TraceOp::Alloc(words));
            live += 1;
        }
    }
    trace
}

/// Replay a trace against a word allocator, touching the first word of
/// every new block. Returns the blocks still live at the end.
pub fn replay_words<A: WordAllocator>(alloc: &mut A, trace: &[TraceOp]) -> usize {
    let mut live = Vec::new();
    for &op in trace {
        match op {
            TraceOp::Alloc(words) => {
                let Ok(h) = alloc.allocate(words) else {
                    break;
                };
                if let Some(data) = alloc.words_mut(h, words) {
                    data[0] = words as u32;
                }
                live.push((h, words));
            }
            TraceOp::Free(i) => {
                let (h, words) = live.swap_remove(i);
                alloc.deallocate(h, words);
            }
        }
    }
    let remaining = live.len();
    for (h, words) in live {
        alloc.deallocate(h, words);
    }
    remaining
}

/// Replay a trace against an item pool; `Alloc` sizes seed the item.
pub fn replay_items(pool: &mut FixedItemPool<[u64; 4]>, trace: &[TraceOp]) -> usize {
    let mut live = Vec::new();
    for &op in trace {
        match op {
            TraceOp::Alloc(words) => {
                let Ok(h) = pool.allocate([words as u64; 4]) else {
                    break;
                };
                live.push(h);
            }
            TraceOp::Free(i) => {
                let h = live.swap_remove(i);
                pool.deallocate(h);
            }
        }
    }
    let remaining = live.len();
    for h in live {
        pool.deallocate(h);
    }
    remaining
}

/// Replay a trace with one `Box` per item, the baseline for
/// [`replay_items`].
pub fn replay_boxed(trace: &[TraceOp]) -> usize {
    let mut live: Vec<Box<[u64; 4]>> = Vec::new();
    for &op in trace {
        match op {
            TraceOp::Alloc(words) => live.push(Box::new([words as u64; 4])),
            TraceOp::Free(i) => drop(live.swap_remove(i)),
        }
    }
    live.len()
}
