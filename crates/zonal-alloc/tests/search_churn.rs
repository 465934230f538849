//! Integration test: allocator behaviour under a search-like workload.
//!
//! A state-space search allocates many zone matrices of a handful of
//! dimensions, frees most of them as states are subsumed, and keeps a
//! long tail alive in the explored set. This drives each backend through
//! a seeded churn of that shape and checks that live blocks never
//! overlap, data written into a block survives until it is freed, and
//! the arena stops growing once free lists are warm.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use zonal_alloc::{
    AllocConfig, Backend, LeakCheckingAllocator, SizeClassAllocator, WordAllocator,
};
use zonal_test_utils::{init_test_logging, ShadowLedger};

/// Matrix sizes for 2..=6 clocks: (d + 1)^2 words.
const ZONE_SIZES: [usize; 5] = [9, 16, 25, 36, 49];

/// Run `steps` rounds of allocate/free against `alloc`, stamping every
/// block with a tag and checking it on release.
fn churn<A: WordAllocator>(alloc: &mut A, seed: u64, steps: usize) -> ShadowLedger {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ledger = ShadowLedger::new();
    // Tag of each ledger entry; both are compacted with swap_remove so
    // indices stay aligned.
    let mut tags: Vec<u32> = Vec::new();
    let mut next_tag = 1u32;

    for _ in 0..steps {
        if !ledger.is_empty() && rng.gen_bool(0.45) {
            let i = rng.gen_range(0..ledger.len());
            let (handle, words) = ledger.release_nth(i);
            let tag = tags.swap_remove(i);
            let data = alloc.words(handle, words).unwrap();
            assert!(data.iter().all(|&w| w == tag), "block {handle} was clobbered");
            alloc.try_deallocate(handle, words).unwrap();
        } else {
            let words = ZONE_SIZES[rng.gen_range(0..ZONE_SIZES.len())];
            let handle = alloc.allocate(words).unwrap();
            if let Err((other, n)) = ledger.record(handle, words) {
                panic!("{handle} ({words} words) overlaps live {other} ({n} words)");
            }
            alloc.words_mut(handle, words).unwrap().fill(next_tag);
            tags.push(next_tag);
            next_tag += 1;
        }
    }
    ledger
}

#[test]
fn arena_churn_never_overlaps() {
    init_test_logging();
    let mut a = SizeClassAllocator::new(AllocConfig::new().with_chunk_words(256)).unwrap();
    let ledger = churn(&mut a, 0x5eed, 4_000);
    assert_eq!(a.live_count(), ledger.len());
}

#[test]
fn system_churn_never_overlaps() {
    let mut a = AllocConfig::new()
        .with_backend(Backend::System)
        .build_word_allocator()
        .unwrap();
    churn(&mut a, 0xc10c, 2_000);
}

#[test]
fn arena_stops_growing_once_warm() {
    let mut a = SizeClassAllocator::new(AllocConfig::new().with_chunk_words(1024)).unwrap();
    let mut handles = Vec::new();

    // Warm up: one full generation of frontier states.
    for round in 0..64 {
        let words = ZONE_SIZES[round % ZONE_SIZES.len()];
        handles.push((a.allocate(words).unwrap(), words));
    }
    for (h, n) in handles.drain(..) {
        a.deallocate(h, n);
    }
    let warm_chunks = a.chunk_count();

    // The same mix again must be served entirely from free lists.
    for round in 0..64 {
        let words = ZONE_SIZES[round % ZONE_SIZES.len()];
        handles.push((a.allocate(words).unwrap(), words));
    }
    assert_eq!(a.chunk_count(), warm_chunks);
    assert_eq!(a.free_block_count(), 0);
}

#[test]
fn leak_checker_sees_surviving_explored_set() {
    let inner = SizeClassAllocator::new(AllocConfig::new().with_chunk_words(512)).unwrap();
    let mut a = LeakCheckingAllocator::new(inner);
    let ledger = churn(&mut a, 7, 1_000);

    let report = a.finish();
    assert_eq!(report.leaks.len(), ledger.len());
    assert_eq!(report.leaked_words(), ledger.live_words());
}

#[test]
fn reset_after_search_releases_everything() {
    let mut a = SizeClassAllocator::new(AllocConfig::new().with_chunk_words(256)).unwrap();
    let ledger = churn(&mut a, 42, 1_500);
    assert!(a.try_reset().is_err() || ledger.is_empty());

    a.reset();
    assert_eq!(a.chunk_count(), 0);
    assert_eq!(a.live_count(), 0);
    for (h, n) in ledger.iter() {
        assert!(a.words(*h, *n).is_none());
    }
}
