//! Integration tests: the C ABI driven the way a C caller would drive it.

use proptest::prelude::*;
use zonal_ffi::{
    zonal_allocate, zonal_allocator_destroy, zonal_arena_create, zonal_deallocate,
    zonal_live_count, zonal_read_words, zonal_reset, zonal_system_create, zonal_write_words,
    ZonalBlock, ZonalStatus,
};

const OK: i32 = ZonalStatus::Ok as i32;

fn live(h: u64) -> usize {
    let mut n = 0usize;
    assert_eq!(zonal_live_count(h, &mut n), OK);
    n
}

#[test]
fn arena_session_with_reset() {
    let mut h = 0u64;
    assert_eq!(zonal_arena_create(32, &mut h), OK);

    let mut blocks = Vec::new();
    for words in [4usize, 9, 4, 16] {
        let mut b = ZonalBlock::default();
        assert_eq!(zonal_allocate(h, words, &mut b), OK);
        let fill = vec![words as u32; words];
        assert_eq!(zonal_write_words(h, b, fill.as_ptr(), words), OK);
        blocks.push((b, words));
    }
    assert_eq!(live(h), 4);

    for &(b, words) in &blocks {
        let mut out = vec![0u32; words];
        assert_eq!(zonal_read_words(h, b, out.as_mut_ptr(), words), OK);
        assert!(out.iter().all(|&w| w == words as u32));
    }

    assert_eq!(zonal_reset(h, 1), OK);
    assert_eq!(live(h), 0);
    let (stale, words) = blocks[0];
    assert_eq!(
        zonal_deallocate(h, stale, words),
        ZonalStatus::StaleBlock as i32
    );
    assert_eq!(zonal_allocator_destroy(h), OK);
}

#[test]
fn handles_from_different_allocators_do_not_mix() {
    let (mut arena, mut system) = (0u64, 0u64);
    assert_eq!(zonal_arena_create(64, &mut arena), OK);
    assert_eq!(zonal_system_create(&mut system), OK);
    assert_ne!(arena, system);

    let mut b = ZonalBlock::default();
    assert_eq!(zonal_allocate(arena, 8, &mut b), OK);
    // The system allocator never issued this block.
    assert_eq!(
        zonal_deallocate(system, b, 8),
        ZonalStatus::ForeignBlock as i32
    );
    assert_eq!(live(arena), 1);

    zonal_allocator_destroy(arena);
    zonal_allocator_destroy(system);
}

#[test]
fn misused_releases_never_alias_live_blocks() {
    let mut h = 0u64;
    assert_eq!(zonal_arena_create(64, &mut h), OK);

    let mut x = ZonalBlock::default();
    let mut y = ZonalBlock::default();
    assert_eq!(zonal_allocate(h, 2, &mut x), OK);
    assert_eq!(zonal_allocate(h, 2, &mut y), OK);

    // Too large a size, then the same block twice.
    assert_eq!(zonal_deallocate(h, x, 4), ZonalStatus::SizeMismatch as i32);
    assert_eq!(zonal_deallocate(h, x, 2), OK);
    assert_eq!(zonal_deallocate(h, x, 2), ZonalStatus::DoubleFree as i32);
    assert_eq!(live(h), 1);

    // y keeps the refusal to reset honest.
    assert_eq!(zonal_reset(h, 0), ZonalStatus::LiveAllocations as i32);

    let mut a = ZonalBlock::default();
    let mut b = ZonalBlock::default();
    assert_eq!(zonal_allocate(h, 2, &mut a), OK);
    assert_eq!(zonal_allocate(h, 2, &mut b), OK);
    assert_eq!(a, x);
    assert_ne!(b, a);
    assert_ne!(b, y);

    let fill = [7u32; 2];
    assert_eq!(zonal_write_words(h, y, fill.as_ptr(), 2), OK);
    assert_eq!(zonal_write_words(h, a, [1u32; 2].as_ptr(), 2), OK);
    assert_eq!(zonal_write_words(h, b, [2u32; 2].as_ptr(), 2), OK);
    let mut out = [0u32; 2];
    assert_eq!(zonal_read_words(h, y, out.as_mut_ptr(), 2), OK);
    assert_eq!(out, fill);

    assert_eq!(zonal_allocator_destroy(h), OK);
}

proptest! {
    #[test]
    fn balanced_sessions_end_with_no_loans(
        sizes in proptest::collection::vec(1usize..=32, 1..40),
        use_system: bool,
    ) {
        let mut h = 0u64;
        if use_system {
            prop_assert_eq!(zonal_system_create(&mut h), OK);
        } else {
            prop_assert_eq!(zonal_arena_create(64, &mut h), OK);
        }
        let mut held = Vec::new();
        for &words in &sizes {
            let mut b = ZonalBlock::default();
            prop_assert_eq!(zonal_allocate(h, words, &mut b), OK);
            held.push((b, words));
        }
        prop_assert_eq!(live(h), sizes.len());
        for (b, words) in held.into_iter().rev() {
            prop_assert_eq!(zonal_deallocate(h, b, words), OK);
        }
        prop_assert_eq!(live(h), 0);
        prop_assert_eq!(zonal_allocator_destroy(h), OK);
    }
}
