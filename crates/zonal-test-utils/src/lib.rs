//! Test utilities and fixtures for Zonal development.
//!
//! Provides a [`ShadowLedger`] that mirrors outstanding word loans and
//! rejects overlapping blocks, a few record types shaped like search
//! nodes for pool tests, and [`init_test_logging`] for tests that want
//! to see allocator trace output.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Once;

use zonal_core::WordHandle;

pub use fixtures::{
    SearchNode, TinyItem, ZoneRecord, TINY_CHUNK_WORDS, TINY_ITEMS_PER_POOL,
};

/// Shadow copy of the loans an allocator has handed out.
///
/// Tests record every allocation and release through the ledger and let
/// it check that no two live blocks share a word.
#[derive(Debug, Default)]
pub struct ShadowLedger {
    live: Vec<(WordHandle, usize)>,
}

impl ShadowLedger {
    pub fn new() -> Self {
        Self { live: Vec::new() }
    }

    /// Record a new loan of `words` words.
    ///
    /// Returns the first live loan it overlaps, if any; the new loan is
    /// recorded only when there is none.
    pub fn record(&mut self, handle: WordHandle, words: usize) -> Result<(), (WordHandle, usize)> {
        if let Some(&clash) = self
            .live
            .iter()
            .find(|(h, n)| handle.overlaps(words, h, *n))
        {
            return Err(clash);
        }
        self.live.push((handle, words));
        Ok(())
    }

    /// Forget a loan by handle, returning its size.
    pub fn release(&mut self, handle: WordHandle) -> Option<usize> {
        let pos = self.live.iter().position(|(h, _)| *h == handle)?;
        Some(self.live.swap_remove(pos).1)
    }

    /// Forget the `index`-th loan and return it.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn release_nth(&mut self, index: usize) -> (WordHandle, usize) {
        self.live.swap_remove(index)
    }

    /// Outstanding loans.
    pub fn iter(&self) -> impl Iterator<Item = &(WordHandle, usize)> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Total outstanding words.
    pub fn live_words(&self) -> usize {
        self.live.iter().map(|(_, n)| n).sum()
    }
}

static LOGGING: Once = Once::new();

/// Install a `tracing` subscriber writing to the test harness.
///
/// Filtered by `RUST_LOG` (default `warn`). Safe to call from every test;
/// only the first call installs anything.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
