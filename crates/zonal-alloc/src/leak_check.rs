//! Loan-tracking wrapper for hunting leaks and bad frees.
//!
//! [`LeakCheckingAllocator`] sits in front of any [`WordAllocator`] and
//! remembers the size of every outstanding block. That lets it catch the
//! misuse the backends cannot see on their own: a block released with the
//! wrong size, released twice, or never released at all.

use std::fmt;

use indexmap::IndexMap;
use zonal_core::{AllocError, Word, WordAllocator, WordHandle};

/// Outstanding loans left when a [`LeakCheckingAllocator`] is finished.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeakReport {
    /// Every block still on loan with its size, in allocation order.
    pub leaks: Vec<(WordHandle, usize)>,
    /// Total allocations made over the wrapper's lifetime.
    pub total_allocations: usize,
}

impl LeakReport {
    /// True when every allocation was released.
    pub fn is_clean(&self) -> bool {
        self.leaks.is_empty()
    }

    /// Sum of the leaked block sizes in words.
    pub fn leaked_words(&self) -> usize {
        self.leaks.iter().map(|&(_, n)| n).sum()
    }
}

impl fmt::Display for LeakReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return writeln!(
                f,
                "no leaks ({} allocations released)",
                self.total_allocations
            );
        }
        writeln!(
            f,
            "{} of {} allocations leaked ({} words)",
            self.leaks.len(),
            self.total_allocations,
            self.leaked_words()
        )?;
        for (handle, words) in &self.leaks {
            writeln!(f, "  {handle}: {words} words")?;
        }
        Ok(())
    }
}

/// A [`WordAllocator`] that checks every release against its loan record.
///
/// All checks run in every build profile. The unchecked `deallocate` logs
/// and drops a bad release instead of forwarding it, so the inner
/// allocator's free lists stay intact.
pub struct LeakCheckingAllocator<A> {
    inner: A,
    /// Outstanding loans: handle → (size in words, allocation sequence).
    loans: IndexMap<WordHandle, (usize, usize)>,
    /// Block location → epoch of the last release there. Reissuing any
    /// handle at a location clears its entry, so this holds at most one
    /// entry per location the inner allocator has used.
    released: IndexMap<(u32, u32), u32>,
    total: usize,
}

fn location(handle: WordHandle) -> (u32, u32) {
    (handle.chunk(), handle.offset())
}

impl<A: WordAllocator> LeakCheckingAllocator<A> {
    /// Wrap `inner`.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            loans: IndexMap::new(),
            released: IndexMap::new(),
            total: 0,
        }
    }

    /// Number of outstanding loans.
    pub fn outstanding(&self) -> usize {
        self.loans.len()
    }

    /// Size of an outstanding loan, if `handle` is one.
    pub fn loan_size(&self, handle: WordHandle) -> Option<usize> {
        self.loans.get(&handle).map(|&(words, _)| words)
    }

    /// Borrow the wrapped allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Forget every loan record, e.g. after resetting the inner allocator
    /// through [`inner_mut`](Self::inner_mut).
    pub fn forget_loans(&mut self) {
        self.loans.clear();
        self.released.clear();
    }

    /// Mutably borrow the wrapped allocator.
    ///
    /// Allocations made directly through it bypass the loan record.
    pub fn inner_mut(&mut self) -> &mut A {
        &mut self.inner
    }

    /// Stop tracking and report what is still on loan.
    pub fn finish(self) -> LeakReport {
        self.report()
    }

    /// Report what is on loan right now without consuming the wrapper.
    pub fn report(&self) -> LeakReport {
        let mut loans: Vec<_> = self
            .loans
            .iter()
            .map(|(&h, &(n, seq))| (seq, h, n))
            .collect();
        loans.sort_unstable_by_key(|&(seq, _, _)| seq);
        LeakReport {
            leaks: loans.into_iter().map(|(_, h, n)| (h, n)).collect(),
            total_allocations: self.total,
        }
    }

    /// Unwrap, discarding the loan record.
    pub fn into_inner(self) -> A {
        self.inner
    }

    fn check_release(&self, handle: WordHandle, words: usize) -> Result<(), AllocError> {
        if words == 0 {
            return Err(AllocError::ZeroSize);
        }
        match self.loans.get(&handle) {
            Some(&(expected, _)) if expected == words => Ok(()),
            Some(&(expected, _)) => Err(AllocError::SizeMismatch {
                handle,
                expected,
                actual: words,
            }),
            None if self.released.get(&location(handle)) == Some(&handle.epoch()) => {
                Err(AllocError::DoubleFree { handle })
            }
            None => Err(AllocError::ForeignHandle { handle }),
        }
    }
}

impl<A: WordAllocator> WordAllocator for LeakCheckingAllocator<A> {
    fn allocate(&mut self, words: usize) -> Result<WordHandle, AllocError> {
        let handle = self.inner.allocate(words)?;
        self.released.swap_remove(&location(handle));
        if let Some((previous, _)) = self.loans.insert(handle, (words, self.total)) {
            tracing::error!(
                %handle,
                previous,
                words,
                "inner allocator reissued a live block"
            );
        }
        self.total += 1;
        Ok(handle)
    }

    fn deallocate(&mut self, handle: WordHandle, words: usize) {
        let result = self.try_deallocate(handle, words);
        if let Err(err) = &result {
            tracing::error!(%err, "rejected deallocation");
        }
        debug_assert!(result.is_ok(), "rejected deallocation: {result:?}");
    }

    fn try_deallocate(&mut self, handle: WordHandle, words: usize) -> Result<(), AllocError> {
        self.check_release(handle, words)?;
        self.inner.try_deallocate(handle, words)?;
        self.loans.swap_remove(&handle);
        self.released.insert(location(handle), handle.epoch());
        Ok(())
    }

    fn words(&self, handle: WordHandle, words: usize) -> Option<&[Word]> {
        self.inner.words(handle, words)
    }

    fn words_mut(&mut self, handle: WordHandle, words: usize) -> Option<&mut [Word]> {
        self.inner.words_mut(handle, words)
    }
}

impl<A> fmt::Debug for LeakCheckingAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeakCheckingAllocator")
            .field("outstanding", &self.loans.len())
            .field("total", &self.total)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AllocConfig, SizeClassAllocator, SystemWordAllocator};

    fn checked() -> LeakCheckingAllocator<SizeClassAllocator> {
        let inner = SizeClassAllocator::new(AllocConfig::new().with_chunk_words(64)).unwrap();
        LeakCheckingAllocator::new(inner)
    }

    #[test]
    fn clean_run_reports_clean() {
        let mut a = checked();
        let h = a.allocate(4).unwrap();
        a.try_deallocate(h, 4).unwrap();
        let report = a.finish();
        assert!(report.is_clean());
        assert_eq!(report.total_allocations, 1);
        assert!(report.to_string().contains("no leaks"));
    }

    #[test]
    fn leaks_are_listed_in_allocation_order() {
        let mut a = checked();
        let x = a.allocate(3).unwrap();
        let y = a.allocate(5).unwrap();
        let z = a.allocate(2).unwrap();
        a.try_deallocate(y, 5).unwrap();
        let report = a.finish();
        assert_eq!(report.leaks, vec![(x, 3), (z, 2)]);
        assert_eq!(report.leaked_words(), 5);
        assert!(report.to_string().contains("2 of 3 allocations leaked"));
    }

    #[test]
    fn size_mismatch_is_rejected_without_touching_inner() {
        let mut a = checked();
        let h = a.allocate(3).unwrap();
        assert_eq!(
            a.try_deallocate(h, 4),
            Err(AllocError::SizeMismatch {
                handle: h,
                expected: 3,
                actual: 4
            })
        );
        assert_eq!(a.inner().free_block_count(), 0);
        assert_eq!(a.outstanding(), 1);
    }

    #[test]
    fn double_free_is_rejected() {
        let mut a = checked();
        let h = a.allocate(3).unwrap();
        a.try_deallocate(h, 3).unwrap();
        assert_eq!(a.try_deallocate(h, 3), Err(AllocError::DoubleFree { handle: h }));
        assert_eq!(a.inner().free_list_len(3), 1);
    }

    #[test]
    fn reissued_block_can_be_released_again() {
        let mut a = checked();
        let h = a.allocate(3).unwrap();
        a.try_deallocate(h, 3).unwrap();
        let again = a.allocate(3).unwrap();
        assert_eq!(again, h);
        a.try_deallocate(again, 3).unwrap();
        assert!(a.finish().is_clean());
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let mut a = checked();
        let foreign = WordHandle::new(9, 0, 0);
        assert_eq!(
            a.try_deallocate(foreign, 1),
            Err(AllocError::ForeignHandle { handle: foreign })
        );
    }

    #[test]
    fn wraps_system_backend() {
        let mut a = LeakCheckingAllocator::new(SystemWordAllocator::new());
        let h = a.allocate_zeroed(6).unwrap();
        a.words_mut(h, 6).unwrap()[5] = 1;
        assert_eq!(a.words(h, 6).unwrap()[5], 1);
        assert_eq!(a.loan_size(h), Some(6));
        a.deallocate(h, 6);
        assert_eq!(a.into_inner().live_count(), 0);
    }

    #[test]
    fn release_history_stays_bounded_on_system_backend() {
        let mut a = LeakCheckingAllocator::new(SystemWordAllocator::new());
        let mut previous = None;
        for _ in 0..1_000 {
            let h = a.allocate(4).unwrap();
            a.try_deallocate(h, 4).unwrap();
            previous = Some(h);
        }
        // Every round reuses slot 0 under a new generation.
        assert_eq!(a.released.len(), 1);
        let last = previous.unwrap();
        assert_eq!(a.try_deallocate(last, 4), Err(AllocError::DoubleFree { handle: last }));
        assert!(a.finish().is_clean());
    }

    #[test]
    fn leak_order_survives_out_of_order_releases() {
        let mut a = checked();
        let handles: Vec<_> = (1..=6).map(|n| (a.allocate(n).unwrap(), n)).collect();
        for &(h, n) in &handles[..3] {
            a.try_deallocate(h, n).unwrap();
        }
        assert_eq!(a.report().leaks, handles[3..].to_vec());
    }

    #[test]
    fn forget_loans_after_inner_reset() {
        let mut a = checked();
        a.allocate(3).unwrap();
        a.inner_mut().reset();
        a.forget_loans();
        assert!(a.report().is_clean());
    }
}
