//! Fixed-shape item pool.
//!
//! [`FixedItemPool`] recycles cells for one record type, such as
//! search-frontier nodes, in memory kept apart from the word arena. It
//! grows by whole pools of `items_per_pool` cells and threads its free
//! list through the vacant cells themselves.

use std::fmt;
use std::io;

use zonal_core::AllocError;

use crate::config::ItemPoolConfig;
use crate::stats::ItemPoolStats;

/// One storage cell: either a link in the free list or a live item.
enum Cell<T> {
    Vacant { next: Option<usize> },
    Occupied(T),
}

/// Location of an item inside a [`FixedItemPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[must_use]
pub struct ItemHandle {
    cell: usize,
    epoch: u32,
}

impl ItemHandle {
    /// Flat cell index across all pools.
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// Pool epoch the handle was issued in.
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

impl fmt::Display for ItemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemHandle(cell={}, epoch={})", self.cell, self.epoch)
    }
}

/// A failed [`FixedItemPool::allocate`], carrying the item back.
pub struct ItemAllocError<T> {
    /// Why no cell could be provided.
    pub error: AllocError,
    /// The item that was not stored.
    pub item: T,
}

impl<T> ItemAllocError<T> {
    /// Recover the item.
    pub fn into_item(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for ItemAllocError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemAllocError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for ItemAllocError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<T> std::error::Error for ItemAllocError<T> {}

impl<T> From<ItemAllocError<T>> for AllocError {
    fn from(err: ItemAllocError<T>) -> Self {
        err.error
    }
}

/// Recycling allocator for a single item type.
///
/// The pool does not invent values: `allocate` stores the item the caller
/// hands in, and `deallocate` hands it back for the caller to drop or
/// reuse. Items still occupying cells when the pool is reset or dropped
/// are dropped with it.
///
/// Freed cells go on the head of the free list, so the next allocation
/// reuses the most recently freed cell.
pub struct FixedItemPool<T> {
    /// Pool chain, oldest first.
    pools: Vec<Box<[Cell<T>]>>,
    items_per_pool: usize,
    free_head: Option<usize>,
    live: usize,
    epoch: u32,
}

impl<T> FixedItemPool<T> {
    /// Create an empty pool. No cells are reserved until the first
    /// allocation.
    ///
    /// Rejects `items_per_pool <= 1` and item types smaller than a
    /// machine pointer.
    pub fn new(config: ItemPoolConfig) -> Result<Self, AllocError> {
        config.validate()?;
        let item_bytes = std::mem::size_of::<T>();
        let min_bytes = std::mem::size_of::<usize>();
        if item_bytes < min_bytes {
            return Err(AllocError::ItemTooSmall {
                item_bytes,
                min_bytes,
            });
        }
        Ok(Self {
            pools: Vec::new(),
            items_per_pool: config.items_per_pool,
            free_head: None,
            live: 0,
            epoch: 0,
        })
    }

    /// Create a pool of `items_per_pool` cells per growth step.
    pub fn with_items_per_pool(items_per_pool: usize) -> Result<Self, AllocError> {
        Self::new(ItemPoolConfig::new(items_per_pool))
    }

    /// Store `item` in a free cell, growing by one pool if none is free.
    ///
    /// If the pool cannot grow, the item comes back inside the error.
    pub fn allocate(&mut self, item: T) -> Result<ItemHandle, ItemAllocError<T>> {
        let cell = match self.free_head {
            Some(cell) => cell,
            None => match self.add_pool() {
                Ok(cell) => cell,
                Err(error) => return Err(ItemAllocError { error, item }),
            },
        };
        let ipp = self.items_per_pool;
        let slot = &mut self.pools[cell / ipp][cell % ipp];
        match std::mem::replace(slot, Cell::Occupied(item)) {
            Cell::Vacant { next } => self.free_head = next,
            Cell::Occupied(_) => unreachable!("free list head {cell} is occupied"),
        }
        self.live += 1;
        Ok(ItemHandle {
            cell,
            epoch: self.epoch,
        })
    }

    /// Return a cell to the head of the free list and hand back its item.
    ///
    /// Returns `None` for a handle from before the last reset, a handle
    /// outside the pool, or a cell that is already free.
    pub fn deallocate(&mut self, handle: ItemHandle) -> Option<T> {
        if handle.epoch != self.epoch {
            return None;
        }
        let next = self.free_head;
        let slot = self.cell_mut(handle.cell)?;
        if matches!(slot, Cell::Vacant { .. }) {
            return None;
        }
        match std::mem::replace(slot, Cell::Vacant { next }) {
            Cell::Occupied(item) => {
                self.free_head = Some(handle.cell);
                self.live -= 1;
                Some(item)
            }
            Cell::Vacant { .. } => None,
        }
    }

    /// Borrow the item behind a handle.
    pub fn get(&self, handle: ItemHandle) -> Option<&T> {
        if handle.epoch != self.epoch {
            return None;
        }
        let ipp = self.items_per_pool;
        match self.pools.get(handle.cell / ipp)?.get(handle.cell % ipp)? {
            Cell::Occupied(item) => Some(item),
            Cell::Vacant { .. } => None,
        }
    }

    /// Mutably borrow the item behind a handle.
    pub fn get_mut(&mut self, handle: ItemHandle) -> Option<&mut T> {
        if handle.epoch != self.epoch {
            return None;
        }
        match self.cell_mut(handle.cell)? {
            Cell::Occupied(item) => Some(item),
            Cell::Vacant { .. } => None,
        }
    }

    /// Drop every pool (and any items still in them) and clear the free
    /// list. Earlier handles become stale.
    pub fn reset(&mut self) {
        tracing::debug!(
            pools = self.pools.len(),
            live = self.live,
            "item pool reset"
        );
        self.pools = Vec::new();
        self.free_head = None;
        self.live = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Number of pools held.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// Number of occupied cells.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of vacant cells.
    pub fn free_count(&self) -> usize {
        self.capacity() - self.live
    }

    /// Total cells across all pools.
    pub fn capacity(&self) -> usize {
        self.pools.len() * self.items_per_pool
    }

    /// Cells per pool.
    pub fn items_per_pool(&self) -> usize {
        self.items_per_pool
    }

    /// Snapshot the pool's counters.
    pub fn stats(&self) -> ItemPoolStats {
        ItemPoolStats {
            pool_count: self.pools.len(),
            items_per_pool: self.items_per_pool,
            live_items: self.live,
            free_items: self.free_count(),
            cell_bytes: std::mem::size_of::<Cell<T>>(),
        }
    }

    /// Write a human-readable statistics report to `out`.
    pub fn print_stats<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self.stats())
    }

    fn cell_mut(&mut self, cell: usize) -> Option<&mut Cell<T>> {
        let ipp = self.items_per_pool;
        self.pools.get_mut(cell / ipp)?.get_mut(cell % ipp)
    }

    /// Append a pool, thread its cells into a fresh free list, and return
    /// the first cell. Only called with an empty free list.
    fn add_pool(&mut self) -> Result<usize, AllocError> {
        debug_assert!(self.free_head.is_none());
        let ipp = self.items_per_pool;
        let base = self.pools.len() * ipp;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(ipp)
            .map_err(|_| AllocError::OutOfMemory { words: ipp })?;
        cells.extend((1..ipp).map(|i| Cell::Vacant {
            next: Some(base + i),
        }));
        cells.push(Cell::Vacant { next: None });

        self.pools
            .try_reserve(1)
            .map_err(|_| AllocError::OutOfMemory { words: ipp })?;
        self.pools.push(cells.into_boxed_slice());
        self.free_head = Some(base);
        tracing::debug!(pool = self.pools.len() - 1, cells = ipp, "item pool grew");
        Ok(base)
    }
}

impl<T> fmt::Debug for FixedItemPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedItemPool")
            .field("pools", &self.pools.len())
            .field("items_per_pool", &self.items_per_pool)
            .field("live", &self.live)
            .field("epoch", &self.epoch)
            .finish()
    }
}
