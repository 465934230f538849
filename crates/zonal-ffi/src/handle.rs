//! Generation-checked table of allocators owned on behalf of C callers.
//!
//! C code only ever holds a `u64` naming a table entry. Destroying an
//! entry bumps its generation, so a destroyed handle (or a second destroy)
//! resolves to `None` instead of reaching freed memory.

/// Upper 32 bits: entry index. Lower 32 bits: generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RawHandle {
    index: u32,
    generation: u32,
}

impl RawHandle {
    pub(crate) fn pack(self) -> u64 {
        ((self.index as u64) << 32) | self.generation as u64
    }

    pub(crate) fn unpack(raw: u64) -> Self {
        Self {
            index: (raw >> 32) as u32,
            generation: raw as u32,
        }
    }
}

enum Entry<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next: Option<u32> },
    /// Generation space exhausted; never handed out again.
    Retired,
}

/// Entries thread their own free list, like the item pools in
/// `zonal-alloc`.
pub(crate) struct SlotTable<T> {
    entries: Vec<Entry<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> SlotTable<T> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    /// Store `value` and return its packed handle, or `None` once `u32`
    /// indices are exhausted.
    pub(crate) fn insert(&mut self, value: T) -> Option<u64> {
        let handle = match self.free_head {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                let (generation, next) = match *entry {
                    Entry::Vacant { generation, next } => (generation, next),
                    _ => unreachable!("free entry {index} is not vacant"),
                };
                *entry = Entry::Occupied { generation, value };
                self.free_head = next;
                RawHandle { index, generation }
            }
            None => {
                let index = u32::try_from(self.entries.len()).ok()?;
                self.entries.push(Entry::Occupied {
                    generation: 0,
                    value,
                });
                RawHandle {
                    index,
                    generation: 0,
                }
            }
        };
        self.len += 1;
        Some(handle.pack())
    }

    pub(crate) fn get(&self, raw: u64) -> Option<&T> {
        let handle = RawHandle::unpack(raw);
        match self.entries.get(handle.index as usize)? {
            Entry::Occupied { generation, value } if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    pub(crate) fn get_mut(&mut self, raw: u64) -> Option<&mut T> {
        let handle = RawHandle::unpack(raw);
        match self.entries.get_mut(handle.index as usize)? {
            Entry::Occupied { generation, value } if *generation == handle.generation => {
                Some(value)
            }
            _ => None,
        }
    }

    /// Take the value out and vacate its entry under the next generation.
    pub(crate) fn remove(&mut self, raw: u64) -> Option<T> {
        let handle = RawHandle::unpack(raw);
        let entry = self.entries.get_mut(handle.index as usize)?;
        match entry {
            Entry::Occupied { generation, .. } if *generation == handle.generation => {}
            _ => return None,
        }
        let replacement = match handle.generation.checked_add(1) {
            Some(generation) => Entry::Vacant {
                generation,
                next: self.free_head,
            },
            None => Entry::Retired,
        };
        let retired = matches!(replacement, Entry::Retired);
        let Entry::Occupied { value, .. } = std::mem::replace(entry, replacement) else {
            return None;
        };
        if !retired {
            self.free_head = Some(handle.index);
        }
        self.len -= 1;
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_is_lossless() {
        let h = RawHandle {
            index: 7,
            generation: u32::MAX,
        };
        assert_eq!(RawHandle::unpack(h.pack()), h);
    }

    #[test]
    fn insert_then_get() {
        let mut table = SlotTable::new();
        let h = table.insert(5u32).unwrap();
        assert_eq!(table.get(h), Some(&5));
        *table.get_mut(h).unwrap() = 6;
        assert_eq!(table.get(h), Some(&6));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn removed_handle_is_dead() {
        let mut table = SlotTable::new();
        let h = table.insert(5u32).unwrap();
        assert_eq!(table.remove(h), Some(5));
        assert_eq!(table.get_mut(h), None);
        assert_eq!(table.remove(h), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn vacated_entry_is_reused_under_new_generation() {
        let mut table = SlotTable::new();
        let first = table.insert(1u32).unwrap();
        table.remove(first);
        let second = table.insert(2u32).unwrap();
        let (a, b) = (RawHandle::unpack(first), RawHandle::unpack(second));
        assert_eq!(a.index, b.index);
        assert_eq!(b.generation, a.generation + 1);
        assert_eq!(table.get_mut(first), None);
        assert_eq!(table.get_mut(second), Some(&mut 2));
    }

    #[test]
    fn exhausted_generation_retires_entry() {
        let mut table = SlotTable::new();
        let h = table.insert(1u32).unwrap();
        table.entries[0] = Entry::Occupied {
            generation: u32::MAX,
            value: 1,
        };
        let h = RawHandle::unpack(h);
        let last = RawHandle {
            generation: u32::MAX,
            ..h
        }
        .pack();
        assert_eq!(table.remove(last), Some(1));
        let fresh = table.insert(2u32).unwrap();
        assert_eq!(RawHandle::unpack(fresh).index, 1);
    }

    #[test]
    fn unknown_index_is_rejected() {
        let mut table: SlotTable<u32> = SlotTable::new();
        assert_eq!(table.get_mut(RawHandle { index: 3, generation: 0 }.pack()), None);
    }
}
