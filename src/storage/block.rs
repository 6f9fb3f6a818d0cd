use std::fmt;

use crate::storage::record::Record;

/// Location of one record inside the simulated disk: which block, and
/// which slot within it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub block_id: u32,
    pub offset: u16,
}

impl Address {
    pub fn new(block_id: u32, offset: u16) -> Self {
        Address { block_id, offset }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}-{}", self.block_id, self.offset)
    }
}

/// A fixed-capacity run of record slots. Deleted slots stay `None`
/// so surviving addresses keep their offsets.
#[derive(Debug)]
pub struct Block {
    slots: Vec<Option<Record>>,
    capacity: usize,
    occupied: usize,
}

impl Block {
    pub fn new(block_size: usize) -> Self {
        let capacity = block_size / Record::DISK_SIZE;
        Block {
            slots: Vec::with_capacity(capacity),
            capacity,
            occupied: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.occupied == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Places a record in the first free slot, reusing holes left by
    /// deletions before growing the tail.
    pub fn insert(&mut self, record: Record) -> Option<u16> {
        if let Some(hole) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[hole] = Some(record);
            self.occupied += 1;
            return Some(hole as u16);
        }
        if self.slots.len() < self.capacity {
            self.slots.push(Some(record));
            self.occupied += 1;
            return Some((self.slots.len() - 1) as u16);
        }
        None
    }

    pub fn get(&self, offset: u16) -> Option<&Record> {
        self.slots.get(offset as usize).and_then(|s| s.as_ref())
    }

    /// Clears a slot; returns whether the block became empty, or `None`
    /// if the slot held nothing.
    pub fn delete_at(&mut self, offset: u16) -> Option<bool> {
        let slot = self.slots.get_mut(offset as usize)?;
        slot.take()?;
        self.occupied -= 1;
        Some(self.occupied == 0)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }
}
