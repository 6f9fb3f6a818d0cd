use std::collections::HashSet;

use crate::config;
use crate::db_debug;
use crate::debugger::DebugLevel;
use crate::storage::block::{Address, Block};
use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::record::Record;

/// Simulated paginated store: a capped vector of fixed-size blocks.
/// Records append into the last non-full block; deletions leave holes
/// that later inserts reuse.
pub struct Disk {
    blocks: Vec<Block>,
    block_size: usize,
    max_blocks: usize,
    record_count: usize,
}

impl Disk {
    pub fn new(block_size: usize) -> Self {
        Self::with_capacity(block_size, config::DISK_CAPACITY)
    }

    pub fn with_capacity(block_size: usize, disk_capacity: usize) -> Self {
        assert!(
            block_size >= Record::DISK_SIZE,
            "block size {} cannot hold a single record",
            block_size
        );
        Disk {
            blocks: Vec::new(),
            block_size,
            max_blocks: disk_capacity / block_size,
            record_count: 0,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn records_per_block(&self) -> usize {
        self.block_size / Record::DISK_SIZE
    }

    /// Appends a record, allocating a fresh block when every existing
    /// block is full.
    pub fn insert(&mut self, record: Record) -> StorageResult<Address> {
        if let Some((block_id, block)) = self
            .blocks
            .iter_mut()
            .enumerate()
            .rev()
            .find(|(_, b)| !b.is_full())
        {
            let offset = block
                .insert(record)
                .unwrap_or_else(|| unreachable!("non-full block rejected insert"));
            self.record_count += 1;
            return Ok(Address::new(block_id as u32, offset));
        }

        if self.blocks.len() >= self.max_blocks {
            return Err(StorageError::DiskFull {
                capacity: self.max_blocks,
            });
        }

        let mut block = Block::new(self.block_size);
        let offset = block
            .insert(record)
            .unwrap_or_else(|| unreachable!("fresh block rejected insert"));
        self.blocks.push(block);
        self.record_count += 1;
        db_debug!(
            DebugLevel::Trace,
            "disk: allocated block {}",
            self.blocks.len() - 1
        );
        Ok(Address::new((self.blocks.len() - 1) as u32, offset))
    }

    pub fn fetch(&self, address: Address) -> StorageResult<&Record> {
        let block = self
            .blocks
            .get(address.block_id as usize)
            .ok_or(StorageError::InvalidAddress { address })?;
        block
            .get(address.offset)
            .ok_or(StorageError::DeletedRecord { address })
    }

    /// Resolves a batch of addresses, also reporting how many distinct
    /// blocks the batch touched.
    pub fn fetch_many(&self, addresses: &[Address]) -> StorageResult<(Vec<Record>, usize)> {
        let mut records = Vec::with_capacity(addresses.len());
        let mut touched = HashSet::new();
        for &address in addresses {
            records.push(self.fetch(address)?.clone());
            touched.insert(address.block_id);
        }
        Ok((records, touched.len()))
    }

    /// Removes every addressed record; returns how many were removed.
    pub fn delete(&mut self, addresses: &[Address]) -> StorageResult<usize> {
        let mut removed = 0;
        for &address in addresses {
            let block = self
                .blocks
                .get_mut(address.block_id as usize)
                .ok_or(StorageError::InvalidAddress { address })?;
            if block.delete_at(address.offset).is_some() {
                self.record_count -= 1;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Sequential pass over every occupied slot, in block order.
    pub fn scan(&self) -> impl Iterator<Item = (Address, &Record)> {
        self.blocks.iter().enumerate().flat_map(|(block_id, block)| {
            (0..block.capacity() as u16).filter_map(move |offset| {
                block
                    .get(offset)
                    .map(|r| (Address::new(block_id as u32, offset), r))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(votes: u64) -> Record {
        Record::new("tt0000001", 5.5, votes)
    }

    #[test]
    fn insert_spills_into_new_blocks() {
        // 200-byte blocks hold 7 records each.
        let mut disk = Disk::with_capacity(200, 2000);
        for i in 0..8 {
            disk.insert(rec(i)).unwrap();
        }
        assert_eq!(disk.block_count(), 2);
        assert_eq!(disk.record_count(), 8);
        assert_eq!(disk.fetch(Address::new(1, 0)).unwrap().votes, 7);
    }

    #[test]
    fn disk_full_is_reported() {
        // One 56-byte block of 2 records.
        let mut disk = Disk::with_capacity(56, 56);
        disk.insert(rec(1)).unwrap();
        disk.insert(rec(2)).unwrap();
        match disk.insert(rec(3)) {
            Err(StorageError::DiskFull { capacity }) => assert_eq!(capacity, 1),
            other => panic!("expected DiskFull, got {:?}", other.map(|a| a.to_string())),
        }
    }

    #[test]
    fn delete_then_insert_reuses_slot() {
        let mut disk = Disk::with_capacity(200, 2000);
        let mut addrs = Vec::new();
        for i in 0..7 {
            addrs.push(disk.insert(rec(i)).unwrap());
        }
        assert_eq!(disk.delete(&addrs[2..4]).unwrap(), 2);
        assert_eq!(disk.record_count(), 5);
        assert!(matches!(
            disk.fetch(addrs[2]),
            Err(StorageError::DeletedRecord { .. })
        ));

        let reused = disk.insert(rec(100)).unwrap();
        assert_eq!(reused, addrs[2]);
        assert_eq!(disk.fetch(reused).unwrap().votes, 100);
    }

    #[test]
    fn fetch_many_counts_distinct_blocks() {
        let mut disk = Disk::with_capacity(200, 2000);
        let mut addrs = Vec::new();
        for i in 0..14 {
            addrs.push(disk.insert(rec(i)).unwrap());
        }
        let picks = [addrs[0], addrs[1], addrs[13]];
        let (records, blocks) = disk.fetch_many(&picks).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(blocks, 2);
    }
}
