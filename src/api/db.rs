use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::config;
use crate::index::BPlusTree;
use crate::scan::LinearScan;
use crate::storage::{Address, Disk, Record, record};

/// The database facade: a simulated disk of records plus a vote-count
/// index over it, with a brute-force path for comparison.
pub struct Database {
    disk: Disk,
    tree: BPlusTree,
    block_size: usize,
}

/// One query answered both ways, with cost counters for each.
#[derive(Debug)]
pub struct QueryReport {
    pub records: Vec<Record>,
    pub avg_rating: f64,
    pub index_nodes_accessed: usize,
    pub index_blocks_accessed: usize,
    pub index_time: Duration,
    pub scan_blocks_accessed: usize,
    pub scan_time: Duration,
}

#[derive(Debug)]
pub struct DeleteReport {
    pub removed: usize,
    pub index_time: Duration,
    pub scan_time: Duration,
}

#[derive(Debug)]
pub struct TreeReport {
    pub max_keys: usize,
    pub num_nodes: usize,
    pub num_levels: usize,
    pub root_keys: Vec<u64>,
}

#[derive(Debug)]
pub struct StorageReport {
    pub block_size: usize,
    pub block_count: usize,
    pub record_count: usize,
    pub records_per_block: usize,
}

impl Database {
    pub fn open(block_size: usize) -> Self {
        Database {
            disk: Disk::new(block_size),
            tree: BPlusTree::new(block_size),
            block_size,
        }
    }

    pub fn disk(&self) -> &Disk {
        &self.disk
    }

    pub fn tree(&self) -> &BPlusTree {
        &self.tree
    }

    /// Bulk-loads a TSV dataset, indexing each record by vote count.
    /// Returns the number of records stored.
    pub fn load_tsv<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let records = record::read_records(path)?;
        let n = records.len();
        for r in records {
            self.insert(r)?;
        }
        Ok(n)
    }

    pub fn insert(&mut self, r: Record) -> Result<Address> {
        let votes = r.votes;
        let address = self.disk.insert(r)?;
        self.tree.insert(votes, address);
        Ok(address)
    }

    /// Answers `votes == key` through the index and through a full scan,
    /// timing both. The two result sets must agree; the index answer is
    /// the one returned.
    pub fn query_eq(&self, votes: u64) -> Result<QueryReport> {
        self.query_range(votes, votes)
    }

    /// Answers `low <= votes <= high` both ways.
    pub fn query_range(&self, low: u64, high: u64) -> Result<QueryReport> {
        let started = Instant::now();
        let lookup = self.tree.range(low, high);
        let (records, index_blocks_accessed) = self.disk.fetch_many(&lookup.addresses)?;
        let index_time = started.elapsed();

        let started = Instant::now();
        let scanned = LinearScan::new(&self.disk).scan_range(low, high);
        let scan_time = started.elapsed();

        let avg_rating = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.rating as f64).sum::<f64>() / records.len() as f64
        };
        Ok(QueryReport {
            records,
            avg_rating,
            index_nodes_accessed: lookup.nodes_accessed,
            index_blocks_accessed,
            index_time,
            scan_blocks_accessed: scanned.blocks_accessed,
            scan_time,
        })
    }

    /// Removes every record with votes in `[low, high]` from both the
    /// index and the disk. Also times what the same removal would cost
    /// a brute-force pass to find.
    pub fn delete_range(&mut self, low: u64, high: u64) -> Result<DeleteReport> {
        let started = Instant::now();
        let scan_time = {
            let scan = LinearScan::new(&self.disk);
            let _ = scan.addresses_in_range(low, high);
            started.elapsed()
        };

        let started = Instant::now();
        let addresses = self.tree.remove_range(low, high);
        let removed = self.disk.delete(&addresses)?;
        let index_time = started.elapsed();

        Ok(DeleteReport {
            removed,
            index_time,
            scan_time,
        })
    }

    pub fn tree_report(&self) -> TreeReport {
        TreeReport {
            max_keys: self.tree.max_keys(),
            num_nodes: self.tree.num_nodes(),
            num_levels: self.tree.num_levels(),
            root_keys: self.tree.root_keys(),
        }
    }

    pub fn storage_report(&self) -> StorageReport {
        StorageReport {
            block_size: self.block_size,
            block_count: self.disk.block_count(),
            record_count: self.disk.record_count(),
            records_per_block: self.disk.records_per_block(),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::open(config::BLOCK_SIZE)
    }
}

impl fmt::Display for TreeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "index parameter n:  {}", self.max_keys)?;
        writeln!(f, "number of nodes:    {}", self.num_nodes)?;
        writeln!(f, "number of levels:   {}", self.num_levels)?;
        write!(f, "root keys:          {:?}", self.root_keys)
    }
}

impl fmt::Display for StorageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "block size:         {} B", self.block_size)?;
        writeln!(f, "blocks used:        {}", self.block_count)?;
        writeln!(f, "records stored:     {}", self.record_count)?;
        write!(f, "records per block:  {}", self.records_per_block)
    }
}
