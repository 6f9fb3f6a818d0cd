use crate::storage::{Address, Disk, Record};

/// Result of a brute-force pass: the matching records and the number of
/// blocks the pass had to read (always every allocated block).
#[derive(Debug)]
pub struct ScanResult {
    pub records: Vec<Record>,
    pub blocks_accessed: usize,
}

/// Full-scan baseline the index is measured against. Reads every block
/// and filters on the vote count.
pub struct LinearScan<'a> {
    disk: &'a Disk,
}

impl<'a> LinearScan<'a> {
    pub fn new(disk: &'a Disk) -> Self {
        LinearScan { disk }
    }

    pub fn scan_eq(&self, votes: u64) -> ScanResult {
        self.scan_range(votes, votes)
    }

    pub fn scan_range(&self, low: u64, high: u64) -> ScanResult {
        let records = self
            .disk
            .scan()
            .filter(|(_, r)| low <= r.votes && r.votes <= high)
            .map(|(_, r)| r.clone())
            .collect();
        ScanResult {
            records,
            blocks_accessed: self.disk.block_count(),
        }
    }

    /// Addresses of every record whose vote count falls in the range.
    /// Used to cross-check index lookups.
    pub fn addresses_in_range(&self, low: u64, high: u64) -> Vec<Address> {
        self.disk
            .scan()
            .filter(|(_, r)| low <= r.votes && r.votes <= high)
            .map(|(a, _)| a)
            .collect()
    }
}
