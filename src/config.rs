/// Simulated disk capacity in bytes (100 MB).
pub const DISK_CAPACITY: usize = 100 * 1000 * 1000;

/// Default block size in bytes.
pub const BLOCK_SIZE: usize = 200;

/// Default dataset path for the CLI `load` command.
pub const DATA_FILE_PATH: &str = "data.tsv";
