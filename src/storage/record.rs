use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

/// One movie rating row from the IMDb-style TSV dump.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub title_id: String,
    pub rating: f32,
    pub votes: u64,
}

impl Record {
    /// On-disk footprint used for block capacity math: a 10-byte title
    /// id, a 4-byte rating, an 8-byte vote count, padded to 28.
    pub const DISK_SIZE: usize = 28;

    pub fn new(title_id: &str, rating: f32, votes: u64) -> Self {
        Record {
            title_id: title_id.to_string(),
            rating,
            votes,
        }
    }
}

/// Reads a headered TSV file (`tconst  averageRating  numVotes`) into
/// memory. Malformed lines abort the load with the offending line number.
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("failed to open data file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read {}", path.display()))?;
        if lineno == 0 || line.is_empty() {
            // Header row.
            continue;
        }
        let mut fields = line.split('\t');
        let (Some(title_id), Some(rating), Some(votes)) =
            (fields.next(), fields.next(), fields.next())
        else {
            anyhow::bail!("{}:{}: expected 3 tab-separated fields", path.display(), lineno + 1);
        };
        let rating: f32 = rating
            .parse()
            .with_context(|| format!("{}:{}: bad rating", path.display(), lineno + 1))?;
        let votes: u64 = votes
            .parse()
            .with_context(|| format!("{}:{}: bad vote count", path.display(), lineno + 1))?;
        records.push(Record::new(title_id, rating, votes));
    }
    Ok(records)
}
