use std::fs;
use std::path::PathBuf;

use argon::api::Database;

/// A database seeded from a throwaway TSV file in /tmp. The file is
/// removed when the harness drops.
pub struct TestDb {
    pub db: Database,
    path: PathBuf,
}

impl TestDb {
    /// Writes `rows` as a headered TSV and bulk-loads it.
    pub fn load(block_size: usize, rows: &[(&str, f32, u64)]) -> Self {
        let path = PathBuf::from(format!("/tmp/argon_test_{}.tsv", rand::random::<u64>()));
        let mut body = String::from("tconst\taverageRating\tnumVotes\n");
        for (title, rating, votes) in rows {
            body.push_str(&format!("{title}\t{rating}\t{votes}\n"));
        }
        fs::write(&path, body).unwrap();

        let mut db = Database::open(block_size);
        let loaded = db.load_tsv(&path).unwrap();
        assert_eq!(loaded, rows.len());
        TestDb { db, path }
    }

    /// `n` rows with votes 1..=n and ratings cycling 0.0..9.0.
    pub fn sequential(block_size: usize, n: u64) -> Self {
        let rows: Vec<(String, f32, u64)> = (1..=n)
            .map(|i| (format!("tt{i:07}"), (i % 10) as f32, i))
            .collect();
        let borrowed: Vec<(&str, f32, u64)> =
            rows.iter().map(|(t, r, v)| (t.as_str(), *r, *v)).collect();
        Self::load(block_size, &borrowed)
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
