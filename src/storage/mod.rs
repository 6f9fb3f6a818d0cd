pub mod block;
pub mod disk;
pub mod errors;
pub mod record;

pub use block::{Address, Block};
pub use disk::Disk;
pub use errors::{StorageError, StorageResult};
pub use record::Record;
