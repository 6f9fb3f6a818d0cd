use std::fmt;

use crate::storage::block::Address;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    DiskFull { capacity: usize },

    InvalidAddress { address: Address },

    DeletedRecord { address: Address },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DiskFull { capacity } => {
                write!(f, "storage error: disk full ({} blocks allocated)", capacity)
            }

            StorageError::InvalidAddress { address } => {
                write!(f, "storage error: invalid address {}", address)
            }

            StorageError::DeletedRecord { address } => {
                write!(f, "storage error: no record at {}", address)
            }
        }
    }
}

impl std::error::Error for StorageError {}
