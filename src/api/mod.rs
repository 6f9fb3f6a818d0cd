pub mod db;

pub use db::{Database, DeleteReport, QueryReport, StorageReport, TreeReport};
