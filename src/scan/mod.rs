pub mod linear;

pub use linear::{LinearScan, ScanResult};
