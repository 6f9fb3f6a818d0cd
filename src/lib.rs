pub mod api;
pub mod config;
pub mod debugger;
pub mod index;
pub mod scan;
pub mod storage;
