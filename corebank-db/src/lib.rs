pub mod models;
pub mod storage;
pub mod tables;

pub use storage::{Record, StorageExt, StorageInterface, StorageModel};
