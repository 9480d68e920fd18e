pub mod cl;
pub mod errors;
pub mod manager;
pub mod models;
pub mod search;
pub mod storage;
pub mod utils;

pub use errors::{Error, ErrorKind, StorageError};
pub use manager::ZKPManager;
