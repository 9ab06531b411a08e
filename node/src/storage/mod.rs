use thiserror::Error;

pub mod flat_file;
pub mod query;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to access block store directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Block store path is not a directory: {0}")]
    NotADirectory(String),
}
