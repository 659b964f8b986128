use thiserror;

/// The Result type for veggie48.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cell value {0} is neither zero nor a power of two >= 2")]
    InvalidCellValue(crate::engine::board::Cell),
}
