use thiserror::Error;

pub type Result<T> = std::result::Result<T, StructureError>;

#[derive(Error, Debug)]
pub enum StructureError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pattern error: {0}")]
    PatternError(String),
}
