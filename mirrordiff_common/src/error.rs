use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Container error: {0}")]
    Container(String),

    #[error("External tool error: {0}")]
    External(String),

    #[error("Comparison error: {0}")]
    Comparison(String),
}

pub type Result<T> = std::result::Result<T, MirrorDiffError>;
