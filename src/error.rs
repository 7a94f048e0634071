use thiserror::Error;

pub type Result<T> = std::result::Result<T, LineageError>;

#[derive(Error, Debug)]
pub enum LineageError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("INI error: {0}")]
    Ini(#[from] ini::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("Download of {url} failed with status {status}")]
    Download { url: String, status: u16 },
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Missing column '{column}' in {table}")]
    MissingColumn { table: String, column: String },
    #[error("Null value in required column '{column}' of {table}")]
    NullValue { table: String, column: String },
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Unsupported repository URL: {0}")]
    RepoUrl(String),
    #[error("Plot error: {0}")]
    Plot(String),
    #[error("Thread pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl From<ureq::Error> for LineageError {
    fn from(err: ureq::Error) -> Self {
        LineageError::Http(Box::new(err))
    }
}
