//! Domain entities, response decoding and the crate-wide error type

pub mod chapter;
pub mod manga;
pub mod page;

use thiserror::Error;

/// Custom error type that contains all errors that can be emitted by this crate's functions
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error(transparent)]
    RequestMiddlewareError(#[from] reqwest_middleware::Error),
    #[error("unexpected status code {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    #[error(transparent)]
    QsError(#[from] serde_qs::Error),
    #[error("no chapters found for volume {volumes}")]
    NoChaptersFound { volumes: String },
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),
    #[error("environment variable {0} is not set")]
    MissingEnvVar(&'static str),
}

/// Type alias for the [`Result`](std::result::Result) that is used in the crate's functions
pub type Result<T> = std::result::Result<T, Error>;
