use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Credential error: {0}")]
    Auth(String),

    #[error("No matrix ID received")]
    MissingMatrixId,

    #[error("Test matrix {state}: {message}")]
    MatrixFailed { state: String, message: String },

    #[error(
        "The test execution is in an unknown state: {0}. \
         We appreciate if you could notify us at \
         https://github.com/xctestlab/xctestlab/issues"
    )]
    UnknownState(String),

    #[error("Unexpected response from Firebase Test Lab: {0}")]
    UnexpectedResponse(String),

    #[error("App bundle verification failed: {0}")]
    InvalidArchive(String),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
