use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("illegal move: cell ({row}, {col}) is occupied or off the board")]
    IllegalMove { row: usize, col: usize },

    #[error("invalid mark '{0}' (expected 'X' or 'O')")]
    InvalidMark(String),

    #[error("both players hold the same mark")]
    MarksNotComplementary,

    #[error("game already over")]
    GameOver,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("q-table serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_pickle::Error> for Error {
    fn from(e: serde_pickle::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
