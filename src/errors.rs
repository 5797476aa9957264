use std::{io, path::PathBuf, sync::Arc};

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed OSM input at byte {position}: {message}")]
    MalformedInput { position: u64, message: String },

    #[error("element of type '{element}' failed validation on field '{field}': {}", .errors.join("; "))]
    Validation {
        element: String,
        field: String,
        errors: Vec<String>,
    },

    #[error("could not write table: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{etl_name} ran out of order: {message}")]
    OutOfOrder {
        etl_name: &'static str,
        message: &'static str,
    },
}

impl Error {
    pub fn malformed(position: usize, message: impl Into<String>) -> Self {
        Error::MalformedInput {
            position: position as u64,
            message: message.into(),
        }
    }

    /// Sorts a quick-xml failure into the IO or malformed-input class. Read
    /// errors from the underlying stream (including the xz decoder) stay IO.
    pub fn from_xml(position: usize, err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(inner) => Error::Io(unwrap_shared_io(inner)),
            other => Error::malformed(position, other.to_string()),
        }
    }

    pub fn from_attr(position: usize, err: AttrError) -> Self {
        Error::malformed(position, err.to_string())
    }
}

fn unwrap_shared_io(err: Arc<io::Error>) -> io::Error {
    match Arc::try_unwrap(err) {
        Ok(err) => err,
        Err(shared) => io::Error::new(shared.kind(), shared.to_string()),
    }
}

// Plain messages come from the command line.
impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Config(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Config(value)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
