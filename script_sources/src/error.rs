use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or scanning a source file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {header} header has a non-numeric id {value:?}")]
    InvalidId {
        line: usize,
        header: &'static str,
        value: String,
    },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Read a whole UTF-8 source file, attaching the path to any failure.
pub(crate) fn read_source(path: &std::path::Path) -> ParseResult<String> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })
}
