use std::path::{Path, PathBuf};

use script_sources::ParseError;
use thiserror::Error;

/// Errors raised while loading inputs, running an analysis or writing output.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid run configuration {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing input files: {}", join_paths(.0))]
    MissingInputs(Vec<PathBuf>),

    #[error("cannot serialize metrics: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn read_to_string(path: &Path) -> AnalysisResult<String> {
    std::fs::read_to_string(path).map_err(|source| AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and deserialize a JSON document.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AnalysisResult<T> {
    let text = read_to_string(path)?;
    serde_json::from_str(&text).map_err(|source| AnalysisError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inputs_message_lists_every_path() {
        let err = AnalysisError::MissingInputs(vec![
            PathBuf::from("data/a.txt"),
            PathBuf::from("data/b.json"),
        ]);
        assert_eq!(err.to_string(), "missing input files: data/a.txt, data/b.json");
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let parse = ParseError::InvalidId {
            line: 3,
            header: "map",
            value: "x".to_string(),
        };
        let expected = parse.to_string();
        let err: AnalysisError = parse.into();
        assert_eq!(err.to_string(), expected);
    }
}
