//! Error taxonomy shared by ingestion, aggregation and the HTTP collaborators.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// One or more required header columns are absent.
    #[error("CSV file is missing required columns: {}.", missing.join(", "))]
    Schema { missing: Vec<String> },
    #[error("CSV file is empty or contains no header row.")]
    EmptyInput,
    #[error("failed to read input: {0}")]
    Parse(String),
    #[error("{0}")]
    Network(String),
    #[error("AI summary unavailable: {0}")]
    UpstreamAi(String),
    #[error("invalid bin specification: {0}")]
    InvalidBinSpec(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<csv::Error> for DashboardError {
    fn from(e: csv::Error) -> Self {
        DashboardError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for DashboardError {
    fn from(e: std::io::Error) -> Self {
        DashboardError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        DashboardError::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_every_column() {
        let err = DashboardError::Schema {
            missing: vec!["QuizScores".into(), "CompletionRate".into()],
        };
        assert_eq!(
            err.to_string(),
            "CSV file is missing required columns: QuizScores, CompletionRate."
        );
    }
}
