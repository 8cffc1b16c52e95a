use thiserror::Error;

/// Fatal load failures. Anything listed here aborts the whole upload; no
/// partial table is ever handed to the presentation layer. Row-level data
/// quality problems are repaired inline by the loader instead (dropped row
/// or zero/sentinel substitution) and reported through `LoadReport`.
#[derive(Debug, Clone, Error)]
pub enum ReportError {
    /// One or more required columns are absent from the header row.
    #[error("missing required column(s): {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },

    /// The mileage layout is positional: exactly 7 columns, fixed order.
    #[error("expected {expected} columns in the header row, found {found}")]
    ColumnCount { expected: usize, found: usize },

    /// The file could not be decoded as tabular data at all.
    #[error("unreadable report file: {0}")]
    Parse(String),
}

impl ReportError {
    pub fn is_schema(&self) -> bool {
        matches!(
            self,
            ReportError::MissingColumns { .. } | ReportError::ColumnCount { .. }
        )
    }
}
