use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("not enough data: no rows below header row {header_row}")]
    InsufficientData { header_row: usize },

    #[error("failed to process {file}: {source}")]
    FileProcessing {
        file: String,
        #[source]
        source: Box<ReportError>,
    },

    #[error("no file contains any row with a product identifier")]
    NoValidData,

    #[error("no lookup dataset loaded or no lookup fields selected")]
    NoSelection,

    #[error("lookup field index {0} is not selectable")]
    InvalidSelection(usize),

    #[error("header row must be 1 or greater, got {0}")]
    InvalidHeaderRow(usize),

    #[error("no header row containing \"ID\" in the first {0} rows")]
    HeaderNotFound(usize),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    /// Attach the source filename to a per-file failure.
    pub fn in_file(self, file: impl Into<String>) -> Self {
        ReportError::FileProcessing { file: file.into(), source: Box::new(self) }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
