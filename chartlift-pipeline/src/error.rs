/// Errors that can occur while running pipeline stages.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Db(#[from] chartlift_db::DbError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error for '{artist} - {track}': {message}")]
    Cache {
        artist: String,
        track: String,
        message: String,
    },

    #[error("Clean table is missing required column '{0}'")]
    MissingKeyColumn(&'static str),

    #[error("Validated table is empty; refusing to publish the curated table")]
    EmptyValidatedTable,
}

impl From<chartlift_db::SchemaError> for PipelineError {
    fn from(e: chartlift_db::SchemaError) -> Self {
        match e {
            chartlift_db::SchemaError::Sqlite(inner) => PipelineError::Sqlite(inner),
        }
    }
}
