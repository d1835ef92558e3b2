use thiserror::Error;

/// Errors raised while building or running the alignment graph.
///
/// Every variant carries the identifier that triggered it (URI, field name,
/// chromosome label, stage) so the first failure of a run is diagnosable as-is.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("malformed location: {0}")]
    MalformedLocation(String),

    #[error("unrecognized storage scheme: {0}")]
    UnrecognizedStorage(String),

    #[error("unsupported storage for {0}")]
    UnsupportedStorage(String),

    #[error("can't add different units: {left} and {right}")]
    UnitMismatch { left: String, right: String },

    #[error("don't understand unit {0}")]
    UnsupportedUnit(String),

    #[error("scale factor must be a non-negative integer, got {0}")]
    InvalidScaleFactor(f64),

    #[error("shard count mismatch for {name}: mate 1 has {mate1} bins, mate 2 has {mate2}")]
    ShardCountMismatch {
        name: String,
        mate1: usize,
        mate2: usize,
    },

    #[error("{stage}: missing expected output {artifact}")]
    MissingExpectedOutput { stage: String, artifact: String },

    #[error("repeat of chromosome {label} in shard {shard}")]
    DuplicateChromosomeKey { label: String, shard: usize },

    #[error("config missing field {0}")]
    ConfigFieldMissing(String),

    #[error("{what} failed: {message}")]
    Collaborator { what: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn collaborator(what: impl Into<String>, message: impl ToString) -> Self {
        PipelineError::Collaborator {
            what: what.into(),
            message: message.to_string(),
        }
    }

    pub fn missing_output(stage: impl ToString, artifact: impl Into<String>) -> Self {
        PipelineError::MissingExpectedOutput {
            stage: stage.to_string(),
            artifact: artifact.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
