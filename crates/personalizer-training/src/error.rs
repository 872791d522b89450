use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),
    #[error("Unknown value '{value}' for feature '{feature}'")]
    UnknownFeatureValue { feature: String, value: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(&'static str),
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[source] BoxError),
    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
    #[error("Unknown request id: {0}")]
    UnknownRequest(String),
    #[error("Reward must be a finite value in [0.0, 1.0], got {0}")]
    InvalidReward(f32),
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl TrainingError {
    /// `true` für Fehler, bei denen ein neuer Versuch lohnt (Transport, Timeout).
    ///
    /// Alles andere ist ein lokales, strukturelles Problem und scheitert erneut.
    pub fn is_transport(&self) -> bool {
        matches!(self, TrainingError::BackendUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, TrainingError>;
