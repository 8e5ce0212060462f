use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroundingError {
    #[error("Phrase tree is empty")]
    EmptyPhraseTree,
    #[error("Malformed phrase tree: {message}")]
    MalformedPhraseTree { message: String },
    #[error("Beam width must be at least 1")]
    InvalidBeamWidth,
    #[error("Oracle error: {message}")]
    Oracle { message: String },
    #[error("Search budget exhausted after {oracle_calls} oracle calls ({elapsed_ms} ms)")]
    BudgetExhausted { oracle_calls: u64, elapsed_ms: u128 },
    #[error("Search cancelled")]
    Cancelled,
    #[error("Config error: {0}")]
    Config(String),
}

impl GroundingError {
    pub fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle { message: message.into() }
    }
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPhraseTree { message: message.into() }
    }
    /// Structural failures mean the instruction cannot be grounded at all.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::EmptyPhraseTree | Self::MalformedPhraseTree { .. } | Self::InvalidBeamWidth
        )
    }
}

pub type Result<T> = std::result::Result<T, GroundingError>;

// Helper conversions
impl From<::config::ConfigError> for GroundingError {
    fn from(e: ::config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
