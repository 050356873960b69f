use thiserror::Error;

/// Errors reported by the spectrogram pipeline.
///
/// All failures are local and synchronous. Retrying with the same inputs
/// yields the same error, so callers should surface the message and skip
/// rendering instead.
#[derive(Error, Debug)]
pub enum SpectrogramError {
    /// Out-of-range or inconsistent numeric input.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The signal reports a sample rate the engine cannot work with.
    #[error("unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),

    /// The signal carries no samples.
    #[error("audio signal is empty")]
    EmptySignal,

    /// The audio bytes could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpectrogramError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SpectrogramError::InvalidParameter(msg.into())
    }
}

/// Convenience alias so callers can write `Result<T>` instead of `Result<T, SpectrogramError>`.
pub type Result<T> = std::result::Result<T, SpectrogramError>;
