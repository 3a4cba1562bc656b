//! Transcript Tools - small CLI utilities around external transcript and model services
//!
//! The library backs two binaries: `transcript-fetch`, which resolves a caption track for a
//! YouTube video and reports it as JSON, and `model-probe`, a connectivity check against the
//! Gemini generative-language API.

pub mod cli;
pub mod config;
pub mod output;
pub mod probe;
pub mod transcript;
pub mod utils;

pub use cli::{FetchCli, OutputFormat, ProbeCli};
pub use config::Config;
pub use transcript::{fetch_transcript, TranscriptProvider, TranscriptRequest, TranscriptResult};

/// Result type used by the binaries and config loading
pub type Result<T> = anyhow::Result<T>;

/// Error kinds surfaced by the transcript fetcher and the model probe
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    #[error("Video ID required")]
    MissingArgument,

    #[error("listing capability unavailable")]
    ProviderUnavailable,

    #[error("no transcript available")]
    NoTranscriptFound,

    #[error("Subtitles are disabled for this video")]
    TranscriptsDisabled,

    #[error("Video is unavailable: {0}")]
    VideoUnavailable(String),

    #[error("Request blocked by the transcript provider")]
    RequestBlocked,

    #[error("{0} file not found.")]
    CredentialFileMissing(String),

    #[error("{key} not found in {file}")]
    CredentialMissing { key: String, file: String },

    #[error("{0}")]
    ConfigurationFailure(String),

    #[error("{0}")]
    ModelListingFailure(String),

    #[error("{message}")]
    GenerationFailure { model: String, message: String },

    #[error("{0}")]
    Provider(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::Provider(err.to_string())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Provider(format!("Malformed provider response: {}", err))
    }
}
