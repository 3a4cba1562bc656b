use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "transcript-fetch",
    about = "Fetch a YouTube transcript and print it as JSON",
    version,
    long_about = "Looks up the caption tracks of a YouTube video, picks a manual track in the \
                  requested language, then a generated one, then whatever the video offers, \
                  and prints the joined text as a single line of JSON."
)]
pub struct FetchCli {
    /// Video ID or YouTube URL (IDs may start with '-')
    #[arg(value_name = "VIDEO_ID", allow_hyphen_values = true)]
    pub video_id: Option<String>,

    /// Anything after the video ID is accepted and ignored
    #[arg(hide = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,

    /// Preferred transcript language (falls back to config, then "ko")
    #[arg(short, long, value_name = "LANG", env = "TRANSCRIPT_TOOLS_LANG")]
    pub lang: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Enable verbose logging (stderr)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(
    name = "model-probe",
    about = "Check connectivity to the Gemini API",
    version,
    long_about = "Reads GEMINI_API_KEY from a local env file, lists the models that support \
                  content generation and sends a fixed test prompt to each configured model."
)]
pub struct ProbeCli {
    /// Key-value file holding the API key
    #[arg(long, value_name = "FILE", env = "TRANSCRIPT_TOOLS_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Model to test (repeatable, replaces the configured list)
    #[arg(short, long = "model", value_name = "MODEL")]
    pub models: Vec<String>,

    /// Prompt sent to each model
    #[arg(short, long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Enable verbose logging (stderr)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single-line JSON object
    Json,
    /// Bare transcript text
    Text,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Text => write!(f, "text"),
        }
    }
}
