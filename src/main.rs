use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use transcript_tools::output::{self, TranscriptPayload};
use transcript_tools::transcript::youtube::YoutubeProvider;
use transcript_tools::{
    fetch_transcript, utils, Config, FetchCli, OutputFormat, ToolError, TranscriptRequest,
    TranscriptResult,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = FetchCli::parse();
    utils::init_tracing(cli.verbose);

    let mut stdout = std::io::stdout();

    let Some(raw_id) = cli.video_id.filter(|id| !id.trim().is_empty()) else {
        let payload = TranscriptPayload::failure(ToolError::MissingArgument.to_string());
        output::write_payload(&mut stdout, &payload, &OutputFormat::Json)?;
        return Ok(ExitCode::from(1));
    };

    if !cli.extra.is_empty() {
        tracing::debug!("Ignoring extra arguments: {:?}", cli.extra);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {:#}", err);
            let payload = TranscriptPayload::failure(format!("{:#}", err));
            output::write_payload(&mut stdout, &payload, &cli.format)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let video_id = utils::extract_video_id(&raw_id);
    let language = cli
        .lang
        .as_deref()
        .unwrap_or(&config.transcript.default_language);
    let request = TranscriptRequest::new(video_id, Some(language));

    tracing::info!(
        "Fetching {} transcript for video: {}",
        request.language,
        request.video_id
    );

    let result = match YoutubeProvider::new(&config.transcript) {
        Ok(provider) => fetch_transcript(&provider, &request).await,
        Err(err) => TranscriptResult::from(err),
    };

    output::write_payload(&mut stdout, &TranscriptPayload::from(&result), &cli.format)?;

    Ok(ExitCode::SUCCESS)
}
