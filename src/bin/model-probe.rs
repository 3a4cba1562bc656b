use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use transcript_tools::probe::{self, ProbeStatus};
use transcript_tools::{utils, Config, ProbeCli};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = ProbeCli::parse();
    utils::init_tracing(cli.verbose);

    let mut config = Config::load()?;
    if let Some(env_file) = cli.env_file {
        config.probe.env_file = env_file;
    }
    if !cli.models.is_empty() {
        config.probe.models = cli.models;
    }
    if let Some(prompt) = cli.prompt {
        config.probe.prompt = prompt;
    }

    let mut stdout = std::io::stdout();
    match probe::run_session(&config.probe, &mut stdout).await? {
        ProbeStatus::Completed => Ok(ExitCode::SUCCESS),
        ProbeStatus::Aborted => Ok(ExitCode::from(1)),
    }
}
