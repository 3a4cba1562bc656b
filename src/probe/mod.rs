use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

pub mod gemini;

pub use gemini::{GeminiClient, ModelInfo};

use crate::config::ProbeConfig;
use crate::utils::mask_secret;
use crate::ToolError;

/// API key read from a local env file. Never printed unmasked.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Scan a `KEY=value` file for the first line starting with `key=`
    pub fn load(path: &Path, key: &str) -> Result<Self, ToolError> {
        let file = match fs_err::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ToolError::CredentialFileMissing(path.display().to_string()));
            }
            Err(e) => return Err(ToolError::ConfigurationFailure(e.to_string())),
        };

        let prefix = format!("{}=", key);
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| ToolError::ConfigurationFailure(e.to_string()))?;
            if !line.starts_with(&prefix) {
                continue;
            }

            let value = line[prefix.len()..].trim();
            if value.is_empty() {
                break;
            }
            return Ok(Self(value.to_string()));
        }

        Err(ToolError::CredentialMissing {
            key: key.to_string(),
            file: path.display().to_string(),
        })
    }

    pub fn masked(&self) -> String {
        mask_secret(&self.0)
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

/// One printed result of a probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Listed { name: String },
    ListingFailure { message: String },
    GenerationSuccess { model: String, response_text: String },
    GenerationFailure { model: String, message: String },
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Listed { name } => write!(f, "- {}", name),
            ProbeOutcome::ListingFailure { message } => {
                write!(f, "Error listing models: {}", message)
            }
            ProbeOutcome::GenerationSuccess { response_text, .. } => {
                write!(f, "Response: {}", response_text)
            }
            ProbeOutcome::GenerationFailure { model, message } => {
                write!(f, "Error with {}: {}", model, message)
            }
        }
    }
}

/// How a probe run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// Every step ran; individual failures were reported inline
    Completed,
    /// Setup failed before any network call
    Aborted,
}

/// Sequential model listing and generation checks
pub struct ModelProbe {
    client: GeminiClient,
    models: Vec<String>,
    prompt: String,
}

impl ModelProbe {
    pub fn new(client: GeminiClient, models: Vec<String>, prompt: impl Into<String>) -> Self {
        Self {
            client,
            models,
            prompt: prompt.into(),
        }
    }

    /// List generation-capable models, then prompt each configured model in turn.
    ///
    /// A failed step is reported and the run moves on.
    pub async fn run<W: Write>(&self, out: &mut W) -> io::Result<Vec<ProbeOutcome>> {
        let mut outcomes = Vec::new();

        writeln!(out, "\n--- Available Models ---")?;
        match self.client.list_models().await {
            Ok(models) => {
                for model in models.into_iter().filter(ModelInfo::supports_generate_content) {
                    let outcome = ProbeOutcome::Listed { name: model.name };
                    writeln!(out, "{}", outcome)?;
                    outcomes.push(outcome);
                }
            }
            Err(err) => {
                tracing::warn!("Model listing failed: {}", err);
                let outcome = ProbeOutcome::ListingFailure { message: err.to_string() };
                writeln!(out, "{}", outcome)?;
                outcomes.push(outcome);
            }
        }

        for model in &self.models {
            writeln!(out, "\n--- Testing Generation ({}) ---", model)?;
            out.flush()?;

            let outcome = match self.client.generate_content(model, &self.prompt).await {
                Ok(response_text) => ProbeOutcome::GenerationSuccess {
                    model: model.clone(),
                    response_text,
                },
                Err(err) => {
                    tracing::warn!("Generation with {} failed: {}", model, err);
                    ProbeOutcome::GenerationFailure {
                        model: model.clone(),
                        message: err.to_string(),
                    }
                }
            };
            writeln!(out, "{}", outcome)?;
            outcomes.push(outcome);
        }

        out.flush()?;
        Ok(outcomes)
    }
}

/// Full probe session: credential, client setup, then the checks.
///
/// Setup errors are printed and end the session before anything touches the network.
pub async fn run_session<W: Write>(config: &ProbeConfig, out: &mut W) -> io::Result<ProbeStatus> {
    let credential = match Credential::load(&config.env_file, &config.key_name) {
        Ok(credential) => credential,
        Err(err) => {
            writeln!(out, "Error: {}", err)?;
            return Ok(ProbeStatus::Aborted);
        }
    };

    writeln!(out, "Using API Key: {}", credential.masked())?;

    let client = match GeminiClient::new(&credential, &config.base_url) {
        Ok(client) => client,
        Err(err) => {
            writeln!(out, "Error configuring API: {}", err)?;
            return Ok(ProbeStatus::Aborted);
        }
    };

    ModelProbe::new(client, config.models.clone(), config.prompt.clone())
        .run(out)
        .await?;

    Ok(ProbeStatus::Completed)
}
