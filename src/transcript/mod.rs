use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;

use crate::ToolError;

/// A transcript lookup: which video, which language to prefer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRequest {
    pub video_id: String,
    pub language: String,
}

impl TranscriptRequest {
    pub const DEFAULT_LANGUAGE: &'static str = "ko";

    pub fn new(video_id: impl Into<String>, language: Option<&str>) -> Self {
        Self {
            video_id: video_id.into(),
            language: language
                .map(str::trim)
                .filter(|lang| !lang.is_empty())
                .unwrap_or(Self::DEFAULT_LANGUAGE)
                .to_string(),
        }
    }
}

/// Outcome of a transcript lookup. Failures are data, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptResult {
    Success { text: String, language: String },
    Failure { message: String },
}

impl TranscriptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TranscriptResult::Success { .. })
    }
}

impl From<ToolError> for TranscriptResult {
    fn from(err: ToolError) -> Self {
        TranscriptResult::Failure {
            message: err.to_string(),
        }
    }
}

/// One caption stream offered for a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTrack {
    /// Language tag as reported by the provider (e.g. "ko", "en-US")
    pub language_code: String,

    /// Human-readable language name
    pub language_name: String,

    /// Speech-recognition track rather than human-authored
    pub is_generated: bool,

    /// Where the provider serves the timed text
    pub base_url: String,
}

/// All tracks available for a video, in provider order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptList {
    pub video_id: String,
    pub tracks: Vec<TranscriptTrack>,
}

impl TranscriptList {
    pub fn new(video_id: impl Into<String>, tracks: Vec<TranscriptTrack>) -> Self {
        Self {
            video_id: video_id.into(),
            tracks,
        }
    }

    /// Human-authored track in the given language
    pub fn find_manual(&self, language: &str) -> Option<&TranscriptTrack> {
        self.tracks
            .iter()
            .find(|track| !track.is_generated && track.language_code == language)
    }

    /// Speech-recognition track in the given language
    pub fn find_generated(&self, language: &str) -> Option<&TranscriptTrack> {
        self.tracks
            .iter()
            .find(|track| track.is_generated && track.language_code == language)
    }

    pub fn first(&self) -> Option<&TranscriptTrack> {
        self.tracks.first()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Normalized timed text entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub text: Option<String>,

    /// Start offset in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Source of caption tracks and their timed text
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// List the caption tracks available for a video
    async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptList, ToolError>;

    /// Retrieve a track's entries in playback order
    async fn fetch_entries(
        &self,
        track: &TranscriptTrack,
    ) -> Result<Vec<TranscriptEntry>, ToolError>;

    /// Get the name of this provider
    fn provider_name(&self) -> &'static str;
}

/// Resolve and fetch the best available transcript.
///
/// Preference is a manual track in the requested language, then a generated one, then the
/// first track on offer. Provider errors become [`TranscriptResult::Failure`].
pub async fn fetch_transcript(
    provider: &dyn TranscriptProvider,
    request: &TranscriptRequest,
) -> TranscriptResult {
    match try_fetch_transcript(provider, request).await {
        Ok((text, language)) => TranscriptResult::Success { text, language },
        Err(err) => {
            tracing::warn!(
                "{} transcript lookup for {} failed: {}",
                provider.provider_name(),
                request.video_id,
                err
            );
            err.into()
        }
    }
}

async fn try_fetch_transcript(
    provider: &dyn TranscriptProvider,
    request: &TranscriptRequest,
) -> Result<(String, String), ToolError> {
    tracing::info!("Listing transcripts for video: {}", request.video_id);
    let list = provider.list_transcripts(&request.video_id).await?;
    tracing::debug!("{} track(s) available", list.tracks.len());

    let (track, language) = select_track(&list, &request.language)
        .ok_or(ToolError::NoTranscriptFound)?;

    tracing::info!(
        "Using {} track in {}",
        if track.is_generated { "generated" } else { "manual" },
        track.language_code
    );

    let entries = provider.fetch_entries(track).await?;
    Ok((join_entries(&entries), language))
}

/// Pick a track and the language to report for it.
///
/// Only the first-available fallback reports the track's own language code.
fn select_track<'a>(
    list: &'a TranscriptList,
    language: &str,
) -> Option<(&'a TranscriptTrack, String)> {
    if let Some(track) = list.find_manual(language) {
        return Some((track, language.to_string()));
    }

    if let Some(track) = list.find_generated(language) {
        return Some((track, language.to_string()));
    }

    list.first()
        .map(|track| (track, track.language_code.clone()))
}

/// Join entry texts with single spaces, skipping empty ones
fn join_entries(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .filter_map(|entry| entry.text.as_deref())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
