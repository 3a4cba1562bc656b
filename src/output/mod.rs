use anyhow::Result;
use serde::Serialize;
use std::io::{self, Write};

use crate::cli::OutputFormat;
use crate::transcript::TranscriptResult;

/// Wire shape of the fetcher's JSON line
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TranscriptPayload {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranscriptPayload {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            transcript: None,
            lang: None,
            error: Some(message.into()),
        }
    }
}

impl From<&TranscriptResult> for TranscriptPayload {
    fn from(result: &TranscriptResult) -> Self {
        match result {
            TranscriptResult::Success { text, language } => Self {
                success: true,
                transcript: Some(text.clone()),
                lang: Some(language.clone()),
                error: None,
            },
            TranscriptResult::Failure { message } => Self::failure(message.clone()),
        }
    }
}

/// Compact JSON with `", "` and `": "` separators.
///
/// Consumers of the fetcher compare output against this layout, so it is kept stable.
#[derive(Debug, Default)]
pub struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }
}

/// Serialize a value as one spaced JSON line (no trailing newline)
pub fn to_json_line<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buf)?)
}

/// Write the payload to stdout in the requested format
pub fn write_payload<W: Write>(
    out: &mut W,
    payload: &TranscriptPayload,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", to_json_line(payload)?)?,
        OutputFormat::Text => match (&payload.transcript, &payload.error) {
            (Some(text), _) => writeln!(out, "{}", text)?,
            (None, Some(error)) => eprintln!("Error: {}", error),
            (None, None) => {}
        },
    }
    out.flush()?;
    Ok(())
}
