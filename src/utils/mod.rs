use std::sync::OnceLock;

use regex::Regex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// Install the stderr tracing subscriber shared by both binaries.
///
/// stdout is reserved for tool output, so log lines never go there.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "transcript_tools=debug"
    } else {
        "transcript_tools=warn"
    };

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Pull the video id out of a YouTube URL.
///
/// Inputs that are not recognizable YouTube URLs are treated as opaque ids and returned trimmed.
pub fn extract_video_id(input: &str) -> String {
    let trimmed = input.trim();

    let Ok(parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);

    let id = match host {
        "youtu.be" => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        "youtube.com" | "music.youtube.com" => {
            let segments: Vec<&str> = parsed
                .path_segments()
                .map(|s| s.collect())
                .unwrap_or_default();
            match segments.as_slice() {
                ["watch", ..] => parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                ["embed" | "shorts" | "v" | "live", id, ..] => Some(id.to_string()),
                _ => None,
            }
        }
        _ => None,
    };

    match id {
        Some(id) if !id.is_empty() => id,
        _ => trimmed.to_string(),
    }
}

/// Mask a secret for display, keeping five characters on each end.
///
/// Secrets too short to mask meaningfully are hidden entirely.
pub fn mask_secret(secret: &str) -> String {
    const VISIBLE: usize = 5;

    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= VISIBLE * 2 {
        return "*****".to_string();
    }

    let head: String = chars[..VISIBLE].iter().collect();
    let tail: String = chars[chars.len() - VISIBLE..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Decode HTML character references, named (full HTML5 set) and numeric
pub fn unescape_html(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

/// Remove inline markup such as `<font color="#E5E5E5">` from caption text
pub fn strip_tags(input: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| {
        Regex::new(r"</?[A-Za-z][^>]*>").expect("valid tag regex")
    });
    tag.replace_all(input, "").into_owned()
}
