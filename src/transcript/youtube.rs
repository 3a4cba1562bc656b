use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;

use super::{TranscriptEntry, TranscriptList, TranscriptProvider, TranscriptTrack};
use crate::config::TranscriptConfig;
use crate::utils::{strip_tags, unescape_html};
use crate::ToolError;

/// Client identity sent to the innertube player endpoint
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// YouTube caption provider backed by the innertube player API
pub struct YoutubeProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl CaptionTrack {
    fn into_track(self) -> TranscriptTrack {
        let language_name = self
            .name
            .and_then(|name| {
                name.runs
                    .into_iter()
                    .next()
                    .map(|run| run.text)
                    .or(name.simple_text)
            })
            .unwrap_or_else(|| self.language_code.clone());

        TranscriptTrack {
            language_name,
            is_generated: self.kind.as_deref() == Some("asr"),
            base_url: self.base_url.replace("&fmt=srv3", ""),
            language_code: self.language_code,
        }
    }
}

impl YoutubeProvider {
    pub fn new(config: &TranscriptConfig) -> Result<Self, ToolError> {
        let mut headers = HeaderMap::new();
        let header = |name: &str, value: &str| {
            HeaderValue::from_str(value).map_err(|e| {
                ToolError::ConfigurationFailure(format!("Invalid {}: {}", name, e))
            })
        };
        headers.insert(USER_AGENT, header("user agent", &config.user_agent)?);
        headers.insert(
            ACCEPT_LANGUAGE,
            header("accept language", &config.accept_language)?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| ToolError::ConfigurationFailure(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the watch page and pull the innertube API key out of it
    async fn fetch_api_key(&self, video_id: &str) -> Result<String, ToolError> {
        let url = format!("{}/watch?v={}", self.base_url, urlencoding::encode(video_id));
        tracing::debug!("Fetching watch page: {}", url);

        let response = self.client.get(&url).send().await?;
        let html = ensure_success(response).await?.text().await?;

        if let Some(key) = extract_api_key(&html) {
            return Ok(key);
        }

        if html.contains("class=\"g-recaptcha\"") {
            return Err(ToolError::RequestBlocked);
        }

        Err(ToolError::ProviderUnavailable)
    }

    async fn fetch_player_response(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> Result<PlayerResponse, ToolError> {
        let url = format!("{}/youtubei/v1/player", self.base_url);
        let body = json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?;

        let text = ensure_success(response).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl TranscriptProvider for YoutubeProvider {
    async fn list_transcripts(&self, video_id: &str) -> Result<TranscriptList, ToolError> {
        let api_key = self.fetch_api_key(video_id).await?;
        let player = self.fetch_player_response(video_id, &api_key).await?;

        if let Some(playability) = &player.playability_status {
            let status = playability.status.as_deref().unwrap_or("OK");
            if status != "OK" {
                let reason = playability
                    .reason
                    .clone()
                    .unwrap_or_else(|| status.to_string());
                return Err(ToolError::VideoUnavailable(reason));
            }
        }

        let renderer = player
            .captions
            .and_then(|captions| captions.player_captions_tracklist_renderer)
            .ok_or(ToolError::TranscriptsDisabled)?;

        let tracks: Vec<TranscriptTrack> = renderer
            .caption_tracks
            .into_iter()
            .map(CaptionTrack::into_track)
            .collect();

        tracing::debug!(
            "Tracks for {}: {}",
            video_id,
            tracks
                .iter()
                .map(|t| {
                    let suffix = if t.is_generated { " (auto)" } else { "" };
                    format!("{}{}", t.language_code, suffix)
                })
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(TranscriptList::new(video_id, tracks))
    }

    async fn fetch_entries(
        &self,
        track: &TranscriptTrack,
    ) -> Result<Vec<TranscriptEntry>, ToolError> {
        tracing::debug!("Fetching timed text for {}", track.language_code);

        let response = self.client.get(&track.base_url).send().await?;
        let xml = ensure_success(response).await?.text().await?;

        Ok(parse_timed_text(&xml))
    }

    fn provider_name(&self) -> &'static str {
        "YouTube"
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ToolError::RequestBlocked);
    }

    Err(ToolError::Provider(format!("HTTP {} from {}", status, response.url())))
}

fn extract_api_key(html: &str) -> Option<String> {
    static KEY: OnceLock<Regex> = OnceLock::new();
    let key = KEY.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid api key regex")
    });

    key.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse the timedtext XML format into entries.
///
/// Text is XML-escaped on top of HTML escaping, so it is unescaped twice.
fn parse_timed_text(xml: &str) -> Vec<TranscriptEntry> {
    static ELEMENT: OnceLock<Regex> = OnceLock::new();
    static ATTR: OnceLock<Regex> = OnceLock::new();

    let element = ELEMENT.get_or_init(|| {
        Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").expect("valid text element regex")
    });
    let attr = ATTR.get_or_init(|| {
        Regex::new(r#"(\w+)="([^"]*)""#).expect("valid attribute regex")
    });

    element
        .captures_iter(xml)
        .map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let mut start = 0.0;
            let mut duration = 0.0;
            for attr_caps in attr.captures_iter(attrs) {
                let value = attr_caps[2].parse::<f64>().unwrap_or(0.0);
                match &attr_caps[1] {
                    "start" => start = value,
                    "dur" => duration = value,
                    _ => {}
                }
            }

            let text = caps
                .get(2)
                .map(|m| strip_tags(&unescape_html(&unescape_html(m.as_str()))))
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty());

            TranscriptEntry { text, start, duration }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WATCH_PAGE: &str =
        r#"<html><script>ytcfg.set({"INNERTUBE_API_KEY": "AIzaTestKey_123","HL":"en"});</script></html>"#;

    const TIMED_TEXT: &str = r##"<?xml version="1.0" encoding="utf-8" ?><transcript>
<text start="0.0" dur="1.54">Hey there</text>
<text start="1.54" dur="4.16">how are you &amp;amp; what&amp;#39;s up</text>
<text start="5.7" dur="0.5"/>
<text start="6.2" dur="2.0"><font color="#E5E5E5">colored</font> text</text>
</transcript>"##;

    fn provider_for(server: &MockServer) -> YoutubeProvider {
        let config = TranscriptConfig {
            base_url: server.uri(),
            ..TranscriptConfig::default()
        };
        YoutubeProvider::new(&config).unwrap()
    }

    async fn mount_watch_page(server: &MockServer, body: &str) {
        Mock::given(method("GET"))
            .and(path("/watch"))
            .and(query_param("v", "abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    async fn mount_player(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/youtubei/v1/player"))
            .and(query_param("key", "AIzaTestKey_123"))
            .and(body_partial_json(json!({ "videoId": "abc123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_timed_text() {
        let entries = parse_timed_text(TIMED_TEXT);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].text.as_deref(), Some("Hey there"));
        assert_eq!(entries[0].duration, 1.54);
        assert_eq!(entries[1].text.as_deref(), Some("how are you & what's up"));
        assert_eq!(entries[1].start, 1.54);
        assert_eq!(entries[2].text, None);
        assert_eq!(entries[3].text.as_deref(), Some("colored text"));
    }

    #[test]
    fn test_extract_api_key() {
        assert_eq!(extract_api_key(WATCH_PAGE).as_deref(), Some("AIzaTestKey_123"));
        assert_eq!(extract_api_key("<html></html>"), None);
    }

    #[test]
    fn test_caption_track_conversion() {
        let track: CaptionTrack = serde_json::from_value(json!({
            "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=ko&fmt=srv3",
            "languageCode": "ko",
            "name": { "runs": [{ "text": "Korean (auto-generated)" }] },
            "kind": "asr"
        }))
        .unwrap();

        let track = track.into_track();
        assert!(track.is_generated);
        assert_eq!(track.language_name, "Korean (auto-generated)");
        assert_eq!(track.base_url, "https://www.youtube.com/api/timedtext?v=abc&lang=ko");
    }

    #[tokio::test]
    async fn test_list_and_fetch_transcript() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_PAGE).await;
        mount_player(
            &server,
            json!({
                "playabilityStatus": { "status": "OK" },
                "captions": {
                    "playerCaptionsTracklistRenderer": {
                        "captionTracks": [
                            {
                                "baseUrl": format!("{}/api/timedtext?v=abc123&lang=en", server.uri()),
                                "languageCode": "en",
                                "name": { "simpleText": "English" }
                            },
                            {
                                "baseUrl": format!("{}/api/timedtext?v=abc123&lang=ko&kind=asr", server.uri()),
                                "languageCode": "ko",
                                "name": { "runs": [{ "text": "Korean (auto-generated)" }] },
                                "kind": "asr"
                            }
                        ]
                    }
                }
            }),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/api/timedtext"))
            .and(query_param("lang", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_string(TIMED_TEXT))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let list = provider.list_transcripts("abc123").await.unwrap();

        assert_eq!(list.video_id, "abc123");
        assert_eq!(list.tracks.len(), 2);
        assert_eq!(list.find_manual("en").unwrap().language_name, "English");
        assert!(list.find_generated("ko").is_some());
        assert!(list.find_manual("ko").is_none());

        let entries = provider
            .fetch_entries(list.find_manual("en").unwrap())
            .await
            .unwrap();
        assert_eq!(entries.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_provider_unavailable() {
        let server = MockServer::start().await;
        mount_watch_page(&server, "<html>no config here</html>").await;

        let err = provider_for(&server).list_transcripts("abc123").await.unwrap_err();
        assert!(matches!(err, ToolError::ProviderUnavailable));
    }

    #[tokio::test]
    async fn test_captcha_page_is_request_blocked() {
        let server = MockServer::start().await;
        mount_watch_page(&server, r#"<form><div class="g-recaptcha"></div></form>"#).await;

        let err = provider_for(&server).list_transcripts("abc123").await.unwrap_err();
        assert!(matches!(err, ToolError::RequestBlocked));
    }

    #[tokio::test]
    async fn test_no_captions_is_transcripts_disabled() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_PAGE).await;
        mount_player(&server, json!({ "playabilityStatus": { "status": "OK" } })).await;

        let err = provider_for(&server).list_transcripts("abc123").await.unwrap_err();
        assert!(matches!(err, ToolError::TranscriptsDisabled));
    }

    #[tokio::test]
    async fn test_unplayable_video() {
        let server = MockServer::start().await;
        mount_watch_page(&server, WATCH_PAGE).await;
        mount_player(
            &server,
            json!({ "playabilityStatus": { "status": "ERROR", "reason": "This video is private" } }),
        )
        .await;

        let err = provider_for(&server).list_transcripts("abc123").await.unwrap_err();
        assert_eq!(err.to_string(), "Video is unavailable: This video is private");
    }

    #[tokio::test]
    async fn test_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = provider_for(&server).list_transcripts("abc123").await.unwrap_err();
        assert!(matches!(err, ToolError::RequestBlocked));

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/watch"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = provider_for(&server).list_transcripts("abc123").await.unwrap_err();
        assert!(err.to_string().starts_with("HTTP 503"));
    }
}
