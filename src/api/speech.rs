//! Local speech-synthesis engine client (VOICEVOX-compatible HTTP API).
//!
//! Two-step synthesis: POST `/audio_query` builds a synthesis query for the
//! text, POST `/synthesis` renders it to WAV bytes. The engine runs on
//! localhost and needs no authentication.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

use super::check_response;

#[derive(Debug, Deserialize)]
pub struct Speaker {
    pub name: String,
    #[serde(rename = "speaker_uuid", default)]
    pub speaker_uuid: Option<String>,
    #[serde(default)]
    pub styles: Vec<SpeakerStyle>,
}

#[derive(Debug, Deserialize)]
pub struct SpeakerStyle {
    pub name: String,
    pub id: u32,
}

pub struct SpeechClient {
    http: Client,
    base_url: String,
}

impl SpeechClient {
    pub fn new(http: Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Enumerate installed voices and their style IDs.
    pub async fn speakers(&self) -> Result<Vec<Speaker>> {
        let response = self
            .http
            .get(format!("{}/speakers", self.base_url))
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Synthesize text with the given style ID, returning WAV bytes.
    pub async fn synthesize(&self, text: &str, speaker: u32) -> Result<Vec<u8>> {
        debug!(speaker, chars = text.len(), "building audio query");
        let response = self
            .http
            .post(format!("{}/audio_query", self.base_url))
            .query(&[("text", text), ("speaker", &speaker.to_string())])
            .send()
            .await?;
        let response = check_response(response).await?;
        let query: serde_json::Value = response.json().await?;

        debug!(speaker, "rendering synthesis");
        let response = self
            .http
            .post(format!("{}/synthesis", self.base_url))
            .query(&[("speaker", speaker.to_string())])
            .json(&query)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_speakers() {
        let json = r#"[
            {
                "name": "Zundamon",
                "speaker_uuid": "388f246b-8c41-4ac1-8e2d-5d79f3ff56d9",
                "styles": [
                    {"name": "Normal", "id": 3},
                    {"name": "Whisper", "id": 22}
                ],
                "version": "0.14.0"
            }
        ]"#;
        let speakers: Vec<Speaker> = serde_json::from_str(json).unwrap();
        assert_eq!(speakers.len(), 1);
        assert_eq!(speakers[0].styles.len(), 2);
        assert_eq!(speakers[0].styles[1].id, 22);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = SpeechClient::new(Client::new(), "http://127.0.0.1:50021/".to_string());
        assert_eq!(client.base_url, "http://127.0.0.1:50021");
    }
}
