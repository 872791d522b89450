//! Blocking HTTP transport to the Personalizer REST API.

use anyhow::{Context, Result};
use personalizer_core::{RankBackend, RankRequest, RankResponse};
use reqwest::blocking::Client;
use serde_json::json;
use tracing::debug;

use crate::config::PersonalizerConfig;

const API_PREFIX: [&str; 2] = ["personalizer", "v1.0"];
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Normalizes `base` to `<base>/personalizer/v1.0`, tolerating a trailing
/// slash or an already present API prefix.
fn build_api_base(base: &str) -> Result<String> {
    let mut target = url::Url::parse(base).context("Invalid endpoint URL")?;

    let mut segments: Vec<String> = target
        .path_segments()
        .map(|iter| iter.map(String::from).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if segments.ends_with(&API_PREFIX.map(String::from)) {
        segments.truncate(segments.len() - API_PREFIX.len());
    }

    target
        .path_segments_mut()
        .map_err(|()| anyhow::anyhow!("Endpoint URL cannot be used as a base"))?
        .clear()
        .extend(segments)
        .extend(API_PREFIX);

    Ok(target.as_str().trim_end_matches('/').to_string())
}

pub struct PersonalizerClient {
    client: Client,
    api_base: String,
    key: String,
}

impl PersonalizerClient {
    pub fn new(config: &PersonalizerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_base: build_api_base(&config.endpoint)?,
            key: config.key.clone(),
        })
    }

    fn rank_url(&self) -> String {
        format!("{}/rank", self.api_base)
    }

    fn reward_url(&self, event_id: &str) -> String {
        format!("{}/events/{}/reward", self.api_base, event_id)
    }
}

impl RankBackend for PersonalizerClient {
    type Error = reqwest::Error;

    fn rank(&mut self, request: &RankRequest) -> Result<RankResponse, reqwest::Error> {
        debug!(event_id = %request.event_id, "POST rank");
        self.client
            .post(self.rank_url())
            .header(KEY_HEADER, &self.key)
            .json(request)
            .send()?
            .error_for_status()?
            .json::<RankResponse>()
    }

    fn reward(&mut self, event_id: &str, value: f32) -> Result<(), reqwest::Error> {
        debug!(event_id, value, "POST reward");
        self.client
            .post(self.reward_url(event_id))
            .header(KEY_HEADER, &self.key)
            .json(&json!({ "value": value }))
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_api_base() {
        let cases = vec![
            (
                "https://tastes.cognitiveservices.azure.com/",
                "https://tastes.cognitiveservices.azure.com/personalizer/v1.0",
            ),
            (
                "https://tastes.cognitiveservices.azure.com",
                "https://tastes.cognitiveservices.azure.com/personalizer/v1.0",
            ),
            (
                "https://tastes.cognitiveservices.azure.com/personalizer/v1.0/",
                "https://tastes.cognitiveservices.azure.com/personalizer/v1.0",
            ),
            ("http://localhost:5000/proxy", "http://localhost:5000/proxy/personalizer/v1.0"),
        ];

        for (input, expected) in cases {
            assert_eq!(build_api_base(input).unwrap(), expected);
        }
    }

    #[test]
    fn rejects_non_base_urls() {
        assert!(build_api_base("mailto:someone@example.org").is_err());
        assert!(build_api_base("not a url").is_err());
    }

    #[test]
    fn request_urls() {
        let client = PersonalizerClient::new(&PersonalizerConfig {
            endpoint: "https://tastes.cognitiveservices.azure.com/".into(),
            key: "k".into(),
            timeout: std::time::Duration::from_secs(1),
        })
        .unwrap();
        assert_eq!(
            client.rank_url(),
            "https://tastes.cognitiveservices.azure.com/personalizer/v1.0/rank"
        );
        assert_eq!(
            client.reward_url("abc"),
            "https://tastes.cognitiveservices.azure.com/personalizer/v1.0/events/abc/reward"
        );
    }
}
