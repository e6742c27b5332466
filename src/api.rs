use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

#[derive(Serialize)]
struct GenerateRequest {
    prompt: String,
}

/// Payload returned by the generate service. `image` is a base64-encoded
/// PNG and the suggestion list uses the singular wire name `followup`;
/// both may be absent or null.
#[derive(Deserialize, Debug, Clone)]
pub struct GenerateReply {
    pub response: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub followup: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct GenerateClient {
    client: Client,
    base_url: String,
}

impl GenerateClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.to_string(),
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<GenerateReply> {
        let url = format!("{}/generate", self.base_url);

        let request = GenerateRequest {
            prompt: prompt.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "server returned status {}",
                response.status().as_u16()
            ));
        }

        let reply: GenerateReply = response.json().await?;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_carries_the_prompt() {
        let request = GenerateRequest {
            prompt: "tell me a joke".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "prompt": "tell me a joke" }));
    }

    #[test]
    fn reply_parses_full_payload() {
        let reply: GenerateReply = serde_json::from_str(
            r#"{"response":"Hi","image":"aGVsbG8=","followup":["A?","B?"]}"#,
        )
        .unwrap();
        assert_eq!(reply.response, "Hi");
        assert_eq!(reply.image.as_deref(), Some("aGVsbG8="));
        assert_eq!(reply.followup.as_deref(), Some(&["A?".to_string(), "B?".to_string()][..]));
    }

    #[test]
    fn reply_tolerates_missing_optional_fields() {
        let reply: GenerateReply = serde_json::from_str(r#"{"response":"Hi"}"#).unwrap();
        assert_eq!(reply.response, "Hi");
        assert!(reply.image.is_none());
        assert!(reply.followup.is_none());
    }

    #[test]
    fn reply_tolerates_null_optional_fields() {
        let reply: GenerateReply =
            serde_json::from_str(r#"{"response":"Hi","image":null,"followup":null}"#).unwrap();
        assert!(reply.image.is_none());
        assert!(reply.followup.is_none());
    }

    #[test]
    fn reply_without_response_text_is_rejected() {
        let result: Result<GenerateReply, _> =
            serde_json::from_str(r#"{"image":"aGVsbG8="}"#);
        assert!(result.is_err());
    }
}
