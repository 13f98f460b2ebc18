//! OpenAI Responses API client for fetching shopping items.
//!
//! Sends a fixed shopping-assistant system prompt plus the user's free-text
//! prompt, then parses the model's JSON output into candidate items with
//! title, price, and URLs.

use anyhow::{anyhow, Result};
use regex::Regex;
use serde::Deserialize;

use shop_viz_core::{CandidateItem, OpenAiConfig};

const SYSTEM_PROMPT: &str = "\
You are a 'ChatGPT Shopping' shopping assistant. Given a user request, \
return *only* valid JSON (no markdown fences, no extra text) - an array of \
objects, each with these keys:
  - title: string, the product name
  - price: number or null, price in USD
  - urls: array of strings, all direct, working links to that product's \
pages (manufacturer site, major retailers, marketplaces, etc.). Do not \
artificially limit the list; include every relevant URL you can find.
Do not include any other fields or commentary.";

/// Client for the shopping-item generation endpoint.
#[derive(Debug, Clone)]
pub struct ShoppingClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ShoppingClient {
    /// Creates a client from the OpenAI config section.
    #[must_use]
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    /// Fetches candidate shopping items for a free-text prompt.
    ///
    /// Malformed array elements are skipped with a warning; a response that
    /// is not a JSON array at all is an error.
    ///
    /// # Errors
    /// Returns an error if the HTTP call fails, the response carries no
    /// output text, or the output is not a JSON array.
    pub async fn fetch_items(&self, prompt: &str) -> Result<Vec<CandidateItem>> {
        let request = serde_json::json!({
            "model": self.model,
            "input": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });

        let response: ResponsesReply = self
            .client
            .post(format!("{}/v1/responses", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let raw = response.output_text();
        if raw.trim().is_empty() {
            return Err(anyhow!("No output text in model response"));
        }

        parse_items(&raw)
    }
}

/// Parses the model's raw output into candidate items.
///
/// Strips a ```json fence when present, requires a top-level JSON array,
/// and skips array elements that do not deserialize as candidate items.
///
/// # Errors
/// Returns an error if the output is not valid JSON or not an array.
pub fn parse_items(raw: &str) -> Result<Vec<CandidateItem>> {
    let json_str = strip_json_fence(raw);

    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| anyhow!("Failed to parse JSON from model output: {e}\n{raw}"))?;

    let serde_json::Value::Array(elements) = parsed else {
        return Err(anyhow!("Expected a JSON array from model output"));
    };

    let mut items = Vec::with_capacity(elements.len());
    for element in elements {
        match serde_json::from_value::<CandidateItem>(element) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!("Skipping malformed candidate item: {}", e),
        }
    }

    Ok(items)
}

/// Pulls the `[...]` block out of a ```json fence, or returns the input
/// unchanged when no fence is present.
fn strip_json_fence(raw: &str) -> &str {
    let Ok(fence) = Regex::new(r"(?is)```json\s*([\s\S]+?)\s*```") else {
        return raw;
    };
    fence
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str())
}

/// Reply shape of the Responses API, reduced to the output text fragments.
#[derive(Debug, Deserialize)]
struct ResponsesReply {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ResponsesReply {
    /// Concatenates all `output_text` content parts.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .flat_map(|item| &item.content)
            .filter(|part| part.kind == "output_text")
            .map(|part| part.text.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_items_plain_array() {
        let items = parse_items(r#"[{"title":"foo","price":1.23,"urls":["u"]}]"#).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "foo");
        assert_eq!(items[0].price, Some(dec!(1.23)));
    }

    #[test]
    fn test_parse_items_strips_json_fence() {
        let fenced = "```json\n[{\"title\":\"bar\",\"price\":null,\"urls\":[]}]\n```";
        let items = parse_items(fenced).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "bar");
        assert!(items[0].price.is_none());
    }

    #[test]
    fn test_parse_items_invalid_json_is_error() {
        assert!(parse_items("not json").is_err());
    }

    #[test]
    fn test_parse_items_non_array_is_error() {
        assert!(parse_items(r#"{"title":"foo"}"#).is_err());
    }

    #[test]
    fn test_parse_items_skips_malformed_elements() {
        let raw = r#"[{"title":"ok","urls":[]},{"price":1.0},{"title":"also ok"}]"#;
        let items = parse_items(raw).unwrap();
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["ok", "also ok"]);
    }

    #[test]
    fn test_output_text_concatenates_fragments() {
        let reply: ResponsesReply = serde_json::from_str(
            r#"{"output":[{"content":[
                {"type":"output_text","text":"[{\"title\":"},
                {"type":"reasoning","text":"ignored"},
                {"type":"output_text","text":"\"x\"}]"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(reply.output_text(), r#"[{"title":"x"}]"#);
    }
}
