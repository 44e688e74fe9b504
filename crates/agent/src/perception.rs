//! LLM-backed intent and entity extraction.
//!
//! The model is asked for a small dictionary. Replies are read as JSON first,
//! then with the protocol's literal reader; nothing is ever evaluated. A reply
//! that cannot be read leaves both fields empty rather than failing the run.

use async_trait::async_trait;
use planloop_core::error::Result;
use planloop_core::perception::{Perception, PerceptionOutput};
use planloop_core::provider::{Provider, ProviderRequest};
use planloop_core::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct LlmPerception {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmPerception {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    fn prompt(text: &str) -> String {
        format!(
            r#"Extract the core user intent from this query.

Return the response as a dictionary without any additional text or code block formatting.

user_intent: brief description of the user's intent
some examples: [travel_related_query, weather_query, query_related_to_physics, query_related_to_diets etc.]
entities: list of entities in the query, for example: ['Australia', 'AI', 'physics', 'capital']

Query: {text}"#
        )
    }
}

#[async_trait]
impl Perception for LlmPerception {
    async fn classify(&self, text: &str) -> Result<PerceptionOutput> {
        let mut request = ProviderRequest::new(&self.model, Self::prompt(text));
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = self.provider.complete(request).await?;
        debug!(raw = %response.text, "Perception response");

        match parse_response(&response.text) {
            Some(output) => Ok(output),
            None => {
                warn!(raw = %response.text, "Could not read perception response; continuing without intent");
                Ok(PerceptionOutput::default())
            }
        }
    }
}

/// Read a `{user_intent, entities}` reply. `None` when the reply is not a
/// dictionary at all.
pub fn parse_response(text: &str) -> Option<PerceptionOutput> {
    let body = strip_code_fence(text);

    let map = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json @ serde_json::Value::Object(_)) => Value::from(json),
        _ => planloop_protocol::parse_literal(body)?,
    };
    let map = map.as_map()?;

    Some(PerceptionOutput {
        intent: intent_of(map),
        entities: entities_of(map),
    })
}

fn intent_of(map: &BTreeMap<String, Value>) -> Option<String> {
    let intent = map.get("user_intent").or_else(|| map.get("intent"))?;
    match intent {
        Value::Str(s) if !is_absent(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

fn entities_of(map: &BTreeMap<String, Value>) -> Option<Vec<String>> {
    match map.get("entities")? {
        Value::List(items) => Some(
            items
                .iter()
                .filter(|v| !matches!(v, Value::Str(s) if is_absent(s)))
                .map(Value::to_string)
                .collect(),
        ),
        Value::Str(s) if !is_absent(s) => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

/// `None`/`null` arrive as barewords (or JSON null, which reads as "").
fn is_absent(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s == "None" || s == "null"
}

/// Drop a surrounding Markdown code fence, with or without a language tag.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    // First line of the fence may be a language tag
    match rest.split_once('\n') {
        Some((tag, body)) if !tag.contains(['{', '[']) => body.trim(),
        _ => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;

    #[test]
    fn reads_python_style_dict() {
        let output =
            parse_response("{'user_intent': 'weather_query', 'entities': ['Pune', 'today']}").unwrap();
        assert_eq!(output.intent.as_deref(), Some("weather_query"));
        assert_eq!(output.entities, Some(vec!["Pune".into(), "today".into()]));
    }

    #[test]
    fn reads_fenced_json() {
        let output = parse_response(
            "```json\n{\"user_intent\": \"arithmetic\", \"entities\": [5, 3]}\n```",
        )
        .unwrap();
        assert_eq!(output.intent.as_deref(), Some("arithmetic"));
        assert_eq!(output.entities, Some(vec!["5".into(), "3".into()]));
    }

    #[test]
    fn fenced_without_language_tag() {
        let output = parse_response("```\n{'user_intent': 'lookup'}\n```").unwrap();
        assert_eq!(output.intent.as_deref(), Some("lookup"));
        assert!(output.entities.is_none());
    }

    #[test]
    fn none_values_are_absent() {
        let output = parse_response("{'user_intent': None, 'entities': None}").unwrap();
        assert!(output.intent.is_none());
        assert!(output.entities.is_none());

        let output = parse_response(r#"{"user_intent": null, "entities": ["AI", null]}"#).unwrap();
        assert!(output.intent.is_none());
        assert_eq!(output.entities, Some(vec!["AI".into()]));
    }

    #[test]
    fn prose_is_not_a_dict() {
        assert!(parse_response("The user wants the weather.").is_none());
        assert!(parse_response("['just', 'a', 'list']").is_none());
    }

    #[tokio::test]
    async fn unreadable_reply_yields_empty_output() {
        let provider = Arc::new(SequentialMockProvider::single_text("I think it's about weather"));
        let perception = LlmPerception::new(provider, "mock-model");
        let output = perception.classify("weather in Pune?").await.unwrap();
        assert_eq!(output, PerceptionOutput::default());
    }

    #[tokio::test]
    async fn prompt_carries_query_and_settings() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "{'user_intent': 'weather_query', 'entities': ['Pune']}",
        ));
        let perception = LlmPerception::new(provider.clone(), "gemini-2.0-flash")
            .with_temperature(0.0)
            .with_max_tokens(128);

        let output = perception.classify("weather in Pune?").await.unwrap();
        assert_eq!(output.intent.as_deref(), Some("weather_query"));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains("Query: weather in Pune?"));
        assert_eq!(requests[0].model, "gemini-2.0-flash");
        assert_eq!(requests[0].max_tokens, Some(128));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = Arc::new(SequentialMockProvider::failing());
        let perception = LlmPerception::new(provider, "mock-model");
        assert!(perception.classify("anything").await.is_err());
    }
}
