//! LLM-backed decision collaborator.

use async_trait::async_trait;
use planloop_core::decision::{Decision, StepContext};
use planloop_core::error::Result;
use planloop_core::provider::{Provider, ProviderRequest};
use planloop_core::Value;
use std::sync::Arc;
use tracing::debug;

/// Asks a model for exactly one protocol line per step.
pub struct LlmDecision {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmDecision {
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
}

/// Build the decision prompt for one step.
pub fn build_prompt(context: &StepContext) -> String {
    let tool_context = if context.tool_descriptions.is_empty() {
        String::new()
    } else {
        format!(
            "\nYou have access to the following tools:\n{}",
            context.tool_descriptions
        )
    };

    let intent = context.intent.as_deref().unwrap_or("None");
    let entities = match &context.entities {
        Some(entities) => {
            Value::List(entities.iter().map(|e| Value::from(e.as_str())).collect()).to_literal()
        }
        None => "None".to_string(),
    };

    format!(
        r#"You are a decision-making agent. Based on the perception output and tool descriptions, generate a plan to achieve the user's goal.
You have access to tools {tool_context}
Your job is to solve the user's request step-by-step by:

1. If using a tool, respond in this format:
    FUNCTION_CALL: tool_name|param1=value1|param2=value2
2. After each step, self-verify your intermediate reasoning for sanity or consistency.
3. If the result is final, respond in this format:
    FINAL_ANSWER: [your final result]
4. If you're uncertain, a tool fails, or an answer cannot be computed reliably, explain why and stop with:
    ERROR: [explanation of the issue]
5. Before solving, briefly identify the reasoning type involved (e.g., arithmetic, logic, lookup, planning, classification). This helps select the right tool or reasoning approach.

Guidelines:
- Respond using EXACTLY ONE of the formats above per step.
- Do NOT include extra text, explanation, or formatting.
- Use nested keys (e.g., input.string) and square brackets for lists.

Input Summary:
- User Input: {user_input}
- User Intent: {intent}
- Entities: {entities}

Examples:
- Reasoning Type: arithmetic
- FUNCTION_CALL: add|a=5|b=3
- FUNCTION_CALL: strings_to_chars_to_int|input.string=INDIA
- FUNCTION_CALL: int_list_to_exponential_sum|input.int_list=[73,78,68,73,65]
- FINAL_ANSWER: [42]
"#,
        user_input = context.user_input,
    )
}

#[async_trait]
impl Decision for LlmDecision {
    async fn propose(&self, context: &StepContext) -> Result<String> {
        let prompt = build_prompt(context);
        debug!(prompt = %prompt, "Decision prompt");

        let mut request = ProviderRequest::new(&self.model, prompt);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;

        let response = self.provider.complete(request).await?;
        let text = response.text.trim().to_string();
        debug!(response = %text, tokens = ?response.total_tokens, "Decision response");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SequentialMockProvider;
    use planloop_core::perception::PerceptionOutput;

    fn context() -> StepContext {
        StepContext::new(
            "weather in Pune?",
            PerceptionOutput {
                intent: Some("weather_query".into()),
                entities: Some(vec!["Pune".into(), "today's".into()]),
            },
            "- get_current_weather: Get the current weather for a location",
        )
    }

    #[test]
    fn prompt_includes_summary_and_tools() {
        let prompt = build_prompt(&context());
        assert!(prompt.contains("- User Input: weather in Pune?"));
        assert!(prompt.contains("- User Intent: weather_query"));
        assert!(prompt.contains(r"- Entities: ['Pune', 'today\'s']"));
        assert!(prompt.contains("You have access to the following tools:\n- get_current_weather"));
        assert!(prompt.contains("FUNCTION_CALL: add|a=5|b=3"));
    }

    #[test]
    fn prompt_marks_missing_perception() {
        let ctx = StepContext::new("8", PerceptionOutput::default(), "");
        let prompt = build_prompt(&ctx);
        assert!(prompt.contains("- User Intent: None"));
        assert!(prompt.contains("- Entities: None"));
        assert!(!prompt.contains("following tools"));
    }

    #[tokio::test]
    async fn propose_returns_trimmed_text() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "\n  FUNCTION_CALL: get_current_weather|location=Pune  \n",
        ));
        let decision = LlmDecision::new(provider.clone(), "mock-model").with_temperature(0.0);

        let text = decision.propose(&context()).await.unwrap();
        assert_eq!(text, "FUNCTION_CALL: get_current_weather|location=Pune");

        let requests = provider.requests();
        assert_eq!(requests[0].temperature, 0.0);
        assert!(requests[0].prompt.contains("weather in Pune?"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let decision = LlmDecision::new(Arc::new(SequentialMockProvider::failing()), "mock-model");
        let err = decision.propose(&context()).await.unwrap_err();
        assert!(matches!(err, planloop_core::Error::Provider(_)));
    }
}
