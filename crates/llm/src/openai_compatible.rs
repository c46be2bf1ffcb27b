use crate::traits::*;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct OpenAICompatibleProvider {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: Option<String>, model: String) -> Self {
        Self {
            http: Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn generate(
        &self,
        messages: &[Message],
        tools: Option<&[Value]>,
    ) -> Result<GenerateResponse, ProviderError> {
        let body = ChatRequest {
            model: &self.model,
            messages: messages.iter().map(Message::to_wire).collect(),
            tools: tools.filter(|t| !t.is_empty()),
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(
            "Requesting completion from {} ({} messages)",
            self.endpoint,
            messages.len()
        );
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("{status}: {detail}")));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        into_generate_response(completion)
    }

    fn name(&self) -> &str {
        "OpenAI Compatible"
    }
}

fn into_generate_response(completion: ChatResponse) -> Result<GenerateResponse, ProviderError> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

    Ok(GenerateResponse {
        content: choice.message.content,
        tool_calls: choice
            .message
            .tool_calls
            .into_iter()
            .map(into_tool_call)
            .collect(),
        finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
    })
}

/// Arguments that are not valid JSON are kept verbatim as a string so the
/// caller can answer the call with a validation error.
fn into_tool_call(call: WireToolCall) -> ToolCall {
    let raw = call.function.arguments.unwrap_or_default();
    let arguments = if raw.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(
                "Tool call {} has malformed arguments: {}",
                call.function.name, e
            );
            Value::String(raw)
        })
    };
    ToolCall {
        id: call.id,
        name: call.function.name,
        arguments,
    }
}
