//! Tool-calling loop between an LLM and the dispatcher.

use anyhow::{Context, Result};
use hubgate_llm::{LLMProvider, Message};
use hubgate_tools::{Dispatcher, ErrorBody, InvocationResponse, ToolError};
use serde_json::Value;
use tracing::{info, warn};

const SYSTEM_PROMPT: &str = "You manage GitHub repositories through the provided tools. \
Call tools when you need data or need to change something, then answer briefly.";

#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    /// Final answer, or `None` when the step limit was reached first.
    pub answer: Option<String>,
    pub steps: usize,
    pub tool_calls: usize,
}

pub async fn run_agent(
    llm: &dyn LLMProvider,
    dispatcher: &Dispatcher,
    prompt: &str,
    max_steps: usize,
) -> Result<AgentOutcome> {
    let registry = dispatcher.registry();
    let tools = registry.function_schemas();
    let mut messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
    let mut tool_calls = 0;

    for step in 1..=max_steps {
        let response = llm
            .generate(&messages, Some(&tools))
            .await
            .with_context(|| format!("{} request failed at step {}", llm.name(), step))?;

        if response.tool_calls.is_empty() {
            return Ok(AgentOutcome {
                answer: Some(response.content.unwrap_or_default()),
                steps: step,
                tool_calls,
            });
        }

        messages.push(Message::assistant(
            response.content.clone(),
            response.tool_calls.clone(),
        ));
        for call in response.tool_calls {
            tool_calls += 1;
            let outcome: InvocationResponse = match registry.resolve_function_name(&call.name) {
                Some(_) if call.raw_arguments().is_some() => {
                    warn!("Model sent malformed arguments for {}", call.name);
                    let err = ToolError::Validation(format!(
                        "arguments for '{}' are not a JSON object: {}",
                        call.name,
                        call.raw_arguments().unwrap_or_default()
                    ));
                    InvocationResponse::Failure(ErrorBody::from(&err))
                }
                Some(qualified) => {
                    info!("Step {}: calling {}", step, qualified);
                    dispatcher.invoke(&qualified, call.arguments).await.into()
                }
                None => {
                    warn!("Model requested unknown function {}", call.name);
                    let err = ToolError::UnknownTool {
                        name: call.name.clone(),
                    };
                    InvocationResponse::Failure(ErrorBody::from(&err))
                }
            };
            let content = serde_json::to_string(&outcome).unwrap_or_else(|_| Value::Null.to_string());
            messages.push(Message::tool_result(call.id, content));
        }
    }

    warn!("Stopped after {} steps without a final answer", max_steps);
    Ok(AgentOutcome {
        answer: None,
        steps: max_steps,
        tool_calls,
    })
}
