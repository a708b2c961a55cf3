//! A `chat(messages) -> string` convenience wrapper over
//! [`agentic::llm::LlmProvider`], the shape every sub-agent in this crate
//! actually needs.

use agentic::llm::{CompletionRequest, LlmProvider};
use agentic::message::Message;

/// Send `messages` (with an optional `system` prompt) to `provider` and
/// return the assistant's concatenated text content.
pub async fn chat(
    provider: &dyn LlmProvider,
    system: Option<&str>,
    messages: Vec<Message>,
) -> Result<String, agentic::error::LlmError> {
    let mut request = CompletionRequest::new("claude-sonnet-4-20250514");
    request.system = system.map(|s| s.to_string());
    request.messages = messages;

    let response = provider.complete(request).await?;
    Ok(response.message.text_content())
}
