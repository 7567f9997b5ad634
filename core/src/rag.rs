//! Conveniences on top of the RAG chat endpoint.

use crate::client::PlaypathClient;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::{ChatMessage, ChatRequest};

/// Ask a single question without history and return just the reply text.
///
/// `Ok(None)` means the API answered successfully but without a string
/// `reply` field.
pub fn ask<T: Transport>(client: &PlaypathClient<T>, message: &str) -> Result<Option<String>> {
    let response = client.chat(&ChatRequest::new(message))?;
    Ok(response
        .get("reply")
        .and_then(|reply| reply.as_str())
        .map(str::to_string))
}

/// Turn a flat transcript into chat history, alternating user and assistant
/// turns and starting with the user.
pub fn build_history<I, S>(messages: I) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    messages
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            if i % 2 == 0 {
                ChatMessage::user(text)
            } else {
                ChatMessage::assistant(text)
            }
        })
        .collect()
}
