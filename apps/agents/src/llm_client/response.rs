//! Decoding of the response shapes providers and agent runtimes return.
//!
//! A model answer may arrive as a bare string, a list of content parts, a
//! `{role, content}` message, or one of those inside a provider envelope
//! (`{"message": ...}` or `{"output": ...}`). Every shape reduces to the
//! concatenated text of its text parts.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ModelOutput {
    Text(String),
    Parts(Vec<ContentPart>),
    Message {
        #[serde(default)]
        role: Option<String>,
        content: MessageContent,
    },
    Envelope {
        message: Box<ModelOutput>,
    },
    Output {
        output: Box<ModelOutput>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text { text: String },
    /// Tool calls, images and other non-text parts.
    Other(Value),
}

impl ModelOutput {
    pub fn into_text(self) -> String {
        match self {
            ModelOutput::Text(text) => text,
            ModelOutput::Parts(parts) => join_parts(parts),
            ModelOutput::Message { role, content } => {
                if let Some(role) = role.filter(|r| r != "assistant") {
                    debug!(role = %role, "Model output carried a non-assistant role");
                }
                match content {
                    MessageContent::Text(text) => text,
                    MessageContent::Parts(parts) => join_parts(parts),
                }
            }
            ModelOutput::Envelope { message } => message.into_text(),
            ModelOutput::Output { output } => output.into_text(),
        }
    }
}

/// Decodes a provider response body and returns its text.
pub fn decode_text(body: &[u8]) -> Result<String, serde_json::Error> {
    serde_json::from_slice::<ModelOutput>(body).map(ModelOutput::into_text)
}

fn join_parts(parts: Vec<ContentPart>) -> String {
    parts
        .into_iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(text),
            ContentPart::Other(other) => {
                debug!(kind = ?other.get("type"), "Skipping non-text content part");
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
