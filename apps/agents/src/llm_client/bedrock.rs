use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::{DisplayErrorContext, SdkError};
use aws_sdk_bedrockruntime::operation::invoke_model::InvokeModelError;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client as BedrockRuntimeClient;
use serde_json::{json, Value};
use tracing::debug;

use super::response::decode_text;
use super::{LlmError, ModelInvoker, ModelRequest};

pub const DEFAULT_MODEL: &str = "anthropic.claude-3-5-sonnet-20240620-v1:0";
const ANTHROPIC_BEDROCK_VERSION: &str = "bedrock-2023-05-31";

/// Bedrock `invoke_model` client. Anthropic model ids get the Anthropic
/// messages body; every other model gets the Nova messages body.
#[derive(Clone)]
pub struct BedrockClient {
    client: BedrockRuntimeClient,
    model_id: String,
}

impl BedrockClient {
    pub fn new(client: BedrockRuntimeClient, model_id: String) -> Self {
        Self { client, model_id }
    }
}

fn request_body(model_id: &str, request: &ModelRequest) -> Value {
    if model_id.contains("anthropic.") {
        json!({
            "anthropic_version": ANTHROPIC_BEDROCK_VERSION,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "system": request.system,
            "messages": [{"role": "user", "content": request.prompt}],
        })
    } else {
        json!({
            "schemaVersion": "messages-v1",
            "system": [{"text": request.system}],
            "messages": [{"role": "user", "content": [{"text": request.prompt}]}],
            "inferenceConfig": {
                "maxTokens": request.max_tokens,
                "temperature": request.temperature,
            },
        })
    }
}

fn provider_error(err: SdkError<InvokeModelError>) -> LlmError {
    let transient = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(service) => {
            let e = service.err();
            e.is_throttling_exception()
                || e.is_service_unavailable_exception()
                || e.is_model_timeout_exception()
                || e.is_internal_server_exception()
        }
        _ => false,
    };
    LlmError::Provider {
        message: DisplayErrorContext(&err).to_string(),
        transient,
    }
}

#[async_trait]
impl ModelInvoker for BedrockClient {
    async fn invoke(&self, request: &ModelRequest) -> Result<String, LlmError> {
        let body = serde_json::to_vec(&request_body(&self.model_id, request))?;

        let output = self
            .client
            .invoke_model()
            .model_id(&self.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(provider_error)?;

        let text = decode_text(output.body().as_ref())?;
        debug!(model_id = %self.model_id, chars = text.len(), "Bedrock invocation succeeded");
        if text.trim().is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
