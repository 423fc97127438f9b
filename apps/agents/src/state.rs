use std::sync::Arc;

use crate::chat::ChatSettings;
use crate::config::Config;
use crate::evaluation::workflow::WorkflowTrigger;
use crate::evaluation::EvaluationSettings;
use crate::llm_client::ModelInvoker;
use crate::storage::{ObjectStore, RecordStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub objects: Arc<dyn ObjectStore>,
    pub store: Arc<dyn RecordStore>,
    /// Model behind the retry decorator.
    pub model: Arc<dyn ModelInvoker>,
    /// Starts step-workflow executions when `PIPELINE_MODE=workflow`.
    pub workflow: Arc<dyn WorkflowTrigger>,
    pub config: Config,
    pub evaluation: Arc<EvaluationSettings>,
    pub chat: Arc<ChatSettings>,
}

impl AppState {
    pub fn new(
        config: Config,
        objects: Arc<dyn ObjectStore>,
        store: Arc<dyn RecordStore>,
        model: Arc<dyn ModelInvoker>,
        workflow: Arc<dyn WorkflowTrigger>,
    ) -> Self {
        Self {
            evaluation: Arc::new(config.evaluation_settings()),
            chat: Arc::new(config.chat_settings()),
            objects,
            store,
            model,
            workflow,
            config,
        }
    }
}
