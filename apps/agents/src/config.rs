use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::chat::ChatSettings;
use crate::evaluation::EvaluationSettings;
use crate::llm_client::{anthropic, bedrock, RetryPolicy, DEFAULT_MAX_TOKENS};
use crate::storage::Tables;

/// Which model provider backs [`crate::llm_client::ModelInvoker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic { api_key: String },
    Bedrock,
}

/// How a résumé upload is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// One supervisor prompt produces every section.
    Supervisor,
    /// Intake record plus the evaluate → gaps → rate → notes workflow.
    Workflow,
}

impl FromStr for PipelineMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "supervisor" => Ok(Self::Supervisor),
            "workflow" => Ok(Self::Workflow),
            other => bail!("PIPELINE_MODE must be 'supervisor' or 'workflow', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub documents_bucket: String,
    pub s3_endpoint: Option<String>,
    pub aws_region: String,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub llm_provider: LlmProvider,
    pub model_id: String,
    pub llm_max_tokens: u32,
    pub retry: RetryPolicy,
    pub pipeline_mode: PipelineMode,
    pub job_description_key: Option<String>,
    pub candidates_table: String,
    pub jobs_table: String,
    pub reservations_table: String,
    pub menu_prefix: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let llm_provider = match get("LLM_PROVIDER").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("anthropic") => LlmProvider::Anthropic {
                api_key: require("ANTHROPIC_API_KEY")?,
            },
            Some("bedrock") => LlmProvider::Bedrock,
            Some(other) => bail!("LLM_PROVIDER must be 'anthropic' or 'bedrock', got '{other}'"),
        };
        let default_model = match llm_provider {
            LlmProvider::Anthropic { .. } => anthropic::DEFAULT_MODEL,
            LlmProvider::Bedrock => bedrock::DEFAULT_MODEL,
        };

        let retry = RetryPolicy {
            max_attempts: parse_or(&get, "LLM_MAX_ATTEMPTS", 3u32)?.clamp(1, 3),
            base_delay: Duration::from_millis(parse_or(&get, "LLM_BASE_DELAY_MS", 1000u64)?),
            max_total_wait: Duration::from_millis(parse_or(&get, "LLM_MAX_TOTAL_WAIT_MS", 15_000u64)?),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            documents_bucket: require("DOCUMENTS_BUCKET")?,
            s3_endpoint: get("S3_ENDPOINT"),
            aws_region: get("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            aws_access_key_id: get("AWS_ACCESS_KEY_ID"),
            aws_secret_access_key: get("AWS_SECRET_ACCESS_KEY"),
            model_id: get("MODEL_ID").unwrap_or_else(|| default_model.to_string()),
            llm_provider,
            llm_max_tokens: parse_or(&get, "LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            retry,
            pipeline_mode: parse_or(&get, "PIPELINE_MODE", PipelineMode::Supervisor)?,
            job_description_key: get("JOB_DESCRIPTION_KEY"),
            candidates_table: get("CANDIDATES_TABLE").unwrap_or_else(|| "candidates".to_string()),
            jobs_table: get("JOBS_TABLE").unwrap_or_else(|| "jobs".to_string()),
            reservations_table: get("RESERVATIONS_TABLE")
                .unwrap_or_else(|| "reservations".to_string()),
            menu_prefix: get("MENU_PREFIX").unwrap_or_else(|| "menu/".to_string()),
            port: parse_or(&get, "PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn tables(&self) -> Tables {
        Tables::new(
            &self.candidates_table,
            &self.jobs_table,
            &self.reservations_table,
        )
    }

    pub fn evaluation_settings(&self) -> EvaluationSettings {
        EvaluationSettings {
            tables: self.tables(),
            job_description_key: self.job_description_key.clone(),
            max_tokens: self.llm_max_tokens,
        }
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            reservations: self.tables().reservations,
            bucket: self.documents_bucket.clone(),
            menu_prefix: self.menu_prefix.clone(),
            max_tokens: self.llm_max_tokens,
        }
    }
}

#[cfg(test)]
impl Config {
    /// Minimal configuration with every optional setting at its default.
    pub fn for_tests() -> Self {
        Self::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/agents".to_string()),
            "DOCUMENTS_BUCKET" => Some("hr-documents".to_string()),
            "ANTHROPIC_API_KEY" => Some("sk-test".to_string()),
            _ => None,
        })
        .expect("test configuration is valid")
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} has an invalid value '{raw}': {e}")),
    }
}
