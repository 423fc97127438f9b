mod chat;
mod config;
mod db;
mod errors;
mod evaluation;
mod events;
mod extraction;
mod llm_client;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LlmProvider};
use crate::db::{create_pool, ensure_schema};
use crate::evaluation::workflow::LocalWorkflow;
use crate::llm_client::{AnthropicClient, BedrockClient, ModelInvoker, RetryingInvoker};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::postgres::PgRecordStore;
use crate::storage::s3::S3ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting agents v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL-backed record store
    let pool = create_pool(&config.database_url).await?;
    ensure_schema(&pool).await?;
    let store = Arc::new(PgRecordStore::new(pool));

    // Initialize S3 / MinIO
    let aws = load_aws_config(&config).await;
    let objects = Arc::new(S3ObjectStore::new(build_s3_client(&config, &aws)));
    info!("S3 client initialized");

    // Initialize the model behind the retry decorator
    let model: Arc<dyn ModelInvoker> = Arc::new(RetryingInvoker::new(
        build_model(&config, &aws)?,
        config.retry.clone(),
    ));
    info!(
        "LLM client initialized (model: {}, max attempts: {})",
        model.model_id(),
        config.retry.max_attempts
    );

    let evaluation = Arc::new(config.evaluation_settings());
    let workflow = Arc::new(LocalWorkflow::new(store.clone(), model.clone(), evaluation));
    info!("Résumé pipeline mode: {:?}", config.pipeline_mode);

    // Build app state
    let state = AppState::new(config.clone(), objects, store, model, workflow);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared AWS configuration: region plus static credentials when configured,
/// otherwise the default provider chain.
async fn load_aws_config(config: &Config) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()));

    if let (Some(key_id), Some(secret)) = (&config.aws_access_key_id, &config.aws_secret_access_key) {
        loader = loader.credentials_provider(Credentials::new(key_id, secret, None, None, "agents-static"));
    }

    loader.load().await
}

/// Constructs an S3 client for MinIO (endpoint override, path-style) or AWS.
fn build_s3_client(config: &Config, aws: &SdkConfig) -> aws_sdk_s3::Client {
    let mut builder = aws_sdk_s3::config::Builder::from(aws);
    if let Some(endpoint) = &config.s3_endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }
    aws_sdk_s3::Client::from_conf(builder.build())
}

fn build_model(config: &Config, aws: &SdkConfig) -> Result<Box<dyn ModelInvoker>> {
    let model: Box<dyn ModelInvoker> = match &config.llm_provider {
        LlmProvider::Anthropic { api_key } => {
            Box::new(AnthropicClient::new(api_key.clone(), config.model_id.clone())?)
        }
        LlmProvider::Bedrock => Box::new(BedrockClient::new(
            aws_sdk_bedrockruntime::Client::new(aws),
            config.model_id.clone(),
        )),
    };
    Ok(model)
}
