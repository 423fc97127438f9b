//! Uploads the sample job descriptions, résumés and menu documents to the
//! documents bucket under the prefixes the service watches.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::primitives::ByteStream;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Sample folders and the key prefix each is uploaded under.
const SAMPLE_FOLDERS: &[&str] = &["jobs", "resumes", "menu"];

#[derive(Debug, Parser)]
#[command(name = "upload-samples", about = "Upload sample documents to the documents bucket")]
struct Args {
    /// Target bucket.
    #[arg(long, env = "DOCUMENTS_BUCKET")]
    bucket: String,

    /// Directory holding `jobs/`, `resumes/` and `menu/`.
    #[arg(long, default_value = "samples")]
    samples_dir: PathBuf,

    /// S3-compatible endpoint such as a local MinIO.
    #[arg(long, env = "S3_ENDPOINT")]
    endpoint: Option<String>,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Upload {
    path: PathBuf,
    key: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let uploads = collect_uploads(&args.samples_dir)?;
    if uploads.is_empty() {
        bail!("No sample files found under {}", args.samples_dir.display());
    }

    let aws = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(args.region.clone()))
        .load()
        .await;
    let mut s3_config = aws_sdk_s3::config::Builder::from(&aws);
    if let Some(endpoint) = &args.endpoint {
        s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
    }
    let client = aws_sdk_s3::Client::from_conf(s3_config.build());

    info!(bucket = %args.bucket, files = uploads.len(), "Uploading samples");
    for upload in &uploads {
        let body = ByteStream::from_path(&upload.path)
            .await
            .with_context(|| format!("Failed to read {}", upload.path.display()))?;
        client
            .put_object()
            .bucket(&args.bucket)
            .key(&upload.key)
            .content_type(content_type(&upload.key))
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to upload s3://{}/{}", args.bucket, upload.key))?;
        info!("Uploaded {} to s3://{}/{}", upload.path.display(), args.bucket, upload.key);
    }

    info!("Uploaded {} sample file(s)", uploads.len());
    Ok(())
}

/// Every file under the sample folders, keyed `<folder>/<relative path>`.
/// Missing folders are skipped.
fn collect_uploads(samples_dir: &Path) -> Result<Vec<Upload>> {
    if !samples_dir.is_dir() {
        bail!("Samples directory {} does not exist", samples_dir.display());
    }

    let mut uploads = Vec::new();
    for folder in SAMPLE_FOLDERS {
        let root = samples_dir.join(folder);
        if !root.is_dir() {
            warn!("No {folder}/ folder in {}", samples_dir.display());
            continue;
        }
        let mut files = Vec::new();
        walk(&root, &mut files)?;
        files.sort();
        for path in files {
            let relative = path.strip_prefix(&root).with_context(|| format!("{} escapes {}", path.display(), root.display()))?;
            let key = format!("{folder}/{}", relative.to_string_lossy().replace('\\', "/"));
            uploads.push(Upload { path, key });
        }
    }
    Ok(uploads)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.is_file() {
            files.push(path);
        }
    }
    Ok(())
}

fn content_type(key: &str) -> &'static str {
    match key.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") | Some("md") => "text/plain; charset=utf-8",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}
