//! Storage event notifications (S3 / MinIO webhook format).

use serde::Deserialize;
use url::form_urlencoded;

pub const RESUMES_PREFIX: &str = "resumes/";
pub const JOBS_PREFIX: &str = "jobs/";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StorageEventRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageEventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Object {
    pub key: String,
}

impl StorageEventRecord {
    pub fn bucket(&self) -> &str {
        &self.s3.bucket.name
    }

    /// The object key with URL encoding removed.
    pub fn key(&self) -> String {
        decode_object_key(&self.s3.object.key)
    }
}

/// Event keys are form-encoded: `+` is a space and `%XX` an escaped byte.
pub fn decode_object_key(raw: &str) -> String {
    form_urlencoded::parse(raw.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    JobDescription,
    Other,
}

impl DocumentKind {
    pub fn of(key: &str) -> Self {
        if key.ends_with('/') {
            Self::Other
        } else if key.starts_with(RESUMES_PREFIX) {
            Self::Resume
        } else if key.starts_with(JOBS_PREFIX) {
            Self::JobDescription
        } else {
            Self::Other
        }
    }
}
