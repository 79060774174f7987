//! Configuration management

use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Minio,
    R2,
    S3,
    B2,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Prefix for all job object keys
    pub key_prefix: String,
    /// Rolling window for the one-active-INDD-job-per-user rule, seconds
    pub active_job_window_secs: u64,
    /// Lifetime of presigned download URLs, seconds
    pub presign_expiry_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage: StorageConfig {
                provider: StorageProvider::Minio,
                endpoint: "http://localhost:9000".to_string(),
                bucket: "linkstamp".to_string(),
                access_key: "admin".to_string(),
                secret_key: "password123".to_string(),
                region: Some("us-east-1".to_string()),
            },
            jobs: JobsConfig::default(),
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        JobsConfig {
            key_prefix: "jobs".to_string(),
            active_job_window_secs: 900,
            presign_expiry_secs: 600,
        }
    }
}

impl Config {
    /// Load `.env` (when present) and read configuration from the
    /// environment
    pub fn load() -> Result<Self, env::VarError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Config {
            storage: StorageConfig {
                provider: match env::var("S3_PROVIDER")
                    .unwrap_or_else(|_| "minio".to_string())
                    .as_str()
                {
                    "r2" => StorageProvider::R2,
                    "s3" => StorageProvider::S3,
                    "b2" => StorageProvider::B2,
                    _ => StorageProvider::Minio,
                },
                endpoint: env::var("S3_ENDPOINT")?,
                bucket: env::var("S3_BUCKET")?,
                access_key: env::var("S3_ACCESS_KEY")?,
                secret_key: env::var("S3_SECRET_KEY")?,
                region: env::var("S3_REGION").ok(),
            },
            jobs: JobsConfig {
                key_prefix: env::var("JOBS_KEY_PREFIX").unwrap_or_else(|_| "jobs".to_string()),
                active_job_window_secs: env::var("JOBS_ACTIVE_WINDOW_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(900),
                presign_expiry_secs: env::var("JOBS_PRESIGN_EXPIRY_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(600),
            },
        })
    }
}
