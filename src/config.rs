//! Endpoint and limit configuration for the uploader
use std::{env, str::FromStr, time::Duration};

use chrono::Duration as RetentionDuration;
use reqwest::Url;

use crate::error::{Result, UploaderError};

/// The largest file the picker accepts, 2 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2_097_152;
pub const DEFAULT_UPLOAD_ENDPOINT: &str = "https://api.images.czar.dev";
pub const DEFAULT_STORAGE_BASE_URL: &str =
    "https://catalogv2.blob.core.windows.net/storage-images";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETENTION_HOURS: i64 = 48;
/// Upper bound for `retention`, ten years
const MAX_RETENTION_HOURS: i64 = 24 * 365 * 10;

/// Where files are sent, where they end up, and how long we are willing to wait
///
/// The defaults point at the public image API.  Every field can be overridden
/// from the environment with [`UploaderConfig::from_env`].
#[derive(Clone, Debug)]
pub struct UploaderConfig {
    /// The endpoint that receives the multipart upload
    pub upload_endpoint: String,
    /// The public location of stored objects.  The id returned by the API is
    /// appended to this to form the result link.
    pub storage_base_url: String,
    /// The largest file (in bytes) that may be selected
    pub max_file_size: u64,
    /// The longest a single upload may take before it is abandoned
    pub timeout: Duration,
    /// How long the storage service keeps an uploaded file
    pub retention: RetentionDuration,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            storage_base_url: DEFAULT_STORAGE_BASE_URL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retention: RetentionDuration::hours(DEFAULT_RETENTION_HOURS),
        }
    }
}

impl UploaderConfig {
    /// Builds a configuration from the defaults, overridden by any of
    ///
    /// * `IMAGE_UPLOADER_API_URL`
    /// * `IMAGE_UPLOADER_STORAGE_URL`
    /// * `IMAGE_UPLOADER_MAX_FILE_SIZE` (bytes)
    /// * `IMAGE_UPLOADER_TIMEOUT_SECS`
    /// * `IMAGE_UPLOADER_RETENTION_HOURS`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            upload_endpoint: env::var("IMAGE_UPLOADER_API_URL")
                .unwrap_or(defaults.upload_endpoint),
            storage_base_url: env::var("IMAGE_UPLOADER_STORAGE_URL")
                .unwrap_or(defaults.storage_base_url),
            max_file_size: parse_env("IMAGE_UPLOADER_MAX_FILE_SIZE")?
                .unwrap_or(defaults.max_file_size),
            timeout: parse_env("IMAGE_UPLOADER_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retention: parse_env::<i64>("IMAGE_UPLOADER_RETENTION_HOURS")?
                .map(|hours| {
                    RetentionDuration::try_hours(hours).ok_or_else(|| {
                        UploaderError::invalid_config(
                            "IMAGE_UPLOADER_RETENTION_HOURS",
                            &hours.to_string(),
                        )
                    })
                })
                .transpose()?
                .unwrap_or(defaults.retention),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks that both URLs are absolute http(s) URLs, the limits are non-zero
    /// and the retention is positive and at most ten years
    pub fn validate(&self) -> Result<()> {
        check_url("upload_endpoint", &self.upload_endpoint)?;
        check_url("storage_base_url", &self.storage_base_url)?;
        if self.max_file_size == 0 {
            return Err(UploaderError::invalid_config("max_file_size", "0"));
        }
        if self.timeout.is_zero() {
            return Err(UploaderError::invalid_config("timeout", "0"));
        }
        if self.retention <= RetentionDuration::zero()
            || self.retention > RetentionDuration::hours(MAX_RETENTION_HOURS)
        {
            return Err(UploaderError::invalid_config(
                "retention",
                &format!("{}h", self.retention.num_hours()),
            ));
        }
        Ok(())
    }
}

fn check_url(name: &str, value: &str) -> Result<()> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(UploaderError::invalid_config(name, value)),
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| UploaderError::invalid_config(name, &raw)),
        Err(_) => Ok(None),
    }
}
