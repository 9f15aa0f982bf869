//! A Rust definition of the upload API and a client to access it
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::UploaderConfig,
    error::{Result, UploaderError},
    file::SelectedFile,
};

/// The multipart field the upload API reads the file from
pub const FILE_FIELD: &str = "file";
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(Client::new);

/// The response from the upload operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadResponse {
    /// The opaque identifier the storage service assigned to the file
    pub id: String,
}

#[derive(Deserialize)]
struct RawUploadResponse {
    id: Option<String>,
}

/// Functions defined by the upload API
///
/// [`UploadClient`] talks to the real API.  Anything else that can turn a file
/// into a stored object id (a mock in tests, a different transport) can stand
/// in for it when building an [`UploadWidget`](crate::widget::UploadWidget).
#[async_trait]
pub trait UploadApi: std::fmt::Debug + Send + Sync {
    /// Uploads a file
    ///
    /// # Arguments
    ///
    /// * `file` - The file to upload
    ///
    /// # Returns
    ///
    /// The id assigned to the stored file
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse>;

    /// Builds the public URL of a stored file from its id
    fn link_for(&self, id: &str) -> String;
}

/// A client for the remote upload API
#[derive(Clone, Debug)]
pub struct UploadClient {
    /// The URL that receives the multipart upload
    upload_endpoint: String,
    /// The public location of stored files
    storage_base_url: String,
    /// Per-request timeout
    timeout: std::time::Duration,
}

impl UploadClient {
    pub fn new(config: &UploaderConfig) -> Self {
        Self {
            upload_endpoint: config.upload_endpoint.clone(),
            storage_base_url: config.storage_base_url.clone(),
            timeout: config.timeout,
        }
    }

    fn build_form(file: &SelectedFile) -> Form {
        let part = Part::stream_with_length(file.contents().clone(), file.size())
            .file_name(file.name().to_string());
        Form::new().part(FILE_FIELD, part)
    }

    async fn decode_response(response: Response) -> Result<UploadResponse> {
        let body = response.text().await?;
        let raw = serde_json::from_str::<RawUploadResponse>(&body)
            .map_err(|err| UploaderError::MalformedResponse(err.to_string()))?;
        match raw.id {
            Some(id) if !id.is_empty() => Ok(UploadResponse { id }),
            Some(_) => Err(UploaderError::MalformedResponse(
                "id field is empty".to_string(),
            )),
            None => Err(UploaderError::MalformedResponse(
                "id field is missing".to_string(),
            )),
        }
    }
}

fn url_join(left: &str, right: &str) -> String {
    match (left.ends_with('/'), right.starts_with('/')) {
        (true, true) => format!("{}{}", left, &right[1..]),
        (false, false) => format!("{}/{}", left, right),
        _ => format!("{}{}", left, right),
    }
}

#[async_trait]
impl UploadApi for UploadClient {
    async fn upload(&self, file: &SelectedFile) -> Result<UploadResponse> {
        debug!(
            endpoint = %self.upload_endpoint,
            name = file.name(),
            size = file.size(),
            "sending upload request"
        );

        let request = GLOBAL_CLIENT
            .post(&self.upload_endpoint)
            .timeout(self.timeout)
            .multipart(Self::build_form(file));

        let response = request.send().await?;

        if !response.status().is_success() {
            Err(UploaderError::unexpected_status(response.status()))
        } else {
            Self::decode_response(response).await
        }
    }

    fn link_for(&self, id: &str) -> String {
        url_join(&self.storage_base_url, id)
    }
}
