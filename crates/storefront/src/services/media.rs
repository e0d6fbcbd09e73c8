//! Remote image hosting.
//!
//! Profile pictures are stored on Cloudinary. [`ImageHost`] is the seam the
//! profile workflow uses; [`CloudinaryClient`] talks to the upload API with
//! signed requests.

use std::collections::BTreeMap;

use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::instrument;

use karya_core::ImageDescriptor;

use crate::config::CloudinaryConfig;

/// Cloudinary API base URL.
const BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Errors from the image host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The host answered but did not do what was asked.
    #[error("unexpected result: {0}")]
    Unexpected(String),
}

/// Stores and deletes images.
pub trait ImageHost: Send + Sync {
    /// Upload raw bytes into `folder`.
    fn upload(
        &self,
        bytes: Vec<u8>,
        folder: &str,
    ) -> impl Future<Output = Result<ImageDescriptor, MediaError>> + Send;

    /// Delete a previously uploaded asset.
    fn destroy(&self, public_id: &str) -> impl Future<Output = Result<(), MediaError>> + Send;
}

/// Cloudinary upload API client.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

impl CloudinaryClient {
    /// Create a new Cloudinary client.
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{BASE_URL}/{}/image/{action}", self.cloud_name)
    }

    /// Sign `params` and turn them into the multipart form Cloudinary expects.
    fn signed_form(&self, params: BTreeMap<&'static str, String>) -> Form {
        let signature = sign(&params, self.api_secret.expose_secret());
        params
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .text("api_key", self.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
    }

    async fn send(&self, action: &str, form: Form) -> Result<reqwest::Response, MediaError> {
        let response = self
            .client
            .post(self.endpoint(action))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl ImageHost for CloudinaryClient {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> Result<ImageDescriptor, MediaError> {
        let params = BTreeMap::from([
            ("folder", folder.to_owned()),
            ("timestamp", unix_timestamp()),
        ]);
        let form = self
            .signed_form(params)
            .part("file", Part::bytes(bytes).file_name("upload"));

        let uploaded: UploadResponse = self.send("upload", form).await?.json().await?;
        Ok(ImageDescriptor::new(uploaded.secure_url, uploaded.public_id))
    }

    #[instrument(skip(self))]
    async fn destroy(&self, public_id: &str) -> Result<(), MediaError> {
        let params = BTreeMap::from([
            ("public_id", public_id.to_owned()),
            ("timestamp", unix_timestamp()),
        ]);

        let destroyed: DestroyResponse = self
            .send("destroy", self.signed_form(params))
            .await?
            .json()
            .await?;

        // "not found" means it is already gone.
        match destroyed.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(MediaError::Unexpected(other.to_owned())),
        }
    }
}

fn unix_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// `key=value` pairs sorted by key and joined with `&`, with the secret
/// appended, hashed with SHA-256 and hex encoded.
fn sign(params: &BTreeMap<&'static str, String>, secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}
