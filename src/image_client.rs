use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::configuration::ImageStorageSettings;
use crate::error::UploadError;

/// Client for a Cloudinary-compatible upload API
#[derive(Clone)]
pub struct ImageStorageClient {
    http_client: reqwest::Client,
    base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Serialize)]
struct UploadRequest<'a> {
    file: &'a str,
    api_key: &'a str,
    timestamp: i64,
    signature: String,
    signature_algorithm: &'static str,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Deserialize)]
struct UploadFailure {
    error: UploadFailureDetail,
}

#[derive(Deserialize)]
struct UploadFailureDetail {
    message: String,
}

impl ImageStorageClient {
    pub fn new(settings: &ImageStorageSettings) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client for image storage");
                reqwest::Client::new()
            });

        Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            cloud_name: settings.cloud_name.clone(),
            api_key: settings.api_key.clone(),
            api_secret: settings.api_secret.clone(),
        }
    }

    /// Sign the upload parameters: SHA-256 over the sorted `key=value`
    /// pairs joined by `&`, followed by the API secret.
    fn sign(&self, timestamp: i64) -> String {
        let to_sign = format!("timestamp={}{}", timestamp, self.api_secret);
        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Upload a base64 `data:` URI, returning the hosted HTTPS URL
    pub async fn upload(&self, data_uri: &str) -> Result<String, UploadError> {
        let url = format!("{}/{}/image/upload", self.base_url, self.cloud_name);
        let timestamp = chrono::Utc::now().timestamp();
        let request = UploadRequest {
            file: data_uri,
            api_key: &self.api_key,
            timestamp,
            signature: self.sign(timestamp),
            signature_algorithm: "sha256",
        };

        let response = self
            .http_client
            .post(&url)
            .form(&request)
            .send()
            .await
            .map_err(|e| UploadError::SendFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<UploadFailure>()
                .await
                .map(|failure| failure.error.message)
                .unwrap_or_else(|_| "no error message".to_string());
            return Err(UploadError::Rejected(status.as_u16(), message));
        }

        response
            .json::<UploadResponse>()
            .await
            .map(|body| body.secure_url)
            .map_err(|e| UploadError::MalformedResponse(e.to_string()))
    }
}
