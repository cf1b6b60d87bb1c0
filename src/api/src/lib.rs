use crate::errors::ApiError;
use crate::types::pinning::{
    FileUpload, PinJsonRequest, PinResponse, PinataMetadata, PinataOptions,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

pub mod errors;
pub mod types;

pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
pub const DEFAULT_IPFS_GATEWAY_URL: &str = "https://gateway.pinata.cloud";

pub struct PinataApiProvider {
    client: Client,
    base_url: Url,
    gateway_url: Url,
    jwt: Option<String>,
}

impl std::fmt::Debug for PinataApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataApiProvider")
            .field("base_url", &self.base_url)
            .field("gateway_url", &self.gateway_url)
            .field("jwt", &self.jwt.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl PinataApiProvider {
    pub fn new(base_url: &str, jwt: Option<String>) -> Result<Self, ApiError> {
        Ok(PinataApiProvider {
            client: Client::new(),
            base_url: Url::parse(base_url)?,
            gateway_url: Url::parse(DEFAULT_IPFS_GATEWAY_URL)?,
            jwt: jwt.filter(|token| !token.trim().is_empty()),
        })
    }

    pub fn with_gateway(mut self, gateway_url: &str) -> Result<Self, ApiError> {
        self.gateway_url = Url::parse(gateway_url)?;
        Ok(self)
    }

    pub fn has_token(&self) -> bool {
        self.jwt.is_some()
    }

    /// Public gateway link for a pinned CID.
    pub fn gateway_url(&self, cid: &str) -> Result<Url, ApiError> {
        let url = self.gateway_url.join(&format!("/ipfs/{}", cid))?;
        Ok(url)
    }

    fn token(&self) -> Result<&str, ApiError> {
        self.jwt.as_deref().ok_or(ApiError::MissingToken)
    }

    pub async fn upload_file_to_ipfs(
        &self,
        upload: FileUpload,
        metadata: &PinataMetadata,
    ) -> Result<PinResponse, ApiError> {
        let token = self.token()?;

        let url = self
            .base_url
            .join("/pinning/pinFileToIPFS")
            .map_err(ApiError::UrlError)?;

        let size = upload.bytes.len();
        let mut part = Part::bytes(upload.bytes).file_name(upload.file_name.clone());
        if let Some(content_type) = &upload.content_type {
            part = part.mime_str(content_type)?;
        }

        let form = Form::new()
            .part("file", part)
            .text("pinataMetadata", serde_json::to_string(metadata)?)
            .text(
                "pinataOptions",
                serde_json::to_string(&PinataOptions::default())?,
            );

        debug!(file = %upload.file_name, size, "pinning file");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let result = Self::read_pin_response(response).await?;

        info!(cid = %result.ipfs_hash, file = %upload.file_name, "file pinned to IPFS");

        Ok(result)
    }

    pub async fn upload_json_to_ipfs<T: Serialize>(
        &self,
        content: &T,
        metadata: &PinataMetadata,
    ) -> Result<PinResponse, ApiError> {
        let token = self.token()?;

        let url = self
            .base_url
            .join("/pinning/pinJSONToIPFS")
            .map_err(ApiError::UrlError)?;

        let request = PinJsonRequest {
            pinata_content: content,
            pinata_metadata: metadata,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let result = Self::read_pin_response(response).await?;

        info!(cid = %result.ipfs_hash, name = %metadata.name, "json pinned to IPFS");

        Ok(result)
    }

    async fn read_pin_response(response: Response) -> Result<PinResponse, ApiError> {
        let status = response.status();

        if status.is_success() {
            let result: PinResponse = response.json().await?;
            return Ok(result);
        }

        let error_body = response.text().await?;

        Err(ApiError::HttpError {
            status: status.as_u16(),
            body: error_body,
        })
    }
}
