use crate::error::ServiceError;
use crate::session::location::LocationSnapshot;
use crate::session::media::{LocalPhoto, UploadedPhoto};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const APP_USER_AGENT: &str = "sos-assist";
const SHARE_TOPIC: &str = "image-share";

pub const PING_PATH: &str = "/api/ping";
pub const TOKEN_PATH: &str = "/api/getToken";
pub const UPLOAD_PATH: &str = "/api/upload-photo";
pub const DATA_PATH: &str = "/api/data";
pub const MAP_PATH: &str = "/api/map";

#[derive(Debug, Deserialize)]
struct PingReply {
    message: String,
}

/// HTTP client for the SOS backend. Cheap to clone; every call shares the
/// same connection pool and timeout.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(APP_USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check(
        endpoint: &'static str,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, ServiceError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            log::warn!("[backend] {} returned {}", endpoint, status);
            Err(ServiceError::Status {
                endpoint,
                status: status.as_u16(),
            })
        }
    }

    pub async fn ping(&self) -> Result<String, ServiceError> {
        let resp = self.http.get(self.endpoint(PING_PATH)).send().await?;
        let reply: PingReply = Self::check(PING_PATH, resp)?.json().await?;
        Ok(reply.message)
    }

    /// Exchange a display name for a room credential (plain-text body).
    pub async fn get_token(&self, name: &str) -> Result<String, ServiceError> {
        let resp = self
            .http
            .get(self.endpoint(TOKEN_PATH))
            .query(&[("name", name)])
            .send()
            .await?;
        let token = Self::check(TOKEN_PATH, resp)?.text().await?;
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::EmptyCredential);
        }
        Ok(token.to_string())
    }

    pub async fn upload_photo(&self, photo: &LocalPhoto) -> Result<UploadedPhoto, ServiceError> {
        let part = reqwest::multipart::Part::bytes(photo.bytes.to_vec())
            .file_name(photo.file_name.clone())
            .mime_str(photo.mime)?;
        let form = reqwest::multipart::Form::new().part("photo", part);
        let resp = self
            .http
            .post(self.endpoint(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(UPLOAD_PATH, resp)?.json().await?)
    }

    /// Broadcast an uploaded photo URL to the other room participants.
    pub async fn share_photo(&self, url: &str) -> Result<(), ServiceError> {
        let resp = self
            .http
            .post(self.endpoint(DATA_PATH))
            .json(&json!({ "topic": SHARE_TOPIC, "url": url }))
            .send()
            .await?;
        Self::check(DATA_PATH, resp)?;
        Ok(())
    }

    pub async fn fetch_map(&self) -> Result<LocationSnapshot, ServiceError> {
        let resp = self.http.get(self.endpoint(MAP_PATH)).send().await?;
        Ok(Self::check(MAP_PATH, resp)?.json().await?)
    }
}
