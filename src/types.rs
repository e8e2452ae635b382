use crate::credentials::{AccessKeyId, AccessKeySecret, SecurityToken};
use crate::error::VodError;
use base64::engine::general_purpose;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Input for `GetPlayInfo`
#[derive(Debug, Clone, Default)]
pub struct PlayAddressOptions {
    pub video_id: String,
    /// Comma separated list of formats like `mp4,m3u8`
    pub formats: Option<String>,
    /// Validity of the returned addresses in seconds
    pub auth_timeout: Option<u64>,
}

impl PlayAddressOptions {
    pub fn new<S: Into<String>>(video_id: S) -> Self {
        Self {
            video_id: video_id.into(),
            ..Default::default()
        }
    }
}

/// Input for `CreateUploadVideo`
#[derive(Debug, Clone, Default)]
pub struct UploadVideoOptions {
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub cate_id: Option<String>,
    pub tags: Option<String>,
}

/// Input for `CreateUploadImage`
#[derive(Debug, Clone, Default)]
pub struct UploadImageOptions {
    /// Defaults to `cover`
    pub image_type: Option<String>,
    pub image_ext: Option<String>,
    pub title: Option<String>,
    pub tags: Option<String>,
    pub storage_location: Option<String>,
    pub description: Option<String>,
    pub user_data: Option<String>,
    /// Any additional API parameter, passed through as is
    pub extra: BTreeMap<String, String>,
}

/// Body of the operations which do not fail on invalid JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiBody {
    Json(Value),
    Raw(String),
}

impl ApiBody {
    pub fn json(&self) -> Option<&Value> {
        match self {
            ApiBody::Json(value) => Some(value),
            ApiBody::Raw(_) => None,
        }
    }
}

/// Storage target as it comes base64 encoded in `UploadAddress`
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UploadAddress {
    #[serde(rename = "Endpoint")]
    pub endpoint: String,
    #[serde(rename = "Bucket")]
    pub bucket: String,
    #[serde(rename = "FileName")]
    /// Object key the file must be uploaded to
    pub file_name: String,
}

#[derive(Deserialize, Clone)]
pub struct UploadAuth {
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    #[serde(rename = "AccessKeySecret")]
    pub access_key_secret: String,
    #[serde(rename = "SecurityToken")]
    pub security_token: String,
    #[serde(rename = "Expiration", default)]
    /// Lifetime of the credentials in seconds, sent as string or number
    pub expiration: Option<Value>,
}

impl std::fmt::Debug for UploadAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadAuth")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<hidden>")
            .field("security_token", &"<hidden>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

#[derive(Deserialize)]
struct CreateUploadVideoResponse {
    #[serde(rename = "VideoId")]
    video_id: String,
    #[serde(rename = "UploadAddress")]
    upload_address: String,
    #[serde(rename = "UploadAuth")]
    upload_auth: String,
}

/// Decoded `CreateUploadVideo` response
#[derive(Debug, Clone)]
pub struct UploadCredentialBundle {
    pub video_id: String,
    pub upload_address: UploadAddress,
    pub upload_auth: UploadAuth,
}

impl UploadCredentialBundle {
    pub fn from_response(body: &Value) -> Result<Self, VodError> {
        let res = CreateUploadVideoResponse::deserialize(body)?;
        Ok(Self {
            video_id: res.video_id,
            upload_address: decode_blob(&res.upload_address)?,
            upload_auth: decode_blob(&res.upload_auth)?,
        })
    }
}

fn decode_blob<T: DeserializeOwned>(blob: &str) -> Result<T, VodError> {
    let bytes = general_purpose::STANDARD.decode(blob.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Connection config for the temporary object storage client
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key_id: AccessKeyId,
    pub access_key_secret: AccessKeySecret,
    pub security_token: Option<SecurityToken>,
}

impl From<&UploadCredentialBundle> for StorageConfig {
    fn from(bundle: &UploadCredentialBundle) -> Self {
        let auth = &bundle.upload_auth;
        Self {
            endpoint: bundle.upload_address.endpoint.clone(),
            bucket: bundle.upload_address.bucket.clone(),
            access_key_id: AccessKeyId::new(auth.access_key_id.clone()),
            access_key_secret: AccessKeySecret::new(auth.access_key_secret.clone()),
            security_token: Some(SecurityToken(auth.security_token.clone()))
                .filter(|token| !token.as_ref().is_empty()),
        }
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct InitiateMultipartUploadResponse {
    #[serde(rename = "Bucket")]
    _bucket: String,
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "UploadId")]
    pub upload_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub status_code: u16,
    pub uploaded_bytes: usize,
}
