use crate::config::{ClientConfig, ClientOptions};
use crate::error::VodError;
use crate::signature::{build_signed_url, SigningContext};
use crate::storage::{ObjectStore, OssStore};
use crate::transport::{ReqwestTransport, Transport};
use crate::types::{
    ApiBody, PlayAddressOptions, StorageConfig, UploadCredentialBundle, UploadImageOptions,
    UploadVideoOptions,
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::io;
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

/// Client for the VOD API, your main entrypoint
#[derive(Clone)]
pub struct Vod {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn ObjectStore>,
}

impl Debug for Vod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vod").field("config", &self.config).finish()
    }
}

impl Vod {
    /// Fails if a required option is still empty after merging the defaults.
    pub fn new(options: ClientOptions) -> Result<Self, VodError> {
        Ok(Self {
            config: Arc::new(ClientConfig::try_from_options(options)?),
            transport: Arc::new(ReqwestTransport),
            store: Arc::new(OssStore),
        })
    }

    pub fn try_from_env() -> Result<Self, VodError> {
        Self::new(ClientOptions::try_from_env()?)
    }

    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    pub fn with_store<S: ObjectStore + 'static>(mut self, store: S) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn fetch(&self, params: BTreeMap<String, String>) -> Result<String, VodError> {
        debug!(
            "calling action {}",
            params.get("Action").map(String::as_str).unwrap_or_default()
        );
        let url = build_signed_url(
            &self.config.endpoint,
            &self.config,
            params,
            &SigningContext::now(),
        )?;
        self.transport.get(url).await
    }

    /// Playback credential for the player SDK
    #[tracing::instrument(level = "debug", skip_all, fields(video_id = video_id))]
    pub async fn get_play_auth(&self, video_id: &str) -> Result<Value, VodError> {
        if video_id.trim().is_empty() {
            return Err(VodError::Validation(
                "get_play_auth() requires a non-empty video id".to_string(),
            ));
        }

        let params = action("GetVideoPlayAuth", [("VideoId", Some(video_id.to_string()))]);
        let body = self.fetch(params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Playback addresses of all streams of a video
    #[tracing::instrument(level = "debug", skip_all, fields(video_id = %options.video_id))]
    pub async fn get_play_address(&self, options: &PlayAddressOptions) -> Result<Value, VodError> {
        let params = action(
            "GetPlayInfo",
            [
                ("VideoId", Some(options.video_id.clone())),
                ("Formats", options.formats.clone()),
                ("AuthTimeout", options.auth_timeout.map(|t| t.to_string())),
            ],
        );
        let body = self.fetch(params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Upload address and credentials for a new video.
    ///
    /// A non-empty `Message` in the response is returned as
    /// [VodError::Service].
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn get_upload_auth(&self, options: &UploadVideoOptions) -> Result<Value, VodError> {
        // both defaults derive from the generated title, never the caller's
        let default = default_title();
        let file_name =
            non_empty(&options.file_name).unwrap_or_else(|| format!("{}.mp4", default));
        let title = non_empty(&options.title).unwrap_or(default);

        let params = action(
            "CreateUploadVideo",
            [
                ("Title", Some(title)),
                ("FileName", Some(file_name)),
                ("FileSize", options.file_size.map(|s| s.to_string())),
                ("Description", options.description.clone()),
                ("CoverURL", options.cover_url.clone()),
                ("CateId", options.cate_id.clone()),
                ("Tags", options.tags.clone()),
            ],
        );
        let body: Value = serde_json::from_str(&self.fetch(params).await?)?;

        if let Some(message) = service_message(&body) {
            return Err(VodError::Service(message));
        }
        Ok(body)
    }

    /// New upload credentials once the old ones expired.
    ///
    /// Returns `Ok(None)` without any request when no video id is given. A
    /// body which is not valid JSON is handed back as [ApiBody::Raw].
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn refresh_upload_auth(
        &self,
        video_id: Option<&str>,
    ) -> Result<Option<ApiBody>, VodError> {
        let Some(video_id) = video_id else {
            return Ok(None);
        };

        let params = action(
            "RefreshUploadVideo",
            [("VideoId", Some(video_id.to_string()))],
        );
        let body = self.fetch(params).await?;
        Ok(Some(lenient_body(body)))
    }

    /// Upload address and credentials for an image, `ImageType` defaults to
    /// `cover`. Invalid JSON is handed back as [ApiBody::Raw].
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn get_upload_image_auth(
        &self,
        options: &UploadImageOptions,
    ) -> Result<ApiBody, VodError> {
        let mut params = action(
            "CreateUploadImage",
            [
                (
                    "ImageType",
                    Some(
                        options
                            .image_type
                            .clone()
                            .unwrap_or_else(|| "cover".to_string()),
                    ),
                ),
                ("ImageExt", options.image_ext.clone()),
                ("Title", options.title.clone()),
                ("Tags", options.tags.clone()),
                ("StorageLocation", options.storage_location.clone()),
                ("Description", options.description.clone()),
                ("UserData", options.user_data.clone()),
            ],
        );
        params.extend(options.extra.clone());

        let body = self.fetch(params).await?;
        Ok(lenient_body(body))
    }

    /// Uploads a local video file and returns its `VideoId`.
    ///
    /// The file is checked before any request is made. `on_progress` receives
    /// the upload progress between `0.0` and `1.0`.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn upload_file<P, F>(
        &self,
        path: P,
        options: &UploadVideoOptions,
        on_progress: F,
    ) -> Result<String, VodError>
    where
        P: AsRef<Path>,
        F: Fn(f64) + Send + Sync + 'static,
    {
        let path = path.as_ref();
        let meta = tokio::fs::File::open(path).await?.metadata().await?;
        if !meta.is_file() {
            return Err(VodError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a file", path.display()),
            )));
        }

        let body = self.get_upload_auth(options).await?;
        let bundle = UploadCredentialBundle::from_response(&body)?;
        debug!(
            "got upload target {}/{} for video {}",
            bundle.upload_address.bucket, bundle.upload_address.file_name, bundle.video_id
        );

        let config = StorageConfig::from(&bundle);
        let outcome = self
            .store
            .multipart_upload(
                &config,
                &bundle.upload_address.file_name,
                path,
                Arc::new(on_progress),
            )
            .await?;
        debug!(
            "upload finished with HTTP {} after {} bytes",
            outcome.status_code, outcome.uploaded_bytes
        );

        Ok(bundle.video_id)
    }
}

fn action<const N: usize>(
    name: &str,
    fields: [(&str, Option<String>); N],
) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    params.insert("Action".to_string(), name.to_string());
    for (key, value) in fields {
        if let Some(value) = value {
            params.insert(key.to_string(), value);
        }
    }
    params
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn default_title() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("new_video_{}", millis)
}

/// Any truthy `Message` field counts as a service error.
fn service_message(body: &Value) -> Option<String> {
    match body.get("Message")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.is_empty() => None,
        Value::String(message) => Some(message.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        value => Some(value.to_string()),
    }
}

fn lenient_body(body: String) -> ApiBody {
    match serde_json::from_str(&body) {
        Ok(value) => ApiBody::Json(value),
        Err(err) => {
            debug!("response body is not valid JSON: {}", err);
            ApiBody::Raw(body)
        }
    }
}
