use crate::constants::{DEFAULT_API_VERSION, DEFAULT_ENDPOINT, DEFAULT_SIGNATURE_VERSION};
use crate::credentials::Credentials;
use crate::error::VodError;
use std::collections::BTreeMap;
use std::env;
use std::fmt::{Debug, Formatter};
use url::Url;

/// Response format requested from the API. Only JSON is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "JSON",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureMethod {
    #[default]
    HmacSha1,
}

impl SignatureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMethod::HmacSha1 => "HMAC-SHA1",
        }
    }
}

/// Caller supplied overrides. Every `Some` value wins over the default during
/// [ClientConfig::try_from_options].
#[derive(Clone, Default)]
pub struct ClientOptions {
    pub access_key_id: Option<String>,
    pub access_key_secret: Option<String>,
    pub format: Option<Format>,
    pub api_version: Option<String>,
    pub signature_method: Option<SignatureMethod>,
    pub signature_version: Option<String>,
    pub endpoint: Option<String>,
}

impl Debug for ClientOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientOptions")
            .field("access_key_id", &self.access_key_id)
            .field(
                "access_key_secret",
                &self.access_key_secret.as_ref().map(|_| "<hidden>"),
            )
            .field("format", &self.format)
            .field("api_version", &self.api_version)
            .field("signature_method", &self.signature_method)
            .field("signature_version", &self.signature_version)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl ClientOptions {
    pub fn new<S>(access_key_id: S, access_key_secret: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            access_key_id: Some(access_key_id.into()),
            access_key_secret: Some(access_key_secret.into()),
            ..Default::default()
        }
    }

    /// Reads `VOD_ACCESS_KEY_ID` and `VOD_ACCESS_KEY_SECRET`, and the optional
    /// `VOD_ENDPOINT` and `VOD_API_VERSION`.
    pub fn try_from_env() -> Result<Self, VodError> {
        let credentials = Credentials::try_from_env()?;
        Ok(Self {
            access_key_id: Some(credentials.access_key_id.0),
            access_key_secret: Some(credentials.access_key_secret.0),
            endpoint: env::var("VOD_ENDPOINT").ok(),
            api_version: env::var("VOD_API_VERSION").ok(),
            ..Default::default()
        })
    }

    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn api_version<S: Into<String>>(mut self, api_version: S) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Field by field merge, values from `overrides` take precedence.
    pub fn merge(self, overrides: ClientOptions) -> ClientOptions {
        ClientOptions {
            access_key_id: overrides.access_key_id.or(self.access_key_id),
            access_key_secret: overrides.access_key_secret.or(self.access_key_secret),
            format: overrides.format.or(self.format),
            api_version: overrides.api_version.or(self.api_version),
            signature_method: overrides.signature_method.or(self.signature_method),
            signature_version: overrides.signature_version.or(self.signature_version),
            endpoint: overrides.endpoint.or(self.endpoint),
        }
    }
}

/// Validated, immutable client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    pub format: Format,
    pub api_version: String,
    pub signature_method: SignatureMethod,
    pub signature_version: String,
    pub endpoint: Url,
}

impl ClientConfig {
    /// The defaults every client starts from. The credentials are empty and
    /// must be given by the caller.
    pub fn default_options() -> ClientOptions {
        ClientOptions {
            access_key_id: Some(String::default()),
            access_key_secret: Some(String::default()),
            format: Some(Format::default()),
            api_version: Some(DEFAULT_API_VERSION.to_string()),
            signature_method: Some(SignatureMethod::default()),
            signature_version: Some(DEFAULT_SIGNATURE_VERSION.to_string()),
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
        }
    }

    /// Merges `overrides` onto [ClientConfig::default_options] and fails if any
    /// field is empty afterwards.
    pub fn try_from_options(overrides: ClientOptions) -> Result<Self, VodError> {
        let merged = Self::default_options().merge(overrides);

        let access_key_id = required("AccessKeyId", merged.access_key_id)?;
        let access_key_secret = required("AccessKeySecret", merged.access_key_secret)?;
        let api_version = required("Version", merged.api_version)?;
        let signature_version = required("SignatureVersion", merged.signature_version)?;
        let endpoint = required("endpoint", merged.endpoint)?;
        let endpoint = endpoint
            .parse::<Url>()
            .map_err(|err| VodError::Config(format!("endpoint '{}': {}", endpoint, err)))?;

        Ok(Self {
            credentials: Credentials::new(access_key_id, access_key_secret),
            format: merged.format.unwrap_or_default(),
            api_version,
            signature_method: merged.signature_method.unwrap_or_default(),
            signature_version,
            endpoint,
        })
    }

    /// Parameters shared by every API action.
    pub fn common_params(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                "AccessKeyId".to_string(),
                self.credentials.access_key_id.as_ref().to_string(),
            ),
            ("Format".to_string(), self.format.as_str().to_string()),
            ("Version".to_string(), self.api_version.clone()),
            (
                "SignatureMethod".to_string(),
                self.signature_method.as_str().to_string(),
            ),
            (
                "SignatureVersion".to_string(),
                self.signature_version.clone(),
            ),
        ])
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, VodError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(VodError::Config(format!("'{}' must not be empty", name))),
    }
}
