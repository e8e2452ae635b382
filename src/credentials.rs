use crate::error::VodError;
use std::env;
use std::fmt::{Debug, Formatter};

/// Public half of a key pair, either a RAM user key or one issued by STS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessKeyId(pub String);

/// Signing key, never shows up in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKeySecret(pub String);

/// Temporary STS token handed out together with upload credentials
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityToken(pub String);

impl AccessKeyId {
    pub fn new<S: Into<String>>(access_key_id: S) -> Self {
        Self(access_key_id.into())
    }
}

impl AccessKeySecret {
    pub fn new<S: Into<String>>(access_key_secret: S) -> Self {
        Self(access_key_secret.into())
    }
}

impl AsRef<str> for AccessKeyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AccessKeySecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SecurityToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn hidden(name: &str, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}(<hidden>)", name)
}

impl Debug for AccessKeySecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        hidden("AccessKeySecret", f)
    }
}

impl Debug for SecurityToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        hidden("SecurityToken", f)
    }
}

/// Long-lived key pair the API requests are signed with
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: AccessKeyId,
    pub access_key_secret: AccessKeySecret,
}

impl Credentials {
    pub fn new<S>(access_key_id: S, access_key_secret: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            access_key_id: AccessKeyId::new(access_key_id),
            access_key_secret: AccessKeySecret::new(access_key_secret),
        }
    }

    /// Reads `VOD_ACCESS_KEY_ID` and `VOD_ACCESS_KEY_SECRET`
    pub fn try_from_env() -> Result<Self, VodError> {
        Ok(Self::new(
            env::var("VOD_ACCESS_KEY_ID")?,
            env::var("VOD_ACCESS_KEY_SECRET")?,
        ))
    }
}
