// Copyright 2024 Sebastian Dobe <sebastiandobe@mailbox.org>

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

use base64::engine::general_purpose;
use base64::Engine;

/// OSS Bucket operations used for the file upload
pub use crate::bucket::{Bucket, Progress, CHUNK_SIZE};
/// VOD API client, your main entrypoint
pub use crate::client::Vod;
/// Client options and the resolved configuration
pub use crate::config::{ClientConfig, ClientOptions, Format, SignatureMethod};
/// Aliyun Credentials
pub use crate::credentials::{AccessKeyId, AccessKeySecret, Credentials, SecurityToken};
/// Specialized VOD Error type which wraps errors from different sources
pub use crate::error::VodError;
/// Request signing for the RPC API and OSS
pub use crate::signature::{
    build_signed_url, canonical_query_string, percent_encode, sign, signed_params, string_to_sign,
    SigningContext,
};
/// Swappable collaborators
pub use crate::storage::{ObjectStore, OssStore};
pub use crate::transport::{ReqwestTransport, Transport};
/// Request options and specialized Response objects
pub use crate::types::{
    ApiBody, PlayAddressOptions, StorageConfig, UploadAddress, UploadAuth,
    UploadCredentialBundle, UploadImageOptions, UploadOutcome, UploadVideoOptions,
};
pub use reqwest::Response as OssResponse;
pub use reqwest::StatusCode as OssStatusCode;

mod bucket;
mod client;
mod command;
mod config;
mod constants;
mod credentials;
mod error;
mod signature;
mod storage;
mod transport;
mod types;

fn md5_base64(s: &[u8]) -> String {
    general_purpose::STANDARD.encode(md5::compute(s).as_ref())
}
