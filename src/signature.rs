use crate::config::ClientConfig;
use crate::constants::ISO_TIMESTAMP;
use crate::credentials::{AccessKeyId, AccessKeySecret};
use crate::error::VodError;
use base64::engine::general_purpose;
use base64::Engine;
use bytes::BytesMut;
use hmac::{Hmac, Mac};
use http::HeaderMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha1::Sha1;
use std::collections::BTreeMap;
use time::{OffsetDateTime, UtcOffset};
use url::Url;
use uuid::Uuid;

/// Everything but the RFC 3986 unreserved characters gets escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// OSS subresources which take part in the canonicalized resource.
const OSS_SUB_RESOURCES: [&str; 6] = [
    "acl",
    "partNumber",
    "security-token",
    "uploadId",
    "uploads",
    "x-oss-process",
];

const CONTENT_MD5: &str = "content-md5";

pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}

/// Per request values which make every signature unique.
#[derive(Debug, Clone)]
pub struct SigningContext {
    pub timestamp: OffsetDateTime,
    pub nonce: String,
}

impl SigningContext {
    pub fn now() -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            nonce: Uuid::new_v4().to_string(),
        }
    }
}

/// Encodes every `key=value` pair except the `Signature` itself and sorts the
/// resulting strings as a whole.
pub fn canonical_query_string(params: &BTreeMap<String, String>) -> String {
    let mut keyvalues = params
        .iter()
        .filter(|(key, _)| key.as_str() != "Signature")
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<String>>();
    keyvalues.sort();
    keyvalues.join("&")
}

pub fn string_to_sign(canonical_query: &str) -> String {
    format!("GET&%2F&{}", percent_encode(canonical_query))
}

fn base64_hmac_sha1(key: &[u8], content: &[u8]) -> Result<String, VodError> {
    let mut hmac = Hmac::<Sha1>::new_from_slice(key)?;
    hmac.update(content);
    Ok(general_purpose::STANDARD.encode(hmac.finalize().into_bytes()))
}

/// RPC signature, keyed with the secret and a trailing `&`
pub fn sign(secret: &AccessKeySecret, string_to_sign: &str) -> Result<String, VodError> {
    let mut key = BytesMut::with_capacity(secret.as_ref().len() + 1);
    key.extend(secret.as_ref().as_bytes());
    key.extend(b"&");
    base64_hmac_sha1(key.as_ref(), string_to_sign.as_bytes())
}

/// Merges the common and action parameters, injects `Timestamp` and
/// `SignatureNonce` and adds the resulting `Signature`.
pub fn signed_params(
    config: &ClientConfig,
    action_params: BTreeMap<String, String>,
    ctx: &SigningContext,
) -> Result<BTreeMap<String, String>, VodError> {
    let mut params = config.common_params();
    params.extend(action_params);
    params.insert(
        "Timestamp".to_string(),
        ctx.timestamp.to_offset(UtcOffset::UTC).format(ISO_TIMESTAMP)?,
    );
    params.insert("SignatureNonce".to_string(), ctx.nonce.clone());

    let string_to_sign = string_to_sign(&canonical_query_string(&params));
    let signature = sign(&config.credentials.access_key_secret, &string_to_sign)?;
    params.insert("Signature".to_string(), signature);

    Ok(params)
}

pub fn build_signed_url(
    base_url: &Url,
    config: &ClientConfig,
    action_params: BTreeMap<String, String>,
    ctx: &SigningContext,
) -> Result<Url, VodError> {
    let params = signed_params(config, action_params, ctx)?;
    let mut url = base_url.clone();
    url.query_pairs_mut().clear().extend_pairs(params.iter());
    Ok(url)
}

fn canonical_oss_headers(headers: &HeaderMap) -> Result<String, VodError> {
    let mut keyvalues = Vec::with_capacity(2);
    for (key, value) in headers.iter() {
        let key = key.as_str().to_lowercase();
        if key.starts_with("x-oss-") {
            let value = value
                .to_str()
                .map_err(|err| VodError::Validation(format!("header '{}': {}", key, err)))?;
            keyvalues.push(format!("{}:{}\n", key, value.trim()));
        }
    }
    keyvalues.sort();
    Ok(keyvalues.concat())
}

/// `/{bucket}/{key}` plus the sorted subresources of the query.
pub fn canonical_oss_resource(bucket: &str, url: &Url) -> String {
    let decoded = percent_encoding::percent_decode_str(url.path()).decode_utf8_lossy();
    with_sub_resources(format!("/{}{}", bucket, decoded), url)
}

/// Path style urls already start with `/{bucket}`.
pub fn canonical_oss_resource_path_style(url: &Url) -> String {
    let decoded = percent_encoding::percent_decode_str(url.path()).decode_utf8_lossy();
    with_sub_resources(decoded.into_owned(), url)
}

fn with_sub_resources(mut resource: String, url: &Url) -> String {
    let mut subresources = url
        .query_pairs()
        .filter(|(key, _)| OSS_SUB_RESOURCES.contains(&key.as_ref()))
        .map(|(key, value)| {
            if value.is_empty() {
                key.to_string()
            } else {
                format!("{}={}", key, value)
            }
        })
        .collect::<Vec<String>>();
    subresources.sort();

    if !subresources.is_empty() {
        resource.push('?');
        resource.push_str(&subresources.join("&"));
    }
    resource
}

pub fn oss_string_to_sign(
    method: &http::Method,
    headers: &HeaderMap,
    resource: &str,
) -> Result<String, VodError> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    };
    Ok(format!(
        "{}\n{}\n{}\n{}\n{}{}",
        method.as_str(),
        header(CONTENT_MD5),
        header("content-type"),
        header("date"),
        canonical_oss_headers(headers)?,
        resource,
    ))
}

pub fn oss_authorization_header(
    access_key: &AccessKeyId,
    secret_key: &AccessKeySecret,
    string_to_sign: &str,
) -> Result<String, VodError> {
    let signature = base64_hmac_sha1(secret_key.as_ref().as_bytes(), string_to_sign.as_bytes())?;
    Ok(format!("OSS {}:{}", access_key.as_ref(), signature))
}
