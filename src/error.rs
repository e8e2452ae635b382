use thiserror::Error;

#[derive(Error, Debug)]
pub enum VodError {
    #[error("base64 decode: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("config: {0}")]
    Config(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("env var missing: {0}")]
    EnvVarMissing(#[from] std::env::VarError),
    #[error("sha1 invalid length: {0}")]
    HmacInvalidLength(#[from] hmac::digest::InvalidLength),
    #[error("Got HTTP {0} with content '{1}'")]
    HttpFailWithBody(u16, String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
    #[error("tokio task join: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("serde json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("serde xml: {0}")]
    SerdeXml(#[from] quick_xml::de::DeError),
    #[error("service: {0}")]
    Service(String),
    #[error("Time format error: {0}")]
    TimeFormatError(#[from] time::error::Format),
    #[error("url parse: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("validation: {0}")]
    Validation(String),
}
