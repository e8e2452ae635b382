use crate::error::VodError;
use async_trait::async_trait;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Issues the signed GET requests of the API facade.
///
/// The body is returned as text no matter which status code the service
/// answered with, error bodies are JSON as well.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url) -> Result<String, VodError>;
}

/// [Transport] backed by a shared `reqwest::Client`
#[derive(Debug, Default, Clone)]
pub struct ReqwestTransport;

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: Url) -> Result<String, VodError> {
        let res = http_client().get(url).send().await?;
        debug!("api responded with HTTP {}", res.status().as_u16());
        Ok(res.text().await?)
    }
}

pub(crate) fn http_client<'a>() -> &'a reqwest::Client {
    CLIENT.get_or_init(|| {
        let mut builder = reqwest::Client::builder()
            .brotli(true)
            .connect_timeout(Duration::from_secs(10))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(600))
            .use_rustls_tls();
        if env::var("VOD_DANGER_ALLOW_INSECURE").as_deref() == Ok("true") {
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build().unwrap_or_else(|err| {
            error!("building the configured http client: {}", err);
            reqwest::Client::new()
        })
    })
}
