use crate::command::{Command, CompleteMultipartUploadData, Part};
use crate::constants::{HTTP_DATE, OSS_SECURITY_TOKEN};
use crate::error::VodError;
use crate::signature;
use crate::transport::http_client;
use crate::types::{InitiateMultipartUploadResponse, StorageConfig, UploadOutcome};
use crate::OssResponse;
use http::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, DATE, ETAG};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::io;
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error};
use url::Url;

pub const CHUNK_SIZE: usize = 8 * 1024 * 1024; // 8 MiB, min part size for OSS is 100 KiB

/// Upload progress as a fraction between `0.0` and `1.0`
pub type Progress = Arc<dyn Fn(f64) + Send + Sync>;

/// OSS bucket reachable with temporary upload credentials
#[derive(Debug, Clone)]
pub struct Bucket {
    pub host: Url,
    pub name: String,
    /// `{host}/{bucket}/{key}` instead of `{bucket}.{host}/{key}`, used for IP
    /// endpoints which cannot carry a bucket subdomain
    pub path_style: bool,
    config: StorageConfig,
}

impl Bucket {
    fn host_domain(&self) -> Result<String, VodError> {
        let host_str = match self.host.domain() {
            Some(domain) => domain,
            // in this case, we have an IP as part of the domain
            None => self.host.host_str().ok_or_else(|| {
                VodError::Config(format!("endpoint '{}' has no host", self.host))
            })?,
        };
        if let Some(port) = self.host.port() {
            Ok(format!("{}:{}", host_str, port))
        } else {
            Ok(host_str.to_string())
        }
    }

    /// The endpoint may come without a scheme, `https` is assumed then.
    pub fn new(config: StorageConfig) -> Result<Self, VodError> {
        let endpoint = config.endpoint.trim();
        let host = if endpoint.contains("://") {
            endpoint.parse::<Url>()?
        } else {
            format!("https://{}", endpoint).parse::<Url>()?
        };
        if config.bucket.is_empty() {
            return Err(VodError::Config("bucket name must not be empty".to_string()));
        }

        Ok(Self {
            path_style: host.domain().is_none(),
            host,
            name: config.bucket.clone(),
            config,
        })
    }

    /// Single PUT of an in-memory object
    pub async fn put_with_content_type<S: AsRef<str>>(
        &self,
        key: S,
        content: &[u8],
        content_type: &str,
    ) -> Result<OssResponse, VodError> {
        let command = Command::PutObject {
            content,
            content_type,
        };
        self.send_request(command, key.as_ref()).await
    }

    /// Uploads a local file, in parts if it exceeds a single chunk.
    pub async fn put_file<S: AsRef<str>>(
        &self,
        key: S,
        file: &Path,
        progress: Progress,
    ) -> Result<UploadOutcome, VodError> {
        let mut reader = tokio::fs::File::open(file).await?;
        let total = reader.metadata().await?.len();
        self.put_stream_with_content_type(
            &mut reader,
            key.as_ref().to_string(),
            "application/octet-stream".to_string(),
            total,
            progress,
        )
        .await
    }

    /// Streaming object upload from any reader that implements `AsyncRead`.
    /// `total` is only used to compute the progress.
    #[tracing::instrument(level = "debug", skip_all, fields(key = %key))]
    pub async fn put_stream_with_content_type<R>(
        &self,
        reader: &mut R,
        key: String,
        content_type: String,
        total: u64,
        progress: Progress,
    ) -> Result<UploadOutcome, VodError>
    where
        R: AsyncRead + Unpin,
    {
        let head = read_chunk(reader).await?;
        if head.len() < CHUNK_SIZE {
            debug!("{} bytes fit into a single PUT", head.len());
            let res = self
                .put_with_content_type(&key, &head, &content_type)
                .await?;
            let res = ensure_success(res).await?;
            progress(1.0);
            return Ok(UploadOutcome {
                status_code: res.status().as_u16(),
                uploaded_bytes: head.len(),
            });
        }

        let upload = self.initiate_multipart_upload(&key, &content_type).await?;
        debug!("started multipart upload {}", upload.upload_id);
        let (upload_key, upload_id) = (upload.key.clone(), upload.upload_id.clone());

        // parts are sent from their own task while this one keeps reading,
        // at most 2 chunks wait in between
        let (tx, rx) = flume::bounded::<Vec<u8>>(2);
        let writer = tokio::spawn(upload_parts(
            self.clone(),
            upload,
            head,
            rx,
            total,
            progress,
        ));

        loop {
            match read_chunk(reader).await {
                Ok(chunk) if chunk.is_empty() => break,
                Ok(chunk) => {
                    let is_last = chunk.len() < CHUNK_SIZE;
                    if tx.send_async(chunk).await.is_err() {
                        debug!("part writer stopped before the reader finished");
                        break;
                    }
                    if is_last {
                        break;
                    }
                }
                Err(err) => {
                    error!("reading the upload source: {}", err);
                    // the writer must not complete an upload with missing parts
                    writer.abort();
                    self.abort_upload(&upload_key, &upload_id).await;
                    return Err(VodError::Io(err));
                }
            }
        }
        drop(tx);

        writer.await?
    }

    async fn initiate_multipart_upload(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<InitiateMultipartUploadResponse, VodError> {
        let res = self
            .send_request(Command::InitiateMultipartUpload { content_type }, key)
            .await?;
        let body = ensure_success(res).await?.text().await?;
        Ok(quick_xml::de::from_str(&body)?)
    }

    /// Returns the ETag of the stored part.
    async fn upload_part(
        &self,
        upload: &InitiateMultipartUploadResponse,
        part_number: u32,
        content: &[u8],
    ) -> Result<String, VodError> {
        let command = Command::UploadPart {
            part_number,
            content,
            upload_id: &upload.upload_id,
        };
        let res = ensure_success(self.send_request(command, &upload.key).await?).await?;

        let etag = res
            .headers()
            .get(ETAG)
            .ok_or_else(|| VodError::Decode(format!("no ETag for part {}", part_number)))?
            .to_str()
            .map_err(|err| VodError::Decode(format!("ETag of part {}: {}", part_number, err)))?;
        Ok(etag.to_string())
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: Vec<Part>,
    ) -> Result<OssResponse, VodError> {
        let command = Command::CompleteMultipartUpload {
            upload_id,
            data: CompleteMultipartUploadData { parts },
        };
        ensure_success(self.send_request(command, key).await?).await
    }

    /// Best effort, the part error is the one that matters to the caller.
    async fn abort_upload(&self, key: &str, upload_id: &str) {
        let res = match self
            .send_request(Command::AbortMultipartUpload { upload_id }, key)
            .await
        {
            Ok(res) => ensure_success(res).await,
            Err(err) => Err(err),
        };
        match res {
            Ok(_) => debug!("aborted multipart upload {}", upload_id),
            Err(err) => error!("aborting multipart upload {}: {}", upload_id, err),
        }
    }

    async fn send_request(
        &self,
        command: Command<'_>,
        path: &str,
    ) -> Result<OssResponse, VodError> {
        let url = self.build_url(&command, path)?;
        let headers = self.build_headers(&command, &url)?;

        let res = http_client()
            .request(command.http_method(), url)
            .headers(headers)
            .body(command.body())
            .send()
            .await?;

        Ok(res)
    }

    fn build_headers(&self, command: &Command<'_>, url: &Url) -> Result<HeaderMap, VodError> {
        let now = OffsetDateTime::now_utc();
        let mut headers = HeaderMap::with_capacity(6);

        headers.insert(
            CONTENT_LENGTH,
            HeaderValue::try_from(command.body().len().to_string())?,
        );
        if let Some(content_type) = command.content_type() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        }
        if let Some(md5) = command.content_md5() {
            headers.insert(
                HeaderName::from_static("content-md5"),
                HeaderValue::try_from(md5)?,
            );
        }
        headers.insert(DATE, HeaderValue::try_from(now.format(HTTP_DATE)?)?);
        if let Some(token) = &self.config.security_token {
            let mut value = HeaderValue::from_str(token.as_ref())?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(OSS_SECURITY_TOKEN), value);
        }

        // sign all the above headers with the secret
        let resource = if self.path_style {
            signature::canonical_oss_resource_path_style(url)
        } else {
            signature::canonical_oss_resource(&self.name, url)
        };
        let string_to_sign =
            signature::oss_string_to_sign(&command.http_method(), &headers, &resource)?;
        let authorization = signature::oss_authorization_header(
            &self.config.access_key_id,
            &self.config.access_key_secret,
            &string_to_sign,
        )?;
        let mut authorization = HeaderValue::try_from(authorization)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        Ok(headers)
    }

    fn build_url(&self, command: &Command, path: &str) -> Result<Url, VodError> {
        let path = path.strip_prefix('/').unwrap_or(path);
        // dot segments would be collapsed by the url parser, encoded or not
        if path.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(VodError::Validation(format!(
                "object key '{}' must not contain '.' or '..' segments",
                path
            )));
        }
        let path = path
            .split('/')
            .map(signature::percent_encode)
            .collect::<Vec<String>>()
            .join("/");

        let mut url = if self.path_style {
            format!(
                "{}://{}/{}/{}",
                self.host.scheme(),
                self.host_domain()?,
                self.name,
                path,
            )
        } else {
            format!(
                "{}://{}.{}/{}",
                self.host.scheme(),
                self.name,
                self.host_domain()?,
                path,
            )
        };
        if let Some(query) = command.query_string() {
            url.push('?');
            url.push_str(&query);
        }

        Ok(Url::parse(&url)?)
    }
}

/// Sends `head` and every chunk from `rx` as consecutive parts, then completes
/// the upload. Any failed part aborts the whole multipart upload.
async fn upload_parts(
    bucket: Bucket,
    upload: InitiateMultipartUploadResponse,
    head: Vec<u8>,
    rx: flume::Receiver<Vec<u8>>,
    total: u64,
    progress: Progress,
) -> Result<UploadOutcome, VodError> {
    let mut parts = Vec::new();
    let mut uploaded = 0;
    let mut next = Some(head);

    while let Some(chunk) = next.take() {
        let part_number = parts.len() as u32 + 1;
        match bucket.upload_part(&upload, part_number, &chunk).await {
            Ok(etag) => parts.push(Part { part_number, etag }),
            Err(err) => {
                bucket.abort_upload(&upload.key, &upload.upload_id).await;
                return Err(err);
            }
        }

        uploaded += chunk.len();
        debug!("part {} done, {} bytes uploaded", part_number, uploaded);
        if total > 0 {
            progress((uploaded as f64 / total as f64).min(1.0));
        }

        // a closed channel means the reader is done
        next = rx.recv_async().await.ok();
    }

    let part_count = parts.len();
    let res = bucket
        .complete_multipart_upload(&upload.key, &upload.upload_id, parts)
        .await?;
    debug!("completed multipart upload after {} parts", part_count);
    progress(1.0);

    Ok(UploadOutcome {
        status_code: res.status().as_u16(),
        uploaded_bytes: uploaded,
    })
}

/// Reads up to [CHUNK_SIZE] bytes, less only at the end of the reader.
async fn read_chunk<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(CHUNK_SIZE);
    (&mut *reader)
        .take(CHUNK_SIZE as u64)
        .read_to_end(&mut buf)
        .await?;
    Ok(buf)
}

async fn ensure_success(res: OssResponse) -> Result<OssResponse, VodError> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        Err(VodError::HttpFailWithBody(
            status.as_u16(),
            res.text().await.unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{AccessKeyId, AccessKeySecret, SecurityToken};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};
    use tracing_test::traced_test;

    fn test_bucket(endpoint: &str, token: Option<&str>) -> Bucket {
        Bucket::new(StorageConfig {
            endpoint: endpoint.to_string(),
            bucket: "outin-bucket".to_string(),
            access_key_id: AccessKeyId::new("STS.id".to_string()),
            access_key_secret: AccessKeySecret::new("sts-secret".to_string()),
            security_token: token.map(|t| SecurityToken(t.to_string())),
        })
        .unwrap()
    }

    #[test]
    fn test_build_url() {
        let bucket = test_bucket("https://oss-cn-shanghai.aliyuncs.com", None);
        let cmd = Command::UploadPart {
            part_number: 1,
            content: b"",
            upload_id: "abc",
        };
        let url = bucket.build_url(&cmd, "/sv/video one.mp4").unwrap();
        assert_eq!(
            url.as_str(),
            "https://outin-bucket.oss-cn-shanghai.aliyuncs.com/sv/video%20one.mp4?partNumber=1&uploadId=abc"
        );

        let cmd = Command::InitiateMultipartUpload {
            content_type: "video/mp4",
        };
        let url = bucket.build_url(&cmd, "a.mp4").unwrap();
        assert_eq!(
            url.as_str(),
            "https://outin-bucket.oss-cn-shanghai.aliyuncs.com/a.mp4?uploads"
        );
    }

    #[test]
    fn test_build_url_rejects_dot_segments() {
        let bucket = test_bucket("https://oss-cn-shanghai.aliyuncs.com", None);
        let cmd = Command::InitiateMultipartUpload {
            content_type: "video/mp4",
        };
        for key in ["a/./b.mp4", "a/../b.mp4", "./b.mp4", "a/.."] {
            assert!(matches!(
                bucket.build_url(&cmd, key),
                Err(VodError::Validation(_))
            ));
        }

        let url = bucket.build_url(&cmd, "a/.hidden/b..mp4").unwrap();
        assert_eq!(url.path(), "/a/.hidden/b..mp4");
    }

    #[test]
    fn test_endpoint_without_scheme() {
        let bucket = test_bucket("oss-cn-beijing.aliyuncs.com", None);
        assert_eq!(bucket.host.scheme(), "https");
        assert!(!bucket.path_style);
        assert_eq!(bucket.host_domain().unwrap(), "oss-cn-beijing.aliyuncs.com");

        let bucket = test_bucket("http://127.0.0.1:9000", None);
        assert_eq!(bucket.host.scheme(), "http");
        assert_eq!(bucket.host_domain().unwrap(), "127.0.0.1:9000");
        assert!(bucket.path_style);

        let cmd = Command::InitiateMultipartUpload {
            content_type: "video/mp4",
        };
        let url = bucket.build_url(&cmd, "sv/a.mp4").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/outin-bucket/sv/a.mp4?uploads");
    }

    #[test]
    fn test_empty_bucket_name() {
        let res = Bucket::new(StorageConfig {
            endpoint: "oss-cn-beijing.aliyuncs.com".to_string(),
            bucket: String::default(),
            access_key_id: AccessKeyId::new("id".to_string()),
            access_key_secret: AccessKeySecret::new("secret".to_string()),
            security_token: None,
        });
        assert!(matches!(res, Err(VodError::Config(_))));
    }

    #[tokio::test]
    async fn test_read_chunk() {
        let data = vec![7u8; CHUNK_SIZE + 5];
        let mut reader = std::io::Cursor::new(data);

        assert_eq!(read_chunk(&mut reader).await.unwrap().len(), CHUNK_SIZE);
        assert_eq!(read_chunk(&mut reader).await.unwrap(), vec![7u8; 5]);
        assert!(read_chunk(&mut reader).await.unwrap().is_empty());
    }

    #[test]
    fn test_build_headers() {
        let bucket = test_bucket("https://oss-cn-shanghai.aliyuncs.com", Some("sts-token"));
        let cmd = Command::PutObject {
            content: b"hello",
            content_type: "video/mp4",
        };
        let url = bucket.build_url(&cmd, "a.mp4").unwrap();
        let headers = bucket.build_headers(&cmd, &url).unwrap();

        assert_eq!(headers.get(CONTENT_LENGTH).unwrap(), "5");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "video/mp4");
        assert_eq!(headers.get("content-md5").unwrap(), "XUFAKrxLKna5cZ2REBfFkg==");
        assert_eq!(headers.get(OSS_SECURITY_TOKEN).unwrap(), "sts-token");
        assert!(headers.get(DATE).unwrap().to_str().unwrap().ends_with(" GMT"));

        let auth = headers.get(AUTHORIZATION).unwrap();
        assert!(auth.is_sensitive());
        assert!(auth.to_str().unwrap().starts_with("OSS STS.id:"));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Received {
        method: String,
        target: String,
        body_len: usize,
        body: String,
    }

    /// Minimal OSS endpoint, answering one request per connection. A PUT for
    /// part `fail_part` is answered with 403.
    async fn stub_oss(fail_part: Option<u32>) -> (String, Arc<Mutex<Vec<Received>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let received = Arc::new(Mutex::new(Vec::new()));

        let log = received.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = log.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, log, fail_part).await;
                });
            }
        });

        (endpoint, received)
    }

    async fn serve(
        mut stream: TcpStream,
        log: Arc<Mutex<Vec<Received>>>,
        fail_part: Option<u32>,
    ) -> io::Result<()> {
        let (read, mut write) = stream.split();
        let mut reader = BufReader::new(read);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).await?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or_default().to_string();

        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).await?;
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or_default();
                }
            }
        }
        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).await?;

        let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
        let key = path.strip_prefix("/outin-bucket/").unwrap_or(path);
        let part_number = query
            .split('&')
            .find_map(|kv| kv.strip_prefix("partNumber="))
            .and_then(|n| n.parse::<u32>().ok());

        let (status, headers, res_body) = match (method.as_str(), query) {
            ("POST", "uploads") => (
                "200 OK",
                String::default(),
                format!(
                    "<InitiateMultipartUploadResult><Bucket>outin-bucket</Bucket>\
                     <Key>{}</Key><UploadId>up-1</UploadId></InitiateMultipartUploadResult>",
                    key
                ),
            ),
            ("PUT", _) if part_number.is_some() && part_number == fail_part => (
                "403 Forbidden",
                String::default(),
                "<Error><Code>AccessDenied</Code></Error>".to_string(),
            ),
            ("PUT", _) => (
                "200 OK",
                format!("ETag: \"etag-{}\"\r\n", part_number.unwrap_or_default()),
                String::default(),
            ),
            ("DELETE", _) => ("204 No Content", String::default(), String::default()),
            _ => (
                "200 OK",
                String::default(),
                "<CompleteMultipartUploadResult/>".to_string(),
            ),
        };

        log.lock().unwrap().push(Received {
            method,
            target: target.clone(),
            body_len: body.len(),
            body: if body.len() < 1024 {
                String::from_utf8_lossy(&body).to_string()
            } else {
                String::default()
            },
        });

        let response = format!(
            "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            headers,
            res_body.len(),
            res_body
        );
        write.write_all(response.as_bytes()).await?;
        write.flush().await?;
        Ok(())
    }

    fn recording_progress() -> (Progress, Arc<Mutex<Vec<f64>>>) {
        let ticks = Arc::new(Mutex::new(Vec::new()));
        let ticks_cb = ticks.clone();
        let progress: Progress = Arc::new(move |p| ticks_cb.lock().unwrap().push(p));
        (progress, ticks)
    }

    fn requests(received: &Arc<Mutex<Vec<Received>>>) -> Vec<(String, String)> {
        received
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.method.clone(), r.target.clone()))
            .collect()
    }

    fn owned(requests: &[(&str, &str)]) -> Vec<(String, String)> {
        requests
            .iter()
            .map(|(m, t)| (m.to_string(), t.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_small_file_single_put() {
        let (endpoint, received) = stub_oss(None).await;
        let bucket = test_bucket(&endpoint, Some("sts-token"));
        let (progress, ticks) = recording_progress();

        let mut reader = std::io::Cursor::new(b"tiny video".to_vec());
        let outcome = bucket
            .put_stream_with_content_type(
                &mut reader,
                "sv/abc/video.mp4".to_string(),
                "video/mp4".to_string(),
                10,
                progress,
            )
            .await
            .unwrap();

        assert_eq!(
            outcome,
            UploadOutcome {
                status_code: 200,
                uploaded_bytes: 10
            }
        );
        assert_eq!(
            requests(&received),
            owned(&[("PUT", "/outin-bucket/sv/abc/video.mp4")])
        );
        assert_eq!(received.lock().unwrap()[0].body, "tiny video");
        assert_eq!(ticks.lock().unwrap().as_slice(), &[1.0]);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_multipart_upload_exact_chunks() {
        let (endpoint, received) = stub_oss(None).await;
        let bucket = test_bucket(&endpoint, Some("sts-token"));
        let (progress, ticks) = recording_progress();

        let total = 2 * CHUNK_SIZE;
        let mut reader = std::io::Cursor::new(vec![1u8; total]);
        let outcome = bucket
            .put_stream_with_content_type(
                &mut reader,
                "sv/abc/video.mp4".to_string(),
                "video/mp4".to_string(),
                total as u64,
                progress,
            )
            .await
            .unwrap();

        assert_eq!(outcome.status_code, 200);
        assert_eq!(outcome.uploaded_bytes, total);
        assert_eq!(
            requests(&received),
            owned(&[
                ("POST", "/outin-bucket/sv/abc/video.mp4?uploads"),
                (
                    "PUT",
                    "/outin-bucket/sv/abc/video.mp4?partNumber=1&uploadId=up-1"
                ),
                (
                    "PUT",
                    "/outin-bucket/sv/abc/video.mp4?partNumber=2&uploadId=up-1"
                ),
                ("POST", "/outin-bucket/sv/abc/video.mp4?uploadId=up-1"),
            ])
        );

        let received = received.lock().unwrap();
        assert_eq!(received[1].body_len, CHUNK_SIZE);
        assert_eq!(received[2].body_len, CHUNK_SIZE);
        assert_eq!(
            received[3].body,
            "<CompleteMultipartUpload>\
             <Part><PartNumber>1</PartNumber><ETag>\"etag-1\"</ETag></Part>\
             <Part><PartNumber>2</PartNumber><ETag>\"etag-2\"</ETag></Part>\
             </CompleteMultipartUpload>"
        );
        assert_eq!(ticks.lock().unwrap().as_slice(), &[0.5, 1.0, 1.0]);
        assert!(logs_contain("started multipart upload up-1"));
    }

    #[tokio::test]
    async fn test_multipart_upload_failed_part_aborts() {
        let (endpoint, received) = stub_oss(Some(2)).await;
        let bucket = test_bucket(&endpoint, None);
        let (progress, ticks) = recording_progress();

        let total = 2 * CHUNK_SIZE + 10;
        let mut reader = std::io::Cursor::new(vec![2u8; total]);
        let res = bucket
            .put_stream_with_content_type(
                &mut reader,
                "sv/abc/video.mp4".to_string(),
                "video/mp4".to_string(),
                total as u64,
                progress,
            )
            .await;

        match res {
            Err(VodError::HttpFailWithBody(status, body)) => {
                assert_eq!(status, 403);
                assert!(body.contains("AccessDenied"));
            }
            res => panic!("expected HTTP 403, got {:?}", res),
        }
        assert_eq!(
            requests(&received),
            owned(&[
                ("POST", "/outin-bucket/sv/abc/video.mp4?uploads"),
                (
                    "PUT",
                    "/outin-bucket/sv/abc/video.mp4?partNumber=1&uploadId=up-1"
                ),
                (
                    "PUT",
                    "/outin-bucket/sv/abc/video.mp4?partNumber=2&uploadId=up-1"
                ),
                ("DELETE", "/outin-bucket/sv/abc/video.mp4?uploadId=up-1"),
            ])
        );
        // only the first part made it
        let ticks = ticks.lock().unwrap();
        assert_eq!(ticks.len(), 1);
        assert!(ticks[0] < 1.0);
    }
}
