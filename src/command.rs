use crate::md5_base64;
use std::fmt;

#[derive(Debug)]
pub struct Part {
    pub part_number: u32,
    pub etag: String,
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Part><PartNumber>{}</PartNumber><ETag>{}</ETag></Part>",
            self.part_number, self.etag
        )
    }
}

#[derive(Debug)]
pub struct CompleteMultipartUploadData {
    pub parts: Vec<Part>,
}

impl fmt::Display for CompleteMultipartUploadData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<CompleteMultipartUpload>")?;
        for part in &self.parts {
            write!(f, "{}", part)?;
        }
        write!(f, "</CompleteMultipartUpload>")
    }
}

#[derive(Debug)]
pub(crate) enum Command<'a> {
    PutObject {
        content: &'a [u8],
        content_type: &'a str,
    },
    InitiateMultipartUpload {
        content_type: &'a str,
    },
    UploadPart {
        part_number: u32,
        content: &'a [u8],
        upload_id: &'a str,
    },
    AbortMultipartUpload {
        upload_id: &'a str,
    },
    CompleteMultipartUpload {
        upload_id: &'a str,
        data: CompleteMultipartUploadData,
    },
}

impl Command<'_> {
    pub(crate) fn http_method(&self) -> http::Method {
        match *self {
            Command::PutObject { .. } | Command::UploadPart { .. } => http::Method::PUT,
            Command::AbortMultipartUpload { .. } => http::Method::DELETE,
            Command::InitiateMultipartUpload { .. } | Command::CompleteMultipartUpload { .. } => {
                http::Method::POST
            }
        }
    }

    pub(crate) fn content_type(&self) -> Option<&str> {
        match self {
            Command::InitiateMultipartUpload { content_type } => Some(*content_type),
            Command::PutObject { content_type, .. } => Some(*content_type),
            Command::CompleteMultipartUpload { .. } => Some("application/xml"),
            Command::UploadPart { .. } | Command::AbortMultipartUpload { .. } => None,
        }
    }

    pub(crate) fn content_md5(&self) -> Option<String> {
        match self {
            Command::PutObject { content, .. } | Command::UploadPart { content, .. } => {
                Some(md5_base64(content))
            }
            Command::CompleteMultipartUpload { data, .. } => {
                Some(md5_base64(data.to_string().as_bytes()))
            }
            _ => None,
        }
    }

    /// Query appended to the object url, already in its final form
    pub(crate) fn query_string(&self) -> Option<String> {
        match self {
            Command::InitiateMultipartUpload { .. } => Some("uploads".to_string()),
            Command::UploadPart {
                part_number,
                upload_id,
                ..
            } => Some(format!("partNumber={}&uploadId={}", part_number, upload_id)),
            Command::AbortMultipartUpload { upload_id }
            | Command::CompleteMultipartUpload { upload_id, .. } => {
                Some(format!("uploadId={}", upload_id))
            }
            Command::PutObject { .. } => None,
        }
    }

    pub(crate) fn body(&self) -> Vec<u8> {
        match self {
            Command::PutObject { content, .. } | Command::UploadPart { content, .. } => {
                content.to_vec()
            }
            Command::CompleteMultipartUpload { data, .. } => data.to_string().into_bytes(),
            _ => Vec::default(),
        }
    }
}
