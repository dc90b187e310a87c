use crate::request::{HttpRequest, MultipartUpload};
use anyhow::bail;
use fishid_core::types::StillImage;

pub const UPLOAD_FIELD: &str = "file";
pub const UPLOAD_FILENAME: &str = "fish.jpg";

// The classification backend rejects anything else.
const ACCEPTED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png"];

#[derive(Clone, PartialEq, Eq)]
pub struct ClassifyRequestConfig {
    pub url: String,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ClassifyRequestConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifyRequestConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload<'a> {
    pub filename: &'a str,
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> ImageUpload<'a> {
    pub fn from_still(image: &'a StillImage) -> Self {
        Self {
            filename: UPLOAD_FILENAME,
            mime_type: image.encoding().mime_type(),
            bytes: image.bytes(),
        }
    }
}

pub fn build_classify_request(
    cfg: &ClassifyRequestConfig,
    upload: &ImageUpload<'_>,
) -> anyhow::Result<HttpRequest> {
    if !ACCEPTED_MIME_TYPES.contains(&upload.mime_type) {
        bail!("unsupported upload type: {}", upload.mime_type);
    }
    if upload.bytes.is_empty() {
        bail!("refusing to upload an empty image");
    }

    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::with_capacity(upload.bytes.len() + 256);
    append_file(
        &mut body,
        &boundary,
        UPLOAD_FIELD,
        upload.filename,
        upload.mime_type,
        upload.bytes,
    );
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    let mut req = HttpRequest::post_upload(
        cfg.url.clone(),
        MultipartUpload {
            boundary,
            bytes: body,
        },
    );
    if let Some(key) = cfg.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
        req = req.with_header("X-Api-Key", key.clone());
    }
    Ok(req)
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}
