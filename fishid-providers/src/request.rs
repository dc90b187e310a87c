// Header names whose values never appear in logs.
const SECRET_HEADERS: &[&str] = &["authorization", "x-api-key"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// An encoded `multipart/form-data` body carrying the still image.
#[derive(Clone, PartialEq, Eq)]
pub struct MultipartUpload {
    pub boundary: String,
    pub bytes: Vec<u8>,
}

impl MultipartUpload {
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

impl std::fmt::Debug for MultipartUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultipartUpload")
            .field("boundary", &self.boundary)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Empty,
    Upload(MultipartUpload),
}

/// A request to the classification backend, built before any I/O happens.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl HttpRequest {
    /// JSON `GET`, as used by the facts endpoint.
    pub fn get_json(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: vec![("Accept".into(), "application/json".into())],
            body: Body::Empty,
        }
    }

    /// `POST` of an image upload expecting a JSON answer.
    pub fn post_upload(url: impl Into<String>, upload: MultipartUpload) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: vec![
                ("Content-Type".into(), upload.content_type()),
                ("Accept".into(), "application/json".into()),
            ],
            body: Body::Upload(upload),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(k, v)| {
                let secret = SECRET_HEADERS.iter().any(|s| k.eq_ignore_ascii_case(s));
                (k.as_str(), if secret { "[REDACTED]" } else { v.as_str() })
            })
            .collect();

        f.debug_struct("HttpRequest")
            .field("method", &self.method.as_str())
            .field("url", &self.url)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facts_lookup_asks_for_json() {
        let req = HttpRequest::get_json("http://127.0.0.1:8000/facts/tuna");
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("x-api-key"), None);
        assert_eq!(req.body, Body::Empty);
    }

    #[test]
    fn upload_carries_its_boundary_in_the_content_type() {
        let upload = MultipartUpload {
            boundary: "Boundary-1".into(),
            bytes: vec![0xFF, 0xD8],
        };
        let req = HttpRequest::post_upload("http://127.0.0.1:8000/predict", upload);
        assert_eq!(req.method.as_str(), "POST");
        assert_eq!(
            req.header("Content-Type"),
            Some("multipart/form-data; boundary=Boundary-1")
        );
    }

    #[test]
    fn debug_redacts_keys_and_summarizes_image_bytes() {
        let upload = MultipartUpload {
            boundary: "b".into(),
            bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
        };
        let req = HttpRequest::post_upload("http://127.0.0.1:8000/predict", upload)
            .with_header("Authorization", "Bearer sk-test-123")
            .with_header("X-Api-Key", "x-789");

        let s = format!("{req:?}");
        assert!(!s.contains("sk-test-123"));
        assert!(!s.contains("x-789"));
        assert!(s.contains("[REDACTED]"));
        assert!(s.contains("bytes_len: 4"));
    }
}
