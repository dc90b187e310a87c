use crate::request::{Body, HttpRequest, Method};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

pub fn build_client(timeouts: HttpTimeouts) -> anyhow::Result<reqwest::Client> {
    // Without an explicit timeout a broken endpoint would leave the session stuck in
    // Submitting.
    reqwest::Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .build()
        .context("build http client")
}

pub async fn execute(req: &HttpRequest, timeouts: HttpTimeouts) -> anyhow::Result<HttpResponse> {
    let client = build_client(timeouts)?;
    execute_with(&client, req).await
}

pub async fn execute_with(
    client: &reqwest::Client,
    req: &HttpRequest,
) -> anyhow::Result<HttpResponse> {
    let mut headers = HeaderMap::new();
    for (k, v) in &req.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .with_context(|| format!("invalid header name: {k}"))?;
        let value =
            HeaderValue::from_str(v).with_context(|| format!("invalid header value for {k}"))?;
        headers.insert(name, value);
    }

    let builder = match req.method {
        Method::Get => client.get(&req.url),
        Method::Post => client.post(&req.url),
    }
    .headers(headers);

    let builder = match &req.body {
        Body::Empty => builder,
        Body::Upload(upload) => builder.body(upload.bytes.clone()),
    };

    log::debug!("{} {}", req.method.as_str(), req.url);

    let resp = builder.send().await.context("http request failed")?;
    let status = resp.status().as_u16();
    let body = resp
        .bytes()
        .await
        .context("failed reading response body")?
        .to_vec();

    Ok(HttpResponse { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_headers_and_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/facts/tuna"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let req = HttpRequest::get_json(format!("{}/facts/tuna", server.uri()));
        let resp = execute(&req, HttpTimeouts::default()).await.unwrap();
        assert_eq!(resp.status, 404);
        assert!(!resp.is_success());
        assert_eq!(resp.body, b"nope");
    }

    #[tokio::test]
    async fn request_timeout_is_enforced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let req = HttpRequest::get_json(server.uri());
        let timeouts = HttpTimeouts {
            connect: Duration::from_secs(1),
            request: Duration::from_millis(100),
        };
        assert!(execute(&req, timeouts).await.is_err());
    }
}
