use async_trait::async_trait;
use fishid_core::config::SessionConfig;
use fishid_core::normalize::{RawPayload, decode_payload};
use fishid_core::types::StillImage;
use fishid_engine::error::ClassifyError;
use fishid_engine::traits::Classifier;
use fishid_providers::classify::{ClassifyRequestConfig, ImageUpload, build_classify_request};
use fishid_providers::facts::build_facts_request;
use fishid_providers::parse::{SpeciesFacts, body_excerpt, parse_facts_response};
use fishid_providers::runtime::{HttpTimeouts, build_client, execute_with};

/// Uploads stills to the classification backend over HTTP.
#[derive(Clone)]
pub struct HttpClassifier {
    client: reqwest::Client,
    base_url: String,
    request: ClassifyRequestConfig,
    timeouts: HttpTimeouts,
}

impl std::fmt::Debug for HttpClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClassifier")
            .field("base_url", &self.base_url)
            .field("request", &self.request)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl HttpClassifier {
    pub fn from_config(cfg: &SessionConfig) -> anyhow::Result<Self> {
        let timeouts = HttpTimeouts {
            connect: cfg.connect_timeout(),
            request: cfg.submit_timeout(),
        };
        Ok(Self {
            client: build_client(timeouts)?,
            base_url: cfg.base_url.clone(),
            request: ClassifyRequestConfig {
                url: cfg.classify_url(),
                api_key: cfg.api_key().map(str::to_string),
            },
            timeouts,
        })
    }

    pub fn classify_url(&self) -> &str {
        &self.request.url
    }

    /// `GET /facts/{species}` on the same backend.
    pub async fn fetch_facts(&self, species: &str) -> anyhow::Result<SpeciesFacts> {
        let req = build_facts_request(&self.base_url, species)?;
        let resp = execute_with(&self.client, &req).await?;
        if !resp.is_success() {
            return Err(anyhow::anyhow!(
                "facts lookup failed: status={} body={}",
                resp.status,
                body_excerpt(&resp.body)
            ));
        }
        parse_facts_response(&resp.body)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &StillImage) -> Result<RawPayload, ClassifyError> {
        let req = build_classify_request(&self.request, &ImageUpload::from_still(image))
            .map_err(|e| ClassifyError::Transport(format!("{e:#}")))?;
        log::debug!("uploading {} bytes to {}", image.len(), self.request.url);

        let resp = execute_with(&self.client, &req).await.map_err(|e| {
            if is_timeout(&e) {
                ClassifyError::Timeout(self.timeouts.request)
            } else {
                ClassifyError::Transport(format!("{e:#}"))
            }
        })?;

        if !resp.is_success() {
            return Err(ClassifyError::Status {
                status: resp.status,
                body: body_excerpt(&resp.body),
            });
        }

        Ok(decode_payload(&resp.body)?)
    }
}

fn is_timeout(e: &anyhow::Error) -> bool {
    e.chain()
        .any(|c| c.downcast_ref::<reqwest::Error>().is_some_and(reqwest::Error::is_timeout))
}
