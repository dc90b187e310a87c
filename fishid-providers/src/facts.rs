use crate::request::HttpRequest;
use anyhow::{Context, anyhow};
use url::Url;

/// `GET {base}/facts/{species}`; the species segment is percent-encoded.
pub fn build_facts_request(base_url: &str, species: &str) -> anyhow::Result<HttpRequest> {
    let species = species.trim();
    if species.is_empty() {
        return Err(anyhow!("species must not be empty"));
    }

    let mut url = Url::parse(base_url).with_context(|| format!("invalid base url: {base_url}"))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("base url cannot carry a path: {base_url}"))?
        .pop_if_empty()
        .push("facts")
        .push(species);

    Ok(HttpRequest::get_json(url))
}
