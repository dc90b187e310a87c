use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesFacts {
    pub species: String,
    pub facts: String,
}

pub fn parse_facts_response(body: &[u8]) -> anyhow::Result<SpeciesFacts> {
    let resp: SpeciesFacts = serde_json::from_slice(body).context("decode facts JSON")?;
    if resp.facts.trim().is_empty() {
        return Err(anyhow!("no facts in response for {}", resp.species));
    }
    Ok(resp)
}

/// Short, single-line excerpt of a response body for error messages.
pub fn body_excerpt(body: &[u8]) -> String {
    const MAX: usize = 200;
    let text = String::from_utf8_lossy(body);
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        return flat;
    }

    flat.chars().take(MAX).collect::<String>() + "…"
}
