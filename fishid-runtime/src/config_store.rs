use anyhow::Context;
use fishid_core::config::SessionConfig;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const ENV_ENDPOINT: &str = "FISHID_ENDPOINT";
pub const ENV_API_KEY: &str = "FISHID_API_KEY";
pub const ENV_TIMEOUT_MS: &str = "FISHID_TIMEOUT_MS";

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the defaults; a present but broken one is an error.
    pub fn load(&self) -> anyhow::Result<SessionConfig> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}; using defaults", self.path.display());
                return Ok(SessionConfig::default());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read config: {}", self.path.display())));
            }
        };
        let cfg: SessionConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// The API key is never written to disk. The file is replaced in one rename, so readers
    /// see either the old or the new config.
    pub fn save(&self, cfg: &SessionConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create config directory: {}", dir.display()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("create temp config in {}", dir.display()))?;
        tmp.write_all(&json).context("write temp config")?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("replace config: {}", self.path.display()))?;

        log::info!("saved config to {}", self.path.display());
        Ok(())
    }
}

/// Applies `FISHID_*` overrides. `lookup` is usually `|k| std::env::var(k).ok()`.
pub fn apply_env_overrides(
    mut cfg: SessionConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<SessionConfig> {
    if let Some(endpoint) = lookup(ENV_ENDPOINT).filter(|v| !v.trim().is_empty()) {
        cfg.base_url = endpoint.trim().to_string();
    }
    if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
        cfg.api_key = Some(key.trim().to_string());
    }
    if let Some(raw) = lookup(ENV_TIMEOUT_MS).filter(|v| !v.trim().is_empty()) {
        cfg.submit_timeout_ms = raw
            .trim()
            .parse()
            .with_context(|| format!("{ENV_TIMEOUT_MS} must be milliseconds, got {raw:?}"))?;
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fishid_core::types::FacingMode;
    use std::collections::HashMap;

    #[test]
    fn round_trips_config_without_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("nested").join("config.json"));

        let cfg = SessionConfig {
            base_url: "https://fish.example".into(),
            facing: FacingMode::User,
            submit_timeout_ms: 12_000,
            keep_device_between_captures: true,
            api_key: Some("secret".into()),
            ..Default::default()
        };

        store.save(&cfg).unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(!text.contains("secret"));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.base_url, "https://fish.example");
        assert_eq!(loaded.facing, FacingMode::User);
        assert_eq!(loaded.submit_timeout_ms, 12_000);
        assert!(loaded.keep_device_between_captures);
        assert_eq!(loaded.api_key, None);
    }

    #[test]
    fn save_overwrites_in_place_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("config.json"));

        store.save(&SessionConfig::default()).unwrap();
        let cfg = SessionConfig {
            base_url: "http://10.0.0.7:8000".into(),
            ..Default::default()
        };
        store.save(&cfg).unwrap();

        assert_eq!(store.load().unwrap().base_url, "http://10.0.0.7:8000");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("config.json")]);
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::at_path(dir.path().join("absent.json"));
        assert_eq!(store.load().unwrap(), SessionConfig::default());
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ConfigStore::at_path(path).load().is_err());
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT, " http://10.0.0.2:9000 "),
            (ENV_API_KEY, "k-123"),
            (ENV_TIMEOUT_MS, "4500"),
        ]
        .into_iter()
        .collect();

        let cfg = apply_env_overrides(SessionConfig::default(), |k| {
            env.get(k).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(cfg.base_url, "http://10.0.0.2:9000");
        assert_eq!(cfg.api_key(), Some("k-123"));
        assert_eq!(cfg.submit_timeout_ms, 4500);
    }

    #[test]
    fn blank_overrides_are_ignored_and_bad_timeouts_rejected() {
        let cfg = apply_env_overrides(SessionConfig::default(), |k| {
            (k == ENV_ENDPOINT).then(|| "   ".to_string())
        })
        .unwrap();
        assert_eq!(cfg, SessionConfig::default());

        let err = apply_env_overrides(SessionConfig::default(), |k| {
            (k == ENV_TIMEOUT_MS).then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_MS));
    }
}
