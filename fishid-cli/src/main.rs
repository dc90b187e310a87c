use std::path::PathBuf;

use anyhow::{anyhow, bail};
use fishid_core::types::{ClassificationResult, UNKNOWN};
use fishid_runtime::config_store::{ConfigStore, apply_env_overrides};
use fishid_runtime::runtime_engine::build_file_controller;

const USAGE: &str =
    "usage: fishid-cli <image-path> [--endpoint URL] [--config PATH [--save-config]] [--facts]";

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    image: PathBuf,
    endpoint: Option<String>,
    config: Option<PathBuf>,
    save_config: bool,
    facts: bool,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut image = None;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--endpoint" => {
                args.endpoint = Some(argv.next().ok_or_else(|| anyhow!("--endpoint needs a URL"))?);
            }
            "--config" => {
                let path = argv.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                args.config = Some(path.into());
            }
            "--save-config" => args.save_config = true,
            "--facts" => args.facts = true,
            "-h" | "--help" => bail!("{USAGE}"),
            flag if flag.starts_with("--") => bail!("unknown flag {flag}\n{USAGE}"),
            path => {
                if image.replace(PathBuf::from(path)).is_some() {
                    bail!("only one image path is accepted\n{USAGE}");
                }
            }
        }
    }

    if args.save_config && args.config.is_none() {
        bail!("--save-config needs --config PATH\n{USAGE}");
    }
    args.image = image.ok_or_else(|| anyhow!("{USAGE}"))?;
    Ok(args)
}

// The fallback type names no species, so there is nothing to look up.
fn facts_species(result: &ClassificationResult) -> Option<&str> {
    let species = result.fish_type.trim();
    (!species.is_empty() && species != UNKNOWN).then_some(species)
}

fn print_result(result: &ClassificationResult) {
    println!("fish type:  {}", result.fish_type);
    println!("description: {}", result.description);
    println!("habitat:    {}", result.habitat);
    println!("edibility:  {}", result.edibility);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = parse_args(std::env::args().skip(1))?;

    let mut cfg = match &args.config {
        Some(path) => ConfigStore::at_path(path).load()?,
        None => Default::default(),
    };
    cfg = apply_env_overrides(cfg, |k| std::env::var(k).ok())?;
    if let Some(endpoint) = args.endpoint {
        cfg.base_url = endpoint;
    }
    log::debug!("config: {cfg:?}");

    if args.save_config {
        if let Some(path) = &args.config {
            ConfigStore::at_path(path).save(&cfg)?;
        }
    }

    let (session, classifier) = build_file_controller(cfg, &args.image)?;

    let outcome = async {
        session.start_camera().await?;
        session.capture()?;
        session.submit().await
    }
    .await;
    session.stop();

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            let hint = e.user_message().unwrap_or_default();
            return Err(anyhow::Error::new(e).context(format!("identify failed. {hint}")));
        }
    };

    print_result(&result);

    if args.facts {
        match facts_species(&result) {
            Some(species) => match classifier.fetch_facts(species).await {
                Ok(facts) => println!("\nfacts: {}", facts.facts),
                Err(e) => log::warn!("facts lookup failed: {e:#}"),
            },
            None => log::info!("species not identified; skipping facts lookup"),
        }
    }

    let history = session.history();
    println!("\nhistory ({} entries):", history.len());
    for entry in &history {
        println!(
            "  #{} {} ({} bytes)",
            entry.seq,
            entry.result.fish_type,
            entry.image.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_path_and_flags() {
        let args = parse(&["catch.jpg", "--endpoint", "http://fish:8000", "--facts"]).unwrap();
        assert_eq!(
            args,
            Args {
                image: "catch.jpg".into(),
                endpoint: Some("http://fish:8000".into()),
                config: None,
                save_config: false,
                facts: true,
            }
        );
    }

    #[test]
    fn rejects_missing_path_and_unknown_flags() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--endpoint"]).is_err());
        assert!(parse(&["a.jpg", "--verbose"]).is_err());
        assert!(parse(&["a.jpg", "b.jpg"]).is_err());
        assert!(parse(&["a.jpg", "--save-config"]).is_err());
    }

    #[test]
    fn save_config_goes_with_a_config_path() {
        let args = parse(&["a.jpg", "--config", "fishid.json", "--save-config"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("fishid.json")));
        assert!(args.save_config);
    }

    #[test]
    fn facts_are_skipped_for_unidentified_fish() {
        let unknown = ClassificationResult::unknown();
        assert_eq!(facts_species(&unknown), None);

        let tuna = ClassificationResult::from_parts(Some("Tuna".into()), None, None, None);
        assert_eq!(facts_species(&tuna), Some("Tuna"));
    }
}
