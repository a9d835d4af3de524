use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use blobstream::{ChunkSize, ObjectLocator, StreamOptions};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::cli::App;

/// Contents of the optional TOML config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub endpoint:  Option<String>,
    pub container: Option<String>,
    pub stream:    StreamOptions,
}

impl FileConfig {
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> { Ok(toml::from_str(text)?) }
}

/// Everything a download needs, after flags are layered over the file.
#[derive(Debug)]
pub struct Settings {
    pub endpoint:   String,
    pub locator:    ObjectLocator,
    pub options:    StreamOptions,
    pub token:      String,
    pub expires_at: Option<DateTime<Utc>>,
    pub output:     Option<PathBuf>,
}

impl Settings {
    pub fn resolve(app: &App, file: FileConfig) -> Result<Self> {
        let Some(endpoint) = app.endpoint.clone().or(file.endpoint) else {
            bail!("no endpoint given; pass --endpoint or set it in the config file");
        };
        let container = app.container.clone().or(file.container).unwrap_or_default();

        let mut options = file.stream;
        if app.demand_sized {
            options = options.chunk_size(ChunkSize::Demand);
        } else if let Some(size) = app.chunk_size {
            options = options.chunk_size(ChunkSize::Fixed(size));
        }
        if let Some(concurrency) = app.concurrency {
            options = options.concurrency(concurrency);
        }
        if let Some(secs) = app.timeout {
            options = options.fetch_timeout(Some(Duration::from_secs(secs)));
        }
        options.validate()?;

        let expires_at = match app.token_ttl {
            Some(secs) => {
                let ttl = TimeDelta::try_seconds(secs).context("token ttl out of range")?;
                Some(Utc::now() + ttl)
            }
            None => None,
        };

        Ok(Self {
            endpoint,
            locator: ObjectLocator::new(container, app.key.clone()),
            options,
            token: app.token.clone(),
            expires_at,
            output: app.output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    const FILE: &str = r#"
endpoint = "https://file.example.com"
container = "archive"

[stream]
chunk_size = { fixed = 262144 }
concurrency = 3
fetch_timeout = 20000
"#;

    fn app(args: &[&str]) -> App {
        let mut argv = vec!["blobstream", "obj.bin", "--token", "t"];
        argv.extend_from_slice(args);
        App::try_parse_from(argv).unwrap()
    }

    #[test]
    fn file_values_apply_without_flags() {
        let settings = Settings::resolve(&app(&[]), FileConfig::parse(FILE).unwrap()).unwrap();

        assert_eq!(settings.endpoint, "https://file.example.com");
        assert_eq!(settings.locator, ObjectLocator::new("archive", "obj.bin"));
        assert_eq!(settings.options.chunk_size, ChunkSize::Fixed(262_144));
        assert_eq!(settings.options.concurrency, 3);
        assert_eq!(settings.options.fetch_timeout, Some(Duration::from_secs(20)));
        assert!(settings.expires_at.is_none());
    }

    #[test]
    fn flags_override_file() {
        let args = ["-e", "https://flag.example.com", "-c", "live", "-j", "8", "--demand-sized"];
        let settings = Settings::resolve(&app(&args), FileConfig::parse(FILE).unwrap()).unwrap();

        assert_eq!(settings.endpoint, "https://flag.example.com");
        assert_eq!(settings.locator.container, "live");
        assert_eq!(settings.options.chunk_size, ChunkSize::Demand);
        assert_eq!(settings.options.concurrency, 8);
    }

    #[test]
    fn missing_endpoint_is_an_error() {
        let err = Settings::resolve(&app(&[]), FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("no endpoint"));
    }

    #[test]
    fn invalid_stream_options_are_rejected() {
        let args = ["-e", "https://x", "-j", "0"];
        assert!(Settings::resolve(&app(&args), FileConfig::default()).is_err());
    }

    #[test]
    fn token_ttl_sets_expiry() {
        let args = ["-e", "https://x", "--token-ttl", "600"];
        let settings = Settings::resolve(&app(&args), FileConfig::default()).unwrap();
        let expires_at = settings.expires_at.unwrap();
        assert!(expires_at > Utc::now() + TimeDelta::seconds(590));
    }
}
