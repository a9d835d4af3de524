use std::convert::Infallible;
use std::time::Instant;

use anyhow::{Context, Result};
use blobstream::{Credentials, IssuedCredentials, RangeStream, ReqwestBlobStore};
use clap::Parser;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::App;
use crate::config::{FileConfig, Settings};

mod cli;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| app.log_directive().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file = match &app.config {
        Some(path) => FileConfig::load(path).await?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&app, file)?;
    run(settings).await
}

async fn run(settings: Settings) -> Result<()> {
    let store = ReqwestBlobStore::new(settings.endpoint.as_str())
        .with_context(|| format!("invalid endpoint {}", settings.endpoint))?;

    let token = settings.token.clone();
    let expires_at = settings.expires_at;
    let provider = move || {
        let mut credentials = Credentials::new(token.clone());
        if let Some(at) = expires_at {
            credentials = credentials.expires_at(at);
        }
        std::future::ready(Ok::<_, Infallible>(IssuedCredentials::new(credentials)))
    };

    let locator = settings.locator.clone();
    let stream = RangeStream::open(store, provider, locator.clone(), settings.options.clone())
        .with_context(|| format!("cannot stream {locator}"))?;
    let mut reader = stream.into_reader();

    let started = Instant::now();
    let copied = match &settings.output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create {}", path.display()))?;
            copy(&mut reader, file).await
        }
        None => copy(&mut reader, tokio::io::stdout()).await,
    }
    .with_context(|| format!("download of {locator} failed"))?;

    info!(
        key = %locator,
        bytes = copied,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "download complete"
    );
    Ok(())
}

async fn copy<R, W>(reader: &mut R, mut writer: W) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let copied = tokio::io::copy(reader, &mut writer).await?;
    writer.flush().await?;
    Ok(copied)
}
