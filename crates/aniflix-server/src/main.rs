mod error;
mod handlers;
mod router;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use aniflix_core::config::AppConfig;
use aniflix_core::episode::EpisodeReference;
use aniflix_core::playback::{select_playback, PlaybackState};
use aniflix_core::policy::DenylistPolicy;
use aniflix_runtime::{Resolution, ResolveError, Runtime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Resolve playable sources for anime episodes.
#[derive(Parser, Debug)]
#[command(name = "aniflix", version, about)]
struct Cli {
    /// Config file (defaults to the platform config dir, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level for aniflix crates; `RUST_LOG` wins when set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the episode endpoint over HTTP
    Serve {
        /// Listen address, overrides `[server] bind`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Resolve one episode and print the result as JSON
    Resolve {
        anime_id: String,
        episode_id: String,
    },
}

/// Output of `aniflix resolve`.
#[derive(Serialize)]
struct ResolveOutput<'a> {
    #[serde(flatten)]
    resolution: &'a Resolution,
    playback: PlaybackState,
}

fn init_tracing(level: Option<&str>) {
    let fallback = format!("aniflix={}", level.unwrap_or("info"));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, CliError> {
    let config = match path {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "aniflix failed");
            ExitCode::FAILURE
        }
    }
}

/// Exit status of an interrupted run.
const INTERRUPTED: u8 = 130;

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let runtime = Runtime::from_config(config)?;
            let listener = tokio::net::TcpListener::bind(&bind).await?;
            tracing::info!(%bind, "Listening");
            axum::serve(listener, router::router(runtime))
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Command::Resolve {
            anime_id,
            episode_id,
        } => {
            let policy = config.denylist();
            let runtime = Runtime::from_config(config)?;
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let reference = EpisodeReference::new(anime_id, episode_id);
            match resolve_json(&runtime, &reference, &policy, &cancel).await? {
                Some(json) => println!("{json}"),
                None => return Ok(ExitCode::from(INTERRUPTED)),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Resolve one episode into the pretty-printed `aniflix resolve` output.
/// `None` when the resolution was cancelled.
async fn resolve_json(
    runtime: &Runtime,
    reference: &EpisodeReference,
    policy: &DenylistPolicy,
    cancel: &CancellationToken,
) -> Result<Option<String>, CliError> {
    let resolution = match runtime.resolve(reference, cancel).await {
        Ok(resolution) => resolution,
        Err(ResolveError::Cancelled) => {
            tracing::debug!(%reference, "Resolution cancelled");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    let out = ResolveOutput {
        playback: select_playback(&resolution.response, policy),
        resolution: &resolution,
    };
    Ok(Some(serde_json::to_string_pretty(&out)?))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_runtime() -> (Runtime, DenylistPolicy) {
        let mut config = AppConfig::default();
        config.metadata.url = "http://127.0.0.1:9/graphql".into();
        config.providers.clear();
        let policy = config.denylist();
        (Runtime::from_config(config).unwrap(), policy)
    }

    #[tokio::test]
    async fn test_resolve_json_catalog_episode() {
        let (runtime, policy) = offline_runtime();
        let reference = EpisodeReference::new("sintel", "sintel-1");
        let json = resolve_json(&runtime, &reference, &policy, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"]["kind"], "local_catalog");
        assert_eq!(value["playback"]["state"], "playableDirect");
    }

    #[tokio::test]
    async fn test_resolve_json_cancelled_is_quiet() {
        let (runtime, policy) = offline_runtime();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let reference = EpisodeReference::new("sintel", "sintel-1");
        let out = resolve_json(&runtime, &reference, &policy, &cancel).await;
        assert!(matches!(out, Ok(None)));
    }

    #[tokio::test]
    async fn test_resolve_json_not_found_is_an_error() {
        let (runtime, policy) = offline_runtime();
        let reference = EpisodeReference::new("21", "22-1");
        let out = resolve_json(&runtime, &reference, &policy, &CancellationToken::new()).await;
        assert!(matches!(out, Err(CliError::Resolve(ResolveError::NotFound(_)))));
    }
}
