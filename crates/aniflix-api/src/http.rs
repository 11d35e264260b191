//! Shared request plumbing for JSON providers.

use std::future::Future;

use aniflix_core::config::HttpConfig;
use reqwest::{header, Client, RequestBuilder, Response};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;

/// Build the HTTP client shared by every provider.
pub fn build_client(config: &HttpConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(ProviderError::from)
}

/// Drive `fut` to completion unless `cancel` fires first.
pub(crate) async fn race<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}

/// What must hold before a body is parsed as JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContentCheck {
    /// Only the body is inspected.
    Body,
    /// The `Content-Type` header must also declare JSON.
    Header,
}

/// GET a JSON document.
pub(crate) async fn get_json(
    request: RequestBuilder,
    check: ContentCheck,
    cancel: &CancellationToken,
) -> Result<Value, ProviderError> {
    let fut = async move {
        let resp = request
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        if check == ContentCheck::Header && !declares_json(&resp) {
            return Err(ProviderError::NotJson);
        }
        let body = resp.text().await?;
        parse_body(&body)
    };
    race(cancel, fut).await.unwrap_or(Err(ProviderError::Cancelled))
}

async fn ensure_success(resp: Response) -> Result<Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}

fn declares_json(resp: &Response) -> bool {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json") || ct.contains("text/json"))
}

/// Parse a body, rejecting HTML error pages up front.
pub(crate) fn parse_body(body: &str) -> Result<Value, ProviderError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        return Err(ProviderError::NotJson);
    }
    serde_json::from_str(trimmed).map_err(|e| ProviderError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_rejects_html() {
        assert!(matches!(parse_body("<!DOCTYPE html><html>"), Err(ProviderError::NotJson)));
        assert!(matches!(parse_body("  \n<html>"), Err(ProviderError::NotJson)));
        assert!(matches!(parse_body("<"), Err(ProviderError::NotJson)));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(" {\"a\": 1}").unwrap()["a"], 1);
        assert!(matches!(parse_body("{oops"), Err(ProviderError::Parse(_))));
        assert!(matches!(parse_body(""), Err(ProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_race_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let out = race(&cancel, std::future::pending::<()>()).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_race_completes() {
        let cancel = CancellationToken::new();
        assert_eq!(race(&cancel, async { 7 }).await, Some(7));
    }
}
