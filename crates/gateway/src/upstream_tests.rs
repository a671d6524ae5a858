// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

#[tokio::test]
async fn code_exchange_normalizes_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("code=abc"))
        .and(body_string_contains("client_id=cid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "AT",
            "refresh_token": "RT",
            "expires_in": 3600,
            "user_id": "u-1",
        })))
        .mount(&server)
        .await;

    crate::ensure_crypto();
    let client = AlmClient::new(server.uri());
    let exchange = client.exchange_code("cid", "secret", "abc").await.map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(exchange.access_token.as_deref(), Some("AT"));
    assert_eq!(exchange.refresh_token.as_deref(), Some("RT"));
    assert_eq!(exchange.expires_in, Some(3600));
    assert_eq!(exchange.user_id.as_deref(), Some("u-1"));
    Ok(())
}

#[tokio::test]
async fn refresh_exchange_hits_refresh_endpoint() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token/refresh"))
        .and(body_string_contains("refresh_token=RT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "AT2",
            "expiresIn": "1800",
        })))
        .mount(&server)
        .await;

    crate::ensure_crypto();
    let client = AlmClient::new(server.uri());
    let exchange =
        client.exchange_refresh("cid", "secret", "RT").await.map_err(|e| anyhow::anyhow!("{e}"))?;
    assert_eq!(exchange.access_token.as_deref(), Some("AT2"));
    assert_eq!(exchange.expires_in, Some(1800));
    assert_eq!(exchange.refresh_token, None);
    Ok(())
}

#[tokio::test]
async fn rejection_carries_status_and_body() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    crate::ensure_crypto();
    let client = AlmClient::new(server.uri());
    match client.exchange_code("cid", "secret", "bad").await {
        Err(ExchangeError::Rejected { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body["error"], "invalid_grant");
            Ok(())
        }
        other => anyhow::bail!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_wrapped_as_raw() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    crate::ensure_crypto();
    let client = AlmClient::new(server.uri());
    match client.exchange_code("cid", "secret", "abc").await {
        Err(ExchangeError::Rejected { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body["raw"], "bad gateway");
            Ok(())
        }
        other => anyhow::bail!("expected rejection, got {other:?}"),
    }
}
