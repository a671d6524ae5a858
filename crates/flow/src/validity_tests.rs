// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;
use crate::cache::CachedToken;

fn token_at(expires_at_ms: u64) -> CachedToken {
    CachedToken { value: "tok".to_owned(), expires_at_ms }
}

#[test]
fn valid_strictly_before_expiry() {
    let token = token_at(1_000);
    assert!(is_valid(&token, 999));
    assert!(!is_valid(&token, 1_000));
    assert!(!is_valid(&token, 1_001));
}

#[tokio::test]
async fn upstream_ok_body_is_valid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/token/check"))
        .and(query_param("access_token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok",
            "expires_in": 3000,
        })))
        .mount(&server)
        .await;

    crate::ensure_crypto();
    let http = reqwest::Client::new();
    assert!(check_upstream(&http, &server.uri(), "tok").await);
}

#[tokio::test]
async fn upstream_error_flag_fails_closed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/token/check"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "invalid_token" })),
        )
        .mount(&server)
        .await;

    crate::ensure_crypto();
    let http = reqwest::Client::new();
    assert!(!check_upstream(&http, &server.uri(), "tok").await);
}

#[tokio::test]
async fn upstream_failure_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/token/check"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    crate::ensure_crypto();
    let http = reqwest::Client::new();
    assert!(check_upstream(&http, &server.uri(), "tok").await);

    // Unreachable host: also open.
    assert!(check_upstream(&http, "http://127.0.0.1:1", "tok").await);
}
