// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical token payload types.
//!
//! The upstream API and the popup bridge are inconsistent about field
//! spelling (`access_token` vs `accessToken`). Normalization happens here,
//! at the boundary; the rest of the crate only ever sees [`TokenGrant`].

/// Message type tagged onto cross-window token payloads.
pub const TOKEN_MESSAGE_TYPE: &str = "oauth-token";

/// A freshly issued access token with its lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Seconds until expiry. Zero when the payload carried no expiry.
    pub expires_in: u64,
}

impl TokenGrant {
    /// Normalize a raw token payload, tolerating both field spellings.
    ///
    /// Returns `None` when no non-empty access token is present.
    pub fn from_payload(value: &serde_json::Value) -> Option<Self> {
        let token = value
            .get("access_token")
            .or_else(|| value.get("accessToken"))
            .and_then(|v| v.as_str())?;
        if token.is_empty() {
            return None;
        }
        let expires_in = value
            .get("expires_in")
            .or_else(|| value.get("expiresIn"))
            .and_then(json_u64)
            .unwrap_or(0);
        Some(Self { access_token: token.to_owned(), expires_in })
    }
}

/// Extract a grant from a cross-window message envelope.
///
/// The `type` tag is checked before the payload is trusted; anything that
/// is not a token message yields `None`.
pub fn grant_from_message(value: &serde_json::Value) -> Option<TokenGrant> {
    let kind = value.get("type")?.as_str()?;
    if kind != TOKEN_MESSAGE_TYPE {
        return None;
    }
    TokenGrant::from_payload(value.get("payload")?)
}

fn json_u64(value: &serde_json::Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

#[cfg(test)]
#[path = "grant_tests.rs"]
mod tests;
