//! Local inspection of JWT access tokens.
//!
//! Only the payload's `exp` claim is read. The signature is never checked:
//! the clinic API does that on every call, this is just a hint for when to
//! refresh.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

#[derive(Deserialize)]
struct Claims {
    exp: Option<serde_json::Number>,
}

/// Read the `exp` claim (seconds since the Unix epoch) from a JWT.
///
/// Returns `None` when the token is not three dot-separated segments, the
/// payload is not base64url JSON, or the claim is missing.
#[must_use]
pub fn expires_at(token: &str) -> Option<i64> {
    let mut segments = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.exp?;

    #[allow(clippy::cast_possible_truncation)]
    exp.as_i64().or_else(|| exp.as_f64().map(|secs| secs as i64))
}

/// Whether `token` should be treated as expired at `now` (Unix seconds).
///
/// Fails closed: a missing or unreadable token counts as expired.
#[must_use]
pub fn is_expired_at(token: Option<&str>, now: i64) -> bool {
    token
        .and_then(expires_at)
        .is_none_or(|exp| exp <= now)
}

/// Whether `token` is expired right now.
#[must_use]
pub fn is_expired(token: Option<&str>) -> bool {
    is_expired_at(token, chrono::Utc::now().timestamp())
}
