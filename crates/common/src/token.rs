//! Capability tokens
//!
//! A token is a compact, URL-safe string of the form
//! `base64url(claims json) . base64url(hmac-sha256)` whose claims carry
//! exactly one field: the absolute path of the shared file. The MAC is
//! keyed by that path's current [`Secret`].
//!
//! Verification is two-phase on purpose. The payload is first parsed
//! *without* checking the signature ([`peek_path`]) so the server can look
//! up which secret the token claims to be signed with; the untrusted path
//! is used only as a vault key, never as an authorization decision. The
//! full [`verify`] call then re-checks the signature against the vault's
//! secret before any bytes move.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::crypto::Secret;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    filepath: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("token signature mismatch")]
    InvalidSignature,
    #[error("invalid token encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("invalid token payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Issue a token asserting `path`, signed with `secret`.
pub fn issue(path: &Path, secret: &Secret) -> Result<String, TokenError> {
    let claims = serde_json::to_vec(&Claims {
        filepath: path.to_path_buf(),
    })?;
    let payload = URL_SAFE_NO_PAD.encode(claims);

    let mut mac = HmacSha256::new_from_slice(&**secret).expect("hmac accepts any key length");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", payload, signature))
}

/// Recover the claimed file path WITHOUT verifying the signature.
///
/// The result is untrusted. Callers may use it only to select which secret
/// to verify the token against.
pub fn peek_path(token: &str) -> Result<PathBuf, TokenError> {
    let (payload, _) = split(token)?;
    let claims: Claims = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload)?)?;
    Ok(claims.filepath)
}

/// Verify `token` against `secret` and return the now-trusted file path.
pub fn verify(token: &str, secret: &Secret) -> Result<PathBuf, TokenError> {
    let (payload, signature) = split(token)?;
    let signature = URL_SAFE_NO_PAD.decode(signature)?;

    let mut mac = HmacSha256::new_from_slice(&**secret).expect("hmac accepts any key length");
    mac.update(payload.as_bytes());
    // verify_slice is constant-time
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let claims: Claims = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload)?)?;
    Ok(claims.filepath)
}

fn split(token: &str) -> Result<(&str, &str), TokenError> {
    token.split_once('.').ok_or(TokenError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_verify_round_trip() {
        let secret = Secret::generate().unwrap();
        let path = Path::new("/tmp/a.txt");

        let token = issue(path, &secret).unwrap();
        assert_eq!(verify(&token, &secret).unwrap(), path);
    }

    #[test]
    fn test_peek_path_matches_claims() {
        let secret = Secret::generate().unwrap();
        let path = Path::new("/srv/data/report.pdf");

        let token = issue(path, &secret).unwrap();
        assert_eq!(peek_path(&token).unwrap(), path);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let path = Path::new("/tmp/a.txt");
        let token = issue(path, &Secret::generate().unwrap()).unwrap();

        let other = Secret::generate().unwrap();
        assert!(matches!(
            verify(&token, &other),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let secret = Secret::generate().unwrap();
        let token = issue(Path::new("/tmp/a.txt"), &secret).unwrap();

        // swap the payload for one claiming a different path, keep the MAC
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = serde_json::to_vec(&Claims {
            filepath: PathBuf::from("/etc/passwd"),
        })
        .unwrap();
        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode(forged_claims), signature);

        assert!(matches!(
            verify(&forged, &secret),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let secret = Secret::generate().unwrap();
        assert!(verify("no-dot-here", &secret).is_err());
        assert!(verify("", &secret).is_err());
        assert!(verify("a.b.c", &secret).is_err());
        assert!(peek_path("%%%.%%%").is_err());
    }
}
