// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection-token authentication.
//!
//! Tokens are `base64url(claims-json).hex(hmac-sha256(secret, payload))`,
//! minted by the identity collaborator (or the `amora token` subcommand in
//! development) and verified here before a socket is upgraded. Verification
//! is fail-closed: any structural or signature problem rejects the connect.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use amora_core::AmoraError;

type HmacSha256 = Hmac<Sha256>;

/// Authentication configuration for the gateway.
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret shared with the token issuer.
    pub token_secret: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"[redacted]")
            .finish()
    }
}

/// The verified identity carried inside a connection token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Raw username as issued; normalized by the caller after verification.
    pub username: String,
    /// Optional display name, defaulting to the username.
    #[serde(default)]
    pub known_as: Option<String>,
}

fn mac_for(secret: &str) -> HmacSha256 {
    // HMAC accepts keys of any length; new_from_slice cannot fail.
    HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length")
}

fn rejected() -> AmoraError {
    AmoraError::Channel {
        message: "invalid connection token".to_string(),
        source: None,
    }
}

/// Mint a signed connection token for the given claims.
pub fn mint_token(secret: &str, claims: &TokenClaims) -> Result<String, AmoraError> {
    let payload = serde_json::to_vec(claims)
        .map_err(|e| AmoraError::Internal(format!("token serialization: {e}")))?;
    let encoded = URL_SAFE_NO_PAD.encode(payload);
    let mut mac = mac_for(secret);
    mac.update(encoded.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    Ok(format!("{encoded}.{signature}"))
}

/// Verify a token and return its claims.
pub fn verify_token(secret: &str, token: &str) -> Result<TokenClaims, AmoraError> {
    let (payload, signature) = token.rsplit_once('.').ok_or_else(rejected)?;
    let signature_bytes = hex::decode(signature).map_err(|_| rejected())?;

    let mut mac = mac_for(secret);
    mac.update(payload.as_bytes());
    // Constant-time comparison via the hmac crate.
    mac.verify_slice(&signature_bytes).map_err(|_| rejected())?;

    let claims_bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|_| rejected())?;
    let claims: TokenClaims = serde_json::from_slice(&claims_bytes).map_err(|_| rejected())?;
    if claims.username.trim().is_empty() {
        return Err(rejected());
    }
    Ok(claims)
}
