//! `Authorization: Bearer <token>` parsing for node check-ins.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::secret::{SecretHash, hash_secret};

/// URL-safe base64 that accepts tokens with or without padding.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reasons a check-in fails authentication.
///
/// Only ever logged; every variant produces the same response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingHeader,

    #[error("invalid authorization scheme")]
    InvalidScheme,

    #[error("empty bearer token")]
    EmptyToken,

    #[error("invalid base64 in bearer token")]
    InvalidEncoding,

    #[error("no node matches the presented secret")]
    UnknownNode,
}

/// Extract the bearer token from an `Authorization` header value, decode it
/// and return the digest of the secret it carries.
pub fn parse_bearer_secret(header: Option<&str>) -> Result<SecretHash, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidScheme)?;
    if token.is_empty() {
        return Err(AuthError::EmptyToken);
    }
    let secret = zeroize::Zeroizing::new(
        TOKEN_ENGINE
            .decode(token)
            .map_err(|_| AuthError::InvalidEncoding)?,
    );

    Ok(hash_secret(&secret))
}
