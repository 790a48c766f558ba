//! Sign and verify entry points
//!
//! Each operation resolves the algorithm in the table of the key's family,
//! computes or checks the signature, then assembles the token or parses the
//! claims. The first failure ends the operation.

use crate::claims::Claims;
use crate::codec;
use crate::error::JwtResult;
use crate::keys::{EcdsaSigningKey, EcdsaVerifyingKey, HmacSecret, RsaSigningKey, RsaVerifyingKey};
use crate::registry::{AlgorithmRegistry, ResolvedAlgorithm};
use crate::traits::{TokenSigner, TokenVerifier};
use std::sync::Arc;
use tracing::debug;

/// Token engine bound to one algorithm registry.
///
/// Cheap to clone; the registry is shared.
#[derive(Debug, Clone)]
pub struct JwtEngine {
    registry: Arc<AlgorithmRegistry>,
}

impl Default for JwtEngine {
    fn default() -> Self {
        Self {
            registry: AlgorithmRegistry::standard(),
        }
    }
}

impl JwtEngine {
    /// Engine using `registry` for every lookup.
    #[must_use]
    pub fn new(registry: impl Into<Arc<AlgorithmRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    /// The registry this engine resolves against
    #[must_use]
    pub fn registry(&self) -> &AlgorithmRegistry {
        &self.registry
    }

    /// Sign `claims` with `algorithm`, which must be registered in the
    /// family of `key`.
    ///
    /// # Errors
    /// - lookup failures, see [`AlgorithmRegistry::resolve`]
    /// - [`crate::JwtError::Encoding`] when the claims cannot be serialized
    /// - family specific signing failures such as [`crate::JwtError::KeyTooSmall`]
    pub fn sign<K: TokenSigner + ?Sized>(
        &self,
        claims: &Claims,
        algorithm: &str,
        key: &K,
    ) -> JwtResult<String> {
        let resolved = self.registry.resolve(algorithm, key.family())?;
        let payload = claims.to_json()?;
        let input = codec::signing_input(&resolved.header, &payload);
        let signature = key.sign_input(&resolved, input.as_bytes())?;
        let token = codec::assemble(&input, &signature);

        debug!(algorithm = %resolved.name, family = %resolved.family, "token signed");
        Ok(token)
    }

    /// Check the signature of `token` with `key` and parse its claims.
    ///
    /// The header's `alg` is only looked up in the family of `key`, so a
    /// token can never select a different family than the caller's key.
    /// Time and field claims are not evaluated here.
    ///
    /// # Errors
    /// - [`crate::JwtError::MalformedToken`] on structural damage
    /// - lookup failures, see [`AlgorithmRegistry::resolve`]
    /// - [`crate::JwtError::InvalidSignature`] when the signature does not match
    pub fn verify<K: TokenVerifier + ?Sized>(&self, token: &str, key: &K) -> JwtResult<Claims> {
        match self.check(token, key) {
            Ok((resolved, claims)) => {
                debug!(algorithm = %resolved.name, family = %resolved.family, "token verified");
                Ok(claims)
            }
            Err(err) => {
                debug!(
                    family = %key.family(),
                    malformed = err.is_malformed(),
                    authentication = err.is_authentication_failure(),
                    "token rejected"
                );
                Err(err)
            }
        }
    }

    fn check<K: TokenVerifier + ?Sized>(
        &self,
        token: &str,
        key: &K,
    ) -> JwtResult<(ResolvedAlgorithm, Claims)> {
        let segments = codec::split(token)?;
        let header = codec::decode_header(segments.header)?;
        let resolved = self.registry.resolve(&header.alg, key.family())?;

        let signature = codec::decode_segment(segments.signature)?;
        key.verify_input(&resolved, segments.signing_input.as_bytes(), &signature)?;

        let payload = codec::decode_segment(segments.payload)?;
        let claims = Claims::from_json(&payload)?;
        Ok((resolved, claims))
    }
}

impl Claims {
    /// Sign with the standard registry; shorthand for [`JwtEngine::sign`].
    ///
    /// # Errors
    /// See [`JwtEngine::sign`].
    pub fn sign<K: TokenSigner + ?Sized>(&self, algorithm: &str, key: &K) -> JwtResult<String> {
        JwtEngine::default().sign(self, algorithm, key)
    }
}

/// Sign with an HMAC identifier from the standard registry.
///
/// # Errors
/// See [`JwtEngine::sign`].
pub fn hmac_sign(claims: &Claims, algorithm: &str, secret: &HmacSecret) -> JwtResult<String> {
    JwtEngine::default().sign(claims, algorithm, secret)
}

/// Verify an HMAC token against the standard registry.
///
/// # Errors
/// See [`JwtEngine::verify`].
pub fn hmac_check(token: &str, secret: &HmacSecret) -> JwtResult<Claims> {
    JwtEngine::default().verify(token, secret)
}

/// Sign with an RSA identifier from the standard registry.
///
/// # Errors
/// See [`JwtEngine::sign`].
pub fn rsa_sign(claims: &Claims, algorithm: &str, key: &RsaSigningKey) -> JwtResult<String> {
    JwtEngine::default().sign(claims, algorithm, key)
}

/// Verify an RSA token against the standard registry.
///
/// # Errors
/// See [`JwtEngine::verify`].
pub fn rsa_check(token: &str, key: &RsaVerifyingKey) -> JwtResult<Claims> {
    JwtEngine::default().verify(token, key)
}

/// Sign with an ECDSA identifier from the standard registry.
///
/// # Errors
/// See [`JwtEngine::sign`].
pub fn ecdsa_sign(claims: &Claims, algorithm: &str, key: &EcdsaSigningKey) -> JwtResult<String> {
    JwtEngine::default().sign(claims, algorithm, key)
}

/// Verify an ECDSA token against the standard registry.
///
/// # Errors
/// See [`JwtEngine::verify`].
pub fn ecdsa_check(token: &str, key: &EcdsaVerifyingKey) -> JwtResult<Claims> {
    JwtEngine::default().verify(token, key)
}
