//! Key capabilities consumed by the engine.

use crate::error::JwtResult;
use crate::registry::{AlgorithmFamily, ResolvedAlgorithm};
use std::sync::Arc;

/// Key material bound to exactly one signature family.
pub trait KeyMaterial {
    /// Family whose identifier table this key is checked against.
    fn family(&self) -> AlgorithmFamily;
}

/// Key that can produce signatures.
///
/// Implementations must be thread-safe (Send + Sync).
pub trait TokenSigner: KeyMaterial + Send + Sync {
    /// Sign the signing input with the resolved algorithm; returns raw
    /// signature bytes in the family's wire encoding.
    ///
    /// # Errors
    /// Family specific, see [`crate::JwtError`].
    fn sign_input(&self, algorithm: &ResolvedAlgorithm, input: &[u8]) -> JwtResult<Vec<u8>>;
}

/// Key that can check signatures.
pub trait TokenVerifier: KeyMaterial + Send + Sync {
    /// Check `signature` over the signing input.
    ///
    /// # Errors
    /// [`crate::JwtError::InvalidSignature`] on mismatch,
    /// [`crate::JwtError::MalformedToken`] when the signature cannot be
    /// decoded for this key.
    fn verify_input(
        &self,
        algorithm: &ResolvedAlgorithm,
        input: &[u8],
        signature: &[u8],
    ) -> JwtResult<()>;
}

impl<T: KeyMaterial + ?Sized> KeyMaterial for Arc<T> {
    fn family(&self) -> AlgorithmFamily {
        (**self).family()
    }
}

impl<T: TokenSigner + ?Sized> TokenSigner for Arc<T> {
    fn sign_input(&self, algorithm: &ResolvedAlgorithm, input: &[u8]) -> JwtResult<Vec<u8>> {
        (**self).sign_input(algorithm, input)
    }
}

impl<T: TokenVerifier + ?Sized> TokenVerifier for Arc<T> {
    fn verify_input(
        &self,
        algorithm: &ResolvedAlgorithm,
        input: &[u8],
        signature: &[u8],
    ) -> JwtResult<()> {
        (**self).verify_input(algorithm, input, signature)
    }
}
