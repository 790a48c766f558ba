//! Key types, one set per signature family.
//!
//! Parsing keys from PEM or DER is left to the `rsa`, `p256` and `p384`
//! crates; the types here wrap the parsed keys and bind them to a family.

use crate::crypto::{ecdsa, hmac, rsa as rsa_sig};
use crate::error::{JwtError, JwtResult};
use crate::registry::{AlgorithmFamily, ResolvedAlgorithm};
use crate::traits::{KeyMaterial, TokenSigner, TokenVerifier};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use zeroize::Zeroizing;

/// Shared secret for the HMAC family. Wiped from memory on drop.
#[derive(Clone)]
pub struct HmacSecret(Zeroizing<Vec<u8>>);

impl HmacSecret {
    /// Wrap secret bytes
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// The secret bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for HmacSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSecret")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl From<&[u8]> for HmacSecret {
    fn from(secret: &[u8]) -> Self {
        Self::new(secret)
    }
}

impl From<Vec<u8>> for HmacSecret {
    fn from(secret: Vec<u8>) -> Self {
        Self::new(secret)
    }
}

impl From<&str> for HmacSecret {
    fn from(secret: &str) -> Self {
        Self::new(secret.as_bytes())
    }
}

impl KeyMaterial for HmacSecret {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Hmac
    }
}

impl TokenSigner for HmacSecret {
    fn sign_input(&self, algorithm: &ResolvedAlgorithm, input: &[u8]) -> JwtResult<Vec<u8>> {
        hmac::sign(algorithm, self.as_bytes(), input)
    }
}

impl TokenVerifier for HmacSecret {
    fn verify_input(
        &self,
        algorithm: &ResolvedAlgorithm,
        input: &[u8],
        signature: &[u8],
    ) -> JwtResult<()> {
        hmac::verify(algorithm, self.as_bytes(), input, signature)
    }
}

/// RSA private key for RSASSA-PKCS1-v1_5 signing
#[derive(Debug, Clone)]
pub struct RsaSigningKey(RsaPrivateKey);

impl RsaSigningKey {
    /// Wrap a parsed private key
    #[must_use]
    pub fn new(key: RsaPrivateKey) -> Self {
        Self(key)
    }

    /// Matching public key
    #[must_use]
    pub fn verifying_key(&self) -> RsaVerifyingKey {
        RsaVerifyingKey(self.0.to_public_key())
    }

    /// Modulus size in bits
    #[must_use]
    pub fn bits(&self) -> usize {
        self.0.size() * 8
    }
}

impl From<RsaPrivateKey> for RsaSigningKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self(key)
    }
}

impl KeyMaterial for RsaSigningKey {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Rsa
    }
}

impl TokenSigner for RsaSigningKey {
    fn sign_input(&self, algorithm: &ResolvedAlgorithm, input: &[u8]) -> JwtResult<Vec<u8>> {
        rsa_sig::sign(algorithm, &self.0, input)
    }
}

/// RSA public key for RSASSA-PKCS1-v1_5 verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaVerifyingKey(RsaPublicKey);

impl RsaVerifyingKey {
    /// Wrap a parsed public key
    #[must_use]
    pub fn new(key: RsaPublicKey) -> Self {
        Self(key)
    }
}

impl From<RsaPublicKey> for RsaVerifyingKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}

impl KeyMaterial for RsaVerifyingKey {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Rsa
    }
}

impl TokenVerifier for RsaVerifyingKey {
    fn verify_input(
        &self,
        algorithm: &ResolvedAlgorithm,
        input: &[u8],
        signature: &[u8],
    ) -> JwtResult<()> {
        rsa_sig::verify(algorithm, &self.0, input, signature)
    }
}

/// Curves supported for the ECDSA family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcdsaCurve {
    /// NIST P-256
    P256,
    /// NIST P-384
    P384,
    /// NIST P-521
    P521,
}

impl EcdsaCurve {
    /// Byte length of one signature component (`r` or `s`).
    #[must_use]
    pub fn coordinate_len(self) -> usize {
        match self {
            EcdsaCurve::P256 => 32,
            EcdsaCurve::P384 => 48,
            EcdsaCurve::P521 => 66,
        }
    }
}

impl fmt::Display for EcdsaCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcdsaCurve::P256 => f.write_str("P-256"),
            EcdsaCurve::P384 => f.write_str("P-384"),
            EcdsaCurve::P521 => f.write_str("P-521"),
        }
    }
}

/// ECDSA private key
#[derive(Clone)]
pub enum EcdsaSigningKey {
    /// P-256 key
    P256(p256::ecdsa::SigningKey),
    /// P-384 key
    P384(p384::ecdsa::SigningKey),
    /// P-521 key
    P521(p521::ecdsa::SigningKey),
}

impl EcdsaSigningKey {
    /// P-256 key from a big-endian private scalar.
    ///
    /// # Errors
    /// [`JwtError::InvalidKeyParameters`] when the scalar is zero, not below
    /// the curve order, or of the wrong length.
    pub fn p256_from_slice(scalar: &[u8]) -> JwtResult<Self> {
        p256::ecdsa::SigningKey::from_slice(scalar)
            .map(Self::P256)
            .map_err(|e| JwtError::invalid_key_parameters(format!("P-256 private scalar: {e}")))
    }

    /// P-384 key from a big-endian private scalar.
    ///
    /// # Errors
    /// [`JwtError::InvalidKeyParameters`] when the scalar is zero, not below
    /// the curve order, or of the wrong length.
    pub fn p384_from_slice(scalar: &[u8]) -> JwtResult<Self> {
        p384::ecdsa::SigningKey::from_slice(scalar)
            .map(Self::P384)
            .map_err(|e| JwtError::invalid_key_parameters(format!("P-384 private scalar: {e}")))
    }

    /// P-521 key from a big-endian private scalar.
    ///
    /// # Errors
    /// [`JwtError::InvalidKeyParameters`] when the scalar is zero, not below
    /// the curve order, or of the wrong length.
    pub fn p521_from_slice(scalar: &[u8]) -> JwtResult<Self> {
        p521::ecdsa::SigningKey::from_slice(scalar)
            .map(Self::P521)
            .map_err(|e| JwtError::invalid_key_parameters(format!("P-521 private scalar: {e}")))
    }

    /// Curve of this key
    #[must_use]
    pub fn curve(&self) -> EcdsaCurve {
        match self {
            EcdsaSigningKey::P256(_) => EcdsaCurve::P256,
            EcdsaSigningKey::P384(_) => EcdsaCurve::P384,
            EcdsaSigningKey::P521(_) => EcdsaCurve::P521,
        }
    }

    /// Matching public key
    #[must_use]
    pub fn verifying_key(&self) -> EcdsaVerifyingKey {
        match self {
            EcdsaSigningKey::P256(k) => EcdsaVerifyingKey::P256(k.verifying_key().clone()),
            EcdsaSigningKey::P384(k) => EcdsaVerifyingKey::P384(k.verifying_key().clone()),
            EcdsaSigningKey::P521(k) => EcdsaVerifyingKey::P521(p521::ecdsa::VerifyingKey::from(k)),
        }
    }
}

impl fmt::Debug for EcdsaSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaSigningKey")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

impl From<p256::ecdsa::SigningKey> for EcdsaSigningKey {
    fn from(key: p256::ecdsa::SigningKey) -> Self {
        Self::P256(key)
    }
}

impl From<p384::ecdsa::SigningKey> for EcdsaSigningKey {
    fn from(key: p384::ecdsa::SigningKey) -> Self {
        Self::P384(key)
    }
}

impl From<p521::ecdsa::SigningKey> for EcdsaSigningKey {
    fn from(key: p521::ecdsa::SigningKey) -> Self {
        Self::P521(key)
    }
}

impl KeyMaterial for EcdsaSigningKey {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Ecdsa
    }
}

impl TokenSigner for EcdsaSigningKey {
    fn sign_input(&self, algorithm: &ResolvedAlgorithm, input: &[u8]) -> JwtResult<Vec<u8>> {
        ecdsa::sign(algorithm, self, input)
    }
}

/// ECDSA public key
#[derive(Clone)]
pub enum EcdsaVerifyingKey {
    /// P-256 key
    P256(p256::ecdsa::VerifyingKey),
    /// P-384 key
    P384(p384::ecdsa::VerifyingKey),
    /// P-521 key
    P521(p521::ecdsa::VerifyingKey),
}

impl EcdsaVerifyingKey {
    /// Public key from a SEC1 encoded point, compressed or uncompressed.
    ///
    /// # Errors
    /// [`JwtError::InvalidKeyParameters`] when the bytes are not a point on
    /// `curve`.
    pub fn from_sec1_bytes(curve: EcdsaCurve, point: &[u8]) -> JwtResult<Self> {
        let invalid = |e: &dyn fmt::Display| {
            JwtError::invalid_key_parameters(format!("SEC1 {curve} public key: {e}"))
        };
        match curve {
            EcdsaCurve::P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map(Self::P256)
                .map_err(|e| invalid(&e)),
            EcdsaCurve::P384 => p384::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map(Self::P384)
                .map_err(|e| invalid(&e)),
            EcdsaCurve::P521 => p521::ecdsa::VerifyingKey::from_sec1_bytes(point)
                .map(Self::P521)
                .map_err(|e| invalid(&e)),
        }
    }

    /// Curve of this key
    #[must_use]
    pub fn curve(&self) -> EcdsaCurve {
        match self {
            EcdsaVerifyingKey::P256(_) => EcdsaCurve::P256,
            EcdsaVerifyingKey::P384(_) => EcdsaCurve::P384,
            EcdsaVerifyingKey::P521(_) => EcdsaCurve::P521,
        }
    }
}

impl fmt::Debug for EcdsaVerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaVerifyingKey")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

impl From<p256::ecdsa::VerifyingKey> for EcdsaVerifyingKey {
    fn from(key: p256::ecdsa::VerifyingKey) -> Self {
        Self::P256(key)
    }
}

impl From<p384::ecdsa::VerifyingKey> for EcdsaVerifyingKey {
    fn from(key: p384::ecdsa::VerifyingKey) -> Self {
        Self::P384(key)
    }
}

impl From<p521::ecdsa::VerifyingKey> for EcdsaVerifyingKey {
    fn from(key: p521::ecdsa::VerifyingKey) -> Self {
        Self::P521(key)
    }
}

impl KeyMaterial for EcdsaVerifyingKey {
    fn family(&self) -> AlgorithmFamily {
        AlgorithmFamily::Ecdsa
    }
}

impl TokenVerifier for EcdsaVerifyingKey {
    fn verify_input(
        &self,
        algorithm: &ResolvedAlgorithm,
        input: &[u8],
        signature: &[u8],
    ) -> JwtResult<()> {
        ecdsa::verify(algorithm, self, input, signature)
    }
}
