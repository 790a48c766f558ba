//! Token error taxonomy

use crate::keys::EcdsaCurve;
use crate::registry::{AlgorithmFamily, HashAlgorithm};
use thiserror::Error;

/// Token operation result type
pub type JwtResult<T> = Result<T, JwtError>;

/// Failures of signing, verification and claims validation.
///
/// Every variant is terminal for the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwtError {
    /// The identifier is not registered in any family table
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// The identifier is registered, but for another family than the key's
    #[error("algorithm {algorithm} belongs to the {actual} family, key is {expected}")]
    AlgorithmFamilyMismatch {
        /// Identifier that was requested or found in the header
        algorithm: String,
        /// Family of the key in use
        expected: AlgorithmFamily,
        /// Family the identifier is registered under
        actual: AlgorithmFamily,
    },

    /// The ECDSA identifier is bound to another curve than the key's
    #[error("algorithm {algorithm} requires curve {expected}, key is {actual}")]
    CurveMismatch {
        /// Identifier that was requested or found in the header
        algorithm: String,
        /// Curve the identifier is registered with
        expected: EcdsaCurve,
        /// Curve of the key in use
        actual: EcdsaCurve,
    },

    /// The identifier is registered but its hash is not usable in this build
    #[error("hash function {hash} for {algorithm} is not available in this build")]
    HashUnavailable {
        /// Identifier that named the hash
        algorithm: String,
        /// Hash the identifier is registered with
        hash: HashAlgorithm,
    },

    /// Claims could not be serialized
    #[error("claims encoding failed: {0}")]
    Encoding(String),

    /// Structural damage: segment count, base64, JSON shape, signature length
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Structurally valid token rejected by the signature check
    #[error("invalid token signature")]
    InvalidSignature,

    /// Degenerate key material
    #[error("invalid key parameters: {0}")]
    InvalidKeyParameters(String),

    /// RSA modulus too small to hold the encoded digest
    #[error("RSA key too small for the message digest")]
    KeyTooSmall,

    /// Error reported by the cryptographic provider, message unmodified
    #[error("cryptographic provider error: {0}")]
    Provider(String),

    /// A required claim is absent
    #[error("missing claim: {0}")]
    MissingClaim(String),

    /// A claim is present with a value other than the expected one
    #[error("invalid {0} claim")]
    ClaimMismatch(String),

    /// The claims are outside their validity window
    #[error("token has expired")]
    Expired,
}

impl JwtError {
    /// Create a malformed token error
    #[inline]
    #[must_use]
    pub fn malformed(msg: impl Into<String>) -> Self {
        JwtError::MalformedToken(msg.into())
    }

    /// Create an encoding error
    #[inline]
    #[must_use]
    pub fn encoding(msg: impl Into<String>) -> Self {
        JwtError::Encoding(msg.into())
    }

    /// Create an invalid key parameters error
    #[inline]
    #[must_use]
    pub fn invalid_key_parameters(msg: impl Into<String>) -> Self {
        JwtError::InvalidKeyParameters(msg.into())
    }

    /// Create a provider error
    #[inline]
    #[must_use]
    pub fn provider(msg: impl Into<String>) -> Self {
        JwtError::Provider(msg.into())
    }

    /// Create a missing claim error
    #[inline]
    #[must_use]
    pub fn missing_claim(claim: &str) -> Self {
        JwtError::MissingClaim(claim.to_string())
    }

    /// Create a claim mismatch error
    #[inline]
    #[must_use]
    pub fn claim_mismatch(claim: &str) -> Self {
        JwtError::ClaimMismatch(claim.to_string())
    }

    /// Whether the token failed to parse, as opposed to failing authentication.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, JwtError::MalformedToken(_))
    }

    /// Whether the token parsed but did not authenticate under the given key.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            JwtError::InvalidSignature
                | JwtError::AlgorithmFamilyMismatch { .. }
                | JwtError::CurveMismatch { .. }
        )
    }

    /// Whether the failure comes from the claims layer rather than the token.
    #[must_use]
    pub fn is_claims_failure(&self) -> bool {
        matches!(
            self,
            JwtError::MissingClaim(_) | JwtError::ClaimMismatch(_) | JwtError::Expired
        )
    }
}

impl From<serde_json::Error> for JwtError {
    fn from(err: serde_json::Error) -> Self {
        JwtError::Encoding(err.to_string())
    }
}
