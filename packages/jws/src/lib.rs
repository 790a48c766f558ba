//! Compact JWS/JWT signing and verification
//!
//! This crate provides:
//! - HS256/384/512, RS256/384/512 and ES256/384/512 signatures
//! - An injectable algorithm registry with per-family identifier tables
//! - Family bound verification: the key, not the token header, picks the family
//! - Registered and extension claims with time validity and field validators
//!
//! ```no_run
//! use cryypt_jws::{Claims, HmacSecret, JwtEngine, ClaimsValidator, HS256};
//!
//! # fn main() -> cryypt_jws::JwtResult<()> {
//! let secret = HmacSecret::from("secret");
//! let engine = JwtEngine::default();
//! let token = engine.sign(&Claims::new().with_issuer("me"), HS256, &secret)?;
//! let claims = engine.verify(&token, &secret)?;
//! ClaimsValidator::new()
//!     .with_issuer("me")
//!     .valid_at(chrono::Utc::now())
//!     .validate(&claims)?;
//! # Ok(())
//! # }
//! ```

// Internal modules
pub(crate) mod crypto;
mod error;

pub mod claims;
pub mod codec;
pub mod engine;
pub mod keys;
pub mod registry;
pub mod traits;
pub mod validation;

// Public re-exports
pub use claims::{Claims, NumericTime, Registered};
pub use engine::{
    JwtEngine, ecdsa_check, ecdsa_sign, hmac_check, hmac_sign, rsa_check, rsa_sign,
};
pub use error::*;
pub use keys::{
    EcdsaCurve, EcdsaSigningKey, EcdsaVerifyingKey, HmacSecret, RsaSigningKey, RsaVerifyingKey,
};
pub use registry::{
    AlgorithmFamily, AlgorithmRegistry, AlgorithmRegistryBuilder, ES256, ES384, ES512,
    HS256, HS384, HS512, HashAlgorithm, RS256, RS384, RS512, ResolvedAlgorithm,
};
pub use traits::{KeyMaterial, TokenSigner, TokenVerifier};
pub use validation::{ClaimsValidator, FieldValidator, validate_fields};
