//! Algorithm registry
//!
//! Maps algorithm identifiers to a signature family and a hash function. A
//! registry is assembled once with [`AlgorithmRegistry::builder`] and is
//! immutable afterwards, so it can be shared between threads behind an `Arc`.

use crate::codec;
use crate::error::{JwtError, JwtResult};
use crate::keys::EcdsaCurve;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// HMAC using SHA-256
pub const HS256: &str = "HS256";
/// HMAC using SHA-384
pub const HS384: &str = "HS384";
/// HMAC using SHA-512
pub const HS512: &str = "HS512";
/// RSASSA-PKCS1-v1_5 using SHA-256
pub const RS256: &str = "RS256";
/// RSASSA-PKCS1-v1_5 using SHA-384
pub const RS384: &str = "RS384";
/// RSASSA-PKCS1-v1_5 using SHA-512
pub const RS512: &str = "RS512";
/// ECDSA using P-256 and SHA-256
pub const ES256: &str = "ES256";
/// ECDSA using P-384 and SHA-384
pub const ES384: &str = "ES384";
/// ECDSA using P-521 and SHA-512
pub const ES512: &str = "ES512";

static STANDARD: Lazy<Arc<AlgorithmRegistry>> =
    Lazy::new(|| Arc::new(AlgorithmRegistry::builder().standard().build()));

/// Signature algorithm family. Determines key shape and signature encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlgorithmFamily {
    /// Keyed hash with a shared secret
    Hmac,
    /// RSASSA-PKCS1-v1_5
    Rsa,
    /// ECDSA with fixed-width `r || s` signatures
    Ecdsa,
}

impl AlgorithmFamily {
    /// All families, in table order.
    pub const ALL: [AlgorithmFamily; 3] = [
        AlgorithmFamily::Hmac,
        AlgorithmFamily::Rsa,
        AlgorithmFamily::Ecdsa,
    ];
}

impl fmt::Display for AlgorithmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmFamily::Hmac => f.write_str("HMAC"),
            AlgorithmFamily::Rsa => f.write_str("RSA"),
            AlgorithmFamily::Ecdsa => f.write_str("ECDSA"),
        }
    }
}

/// Hash functions an identifier may be registered with.
///
/// SHA-2 is always linked. SHA-3 and BLAKE2b are linked through the `sha3` and
/// `blake2` crate features; see [`HashAlgorithm::is_available`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
    /// BLAKE2b with a 512-bit digest
    Blake2b512,
}

impl HashAlgorithm {
    /// Whether an implementation of this hash is compiled into the binary.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Sha384 | HashAlgorithm::Sha512 => true,
            HashAlgorithm::Sha3_256 | HashAlgorithm::Sha3_384 | HashAlgorithm::Sha3_512 => {
                cfg!(feature = "sha3")
            }
            HashAlgorithm::Blake2b512 => cfg!(feature = "blake2"),
        }
    }

    /// Digest length in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            HashAlgorithm::Sha256 | HashAlgorithm::Sha3_256 => 32,
            HashAlgorithm::Sha384 | HashAlgorithm::Sha3_384 => 48,
            HashAlgorithm::Sha512 | HashAlgorithm::Sha3_512 | HashAlgorithm::Blake2b512 => 64,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
            HashAlgorithm::Sha3_256 => "SHA3-256",
            HashAlgorithm::Sha3_384 => "SHA3-384",
            HashAlgorithm::Sha3_512 => "SHA3-512",
            HashAlgorithm::Blake2b512 => "BLAKE2b-512",
        };
        f.write_str(name)
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAlgorithm {
    /// Identifier as it appears in the `alg` header field
    pub name: String,
    /// Family the identifier is registered under
    pub family: AlgorithmFamily,
    /// Hash the identifier is registered with
    pub hash: HashAlgorithm,
    /// Base64url of `{"alg":"<name>"}`
    pub header: String,
    /// Curve an ECDSA identifier is bound to; `None` accepts any curve
    pub curve: Option<EcdsaCurve>,
}

/// Immutable identifier tables, one per family.
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    tables: BTreeMap<AlgorithmFamily, BTreeMap<String, Entry>>,
}

#[derive(Debug, Clone)]
struct Entry {
    hash: HashAlgorithm,
    curve: Option<EcdsaCurve>,
    header: String,
}

impl AlgorithmRegistry {
    /// Start an empty registry builder.
    #[must_use]
    pub fn builder() -> AlgorithmRegistryBuilder {
        AlgorithmRegistryBuilder::default()
    }

    /// Registry holding the RFC 7518 HMAC, RSA and ECDSA identifiers.
    #[must_use]
    pub fn standard() -> Arc<AlgorithmRegistry> {
        Arc::clone(&STANDARD)
    }

    /// Look `identifier` up in the table of `family`.
    ///
    /// # Errors
    /// - [`JwtError::AlgorithmFamilyMismatch`] when the identifier is only
    ///   registered under another family
    /// - [`JwtError::UnknownAlgorithm`] when no table knows it
    /// - [`JwtError::HashUnavailable`] when its hash is not compiled in
    pub fn resolve(&self, identifier: &str, family: AlgorithmFamily) -> JwtResult<ResolvedAlgorithm> {
        let Some(entry) = self.tables.get(&family).and_then(|t| t.get(identifier)) else {
            return Err(self.lookup_failure(identifier, family));
        };

        if !entry.hash.is_available() {
            return Err(JwtError::HashUnavailable {
                algorithm: identifier.to_string(),
                hash: entry.hash,
            });
        }

        Ok(ResolvedAlgorithm {
            name: identifier.to_string(),
            family,
            hash: entry.hash,
            header: entry.header.clone(),
            curve: entry.curve,
        })
    }

    fn lookup_failure(&self, identifier: &str, family: AlgorithmFamily) -> JwtError {
        let registered_under = self
            .tables
            .iter()
            .find(|(f, table)| **f != family && table.contains_key(identifier))
            .map(|(f, _)| *f);

        match registered_under {
            Some(actual) => JwtError::AlgorithmFamilyMismatch {
                algorithm: identifier.to_string(),
                expected: family,
                actual,
            },
            None => JwtError::UnknownAlgorithm(identifier.to_string()),
        }
    }

    /// Identifiers registered for `family`, with their hash, sorted by name.
    #[must_use]
    pub fn algorithms(&self, family: AlgorithmFamily) -> Vec<(&str, HashAlgorithm)> {
        self.tables
            .get(&family)
            .map(|t| t.iter().map(|(name, e)| (name.as_str(), e.hash)).collect())
            .unwrap_or_default()
    }

    /// Whether `identifier` is registered in any family.
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.tables.values().any(|t| t.contains_key(identifier))
    }
}

/// Builder for [`AlgorithmRegistry`].
///
/// Registering an identifier that already exists in another family moves it;
/// an identifier always lives in exactly one table.
#[derive(Debug, Default)]
pub struct AlgorithmRegistryBuilder {
    entries: BTreeMap<String, Registration>,
}

#[derive(Debug, Clone, Copy)]
struct Registration {
    family: AlgorithmFamily,
    hash: HashAlgorithm,
    curve: Option<EcdsaCurve>,
}

impl AlgorithmRegistryBuilder {
    /// Add the RFC 7518 identifiers of all three families.
    #[must_use]
    pub fn standard(self) -> Self {
        self.with_hmac(HS256, HashAlgorithm::Sha256)
            .with_hmac(HS384, HashAlgorithm::Sha384)
            .with_hmac(HS512, HashAlgorithm::Sha512)
            .with_rsa(RS256, HashAlgorithm::Sha256)
            .with_rsa(RS384, HashAlgorithm::Sha384)
            .with_rsa(RS512, HashAlgorithm::Sha512)
            .with_ecdsa(ES256, EcdsaCurve::P256, HashAlgorithm::Sha256)
            .with_ecdsa(ES384, EcdsaCurve::P384, HashAlgorithm::Sha384)
            .with_ecdsa(ES512, EcdsaCurve::P521, HashAlgorithm::Sha512)
    }

    /// Register an HMAC identifier.
    #[must_use]
    pub fn with_hmac(self, identifier: impl Into<String>, hash: HashAlgorithm) -> Self {
        self.with(AlgorithmFamily::Hmac, identifier, hash)
    }

    /// Register an RSA identifier.
    #[must_use]
    pub fn with_rsa(self, identifier: impl Into<String>, hash: HashAlgorithm) -> Self {
        self.with(AlgorithmFamily::Rsa, identifier, hash)
    }

    /// Register an ECDSA identifier bound to `curve`. Keys on other curves
    /// are rejected for it.
    #[must_use]
    pub fn with_ecdsa(
        mut self,
        identifier: impl Into<String>,
        curve: EcdsaCurve,
        hash: HashAlgorithm,
    ) -> Self {
        let registration = Registration {
            family: AlgorithmFamily::Ecdsa,
            hash,
            curve: Some(curve),
        };
        self.entries.insert(identifier.into(), registration);
        self
    }

    /// Register `identifier` under `family`. ECDSA identifiers registered
    /// this way accept keys on any curve.
    #[must_use]
    pub fn with(
        mut self,
        family: AlgorithmFamily,
        identifier: impl Into<String>,
        hash: HashAlgorithm,
    ) -> Self {
        let registration = Registration {
            family,
            hash,
            curve: None,
        };
        self.entries.insert(identifier.into(), registration);
        self
    }

    /// Remove an identifier from whichever table holds it.
    #[must_use]
    pub fn without(mut self, identifier: &str) -> Self {
        self.entries.remove(identifier);
        self
    }

    /// Freeze the tables and precompute each identifier's header segment.
    #[must_use]
    pub fn build(self) -> AlgorithmRegistry {
        let mut tables: BTreeMap<AlgorithmFamily, BTreeMap<String, Entry>> = AlgorithmFamily::ALL
            .iter()
            .map(|f| (*f, BTreeMap::new()))
            .collect();

        for (name, registration) in self.entries {
            let entry = Entry {
                hash: registration.hash,
                curve: registration.curve,
                header: codec::header_segment(&name),
            };
            tables
                .entry(registration.family)
                .or_default()
                .insert(name, entry);
        }

        let registry = AlgorithmRegistry { tables };
        tracing::debug!(
            hmac = registry.algorithms(AlgorithmFamily::Hmac).len(),
            rsa = registry.algorithms(AlgorithmFamily::Rsa).len(),
            ecdsa = registry.algorithms(AlgorithmFamily::Ecdsa).len(),
            "algorithm registry built"
        );
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_identifiers_resolve_in_their_family() {
        let registry = AlgorithmRegistry::standard();
        for (alg, family, hash) in [
            (HS256, AlgorithmFamily::Hmac, HashAlgorithm::Sha256),
            (HS512, AlgorithmFamily::Hmac, HashAlgorithm::Sha512),
            (RS384, AlgorithmFamily::Rsa, HashAlgorithm::Sha384),
            (ES256, AlgorithmFamily::Ecdsa, HashAlgorithm::Sha256),
            (ES512, AlgorithmFamily::Ecdsa, HashAlgorithm::Sha512),
        ] {
            let resolved = registry.resolve(alg, family).unwrap();
            assert_eq!(resolved.hash, hash, "{alg}");
            assert_eq!(resolved.family, family);
        }
    }

    #[test]
    fn standard_ecdsa_identifiers_are_bound_to_curves() {
        let registry = AlgorithmRegistry::standard();
        for (alg, curve) in [
            (ES256, EcdsaCurve::P256),
            (ES384, EcdsaCurve::P384),
            (ES512, EcdsaCurve::P521),
        ] {
            let resolved = registry.resolve(alg, AlgorithmFamily::Ecdsa).unwrap();
            assert_eq!(resolved.curve, Some(curve), "{alg}");
        }
        let hs = registry.resolve(HS256, AlgorithmFamily::Hmac).unwrap();
        assert_eq!(hs.curve, None);

        let loose = AlgorithmRegistry::builder()
            .with(AlgorithmFamily::Ecdsa, "EX", HashAlgorithm::Sha256)
            .build();
        assert_eq!(loose.resolve("EX", AlgorithmFamily::Ecdsa).unwrap().curve, None);
    }

    #[test]
    fn wrong_family_is_a_mismatch() {
        let registry = AlgorithmRegistry::standard();
        let err = registry.resolve(RS512, AlgorithmFamily::Ecdsa).unwrap_err();
        assert_eq!(
            err,
            JwtError::AlgorithmFamilyMismatch {
                algorithm: RS512.to_string(),
                expected: AlgorithmFamily::Ecdsa,
                actual: AlgorithmFamily::Rsa,
            }
        );
    }

    #[test]
    fn unregistered_identifier_is_unknown() {
        let registry = AlgorithmRegistry::standard();
        assert_eq!(
            registry.resolve("none", AlgorithmFamily::Hmac).unwrap_err(),
            JwtError::UnknownAlgorithm("none".to_string())
        );
        assert_eq!(
            registry.resolve("PS256", AlgorithmFamily::Rsa).unwrap_err(),
            JwtError::UnknownAlgorithm("PS256".to_string())
        );
    }

    #[test]
    fn header_is_minimal_and_deterministic() {
        let registry = AlgorithmRegistry::standard();
        let first = registry.resolve(HS512, AlgorithmFamily::Hmac).unwrap();
        let again = AlgorithmRegistry::builder().standard().build();
        let second = again.resolve(HS512, AlgorithmFamily::Hmac).unwrap();
        assert_eq!(first.header, "eyJhbGciOiJIUzUxMiJ9");
        assert_eq!(first.header, second.header);
    }

    #[test]
    fn every_header_decodes_to_its_identifier() {
        let registry = AlgorithmRegistry::standard();
        for family in AlgorithmFamily::ALL {
            for (alg, hash) in registry.algorithms(family) {
                let resolved = registry.resolve(alg, family).unwrap();
                assert_eq!(resolved.hash, hash);
                let header = codec::decode_header(&resolved.header).unwrap();
                assert_eq!(header.alg, alg);
            }
        }
    }

    #[test]
    fn unlinked_hash_is_unavailable() {
        let registry = AlgorithmRegistry::builder()
            .standard()
            .with_hmac("HB2b512", HashAlgorithm::Blake2b512)
            .build();
        let result = registry.resolve("HB2b512", AlgorithmFamily::Hmac);
        if cfg!(feature = "blake2") {
            assert!(result.is_ok());
        } else {
            assert_eq!(
                result.unwrap_err(),
                JwtError::HashUnavailable {
                    algorithm: "HB2b512".to_string(),
                    hash: HashAlgorithm::Blake2b512,
                }
            );
        }
    }

    #[test]
    fn without_removes_and_reregistering_moves() {
        let registry = AlgorithmRegistry::builder()
            .standard()
            .without(HS256)
            .with_rsa(ES384, HashAlgorithm::Sha384)
            .build();
        assert!(!registry.contains(HS256));
        assert!(registry.resolve(ES384, AlgorithmFamily::Rsa).is_ok());
        assert!(matches!(
            registry.resolve(ES384, AlgorithmFamily::Ecdsa),
            Err(JwtError::AlgorithmFamilyMismatch { .. })
        ));
    }
}
