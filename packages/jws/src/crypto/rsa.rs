//! RSASSA-PKCS1-v1_5 signatures

use super::{digest, hash_unavailable};
use crate::error::{JwtError, JwtResult};
use crate::registry::{HashAlgorithm, ResolvedAlgorithm};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};

fn scheme(algorithm: &ResolvedAlgorithm) -> JwtResult<Pkcs1v15Sign> {
    match algorithm.hash {
        HashAlgorithm::Sha256 => Ok(Pkcs1v15Sign::new::<Sha256>()),
        HashAlgorithm::Sha384 => Ok(Pkcs1v15Sign::new::<Sha384>()),
        HashAlgorithm::Sha512 => Ok(Pkcs1v15Sign::new::<Sha512>()),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_256 => Ok(Pkcs1v15Sign::new::<sha3::Sha3_256>()),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_384 => Ok(Pkcs1v15Sign::new::<sha3::Sha3_384>()),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_512 => Ok(Pkcs1v15Sign::new::<sha3::Sha3_512>()),
        // BLAKE2b has no DigestInfo OID
        _ => Err(hash_unavailable(algorithm)),
    }
}

/// Sign the digest of `input`.
pub(crate) fn sign(
    algorithm: &ResolvedAlgorithm,
    key: &RsaPrivateKey,
    input: &[u8],
) -> JwtResult<Vec<u8>> {
    let scheme = scheme(algorithm)?;
    let hashed = digest(algorithm, input)?;
    key.sign(scheme, &hashed).map_err(|e| match e {
        rsa::Error::MessageTooLong => JwtError::KeyTooSmall,
        other => JwtError::provider(other.to_string()),
    })
}

/// Check a signature over the digest of `input`.
pub(crate) fn verify(
    algorithm: &ResolvedAlgorithm,
    key: &RsaPublicKey,
    input: &[u8],
    signature: &[u8],
) -> JwtResult<()> {
    let scheme = scheme(algorithm)?;
    let hashed = digest(algorithm, input)?;
    key.verify(scheme, &hashed, signature)
        .map_err(|_| JwtError::InvalidSignature)
}
