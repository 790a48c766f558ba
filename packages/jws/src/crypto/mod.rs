//! Family signature primitives over the signing input

pub(crate) mod ecdsa;
pub(crate) mod hmac;
pub(crate) mod rsa;

use crate::error::{JwtError, JwtResult};
use crate::registry::{HashAlgorithm, ResolvedAlgorithm};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Digest of the signing input under the algorithm's hash.
pub(crate) fn digest(algorithm: &ResolvedAlgorithm, input: &[u8]) -> JwtResult<Vec<u8>> {
    match algorithm.hash {
        HashAlgorithm::Sha256 => Ok(Sha256::digest(input).to_vec()),
        HashAlgorithm::Sha384 => Ok(Sha384::digest(input).to_vec()),
        HashAlgorithm::Sha512 => Ok(Sha512::digest(input).to_vec()),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_256 => Ok(sha3::Sha3_256::digest(input).to_vec()),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_384 => Ok(sha3::Sha3_384::digest(input).to_vec()),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_512 => Ok(sha3::Sha3_512::digest(input).to_vec()),
        #[cfg(feature = "blake2")]
        HashAlgorithm::Blake2b512 => Ok(blake2::Blake2b512::digest(input).to_vec()),
        #[allow(unreachable_patterns)]
        _ => Err(hash_unavailable(algorithm)),
    }
}

pub(crate) fn hash_unavailable(algorithm: &ResolvedAlgorithm) -> JwtError {
    JwtError::HashUnavailable {
        algorithm: algorithm.name.clone(),
        hash: algorithm.hash,
    }
}
