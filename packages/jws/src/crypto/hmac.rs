//! HMAC signatures (HS256/384/512 and registered variants)

use super::hash_unavailable;
use crate::error::{JwtError, JwtResult};
use crate::registry::{HashAlgorithm, ResolvedAlgorithm};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

fn mac<M: Mac + KeyInit>(secret: &[u8], input: &[u8]) -> JwtResult<Vec<u8>> {
    let mut mac = <M as KeyInit>::new_from_slice(secret)
        .map_err(|e| JwtError::invalid_key_parameters(format!("HMAC secret: {e}")))?;
    mac.update(input);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// MAC of `input` under `secret`.
pub(crate) fn sign(algorithm: &ResolvedAlgorithm, secret: &[u8], input: &[u8]) -> JwtResult<Vec<u8>> {
    match algorithm.hash {
        HashAlgorithm::Sha256 => mac::<Hmac<Sha256>>(secret, input),
        HashAlgorithm::Sha384 => mac::<Hmac<Sha384>>(secret, input),
        HashAlgorithm::Sha512 => mac::<Hmac<Sha512>>(secret, input),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_256 => mac::<hmac::SimpleHmac<sha3::Sha3_256>>(secret, input),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_384 => mac::<hmac::SimpleHmac<sha3::Sha3_384>>(secret, input),
        #[cfg(feature = "sha3")]
        HashAlgorithm::Sha3_512 => mac::<hmac::SimpleHmac<sha3::Sha3_512>>(secret, input),
        #[cfg(feature = "blake2")]
        HashAlgorithm::Blake2b512 => mac::<hmac::SimpleHmac<blake2::Blake2b512>>(secret, input),
        #[allow(unreachable_patterns)]
        _ => Err(hash_unavailable(algorithm)),
    }
}

/// Recompute the MAC and compare in constant time.
pub(crate) fn verify(
    algorithm: &ResolvedAlgorithm,
    secret: &[u8],
    input: &[u8],
    signature: &[u8],
) -> JwtResult<()> {
    let expected = sign(algorithm, secret, input)?;
    if bool::from(expected.as_slice().ct_eq(signature)) {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{AlgorithmFamily, AlgorithmRegistry, HS256};
    use hex_literal::hex;

    fn hs256() -> ResolvedAlgorithm {
        AlgorithmRegistry::standard()
            .resolve(HS256, AlgorithmFamily::Hmac)
            .unwrap()
    }

    // RFC 4231 test case 2
    #[test]
    fn hmac_sha256_known_answer() {
        let tag = sign(&hs256(), b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            tag,
            hex!("5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843")
        );
    }

    #[test]
    fn verify_rejects_other_secret_and_truncation() {
        let alg = hs256();
        let tag = sign(&alg, b"k1", b"input").unwrap();
        assert!(verify(&alg, b"k1", b"input", &tag).is_ok());
        assert_eq!(
            verify(&alg, b"k2", b"input", &tag),
            Err(JwtError::InvalidSignature)
        );
        assert_eq!(
            verify(&alg, b"k1", b"input", &tag[..16]),
            Err(JwtError::InvalidSignature)
        );
    }

    #[test]
    fn empty_secret_is_accepted() {
        assert_eq!(sign(&hs256(), b"", b"input").unwrap().len(), 32);
    }
}
