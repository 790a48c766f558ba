//! ECDSA signatures in the fixed-width `r || s` form (RFC 7518 §3.4)

use super::digest;
use crate::error::{JwtError, JwtResult};
use crate::keys::{EcdsaCurve, EcdsaSigningKey, EcdsaVerifyingKey};
use crate::registry::ResolvedAlgorithm;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};

/// Reject a key whose curve differs from the one `algorithm` is bound to.
fn check_curve(algorithm: &ResolvedAlgorithm, curve: EcdsaCurve) -> JwtResult<()> {
    match algorithm.curve {
        Some(expected) if expected != curve => Err(JwtError::CurveMismatch {
            algorithm: algorithm.name.clone(),
            expected,
            actual: curve,
        }),
        _ => Ok(()),
    }
}

/// Sign the digest of `input`; output is `2 * coordinate_len` bytes.
pub(crate) fn sign(
    algorithm: &ResolvedAlgorithm,
    key: &EcdsaSigningKey,
    input: &[u8],
) -> JwtResult<Vec<u8>> {
    check_curve(algorithm, key.curve())?;
    let hashed = digest(algorithm, input)?;
    let (r, s) = match key {
        EcdsaSigningKey::P256(k) => {
            let signature: p256::ecdsa::Signature = k
                .sign_prehash(&hashed)
                .map_err(|e| JwtError::provider(e.to_string()))?;
            let (r, s) = signature.split_bytes();
            (r.to_vec(), s.to_vec())
        }
        EcdsaSigningKey::P384(k) => {
            let signature: p384::ecdsa::Signature = k
                .sign_prehash(&hashed)
                .map_err(|e| JwtError::provider(e.to_string()))?;
            let (r, s) = signature.split_bytes();
            (r.to_vec(), s.to_vec())
        }
        EcdsaSigningKey::P521(k) => {
            let signature: p521::ecdsa::Signature = k
                .sign_prehash(&hashed)
                .map_err(|e| JwtError::provider(e.to_string()))?;
            let (r, s) = signature.split_bytes();
            (r.to_vec(), s.to_vec())
        }
    };

    let width = key.curve().coordinate_len();
    let mut out = fixed_width(&r, width)?;
    out.extend_from_slice(&fixed_width(&s, width)?);
    Ok(out)
}

/// Check a fixed-width `r || s` signature over the digest of `input`.
pub(crate) fn verify(
    algorithm: &ResolvedAlgorithm,
    key: &EcdsaVerifyingKey,
    input: &[u8],
    signature: &[u8],
) -> JwtResult<()> {
    check_curve(algorithm, key.curve())?;
    let width = key.curve().coordinate_len();
    if signature.len() != 2 * width {
        return Err(JwtError::malformed(format!(
            "ECDSA signature must be {} bytes, got {}",
            2 * width,
            signature.len()
        )));
    }

    let hashed = digest(algorithm, input)?;
    // out-of-range scalars fail like any other mismatch
    let valid = match key {
        EcdsaVerifyingKey::P256(k) => p256::ecdsa::Signature::from_slice(signature)
            .ok()
            .is_some_and(|sig| k.verify_prehash(&hashed, &sig).is_ok()),
        EcdsaVerifyingKey::P384(k) => p384::ecdsa::Signature::from_slice(signature)
            .ok()
            .is_some_and(|sig| k.verify_prehash(&hashed, &sig).is_ok()),
        EcdsaVerifyingKey::P521(k) => p521::ecdsa::Signature::from_slice(signature)
            .ok()
            .is_some_and(|sig| k.verify_prehash(&hashed, &sig).is_ok()),
    };
    if valid {
        Ok(())
    } else {
        Err(JwtError::InvalidSignature)
    }
}

/// Big-endian integer left-padded with zeros to exactly `width` bytes.
fn fixed_width(component: &[u8], width: usize) -> JwtResult<Vec<u8>> {
    let start = component
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(component.len());
    let significant = &component[start..];
    if significant.len() > width {
        return Err(JwtError::provider(format!(
            "signature component of {} bytes exceeds {width}",
            significant.len()
        )));
    }

    let mut out = vec![0u8; width - significant.len()];
    out.extend_from_slice(significant);
    Ok(out)
}
